use core::error::Error;
use std::sync::Arc;

use log::warn;
use shared::{received_tcp_command::ReceivedTcpCommand, tcp_command::TcpCommand};
use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    sync::{mpsc, oneshot},
};

use crate::{
    registry::Registry, tcp_command_handler::TcpCommandHandler, tcp_transport::TcpTransport,
    transport::ConnectionId,
};

pub struct TcpHandler;

impl TcpHandler {
    /// Serves one client until it hangs up or can no longer be written to.
    /// The writer task drains whatever is still queued and exits once every
    /// outbox sender is gone.
    pub async fn handle_stream(
        stream: TcpStream,
        conn: ConnectionId,
        registry: Arc<Registry>,
        transport: Arc<TcpTransport>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (mut read_half, mut write_half) = stream.into_split();
        let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (write_failed_tx, mut write_failed_rx) = oneshot::channel::<()>();

        transport.attach(conn, outbox_tx.clone());
        registry.on_connect(conn).await;

        tokio::spawn(async move {
            while let Some(frame) = outbox_rx.recv().await {
                if let Err(e) = write_half.write_all(&frame).await {
                    warn!("Error writing to {}: {}", conn, e);
                    let _ = write_failed_tx.send(());
                    return;
                }
            }
        });

        let result = loop {
            let received = tokio::select! {

                result = TcpCommand::read_from_stream(&mut read_half) => result,

                _ = &mut write_failed_rx => {

                    break Err(format!("Writer for {} stopped", conn).into());
                }
            };

            let incoming_command = match received {
                Ok(ReceivedTcpCommand::EOF) => break Ok(()),
                Ok(ReceivedTcpCommand::Command(command)) => command,
                Err(e) => break Err(e),
            };

            let reply = match TcpCommandHandler::handle_command(&incoming_command, conn, &registry)
                .await
            {
                Some(reply) => reply,
                None => continue,
            };

            match reply.encode() {
                Ok(frame) => {
                    if outbox_tx.send(frame).is_err() {
                        break Ok(());
                    }
                }
                Err(e) => warn!("Dropped reply {} for {}: {}", reply.id(), conn, e),
            }
        };

        drop(outbox_tx);
        transport.detach(conn);

        return result;
    }
}
