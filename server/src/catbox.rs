use core::error::Error;
use std::{net::SocketAddr, sync::Arc, time::Duration};

use log::{error, info};
use tokio::net::TcpListener;

use crate::{
    registry::Registry, room_code::RandomCodes, scheduler::spawn_ticker, tcp_handler::TcpHandler,
    tcp_transport::TcpTransport, transport::ConnectionId,
};

pub struct Catbox {
    tcp_listener: TcpListener,
    registry: Arc<Registry>,
    transport: Arc<TcpTransport>,
    tick_period: Duration,
}

impl Catbox {
    pub async fn bind(
        tcp_addr: String,
        code_length: usize,
        tick_period: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        let transport = Arc::new(TcpTransport::new());
        let registry = Arc::new(Registry::new(
            transport.clone(),
            Box::new(RandomCodes::from_os_rng()),
            code_length,
        ));

        Ok(Self {
            tcp_listener: TcpListener::bind(tcp_addr).await?,
            registry,
            transport,
            tick_period,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.tcp_listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub async fn listen(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut tick_task = spawn_ticker(self.registry.clone(), self.tick_period);
        let mut next_conn_id = 0u64;

        loop {
            tokio::select! {

                result = &mut tick_task => {

                    result?;
                    return Err("Tick scheduler stopped".into());
                }

                result = self.tcp_listener.accept() => {

                    let (tcp_socket, peer_addr) = result?;

                    next_conn_id += 1;
                    let conn = ConnectionId(next_conn_id);
                    info!("{} accepted from {}", conn, peer_addr);

                    let registry = self.registry.clone();
                    let transport = self.transport.clone();

                    tokio::spawn(async move {

                        if let Err(e) = TcpHandler::handle_stream(tcp_socket, conn, registry.clone(), transport.clone()).await {

                            error!("Error handling TcpSocket {}: {}", conn, e);
                        }

                        transport.detach(conn);
                        registry.on_disconnect(conn).await;
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use shared::{
        received_tcp_command::ReceivedTcpCommand, tcp_command::TcpCommand,
        tcp_command_id::TcpCommandId,
    };
    use tokio::{net::TcpStream, time::timeout};

    use super::*;
    use crate::session::{CLEAR_VIEW_EVENT, LOBBY_EVENT};

    async fn start() -> (SocketAddr, Arc<Registry>) {
        let server = Catbox::bind("127.0.0.1:0".to_string(), 4, Duration::from_millis(50))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let registry = server.registry();

        tokio::spawn(async move {
            let _ = server.listen().await;
        });

        (addr, registry)
    }

    async fn next(stream: &mut TcpStream) -> TcpCommand {
        match timeout(Duration::from_secs(5), TcpCommand::read_from_stream(stream))
            .await
            .expect("timed out waiting for the server")
            .unwrap()
        {
            ReceivedTcpCommand::Command(command) => command,
            ReceivedTcpCommand::EOF => panic!("server hung up"),
        }
    }

    async fn next_event(stream: &mut TcpStream, event: &str) -> Value {
        loop {
            if let TcpCommand::StringList(TcpCommandId::Event, list) = next(stream).await {
                if list[0] == event {
                    return serde_json::from_str(&list[1]).unwrap();
                }
            }
        }
    }

    async fn send(stream: &mut TcpStream, command: TcpCommand) {
        command.write_to_stream(stream).await.unwrap();
    }

    fn join(code: &str, name: &str) -> TcpCommand {
        TcpCommand::StringList(
            TcpCommandId::Join,
            vec![code.to_string(), name.to_string()],
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn table_sees_players_come_and_go() {
        let (addr, registry) = start().await;

        let mut table = TcpStream::connect(addr).await.unwrap();
        send(&mut table, TcpCommand::Simple(TcpCommandId::CreateRoom)).await;
        let code = match next(&mut table).await {
            TcpCommand::String(TcpCommandId::RoomCreated, code) => code,
            other => panic!("unexpected {:?}", other),
        };

        send(&mut table, join(&code, "table")).await;
        assert_eq!(next_event(&mut table, CLEAR_VIEW_EVENT).await, json!({}));
        assert_eq!(next_event(&mut table, LOBBY_EVENT).await["players"], json!([]));

        let mut alice = TcpStream::connect(addr).await.unwrap();
        send(&mut alice, join(&code, "alice")).await;
        assert_eq!(next_event(&mut alice, CLEAR_VIEW_EVENT).await, json!({}));

        let lobby = next_event(&mut table, LOBBY_EVENT).await;
        assert_eq!(lobby["players"][0]["name"], json!("alice"));
        assert_eq!(lobby["gm"], json!("alice"));

        let mut impostor = TcpStream::connect(addr).await.unwrap();
        send(&mut impostor, join(&code, "alice")).await;
        assert_eq!(
            next(&mut impostor).await,
            TcpCommand::String(
                TcpCommandId::ErrorResponse,
                "Name 'alice' is already taken.".to_string()
            )
        );

        drop(alice);
        let lobby = next_event(&mut table, LOBBY_EVENT).await;
        assert_eq!(lobby["players"][0]["connected"], json!(false));

        send(&mut impostor, join(&code, "alice")).await;
        let lobby = next_event(&mut table, LOBBY_EVENT).await;
        assert_eq!(lobby["players"][0]["connected"], json!(true));
        assert_eq!(lobby["gm"], json!("alice"));

        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn oversized_event_does_not_silence_the_connection() {
        let (addr, registry) = start().await;

        let mut table = TcpStream::connect(addr).await.unwrap();
        send(&mut table, TcpCommand::Simple(TcpCommandId::CreateRoom)).await;
        let code = match next(&mut table).await {
            TcpCommand::String(TcpCommandId::RoomCreated, code) => code,
            other => panic!("unexpected {:?}", other),
        };
        send(&mut table, join(&code, "table")).await;
        next_event(&mut table, LOBBY_EVENT).await;

        let session = registry.session(&code).await.unwrap();
        {
            let session = session.lock().await;
            let huge = json!({ "blob": "x".repeat(70_000) });
            assert_eq!(session.room().send_to_display("big", &huge), Ok(()));
            assert_eq!(
                session.room().send_to_display("ping", &json!({ "n": 1 })),
                Ok(())
            );
        }

        assert_eq!(next_event(&mut table, "ping").await, json!({ "n": 1 }));

        send(&mut table, TcpCommand::Simple(TcpCommandId::CreateRoom)).await;
        assert!(matches!(
            next(&mut table).await,
            TcpCommand::String(TcpCommandId::RoomCreated, _)
        ));
    }
}
