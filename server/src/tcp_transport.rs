use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;
use shared::{tcp_command::TcpCommand, tcp_command_id::TcpCommandId};
use tokio::sync::mpsc;

use crate::{
    error::TransportError,
    transport::{ConnectionId, Transport},
};

/// Encoded frames waiting for a socket's writer task.
pub type Outbox = mpsc::UnboundedSender<Vec<u8>>;

/// Routes room events to the writer task of each attached socket. Frames
/// are encoded here, so the writer only ever sees bytes it can write.
#[derive(Default)]
pub struct TcpTransport {
    outboxes: Mutex<HashMap<ConnectionId, Outbox>>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, conn: ConnectionId, outbox: Outbox) {
        self.outboxes().insert(conn, outbox);
    }

    pub fn detach(&self, conn: ConnectionId) {
        self.outboxes().remove(&conn);
    }

    fn outboxes(&self) -> MutexGuard<'_, HashMap<ConnectionId, Outbox>> {
        self.outboxes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for TcpTransport {
    fn send(&self, conn: ConnectionId, event: &str, payload: &Value) -> Result<(), TransportError> {
        let command = TcpCommand::StringList(
            TcpCommandId::Event,
            vec![event.to_string(), payload.to_string()],
        );

        let frame = command
            .encode()
            .map_err(|e| TransportError::Unencodable(conn, event.to_string(), e.to_string()))?;

        match self.outboxes().get(&conn) {
            Some(outbox) => outbox
                .send(frame)
                .map_err(|_| TransportError::ConnectionClosed(conn)),
            None => Err(TransportError::ConnectionClosed(conn)),
        }
    }
}
