use thiserror::Error;

use crate::{room_code::RoomCode, transport::ConnectionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} does not exist.")]
    RoomNotFound(RoomCode),

    #[error("Name '{0}' is already taken.")]
    NameTaken(String),

    #[error("Nobody named '{0}' is in this room.")]
    UnknownIdentity(String),

    #[error("'{0}' is not connected.")]
    NotConnected(String),

    #[error("No table is connected.")]
    DisplayNotConnected,

    #[error("Name '{0}' must contain only letters, numbers, underscores (_), or hyphens (-).")]
    InvalidName(String),

    #[error("Connection {0} has already joined this room.")]
    AlreadyJoined(ConnectionId),

    #[error("Connection {0} has not joined a room.")]
    NotJoined(ConnectionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("Could not encode {1} for connection {0}: {2}")]
    Unencodable(ConnectionId, String, String),
}
