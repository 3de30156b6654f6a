pub mod received_tcp_command;
pub mod tcp_command;
pub mod tcp_command_id;
pub mod tcp_command_payload_type;

pub const TCP_PORT: u16 = 8040;

pub const MAX_NAME_LENGTH: usize = 15;
pub const ROOM_CODE_LENGTH: usize = 4;

/// Identity reserved for the shared display of a room.
pub const TABLE_IDENTITY: &str = "table";

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
