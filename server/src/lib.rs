pub mod catbox;
pub mod error;
pub mod game;
pub mod registry;
pub mod room_code;
pub mod scheduler;
pub mod session;
pub mod tcp_command_handler;
pub mod tcp_handler;
pub mod tcp_transport;
pub mod transport;
