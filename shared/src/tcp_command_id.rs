use crate::tcp_command_payload_type::TcpCommandPayloadType;

const COMMAND_BYTE_OFFSET: u8 = 69;

macro_rules! tcp_command_id_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, Clone, Copy, strum_macros::Display)]
        #[repr(u8)]
        $vis enum $name {
            $($variant),*
        }

        impl $name {

            pub fn to_byte(&self) -> u8 {
                *self as u8 + COMMAND_BYTE_OFFSET
            }

            pub fn from_byte(byte: u8) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                match byte.wrapping_sub(COMMAND_BYTE_OFFSET) {
                    $(x if x == $name::$variant as u8 => Ok($name::$variant),)*
                    _ => Err(format!("Invalid TcpCommandId byte {}", byte).into()),
                }
            }
        }
    };
}

tcp_command_id_enum! {
    pub enum TcpCommandId {
        CreateRoom,
        RoomCreated,
        Join,
        JoinAccepted,
        Message,
        Event,
        ErrorResponse,
    }
}

impl TcpCommandId {
    pub fn get_payload_type(&self) -> TcpCommandPayloadType {
        match &self {
            TcpCommandId::CreateRoom => TcpCommandPayloadType::Simple,
            TcpCommandId::RoomCreated => TcpCommandPayloadType::String,
            TcpCommandId::Join => TcpCommandPayloadType::StringList,
            TcpCommandId::JoinAccepted => TcpCommandPayloadType::String,
            TcpCommandId::Message => TcpCommandPayloadType::StringList,
            TcpCommandId::Event => TcpCommandPayloadType::StringList,
            TcpCommandId::ErrorResponse => TcpCommandPayloadType::String,
        }
    }
}
