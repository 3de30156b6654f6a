use core::error::Error;
use std::str::from_utf8;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    received_tcp_command::ReceivedTcpCommand, tcp_command_id::TcpCommandId,
    tcp_command_payload_type::TcpCommandPayloadType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpCommand {
    Simple(TcpCommandId),
    String(TcpCommandId, String),
    StringList(TcpCommandId, Vec<String>),
}

impl TcpCommand {
    pub fn id(&self) -> TcpCommandId {
        match self {
            TcpCommand::Simple(id) | TcpCommand::String(id, _) | TcpCommand::StringList(id, _) => {
                *id
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        let id = self.id();

        if self.payload_type() != id.get_payload_type() {
            return Err(format!("Payload does not match command {}", id).into());
        }

        let mut bytes = vec![id.to_byte()];

        match &self {
            TcpCommand::Simple(_) => {}
            TcpCommand::String(_, payload) => {
                push_string(&mut bytes, payload)?;
            }
            TcpCommand::StringList(_, payload) => {
                if payload.len() > u8::MAX as usize {
                    return Err("StringList payload too large".into());
                }

                bytes.push(payload.len() as u8);

                for str in payload {
                    push_string(&mut bytes, str)?;
                }
            }
        }

        Ok(bytes)
    }

    pub async fn write_to_stream<W>(
        &self,
        stream: &mut W,
    ) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.encode()?).await?;

        Ok(())
    }

    pub async fn read_from_stream<R>(
        stream: &mut R,
    ) -> Result<ReceivedTcpCommand, Box<dyn Error + Send + Sync>>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0; 1];

        let first_byte = match stream.read(&mut buf).await {
            Ok(0) => return Ok(ReceivedTcpCommand::EOF),
            Ok(_) => buf[0],
            Err(e) => return Err(e.into()),
        };

        let command_id = TcpCommandId::from_byte(first_byte)?;

        match command_id.get_payload_type() {
            TcpCommandPayloadType::Simple => {
                Ok(ReceivedTcpCommand::Command(TcpCommand::Simple(command_id)))
            }
            TcpCommandPayloadType::String => {
                let payload = read_string(stream).await?;

                Ok(ReceivedTcpCommand::Command(TcpCommand::String(
                    command_id, payload,
                )))
            }
            TcpCommandPayloadType::StringList => {
                let mut list_len_buf = [0];
                stream.read_exact(&mut list_len_buf).await?;
                let list_len = list_len_buf[0] as usize;

                let mut result = Vec::with_capacity(list_len);

                for _ in 0..list_len {
                    result.push(read_string(stream).await?);
                }

                Ok(ReceivedTcpCommand::Command(TcpCommand::StringList(
                    command_id, result,
                )))
            }
        }
    }

    fn payload_type(&self) -> TcpCommandPayloadType {
        match self {
            TcpCommand::Simple(_) => TcpCommandPayloadType::Simple,
            TcpCommand::String(_, _) => TcpCommandPayloadType::String,
            TcpCommand::StringList(_, _) => TcpCommandPayloadType::StringList,
        }
    }
}

fn push_string(bytes: &mut Vec<u8>, str: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    if str.len() > u16::MAX as usize {
        return Err("String payload too large".into());
    }

    bytes.extend((str.len() as u16).to_be_bytes());
    bytes.extend(str.as_bytes());

    Ok(())
}

async fn read_string<R>(stream: &mut R) -> Result<String, Box<dyn Error + Send + Sync>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut str_buf = vec![0; len];
    stream.read_exact(&mut str_buf).await?;

    Ok(from_utf8(&str_buf)?.to_string())
}
