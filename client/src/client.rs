use core::error::Error;

use shared::{
    TCP_PORT, received_tcp_command::ReceivedTcpCommand, tcp_command::TcpCommand,
    tcp_command_id::TcpCommandId,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, stdin},
    net::TcpStream,
};

use crate::{cli_display::CliDisplay, user_input::parse_message};

pub struct Client {}

impl Client {
    pub async fn run(
        server_addr: &str,
        code: Option<&str>,
        username: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let server_tcp_addr = match server_addr.contains(':') {
            true => server_addr.to_string(),
            false => format!("{}:{}", server_addr, TCP_PORT),
        };

        let mut tcp_stream = TcpStream::connect(server_tcp_addr).await?;

        let code = match code {
            Some(code) => code.to_string(),
            None => create_room(&mut tcp_stream).await?,
        };

        perform_join(&mut tcp_stream, &code, username).await?;
        CliDisplay::print_connected_message(server_addr, &code, username);

        let (mut read_half, mut write_half) = tcp_stream.into_split();

        let mut printer_task = tokio::spawn(async move {
            loop {
                match read_command(&mut read_half).await? {
                    Some(command) => print_command(&command),
                    None => return Ok::<(), Box<dyn Error + Send + Sync>>(()),
                }
            }
        });

        let mut lines = BufReader::new(stdin()).lines();

        loop {
            tokio::select! {

                result = &mut printer_task => {

                    result??;
                    CliDisplay::print_disconnected();
                    return Ok(());
                }

                result = lines.next_line() => {

                    let line = match result? {
                        Some(line) => line,
                        None => return Ok(()),
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    match parse_message(&line) {
                        Ok((event, payload)) => {
                            TcpCommand::StringList(
                                TcpCommandId::Message,
                                vec![event, payload.to_string()],
                            )
                            .write_to_stream(&mut write_half)
                            .await?;
                        }
                        Err(e) => CliDisplay::print_error(&e),
                    }
                }
            }
        }
    }
}

async fn create_room(tcp_stream: &mut TcpStream) -> Result<String, Box<dyn Error + Send + Sync>> {
    TcpCommand::Simple(TcpCommandId::CreateRoom)
        .write_to_stream(tcp_stream)
        .await?;

    loop {
        match read_command(tcp_stream).await? {
            Some(TcpCommand::String(TcpCommandId::RoomCreated, code)) => {
                CliDisplay::print_room_created(&code);
                return Ok(code);
            }
            Some(TcpCommand::String(TcpCommandId::ErrorResponse, error)) => {
                return Err(error.into());
            }
            Some(command) => print_command(&command),
            None => return Err("Unexpected EOF from server while creating a room".into()),
        }
    }
}

pub async fn perform_join(
    tcp_stream: &mut TcpStream,
    code: &str,
    username: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    TcpCommand::StringList(
        TcpCommandId::Join,
        vec![code.to_string(), username.to_string()],
    )
    .write_to_stream(tcp_stream)
    .await?;

    // room events for this join can arrive ahead of the acceptance
    loop {
        match read_command(tcp_stream).await? {
            Some(TcpCommand::String(TcpCommandId::JoinAccepted, _)) => return Ok(()),
            Some(TcpCommand::String(TcpCommandId::ErrorResponse, error)) => {
                return Err(error.into());
            }
            Some(command) => print_command(&command),
            None => return Err("Unexpected EOF from server while joining".into()),
        }
    }
}

async fn read_command<R>(stream: &mut R) -> Result<Option<TcpCommand>, Box<dyn Error + Send + Sync>>
where
    R: AsyncRead + Unpin,
{
    match TcpCommand::read_from_stream(stream).await? {
        ReceivedTcpCommand::EOF => Ok(None),
        ReceivedTcpCommand::Command(command) => Ok(Some(command)),
    }
}

fn print_command(command: &TcpCommand) {
    match command {
        TcpCommand::StringList(TcpCommandId::Event, list) if list.len() == 2 => {
            CliDisplay::print_event(&list[0], &list[1]);
        }
        TcpCommand::String(TcpCommandId::ErrorResponse, error) => CliDisplay::print_error(error),
        other => CliDisplay::print_error(&format!("Unexpected command {}", other.id())),
    }
}
