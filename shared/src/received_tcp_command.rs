use crate::tcp_command::TcpCommand;

#[derive(Debug)]
pub enum ReceivedTcpCommand {
    EOF,
    Command(TcpCommand),
}
