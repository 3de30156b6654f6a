#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TcpCommandPayloadType {
    Simple,
    String,
    StringList,
}
