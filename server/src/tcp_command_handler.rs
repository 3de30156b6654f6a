use log::{info, warn};
use serde_json::Value;
use shared::{tcp_command::TcpCommand, tcp_command_id::TcpCommandId};

use crate::{game::Lobby, registry::Registry, transport::ConnectionId};

pub struct TcpCommandHandler {}

impl TcpCommandHandler {
    /// Applies one client command and returns the direct reply, if any.
    pub async fn handle_command(
        incoming_command: &TcpCommand,
        conn: ConnectionId,
        registry: &Registry,
    ) -> Option<TcpCommand> {
        match incoming_command {
            TcpCommand::Simple(TcpCommandId::CreateRoom) => {
                let code = registry.register(Box::new(Lobby)).await;
                info!(
                    "{} created room {} ({} active)",
                    conn,
                    code,
                    registry.room_count().await
                );

                Some(TcpCommand::String(TcpCommandId::RoomCreated, code.to_string()))
            }

            TcpCommand::StringList(TcpCommandId::Join, args) => {
                let (code, identity) = match args.as_slice() {
                    [code, identity] => (code, identity),
                    _ => return Some(error_response("Join expects a room code and a name.")),
                };

                match registry.on_join_request(conn, identity, code).await {
                    Ok(_) => Some(TcpCommand::String(
                        TcpCommandId::JoinAccepted,
                        code.to_string(),
                    )),
                    Err(e) => {
                        info!("{} could not join {}: {}", conn, code, e);
                        Some(error_response(&e.to_string()))
                    }
                }
            }

            TcpCommand::StringList(TcpCommandId::Message, args) => {
                let (event, raw_payload) = match args.as_slice() {
                    [event, raw_payload] => (event, raw_payload),
                    _ => return Some(error_response("Message expects an event and a payload.")),
                };

                let payload: Value = match serde_json::from_str(raw_payload) {
                    Ok(payload) => payload,
                    Err(e) => {
                        return Some(error_response(&format!("Payload is not valid JSON: {}", e)));
                    }
                };

                match registry.on_message(conn, event, &payload).await {
                    Ok(()) => None,
                    Err(e) => Some(error_response(&e.to_string())),
                }
            }

            other => {
                warn!("Unexpected command {} from {}", other.id(), conn);
                Some(error_response(&format!("Unexpected command {}.", other.id())))
            }
        }
    }
}

fn error_response(message: &str) -> TcpCommand {
    TcpCommand::String(TcpCommandId::ErrorResponse, message.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        room_code::testing::ScriptedCodes, session::WELCOME_EVENT,
        transport::testing::RecordingTransport,
    };

    const C1: ConnectionId = ConnectionId(1);
    const C2: ConnectionId = ConnectionId(2);

    fn registry() -> (Registry, std::sync::Arc<RecordingTransport>) {
        let transport = RecordingTransport::new();
        let registry = Registry::new(
            transport.clone(),
            Box::new(ScriptedCodes::new(&["QX7Z"])),
            4,
        );
        (registry, transport)
    }

    fn join(code: &str, name: &str) -> TcpCommand {
        TcpCommand::StringList(
            TcpCommandId::Join,
            vec![code.to_string(), name.to_string()],
        )
    }

    #[tokio::test]
    async fn create_then_join() {
        let (registry, transport) = registry();
        registry.on_connect(C1).await;

        let created = TcpCommandHandler::handle_command(
            &TcpCommand::Simple(TcpCommandId::CreateRoom),
            C1,
            &registry,
        )
        .await;
        assert_eq!(
            created,
            Some(TcpCommand::String(TcpCommandId::RoomCreated, "QX7Z".to_string()))
        );

        let joined = TcpCommandHandler::handle_command(&join("QX7Z", "alice"), C1, &registry).await;
        assert_eq!(
            joined,
            Some(TcpCommand::String(TcpCommandId::JoinAccepted, "QX7Z".to_string()))
        );
        assert_eq!(transport.events_for(C1, WELCOME_EVENT).len(), 1);
    }

    #[tokio::test]
    async fn join_failures_become_error_responses() {
        let (registry, _) = registry();
        registry.on_connect(C1).await;
        registry.on_connect(C2).await;

        let missing = TcpCommandHandler::handle_command(&join("NOPE", "alice"), C1, &registry).await;
        assert_eq!(missing, Some(error_response("Room NOPE does not exist.")));

        registry.register(Box::new(Lobby)).await;
        TcpCommandHandler::handle_command(&join("QX7Z", "alice"), C1, &registry).await;
        let taken = TcpCommandHandler::handle_command(&join("QX7Z", "alice"), C2, &registry).await;
        assert_eq!(taken, Some(error_response("Name 'alice' is already taken.")));

        let short = TcpCommand::StringList(TcpCommandId::Join, vec!["QX7Z".to_string()]);
        assert!(matches!(
            TcpCommandHandler::handle_command(&short, C2, &registry).await,
            Some(TcpCommand::String(TcpCommandId::ErrorResponse, _))
        ));
    }

    #[tokio::test]
    async fn messages_need_json_and_a_room() {
        let (registry, _) = registry();
        registry.on_connect(C1).await;

        let bad_json = TcpCommand::StringList(
            TcpCommandId::Message,
            vec!["say".to_string(), "{oops".to_string()],
        );
        assert!(matches!(
            TcpCommandHandler::handle_command(&bad_json, C1, &registry).await,
            Some(TcpCommand::String(TcpCommandId::ErrorResponse, ref msg)) if msg.starts_with("Payload is not valid JSON")
        ));

        let message = TcpCommand::StringList(
            TcpCommandId::Message,
            vec!["say".to_string(), json!({ "text": "hi" }).to_string()],
        );
        assert_eq!(
            TcpCommandHandler::handle_command(&message, C1, &registry).await,
            Some(error_response("Connection #1 has not joined a room."))
        );

        registry.register(Box::new(Lobby)).await;
        TcpCommandHandler::handle_command(&join("QX7Z", "alice"), C1, &registry).await;
        assert_eq!(
            TcpCommandHandler::handle_command(&message, C1, &registry).await,
            None
        );
    }

    #[tokio::test]
    async fn server_side_commands_are_rejected() {
        let (registry, _) = registry();

        let reply = TcpCommandHandler::handle_command(
            &TcpCommand::String(TcpCommandId::RoomCreated, "AAAA".to_string()),
            C1,
            &registry,
        )
        .await;

        assert_eq!(reply, Some(error_response("Unexpected command RoomCreated.")));
    }
}
