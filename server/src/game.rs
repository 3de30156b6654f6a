use log::debug;
use serde_json::{Value, json};

use crate::session::{Member, Room, WELCOME_EVENT};

/// Game-specific behavior layered on a room. Every hook runs under the
/// owning session's lock, so it may freely read and mutate the room.
pub trait Game: Send {
    fn name(&self) -> &str {
        "lobby"
    }

    fn on_join(&mut self, room: &mut Room, identity: &str) {
        let _ = room.clear_view(identity);
        let _ = room.send(
            identity,
            WELCOME_EVENT,
            &json!({ "code": room.code().as_str(), "name": identity }),
        );
        let _ = room.display_lobby();
    }

    fn on_table_join(&mut self, room: &mut Room) {
        let _ = room.clear_display();
    }

    fn on_reconnect(&mut self, room: &mut Room, identity: &str) {
        let _ = room.clear_view(identity);
        let _ = room.display_lobby();
    }

    fn on_disconnect(&mut self, room: &mut Room, member: &Member) {
        debug!("{} left room {}", member, room.code());

        if *member != Member::Table {
            let _ = room.display_lobby();
        }
    }

    fn handle_message(&mut self, room: &mut Room, member: &Member, event: &str, payload: &Value) {
        debug!(
            "Message received in {} from {}: {} {}",
            room.code(),
            member,
            event,
            payload
        );
    }

    fn tick(&mut self, _room: &mut Room) {}
}

/// Waiting room with no rules of its own.
#[derive(Debug, Default)]
pub struct Lobby;

impl Game for Lobby {}
