use std::fmt;

use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use shared::{TABLE_IDENTITY, is_valid_name};

use crate::{
    error::RoomError,
    game::Game,
    room_code::RoomCode,
    transport::{ConnectionId, Dispatcher},
};

pub const CLEAR_VIEW_EVENT: &str = "clear page";
pub const LOBBY_EVENT: &str = "lobby";
pub const WELCOME_EVENT: &str = "welcome";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Table,
    Participant(String),
}

impl Member {
    /// Bare name for payloads; `Display` adds quotes for log lines.
    pub fn name(&self) -> &str {
        match self {
            Member::Table => TABLE_IDENTITY,
            Member::Participant(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Table => f.write_str("TABLE"),
            Member::Participant(name) => write!(f, "'{}'", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Table,
    Joined { gm: bool },
    Reconnected,
}

#[derive(Debug, Default)]
pub struct Delivery {
    pub delivered: usize,
    pub failures: Vec<RoomError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyView {
    pub code: String,
    pub gm: Option<String>,
    pub players: Vec<LobbyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyEntry {
    pub name: String,
    pub connected: bool,
    pub gm: bool,
}

impl LobbyView {
    pub fn names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            error!("Could not serialize lobby for {}: {}", self.code, e);
            Value::Null
        })
    }
}

struct Participant {
    name: String,
    conn: Option<ConnectionId>,
}

/// Directory and routing for one room. Participants stay in join order and
/// are never removed; a dropped connection only clears `conn`.
pub struct Room {
    code: RoomCode,
    participants: Vec<Participant>,
    display: Option<ConnectionId>,
    gm: Option<String>,
    dispatcher: Dispatcher,
}

impl Room {
    fn new(code: RoomCode, dispatcher: Dispatcher) -> Self {
        Self {
            code,
            participants: Vec::new(),
            display: None,
            gm: None,
            dispatcher,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn gm(&self) -> Option<&str> {
        self.gm.as_deref()
    }

    pub fn display(&self) -> Option<ConnectionId> {
        self.display
    }

    pub fn participants(&self) -> impl Iterator<Item = (&str, Option<ConnectionId>)> {
        self.participants.iter().map(|p| (p.name.as_str(), p.conn))
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// `None` for an unknown identity, `Some(None)` for a known but
    /// disconnected one.
    pub fn connection_of(&self, identity: &str) -> Option<Option<ConnectionId>> {
        self.participant(identity).map(|p| p.conn)
    }

    pub fn find_identity(&self, conn: ConnectionId) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.conn == Some(conn))
            .map(|p| p.name.as_str())
    }

    pub fn find_member(&self, conn: ConnectionId) -> Option<Member> {
        if self.display == Some(conn) {
            return Some(Member::Table);
        }

        self.find_identity(conn)
            .map(|name| Member::Participant(name.to_string()))
    }

    /// Drops `identity` from the directory for good, returning its connection
    /// if it had one. A removed GM passes the role to the next participant in
    /// join order.
    pub fn remove_participant(&mut self, identity: &str) -> Result<Option<ConnectionId>, RoomError> {
        let index = match self.participants.iter().position(|p| p.name == identity) {
            Some(index) => index,
            None => return Err(RoomError::UnknownIdentity(identity.to_string())),
        };

        let removed = self.participants.remove(index);
        info!("{} removed from {}", identity, self.code);

        if self.gm.as_deref() == Some(identity) {
            self.gm = self.participants.first().map(|p| p.name.clone());
            info!("Game GM for {} moved to {:?}", self.code, self.gm);
        }

        Ok(removed.conn)
    }

    pub fn send(&self, identity: &str, event: &str, payload: &Value) -> Result<(), RoomError> {
        debug!("Sending to '{}' in {}: {}", identity, self.code, event);

        let participant = match self.participant(identity) {
            Some(participant) => participant,
            None => {
                warn!("User {} not found in {}", identity, self.code);
                return Err(RoomError::UnknownIdentity(identity.to_string()));
            }
        };

        match participant.conn {
            Some(conn) => {
                self.dispatcher.dispatch(conn, event, payload);
                Ok(())
            }
            None => {
                warn!("User {} is not connected", identity);
                Err(RoomError::NotConnected(identity.to_string()))
            }
        }
    }

    pub fn send_to_display(&self, event: &str, payload: &Value) -> Result<(), RoomError> {
        debug!("Sending to TABLE in {}: {}", self.code, event);

        match self.display {
            Some(conn) => {
                self.dispatcher.dispatch(conn, event, payload);
                Ok(())
            }
            None => {
                warn!("No table connected to {}", self.code);
                Err(RoomError::DisplayNotConnected)
            }
        }
    }

    pub fn broadcast(&self, event: &str, payload: &Value, include_display: bool) -> Delivery {
        info!("Broadcasting {} in {}", event, self.code);

        let mut delivery = Delivery::default();

        let mut record = |result: Result<(), RoomError>| match result {
            Ok(()) => delivery.delivered += 1,
            Err(e) => delivery.failures.push(e),
        };

        if include_display {
            record(self.send_to_display(event, payload));
        }

        for participant in &self.participants {
            record(self.send(&participant.name, event, payload));
        }

        delivery
    }

    pub fn render_lobby(&self) -> LobbyView {
        LobbyView {
            code: self.code.to_string(),
            gm: self.gm.clone(),
            players: self
                .participants
                .iter()
                .map(|p| LobbyEntry {
                    name: p.name.clone(),
                    connected: p.conn.is_some(),
                    gm: self.gm.as_deref() == Some(p.name.as_str()),
                })
                .collect(),
        }
    }

    pub fn display_lobby(&self) -> Result<(), RoomError> {
        self.send_to_display(LOBBY_EVENT, &self.render_lobby().to_payload())
    }

    pub fn clear_view(&self, identity: &str) -> Result<(), RoomError> {
        self.send(identity, CLEAR_VIEW_EVENT, &json!({}))
    }

    pub fn clear_display(&self) -> Result<(), RoomError> {
        self.send_to_display(CLEAR_VIEW_EVENT, &json!({}))
    }

    fn participant(&self, identity: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == identity)
    }

    fn participant_mut(&mut self, identity: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.name == identity)
    }
}

pub struct Session {
    room: Room,
    game: Box<dyn Game>,
}

impl Session {
    pub fn new(code: RoomCode, dispatcher: Dispatcher, game: Box<dyn Game>) -> Self {
        info!("{} game created with code {}", game.name(), code);

        Self {
            room: Room::new(code, dispatcher),
            game,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn code(&self) -> &RoomCode {
        self.room.code()
    }

    pub fn game_name(&self) -> &str {
        self.game.name()
    }

    pub fn add_participant(
        &mut self,
        identity: &str,
        conn: ConnectionId,
    ) -> Result<JoinOutcome, RoomError> {
        info!(
            "Player add requested in {} with name '{}' and connection {}",
            self.room.code, identity, conn
        );

        if identity != TABLE_IDENTITY && !is_valid_name(identity) {
            return Err(RoomError::InvalidName(identity.to_string()));
        }

        if self.room.find_member(conn).is_some() {
            return Err(RoomError::AlreadyJoined(conn));
        }

        if identity == TABLE_IDENTITY {
            if let Some(previous) = self.room.display.replace(conn) {
                info!("Table for {} moved from {} to {}", self.room.code, previous, conn);
            }

            self.game.on_table_join(&mut self.room);
            let _ = self.room.display_lobby();

            return Ok(JoinOutcome::Table);
        }

        if let Some(participant) = self.room.participant_mut(identity) {
            if participant.conn.is_some() {
                info!("Name {} is already taken and still connected", identity);
                return Err(RoomError::NameTaken(identity.to_string()));
            }

            info!("{} is a reconnect, resetting connection", identity);
            participant.conn = Some(conn);
            self.game.on_reconnect(&mut self.room, identity);

            return Ok(JoinOutcome::Reconnected);
        }

        let gm = self.room.gm.is_none();
        if gm {
            self.room.gm = Some(identity.to_string());
            info!("Game GM for {} set to {}", self.room.code, identity);
        }

        self.room.participants.push(Participant {
            name: identity.to_string(),
            conn: Some(conn),
        });
        info!("{} has joined {}", identity, self.room.code);

        self.game.on_join(&mut self.room, identity);

        Ok(JoinOutcome::Joined { gm })
    }

    /// Detaches `conn` from this room, returning who it belonged to.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Option<Member> {
        let member = if self.room.display == Some(conn) {
            self.room.display = None;
            Member::Table
        } else {
            let participant = self
                .room
                .participants
                .iter_mut()
                .find(|p| p.conn == Some(conn))?;
            participant.conn = None;
            Member::Participant(participant.name.clone())
        };

        info!("{} disconnected from {}", member, self.room.code);
        self.game.on_disconnect(&mut self.room, &member);

        Some(member)
    }

    pub fn handle_message(
        &mut self,
        conn: ConnectionId,
        event: &str,
        payload: &Value,
    ) -> Result<Member, RoomError> {
        let member = match self.room.find_member(conn) {
            Some(member) => member,
            None => {
                warn!("Connection {} is not part of {}", conn, self.room.code);
                return Err(RoomError::UnknownIdentity(conn.to_string()));
            }
        };

        self.game
            .handle_message(&mut self.room, &member, event, payload);

        Ok(member)
    }

    pub fn tick(&mut self) {
        self.game.tick(&mut self.room);
    }
}
