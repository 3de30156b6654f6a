use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::RoomError,
    game::Game,
    room_code::{CodeSource, RoomCode, code_length_for},
    session::{JoinOutcome, Member, Session},
    transport::{ConnectionId, Dispatcher, Transport},
};

pub type SharedSession = Arc<Mutex<Session>>;

/// Owns every live room and the set of attached connections.
///
/// Lock order: `sessions` before `codes`; `connections` is never held while
/// a session is locked.
pub struct Registry {
    sessions: RwLock<HashMap<RoomCode, SharedSession>>,
    connections: Mutex<HashMap<ConnectionId, HashSet<RoomCode>>>,
    codes: Mutex<Box<dyn CodeSource>>,
    code_length: usize,
    dispatcher: Dispatcher,
}

impl Registry {
    pub fn new(
        transport: Arc<dyn Transport>,
        codes: Box<dyn CodeSource>,
        code_length: usize,
    ) -> Self {
        info!("Server initialized");

        Self {
            sessions: RwLock::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            codes: Mutex::new(codes),
            code_length,
            dispatcher: Dispatcher::new(transport),
        }
    }

    pub async fn register(&self, game: Box<dyn Game>) -> RoomCode {
        let mut sessions = self.sessions.write().await;
        let len = code_length_for(self.code_length, sessions.len());

        let code = {
            let mut codes = self.codes.lock().await;
            let mut code = codes.next_code(len);

            while sessions.contains_key(&code) {
                debug!("Code {} in use, regenerating", code);
                code = codes.next_code(len);
            }

            code
        };

        let session = Session::new(code.clone(), self.dispatcher.clone(), game);
        sessions.insert(code.clone(), Arc::new(Mutex::new(session)));

        info!("Game with code {} created", code);

        code
    }

    pub async fn unregister(&self, code: &str) -> Option<SharedSession> {
        let session = self.sessions.write().await.remove(code)?;

        for rooms in self.connections.lock().await.values_mut() {
            rooms.remove(code);
        }

        info!("Game with code {} removed", code);

        Some(session)
    }

    pub async fn session(&self, code: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(code).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn on_connect(&self, conn: ConnectionId) {
        info!("Client {} connected", conn);
        self.connections.lock().await.insert(conn, HashSet::new());
    }

    pub async fn on_disconnect(&self, conn: ConnectionId) -> Vec<(RoomCode, Member)> {
        info!("Client {} disconnected", conn);

        let rooms = match self.connections.lock().await.remove(&conn) {
            Some(rooms) => rooms,
            None => return Vec::new(),
        };

        let mut departed = Vec::new();

        for code in rooms {
            let session = match self.session(code.as_str()).await {
                Some(session) => session,
                None => continue,
            };

            if let Some(member) = session.lock().await.disconnect(conn) {
                departed.push((code, member));
            }
        }

        departed
    }

    pub async fn is_live(&self, conn: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&conn)
    }

    pub async fn live_connections(&self) -> Vec<ConnectionId> {
        let mut live: Vec<_> = self.connections.lock().await.keys().copied().collect();
        live.sort();
        live
    }

    pub async fn on_join_request(
        &self,
        conn: ConnectionId,
        identity: &str,
        code: &str,
    ) -> Result<JoinOutcome, RoomError> {
        info!(
            "User {} (name '{}') requesting to join room '{}'",
            conn, identity, code
        );

        let session = match self.session(code).await {
            Some(session) => session,
            None => return Err(RoomError::RoomNotFound(RoomCode::new(code))),
        };

        let outcome = session.lock().await.add_participant(identity, conn)?;

        let still_live = match self.connections.lock().await.get_mut(&conn) {
            Some(rooms) => {
                rooms.insert(RoomCode::new(code));
                true
            }
            None => false,
        };

        if !still_live {
            warn!("{} detached while joining {}, rolling back", conn, code);
            session.lock().await.disconnect(conn);
        }

        Ok(outcome)
    }

    pub async fn on_message(
        &self,
        conn: ConnectionId,
        event: &str,
        payload: &Value,
    ) -> Result<(), RoomError> {
        let rooms: Vec<RoomCode> = match self.connections.lock().await.get(&conn) {
            Some(rooms) if !rooms.is_empty() => rooms.iter().cloned().collect(),
            _ => return Err(RoomError::NotJoined(conn)),
        };

        let mut first_error = None;
        let mut handled = false;

        for code in rooms {
            let session = match self.session(code.as_str()).await {
                Some(session) => session,
                None => continue,
            };

            match session.lock().await.handle_message(conn, event, payload) {
                Ok(_) => handled = true,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match (handled, first_error) {
            (true, _) => Ok(()),
            (false, Some(e)) => Err(e),
            (false, None) => Err(RoomError::NotJoined(conn)),
        }
    }

    pub fn dispatch(&self, conn: ConnectionId, event: &str, payload: &Value) {
        self.dispatcher.dispatch(conn, event, payload);
    }

    pub async fn tick_all(&self) {
        let sessions: Vec<SharedSession> = self.sessions.read().await.values().cloned().collect();

        for session in sessions {
            session.lock().await.tick();
        }
    }
}
