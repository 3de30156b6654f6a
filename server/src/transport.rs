use std::{fmt, sync::Arc};

use log::{debug, warn};
use serde_json::Value;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound half of a transport adapter. Sends are fire-and-forget: the
/// adapter may buffer, and a failure never reaches room state.
pub trait Transport: Send + Sync {
    fn send(&self, conn: ConnectionId, event: &str, payload: &Value) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn dispatch(&self, conn: ConnectionId, event: &str, payload: &Value) {
        debug!("Emitting {} to {}", event, conn);

        if let Err(e) = self.transport.send(conn, event, payload) {
            warn!("Dropped {} for {}: {}", event, conn, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{testing::RecordingTransport, *};

    #[test]
    fn dispatch_swallows_transport_failures() {
        let transport = RecordingTransport::new();
        let dispatcher = Dispatcher::new(transport.clone());

        transport.close(ConnectionId(2));
        dispatcher.dispatch(ConnectionId(1), "ping", &json!({}));
        dispatcher.dispatch(ConnectionId(2), "ping", &json!({}));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].conn, ConnectionId(1));
    }

    #[test]
    fn connection_ids_display_with_a_hash() {
        assert_eq!(ConnectionId(17).to_string(), "#17");
    }
}
