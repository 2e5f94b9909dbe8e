use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Structured record crossing the transport boundary. The broker client that
/// maintains the physical connection lives outside this crate; it only ever
/// sees envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Topic namespace for one ship identity.
#[derive(Debug, Clone)]
pub struct ShipTopics {
    pub container_incoming: String,
    pub container_outgoing: String,
    pub commands: String,
    pub command_response: String,
    pub telemetry: String,
    pub status: String,
    pub state: String,
}

impl ShipTopics {
    pub fn new(ship_id: &str) -> Self {
        Self {
            container_incoming: format!("control/ship/{ship_id}/containers/incoming"),
            container_outgoing: format!("control/ship/{ship_id}/containers/outgoing"),
            commands: format!("control/ship/{ship_id}/commands"),
            command_response: format!("control/ship/{ship_id}/response"),
            telemetry: format!("telemetry/ship/{ship_id}"),
            status: format!("status/ship/{ship_id}"),
            state: format!("state/ship/{ship_id}/state"),
        }
    }

    /// Topics the transport should subscribe to on behalf of this node.
    pub fn inbound(&self) -> [&str; 3] {
        [
            &self.container_incoming,
            &self.container_outgoing,
            &self.commands,
        ]
    }
}

/// Non-blocking publisher handle. Sends never suspend, so a handler holding
/// the engine lock cannot park mid-mutation on transport backpressure.
#[derive(Debug, Clone)]
pub struct BusTx {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl BusTx {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish a serializable payload. Transport failures are logged and
    /// swallowed; delivery retries belong to the broker client, not here.
    pub fn publish<T: Serialize>(&self, topic: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                error!(topic, "failed to serialize outbound payload: {e}");
                return;
            }
        };
        let envelope = Envelope {
            topic: topic.to_string(),
            payload,
        };
        if self.tx.send(envelope).is_err() {
            warn!(topic, "bus receiver dropped, outbound message discarded");
        }
    }
}
