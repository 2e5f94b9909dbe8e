use shipsim::bus::{BusTx, Envelope};
use shipsim::config::SimulationConfig;
use shipsim::node::ShipNode;
use shipsim::protocol::ResponseStatus;
use tokio::sync::mpsc::UnboundedReceiver;

fn new_node() -> (ShipNode, UnboundedReceiver<Envelope>) {
    let (bus, rx) = BusTx::channel();
    let node = ShipNode::new("1", SimulationConfig::default(), bus).unwrap();
    (node, rx)
}

fn drain(rx: &mut UnboundedReceiver<Envelope>) -> Vec<Envelope> {
    let mut envelopes = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        envelopes.push(envelope);
    }
    envelopes
}

#[test]
fn every_command_produces_exactly_one_response() {
    let (mut node, mut rx) = new_node();

    for command in [
        "INITIALIZE",
        "DUMP_STATE",
        "EMERGENCY",
        "CLEAR_EMERGENCY",
        "ENABLE_FAULT_INJECTION",
        "DISABLE_FAULT_INJECTION",
    ] {
        node.handle_command(&serde_json::json!({ "command": command }));
        let responses: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| e.topic == "control/ship/1/response")
            .collect();
        assert_eq!(responses.len(), 1, "one response for {command}");
        assert_eq!(responses[0].payload["command"], command);
        assert_eq!(responses[0].payload["status"], "success");
    }
}

#[test]
fn unknown_command_is_an_error_response_without_mutation() {
    let (mut node, mut rx) = new_node();

    let response = node.handle_command(&serde_json::json!({ "command": "SELF_DESTRUCT" }));
    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(response.command.as_deref(), Some("SELF_DESTRUCT"));
    assert!(response.message.as_deref().unwrap().contains("SELF_DESTRUCT"));

    assert!(!node.emergency_mode());
    assert!(!node.simulation().fault_injector().is_enabled());
    assert_eq!(node.simulation().grid().occupied_count(), 0);

    let envelopes = drain(&mut rx);
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].topic, "control/ship/1/response");
    assert_eq!(envelopes[0].payload["status"], "error");
}

#[test]
fn missing_command_field_is_a_malformed_payload_error() {
    let (mut node, _rx) = new_node();

    let response = node.handle_command(&serde_json::json!({ "params": {} }));
    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.command.is_none());
    assert!(response
        .message
        .as_deref()
        .unwrap()
        .contains("missing command field"));
}

#[test]
fn fault_injection_toggles_round_trip() {
    let (mut node, _rx) = new_node();

    let response = node.handle_command(&serde_json::json!({ "command": "ENABLE_FAULT_INJECTION" }));
    assert_eq!(response.message.as_deref(), Some("Fault injection enabled"));
    assert!(node.simulation().fault_injector().is_enabled());

    let response = node.handle_command(&serde_json::json!({ "command": "DISABLE_FAULT_INJECTION" }));
    assert_eq!(response.message.as_deref(), Some("Fault injection disabled"));
    assert!(!node.simulation().fault_injector().is_enabled());
}

#[test]
fn initialize_response_reports_reinitialization() {
    let (mut node, _rx) = new_node();
    let response = node.handle_command(&serde_json::json!({ "command": "INITIALIZE" }));
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.message.as_deref(), Some("Ship reinitialized"));
}

#[test]
fn responses_are_published_after_the_action_completes() {
    let (mut node, mut rx) = new_node();

    node.handle_command(&serde_json::json!({ "command": "EMERGENCY" }));
    let envelopes = drain(&mut rx);
    // Explicit ERROR status first, then the command response.
    let status_at = envelopes
        .iter()
        .position(|e| e.topic == "status/ship/1")
        .unwrap();
    let response_at = envelopes
        .iter()
        .position(|e| e.topic == "control/ship/1/response")
        .unwrap();
    assert!(status_at < response_at);
}

#[test]
fn startup_publishes_initial_telemetry() {
    let (mut node, mut rx) = new_node();
    node.publish_startup();

    let envelopes = drain(&mut rx);
    let telemetry = envelopes
        .iter()
        .find(|e| e.topic == "telemetry/ship/1")
        .expect("boot telemetry");
    for field in [
        "KB",
        "BM",
        "KG",
        "GM",
        "GZ",
        "righting_moment",
        "effective_beam",
        "waterplane_area",
        "heel_angle",
        "draught",
    ] {
        assert!(
            telemetry.payload.get(field).and_then(|v| v.as_f64()).is_some(),
            "telemetry field {field} missing"
        );
    }
}
