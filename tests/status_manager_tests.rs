use shipsim::protocol::{StabilityReport, TelemetryReport};
use shipsim::status::{OperationalStatus, SafetyStatus, StatusManager};

fn telemetry(heel_angle: f64, gm: f64, draught: f64) -> TelemetryReport {
    TelemetryReport {
        stability: StabilityReport {
            kb: 1.5,
            bm: 10.0,
            kg: 8.0,
            gm,
            gz: 0.1,
            righting_moment: 1.0e6,
            effective_beam: 30.0,
            waterplane_area: 5400.0,
            heel_angle,
        },
        draught,
    }
}

#[test]
fn initial_status_is_stable_and_ready() {
    let manager = StatusManager::new();
    let current = manager.current();
    assert_eq!(current.safety_status, SafetyStatus::Stable);
    assert_eq!(current.operational_status, OperationalStatus::Ready);
    assert!(current.message.is_none());
}

#[test]
fn clean_stable_repeat_is_not_republished() {
    let mut manager = StatusManager::new();
    assert!(manager.update_from_telemetry(&telemetry(0.5, 5.0, 3.0)).is_none());
    assert!(manager.update_from_telemetry(&telemetry(0.5, 5.0, 3.0)).is_none());
    assert!(manager.history().is_empty());
}

#[test]
fn heel_warning_threshold() {
    let mut manager = StatusManager::new();
    let status = manager
        .update_from_telemetry(&telemetry(3.5, 5.0, 3.0))
        .expect("warning should publish");
    assert_eq!(status.safety_status, SafetyStatus::WarningHeel);
    assert_eq!(status.operational_status, OperationalStatus::Ready);
    assert!(status.message.as_deref().unwrap().contains("High heel angle: 3.5°"));
}

#[test]
fn heel_critical_threshold() {
    let mut manager = StatusManager::new();
    let status = manager
        .update_from_telemetry(&telemetry(-6.2, 5.0, 3.0))
        .expect("critical should publish");
    assert_eq!(status.safety_status, SafetyStatus::Critical);
    assert_eq!(status.operational_status, OperationalStatus::Error);
    assert!(status.message.as_deref().unwrap().contains("Critical heel angle: -6.2°"));
}

#[test]
fn low_gm_is_a_stability_warning() {
    let mut manager = StatusManager::new();
    let status = manager
        .update_from_telemetry(&telemetry(0.0, 1.2, 3.0))
        .expect("warning should publish");
    assert_eq!(status.safety_status, SafetyStatus::WarningStability);
    assert!(status.message.as_deref().unwrap().contains("Low GM distance: 1.20m"));
}

#[test]
fn negative_gm_is_critical() {
    let mut manager = StatusManager::new();
    let status = manager
        .update_from_telemetry(&telemetry(0.0, -0.5, 3.0))
        .expect("critical should publish");
    assert_eq!(status.safety_status, SafetyStatus::Critical);
    assert_eq!(status.operational_status, OperationalStatus::Error);
}

#[test]
fn deep_draft_warning_and_critical() {
    let mut manager = StatusManager::new();
    // 85% of the 12.0 m design draught is 10.2 m.
    let status = manager
        .update_from_telemetry(&telemetry(0.0, 5.0, 10.5))
        .expect("warning should publish");
    assert_eq!(status.safety_status, SafetyStatus::WarningDraft);
    assert!(status.message.as_deref().unwrap().contains("High draft: 10.50m"));

    let status = manager
        .update_from_telemetry(&telemetry(0.0, 5.0, 11.5))
        .expect("critical should publish");
    assert_eq!(status.safety_status, SafetyStatus::Critical);
    assert!(status.message.as_deref().unwrap().contains("Critical draft: 11.50m"));
}

#[test]
fn critical_dominates_later_warnings() {
    let mut manager = StatusManager::new();
    // Critical heel plus warning-range GM and draft: CRITICAL must win and
    // every message must still be accumulated.
    let status = manager
        .update_from_telemetry(&telemetry(7.0, 1.0, 10.5))
        .expect("should publish");
    assert_eq!(status.safety_status, SafetyStatus::Critical);
    let message = status.message.as_deref().unwrap();
    assert!(message.contains("Critical heel angle"));
    assert!(message.contains("Low GM distance"));
    assert!(message.contains("High draft"));
    assert!(message.contains(" | "));
}

#[test]
fn later_warning_takes_precedence_over_earlier_warning() {
    let mut manager = StatusManager::new();
    // Heel warning plus draft warning: draft is evaluated last and wins the
    // safety state, both messages are kept.
    let status = manager
        .update_from_telemetry(&telemetry(3.5, 5.0, 10.5))
        .expect("should publish");
    assert_eq!(status.safety_status, SafetyStatus::WarningDraft);
    let message = status.message.as_deref().unwrap();
    assert!(message.contains("High heel angle"));
    assert!(message.contains("High draft"));
}

#[test]
fn recovery_back_to_stable_is_published_once() {
    let mut manager = StatusManager::new();
    manager
        .update_from_telemetry(&telemetry(3.5, 5.0, 3.0))
        .expect("warning should publish");

    let status = manager
        .update_from_telemetry(&telemetry(0.0, 5.0, 3.0))
        .expect("recovery should publish");
    assert_eq!(status.safety_status, SafetyStatus::Stable);
    assert_eq!(status.operational_status, OperationalStatus::Ready);
    assert!(status.message.is_none());

    // And the now-clean state is quiet again.
    assert!(manager.update_from_telemetry(&telemetry(0.0, 5.0, 3.0)).is_none());
}

#[test]
fn warning_repeat_with_messages_is_republished() {
    let mut manager = StatusManager::new();
    manager
        .update_from_telemetry(&telemetry(3.5, 5.0, 3.0))
        .expect("first warning should publish");
    // Same safety state, but messages were produced, so it publishes again.
    let status = manager
        .update_from_telemetry(&telemetry(3.6, 5.0, 3.0))
        .expect("repeat warning should publish");
    assert_eq!(status.safety_status, SafetyStatus::WarningHeel);
}

#[test]
fn explicit_transitions_always_produce_a_status() {
    let mut manager = StatusManager::new();

    let loading = manager.set_loading_status();
    assert_eq!(loading.operational_status, OperationalStatus::Loading);
    assert_eq!(loading.safety_status, SafetyStatus::Stable);
    assert_eq!(loading.message.as_deref(), Some("Processing container request"));

    let maintenance = manager.set_maintenance_status(None);
    assert_eq!(maintenance.operational_status, OperationalStatus::Maintenance);
    assert_eq!(maintenance.message.as_deref(), Some("Scheduled maintenance"));

    let error = manager.set_error_status("Emergency mode activated");
    assert_eq!(error.operational_status, OperationalStatus::Error);

    let ready = manager.set_ready_status("Emergency mode cleared");
    assert_eq!(ready.operational_status, OperationalStatus::Ready);

    assert_eq!(manager.history().len(), 4);
}

#[test]
fn explicit_transition_preserves_safety_state() {
    let mut manager = StatusManager::new();
    manager
        .update_from_telemetry(&telemetry(3.5, 5.0, 3.0))
        .expect("warning should publish");

    let loading = manager.set_loading_status();
    assert_eq!(loading.safety_status, SafetyStatus::WarningHeel);
}

#[test]
fn status_serializes_with_wire_names() {
    let mut manager = StatusManager::new();
    let status = manager
        .update_from_telemetry(&telemetry(7.0, 5.0, 3.0))
        .expect("should publish");
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["safety_status"], "CRITICAL");
    assert_eq!(value["operational_status"], "ERROR");
    assert!(value["timestamp"].as_u64().is_some());
}
