use crate::protocol::TelemetryReport;
use heapless::Vec;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_STATUS_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    Ready,
    Loading,
    Full,
    Maintenance,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    Stable,
    WarningHeel,
    WarningDraft,
    WarningStability,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipStatus {
    pub operational_status: OperationalStatus,
    pub safety_status: SafetyStatus,
    pub timestamp: u64,
    pub message: Option<String>,
}

/// Telemetry limits that drive the safety evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SafetyThresholds {
    pub max_heel_deg: f64,
    pub warning_heel_deg: f64,
    pub min_gm_m: f64,
    pub optimal_gm_m: f64,
    pub max_draft_percentage: f64,
    pub warning_draft_percentage: f64,
    pub design_draught_m: f64,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            max_heel_deg: 5.0,
            warning_heel_deg: 3.0,
            min_gm_m: 0.5,
            optimal_gm_m: 2.0,
            max_draft_percentage: 95.0,
            warning_draft_percentage: 85.0,
            design_draught_m: 12.0,
        }
    }
}

fn operational_for(safety: SafetyStatus) -> OperationalStatus {
    // Warnings keep the ship accepting containers, with caution.
    if safety == SafetyStatus::Critical {
        OperationalStatus::Error
    } else {
        OperationalStatus::Ready
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Maps telemetry onto discrete safety/operational states and decides what
/// gets published. Runs for the process lifetime; there is no terminal
/// state.
#[derive(Debug)]
pub struct StatusManager {
    current: ShipStatus,
    thresholds: SafetyThresholds,
    history: Vec<ShipStatus, MAX_STATUS_HISTORY>,
}

impl StatusManager {
    pub fn new() -> Self {
        Self {
            current: ShipStatus {
                operational_status: OperationalStatus::Ready,
                safety_status: SafetyStatus::Stable,
                timestamp: now_millis(),
                message: None,
            },
            thresholds: SafetyThresholds::default(),
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &ShipStatus {
        &self.current
    }

    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    pub fn history(&self) -> &[ShipStatus] {
        &self.history
    }

    /// Evaluate heel, GM, and draft in that order, accumulating messages.
    /// Returns the status to publish, or `None` for a clean repeat of the
    /// previous safety state.
    pub fn update_from_telemetry(&mut self, telemetry: &TelemetryReport) -> Option<ShipStatus> {
        let mut safety = SafetyStatus::Stable;
        let mut messages: std::vec::Vec<String> = std::vec::Vec::new();

        let heel = telemetry.stability.heel_angle;
        if heel.abs() > self.thresholds.max_heel_deg {
            safety = SafetyStatus::Critical;
            messages.push(format!("Critical heel angle: {heel:.1}°"));
        } else if heel.abs() > self.thresholds.warning_heel_deg {
            safety = SafetyStatus::WarningHeel;
            messages.push(format!("High heel angle: {heel:.1}°"));
        }

        let gm = telemetry.stability.gm;
        if gm < self.thresholds.min_gm_m {
            safety = SafetyStatus::Critical;
            messages.push(format!("Critical GM distance: {gm:.2}m"));
        } else if gm < self.thresholds.optimal_gm_m {
            if safety != SafetyStatus::Critical {
                safety = SafetyStatus::WarningStability;
            }
            messages.push(format!("Low GM distance: {gm:.2}m"));
        }

        let draught = telemetry.draught;
        let draft_percentage = (draught / self.thresholds.design_draught_m) * 100.0;
        if draft_percentage > self.thresholds.max_draft_percentage {
            safety = SafetyStatus::Critical;
            messages.push(format!("Critical draft: {draught:.2}m"));
        } else if draft_percentage > self.thresholds.warning_draft_percentage {
            if safety != SafetyStatus::Critical {
                safety = SafetyStatus::WarningDraft;
            }
            messages.push(format!("High draft: {draught:.2}m"));
        }

        if safety == self.current.safety_status && messages.is_empty() {
            return None;
        }

        let status = ShipStatus {
            operational_status: operational_for(safety),
            safety_status: safety,
            timestamp: now_millis(),
            message: if messages.is_empty() {
                None
            } else {
                Some(messages.join(" | "))
            },
        };
        self.record(status.clone());
        Some(status)
    }

    /// Explicit transition while a container request is in flight. Always
    /// published.
    pub fn set_loading_status(&mut self) -> ShipStatus {
        self.transition(
            OperationalStatus::Loading,
            Some("Processing container request".to_string()),
        )
    }

    pub fn set_ready_status(&mut self, message: &str) -> ShipStatus {
        self.transition(OperationalStatus::Ready, Some(message.to_string()))
    }

    pub fn set_maintenance_status(&mut self, message: Option<&str>) -> ShipStatus {
        let message = message.unwrap_or("Scheduled maintenance").to_string();
        self.transition(OperationalStatus::Maintenance, Some(message))
    }

    pub fn set_error_status(&mut self, message: &str) -> ShipStatus {
        self.transition(OperationalStatus::Error, Some(message.to_string()))
    }

    fn transition(&mut self, operational: OperationalStatus, message: Option<String>) -> ShipStatus {
        let status = ShipStatus {
            operational_status: operational,
            safety_status: self.current.safety_status,
            timestamp: now_millis(),
            message,
        };
        self.record(status.clone());
        status
    }

    fn record(&mut self, status: ShipStatus) {
        self.current = status.clone();
        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(status);
    }
}

impl Default for StatusManager {
    fn default() -> Self {
        Self::new()
    }
}
