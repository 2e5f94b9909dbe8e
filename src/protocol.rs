use crate::grid::Container;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Closed set of administrative simulation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimCommand {
    Initialize,
    DumpState,
    Emergency,
    ClearEmergency,
    EnableFaultInjection,
    DisableFaultInjection,
}

impl SimCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SimCommand::Initialize => "INITIALIZE",
            SimCommand::DumpState => "DUMP_STATE",
            SimCommand::Emergency => "EMERGENCY",
            SimCommand::ClearEmergency => "CLEAR_EMERGENCY",
            SimCommand::EnableFaultInjection => "ENABLE_FAULT_INJECTION",
            SimCommand::DisableFaultInjection => "DISABLE_FAULT_INJECTION",
        }
    }
}

impl FromStr for SimCommand {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INITIALIZE" => Ok(SimCommand::Initialize),
            "DUMP_STATE" => Ok(SimCommand::DumpState),
            "EMERGENCY" => Ok(SimCommand::Emergency),
            "CLEAR_EMERGENCY" => Ok(SimCommand::ClearEmergency),
            "ENABLE_FAULT_INJECTION" => Ok(SimCommand::EnableFaultInjection),
            "DISABLE_FAULT_INJECTION" => Ok(SimCommand::DisableFaultInjection),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid command: {0}")]
    UnknownCommand(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// Inbound command envelope payload: a string-keyed command plus optional
/// free-form parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Outbound response, exactly one per inbound command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command: Option<String>,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn success(command: Option<String>, message: Option<String>) -> Self {
        Self {
            command,
            status: ResponseStatus::Success,
            message,
        }
    }

    pub fn error(command: Option<String>, message: String) -> Self {
        Self {
            command,
            status: ResponseStatus::Error,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub x: usize,
    pub y: usize,
}

/// Inbound container placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerAddRequest {
    pub container: Container,
    pub position: SlotPosition,
}

/// Inbound container removal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRemoveRequest {
    pub position: SlotPosition,
}

/// Stability figures at a given heel angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    #[serde(rename = "KB")]
    pub kb: f64,
    #[serde(rename = "BM")]
    pub bm: f64,
    #[serde(rename = "KG")]
    pub kg: f64,
    #[serde(rename = "GM")]
    pub gm: f64,
    #[serde(rename = "GZ")]
    pub gz: f64,
    pub righting_moment: f64,
    pub effective_beam: f64,
    pub waterplane_area: f64,
    pub heel_angle: f64,
}

/// Outbound telemetry: equilibrium stability merged with the current
/// draught.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReport {
    #[serde(flatten)]
    pub stability: StabilityReport,
    pub draught: f64,
}

/// Auxiliary loading figures reported alongside the draught.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DraughtInfo {
    pub draught: f64,
    pub displacement_volume: f64,
    pub design_draught: f64,
    pub load_percentage: f64,
    pub total_weight: f64,
    pub containers_per_row: usize,
}
