use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time parameters for a ship instance.
///
/// Only consumed at startup or on a reinitialization command; a running
/// engine never reads it again. Partial parameter payloads are allowed:
/// missing fields fall back to the defaults below, unknown fields are
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub width_slots: usize,
    pub height_slots: usize,
    pub container_width: f64,
    pub container_height: f64,
    pub hull_width: f64,
    pub hull_length: f64,
    pub design_draught: f64,
    pub hull_weight: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width_slots: 5,
            height_slots: 5,
            container_width: 2.4,
            container_height: 2.6,
            hull_width: 30.0,
            hull_length: 180.0,
            design_draught: 12.0,
            hull_weight: 8_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}

impl SimulationConfig {
    /// Missing or non-physical configuration is the one fatal error class:
    /// it aborts startup and turns INITIALIZE into an error response.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width_slots == 0 {
            return Err(ConfigError::NonPositive("width_slots"));
        }
        if self.height_slots == 0 {
            return Err(ConfigError::NonPositive("height_slots"));
        }
        if self.container_width <= 0.0 {
            return Err(ConfigError::NonPositive("container_width"));
        }
        if self.container_height <= 0.0 {
            return Err(ConfigError::NonPositive("container_height"));
        }
        if self.hull_width <= 0.0 {
            return Err(ConfigError::NonPositive("hull_width"));
        }
        if self.hull_length <= 0.0 {
            return Err(ConfigError::NonPositive("hull_length"));
        }
        if self.design_draught <= 0.0 {
            return Err(ConfigError::NonPositive("design_draught"));
        }
        if self.hull_weight <= 0.0 {
            return Err(ConfigError::NonPositive("hull_weight"));
        }
        Ok(())
    }
}
