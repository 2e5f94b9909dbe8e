use crate::bus::{BusTx, Envelope, ShipTopics};
use crate::config::SimulationConfig;
use crate::protocol::{
    CommandResponse, ContainerAddRequest, ContainerRemoveRequest, ProtocolError, SimCommand,
};
use crate::simulation::ShipSimulation;
use crate::status::StatusManager;
use crate::grid::Container;
use tracing::{info, warn};

/// Result of a container placement request.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub accepted: bool,
    pub message: String,
    pub heel_angle: f64,
}

/// Result of a container removal request.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveOutcome {
    pub accepted: bool,
    pub message: String,
    pub heel_angle: Option<f64>,
    pub removed: Option<Container>,
}

/// The simulator node: dispatches inbound container events and commands to
/// the engine, the validator/fault injector, and the status machine, and
/// publishes telemetry, status, and responses back through the bus.
///
/// Every handler takes `&mut self` and contains no await point, so wrapping
/// the node in a single `Arc<Mutex<_>>` (as the binaries do) guarantees at
/// most one in-flight mutation per engine instance, INITIALIZE included.
#[derive(Debug)]
pub struct ShipNode {
    ship_id: String,
    config: SimulationConfig,
    simulation: ShipSimulation,
    status: StatusManager,
    topics: ShipTopics,
    bus: BusTx,
    emergency_mode: bool,
}

impl ShipNode {
    pub fn new(
        ship_id: &str,
        config: SimulationConfig,
        bus: BusTx,
    ) -> Result<Self, crate::config::ConfigError> {
        let simulation = ShipSimulation::new(&config)?;
        Ok(Self {
            ship_id: ship_id.to_string(),
            topics: ShipTopics::new(ship_id),
            config,
            simulation,
            status: StatusManager::new(),
            bus,
            emergency_mode: false,
        })
    }

    pub fn ship_id(&self) -> &str {
        &self.ship_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn simulation(&self) -> &ShipSimulation {
        &self.simulation
    }

    pub fn status(&self) -> &StatusManager {
        &self.status
    }

    pub fn topics(&self) -> &ShipTopics {
        &self.topics
    }

    pub fn emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    /// Publish the boot telemetry and let the status machine take its first
    /// look at it.
    pub fn publish_startup(&mut self) {
        let telemetry = self.simulation.telemetry();
        self.bus.publish(&self.topics.telemetry, &telemetry);
        if let Some(status) = self.status.update_from_telemetry(&telemetry) {
            self.bus.publish(&self.topics.status, &status);
        }
        info!(ship_id = %self.ship_id, "ship simulation node started");
    }

    /// Route an inbound envelope to the matching handler.
    pub fn handle_envelope(&mut self, envelope: &Envelope) {
        if envelope.topic == self.topics.container_incoming {
            match serde_json::from_value::<ContainerAddRequest>(envelope.payload.clone()) {
                Ok(request) => {
                    self.handle_container_add(request);
                }
                Err(e) => self.publish_payload_error(&format!("Bad container request: {e}")),
            }
        } else if envelope.topic == self.topics.container_outgoing {
            match serde_json::from_value::<ContainerRemoveRequest>(envelope.payload.clone()) {
                Ok(request) => {
                    self.handle_container_remove(request);
                }
                Err(e) => self.publish_payload_error(&format!("Bad removal request: {e}")),
            }
        } else if envelope.topic == self.topics.commands {
            self.handle_command(&envelope.payload);
        } else {
            warn!(topic = %envelope.topic, "no handler for topic");
        }
    }

    fn publish_payload_error(&mut self, message: &str) {
        warn!(ship_id = %self.ship_id, reason = %message, "rejecting undecodable payload");
        let status = self.status.set_error_status(message);
        self.bus.publish(&self.topics.status, &status);
    }

    /// Full placement flow: LOADING status, validation, emergency gate,
    /// fault injection, placement, then telemetry/status publication.
    /// Telemetry goes out whether or not the placement was accepted.
    pub fn handle_container_add(&mut self, request: ContainerAddRequest) -> AddOutcome {
        info!(
            ship_id = %self.ship_id,
            container_id = %request.container.container_id,
            x = request.position.x,
            y = request.position.y,
            "received container placement request"
        );
        let loading = self.status.set_loading_status();
        self.bus.publish(&self.topics.status, &loading);

        let outcome = self.apply_add(request);

        self.publish_telemetry_and_status();
        if outcome.accepted {
            info!(ship_id = %self.ship_id, "container placement successful: {}", outcome.message);
        } else {
            warn!(ship_id = %self.ship_id, "container placement failed: {}", outcome.message);
        }
        outcome
    }

    fn apply_add(&mut self, request: ContainerAddRequest) -> AddOutcome {
        let (x, y) = (request.position.x, request.position.y);
        if let Err(e) = self.simulation.validate_placement(x, y) {
            return AddOutcome {
                accepted: false,
                message: e.to_string(),
                heel_angle: 0.0,
            };
        }
        if self.emergency_mode {
            return AddOutcome {
                accepted: false,
                message: "Emergency mode active, container rejected".to_string(),
                heel_angle: 0.0,
            };
        }
        match self.simulation.place_container(request.container, x, y) {
            Ok(heel_angle) => AddOutcome {
                accepted: true,
                message: format!("Container added. New heel angle: {heel_angle:.1}°"),
                heel_angle,
            },
            Err(e) => AddOutcome {
                accepted: false,
                message: e.to_string(),
                heel_angle: 0.0,
            },
        }
    }

    /// Removal flow; mirrors the add flow, returning the removed container
    /// on success.
    pub fn handle_container_remove(&mut self, request: ContainerRemoveRequest) -> RemoveOutcome {
        info!(
            ship_id = %self.ship_id,
            x = request.position.x,
            y = request.position.y,
            "received container removal request"
        );
        let loading = self.status.set_loading_status();
        self.bus.publish(&self.topics.status, &loading);

        let outcome = match self
            .simulation
            .remove_container(request.position.x, request.position.y)
        {
            Ok((removed, heel_angle)) => RemoveOutcome {
                accepted: true,
                message: format!("Container removed. New heel angle: {heel_angle:.1}°"),
                heel_angle: Some(heel_angle),
                removed: Some(removed),
            },
            Err(e) => RemoveOutcome {
                accepted: false,
                message: e.to_string(),
                heel_angle: None,
                removed: None,
            },
        };

        self.publish_telemetry_and_status();
        if outcome.accepted {
            info!(ship_id = %self.ship_id, "container removal successful: {}", outcome.message);
        } else {
            warn!(ship_id = %self.ship_id, "container removal failed: {}", outcome.message);
        }
        outcome
    }

    fn publish_telemetry_and_status(&mut self) {
        let telemetry = self.simulation.telemetry();
        if let Some(status) = self.status.update_from_telemetry(&telemetry) {
            self.bus.publish(&self.topics.status, &status);
        }
        self.bus.publish(&self.topics.telemetry, &telemetry);
    }

    /// Dispatch an administrative command and publish exactly one response
    /// after the action completes, success or error.
    pub fn handle_command(&mut self, payload: &serde_json::Value) -> CommandResponse {
        let command_name = payload
            .get("command")
            .and_then(|value| value.as_str())
            .map(str::to_string);

        let response = match self.dispatch_command(payload, command_name.as_deref()) {
            Ok(message) => CommandResponse::success(command_name, message),
            Err(e) => {
                warn!(ship_id = %self.ship_id, "command rejected: {e}");
                CommandResponse::error(command_name, e.to_string())
            }
        };
        self.bus.publish(&self.topics.command_response, &response);
        response
    }

    fn dispatch_command(
        &mut self,
        payload: &serde_json::Value,
        command_name: Option<&str>,
    ) -> Result<Option<String>, ProtocolError> {
        let name = command_name
            .ok_or_else(|| ProtocolError::MalformedPayload("missing command field".to_string()))?;
        let command: SimCommand = name.parse()?;
        info!(ship_id = %self.ship_id, command = command.as_str(), "executing command");

        match command {
            SimCommand::EnableFaultInjection => {
                self.simulation.enable_fault_injection();
                Ok(Some("Fault injection enabled".to_string()))
            }
            SimCommand::DisableFaultInjection => {
                self.simulation.disable_fault_injection();
                Ok(Some("Fault injection disabled".to_string()))
            }
            SimCommand::Initialize => {
                let config = match payload.get("params") {
                    Some(params) if !params.is_null() => {
                        serde_json::from_value::<SimulationConfig>(params.clone())
                            .map_err(|e| ProtocolError::InvalidParams(e.to_string()))?
                    }
                    _ => SimulationConfig::default(),
                };
                // The fresh instance replaces the old one wholesale, fault
                // injection state included.
                let simulation = ShipSimulation::new(&config)
                    .map_err(|e| ProtocolError::InvalidParams(e.to_string()))?;
                self.simulation = simulation;
                self.config = config;
                let telemetry = self.simulation.telemetry();
                self.bus.publish(&self.topics.telemetry, &telemetry);
                Ok(Some("Ship reinitialized".to_string()))
            }
            SimCommand::DumpState => {
                let state = serde_json::json!({
                    "config": self.config,
                    "emergency_mode": self.emergency_mode,
                    "container_grid": self.simulation.grid().rows(),
                    "telemetry": self.simulation.telemetry(),
                });
                self.bus.publish(&self.topics.state, &state);
                Ok(Some("State dumped to state topic".to_string()))
            }
            SimCommand::Emergency => {
                self.emergency_mode = true;
                let status = self.status.set_error_status("Emergency mode activated");
                self.bus.publish(&self.topics.status, &status);
                Ok(Some("Emergency mode activated".to_string()))
            }
            SimCommand::ClearEmergency => {
                self.emergency_mode = false;
                let status = self.status.set_ready_status("Emergency mode cleared");
                self.bus.publish(&self.topics.status, &status);
                Ok(Some("Emergency mode cleared".to_string()))
            }
        }
    }
}
