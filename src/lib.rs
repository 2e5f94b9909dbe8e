//! # Container Ship Stability Simulator
//!
//! A digital-twin hydrostatic stability simulator for a container ship,
//! built as one node of a hardware-in-the-loop teaching rig coordinated
//! over a publish/subscribe message bus.
//!
//! ## Features
//!
//! - **Loading grid**: stacked container placement with bounds, support,
//!   and topmost-access rules
//! - **Stability engine**: draught, center of mass, wall-sided stability
//!   figures, and iterative heel equilibrium
//! - **Fault injection**: deterministic weight corruption keyed by slot and
//!   container identity
//! - **Status state machine**: discrete safety/operational states derived
//!   from telemetry with publish-on-change semantics
//! - **Command protocol**: reset, state dump, emergency mode, and fault
//!   injection toggling with one response per command
//!
//! ## Quick Start
//!
//! ```rust
//! use shipsim::bus::BusTx;
//! use shipsim::config::SimulationConfig;
//! use shipsim::node::ShipNode;
//! use shipsim::protocol::{ContainerAddRequest, SlotPosition};
//! use shipsim::grid::Container;
//!
//! let (bus, mut outbound) = BusTx::channel();
//! let mut node = ShipNode::new("1", SimulationConfig::default(), bus).unwrap();
//!
//! let outcome = node.handle_container_add(ContainerAddRequest {
//!     container: Container { weight: 20_000.0, container_id: "MSKU-1001".into() },
//!     position: SlotPosition { x: 2, y: 0 },
//! });
//! assert!(outcome.accepted);
//! assert!(outbound.try_recv().is_ok());
//! ```
//!
//! ## Architecture
//!
//! - [`node`] - Orchestrator tying engine, validator, and status machine to
//!   the bus
//! - [`simulation`] - Grid ownership and hydrostatic computations
//! - [`grid`] - Loading grid and placement/removal rules
//! - [`fault_injection`] - Deterministic weight corruption
//! - [`status`] - Safety/operational status state machine
//! - [`protocol`] - Command, response, and telemetry wire types
//! - [`bus`] - Topic namespace and the outbound publisher boundary
//!
//! The transport that keeps the broker connection alive is an external
//! collaborator; this crate only produces and consumes [`bus::Envelope`]
//! records.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod bus;
pub mod config;
pub mod fault_injection;
pub mod grid;
pub mod node;
pub mod protocol;
pub mod simulation;
pub mod status;

// Re-export main public types for convenience
pub use bus::{BusTx, Envelope, ShipTopics};
pub use config::SimulationConfig;
pub use grid::Container;
pub use node::ShipNode;
pub use protocol::{CommandResponse, SimCommand, TelemetryReport};
pub use simulation::ShipSimulation;
pub use status::{OperationalStatus, SafetyStatus, ShipStatus, StatusManager};
