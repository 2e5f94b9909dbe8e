use crate::grid::Container;
use std::collections::HashMap;
use tracing::{info, warn};

/// Weight multiplier applied to a container when its slot is selected for
/// corruption.
const FAULTY_WEIGHT_MODIFIER: f64 = 2.3;

/// Column whose topmost slots carry the corruption, and how many of them.
const FAULTY_COLUMN: usize = 0;
const FAULTY_SLOT_COUNT: usize = 3;

/// Deterministic weight corruption keyed by slot and container identity.
///
/// A slot from `faulty_positions` corrupts the first container placed into
/// it while injection is enabled; the corrupted weight is then pinned to
/// that container's identity for the lifetime of the engine instance, so a
/// removed container comes back just as heavy no matter where it lands or
/// whether injection has since been disabled.
#[derive(Debug)]
pub struct FaultInjector {
    enabled: bool,
    width_slots: usize,
    faulty_positions: Vec<(usize, usize)>,
    injected_marks: Vec<bool>,
    faulty_weights: HashMap<String, f64>,
}

impl FaultInjector {
    pub fn new(width_slots: usize, height_slots: usize) -> Self {
        let faulty_positions = (1..=FAULTY_SLOT_COUNT)
            .filter_map(|offset| height_slots.checked_sub(offset))
            .map(|y| (y, FAULTY_COLUMN))
            .collect();
        Self {
            enabled: false,
            width_slots,
            faulty_positions,
            injected_marks: vec![false; width_slots * height_slots],
            faulty_weights: HashMap::new(),
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        info!("fault injection enabled");
    }

    /// Disabling stops new injections and frees the per-slot marks, but the
    /// per-identity weight overrides survive until the engine instance is
    /// replaced. Containers already on the grid keep their corrupted weight
    /// either way.
    pub fn disable(&mut self) {
        self.enabled = false;
        for mark in &mut self.injected_marks {
            *mark = false;
        }
        info!("fault injection disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn faulty_positions(&self) -> &[(usize, usize)] {
        &self.faulty_positions
    }

    /// Stored weight override for a container identity, if it was ever
    /// injected under this engine instance.
    pub fn faulty_weight(&self, container_id: &str) -> Option<f64> {
        self.faulty_weights.get(container_id).copied()
    }

    /// Applied to every accepted placement at `(y, x)` before the container
    /// reaches the grid.
    pub fn apply(&mut self, container: Container, y: usize, x: usize) -> Container {
        let mark_index = y * self.width_slots + x;
        if self.enabled
            && self.faulty_positions.contains(&(y, x))
            && !self.injected_marks[mark_index]
        {
            let faulty_weight = container.weight * FAULTY_WEIGHT_MODIFIER;
            self.injected_marks[mark_index] = true;
            self.faulty_weights
                .insert(container.container_id.clone(), faulty_weight);
            warn!(
                container_id = %container.container_id,
                slot_y = y,
                slot_x = x,
                original_weight = container.weight,
                faulty_weight,
                "fault injected into container weight"
            );
            return Container {
                weight: faulty_weight,
                container_id: container.container_id,
            };
        }

        if let Some(&stored_weight) = self.faulty_weights.get(&container.container_id) {
            info!(
                container_id = %container.container_id,
                stored_weight,
                "reapplying stored faulty weight"
            );
            return Container {
                weight: stored_weight,
                container_id: container.container_id,
            };
        }

        container
    }
}
