use crate::config::{ConfigError, SimulationConfig};
use crate::fault_injection::FaultInjector;
use crate::grid::{Container, LoadingGrid, PlacementError, RemovalError};
use crate::protocol::{DraughtInfo, StabilityReport, TelemetryReport};

pub const WATER_DENSITY_KG_M3: f64 = 1025.0;
pub const BLOCK_COEFFICIENT: f64 = 0.6;
pub const CONTAINER_LENGTH_M: f64 = 6.1;
pub const GRAVITY_M_S2: f64 = 9.81;

const EQUILIBRIUM_MAX_ITERATIONS: usize = 30;
const EQUILIBRIUM_TOLERANCE_DEG: f64 = 0.1;

/// Hull constants fixed at construction.
#[derive(Debug, Clone)]
pub struct HullParameters {
    pub length_m: f64,
    pub beam_m: f64,
    pub weight_kg: f64,
    pub center_of_mass: (f64, f64),
    pub design_draught_m: f64,
    /// Containers that fit along the hull; the 2-D grid is one transverse
    /// slice repeated this many times lengthwise.
    pub length_slots: usize,
}

/// Wall-sided hydrostatic model of a loaded container ship.
///
/// Owns the loading grid and the fault injector; placement, removal, and
/// every derived figure (draught, center of mass, heel equilibrium) go
/// through this type. Accuracy target is a control-loop teaching rig, not a
/// certified stability calculation.
#[derive(Debug)]
pub struct ShipSimulation {
    grid: LoadingGrid,
    hull: HullParameters,
    fault_injector: FaultInjector,
}

impl ShipSimulation {
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = LoadingGrid::new(
            config.width_slots,
            config.height_slots,
            config.container_width,
            config.container_height,
        );
        let total_height = config.height_slots as f64 * config.container_height;
        let hull = HullParameters {
            length_m: config.hull_length,
            beam_m: config.hull_width,
            weight_kg: config.hull_weight,
            center_of_mass: (0.0, total_height * 0.42),
            design_draught_m: config.design_draught,
            length_slots: (config.hull_length / CONTAINER_LENGTH_M) as usize,
        };
        Ok(Self {
            grid,
            fault_injector: FaultInjector::new(config.width_slots, config.height_slots),
            hull,
        })
    }

    pub fn grid(&self) -> &LoadingGrid {
        &self.grid
    }

    pub fn hull(&self) -> &HullParameters {
        &self.hull
    }

    pub fn fault_injector(&self) -> &FaultInjector {
        &self.fault_injector
    }

    pub fn enable_fault_injection(&mut self) {
        self.fault_injector.enable();
    }

    pub fn disable_fault_injection(&mut self) {
        self.fault_injector.disable();
    }

    /// Hull weight plus every container scaled by the lengthwise slot count.
    pub fn total_weight(&self) -> f64 {
        let length_slots = self.hull.length_slots as f64;
        self.hull.weight_kg
            + self
                .grid
                .occupied()
                .map(|(_, _, container)| container.weight * length_slots)
                .sum::<f64>()
    }

    /// Mass-weighted average of the hull center of mass and each occupied
    /// slot center. Falls back to the hull's own center of mass for a zero
    /// total mass.
    pub fn center_of_mass(&self) -> (f64, f64) {
        let mut total_mass = self.hull.weight_kg;
        let mut moment_x = self.hull.weight_kg * self.hull.center_of_mass.0;
        let mut moment_y = self.hull.weight_kg * self.hull.center_of_mass.1;

        for (y, x, container) in self.grid.occupied() {
            total_mass += container.weight;
            moment_x += container.weight * self.grid.x_coord(x);
            moment_y += container.weight * self.grid.y_coord(y);
        }

        if total_mass == 0.0 {
            return self.hull.center_of_mass;
        }
        (moment_x / total_mass, moment_y / total_mass)
    }

    /// Draught from displaced volume through the block coefficient.
    pub fn draught(&self) -> (f64, DraughtInfo) {
        let total_weight = self.total_weight();
        let displacement_volume = total_weight / WATER_DENSITY_KG_M3;
        let draught = displacement_volume
            / (self.hull.length_m * self.hull.beam_m * BLOCK_COEFFICIENT);
        let info = DraughtInfo {
            draught,
            displacement_volume,
            design_draught: self.hull.design_draught_m,
            load_percentage: (draught / self.hull.design_draught_m) * 100.0,
            total_weight,
            containers_per_row: self.hull.length_slots,
        };
        (draught, info)
    }

    fn kb_ratio() -> f64 {
        // V-shaped hulls (low block coefficient) carry buoyancy lower.
        0.45 + 0.15 * BLOCK_COEFFICIENT
    }

    /// Stability figures at a given heel angle, wall-sided approximation.
    pub fn stability_at_heel(&self, heel_angle_deg: f64) -> StabilityReport {
        let heel_rad = heel_angle_deg.to_radians();
        let (draught, _) = self.draught();
        let cos_heel = heel_rad.cos();
        let sin_heel = heel_rad.sin();

        let effective_beam = self.hull.beam_m * cos_heel;
        let waterplane_area = self.hull.length_m * effective_beam;
        let second_moment = self.hull.length_m * effective_beam.powi(3) / 12.0;
        let displaced_volume = self.total_weight() / WATER_DENSITY_KG_M3;

        // KB rises with heel as the immersed shape changes.
        let kb = Self::kb_ratio() * draught + draught * (1.0 - cos_heel) * 0.5;
        let bm = if displaced_volume > 0.0 {
            second_moment / displaced_volume
        } else {
            0.0
        };
        let kg = self.center_of_mass().1 + draught;
        let gm = kb + bm - kg;

        // First-order righting arm plus the wall-sided correction that keeps
        // it honest at larger angles.
        let gz = gm * sin_heel - 0.5 * self.hull.beam_m * sin_heel.powi(2) / displaced_volume;

        StabilityReport {
            kb,
            bm,
            kg,
            gm,
            gz,
            righting_moment: gz * self.total_weight() * GRAVITY_M_S2,
            effective_beam,
            waterplane_area,
            heel_angle: heel_angle_deg,
        }
    }

    /// Off-center cargo moment about the keel, with the lever arm shortened
    /// by the cosine of the current heel.
    fn heeling_moment(&self, heel_angle_deg: f64) -> f64 {
        let cos_heel = heel_angle_deg.to_radians().cos();
        let length_slots = self.hull.length_slots as f64;
        self.grid
            .occupied()
            .map(|(_, x, container)| {
                (container.weight * length_slots)
                    * (self.grid.x_coord(x) * cos_heel)
                    * GRAVITY_M_S2
            })
            .sum()
    }

    /// Fixed-point iteration toward the heel where heeling and righting
    /// moments balance. Exhausting the iteration budget returns the last
    /// computed pair; callers cannot distinguish that from a converged
    /// result.
    pub fn equilibrium_heel(&self) -> (f64, StabilityReport) {
        let mut heel_deg = 0.0_f64;
        let mut stability = self.stability_at_heel(heel_deg);

        for _ in 0..EQUILIBRIUM_MAX_ITERATIONS {
            let heeling_moment = self.heeling_moment(heel_deg);
            let new_heel = (heeling_moment
                / (self.total_weight() * GRAVITY_M_S2 * stability.gm))
                .atan()
                .to_degrees();

            if (new_heel - heel_deg).abs() < EQUILIBRIUM_TOLERANCE_DEG {
                return (new_heel, stability);
            }

            // Averaging damps the oscillation of the raw fixed point.
            heel_deg = (heel_deg + new_heel) / 2.0;
            stability = self.stability_at_heel(heel_deg);
        }

        (heel_deg, stability)
    }

    /// Cheap non-iterative heel estimate from GM at zero heel. Infinite when
    /// the upright GM is not positive.
    pub fn heel_estimate(&self) -> f64 {
        let gm = self.stability_at_heel(0.0).gm;
        if gm <= 0.0 {
            return f64::INFINITY;
        }
        let heeling_moment = self.heeling_moment(0.0);
        (heeling_moment / (self.total_weight() * gm * GRAVITY_M_S2))
            .atan()
            .to_degrees()
    }

    pub fn telemetry(&self) -> TelemetryReport {
        let (_, stability) = self.equilibrium_heel();
        let (draught, _) = self.draught();
        TelemetryReport { stability, draught }
    }

    pub fn validate_placement(&self, x: usize, y: usize) -> Result<(), PlacementError> {
        self.grid.validate_placement(x, y)
    }

    /// Validate, run fault injection, and place. Returns the quick heel
    /// estimate for the new loading condition.
    pub fn place_container(
        &mut self,
        container: Container,
        x: usize,
        y: usize,
    ) -> Result<f64, PlacementError> {
        self.grid.validate_placement(x, y)?;
        let container = self.fault_injector.apply(container, y, x);
        self.grid.place(container, x, y)?;
        Ok(self.heel_estimate())
    }

    /// Clear a topmost cell and return the removed container with the new
    /// equilibrium heel.
    pub fn remove_container(&mut self, x: usize, y: usize) -> Result<(Container, f64), RemovalError> {
        let removed = self.grid.remove(x, y)?;
        let (heel_angle, _) = self.equilibrium_heel();
        Ok((removed, heel_angle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation() -> ShipSimulation {
        ShipSimulation::new(&SimulationConfig::default()).unwrap()
    }

    fn container(id: &str, weight: f64) -> Container {
        Container {
            weight,
            container_id: id.to_string(),
        }
    }

    #[test]
    fn length_slots_from_hull_and_container_length() {
        let sim = simulation();
        // 180.0 / 6.1 = 29.5..., truncated.
        assert_eq!(sim.hull().length_slots, 29);
    }

    #[test]
    fn empty_ship_draught_matches_hand_calculation() {
        let sim = simulation();
        let (draught, info) = sim.draught();
        // 8_000_000 / 1025 / (180 * 30 * 0.6)
        assert!((draught - 2.4088).abs() < 0.001);
        assert!((info.load_percentage - 20.07).abs() < 0.05);
        assert!((info.total_weight - 8_000_000.0).abs() < f64::EPSILON);
        assert_eq!(info.containers_per_row, 29);
    }

    #[test]
    fn empty_ship_center_of_mass_is_hull_center_of_mass() {
        let sim = simulation();
        let com = sim.center_of_mass();
        assert!((com.0 - 0.0).abs() < f64::EPSILON);
        // total_height (13.0) * 0.42
        assert!((com.1 - 5.46).abs() < 1e-9);
    }

    #[test]
    fn empty_ship_sits_upright() {
        let sim = simulation();
        let (heel, stability) = sim.equilibrium_heel();
        assert!(heel.abs() < 1e-9);
        assert!(stability.gm > 0.0);
    }

    #[test]
    fn total_weight_scales_by_length_slots() {
        let mut sim = simulation();
        sim.place_container(container("c1", 10_000.0), 2, 0).unwrap();
        let expected = 8_000_000.0 + 10_000.0 * 29.0;
        assert!((sim.total_weight() - expected).abs() < 1e-6);
    }

    #[test]
    fn symmetric_loading_heels_nothing() {
        let mut sim = simulation();
        sim.place_container(container("port", 20_000.0), 0, 0).unwrap();
        sim.place_container(container("starboard", 20_000.0), 4, 0)
            .unwrap();

        let (heel, _) = sim.equilibrium_heel();
        assert_eq!(heel, 0.0);
        assert_eq!(sim.heel_estimate(), 0.0);
    }

    #[test]
    fn offset_loading_heels_toward_the_cargo() {
        let mut sim = simulation();
        sim.place_container(container("c1", 20_000.0), 4, 0).unwrap();
        let (heel, _) = sim.equilibrium_heel();
        assert!(heel > 0.0);
        assert!(heel < 5.0);

        let mut mirrored = simulation();
        mirrored
            .place_container(container("c1", 20_000.0), 0, 0)
            .unwrap();
        let (mirrored_heel, _) = mirrored.equilibrium_heel();
        assert!((heel + mirrored_heel).abs() < 1e-6);
    }

    #[test]
    fn telemetry_merges_equilibrium_and_draught() {
        let mut sim = simulation();
        sim.place_container(container("c1", 20_000.0), 3, 0).unwrap();
        let telemetry = sim.telemetry();
        let (draught, _) = sim.draught();
        let (heel, _) = sim.equilibrium_heel();
        assert!((telemetry.draught - draught).abs() < f64::EPSILON);
        assert!((telemetry.stability.heel_angle - heel).abs() < EQUILIBRIUM_TOLERANCE_DEG);
    }

    #[test]
    fn stability_at_zero_heel_has_upright_geometry() {
        let sim = simulation();
        let report = sim.stability_at_heel(0.0);
        assert!((report.effective_beam - 30.0).abs() < 1e-9);
        assert!((report.waterplane_area - 5400.0).abs() < 1e-9);
        assert!((report.gz).abs() < 1e-9);
        assert!((report.righting_moment).abs() < 1e-3);
    }

    #[test]
    fn heel_reduces_effective_beam() {
        let sim = simulation();
        let upright = sim.stability_at_heel(0.0);
        let heeled = sim.stability_at_heel(10.0);
        assert!(heeled.effective_beam < upright.effective_beam);
        assert!(heeled.bm < upright.bm);
        assert!(heeled.kb > upright.kb);
    }

    #[test]
    fn placement_failure_leaves_grid_unchanged() {
        let mut sim = simulation();
        let result = sim.place_container(container("c1", 20_000.0), 0, 2);
        assert_eq!(result, Err(PlacementError::NoSupport));
        assert_eq!(sim.grid().occupied_count(), 0);
        assert!(sim.grid().stacking_invariant_holds());
    }

    #[test]
    fn removal_updates_equilibrium() {
        let mut sim = simulation();
        sim.place_container(container("c1", 20_000.0), 4, 0).unwrap();
        let (removed, heel) = sim.remove_container(4, 0).unwrap();
        assert_eq!(removed.container_id, "c1");
        assert!(heel.abs() < 1e-9);
        assert_eq!(sim.grid().occupied_count(), 0);
    }

    #[test]
    fn faulty_slot_stores_corrupted_weight_in_grid() {
        let mut sim = simulation();
        sim.enable_fault_injection();
        sim.place_container(container("base0", 10_000.0), 0, 0).unwrap();
        sim.place_container(container("base1", 10_000.0), 0, 1).unwrap();
        // Row 2 is the lowest faulty slot of column 0 on a 5-row grid.
        sim.place_container(container("target", 10_000.0), 0, 2)
            .unwrap();

        let placed = sim.grid().get(2, 0).unwrap();
        assert!((placed.weight - 23_000.0).abs() < 1e-9);
        assert_eq!(sim.fault_injector().faulty_weight("target"), Some(placed.weight));
    }
}
