//! Thermal state of one block
//!
//! A cell owns its material constants, its conduction edges and the list of
//! faces the exposure mapper found open to the outside. [`ThermalCell::step`]
//! advances it by one explicit time step; the grid gathers the conductive
//! flux first with [`gather_conduction`] so the store is only borrowed
//! mutably for the cell being updated.

use rustc_hash::FxHashMap;
use tracing::warn;

use super::heat_transfer::{
    capacitance_inverse, conduction_flux, convective_flux, radiative_flux, solar_flux,
    stability_coefficient, temperature_change,
};
use crate::core_types::{Direction, ThermalCellDefinition, ThermalSettings};
use crate::environment::FrameEnvironment;
use crate::grid::{BlockDescriptor, BlockId, CellHandle, FreeList, GridId, RadiationNode};

/// A cell identified across structures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub grid: GridId,
    pub id: i32,
}

/// Where a conduction edge leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborTarget {
    /// Another cell of the same grid
    Local(CellHandle),
    /// A cell of a mechanically attached grid
    Remote(CellAddress),
}

/// One conduction edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborEdge {
    pub target: NeighborTarget,
    /// Touching unit faces
    pub touching: f32,
    /// `min(selfArea, neighborArea)` in m²
    pub contact_area: f32,
}

/// Damage owed to a block that ran past its critical temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockDamage {
    pub grid: GridId,
    pub block: BlockId,
    pub amount: f32,
}

/// Per-pass inputs shared by every cell of a grid
#[derive(Debug, Clone, Copy)]
pub struct CellStep<'a> {
    pub environment: &'a FrameEnvironment,
    pub settings: &'a ThermalSettings,
    /// Grid pass counter the cell gets stamped with
    pub pass: u64,
}

#[derive(Debug, Clone)]
pub struct ThermalCell {
    id: i32,
    grid: GridId,
    block: BlockId,

    temperature: f32,
    last_temperature: f32,
    frame: u64,
    last_delta: f32,

    definition: ThermalCellDefinition,
    face_area: f32,
    capacitance_inverse: f32,
    samples_radiation: bool,

    neighbors: Vec<NeighborEdge>,
    exposed_faces: Vec<Direction>,

    power_output: f32,
    power_input: f32,
    heat_generation: f32,
}

impl ThermalCell {
    /// Cell for `block` with a resolved, sanitized definition
    ///
    /// `face_area` is the area of one lattice face (m²) and `time_scale` the
    /// seconds represented by one step.
    pub fn new(
        grid: GridId,
        block: &BlockDescriptor,
        definition: ThermalCellDefinition,
        face_area: f32,
        time_scale: f32,
    ) -> Self {
        let capacitance_inverse = capacitance_inverse(definition.specific_heat, block.mass);
        let coefficient =
            stability_coefficient(definition.conductivity, face_area, capacitance_inverse, time_scale);
        if coefficient > 1.0 {
            warn!(
                grid = %grid,
                block = %block.id,
                definition = %block.definition,
                coefficient,
                "conduction coefficient above 1, cell will oscillate"
            );
        }

        Self {
            id: block.cell_id(),
            grid,
            block: block.id,
            temperature: 0.0,
            last_temperature: 0.0,
            frame: 0,
            last_delta: 0.0,
            definition,
            face_area,
            capacitance_inverse,
            samples_radiation: block.is_unit(),
            neighbors: Vec::new(),
            exposed_faces: Vec::new(),
            power_output: 0.0,
            power_input: 0.0,
            heat_generation: 0.0,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn address(&self) -> CellAddress {
        CellAddress {
            grid: self.grid,
            id: self.id,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn last_temperature(&self) -> f32 {
        self.last_temperature
    }

    /// Pass counter of the last update
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Temperature change of the last conduction/radiation step
    pub fn last_delta(&self) -> f32 {
        self.last_delta
    }

    pub fn definition(&self) -> &ThermalCellDefinition {
        &self.definition
    }

    pub fn capacitance_inverse(&self) -> f32 {
        self.capacitance_inverse
    }

    pub fn face_area(&self) -> f32 {
        self.face_area
    }

    pub fn neighbors(&self) -> &[NeighborEdge] {
        &self.neighbors
    }

    pub fn exposed_faces(&self) -> &[Direction] {
        &self.exposed_faces
    }

    pub fn exposed_area(&self) -> f32 {
        self.exposed_faces.len() as f32 * self.face_area
    }

    /// Emissivity times exposed area
    pub fn radiative_coefficient(&self) -> f32 {
        self.definition.emissivity * self.exposed_area()
    }

    pub fn heat_generation(&self) -> f32 {
        self.heat_generation
    }

    pub fn power_output(&self) -> f32 {
        self.power_output
    }

    pub fn power_input(&self) -> f32 {
        self.power_input
    }

    /// Overwrite the temperature, ignoring non-finite values and clamping at 0
    pub fn set_temperature(&mut self, temperature: f32) {
        if temperature.is_finite() {
            self.temperature = temperature.max(0.0);
        }
    }

    /// The value neighbors should read during pass `pass`
    ///
    /// Once stamped with the current pass a cell reports its pre-update
    /// temperature so the order of updates within a pass does not count
    /// the same exchange twice.
    pub fn temperature_for_pass(&self, pass: u64) -> f32 {
        if self.frame == pass {
            self.last_temperature
        } else {
            self.temperature
        }
    }

    /// Add an edge, replacing any existing edge to the same target
    pub fn add_neighbor(&mut self, edge: NeighborEdge) {
        match self.neighbors.iter_mut().find(|e| e.target == edge.target) {
            Some(existing) => *existing = edge,
            None => self.neighbors.push(edge),
        }
    }

    pub fn remove_neighbor(&mut self, target: NeighborTarget) -> bool {
        let before = self.neighbors.len();
        self.neighbors.retain(|e| e.target != target);
        self.neighbors.len() != before
    }

    /// Drop every edge, returning them so the caller can unlink the far side
    pub fn take_neighbors(&mut self) -> Vec<NeighborEdge> {
        std::mem::take(&mut self.neighbors)
    }

    /// Remote cells this cell conducts with
    pub fn remote_neighbors(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.neighbors.iter().filter_map(|e| match e.target {
            NeighborTarget::Remote(address) => Some(address),
            NeighborTarget::Local(_) => None,
        })
    }

    pub fn set_exposed_faces(&mut self, faces: Vec<Direction>) {
        self.exposed_faces = faces;
    }

    /// Electrical power produced (W)
    ///
    /// Non-finite readings are ignored; negative ones count as zero.
    pub fn set_power_output(&mut self, watts: f32) -> bool {
        if !watts.is_finite() {
            return false;
        }
        self.power_output = watts.max(0.0);
        self.update_heat();
        true
    }

    /// Electrical power consumed (W)
    ///
    /// Non-finite readings are ignored; negative ones count as zero.
    pub fn set_power_input(&mut self, watts: f32) -> bool {
        if !watts.is_finite() {
            return false;
        }
        self.power_input = watts.max(0.0);
        self.update_heat();
        true
    }

    fn update_heat(&mut self) {
        self.heat_generation = self.power_output * self.definition.producer_waste_energy
            + self.power_input * self.definition.consumer_waste_energy;
    }

    /// Summed sun alignment of the exposed faces
    ///
    /// Unit cells sample and feed the radiation node; larger cells clamp each
    /// face against the node's averages from the previous pass.
    pub fn solar_intensity(&self, environment: &FrameEnvironment, node: &mut RadiationNode) -> f32 {
        let mut intensity = 0.0;
        for face in &self.exposed_faces {
            let dot = environment.sun_alignment(*face);
            if self.samples_radiation {
                node.sample(*face, dot);
                intensity += dot;
            } else {
                intensity += dot.min(node.average(*face));
            }
        }
        intensity
    }

    /// Advance one step given the conductive flux gathered from neighbors
    ///
    /// Returns the damage owed when the cell ends above its critical
    /// temperature and damage is enabled.
    pub fn step(&mut self, conduction: f32, step: &CellStep<'_>, node: &mut RadiationNode) -> Option<BlockDamage> {
        let environment = step.environment;
        let settings = step.settings;

        self.frame = step.pass;
        self.last_temperature = self.temperature;

        let t = self.temperature;
        let ambient = environment.ambient_temperature;
        let exposed_area = self.exposed_area();

        let mut flux = conduction;
        flux += radiative_flux(self.definition.emissivity, exposed_area, t, ambient);
        flux += convective_flux(
            environment.convection_coefficient,
            environment.air_density,
            exposed_area,
            t,
            ambient,
        );

        let irradiance = environment.solar_irradiance(settings);
        if irradiance > 0.0 {
            let intensity = self.solar_intensity(environment, node);
            flux += solar_flux(self.definition.emissivity, self.face_area, irradiance, intensity);
        }

        let time_scale = settings.time_scale_ratio();
        self.last_delta = temperature_change(flux, self.capacitance_inverse, time_scale);
        let generated = temperature_change(self.heat_generation, self.capacitance_inverse, time_scale);
        self.temperature = (t + self.last_delta + generated).max(0.0);

        if !self.temperature.is_finite() {
            self.temperature = self.last_temperature;
        }

        let critical = self.definition.critical_temperature;
        if settings.enable_damage && critical > 0.0 && self.temperature > critical {
            return Some(BlockDamage {
                grid: self.grid,
                block: self.block,
                amount: (self.temperature - critical) * self.definition.critical_temperature_scaler,
            });
        }
        None
    }
}

/// Conductive flux into the cell at `handle` for pass `pass`
///
/// Local neighbors are read from `cells`; remote neighbors from the snapshot
/// taken when the tick started. Missing neighbors contribute nothing.
pub fn gather_conduction(
    cells: &FreeList<ThermalCell>,
    handle: CellHandle,
    pass: u64,
    remote: &FxHashMap<CellAddress, f32>,
) -> f32 {
    let Some(cell) = cells.get(handle) else {
        return 0.0;
    };

    cell.neighbors
        .iter()
        .filter_map(|edge| {
            let t_neighbor = match edge.target {
                NeighborTarget::Local(h) => cells.get(h)?.temperature_for_pass(pass),
                NeighborTarget::Remote(address) => *remote.get(&address)?,
            };
            Some(conduction_flux(
                cell.definition.conductivity,
                edge.contact_area,
                edge.touching,
                cell.temperature,
                t_neighbor,
            ))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{DefinitionId, Vec3i};

    fn settings() -> ThermalSettings {
        ThermalSettings {
            frequency: 1,
            vacuum_temperature: 0.0,
            enable_solar_heat: false,
            ..ThermalSettings::default()
        }
    }

    fn cell(id: u64, x: i32, conductivity: f32) -> ThermalCell {
        let block = BlockDescriptor::new(BlockId(id), Vec3i::new(x, 0, 0), DefinitionId::new("CubeBlock", "Test"))
            .with_mass(4.0);
        let definition = ThermalCellDefinition {
            conductivity,
            specific_heat: 1.0,
            emissivity: 0.0,
            critical_temperature: 0.0,
            ..ThermalCellDefinition::default()
        };
        ThermalCell::new(GridId(1), &block, definition, 1.0, 1.0)
    }

    /// Two linked cells at 400 K and 200 K, returns per-pass temperature differences
    fn run_pair(conductivity: f32, passes: u64) -> Vec<f32> {
        let mut cells = FreeList::new();
        let mut a = cell(1, 0, conductivity);
        let mut b = cell(2, 1, conductivity);
        a.set_temperature(400.0);
        b.set_temperature(200.0);
        let ha = cells.allocate_with(a);
        let hb = cells.allocate_with(b);
        let edge = |target| NeighborEdge {
            target: NeighborTarget::Local(target),
            touching: 1.0,
            contact_area: 1.0,
        };
        cells.get_mut(ha).unwrap().add_neighbor(edge(hb));
        cells.get_mut(hb).unwrap().add_neighbor(edge(ha));

        let settings = settings();
        let environment = FrameEnvironment::vacuum(&settings);
        let mut node = RadiationNode::new();
        let remote = FxHashMap::default();

        let mut diffs = Vec::new();
        for pass in 1..=passes {
            let step = CellStep {
                environment: &environment,
                settings: &settings,
                pass,
            };
            for handle in [ha, hb] {
                let conduction = gather_conduction(&cells, handle, pass, &remote);
                cells.get_mut(handle).unwrap().step(conduction, &step, &mut node);
            }
            let ta = cells.get(ha).unwrap().temperature();
            let tb = cells.get(hb).unwrap().temperature();
            diffs.push(ta - tb);
        }
        diffs
    }

    #[test]
    fn test_stable_pair_converges_monotonically() {
        // k·A·capInv·Δt = 1 · 1 · 0.25 · 1
        let diffs = run_pair(1.0, 8);
        let mut previous = 200.0_f32;
        for d in diffs {
            assert!(d >= 0.0, "difference should not change sign ({d})");
            assert!(d < previous, "difference should shrink ({d} vs {previous})");
            previous = d;
        }
        assert!(previous < 1.0);
    }

    #[test]
    fn test_unstable_pair_oscillates() {
        // coefficient 1.5: each pass multiplies the difference by 1 - 2·1.5 = -2
        let diffs = run_pair(6.0, 2);
        assert!(diffs[0] < 0.0, "first pass should overshoot ({})", diffs[0]);
        assert!(diffs[1] > 0.0, "second pass should swing back ({})", diffs[1]);
        assert!(diffs[1].abs() > diffs[0].abs() && diffs[0].abs() > 200.0);
    }

    #[test]
    fn test_isolated_cell_cools_by_radiation() {
        let block = BlockDescriptor::new(BlockId(1), Vec3i::zeros(), DefinitionId::new("CubeBlock", "Test"));
        let mut cell = ThermalCell::new(GridId(1), &block, ThermalCellDefinition::default(), 6.25, 1.0);
        cell.set_exposed_faces(Direction::ALL.to_vec());
        cell.set_temperature(800.0);

        let settings = settings();
        let environment = FrameEnvironment::vacuum(&settings);
        let mut node = RadiationNode::new();

        let mut previous = cell.temperature();
        for pass in 1..=50 {
            let step = CellStep {
                environment: &environment,
                settings: &settings,
                pass,
            };
            cell.step(0.0, &step, &mut node);
            assert!(cell.temperature() < previous);
            assert!(cell.temperature() >= 0.0);
            previous = cell.temperature();
        }
    }

    #[test]
    fn test_damage_only_above_critical() {
        let block = BlockDescriptor::new(BlockId(9), Vec3i::zeros(), DefinitionId::new("CubeBlock", "Test"));
        let definition = ThermalCellDefinition {
            critical_temperature: 500.0,
            critical_temperature_scaler: 0.5,
            emissivity: 0.0,
            ..ThermalCellDefinition::default()
        };
        let mut cell = ThermalCell::new(GridId(3), &block, definition, 6.25, 1.0);
        let mut settings = settings();
        let environment = FrameEnvironment::vacuum(&settings);
        let mut node = RadiationNode::new();

        cell.set_temperature(400.0);
        let step = CellStep {
            environment: &environment,
            settings: &settings,
            pass: 1,
        };
        assert!(cell.step(0.0, &step, &mut node).is_none());

        cell.set_temperature(600.0);
        let damage = cell.step(0.0, &step, &mut node).unwrap();
        assert_eq!(damage.block, BlockId(9));
        assert!((damage.amount - 50.0).abs() < 1e-3);

        settings.enable_damage = false;
        let step = CellStep {
            environment: &environment,
            settings: &settings,
            pass: 2,
        };
        assert!(cell.step(0.0, &step, &mut node).is_none());
    }

    #[test]
    fn test_power_readings_drive_heat_generation() {
        let block = BlockDescriptor::new(BlockId(1), Vec3i::zeros(), DefinitionId::new("Reactor", "Small"));
        let definition = ThermalCellDefinition {
            producer_waste_energy: 0.1,
            consumer_waste_energy: 0.5,
            ..ThermalCellDefinition::default()
        };
        let mut cell = ThermalCell::new(GridId(1), &block, definition, 6.25, 1.0);

        assert!(cell.set_power_output(1000.0));
        assert!(cell.set_power_input(10.0));
        assert!((cell.heat_generation() - 105.0).abs() < 1e-3);

        assert!(!cell.set_power_output(f32::NAN));
        assert!((cell.heat_generation() - 105.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_power_never_cools_below_zero() {
        let block = BlockDescriptor::new(BlockId(1), Vec3i::zeros(), DefinitionId::new("Reactor", "Small"));
        let definition = ThermalCellDefinition {
            producer_waste_energy: 0.5,
            emissivity: 0.0,
            ..ThermalCellDefinition::default()
        };
        let mut cell = ThermalCell::new(GridId(1), &block, definition, 6.25, 1.0);
        cell.set_temperature(10.0);

        assert!(cell.set_power_output(-1.0e9));
        assert_eq!(cell.heat_generation(), 0.0);

        let settings = settings();
        let environment = FrameEnvironment::vacuum(&settings);
        let mut node = RadiationNode::new();
        let step = CellStep {
            environment: &environment,
            settings: &settings,
            pass: 1,
        };
        cell.step(0.0, &step, &mut node);
        assert_eq!(cell.temperature(), 10.0);

        // strong outward conduction lands on zero, not below
        cell.step(-1.0e9, &step, &mut node);
        assert_eq!(cell.temperature(), 0.0);
    }
}
