//! Thermal simulation of one structure
//!
//! `ThermalGrid` owns the cells of a structure and advances them a budgeted
//! number at a time. Each external frame adds `used_len × speed × frequency /
//! 60` cell updates to an accumulator; whole units are spent walking the cell
//! store. The walk reverses direction at either end, and each reversal starts
//! a new simulation pass:
//!
//! 1. the pass counter advances (cells compare against it to decide which
//!    temperature neighbors see)
//! 2. the exposure mapper spends one slice of its budget
//! 3. the environment snapshot and the solar radiation node are refreshed
//! 4. when the mapper has just finished, the next pass recomputes every
//!    cell's exposed faces before updating it
//!
//! Structural changes (blocks added or removed, doors opening) rewire the
//! affected conduction edges at once and restart the mapper.

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::debug::{temperature_color, Hsv};
use super::error::ThermalError;
use super::persistence::{self, BlobStorage, CellRecord, STORAGE_KEY};
use crate::core_types::{resolve_cell_definition, DefinitionProvider, Direction, ThermalSettings};
use crate::environment::{FrameEnvironment, GridTransform, HostServices};
use crate::grid::{
    BlockDescriptor, BlockId, BlockKind, CellHandle, DoorStatus, ExposureMapper, FreeList, GridId,
    RadiationNode, Structure,
};
use crate::physics::heat_transfer::WATTS_PER_MEGAWATT;
use crate::physics::{
    gather_conduction, thrust_power, BlockDamage, CellAddress, CellStep, NeighborEdge, NeighborTarget,
    ThermalCell,
};

/// Frames between quota refills
pub const FRAMES_PER_SECOND: u32 = 60;

/// Keeps the accumulator moving when the grid is tiny
const QUOTA_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy)]
struct RemovedCell {
    temperature: f32,
    removed_at: u64,
}

/// What a removed block leaves behind
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedBlock {
    pub descriptor: BlockDescriptor,
    pub temperature: f32,
    /// Cells on other grids that conducted with the removed cell
    pub remote_links: Vec<CellAddress>,
}

/// The thermal state of one structure
#[derive(Debug)]
pub struct ThermalGrid {
    id: GridId,
    settings: ThermalSettings,
    structure: Structure,
    transform: GridTransform,

    cells: FreeList<ThermalCell>,
    positions: FxHashMap<i32, CellHandle>,
    block_cells: FxHashMap<BlockId, CellHandle>,
    recently_removed: FxHashMap<i32, RemovedCell>,
    remote_temperatures: FxHashMap<CellAddress, f32>,

    environment: FrameEnvironment,
    mapper: ExposureMapper,
    mapping_applied: bool,
    surfaces_pending: bool,
    solar_node: RadiationNode,
    damage: Vec<BlockDamage>,

    started: bool,
    elapsed_frames: u64,
    frame_count: u32,
    simulation_index: isize,
    direction: isize,
    simulation_frame: u64,
    frame_quota: f32,
    simulation_quota: usize,
}

impl ThermalGrid {
    /// Empty grid whose lattice step is `grid_size` meters
    pub fn new(id: GridId, grid_size: f32, settings: &ThermalSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            id,
            environment: FrameEnvironment::vacuum(&settings),
            settings,
            structure: Structure::new(grid_size),
            transform: GridTransform::default(),
            cells: FreeList::new(),
            positions: FxHashMap::default(),
            block_cells: FxHashMap::default(),
            recently_removed: FxHashMap::default(),
            remote_temperatures: FxHashMap::default(),
            mapper: ExposureMapper::new(),
            mapping_applied: true,
            surfaces_pending: false,
            solar_node: RadiationNode::new(),
            damage: Vec::new(),
            started: false,
            elapsed_frames: 0,
            frame_count: 0,
            simulation_index: 0,
            direction: 1,
            simulation_frame: 1,
            frame_quota: 0.0,
            simulation_quota: 0,
        }
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn settings(&self) -> &ThermalSettings {
        &self.settings
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GridTransform) {
        self.transform = transform;
    }

    /// Environment snapshot of the current pass
    pub fn environment(&self) -> &FrameEnvironment {
        &self.environment
    }

    pub fn mapper(&self) -> &ExposureMapper {
        &self.mapper
    }

    /// True once the mapper has finished and every cell saw the result
    pub fn surfaces_current(&self) -> bool {
        self.mapper.is_complete() && self.mapping_applied && !self.surfaces_pending
    }

    pub fn cells(&self) -> &FreeList<ThermalCell> {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.count()
    }

    /// No cells left, the scheduler does nothing
    pub fn is_halted(&self) -> bool {
        self.cells.is_empty()
    }

    /// Simulation pass counter, starts at 1
    pub fn simulation_frame(&self) -> u64 {
        self.simulation_frame
    }

    pub fn handle_of(&self, cell_id: i32) -> Option<CellHandle> {
        self.positions.get(&cell_id).copied()
    }

    pub fn handle_of_block(&self, block: BlockId) -> Option<CellHandle> {
        self.block_cells.get(&block).copied()
    }

    pub fn cell(&self, handle: CellHandle) -> Option<&ThermalCell> {
        self.cells.get(handle)
    }

    pub fn cell_by_id(&self, cell_id: i32) -> Option<&ThermalCell> {
        self.cells.get(self.handle_of(cell_id)?)
    }

    pub fn cell_for_block(&self, block: BlockId) -> Option<&ThermalCell> {
        self.cells.get(self.handle_of_block(block)?)
    }

    pub fn temperature(&self, cell_id: i32) -> Option<f32> {
        self.cell_by_id(cell_id).map(ThermalCell::temperature)
    }

    pub fn block_temperature(&self, block: BlockId) -> Option<f32> {
        self.cell_for_block(block).map(ThermalCell::temperature)
    }

    /// Overwrite a block's temperature
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn set_block_temperature(&mut self, block: BlockId, temperature: f32) -> Result<(), ThermalError> {
        let handle = self.handle_of_block(block).ok_or(ThermalError::UnknownBlock(block))?;
        let cell = self.cells.get_mut(handle).ok_or(ThermalError::StaleHandle(handle))?;
        cell.set_temperature(temperature);
        Ok(())
    }

    /// Temperature a removed cell left behind, if still cached
    pub fn recently_removed(&self, cell_id: i32) -> Option<f32> {
        self.recently_removed.get(&cell_id).map(|r| r.temperature)
    }

    pub fn recently_removed_count(&self) -> usize {
        self.recently_removed.len()
    }

    // ------------------------------------------------------------------
    // Structural events
    // ------------------------------------------------------------------

    /// Create the cell for a new block and wire it to its neighbors
    ///
    /// # Errors
    /// [`ThermalError::DuplicateBlock`] or [`ThermalError::Overlap`] when the
    /// block collides with one already present.
    pub fn add_block(
        &mut self,
        definitions: &dyn DefinitionProvider,
        block: BlockDescriptor,
    ) -> Result<CellHandle, ThermalError> {
        let definition = resolve_cell_definition(definitions, &block.definition);
        let cell = ThermalCell::new(
            self.id,
            &block,
            definition,
            self.structure.face_area(),
            self.settings.time_scale_ratio(),
        );
        let (block_id, cell_id) = (block.id, block.cell_id());

        self.structure.add_block(block)?;
        let handle = self.cells.allocate_with(cell);
        self.positions.insert(cell_id, handle);
        self.block_cells.insert(block_id, handle);
        self.add_all_neighbors(handle)?;
        self.reset_mapper();

        debug!(grid = %self.id, block = %block_id, cell = cell_id, "added cell");
        Ok(handle)
    }

    /// Destroy a block's cell, caching its temperature for a later split
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn remove_block(&mut self, block: BlockId) -> Result<RemovedBlock, ThermalError> {
        let handle = self.handle_of_block(block).ok_or(ThermalError::UnknownBlock(block))?;
        let descriptor = self.structure.remove_block(block)?;

        self.clear_neighbors(handle)?;
        let mut cell = self.cells.free(handle).ok_or(ThermalError::StaleHandle(handle))?;
        self.block_cells.remove(&block);
        self.positions.remove(&cell.id());

        let remote_links: Vec<CellAddress> = cell
            .take_neighbors()
            .into_iter()
            .filter_map(|edge| match edge.target {
                NeighborTarget::Remote(address) => Some(address),
                NeighborTarget::Local(_) => None,
            })
            .collect();

        self.recently_removed.insert(
            cell.id(),
            RemovedCell {
                temperature: cell.temperature(),
                removed_at: self.elapsed_frames,
            },
        );
        self.reset_mapper();

        debug!(grid = %self.id, block = %block, cell = cell.id(), "removed cell");
        if self.cells.is_empty() {
            info!(grid = %self.id, "last block removed, grid halted");
        }

        Ok(RemovedBlock {
            descriptor,
            temperature: cell.temperature(),
            remote_links,
        })
    }

    /// Link the cell to every block sharing a face with it, both directions
    ///
    /// # Errors
    /// [`ThermalError::StaleHandle`] when `handle` is not live.
    pub fn add_all_neighbors(&mut self, handle: CellHandle) -> Result<(), ThermalError> {
        let block = self.cells.get(handle).ok_or(ThermalError::StaleHandle(handle))?.block();
        let contact_area = self.structure.face_area();

        for (other, touching) in self.structure.adjacent_blocks(block) {
            let Some(neighbor) = self.block_cells.get(&other).copied() else {
                continue;
            };
            let touching = touching as f32;

            if let Some(cell) = self.cells.get_mut(handle) {
                cell.add_neighbor(NeighborEdge {
                    target: NeighborTarget::Local(neighbor),
                    touching,
                    contact_area,
                });
            }
            if let Some(cell) = self.cells.get_mut(neighbor) {
                cell.add_neighbor(NeighborEdge {
                    target: NeighborTarget::Local(handle),
                    touching,
                    contact_area,
                });
            }
        }
        Ok(())
    }

    /// Drop the cell's local edges on both sides; remote links stay
    ///
    /// # Errors
    /// [`ThermalError::StaleHandle`] when `handle` is not live.
    pub fn clear_neighbors(&mut self, handle: CellHandle) -> Result<(), ThermalError> {
        let cell = self.cells.get_mut(handle).ok_or(ThermalError::StaleHandle(handle))?;
        let edges = cell.take_neighbors();

        let mut kept = Vec::new();
        for edge in edges {
            match edge.target {
                NeighborTarget::Local(neighbor) => {
                    if let Some(other) = self.cells.get_mut(neighbor) {
                        other.remove_neighbor(NeighborTarget::Local(handle));
                    }
                }
                NeighborTarget::Remote(_) => kept.push(edge),
            }
        }

        if let Some(cell) = self.cells.get_mut(handle) {
            for edge in kept {
                cell.add_neighbor(edge);
            }
        }
        Ok(())
    }

    /// Rebuild the cell's local edges from the current structure
    ///
    /// # Errors
    /// [`ThermalError::StaleHandle`] when `handle` is not live.
    pub fn reset_neighbors(&mut self, handle: CellHandle) -> Result<(), ThermalError> {
        self.clear_neighbors(handle)?;
        self.add_all_neighbors(handle)
    }

    /// Conduct with a cell of another grid through a mechanical connection
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn link_remote(
        &mut self,
        block: BlockId,
        remote: CellAddress,
        touching: f32,
        contact_area: f32,
    ) -> Result<(), ThermalError> {
        let handle = self.handle_of_block(block).ok_or(ThermalError::UnknownBlock(block))?;
        let cell = self.cells.get_mut(handle).ok_or(ThermalError::StaleHandle(handle))?;
        cell.add_neighbor(NeighborEdge {
            target: NeighborTarget::Remote(remote),
            touching,
            contact_area,
        });
        Ok(())
    }

    /// Drop every remote link of `block`, returning the far ends
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn unlink_remotes(&mut self, block: BlockId) -> Result<Vec<CellAddress>, ThermalError> {
        let handle = self.handle_of_block(block).ok_or(ThermalError::UnknownBlock(block))?;
        let cell = self.cells.get_mut(handle).ok_or(ThermalError::StaleHandle(handle))?;
        let remotes: Vec<CellAddress> = cell.remote_neighbors().collect();
        for address in &remotes {
            cell.remove_neighbor(NeighborTarget::Remote(*address));
        }
        Ok(remotes)
    }

    /// Drop the link from `cell_id` to `remote`; false when there was none
    pub fn unlink_remote(&mut self, cell_id: i32, remote: CellAddress) -> bool {
        let Some(handle) = self.handle_of(cell_id) else {
            return false;
        };
        self.cells
            .get_mut(handle)
            .is_some_and(|cell| cell.remove_neighbor(NeighborTarget::Remote(remote)))
    }

    /// Drop every link into grid `target`, returning how many were removed
    pub fn unlink_grid(&mut self, target: GridId) -> usize {
        let mut removed = 0;
        for (_, cell) in self.cells.iter_mut() {
            let stale: Vec<CellAddress> = cell.remote_neighbors().filter(|a| a.grid == target).collect();
            for address in stale {
                if cell.remove_neighbor(NeighborTarget::Remote(address)) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Distinct remote cells any local cell conducts with, sorted
    pub fn remote_addresses(&self) -> Vec<CellAddress> {
        let mut addresses: Vec<CellAddress> = self
            .cells
            .iter()
            .flat_map(|(_, cell)| cell.remote_neighbors())
            .collect();
        addresses.sort_unstable();
        addresses.dedup();
        addresses
    }

    /// Remote temperatures read during the coming frame
    pub fn set_remote_temperatures(&mut self, temperatures: FxHashMap<CellAddress, f32>) {
        self.remote_temperatures = temperatures;
    }

    /// Door opened or closed; the mapper restarts when the seal changed
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block is not present and
    /// [`ThermalError::WrongKind`] when it is not a door.
    pub fn set_door_status(&mut self, block: BlockId, status: DoorStatus) -> Result<bool, ThermalError> {
        let descriptor = self.structure.block(block).ok_or(ThermalError::UnknownBlock(block))?;
        if !matches!(descriptor.kind, BlockKind::Door(_)) {
            return Err(ThermalError::WrongKind {
                block,
                kind: descriptor.kind,
            });
        }

        let changed = self.structure.set_door_status(block, status)?;
        if changed {
            debug!(grid = %self.id, block = %block, ?status, "door state changed");
            self.reset_mapper();
        }
        Ok(changed)
    }

    /// Electrical output of a producer, in megawatts
    ///
    /// Returns false when the reading was not finite and got discarded.
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn set_power_output(&mut self, block: BlockId, megawatts: f32) -> Result<bool, ThermalError> {
        let cell = self.cell_for_block_mut(block)?;
        Ok(cell.set_power_output(megawatts * WATTS_PER_MEGAWATT))
    }

    /// Electrical draw of a consumer, in megawatts
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell.
    pub fn set_power_input(&mut self, block: BlockId, megawatts: f32) -> Result<bool, ThermalError> {
        let cell = self.cell_for_block_mut(block)?;
        Ok(cell.set_power_input(megawatts * WATTS_PER_MEGAWATT))
    }

    /// Thruster output; powers are in megawatts
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the block has no cell and
    /// [`ThermalError::WrongKind`] when it is not a thruster.
    pub fn set_thrust(
        &mut self,
        block: BlockId,
        working: bool,
        current_thrust: f32,
        max_thrust: f32,
        min_power: f32,
        max_power: f32,
    ) -> Result<bool, ThermalError> {
        let kind = self.structure.block(block).ok_or(ThermalError::UnknownBlock(block))?.kind;
        if kind != BlockKind::Thruster {
            return Err(ThermalError::WrongKind { block, kind });
        }
        let watts = thrust_power(working, current_thrust, max_thrust, min_power, max_power);
        let cell = self.cell_for_block_mut(block)?;
        Ok(cell.set_power_input(watts))
    }

    fn cell_for_block_mut(&mut self, block: BlockId) -> Result<&mut ThermalCell, ThermalError> {
        let handle = self.handle_of_block(block).ok_or(ThermalError::UnknownBlock(block))?;
        self.cells.get_mut(handle).ok_or(ThermalError::StaleHandle(handle))
    }

    fn reset_mapper(&mut self) {
        self.mapper.reset(self.structure.bounds());
        self.mapping_applied = false;
    }

    // ------------------------------------------------------------------
    // Split and merge
    // ------------------------------------------------------------------

    /// Temperatures of cells removed recently, by cell id
    pub fn removed_temperatures(&self) -> FxHashMap<i32, f32> {
        self.recently_removed
            .iter()
            .map(|(id, removed)| (*id, removed.temperature))
            .collect()
    }

    /// Forget cached temperatures that another grid took over
    pub fn forget_removed(&mut self, ids: &[i32]) {
        for id in ids {
            self.recently_removed.remove(id);
        }
    }

    /// Give cells that just moved here from another grid their old temperature
    ///
    /// Returns the ids that were matched.
    pub fn inherit_temperatures(&mut self, removed: &FxHashMap<i32, f32>) -> Vec<i32> {
        let mut inherited = Vec::new();
        for (_, cell) in self.cells.iter_mut() {
            if let Some(t) = removed.get(&cell.id()) {
                cell.set_temperature(*t);
                inherited.push(cell.id());
            }
        }
        inherited.sort_unstable();
        inherited
    }

    /// Cells matching a cell of `absorbed` by id take its temperature
    pub fn adopt_temperatures(&mut self, absorbed: &ThermalGrid) -> usize {
        let mut adopted = 0;
        for (_, cell) in absorbed.cells.iter() {
            let Some(handle) = self.positions.get(&cell.id()).copied() else {
                continue;
            };
            if let Some(target) = self.cells.get_mut(handle) {
                target.set_temperature(cell.temperature());
                adopted += 1;
            }
        }
        adopted
    }

    fn expire_removed(&mut self) {
        let ttl = u64::from(self.settings.removed_cache_ttl_frames);
        let now = self.elapsed_frames;
        self.recently_removed
            .retain(|_, removed| now.saturating_sub(removed.removed_at) <= ttl);
    }

    // ------------------------------------------------------------------
    // Scheduler
    // ------------------------------------------------------------------

    fn quota_per_second(&self) -> f32 {
        self.cells.used_len() as f32 * self.settings.simulation_speed * self.settings.frequency as f32
    }

    fn refill_quota(&mut self) {
        self.simulation_quota = (self.quota_per_second() as usize).max(1);
    }

    /// Advance the grid by one external frame
    pub fn update_frame(&mut self, services: &HostServices<'_>) {
        self.elapsed_frames += 1;
        self.expire_removed();

        if self.cells.is_empty() {
            return;
        }

        if !self.started {
            self.started = true;
            self.prepare_pass(services);
            self.refill_quota();
        }

        self.frame_count += 1;
        if self.simulation_quota == 0 {
            if self.frame_count < FRAMES_PER_SECOND {
                return;
            }
            self.refill_quota();
            self.frame_count = 0;
            self.frame_quota = 0.0;
        }

        self.frame_quota += QUOTA_EPSILON + self.quota_per_second() / FRAMES_PER_SECOND as f32;

        while self.frame_quota >= 1.0 && self.simulation_quota > 0 {
            let used_len = self.cells.used_len() as isize;
            if used_len == 0 {
                break;
            }

            // store shrank under a downward walk
            if self.direction < 0 && self.simulation_index >= used_len {
                self.simulation_index = used_len - 1;
            }

            if self.simulation_index >= used_len || self.simulation_index < 0 {
                self.begin_pass(services);
                self.direction = -self.direction;
                self.simulation_index = (self.simulation_index + self.direction).clamp(0, used_len - 1);
            }

            let index = self.simulation_index as usize;
            if let Some(handle) = self.cells.handle_at(index) {
                if self.surfaces_pending {
                    self.update_cell_surfaces(handle);
                }
                self.update_cell(handle);
            }

            self.frame_quota -= 1.0;
            self.simulation_quota -= 1;
            self.simulation_index += self.direction;
        }
    }

    fn begin_pass(&mut self, services: &HostServices<'_>) {
        self.simulation_frame += 1;
        if self.mapper.advance(self.structure.nodes()) {
            debug!(
                grid = %self.id,
                exterior = self.mapper.exterior_count(),
                solid = self.mapper.solid_count(),
                rooms = self.mapper.room_count(),
                "exposure mapping complete"
            );
        }
        self.prepare_pass(services);

        if self.surfaces_pending {
            self.surfaces_pending = false;
        }
        if !self.mapping_applied && self.mapper.is_complete() {
            self.mapping_applied = true;
            self.surfaces_pending = true;
        }
    }

    fn prepare_pass(&mut self, services: &HostServices<'_>) {
        self.solar_node.update();
        self.environment = FrameEnvironment::prepare(services, &self.settings, self.id, &self.transform);
    }

    fn update_cell(&mut self, handle: CellHandle) {
        let pass = self.simulation_frame;
        let conduction = gather_conduction(&self.cells, handle, pass, &self.remote_temperatures);
        let step = CellStep {
            environment: &self.environment,
            settings: &self.settings,
            pass,
        };
        if let Some(cell) = self.cells.get_mut(handle) {
            if let Some(damage) = cell.step(conduction, &step, &mut self.solar_node) {
                self.damage.push(damage);
            }
        }
    }

    fn update_cell_surfaces(&mut self, handle: CellHandle) {
        let Some(block) = self
            .cells
            .get(handle)
            .and_then(|cell| self.structure.block(cell.block()))
        else {
            return;
        };
        let faces = exposed_faces(block, &self.structure, &self.mapper);
        if let Some(cell) = self.cells.get_mut(handle) {
            cell.set_exposed_faces(faces);
        }
    }

    /// Recompute every cell's exposed faces from the current mapping
    pub fn update_surfaces(&mut self) {
        let handles: Vec<CellHandle> = self.cells.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            self.update_cell_surfaces(handle);
        }
    }

    /// Damage queued since the last drain
    pub fn drain_damage(&mut self) -> Vec<BlockDamage> {
        std::mem::take(&mut self.damage)
    }

    /// Heat-map color per block, sorted by block id
    pub fn debug_colors(&self) -> Vec<(BlockId, Hsv)> {
        let mut colors: Vec<(BlockId, Hsv)> = self
            .cells
            .iter()
            .map(|(_, cell)| (cell.block(), temperature_color(cell.temperature())))
            .collect();
        colors.sort_unstable_by_key(|(block, _)| *block);
        colors
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encode every live cell's temperature
    pub fn pack(&self) -> String {
        persistence::pack(self.cells.iter().map(|(_, cell)| CellRecord {
            id: cell.id(),
            temperature: cell.temperature(),
        }))
    }

    /// Apply a persisted blob, returning how many cells were restored
    ///
    /// Corrupt blobs are logged and ignored; unknown ids are skipped.
    pub fn unpack(&mut self, data: &str) -> usize {
        let records = match persistence::unpack(data) {
            Ok(records) => records,
            Err(e) => {
                warn!(grid = %self.id, error = %e, "ignoring corrupt thermal data");
                return 0;
            }
        };

        let mut restored = 0;
        let mut unknown = 0;
        for record in records {
            match self.positions.get(&record.id).and_then(|h| self.cells.get_mut(*h)) {
                Some(cell) => {
                    cell.set_temperature(record.temperature);
                    restored += 1;
                }
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            debug!(grid = %self.id, unknown, "skipped persisted cells with no block");
        }
        restored
    }

    pub fn save(&self, storage: &mut dyn BlobStorage) {
        storage.write(STORAGE_KEY, self.pack());
        debug!(grid = %self.id, cells = self.cells.count(), "saved thermal data");
    }

    /// Restore from `storage`; missing data leaves every cell as it is
    pub fn load(&mut self, storage: &dyn BlobStorage) -> usize {
        let Some(data) = storage.read(STORAGE_KEY) else {
            debug!(grid = %self.id, "no thermal data stored");
            return 0;
        };
        let restored = self.unpack(&data);
        info!(grid = %self.id, restored, "loaded thermal data");
        restored
    }
}

/// Faces of `block` whose neighbor node is empty and reachable from outside
pub fn exposed_faces(block: &BlockDescriptor, structure: &Structure, mapper: &ExposureMapper) -> Vec<Direction> {
    let mut faces = Vec::new();
    for node in block.nodes() {
        for d in Direction::ALL {
            let n = node + d.offset();
            if !structure.is_occupied(&n) && mapper.is_exterior(&n) {
                faces.push(d);
            }
        }
    }
    faces
}
