//! Registry of every simulated structure
//!
//! `ThermalWorld` owns the host services, the settings and one
//! [`ThermalGrid`] per structure. Host callbacks arrive as [`ThermalEvent`]s
//! and are applied at the start of [`ThermalWorld::tick`]; events that touch
//! two structures (split, merge, mechanical attachment) are resolved here
//! because no grid can reach another on its own.

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::error::ThermalError;
use super::events::{EventQueue, ThermalEvent};
use super::persistence::BlobStorage;
use super::thermal_grid::ThermalGrid;
use crate::core_types::{DefinitionCatalog, DefinitionProvider, ThermalSettings};
use crate::environment::{
    EnvironmentProvider, GridTransform, HostServices, NoOcclusion, NullEnvironment, VisibilityService,
};
use crate::grid::{BlockId, GridId};
use crate::physics::{BlockDamage, CellAddress};

pub struct ThermalWorld {
    settings: ThermalSettings,
    definitions: Box<dyn DefinitionProvider>,
    environment: Box<dyn EnvironmentProvider>,
    visibility: Box<dyn VisibilityService>,

    grids: FxHashMap<GridId, ThermalGrid>,
    events: EventQueue,
    damage: Vec<BlockDamage>,
    frame: u64,
}

impl std::fmt::Debug for ThermalWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermalWorld")
            .field("settings", &self.settings)
            .field("grids", &self.grids.len())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl ThermalWorld {
    /// World backed by the given host services
    pub fn new(
        settings: &ThermalSettings,
        definitions: Box<dyn DefinitionProvider>,
        environment: Box<dyn EnvironmentProvider>,
        visibility: Box<dyn VisibilityService>,
    ) -> Self {
        let settings = settings.sanitized();
        info!(
            frequency = settings.frequency,
            speed = settings.simulation_speed,
            "Creating thermal world"
        );
        Self {
            settings,
            definitions,
            environment,
            visibility,
            grids: FxHashMap::default(),
            events: EventQueue::default(),
            damage: Vec::new(),
            frame: 0,
        }
    }

    /// Deep space, built-in materials, nothing occludes the sun
    pub fn headless(settings: &ThermalSettings) -> Self {
        Self::new(
            settings,
            Box::new(DefinitionCatalog::new()),
            Box::new(NullEnvironment),
            Box::new(NoOcclusion),
        )
    }

    pub fn settings(&self) -> &ThermalSettings {
        &self.settings
    }

    /// Ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Borrow the host services for direct grid calls
    pub fn services(&self) -> HostServices<'_> {
        HostServices {
            definitions: self.definitions.as_ref(),
            environment: self.environment.as_ref(),
            visibility: self.visibility.as_ref(),
        }
    }

    /// Register a structure
    ///
    /// # Errors
    /// [`ThermalError::DuplicateGrid`] when the id is already registered.
    pub fn add_grid(
        &mut self,
        id: GridId,
        grid_size: f32,
        transform: GridTransform,
    ) -> Result<&mut ThermalGrid, ThermalError> {
        if self.grids.contains_key(&id) {
            return Err(ThermalError::DuplicateGrid(id));
        }
        let mut grid = ThermalGrid::new(id, grid_size, &self.settings);
        grid.set_transform(transform);
        info!(grid = %id, grid_size, "registered grid");
        Ok(self.grids.entry(id).or_insert(grid))
    }

    /// Close a structure, dropping every link other grids had into it
    pub fn remove_grid(&mut self, id: GridId) -> Option<ThermalGrid> {
        let grid = self.grids.remove(&id)?;
        let unlinked: usize = self.grids.values_mut().map(|g| g.unlink_grid(id)).sum();
        info!(grid = %id, unlinked, "closed grid");
        Some(grid)
    }

    pub fn grid(&self, id: GridId) -> Option<&ThermalGrid> {
        self.grids.get(&id)
    }

    pub fn grid_mut(&mut self, id: GridId) -> Option<&mut ThermalGrid> {
        self.grids.get_mut(&id)
    }

    /// Registered grid ids, sorted
    pub fn grid_ids(&self) -> Vec<GridId> {
        let mut ids: Vec<GridId> = self.grids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Queue an event for the next tick
    pub fn submit(&mut self, event: ThermalEvent) {
        self.events.submit(event);
    }

    /// Apply queued events, then advance every grid by one frame
    ///
    /// Grids run in id order. Each grid reads the temperatures of its
    /// mechanically linked cells as they were when its turn began.
    pub fn tick(&mut self) {
        self.frame += 1;
        self.events.begin_frame();

        for event in self.events.take_pending() {
            match self.apply(event.clone()) {
                Ok(()) => self.events.mark_applied(event),
                Err(e) => warn!(grid = %event.grid(), error = %e, "skipping thermal event"),
            }
        }

        let services = HostServices {
            definitions: self.definitions.as_ref(),
            environment: self.environment.as_ref(),
            visibility: self.visibility.as_ref(),
        };

        let mut ids: Vec<GridId> = self.grids.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let snapshot = match self.grids.get(&id) {
                Some(grid) => remote_snapshot(&self.grids, grid),
                None => continue,
            };
            if let Some(grid) = self.grids.get_mut(&id) {
                grid.set_remote_temperatures(snapshot);
                grid.update_frame(&services);
                self.damage.extend(grid.drain_damage());
            }
        }
    }

    /// Damage owed to blocks since the last drain
    pub fn drain_damage(&mut self) -> Vec<BlockDamage> {
        std::mem::take(&mut self.damage)
    }

    /// Apply one event immediately
    ///
    /// # Errors
    /// Whatever the addressed grid reports, or [`ThermalError::UnknownGrid`]
    /// when a grid named by the event is not registered.
    pub fn apply(&mut self, event: ThermalEvent) -> Result<(), ThermalError> {
        match event {
            ThermalEvent::BlockAdded { grid, block } => {
                let definitions = self.definitions.as_ref();
                let target = self.grids.get_mut(&grid).ok_or(ThermalError::UnknownGrid(grid))?;
                target.add_block(definitions, block)?;
            }
            ThermalEvent::BlockRemoved { grid, block } => {
                let removed = grid_mut(&mut self.grids, grid)?.remove_block(block)?;
                let address = CellAddress {
                    grid,
                    id: removed.descriptor.cell_id(),
                };
                for remote in removed.remote_links {
                    if let Some(other) = self.grids.get_mut(&remote.grid) {
                        other.unlink_remote(remote.id, address);
                    }
                }
            }
            ThermalEvent::GridSplit { from, into } => {
                let removed = self
                    .grids
                    .get(&from)
                    .ok_or(ThermalError::UnknownGrid(from))?
                    .removed_temperatures();
                let inherited = grid_mut(&mut self.grids, into)?.inherit_temperatures(&removed);
                grid_mut(&mut self.grids, from)?.forget_removed(&inherited);
                info!(from = %from, into = %into, inherited = inherited.len(), "grid split");
            }
            ThermalEvent::GridMerged { absorbed, into } => {
                if absorbed == into || !self.grids.contains_key(&into) {
                    return Err(ThermalError::UnknownGrid(into));
                }
                let source = self.remove_grid(absorbed).ok_or(ThermalError::UnknownGrid(absorbed))?;
                let adopted = grid_mut(&mut self.grids, into)?.adopt_temperatures(&source);
                info!(absorbed = %absorbed, into = %into, adopted, "grid merge");
            }
            ThermalEvent::MechanicalAttachmentChanged { grid, block, attached } => {
                self.set_attachment(grid, block, attached)?;
            }
            ThermalEvent::DoorStateChanged { grid, block, status } => {
                grid_mut(&mut self.grids, grid)?.set_door_status(block, status)?;
            }
            ThermalEvent::PowerOutputChanged { grid, block, megawatts } => {
                if !grid_mut(&mut self.grids, grid)?.set_power_output(block, megawatts)? {
                    debug!(grid = %grid, block = %block, megawatts, "discarded power output reading");
                }
            }
            ThermalEvent::PowerInputChanged { grid, block, megawatts } => {
                if !grid_mut(&mut self.grids, grid)?.set_power_input(block, megawatts)? {
                    debug!(grid = %grid, block = %block, megawatts, "discarded power input reading");
                }
            }
            ThermalEvent::ThrustChanged {
                grid,
                block,
                working,
                current_thrust,
                max_thrust,
                min_power,
                max_power,
            } => {
                grid_mut(&mut self.grids, grid)?.set_thrust(
                    block,
                    working,
                    current_thrust,
                    max_thrust,
                    min_power,
                    max_power,
                )?;
            }
            ThermalEvent::GridMoved { grid, transform } => {
                grid_mut(&mut self.grids, grid)?.set_transform(transform);
            }
        }
        Ok(())
    }

    /// Replace a connector's cross-grid link
    fn set_attachment(
        &mut self,
        grid: GridId,
        block: BlockId,
        attached: Option<(GridId, BlockId)>,
    ) -> Result<(), ThermalError> {
        let source = self.grids.get(&grid).ok_or(ThermalError::UnknownGrid(grid))?;
        let descriptor = source.structure().block(block).ok_or(ThermalError::UnknownBlock(block))?;
        if !descriptor.kind.is_mechanical_connector() {
            return Err(ThermalError::WrongKind {
                block,
                kind: descriptor.kind,
            });
        }
        let local = CellAddress {
            grid,
            id: descriptor.cell_id(),
        };
        let local_area = source.structure().face_area();

        // validate the new target before touching the old link
        let target = match attached {
            Some((other_grid, other_block)) => {
                let other = self.grids.get(&other_grid).ok_or(ThermalError::UnknownGrid(other_grid))?;
                let cell = other
                    .cell_for_block(other_block)
                    .ok_or(ThermalError::UnknownBlock(other_block))?;
                Some((other_block, cell.address(), other.structure().face_area()))
            }
            None => None,
        };

        for remote in grid_mut(&mut self.grids, grid)?.unlink_remotes(block)? {
            if let Some(other) = self.grids.get_mut(&remote.grid) {
                other.unlink_remote(remote.id, local);
            }
        }

        let Some((other_block, remote, remote_area)) = target else {
            debug!(grid = %grid, block = %block, "mechanical link released");
            return Ok(());
        };

        let contact_area = local_area.min(remote_area);
        let touching = self.settings.mechanical_link_area;
        grid_mut(&mut self.grids, grid)?.link_remote(block, remote, touching, contact_area)?;
        grid_mut(&mut self.grids, remote.grid)?.link_remote(other_block, local, touching, contact_area)?;

        debug!(
            grid = %grid,
            block = %block,
            remote_grid = %remote.grid,
            remote_block = %other_block,
            "mechanical link attached"
        );
        Ok(())
    }

    /// Persist one grid's temperatures
    ///
    /// # Errors
    /// [`ThermalError::UnknownGrid`] when the grid is not registered.
    pub fn save_grid(&self, id: GridId, storage: &mut dyn BlobStorage) -> Result<(), ThermalError> {
        self.grids.get(&id).ok_or(ThermalError::UnknownGrid(id))?.save(storage);
        Ok(())
    }

    /// Restore one grid's temperatures, returning the number of cells restored
    ///
    /// # Errors
    /// [`ThermalError::UnknownGrid`] when the grid is not registered.
    pub fn load_grid(&mut self, id: GridId, storage: &dyn BlobStorage) -> Result<usize, ThermalError> {
        Ok(grid_mut(&mut self.grids, id)?.load(storage))
    }
}

fn grid_mut(grids: &mut FxHashMap<GridId, ThermalGrid>, id: GridId) -> Result<&mut ThermalGrid, ThermalError> {
    grids.get_mut(&id).ok_or(ThermalError::UnknownGrid(id))
}

/// Current temperatures of every remote cell `grid` conducts with
fn remote_snapshot(grids: &FxHashMap<GridId, ThermalGrid>, grid: &ThermalGrid) -> FxHashMap<CellAddress, f32> {
    grid.remote_addresses()
        .into_iter()
        .filter_map(|address| {
            let t = grids.get(&address.grid)?.temperature(address.id)?;
            Some((address, t))
        })
        .collect()
}
