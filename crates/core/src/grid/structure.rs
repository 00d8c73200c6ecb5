//! Block occupancy of one structure
//!
//! Tracks the host's block descriptors, which lattice node each block
//! occupies, the structure bounds, and the seal flags the exposure mapper
//! reads. Adjacency and touching area between blocks are answered here so the
//! grid never walks the lattice itself.

use nalgebra::Matrix3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::airtightness::{
    neighbor_seal_bit, own_seal_bit, seals_face, AirtightnessProfile, DoorKind, DoorStatus,
    NodeLattice,
};
use crate::core_types::vec3::{component_max, component_min, within};
use crate::core_types::{flatten, DefinitionId, Direction, Vec3i};
use crate::simulation::ThermalError;

/// Host identifier of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host identifier of a structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridId(pub u64);

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability of a block, used to pick which host events apply to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Generic,
    Thruster,
    Door(DoorKind),
    LandingGear,
    Rotor,
    Piston,
}

impl BlockKind {
    /// Blocks that can join two structures mechanically
    pub fn is_mechanical_connector(self) -> bool {
        matches!(self, BlockKind::LandingGear | BlockKind::Rotor | BlockKind::Piston)
    }
}

/// The host's view of one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDescriptor {
    pub id: BlockId,
    /// Lattice position the cell id is derived from
    pub anchor: Vec3i,
    /// Inclusive lattice extent
    pub min: Vec3i,
    pub max: Vec3i,
    /// Mass (kg)
    pub mass: f32,
    pub definition: DefinitionId,
    pub kind: BlockKind,
    /// Block-local to structure rotation
    pub orientation: Matrix3<i32>,
    pub airtightness: AirtightnessProfile,
}

impl BlockDescriptor {
    /// Unit block of 500 kg at `position`, open to air
    pub fn new(id: BlockId, position: Vec3i, definition: DefinitionId) -> Self {
        Self {
            id,
            anchor: position,
            min: position,
            max: position,
            mass: 500.0,
            definition,
            kind: BlockKind::Generic,
            orientation: Matrix3::identity(),
            airtightness: AirtightnessProfile::open(),
        }
    }

    pub fn with_extent(mut self, min: Vec3i, max: Vec3i) -> Self {
        self.min = component_min(&min, &max);
        self.max = component_max(&min, &max);
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_orientation(mut self, orientation: Matrix3<i32>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_airtightness(mut self, airtightness: AirtightnessProfile) -> Self {
        self.airtightness = airtightness;
        self
    }

    /// Stable cell id of this block
    pub fn cell_id(&self) -> i32 {
        flatten(&self.anchor)
    }

    /// Occupies exactly one lattice node
    pub fn is_unit(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, node: &Vec3i) -> bool {
        within(node, &self.min, &self.max)
    }

    /// Every lattice node inside the extent, x fastest
    pub fn nodes(&self) -> impl Iterator<Item = Vec3i> + '_ {
        (self.min.z..=self.max.z).flat_map(move |z| {
            (self.min.y..=self.max.y)
                .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| Vec3i::new(x, y, z)))
        })
    }
}

/// Touching unit faces between two inclusive boxes, 0 unless they share a face
pub fn touching_faces(a: &BlockDescriptor, b: &BlockDescriptor) -> u32 {
    let overlap = |amin: i32, amax: i32, bmin: i32, bmax: i32| (amax.min(bmax) - amin.max(bmin) + 1).max(0);
    let abuts = |amin: i32, amax: i32, bmin: i32, bmax: i32| amax + 1 == bmin || bmax + 1 == amin;

    let ox = overlap(a.min.x, a.max.x, b.min.x, b.max.x);
    let oy = overlap(a.min.y, a.max.y, b.min.y, b.max.y);
    let oz = overlap(a.min.z, a.max.z, b.min.z, b.max.z);

    let area = if abuts(a.min.x, a.max.x, b.min.x, b.max.x) {
        oy * oz
    } else if abuts(a.min.y, a.max.y, b.min.y, b.max.y) {
        ox * oz
    } else if abuts(a.min.z, a.max.z, b.min.z, b.max.z) {
        ox * oy
    } else {
        0
    };
    area as u32
}

/// Blocks of one structure and their lattice occupancy
#[derive(Debug, Clone)]
pub struct Structure {
    grid_size: f32,
    blocks: FxHashMap<BlockId, BlockDescriptor>,
    occupancy: FxHashMap<Vec3i, BlockId>,
    nodes: NodeLattice,
    bounds: Option<(Vec3i, Vec3i)>,
}

impl Structure {
    /// Empty structure whose lattice step is `grid_size` meters
    pub fn new(grid_size: f32) -> Self {
        Self {
            grid_size,
            blocks: FxHashMap::default(),
            occupancy: FxHashMap::default(),
            nodes: NodeLattice::default(),
            bounds: None,
        }
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// Area of one unit face (m²)
    pub fn face_area(&self) -> f32 {
        self.grid_size * self.grid_size
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockDescriptor> {
        self.blocks.get(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockDescriptor> {
        self.blocks.values()
    }

    pub fn block_at(&self, node: &Vec3i) -> Option<BlockId> {
        self.occupancy.get(node).copied()
    }

    pub fn is_occupied(&self, node: &Vec3i) -> bool {
        self.occupancy.contains_key(node)
    }

    /// Inclusive bounds of all blocks
    pub fn bounds(&self) -> Option<(Vec3i, Vec3i)> {
        self.bounds
    }

    pub fn nodes(&self) -> &NodeLattice {
        &self.nodes
    }

    /// Insert a block and refresh the seal flags around it
    ///
    /// # Errors
    /// [`ThermalError::DuplicateBlock`] when the id is taken and
    /// [`ThermalError::Overlap`] when a node is already occupied.
    pub fn add_block(&mut self, block: BlockDescriptor) -> Result<(), ThermalError> {
        if self.blocks.contains_key(&block.id) {
            return Err(ThermalError::DuplicateBlock(block.id));
        }
        if let Some(node) = block.nodes().find(|n| self.occupancy.contains_key(n)) {
            return Err(ThermalError::Overlap(node));
        }

        for node in block.nodes() {
            self.occupancy.insert(node, block.id);
        }
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (component_min(&min, &block.min), component_max(&max, &block.max)),
            None => (block.min, block.max),
        });

        let (min, max) = (block.min, block.max);
        self.blocks.insert(block.id, block);
        self.remap_region(min, max);
        Ok(())
    }

    /// Remove a block and refresh the seal flags around it
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the id is not present.
    pub fn remove_block(&mut self, id: BlockId) -> Result<BlockDescriptor, ThermalError> {
        let block = self.blocks.remove(&id).ok_or(ThermalError::UnknownBlock(id))?;
        for node in block.nodes() {
            self.occupancy.remove(&node);
            self.nodes.remove(&node);
        }
        self.bounds = self.blocks.values().fold(None, |acc, b| {
            Some(match acc {
                Some((min, max)) => (component_min(&min, &b.min), component_max(&max, &b.max)),
                None => (b.min, b.max),
            })
        });
        self.remap_region(block.min, block.max);
        Ok(block)
    }

    /// Update a door's status and its seal flags
    ///
    /// # Errors
    /// [`ThermalError::UnknownBlock`] when the id is not present.
    pub fn set_door_status(&mut self, id: BlockId, status: DoorStatus) -> Result<bool, ThermalError> {
        let block = self.blocks.get_mut(&id).ok_or(ThermalError::UnknownBlock(id))?;
        if block.airtightness.door_status == status {
            return Ok(false);
        }
        block.airtightness.door_status = status;
        let (min, max) = (block.min, block.max);
        self.remap_region(min, max);
        Ok(true)
    }

    /// Distinct blocks sharing a face with `id`, with their touching face count,
    /// sorted by id
    pub fn adjacent_blocks(&self, id: BlockId) -> Vec<(BlockId, u32)> {
        let Some(block) = self.blocks.get(&id) else {
            return Vec::new();
        };

        let mut found: Vec<BlockId> = block
            .nodes()
            .flat_map(|node| Direction::ALL.into_iter().map(move |d| node + d.offset()))
            .filter_map(|n| self.occupancy.get(&n).copied())
            .filter(|other| *other != id)
            .collect();
        found.sort_unstable();
        found.dedup();

        found
            .into_iter()
            .filter_map(|other| {
                let touching = touching_faces(block, self.blocks.get(&other)?);
                (touching > 0).then_some((other, touching))
            })
            .collect()
    }

    /// Recompute seal flags for occupied nodes in `[min - 1, max + 1]`
    fn remap_region(&mut self, min: Vec3i, max: Vec3i) {
        let one = Vec3i::repeat(1);
        let (lo, hi) = (min - one, max + one);

        let mut updated = Vec::new();
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let node = Vec3i::new(x, y, z);
                    let Some(owner) = self.occupancy.get(&node).and_then(|id| self.blocks.get(id)) else {
                        continue;
                    };

                    let mut flags = 0_u16;
                    for d in Direction::ALL {
                        if seals_face(owner, &node, d) {
                            flags |= own_seal_bit(d);
                        }
                        let n = node + d.offset();
                        let neighbor = self.occupancy.get(&n).and_then(|id| self.blocks.get(id));
                        if neighbor.is_some_and(|nb| seals_face(nb, &n, d.opposite())) {
                            flags |= neighbor_seal_bit(d);
                        }
                    }
                    updated.push((node, flags));
                }
            }
        }

        for (node, flags) in updated {
            self.nodes.set(node, flags);
        }
    }
}
