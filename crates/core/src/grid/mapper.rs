//! Incremental exposure classifier
//!
//! Flood-fills the structure's bounding volume (one node of margin) in two
//! phases, spending at most `nodes_per_frame` node visits per call to
//! [`ExposureMapper::advance`]:
//!
//! 1. **Exterior**: breadth-first from the volume minimum through every
//!    non-airtight edge. Targets of refused (airtight) edges are remembered
//!    as seeds.
//! 2. **Interior**: seeds that never became exterior start the sealed crawl.
//!    Solid nodes expand into unclassified occupied neighbors; touching an
//!    empty node opens a room frontier, which floods completely before the
//!    deferred solid node resumes. Rooms hand occupied neighbors back to the
//!    solid frontier.
//!
//! The final partition depends only on occupancy and seal flags, never on how
//! the work was sliced across frames.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::debug;

use super::airtightness::NodeLattice;
use crate::core_types::vec3::within;
use crate::core_types::{Direction, Vec3i};

/// Frames a full remap is spread across
const FRAMES_PER_REMAP: usize = 60;

/// Exposure class of a lattice node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeClass {
    /// Reachable from outside the structure
    Exterior,
    /// Occupied and sealed off from the outside
    Solid,
    /// Empty pocket sealed off from the outside
    InteriorRoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Exterior,
    Interior,
    Complete,
}

#[derive(Debug, Clone)]
pub struct ExposureMapper {
    min: Vec3i,
    max: Vec3i,
    nodes_per_frame: usize,
    phase: Phase,

    exterior: FxHashSet<Vec3i>,
    exterior_queue: VecDeque<Vec3i>,

    seeds: VecDeque<Vec3i>,
    seed_set: FxHashSet<Vec3i>,

    solid: FxHashSet<Vec3i>,
    solid_queue: VecDeque<Vec3i>,

    rooms: FxHashSet<Vec3i>,
    room_queue: VecDeque<Vec3i>,
    room_count: usize,
}

impl Default for ExposureMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ExposureMapper {
    /// A mapper with nothing to map
    pub fn new() -> Self {
        Self {
            min: Vec3i::zeros(),
            max: Vec3i::zeros(),
            nodes_per_frame: 1,
            phase: Phase::Complete,
            exterior: FxHashSet::default(),
            exterior_queue: VecDeque::new(),
            seeds: VecDeque::new(),
            seed_set: FxHashSet::default(),
            solid: FxHashSet::default(),
            solid_queue: VecDeque::new(),
            rooms: FxHashSet::default(),
            room_queue: VecDeque::new(),
            room_count: 0,
        }
    }

    /// Discard all classification and start over for structure `bounds`
    ///
    /// `None` (empty structure) leaves the mapper complete with nothing mapped.
    pub fn reset(&mut self, bounds: Option<(Vec3i, Vec3i)>) {
        self.exterior.clear();
        self.exterior_queue.clear();
        self.seeds.clear();
        self.seed_set.clear();
        self.solid.clear();
        self.solid_queue.clear();
        self.rooms.clear();
        self.room_queue.clear();
        self.room_count = 0;

        let Some((min, max)) = bounds else {
            self.min = Vec3i::zeros();
            self.max = Vec3i::zeros();
            self.nodes_per_frame = 1;
            self.phase = Phase::Complete;
            return;
        };

        let one = Vec3i::repeat(1);
        self.min = min - one;
        self.max = max + one;

        let extent = self.max - self.min + one;
        let volume = extent.x as usize * extent.y as usize * extent.z as usize;
        self.nodes_per_frame = (volume / FRAMES_PER_REMAP).max(1);

        self.exterior.insert(self.min);
        self.exterior_queue.push_back(self.min);
        self.phase = Phase::Exterior;
    }

    /// Override the per-call node budget (at least 1)
    pub fn set_nodes_per_frame(&mut self, nodes: usize) {
        self.nodes_per_frame = nodes.max(1);
    }

    pub fn nodes_per_frame(&self) -> usize {
        self.nodes_per_frame
    }

    /// Margin-inclusive volume being mapped
    pub fn bounds(&self) -> (Vec3i, Vec3i) {
        (self.min, self.max)
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Spend one frame's budget; true when this call finished the mapping
    pub fn advance(&mut self, lattice: &NodeLattice) -> bool {
        let mut budget = self.nodes_per_frame;
        while budget > 0 {
            match self.phase {
                Phase::Complete => return false,
                Phase::Exterior => {
                    if let Some(node) = self.exterior_queue.pop_front() {
                        budget -= 1;
                        self.crawl_exterior(node, lattice);
                    } else {
                        self.phase = Phase::Interior;
                    }
                }
                Phase::Interior => {
                    if let Some(node) = self.room_queue.pop_front() {
                        budget -= 1;
                        self.crawl_room(node, lattice);
                    } else if let Some(node) = self.solid_queue.pop_front() {
                        budget -= 1;
                        self.crawl_solid(node, lattice);
                    } else if let Some(seed) = self.seeds.pop_front() {
                        self.start_from_seed(seed, lattice);
                    } else {
                        self.phase = Phase::Complete;
                        debug!(
                            exterior = self.exterior.len(),
                            solid = self.solid.len(),
                            rooms = self.room_count,
                            "exposure mapping complete"
                        );
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Advance until complete, ignoring the frame budget
    pub fn run_to_completion(&mut self, lattice: &NodeLattice) {
        while !self.is_complete() {
            self.advance(lattice);
        }
    }

    pub fn classification(&self, node: &Vec3i) -> Option<NodeClass> {
        if self.exterior.contains(node) {
            Some(NodeClass::Exterior)
        } else if self.solid.contains(node) {
            Some(NodeClass::Solid)
        } else if self.rooms.contains(node) {
            Some(NodeClass::InteriorRoom)
        } else {
            None
        }
    }

    pub fn is_exterior(&self, node: &Vec3i) -> bool {
        self.exterior.contains(node)
    }

    pub fn exterior_count(&self) -> usize {
        self.exterior.len()
    }

    pub fn solid_count(&self) -> usize {
        self.solid.len()
    }

    pub fn interior_room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of distinct sealed rooms found
    pub fn room_count(&self) -> usize {
        self.room_count
    }

    /// Every classified node, sorted
    pub fn partition(&self) -> Vec<(Vec3i, NodeClass)> {
        let mut all: Vec<_> = self
            .exterior
            .iter()
            .map(|n| (*n, NodeClass::Exterior))
            .chain(self.solid.iter().map(|n| (*n, NodeClass::Solid)))
            .chain(self.rooms.iter().map(|n| (*n, NodeClass::InteriorRoom)))
            .collect();
        all.sort_by_key(|(n, class)| (n.x, n.y, n.z, *class));
        all
    }

    fn is_classified(&self, node: &Vec3i) -> bool {
        self.exterior.contains(node) || self.solid.contains(node) || self.rooms.contains(node)
    }

    fn crawl_exterior(&mut self, node: Vec3i, lattice: &NodeLattice) {
        for d in Direction::ALL {
            let n = node + d.offset();
            if !within(&n, &self.min, &self.max) || self.exterior.contains(&n) {
                continue;
            }

            if lattice.is_edge_airtight(&node, d) {
                if self.seed_set.insert(n) {
                    self.seeds.push_back(n);
                }
                continue;
            }

            self.exterior.insert(n);
            self.exterior_queue.push_back(n);
        }
    }

    fn start_from_seed(&mut self, seed: Vec3i, lattice: &NodeLattice) {
        if self.is_classified(&seed) {
            return;
        }
        if lattice.is_occupied(&seed) {
            self.solid.insert(seed);
            self.solid_queue.push_back(seed);
        } else {
            self.open_room(seed);
        }
    }

    fn open_room(&mut self, node: Vec3i) {
        self.room_count += 1;
        self.rooms.insert(node);
        self.room_queue.push_back(node);
    }

    fn crawl_solid(&mut self, node: Vec3i, lattice: &NodeLattice) {
        for d in Direction::ALL {
            let n = node + d.offset();
            if !within(&n, &self.min, &self.max) || self.is_classified(&n) {
                continue;
            }

            // occupancy alone splits solid from room here; edge airtightness
            // only matters against the exterior, which is already settled
            if lattice.is_occupied(&n) {
                self.solid.insert(n);
                self.solid_queue.push_back(n);
            } else {
                // flood the room first, then come back to this node
                self.open_room(n);
                self.solid_queue.push_front(node);
                return;
            }
        }
    }

    fn crawl_room(&mut self, node: Vec3i, lattice: &NodeLattice) {
        for d in Direction::ALL {
            let n = node + d.offset();
            if !within(&n, &self.min, &self.max) || self.is_classified(&n) {
                continue;
            }

            if lattice.is_occupied(&n) {
                self.solid.insert(n);
                self.solid_queue.push_back(n);
            } else {
                self.rooms.insert(n);
                self.room_queue.push_back(n);
            }
        }
    }
}
