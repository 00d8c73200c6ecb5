//! Airtightness of block faces and the per-node seal flags
//!
//! Every occupied lattice node carries a 12-bit flag. Bits `0..6` say the
//! node's own block seals its face in direction `i`; bits `6..12` say the
//! block on the neighbor in direction `i` seals its face toward this node.
//! An edge between two nodes is airtight when either side seals it.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::structure::{BlockDescriptor, BlockKind};
use crate::core_types::{Direction, Vec3i};

/// Block-local forward axis
pub fn forward() -> Vec3i {
    Vec3i::new(0, 0, -1)
}

/// Block-local backward axis
pub fn backward() -> Vec3i {
    Vec3i::new(0, 0, 1)
}

/// Pressurization rule for one face of one cube of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressurizationMark {
    NotPressurized,
    PressurizedAlways,
    /// Sealed while the block's door is closed or closing
    PressurizedClosed,
}

/// Door mechanism, which decides the faces a closed door seals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorKind {
    /// Seals its forward face
    Slide,
    /// Seals forward and backward
    Hinged,
    /// Seals every face except its mount points
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoorStatus {
    Open,
    Opening,
    Closing,
    #[default]
    Closed,
}

impl DoorStatus {
    /// Closed or on its way there
    pub fn is_closing_or_closed(self) -> bool {
        matches!(self, DoorStatus::Closing | DoorStatus::Closed)
    }

    pub fn is_fully_closed(self) -> bool {
        self == DoorStatus::Closed
    }
}

/// Pressurization mark of one local cube face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceMark {
    /// Cube offset from the block anchor, block-local
    pub cube: Vec3i,
    /// Outward face normal, block-local
    pub normal: Vec3i,
    pub mark: PressurizationMark,
}

/// Everything that decides whether a block's faces hold air
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirtightnessProfile {
    /// Seals every face regardless of marks
    pub fully_airtight: bool,
    pub face_marks: Vec<FaceMark>,
    /// Block-local normals of door mount points
    pub mount_normals: Vec<Vec3i>,
    pub door_status: DoorStatus,
}

impl AirtightnessProfile {
    /// Profile of a solid block such as armor
    pub fn sealed() -> Self {
        Self {
            fully_airtight: true,
            ..Self::default()
        }
    }

    /// Profile of a block that never holds air
    pub fn open() -> Self {
        Self::default()
    }

    fn mark(&self, cube: &Vec3i, normal: &Vec3i) -> Option<PressurizationMark> {
        self.face_marks
            .iter()
            .find(|m| m.cube == *cube && m.normal == *normal)
            .map(|m| m.mark)
    }
}

/// Whether `block` seals the face of lattice node `node` facing `direction`
pub fn seals_face(block: &BlockDescriptor, node: &Vec3i, direction: Direction) -> bool {
    let profile = &block.airtightness;
    if profile.fully_airtight {
        return true;
    }

    let to_local = block.orientation.transpose();
    let local_cube = to_local * (node - block.anchor);
    let local_normal = to_local * direction.offset();

    let door = match block.kind {
        BlockKind::Door(kind) => Some(kind),
        _ => None,
    };
    let closed = door.is_some() && profile.door_status.is_closing_or_closed();

    match profile.mark(&local_cube, &local_normal) {
        Some(PressurizationMark::NotPressurized) => false,
        Some(PressurizationMark::PressurizedAlways) => true,
        Some(PressurizationMark::PressurizedClosed) => closed,
        None => match door {
            Some(kind) if closed => door_seals(kind, profile, &local_normal),
            _ => false,
        },
    }
}

fn door_seals(kind: DoorKind, profile: &AirtightnessProfile, normal: &Vec3i) -> bool {
    if !profile.door_status.is_fully_closed() {
        return false;
    }

    match kind {
        DoorKind::Slide if *normal == forward() => return true,
        DoorKind::Hinged if *normal == forward() || *normal == backward() => return true,
        _ => {}
    }

    // remaining faces seal unless a mount point sits on them
    !profile.mount_normals.contains(normal)
}

/// Bit set when the node's own block seals direction `d`
#[inline]
pub const fn own_seal_bit(d: Direction) -> u16 {
    1 << d.index()
}

/// Bit set when the neighbor in direction `d` seals its face toward the node
#[inline]
pub const fn neighbor_seal_bit(d: Direction) -> u16 {
    1 << (d.index() + 6)
}

/// Seal flags of every occupied lattice node
#[derive(Debug, Clone, Default)]
pub struct NodeLattice {
    flags: FxHashMap<Vec3i, u16>,
}

impl NodeLattice {
    pub fn flags(&self, node: &Vec3i) -> Option<u16> {
        self.flags.get(node).copied()
    }

    pub fn is_occupied(&self, node: &Vec3i) -> bool {
        self.flags.contains_key(node)
    }

    pub fn set(&mut self, node: Vec3i, flags: u16) {
        self.flags.insert(node, flags);
    }

    pub fn remove(&mut self, node: &Vec3i) {
        self.flags.remove(node);
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Whether air can cross from `from` to its neighbor in `direction`
    pub fn is_edge_airtight(&self, from: &Vec3i, direction: Direction) -> bool {
        let to = from + direction.offset();
        let back = direction.opposite();
        let near = self.flags(from).unwrap_or(0);
        let far = self.flags(&to).unwrap_or(0);

        near & (own_seal_bit(direction) | neighbor_seal_bit(direction)) != 0
            || far & (own_seal_bit(back) | neighbor_seal_bit(back)) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::DefinitionId;
    use crate::grid::structure::BlockId;

    fn door(kind: DoorKind, status: DoorStatus) -> BlockDescriptor {
        BlockDescriptor::new(BlockId(1), Vec3i::zeros(), DefinitionId::new("Door", "Test"))
            .with_kind(BlockKind::Door(kind))
            .with_airtightness(AirtightnessProfile {
                mount_normals: vec![Vec3i::new(0, -1, 0)],
                door_status: status,
                ..AirtightnessProfile::default()
            })
    }

    #[test]
    fn test_sealed_profile_seals_everything() {
        let block = BlockDescriptor::new(BlockId(1), Vec3i::zeros(), DefinitionId::new("A", "B"))
            .with_airtightness(AirtightnessProfile::sealed());
        for d in Direction::ALL {
            assert!(seals_face(&block, &Vec3i::zeros(), d));
        }
    }

    #[test]
    fn test_slide_door_seals_forward_only_when_closed() {
        let closed = door(DoorKind::Slide, DoorStatus::Closed);
        assert!(seals_face(&closed, &Vec3i::zeros(), Direction::NegZ));
        // mount point face stays open
        assert!(!seals_face(&closed, &Vec3i::zeros(), Direction::NegY));

        let open = door(DoorKind::Slide, DoorStatus::Open);
        assert!(!seals_face(&open, &Vec3i::zeros(), Direction::NegZ));

        let closing = door(DoorKind::Slide, DoorStatus::Closing);
        assert!(!seals_face(&closing, &Vec3i::zeros(), Direction::NegZ));
    }

    #[test]
    fn test_hinged_door_seals_forward_and_backward() {
        let closed = door(DoorKind::Hinged, DoorStatus::Closed);
        assert!(seals_face(&closed, &Vec3i::zeros(), Direction::NegZ));
        assert!(seals_face(&closed, &Vec3i::zeros(), Direction::PosZ));
    }

    #[test]
    fn test_pressurized_closed_mark_accepts_closing() {
        let mut block = door(DoorKind::Advanced, DoorStatus::Closing);
        block.airtightness.face_marks.push(FaceMark {
            cube: Vec3i::zeros(),
            normal: Vec3i::new(1, 0, 0),
            mark: PressurizationMark::PressurizedClosed,
        });
        assert!(seals_face(&block, &Vec3i::zeros(), Direction::PosX));
        assert!(!seals_face(&block, &Vec3i::zeros(), Direction::NegX));
    }

    #[test]
    fn test_edge_airtight_from_either_side() {
        let mut lattice = NodeLattice::default();
        let a = Vec3i::zeros();
        let b = Vec3i::new(1, 0, 0);
        lattice.set(a, 0);
        lattice.set(b, own_seal_bit(Direction::NegX));

        assert!(lattice.is_edge_airtight(&a, Direction::PosX));
        assert!(lattice.is_edge_airtight(&b, Direction::NegX));
        assert!(!lattice.is_edge_airtight(&a, Direction::PosY));
    }
}
