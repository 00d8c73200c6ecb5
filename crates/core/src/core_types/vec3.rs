//! Vector aliases for lattice positions and world-space directions.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// World-space vector for positions, the sun direction and gravity.
///
/// Double precision: planet-scale coordinates lose meter resolution in `f32`.
pub type Vec3 = Vector3<f64>;

/// Integer lattice position in structure-local block space.
pub type Vec3i = Vector3<i32>;

/// Edge length of the flattening cube used to turn a lattice position into an id.
const FLATTEN_SIZE: i32 = 1024;

/// Flatten a lattice position into the stable integer id used for cells.
///
/// Positions inside `±512` on every axis map to unique ids.
#[inline]
pub fn flatten(position: &Vec3i) -> i32 {
    position
        .z
        .wrapping_mul(FLATTEN_SIZE * FLATTEN_SIZE)
        .wrapping_add(position.y.wrapping_mul(FLATTEN_SIZE))
        .wrapping_add(position.x)
}

/// Component-wise minimum of two lattice positions.
#[inline]
pub fn component_min(a: &Vec3i, b: &Vec3i) -> Vec3i {
    a.zip_map(b, i32::min)
}

/// Component-wise maximum of two lattice positions.
#[inline]
pub fn component_max(a: &Vec3i, b: &Vec3i) -> Vec3i {
    a.zip_map(b, i32::max)
}

/// True when `p` lies inside the inclusive box `[min, max]`.
#[inline]
pub fn within(p: &Vec3i, min: &Vec3i, max: &Vec3i) -> bool {
    p.x >= min.x && p.y >= min.y && p.z >= min.z && p.x <= max.x && p.y <= max.y && p.z <= max.z
}

/// One of the six axis directions of the lattice.
///
/// The discriminant order matches the face index used by the radiation node
/// and the airtightness bit layout: `+X, -X, +Y, -Y, +Z, -Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// All six directions in face-index order
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    /// Face index in `0..6`
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a face index, `None` outside `0..6`
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Direction::PosX),
            1 => Some(Direction::NegX),
            2 => Some(Direction::PosY),
            3 => Some(Direction::NegY),
            4 => Some(Direction::PosZ),
            5 => Some(Direction::NegZ),
            _ => None,
        }
    }

    /// The direction pointing the other way along the same axis
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::PosX => Direction::NegX,
            Direction::NegX => Direction::PosX,
            Direction::PosY => Direction::NegY,
            Direction::NegY => Direction::PosY,
            Direction::PosZ => Direction::NegZ,
            Direction::NegZ => Direction::PosZ,
        }
    }

    /// Unit lattice step in this direction
    #[inline]
    pub fn offset(self) -> Vec3i {
        match self {
            Direction::PosX => Vec3i::new(1, 0, 0),
            Direction::NegX => Vec3i::new(-1, 0, 0),
            Direction::PosY => Vec3i::new(0, 1, 0),
            Direction::NegY => Vec3i::new(0, -1, 0),
            Direction::PosZ => Vec3i::new(0, 0, 1),
            Direction::NegZ => Vec3i::new(0, 0, -1),
        }
    }

    /// Direction of a unit axis step; anything else yields `None`
    pub fn from_offset(offset: &Vec3i) -> Option<Self> {
        Direction::ALL.into_iter().find(|d| d.offset() == *offset)
    }

    /// Unit vector in structure-local space
    #[inline]
    pub fn unit(self) -> Vec3 {
        self.offset().map(f64::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_index_xor_one() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().index(), d.index() ^ 1);
            assert_eq!(d.offset() + d.opposite().offset(), Vec3i::zeros());
        }
    }

    #[test]
    fn test_from_offset_round_trips_axis_steps() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_offset(&d.offset()), Some(d));
            assert_eq!(Direction::from_index(d.index()), Some(d));
        }
        assert_eq!(Direction::from_offset(&Vec3i::new(1, 1, 0)), None);
    }

    #[test]
    fn test_flatten_distinguishes_neighbors() {
        let origin = Vec3i::new(3, -2, 7);
        let id = flatten(&origin);
        for d in Direction::ALL {
            assert_ne!(flatten(&(origin + d.offset())), id);
        }
    }
}
