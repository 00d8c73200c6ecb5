//! Errors returned by grid and world operations

use crate::core_types::Vec3i;
use crate::grid::{BlockId, BlockKind, CellHandle, GridId};

/// Structural misuse reported by grids and the world
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalError {
    /// A block with this id already exists
    DuplicateBlock(BlockId),
    /// No block with this id
    UnknownBlock(BlockId),
    /// No grid with this id
    UnknownGrid(GridId),
    /// A grid with this id is already registered
    DuplicateGrid(GridId),
    /// Handle refers to a freed or reused slot
    StaleHandle(CellHandle),
    /// Lattice node already occupied by another block
    Overlap(Vec3i),
    /// Event does not apply to a block of this kind
    WrongKind { block: BlockId, kind: BlockKind },
}

impl std::fmt::Display for ThermalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThermalError::DuplicateBlock(id) => write!(f, "Block {id} already exists"),
            ThermalError::UnknownBlock(id) => write!(f, "Unknown block {id}"),
            ThermalError::UnknownGrid(id) => write!(f, "Unknown grid {id}"),
            ThermalError::DuplicateGrid(id) => write!(f, "Grid {id} already exists"),
            ThermalError::StaleHandle(handle) => write!(
                f,
                "Stale cell handle (index {}, generation {})",
                handle.index(),
                handle.generation()
            ),
            ThermalError::Overlap(node) => {
                write!(f, "Node ({}, {}, {}) is already occupied", node.x, node.y, node.z)
            }
            ThermalError::WrongKind { block, kind } => {
                write!(f, "Event does not apply to block {block} of kind {kind:?}")
            }
        }
    }
}

impl std::error::Error for ThermalError {}
