//! Lattice-level state of a structure: cell store, block occupancy,
//! airtightness and exposure classification

pub mod airtightness;
pub mod free_list;
pub mod mapper;
pub mod radiation_node;
pub mod structure;

pub use airtightness::{
    AirtightnessProfile, DoorKind, DoorStatus, FaceMark, NodeLattice, PressurizationMark,
};
pub use free_list::{CellHandle, FreeList};
pub use mapper::{ExposureMapper, NodeClass};
pub use radiation_node::RadiationNode;
pub use structure::{touching_faces, BlockDescriptor, BlockId, BlockKind, GridId, Structure};
