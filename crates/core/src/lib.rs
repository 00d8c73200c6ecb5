//! Thermodynamics Core Library
//!
//! Heat simulation for structures built from voxel blocks. Every block is a
//! thermal cell that conducts heat to the blocks it touches, radiates and
//! convects through faces open to the outside, absorbs sunlight and turns
//! the electrical power it handles into waste heat.
//!
//! ## Layout
//!
//! - [`core_types`]: lattice vectors, directions, settings and material definitions
//! - [`grid`]: cell store, block occupancy, airtightness and the exposure mapper
//! - [`physics`]: heat-transfer terms and the per-block [`ThermalCell`]
//! - [`environment`]: host services and the per-pass environment snapshot
//! - [`simulation`]: [`ThermalGrid`], [`ThermalWorld`], events and persistence
//!
//! The host owns the clock. It feeds block and power changes in as
//! [`ThermalEvent`]s and calls [`ThermalWorld::tick`] once per frame; each grid
//! then spends a budget of cell updates proportional to its size.

pub mod core_types;
pub mod environment;
pub mod grid;
pub mod physics;
pub mod simulation;

pub use core_types::{
    DefinitionCatalog, DefinitionId, DefinitionProvider, Direction, PlanetDefinition,
    ThermalCellDefinition, ThermalSettings, Vec3, Vec3i,
};
pub use environment::{
    BodySample, EnvironmentProvider, GridTransform, HostServices, NoOcclusion, NullEnvironment,
    StaticEnvironment, VisibilityService,
};
pub use grid::{
    AirtightnessProfile, BlockDescriptor, BlockId, BlockKind, CellHandle, DoorKind, DoorStatus,
    ExposureMapper, FreeList, GridId, NodeClass,
};
pub use physics::{BlockDamage, CellAddress, ThermalCell};
pub use simulation::{
    BlobStorage, Hsv, MemoryStorage, ThermalError, ThermalEvent, ThermalGrid, ThermalWorld,
};
