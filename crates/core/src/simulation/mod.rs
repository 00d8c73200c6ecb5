//! Grids, the world that drives them, and their host-facing plumbing
//!
//! - [`ThermalGrid`]: budgeted scheduler and structural events for one structure
//! - [`ThermalWorld`]: registry of grids, event intake, cross-grid links
//! - [`persistence`]: the compact temperature blob
//! - [`debug`]: heat-map colors

pub mod debug;
pub mod error;
pub mod events;
pub mod persistence;
pub mod thermal_grid;
pub mod world;

pub use debug::{temperature_color, Hsv};
pub use error::ThermalError;
pub use events::{EventQueue, ThermalEvent};
pub use persistence::{BlobStorage, CellRecord, MemoryStorage, PersistenceError, STORAGE_KEY};
pub use thermal_grid::{exposed_faces, RemovedBlock, ThermalGrid, FRAMES_PER_SECOND};
pub use world::ThermalWorld;
