//! Core types and utilities

pub mod definitions;
pub mod settings;
pub mod vec3;

pub use definitions::{
    resolve_cell_definition, resolve_planet_definition, CatalogEntry, CatalogFile,
    DefinitionCatalog, DefinitionId, DefinitionProvider, PlanetDefinition, ThermalCellDefinition,
};
pub use settings::ThermalSettings;
pub use vec3::{flatten, Direction, Vec3, Vec3i};
