//! Thermal material and planet definitions
//!
//! The host owns the data store; the simulation sees it through
//! [`DefinitionProvider`]. Lookups never fail: a missing entry falls back to
//! the type-level default, then the global default, then the built-in values
//! below.
//!
//! [`DefinitionCatalog`] is a ready-made provider backed by hash maps and
//! loadable from any serde format through [`CatalogFile`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Subtype used for per-type fallback entries
pub const DEFAULT_SUBTYPE: &str = "DefaultThermodynamics";

/// Type id of the global cell fallback
pub const DEFAULT_CELL_TYPE: &str = "EnvironmentDefinition";

/// Type id of the global planet fallback
pub const DEFAULT_PLANET_TYPE: &str = "PlanetGeneratorDefinition";

/// Identifier of a definition in the host's data store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionId {
    pub type_id: String,
    pub subtype_id: String,
}

impl DefinitionId {
    pub fn new(type_id: impl Into<String>, subtype_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            subtype_id: subtype_id.into(),
        }
    }

    /// The per-type fallback id sharing this id's type
    pub fn type_default(&self) -> Self {
        Self::new(self.type_id.clone(), DEFAULT_SUBTYPE)
    }

    /// Global fallback for block materials
    pub fn default_cell() -> Self {
        Self::new(DEFAULT_CELL_TYPE, DEFAULT_SUBTYPE)
    }

    /// Global fallback for planets
    pub fn default_planet() -> Self {
        Self::new(DEFAULT_PLANET_TYPE, DEFAULT_SUBTYPE)
    }
}

impl std::fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.type_id, self.subtype_id)
    }
}

/// Thermal properties of a block material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalCellDefinition {
    /// Conductivity (W/(m·K)); the grid uses it per unit touching area
    pub conductivity: f32,
    /// Specific heat capacity (J/(kg·K))
    pub specific_heat: f32,
    /// Emissivity in `[0, 1]`
    pub emissivity: f32,
    /// Fraction of produced power turned into heat
    pub producer_waste_energy: f32,
    /// Fraction of consumed power turned into heat
    pub consumer_waste_energy: f32,
    /// Temperature above which the block takes damage (K), 0 disables
    pub critical_temperature: f32,
    /// Damage per kelvin above critical, in `[0, 1]`
    pub critical_temperature_scaler: f32,
}

impl Default for ThermalCellDefinition {
    /// Structural steel
    fn default() -> Self {
        Self {
            conductivity: 50.0,
            specific_heat: 450.0,
            emissivity: 0.5,
            producer_waste_energy: 0.0,
            consumer_waste_energy: 0.0,
            critical_temperature: 1500.0,
            critical_temperature_scaler: 0.5,
        }
    }
}

impl ThermalCellDefinition {
    /// Copy with negative and non-finite values removed
    pub fn sanitized(&self) -> Self {
        Self {
            conductivity: non_negative(self.conductivity),
            specific_heat: non_negative(self.specific_heat),
            emissivity: non_negative(self.emissivity),
            producer_waste_energy: non_negative(self.producer_waste_energy),
            consumer_waste_energy: non_negative(self.consumer_waste_energy),
            critical_temperature: non_negative(self.critical_temperature),
            critical_temperature_scaler: non_negative(self.critical_temperature_scaler).min(1.0),
        }
    }
}

/// Ambient conditions of a celestial body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetDefinition {
    /// Ambient at the point facing away from the sun (K)
    pub night_temperature: f32,
    /// Ambient at the sub-solar point (K)
    pub day_temperature: f32,
    /// Ambient just below the surface (K)
    pub underground_temperature: f32,
    /// Ambient at the body's center (K)
    pub core_temperature: f32,
    /// Depth below the surface before underground conditions apply (m)
    pub sealevel_deadzone: f32,
    /// Fraction of sunlight absorbed per unit air density, in `[0, 1]`
    pub solar_decay: f32,
    /// Convective coefficient of the atmosphere at unit density (W/(m²·K))
    pub atmosphere_conductivity: f32,
    /// Scale applied to the host's normalized air density
    pub atmosphere_density: f32,
}

impl Default for PlanetDefinition {
    /// Earth-like
    fn default() -> Self {
        Self {
            night_temperature: 250.0,
            day_temperature: 300.0,
            underground_temperature: 285.0,
            core_temperature: 5000.0,
            sealevel_deadzone: 20.0,
            solar_decay: 0.3,
            atmosphere_conductivity: 10.0,
            atmosphere_density: 1.0,
        }
    }
}

impl PlanetDefinition {
    /// Copy with negative and non-finite values removed
    pub fn sanitized(&self) -> Self {
        Self {
            night_temperature: non_negative(self.night_temperature),
            day_temperature: non_negative(self.day_temperature),
            underground_temperature: non_negative(self.underground_temperature),
            core_temperature: non_negative(self.core_temperature),
            sealevel_deadzone: non_negative(self.sealevel_deadzone),
            solar_decay: non_negative(self.solar_decay).min(1.0),
            atmosphere_conductivity: non_negative(self.atmosphere_conductivity),
            atmosphere_density: non_negative(self.atmosphere_density),
        }
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Source of thermal definitions
///
/// Implementations return raw entries; fallback and clamping happen in
/// [`resolve_cell_definition`] and [`resolve_planet_definition`].
pub trait DefinitionProvider {
    fn cell_definition(&self, id: &DefinitionId) -> Option<ThermalCellDefinition>;
    fn planet_definition(&self, id: &DefinitionId) -> Option<PlanetDefinition>;
}

/// Look up a block material: exact id, then type default, then global default
pub fn resolve_cell_definition(
    provider: &dyn DefinitionProvider,
    id: &DefinitionId,
) -> ThermalCellDefinition {
    provider
        .cell_definition(id)
        .or_else(|| provider.cell_definition(&id.type_default()))
        .or_else(|| provider.cell_definition(&DefinitionId::default_cell()))
        .unwrap_or_default()
        .sanitized()
}

/// Look up a planet: exact id, then type default, then global default
pub fn resolve_planet_definition(
    provider: &dyn DefinitionProvider,
    id: &DefinitionId,
) -> PlanetDefinition {
    provider
        .planet_definition(id)
        .or_else(|| provider.planet_definition(&id.type_default()))
        .or_else(|| provider.planet_definition(&DefinitionId::default_planet()))
        .unwrap_or_default()
        .sanitized()
}

/// One entry of a serialized catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry<T> {
    pub id: DefinitionId,
    #[serde(flatten)]
    pub definition: T,
}

/// Serialized form of a [`DefinitionCatalog`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub cells: Vec<CatalogEntry<ThermalCellDefinition>>,
    pub planets: Vec<CatalogEntry<PlanetDefinition>>,
}

/// In-memory [`DefinitionProvider`]
#[derive(Debug, Clone, Default)]
pub struct DefinitionCatalog {
    cells: FxHashMap<DefinitionId, ThermalCellDefinition>,
    planets: FxHashMap<DefinitionId, PlanetDefinition>,
}

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_cell(&mut self, id: DefinitionId, definition: ThermalCellDefinition) {
        self.cells.insert(id, definition);
    }

    pub fn insert_planet(&mut self, id: DefinitionId, definition: PlanetDefinition) {
        self.planets.insert(id, definition);
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    /// Snapshot in serializable form, entries sorted by id
    pub fn to_file(&self) -> CatalogFile {
        let key = |id: &DefinitionId| (id.type_id.clone(), id.subtype_id.clone());
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(id, definition)| CatalogEntry {
                id: id.clone(),
                definition: definition.clone(),
            })
            .collect();
        cells.sort_by_key(|entry| key(&entry.id));
        let mut planets: Vec<_> = self
            .planets
            .iter()
            .map(|(id, definition)| CatalogEntry {
                id: id.clone(),
                definition: definition.clone(),
            })
            .collect();
        planets.sort_by_key(|entry| key(&entry.id));
        CatalogFile { cells, planets }
    }
}

impl From<CatalogFile> for DefinitionCatalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = Self::new();
        for entry in file.cells {
            catalog.insert_cell(entry.id, entry.definition);
        }
        for entry in file.planets {
            catalog.insert_planet(entry.id, entry.definition);
        }
        catalog
    }
}

impl DefinitionProvider for DefinitionCatalog {
    fn cell_definition(&self, id: &DefinitionId) -> Option<ThermalCellDefinition> {
        self.cells.get(id).cloned()
    }

    fn planet_definition(&self, id: &DefinitionId) -> Option<PlanetDefinition> {
        self.planets.get(id).cloned()
    }
}
