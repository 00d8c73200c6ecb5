//! Shared builders for the integration tests
#![allow(dead_code)]

use thermodynamics_core::{
    AirtightnessProfile, BlockDescriptor, BlockId, DefinitionCatalog, DefinitionId, HostServices,
    NoOcclusion, NullEnvironment, ThermalCellDefinition, ThermalGrid, Vec3i,
};

#[ctor::ctor]
fn init_tracing() {
    // RUST_LOG=thermodynamics_core=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn armor_id() -> DefinitionId {
    DefinitionId::new("CubeBlock", "Armor")
}

/// Airtight unit block
pub fn armor(id: u64, x: i32, y: i32, z: i32) -> BlockDescriptor {
    BlockDescriptor::new(BlockId(id), Vec3i::new(x, y, z), armor_id())
        .with_airtightness(AirtightnessProfile::sealed())
}

/// Catalog whose only entry is `definition` under the armor id
pub fn catalog(definition: ThermalCellDefinition) -> DefinitionCatalog {
    let mut catalog = DefinitionCatalog::new();
    catalog.insert_cell(armor_id(), definition);
    catalog
}

pub fn services(definitions: &DefinitionCatalog) -> HostServices<'_> {
    HostServices {
        definitions,
        environment: &NullEnvironment,
        visibility: &NoOcclusion,
    }
}

/// Run frames until `done` holds, giving up after `max_frames`
pub fn run_until(
    grid: &mut ThermalGrid,
    definitions: &DefinitionCatalog,
    max_frames: usize,
    done: impl Fn(&ThermalGrid) -> bool,
) -> bool {
    let services = services(definitions);
    for _ in 0..max_frames {
        if done(grid) {
            return true;
        }
        grid.update_frame(&services);
    }
    done(grid)
}

/// Boundary nodes of the inclusive box `[min, max]`
pub fn shell(min: Vec3i, max: Vec3i) -> Vec<Vec3i> {
    let mut nodes = Vec::new();
    for z in min.z..=max.z {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let boundary = x == min.x || x == max.x || y == min.y || y == max.y || z == min.z || z == max.z;
                if boundary {
                    nodes.push(Vec3i::new(x, y, z));
                }
            }
        }
    }
    nodes
}
