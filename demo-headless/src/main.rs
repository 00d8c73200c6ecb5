use clap::Parser;
use nalgebra::{Rotation3, Vector3};
use thermodynamics_core::core_types::CatalogFile;
use thermodynamics_core::simulation::STORAGE_KEY;
use thermodynamics_core::{
    AirtightnessProfile, BlobStorage, BlockDescriptor, BlockId, BodySample, DefinitionCatalog, DefinitionId,
    GridId, GridTransform, MemoryStorage, NoOcclusion, StaticEnvironment, ThermalCellDefinition,
    ThermalEvent, ThermalSettings, ThermalWorld, Vec3, Vec3i,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Thermal simulation demo: a sealed hull heated by a reactor
#[derive(Parser, Debug)]
#[command(name = "thermo-demo")]
#[command(about = "Headless thermodynamics simulation demo", long_about = None)]
struct Args {
    /// Frames to simulate (60 per simulated second)
    #[arg(short, long, default_value_t = 1800)]
    frames: u32,

    /// Hull edge length in blocks
    #[arg(long, default_value_t = 5)]
    hull_size: i32,

    /// Lattice step in meters
    #[arg(long, default_value_t = 2.5)]
    grid_size: f32,

    /// Reactor output in megawatts
    #[arg(short, long, default_value_t = 15.0)]
    reactor_mw: f32,

    /// Leave a hatch open in the roof
    #[arg(long)]
    open_hatch: bool,

    /// Put the hull on a planet surface instead of open space
    #[arg(short, long)]
    planet: bool,

    /// Sun elevation in degrees
    #[arg(long, default_value_t = 45.0)]
    sun_angle: f64,

    /// Report interval in frames
    #[arg(long, default_value_t = 300)]
    report_interval: u32,

    /// Settings JSON file (see --dump-settings)
    #[arg(long)]
    settings: Option<String>,

    /// Definition catalog JSON file
    #[arg(long)]
    catalog: Option<String>,

    /// Write the packed temperatures here when done
    #[arg(long)]
    save: Option<String>,

    /// Print the default settings as JSON and exit
    #[arg(long)]
    dump_settings: bool,
}

const ARMOR: (&str, &str) = ("CubeBlock", "LargeBlockArmorBlock");
const REACTOR: (&str, &str) = ("Reactor", "LargeBlockSmallGenerator");

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if args.dump_settings {
        match serde_json::to_string_pretty(&ThermalSettings::default()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to encode settings: {e}"),
        }
        return;
    }

    let settings = match args.settings.as_deref().map(load_settings).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let catalog = match args.catalog.as_deref().map(load_catalog).transpose() {
        Ok(catalog) => catalog.unwrap_or_else(builtin_catalog),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!("=== Thermodynamics Demo ===\n");
    println!(
        "Settings: {} passes/s, speed {:.1}, solar {:.0} W/m², damage {}",
        settings.frequency, settings.simulation_speed, settings.solar_energy, settings.enable_damage
    );
    println!("Catalog: {} materials, {} planets", catalog.cell_count(), catalog.planet_count());

    let sun = Rotation3::from_axis_angle(&Vector3::z_axis(), args.sun_angle.to_radians()) * Vec3::x();
    let environment = StaticEnvironment {
        sun_direction: sun,
        body: args.planet.then(|| BodySample {
            definition: DefinitionId::default_planet(),
            center: Vec3::new(0.0, -60_000.0, 0.0),
            radius: 60_000.0,
            air_density: 1.0,
            depth: -10.0,
        }),
    };
    println!(
        "Environment: {}, sun at {:.0}°\n",
        if args.planet { "planet surface" } else { "open space" },
        args.sun_angle
    );

    let mut world = ThermalWorld::new(&settings, Box::new(catalog), Box::new(environment), Box::new(NoOcclusion));
    let grid_id = GridId(1);
    if let Err(e) = world.add_grid(grid_id, args.grid_size, GridTransform::default()) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let reactor = build_hull(&mut world, grid_id, args.hull_size.max(3), args.open_hatch);
    world.submit(ThermalEvent::PowerOutputChanged {
        grid: grid_id,
        block: reactor,
        megawatts: args.reactor_mw,
    });

    let mut total_damage = 0.0;
    for frame in 1..=args.frames {
        world.tick();
        total_damage += world.drain_damage().iter().map(|d| d.amount).sum::<f32>();

        if frame % args.report_interval.max(1) == 0 || frame == args.frames {
            report(&world, grid_id, reactor, frame, settings.frequency);
        }
    }

    if let Some(grid) = world.grid(grid_id) {
        let mapper = grid.mapper();
        println!("\n=== Final State ===");
        println!(
            "Mapping: {} exterior, {} solid, {} interior nodes in {} room(s)",
            mapper.exterior_count(),
            mapper.solid_count(),
            mapper.interior_room_count(),
            mapper.room_count()
        );
        println!("Passes: {}, damage dealt: {:.1}", grid.simulation_frame(), total_damage);
    }

    if let Some(path) = args.save {
        let mut storage = MemoryStorage::new();
        if let Err(e) = world.save_grid(grid_id, &mut storage) {
            warn!(error = %e, "nothing to save");
            return;
        }
        let blob = storage.read(STORAGE_KEY).unwrap_or_default();
        match std::fs::write(&path, blob) {
            Ok(()) => info!(path = %path, "saved temperatures"),
            Err(e) => warn!(path = %path, error = %e, "failed to save temperatures"),
        }
    }
}

fn load_settings(path: &str) -> Result<ThermalSettings, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    let settings: ThermalSettings =
        serde_json::from_str(&text).map_err(|e| format!("Invalid settings in {path}: {e}"))?;
    Ok(settings.sanitized())
}

fn load_catalog(path: &str) -> Result<DefinitionCatalog, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    let file: CatalogFile = serde_json::from_str(&text).map_err(|e| format!("Invalid catalog in {path}: {e}"))?;
    Ok(DefinitionCatalog::from(file))
}

fn builtin_catalog() -> DefinitionCatalog {
    let mut catalog = DefinitionCatalog::new();
    catalog.insert_cell(DefinitionId::new(ARMOR.0, ARMOR.1), ThermalCellDefinition::default());
    catalog.insert_cell(
        DefinitionId::new(REACTOR.0, REACTOR.1),
        ThermalCellDefinition {
            conductivity: 80.0,
            producer_waste_energy: 0.2,
            critical_temperature: 900.0,
            critical_temperature_scaler: 0.1,
            ..ThermalCellDefinition::default()
        },
    );
    catalog
}

/// Queue a hollow armor cube with a reactor resting on its floor
///
/// Returns the reactor's block id.
fn build_hull(world: &mut ThermalWorld, grid: GridId, size: i32, open_hatch: bool) -> BlockId {
    let max = size - 1;
    let hatch = Vec3i::new(size / 2, max, size / 2);
    let mut next_id = 0;

    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let node = Vec3i::new(x, y, z);
                let boundary = x == 0 || y == 0 || z == 0 || x == max || y == max || z == max;
                if !boundary || (open_hatch && node == hatch) {
                    continue;
                }
                next_id += 1;
                world.submit(ThermalEvent::BlockAdded {
                    grid,
                    block: BlockDescriptor::new(BlockId(next_id), node, DefinitionId::new(ARMOR.0, ARMOR.1))
                        .with_airtightness(AirtightnessProfile::sealed()),
                });
            }
        }
    }

    let reactor = BlockId(next_id + 1);
    world.submit(ThermalEvent::BlockAdded {
        grid,
        block: BlockDescriptor::new(reactor, Vec3i::new(size / 2, 1, size / 2), DefinitionId::new(REACTOR.0, REACTOR.1))
            .with_mass(2_000.0),
    });
    println!("Queued {} hull blocks and a reactor", next_id);
    reactor
}

fn report(world: &ThermalWorld, grid: GridId, reactor: BlockId, frame: u32, frequency: u32) {
    let Some(grid) = world.grid(grid) else {
        return;
    };

    let mut min = f32::MAX;
    let mut max = f32::MIN;
    let mut sum = 0.0;
    let mut count = 0;
    for (_, cell) in grid.cells().iter() {
        if cell.block() == reactor {
            continue;
        }
        min = min.min(cell.temperature());
        max = max.max(cell.temperature());
        sum += cell.temperature();
        count += 1;
    }
    let average = if count > 0 { sum / count as f32 } else { 0.0 };
    let reactor_t = grid.block_temperature(reactor).unwrap_or(0.0);

    println!(
        "[{:>7.1}s] reactor {:>7.1} K | hull avg {:>6.1} K (min {:>6.1}, max {:>6.1}) | ambient {:>6.1} K{}",
        frame as f32 / frequency.max(1) as f32,
        reactor_t,
        average,
        min,
        max,
        grid.environment().ambient_temperature,
        if grid.surfaces_current() { "" } else { " (mapping)" }
    );
}
