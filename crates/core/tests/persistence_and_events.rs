//! Saved temperatures and cross-grid structural events
mod common;

use common::{armor, catalog};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thermodynamics_core::simulation::STORAGE_KEY;
use thermodynamics_core::{
    BlobStorage, BlockId, BlockKind, DoorKind, DoorStatus, GridId, GridTransform, MemoryStorage,
    ThermalCellDefinition, ThermalEvent, ThermalGrid, ThermalSettings, ThermalWorld, Vec3i,
};

fn row_grid(id: GridId, blocks: u64) -> ThermalGrid {
    let definitions = catalog(ThermalCellDefinition::default());
    let mut grid = ThermalGrid::new(id, 2.5, &ThermalSettings::default());
    for i in 0..blocks {
        grid.add_block(&definitions, armor(i + 1, i as i32, 0, 0)).unwrap();
    }
    grid
}

#[test]
fn test_pack_round_trip_within_precision() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut grid = row_grid(GridId(1), 40);
    let mut expected = Vec::new();
    for i in 1..=40 {
        let t: f32 = rng.random_range(0.0..1000.0);
        grid.set_block_temperature(BlockId(i), t).unwrap();
        expected.push((BlockId(i), t));
    }

    let mut storage = MemoryStorage::new();
    grid.save(&mut storage);

    let mut restored = row_grid(GridId(1), 40);
    assert_eq!(restored.load(&storage), 40);
    for (block, t) in expected {
        let back = restored.block_temperature(block).unwrap();
        assert!((back - t).abs() <= 1e-4 * t.max(1.0), "{block}: {t} became {back}");
    }
}

#[test]
fn test_unknown_ids_and_corrupt_blobs_are_tolerated() {
    let mut small = row_grid(GridId(1), 2);
    small.set_block_temperature(BlockId(1), 310.0).unwrap();
    small.set_block_temperature(BlockId(2), 320.0).unwrap();

    // a larger grid's blob restores the cells that exist and skips the rest
    let large = row_grid(GridId(1), 5);
    let mut storage = MemoryStorage::new();
    large.save(&mut storage);
    assert_eq!(small.load(&storage), 2);
    assert_eq!(small.block_temperature(BlockId(1)), Some(0.0));

    small.set_block_temperature(BlockId(1), 310.0).unwrap();
    storage.write(STORAGE_KEY, "definitely not base64".to_string());
    assert_eq!(small.load(&storage), 0);
    assert_eq!(small.block_temperature(BlockId(1)), Some(310.0));

    // truncated record
    storage.write(STORAGE_KEY, "AQAAABAn".to_string());
    assert_eq!(small.load(&storage), 0);
    assert_eq!(small.block_temperature(BlockId(1)), Some(310.0));
}

#[test]
fn test_world_save_and_load() {
    let mut world = ThermalWorld::headless(&ThermalSettings::default());
    world.add_grid(GridId(4), 2.5, GridTransform::default()).unwrap();
    world
        .apply(ThermalEvent::BlockAdded {
            grid: GridId(4),
            block: armor(1, 0, 0, 0),
        })
        .unwrap();
    world.grid_mut(GridId(4)).unwrap().set_block_temperature(BlockId(1), 451.0).unwrap();

    let mut storage = MemoryStorage::new();
    world.save_grid(GridId(4), &mut storage).unwrap();
    assert!(world.save_grid(GridId(5), &mut storage).is_err());

    world.grid_mut(GridId(4)).unwrap().set_block_temperature(BlockId(1), 0.0).unwrap();
    assert_eq!(world.load_grid(GridId(4), &storage).unwrap(), 1);
    let t = world.grid(GridId(4)).unwrap().block_temperature(BlockId(1)).unwrap();
    assert!((t - 451.0).abs() < 1e-3);
}

#[test]
fn test_split_inherits_recently_removed_temperatures() {
    let mut world = ThermalWorld::headless(&ThermalSettings::default());
    world.add_grid(GridId(1), 2.5, GridTransform::default()).unwrap();
    world.add_grid(GridId(2), 2.5, GridTransform::default()).unwrap();
    for i in 0..4 {
        world
            .apply(ThermalEvent::BlockAdded {
                grid: GridId(1),
                block: armor(i + 1, i as i32, 0, 0),
            })
            .unwrap();
    }
    let source = world.grid_mut(GridId(1)).unwrap();
    source.set_block_temperature(BlockId(3), 640.0).unwrap();
    source.set_block_temperature(BlockId(4), 720.0).unwrap();

    // the host moves blocks 3 and 4 onto a new structure
    for (id, x) in [(3, 2), (4, 3)] {
        world
            .apply(ThermalEvent::BlockRemoved {
                grid: GridId(1),
                block: BlockId(id),
            })
            .unwrap();
        world
            .apply(ThermalEvent::BlockAdded {
                grid: GridId(2),
                block: armor(id + 10, x, 0, 0),
            })
            .unwrap();
    }
    world
        .apply(ThermalEvent::GridSplit {
            from: GridId(1),
            into: GridId(2),
        })
        .unwrap();

    let split = world.grid(GridId(2)).unwrap();
    assert_eq!(split.block_temperature(BlockId(13)), Some(640.0));
    assert_eq!(split.block_temperature(BlockId(14)), Some(720.0));
    assert_eq!(world.grid(GridId(1)).unwrap().recently_removed_count(), 0);
    assert_eq!(world.grid(GridId(1)).unwrap().cell_count(), 2);
}

#[test]
fn test_merge_adopts_absorbed_temperatures() {
    let mut world = ThermalWorld::headless(&ThermalSettings::default());
    world.add_grid(GridId(1), 2.5, GridTransform::default()).unwrap();
    world.add_grid(GridId(2), 2.5, GridTransform::default()).unwrap();

    world
        .apply(ThermalEvent::BlockAdded {
            grid: GridId(2),
            block: armor(20, 5, 0, 0),
        })
        .unwrap();
    world.grid_mut(GridId(2)).unwrap().set_block_temperature(BlockId(20), 777.0).unwrap();

    world
        .apply(ThermalEvent::BlockAdded {
            grid: GridId(1),
            block: armor(1, 4, 0, 0),
        })
        .unwrap();
    world
        .apply(ThermalEvent::BlockAdded {
            grid: GridId(1),
            block: armor(21, 5, 0, 0),
        })
        .unwrap();
    world
        .apply(ThermalEvent::GridMerged {
            absorbed: GridId(2),
            into: GridId(1),
        })
        .unwrap();

    assert!(world.grid(GridId(2)).is_none());
    let merged = world.grid(GridId(1)).unwrap();
    assert_eq!(merged.block_temperature(BlockId(21)), Some(777.0));
    assert_eq!(merged.block_temperature(BlockId(1)), Some(0.0));
}

#[test]
fn test_mechanical_link_conducts_across_grids() {
    let settings = ThermalSettings {
        mechanical_link_area: 1.0,
        enable_solar_heat: false,
        ..ThermalSettings::default()
    };
    let mut world = ThermalWorld::new(
        &settings,
        Box::new(catalog(ThermalCellDefinition {
            emissivity: 0.0,
            ..ThermalCellDefinition::default()
        })),
        Box::new(thermodynamics_core::NullEnvironment),
        Box::new(thermodynamics_core::NoOcclusion),
    );
    world.add_grid(GridId(1), 2.5, GridTransform::default()).unwrap();
    world.add_grid(GridId(2), 2.5, GridTransform::default()).unwrap();
    world.submit(ThermalEvent::BlockAdded {
        grid: GridId(1),
        block: armor(1, 0, 0, 0).with_kind(BlockKind::Rotor),
    });
    world.submit(ThermalEvent::BlockAdded {
        grid: GridId(2),
        block: armor(2, 0, 1, 0),
    });
    world.submit(ThermalEvent::MechanicalAttachmentChanged {
        grid: GridId(1),
        block: BlockId(1),
        attached: Some((GridId(2), BlockId(2))),
    });
    world.tick();

    world.grid_mut(GridId(1)).unwrap().set_block_temperature(BlockId(1), 500.0).unwrap();
    world.grid_mut(GridId(2)).unwrap().set_block_temperature(BlockId(2), 100.0).unwrap();
    for _ in 0..30 {
        world.tick();
    }
    let rotor = world.grid(GridId(1)).unwrap().block_temperature(BlockId(1)).unwrap();
    let top = world.grid(GridId(2)).unwrap().block_temperature(BlockId(2)).unwrap();
    assert!(rotor < 500.0 && top > 100.0, "no exchange: {rotor}, {top}");
    assert!(rotor > top);

    // releasing the connector stops the exchange on both sides
    world.submit(ThermalEvent::MechanicalAttachmentChanged {
        grid: GridId(1),
        block: BlockId(1),
        attached: None,
    });
    world.tick();
    assert!(world.grid(GridId(1)).unwrap().remote_addresses().is_empty());
    assert!(world.grid(GridId(2)).unwrap().remote_addresses().is_empty());

    // closing a grid drops the links other grids had into it
    world.submit(ThermalEvent::MechanicalAttachmentChanged {
        grid: GridId(1),
        block: BlockId(1),
        attached: Some((GridId(2), BlockId(2))),
    });
    world.tick();
    assert_eq!(world.grid(GridId(1)).unwrap().remote_addresses().len(), 1);
    world.remove_grid(GridId(2));
    assert!(world.grid(GridId(1)).unwrap().remote_addresses().is_empty());
}

#[test]
fn test_door_events_route_to_the_grid() {
    let mut world = ThermalWorld::headless(&ThermalSettings::default());
    world.add_grid(GridId(1), 2.5, GridTransform::default()).unwrap();
    let door = armor(1, 0, 0, 0).with_kind(BlockKind::Door(DoorKind::Hinged));
    world
        .apply(ThermalEvent::BlockAdded {
            grid: GridId(1),
            block: door,
        })
        .unwrap();
    world
        .apply(ThermalEvent::DoorStateChanged {
            grid: GridId(1),
            block: BlockId(1),
            status: DoorStatus::Opening,
        })
        .unwrap();

    let grid = world.grid(GridId(1)).unwrap();
    let status = grid.structure().block(BlockId(1)).unwrap().airtightness.door_status;
    assert_eq!(status, DoorStatus::Opening);
    assert_eq!(grid.structure().block_at(&Vec3i::zeros()), Some(BlockId(1)));
}
