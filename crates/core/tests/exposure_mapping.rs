//! Exterior / solid / interior-room classification of structures
mod common;

use common::{armor, catalog, run_until, shell};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thermodynamics_core::grid::Structure;
use thermodynamics_core::{
    AirtightnessProfile, BlockDescriptor, BlockId, Direction, ExposureMapper, GridId, NodeClass,
    ThermalCellDefinition, ThermalGrid, ThermalSettings, Vec3i,
};

fn random_structure(seed: u64) -> Structure {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut structure = Structure::new(2.5);
    let mut id = 0;
    for z in 0..6 {
        for y in 0..6 {
            for x in 0..6 {
                if !rng.random_bool(0.45) {
                    continue;
                }
                id += 1;
                let airtightness = if rng.random_bool(0.8) {
                    AirtightnessProfile::sealed()
                } else {
                    AirtightnessProfile::open()
                };
                let block = BlockDescriptor::new(BlockId(id), Vec3i::new(x, y, z), common::armor_id())
                    .with_airtightness(airtightness);
                structure.add_block(block).unwrap();
            }
        }
    }
    structure
}

#[test]
fn test_partition_is_independent_of_budget() {
    for seed in 0..6 {
        let structure = random_structure(seed);

        let mut reference = ExposureMapper::new();
        reference.reset(structure.bounds());
        reference.run_to_completion(structure.nodes());
        let expected = reference.partition();

        for budget in [1, 3, 17, 1_000] {
            let mut mapper = ExposureMapper::new();
            mapper.reset(structure.bounds());
            mapper.set_nodes_per_frame(budget);
            let mut calls = 0;
            while !mapper.is_complete() {
                mapper.advance(structure.nodes());
                calls += 1;
                assert!(calls < 100_000, "mapper never finished");
            }
            assert_eq!(mapper.partition(), expected, "seed {seed}, budget {budget}");
            assert_eq!(mapper.room_count(), reference.room_count());
        }
    }
}

#[test]
fn test_sets_are_disjoint_and_cover_the_volume() {
    let structure = random_structure(42);
    let mut mapper = ExposureMapper::new();
    mapper.reset(structure.bounds());
    mapper.run_to_completion(structure.nodes());

    let (min, max) = mapper.bounds();
    let extent = max - min + Vec3i::repeat(1);
    let volume = (extent.x * extent.y * extent.z) as usize;

    let partition = mapper.partition();
    assert!(partition.len() <= volume);
    assert_eq!(
        partition.len(),
        mapper.exterior_count() + mapper.solid_count() + mapper.interior_room_count()
    );
    for (node, class) in partition {
        if class == NodeClass::InteriorRoom {
            assert!(!structure.is_occupied(&node));
        }
    }
}

#[test]
fn test_enclosing_a_pocket_makes_it_an_interior_room() {
    let definitions = catalog(ThermalCellDefinition::default());
    let mut grid = ThermalGrid::new(GridId(1), 2.5, &ThermalSettings::default());

    let hole = Vec3i::new(1, 1, 0);
    let center = Vec3i::new(1, 1, 1);
    let far_wall = Vec3i::new(1, 1, 2);

    let mut next_id = 0;
    let mut far_block = None;
    for node in shell(Vec3i::zeros(), Vec3i::repeat(2)) {
        if node == hole {
            continue;
        }
        next_id += 1;
        if node == far_wall {
            far_block = Some(BlockId(next_id));
        }
        grid.add_block(&definitions, armor(next_id, node.x, node.y, node.z)).unwrap();
    }
    let far_block = far_block.unwrap();

    assert!(run_until(&mut grid, &definitions, 5_000, ThermalGrid::surfaces_current));
    assert_eq!(grid.mapper().classification(&center), Some(NodeClass::Exterior));
    let faces = grid.cell_for_block(far_block).unwrap().exposed_faces().to_vec();
    assert!(faces.contains(&Direction::NegZ), "far wall should see the open pocket");
    assert!(faces.contains(&Direction::PosZ));

    grid.add_block(&definitions, armor(100, hole.x, hole.y, hole.z)).unwrap();
    assert!(!grid.surfaces_current());

    assert!(run_until(&mut grid, &definitions, 5_000, ThermalGrid::surfaces_current));
    assert_eq!(grid.mapper().classification(&center), Some(NodeClass::InteriorRoom));
    assert_eq!(grid.mapper().room_count(), 1);
    let faces = grid.cell_for_block(far_block).unwrap().exposed_faces().to_vec();
    assert_eq!(faces, vec![Direction::PosZ]);
}

#[test]
fn test_open_blocks_do_not_seal() {
    let definitions = catalog(ThermalCellDefinition::default());
    let mut grid = ThermalGrid::new(GridId(1), 2.5, &ThermalSettings::default());

    let center = Vec3i::new(1, 1, 1);
    for (i, node) in shell(Vec3i::zeros(), Vec3i::repeat(2)).into_iter().enumerate() {
        let block = BlockDescriptor::new(BlockId(i as u64 + 1), node, common::armor_id())
            .with_airtightness(AirtightnessProfile::open());
        grid.add_block(&definitions, block).unwrap();
    }

    assert!(run_until(&mut grid, &definitions, 5_000, ThermalGrid::surfaces_current));
    assert_eq!(grid.mapper().classification(&center), Some(NodeClass::Exterior));
}
