use boxgen::movement;
use boxgen::validator::{self, PassabilityMatrix, find_path};
use boxgen::{
    Direction, GameSession, Generator, Grid, Level, LevelDescriptor, LevelSet, Occupant, TileKind,
};
use proptest::prelude::*;

const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

fn small_level(seed: u64) -> Option<Level> {
    let desc = LevelDescriptor::new(8, 8, 2, 1, 4, 0).unwrap();
    Generator::seeded(seed).generate_bounded(&desc, 200).ok()
}

fn box_positions(grid: &Grid) -> Vec<boxgen::Position> {
    grid.positions()
        .filter(|&pos| grid.occupant_at(pos) == Some(Occupant::Box))
        .collect()
}

#[test]
fn generated_level_satisfies_invariants() {
    let desc = LevelDescriptor::new(10, 10, 3, 5, 14, 0).unwrap();
    let level = Generator::seeded(2024).generate(&desc);
    let grid = &level.grid;

    assert_eq!((grid.height(), grid.width()), (10, 10));
    assert!(grid.border_is_walled());
    assert_eq!(grid.player_count(), 1);
    assert_eq!(grid.box_count(), 3);
    assert_eq!(grid.goal_count(), 3);
    assert!(level.attempts >= 1);

    let waypoints = level.waypoints();
    assert_eq!(waypoints.len(), 7);
    assert_eq!(waypoints[0], level.player_start);
    assert_eq!(validator::validate(grid, &waypoints), Ok(()));

    // Every consecutive waypoint pair is joined by a 4-connected open path
    let matrix = PassabilityMatrix::from_grid(grid);
    for pair in waypoints.windows(2) {
        let path = find_path(&matrix, pair[0], pair[1]).unwrap();
        for step in path.windows(2) {
            assert_eq!(step[0].manhattan(step[1]), 1);
            assert_ne!(grid.tile(step[1]).unwrap().kind, TileKind::Wall);
        }
    }
}

#[test]
fn same_seed_same_campaign() {
    let campaign = |seed| {
        let mut generator = Generator::seeded(seed);
        (0..3)
            .map(|i| {
                let desc = LevelDescriptor::progression(i).unwrap();
                generator.generate(&desc).grid.to_string()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(campaign(99), campaign(99));
}

#[test]
fn level_set_survives_a_file_round_trip() {
    let mut generator = Generator::seeded(17);
    let mut set = LevelSet::new();
    for i in 0..3 {
        let desc = LevelDescriptor::new(9, 9, 2, 2, 6, i).unwrap();
        set.push_level(&generator.generate(&desc));
    }

    let path = std::env::temp_dir().join(format!("boxgen-{}.xsb", std::process::id()));
    set.write_file(&path).unwrap();
    let loaded = LevelSet::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.len(), set.len());
    for (original, copy) in set.iter().zip(loaded.iter()) {
        assert_eq!(original, copy);
    }
}

#[test]
fn undragged_level_starts_solved() {
    let desc = LevelDescriptor::new(7, 7, 3, 0, 0, 0).unwrap();
    let level = Generator::seeded(8).generate(&desc);
    let session = GameSession::new(level.grid).unwrap();
    assert!(session.is_complete());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn pushes_are_atomic(
        seed in any::<u64>(),
        moves in prop::collection::vec(0usize..4, 1..60),
    ) {
        let Some(level) = small_level(seed) else {
            return Ok(());
        };
        let mut grid = level.grid.clone();
        let mut player = level.player_start;

        for m in moves {
            let before = grid.clone();
            match movement::push(&mut grid, player, DIRECTIONS[m]) {
                Ok(next) => {
                    player = next;
                    prop_assert_eq!(grid.occupant_at(player), Some(Occupant::Player));
                }
                Err(_) => prop_assert_eq!(&grid, &before),
            }
            prop_assert_eq!(grid.player_count(), 1);
            prop_assert_eq!(grid.box_count(), 2);
            prop_assert_eq!(grid.goal_count(), 2);
            prop_assert!(grid.border_is_walled());
        }
    }

    #[test]
    fn drags_are_atomic_and_reversible(
        seed in any::<u64>(),
        which in 0usize..2,
        dir in 0usize..4,
    ) {
        let Some(level) = small_level(seed) else {
            return Ok(());
        };
        let mut grid = level.grid.clone();
        let tip = box_positions(&grid)[which];
        let before = grid.clone();

        match movement::drag(&mut grid, tip, DIRECTIONS[dir]) {
            Ok(step) => {
                prop_assert_eq!(grid.occupant_at(step.tip), Some(Occupant::Box));
                prop_assert!(grid.is_empty(step.player));
                prop_assert!(movement::retract(&mut grid, step.tip, tip).is_ok());
                prop_assert_eq!(&grid, &before);
            }
            Err(_) => prop_assert_eq!(&grid, &before),
        }
    }
}
