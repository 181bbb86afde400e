use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::{Grid, MAX_SIZE, Occupant, Position, Tile, TileKind};

const FEATURES: usize = 4;

/// Zobrist keys for level fingerprints: one random word per cell for each of
/// wall, goal, box and player. Floor contributes nothing.
pub struct Zobrist {
    keys: Vec<[u64; FEATURES]>,
    size_keys: [u64; MAX_SIZE + 1],
}

impl Zobrist {
    pub fn new() -> Self {
        // Fixed seed so fingerprints are stable across runs
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_b0c5_9a7e_d00d);

        let keys = (0..MAX_SIZE * MAX_SIZE)
            .map(|_| std::array::from_fn(|_| rng.next_u64()))
            .collect();
        let size_keys = std::array::from_fn(|_| rng.next_u64());

        Zobrist { keys, size_keys }
    }

    fn tile_hash(&self, pos: Position, tile: &Tile) -> u64 {
        let keys = &self.keys[pos.row as usize * MAX_SIZE + pos.col as usize];
        let mut hash = match tile.kind {
            TileKind::Floor => 0,
            TileKind::Wall => keys[0],
            TileKind::Goal => keys[1],
        };
        match tile.occupant {
            Some(Occupant::Box) => hash ^= keys[2],
            Some(Occupant::Player) => hash ^= keys[3],
            None => {}
        }
        hash
    }

    /// Hash of the whole layout: dimensions, tile kinds and occupants.
    pub fn fingerprint(&self, grid: &Grid) -> u64 {
        let mut hash = self.size_keys[grid.height()] ^ self.size_keys[grid.width()].rotate_left(1);
        for pos in grid.positions() {
            if let Some(tile) = grid.tile(pos) {
                hash ^= self.tile_hash(pos, tile);
            }
        }
        hash
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction;
    use crate::movement;

    #[test]
    fn test_fingerprint_stable() {
        let grid = Grid::from_text("#####\n#@$.#\n#####").unwrap();
        assert_eq!(
            Zobrist::new().fingerprint(&grid),
            Zobrist::new().fingerprint(&grid.clone())
        );
    }

    #[test]
    fn test_fingerprint_tracks_moves() {
        let zobrist = Zobrist::new();
        let mut grid = Grid::from_text("######\n#@$ .#\n######").unwrap();
        let before = zobrist.fingerprint(&grid);

        movement::push(&mut grid, Position::new(1, 1), Direction::Right).unwrap();
        assert_ne!(zobrist.fingerprint(&grid), before);

        // Shove the box back, driving the player ahead of it
        movement::push(&mut grid, Position::new(1, 3), Direction::Left).unwrap();
        assert_eq!(zobrist.fingerprint(&grid), before);
    }

    #[test]
    fn test_fingerprint_distinguishes_size() {
        let zobrist = Zobrist::new();
        let wide = Grid::from_text("#####\n#@  #\n#####").unwrap();
        let tall = Grid::from_text("###\n#@#\n# #\n# #\n###").unwrap();
        assert_ne!(zobrist.fingerprint(&wide), zobrist.fingerprint(&tall));
    }
}
