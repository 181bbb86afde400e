use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use tracing::trace;

use crate::bits::Bitboard;
use crate::generator::Rejection;
use crate::grid::{ALL_DIRECTIONS, Grid, Position, TileKind};

/// Binary passability of a grid: walls are blocked, everything else is open.
/// Boxes and the player do not block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassabilityMatrix {
    open: Bitboard,
    height: usize,
    width: usize,
}

impl PassabilityMatrix {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut open = Bitboard::new();
        for pos in grid.positions() {
            if grid.tile(pos).is_some_and(|tile| tile.kind != TileKind::Wall) {
                open.set(pos);
            }
        }
        PassabilityMatrix {
            open,
            height: grid.height(),
            width: grid.width(),
        }
    }

    pub fn is_open(&self, pos: Position) -> bool {
        (pos.row as usize) < self.height && (pos.col as usize) < self.width && self.open.get(pos)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Open cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.open.iter()
    }

    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.width + pos.col as usize
    }
}

impl fmt::Display for PassabilityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            let line: String = (0..self.width)
                .map(|col| {
                    if self.is_open(Position::new(row as u8, col as u8)) {
                        '1'
                    } else {
                        '0'
                    }
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A* with a Manhattan heuristic over the 4-neighbourhood. Returns the path
/// including both endpoints, or None if `to` is unreachable from `from`.
///
/// Every call starts from a fresh search state.
pub fn find_path(
    matrix: &PassabilityMatrix,
    from: Position,
    to: Position,
) -> Option<Vec<Position>> {
    if !matrix.is_open(from) || !matrix.is_open(to) {
        return None;
    }

    let cells = matrix.height * matrix.width;
    let mut g_cost = vec![u16::MAX; cells];
    let mut parent: Vec<Option<Position>> = vec![None; cells];
    let mut closed = Bitboard::new();
    // Min-heap on f cost; ties pop the lowest position first
    let mut open = BinaryHeap::<Reverse<(usize, Position)>>::new();

    g_cost[matrix.index(from)] = 0;
    open.push(Reverse((from.manhattan(to), from)));

    let mut expanded = 0usize;
    while let Some(Reverse((_, pos))) = open.pop() {
        if closed.get(pos) {
            continue;
        }
        closed.set(pos);
        expanded += 1;

        if pos == to {
            let mut path = vec![to];
            let mut cursor = to;
            while let Some(prev) = parent[matrix.index(cursor)] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            trace!(%from, %to, expanded, length = path.len(), "path found");
            return Some(path);
        }

        let next_cost = g_cost[matrix.index(pos)] + 1;
        for dir in ALL_DIRECTIONS {
            let Some(next) = pos.step(dir, matrix.height, matrix.width) else {
                continue;
            };
            if !matrix.is_open(next) || closed.get(next) {
                continue;
            }
            let idx = matrix.index(next);
            if next_cost < g_cost[idx] {
                g_cost[idx] = next_cost;
                parent[idx] = Some(pos);
                let f_cost = next_cost as usize + next.manhattan(to);
                open.push(Reverse((f_cost, next)));
            }
        }
    }

    trace!(%from, %to, expanded, "no path");
    None
}

/// Check that every waypoint is reachable from its predecessor.
pub fn validate(grid: &Grid, waypoints: &[Position]) -> Result<(), Rejection> {
    let matrix = PassabilityMatrix::from_grid(grid);
    trace!("passability:\n{}", matrix);

    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if find_path(&matrix, from, to).is_none() {
            return Err(Rejection::UnreachableWaypoint { from, to });
        }
    }
    Ok(())
}
