use arrayvec::ArrayVec;
use thiserror::Error;

use crate::grid::{Direction, Grid, Occupant, Position};

/// Longest run of occupants a single push may shift ahead of the mover.
pub const MAX_CHAIN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move from {0} leaves the grid")]
    OutOfBounds(Position),
    #[error("destination {0} is blocked")]
    Blocked(Position),
    #[error("push would shift more than {limit} occupants")]
    ChainTooLong { limit: usize },
    #[error("nothing to move at {0}")]
    NoOccupant(Position),
}

/// Result of a successful drag: the box's new cell and the cell the dragging
/// player backs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragStep {
    pub tip: Position,
    pub player: Position,
}

/// Push the occupant at `from` one cell in `dir`, shifting up to `MAX_CHAIN`
/// occupants ahead of it. Returns the mover's new position.
pub fn push(grid: &mut Grid, from: Position, dir: Direction) -> Result<Position, MoveError> {
    push_chain(grid, from, dir, MAX_CHAIN)
}

/// Like [`push`] with an explicit chain limit (capped at `MAX_CHAIN`).
///
/// All checks run before anything moves, so a failed push leaves the grid
/// exactly as it was.
pub fn push_chain(
    grid: &mut Grid,
    from: Position,
    dir: Direction,
    max_chain: usize,
) -> Result<Position, MoveError> {
    let max_chain = max_chain.min(MAX_CHAIN);
    let mut last = grid.occupant_at(from).ok_or(MoveError::NoOccupant(from))?;

    // (source, destination) for the mover and every occupant ahead of it
    let mut chain: ArrayVec<(Position, Position), { MAX_CHAIN + 1 }> = ArrayVec::new();
    let mut cursor = from;

    loop {
        let next = grid
            .move_pos(cursor, dir)
            .ok_or(MoveError::OutOfBounds(cursor))?;
        chain.push((cursor, next));

        match grid.occupant_at(next) {
            Some(occupant) => {
                if chain.len() > max_chain {
                    return Err(MoveError::ChainTooLong { limit: max_chain });
                }
                last = occupant;
                cursor = next;
            }
            None => {
                let passable = grid.tile(next).is_some_and(|tile| match last {
                    Occupant::Player => tile.player_passable(),
                    Occupant::Box => tile.obj_passable(),
                });
                if !passable {
                    return Err(MoveError::Blocked(next));
                }
                break;
            }
        }
    }

    // Far end first so every destination is free when we reach it
    for &(src, dst) in chain.iter().rev() {
        if let Some(occupant) = grid.clear_occupant(src) {
            let placed = grid.set_occupant(dst, occupant);
            debug_assert!(placed, "chain destination {} was not free", dst);
        }
    }

    Ok(chain[0].1)
}

/// Drag the box at `tip` one cell in `dir`, toward the player doing the
/// dragging. The cell two steps away must be free as well: that is where the
/// player stands to push the box back.
pub fn drag(grid: &mut Grid, tip: Position, dir: Direction) -> Result<DragStep, MoveError> {
    if grid.occupant_at(tip).is_none() {
        return Err(MoveError::NoOccupant(tip));
    }

    let neighbor = grid.move_pos(tip, dir).ok_or(MoveError::OutOfBounds(tip))?;
    let neighbor_ok = grid.is_empty(neighbor)
        && grid.tile(neighbor).is_some_and(|tile| tile.obj_passable());
    if !neighbor_ok {
        return Err(MoveError::Blocked(neighbor));
    }

    let beyond = grid
        .move_pos(neighbor, dir)
        .ok_or(MoveError::OutOfBounds(neighbor))?;
    if !grid.is_empty(beyond) {
        return Err(MoveError::Blocked(beyond));
    }

    if let Some(occupant) = grid.clear_occupant(tip) {
        grid.set_occupant(neighbor, occupant);
    }

    Ok(DragStep {
        tip: neighbor,
        player: beyond,
    })
}

/// Undo a drag: move the occupant at `tip` straight back to `previous`.
pub fn retract(grid: &mut Grid, tip: Position, previous: Position) -> Result<(), MoveError> {
    if !grid.is_empty(previous) {
        return Err(MoveError::Blocked(previous));
    }
    let occupant = grid.clear_occupant(tip).ok_or(MoveError::NoOccupant(tip))?;
    grid.set_occupant(previous, occupant);
    Ok(())
}
