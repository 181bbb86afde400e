use tracing::{debug, info};

use crate::grid::{Direction, Grid, GridError, Position, Tile};
use crate::movement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub completed: bool,
}

/// One level being played: the live grid, a pristine copy to restart from,
/// and a move counter.
#[derive(Debug, Clone)]
pub struct GameSession {
    grid: Grid,
    initial: Grid,
    start: Position,
    player: Position,
    moves: usize,
}

impl GameSession {
    pub fn new(grid: Grid) -> Result<Self, GridError> {
        let player = grid.player_pos().ok_or(GridError::NoPlayer)?;
        Ok(GameSession {
            initial: grid.clone(),
            grid,
            start: player,
            player,
            moves: 0,
        })
    }

    /// Step the player one cell, pushing whatever is in the way. Invalid
    /// moves leave the grid untouched and report `moved: false`.
    pub fn apply_move(&mut self, dir: Direction) -> MoveOutcome {
        let moved = match movement::push(&mut self.grid, self.player, dir) {
            Ok(pos) => {
                self.player = pos;
                self.moves += 1;
                true
            }
            Err(err) => {
                debug!(%dir, %err, "move rejected");
                false
            }
        };

        let completed = self.is_complete();
        if moved && completed {
            info!(moves = self.moves, "level complete");
        }
        MoveOutcome { moved, completed }
    }

    pub fn is_complete(&self) -> bool {
        self.grid.is_complete()
    }

    /// Back to the starting layout with the move counter cleared.
    pub fn restart(&mut self) {
        self.grid = self.initial.clone();
        self.player = self.start;
        self.moves = 0;
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn player_pos(&self) -> Position {
        self.player
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn render(&self) -> Vec<Vec<Tile>> {
        self.grid.render()
    }
}
