//! Box-pushing puzzle generation and play.
//!
//! Levels are built by reverse play: each box is planted on its goal and
//! dragged away, and the result is checked for reachability before it is
//! accepted. [`GameSession`] plays a level forward.

pub mod bits;
pub mod generator;
pub mod grid;
pub mod levels;
pub mod movement;
pub mod session;
pub mod validator;
pub mod zobrist;

pub use generator::{DescriptorError, Generator, GoalWalk, Level, LevelDescriptor, Rejection};
pub use grid::{Direction, Grid, GridError, Occupant, Position, Tile, TileKind};
pub use levels::{LevelError, LevelSet};
pub use session::{GameSession, MoveOutcome};
