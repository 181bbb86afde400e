use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::grid::{Direction, Grid, Occupant, Position, TileKind};
use crate::movement::{self, MoveError};
use crate::validator;

/// Goal placement attempts allowed per requested box.
pub const GOAL_ATTEMPTS_PER_BOX: usize = 6;
/// Drag attempts allowed per step of difficulty.
pub const DRAG_ATTEMPTS_PER_STEP: usize = 10;
/// Random draws allowed per interior cell when sampling for a free cell.
pub const SAMPLES_PER_CELL: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("grid size {height}x{width} outside 3..=64")]
    InvalidSize { height: usize, width: usize },
    #[error("{boxes} boxes and a player do not fit in {cells} interior cells")]
    TooManyBoxes { boxes: usize, cells: usize },
    #[error("walls need at least two interior cells")]
    NoRoomForWalls,
}

/// Why a generation attempt was thrown away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("coordinate ({row}, {col}) escaped the grid")]
    OutOfBounds { row: i64, col: i64 },
    #[error("no free cell for the {what} after {samples} samples")]
    PlacementFailure { what: &'static str, samples: usize },
    #[error("goal {goal} gave up after {attempts} placement attempts")]
    DragExhausted { goal: usize, attempts: usize },
    #[error("{boxes} boxes but {goals} goals")]
    ConsistencyViolation { boxes: usize, goals: usize },
    #[error("waypoint {to} unreachable from {from}")]
    UnreachableWaypoint { from: Position, to: Position },
}

/// Parameters of one level. A rejected attempt restarts with the same
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDescriptor {
    height: usize,
    width: usize,
    boxes: usize,
    walls: usize,
    difficulty: usize,
    id: usize,
}

impl LevelDescriptor {
    pub fn new(
        height: usize,
        width: usize,
        boxes: usize,
        walls: usize,
        difficulty: usize,
        id: usize,
    ) -> Result<Self, DescriptorError> {
        if !Grid::valid_size(height, width) {
            return Err(DescriptorError::InvalidSize { height, width });
        }
        let cells = (height - 2) * (width - 2);
        if boxes + 1 > cells {
            return Err(DescriptorError::TooManyBoxes { boxes, cells });
        }
        if walls > 0 && cells < 2 {
            return Err(DescriptorError::NoRoomForWalls);
        }

        Ok(LevelDescriptor {
            height,
            width,
            boxes,
            walls,
            difficulty,
            id,
        })
    }

    /// The `index`-th level of a campaign: grids, box counts, walls and walk
    /// lengths all grow with the index.
    pub fn progression(index: usize) -> Result<Self, DescriptorError> {
        let i = index as f64;
        // Halves round to even: level 2 has 4.5 walls and gets 4
        let size = (10.0 + i * 1.15).round_ties_even() as usize;
        let walls = (3.0 + i * 0.75).round_ties_even() as usize;
        Self::new(size, size, 5 + index * 3, walls, 14 + index * 5, index)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn boxes(&self) -> usize {
        self.boxes
    }

    pub fn walls(&self) -> usize {
        self.walls
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

/// How one box was laid out: planted on `goal`, dragged back to `box_start`,
/// with the player needing to stand on `push_from` to begin pushing it home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalWalk {
    pub goal: Position,
    pub box_start: Position,
    pub push_from: Position,
}

/// An accepted level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub descriptor: LevelDescriptor,
    pub grid: Grid,
    pub player_start: Position,
    pub walks: Vec<GoalWalk>,
    /// Attempts it took, including the accepted one.
    pub attempts: usize,
}

impl Level {
    /// The chain the validator checks: player start, then the push-from cell
    /// and goal of each box in placement order.
    pub fn waypoints(&self) -> Vec<Position> {
        waypoint_chain(self.player_start, &self.walks)
    }
}

fn waypoint_chain(player: Position, walks: &[GoalWalk]) -> Vec<Position> {
    let mut waypoints = Vec::with_capacity(1 + walks.len() * 2);
    waypoints.push(player);
    for walk in walks {
        waypoints.push(walk.push_from);
        waypoints.push(walk.goal);
    }
    waypoints
}

/// Cells visited by a straight line from `start` to `end`: `|drow| + |dcol|`
/// equal sub-steps, each rounded to the nearest cell with halves going to the
/// even coordinate. Diagonal lines can revisit a cell, including `start`.
pub fn line_between(
    start: Position,
    end: Position,
    height: usize,
    width: usize,
) -> Result<Vec<Position>, Rejection> {
    let drow = end.row as f64 - start.row as f64;
    let dcol = end.col as f64 - start.col as f64;
    let steps = start.manhattan(end);
    if steps == 0 {
        return Ok(Vec::new());
    }

    let (step_row, step_col) = (drow / steps as f64, dcol / steps as f64);
    let (mut row, mut col) = (start.row as f64, start.col as f64);
    let mut cells = Vec::with_capacity(steps);

    for _ in 0..steps {
        row += step_row;
        col += step_col;
        let (r, c) = (row.round_ties_even() as i64, col.round_ties_even() as i64);
        if r < 0 || c < 0 || r >= height as i64 || c >= width as i64 {
            return Err(Rejection::OutOfBounds { row: r, col: c });
        }
        cells.push(Position::new(r as u8, c as u8));
    }
    Ok(cells)
}

/// Builds levels by reverse play: every box is planted on its goal and
/// dragged away, so pushing it back is always possible in isolation.
pub struct Generator<R: Rng> {
    rng: R,
}

impl Generator<ChaCha8Rng> {
    /// Same seed, same levels.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seeded from the operating system; returns the seed so the run can be
    /// reproduced.
    pub fn from_entropy() -> (Self, u64) {
        let seed = rand::thread_rng().next_u64();
        (Self::seeded(seed), seed)
    }
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R) -> Self {
        Generator { rng }
    }

    /// Generate until an attempt is accepted. There is no ceiling on attempts.
    pub fn generate(&mut self, desc: &LevelDescriptor) -> Level {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(desc) {
                Ok(mut level) => {
                    level.attempts = attempts;
                    info!(id = desc.id, attempts, "level accepted");
                    return level;
                }
                Err(rejection) => {
                    debug!(id = desc.id, attempt = attempts, %rejection, "rejecting level");
                }
            }
        }
    }

    /// Generate, giving up after `max_attempts` rejections with the last one.
    pub fn generate_bounded(
        &mut self,
        desc: &LevelDescriptor,
        max_attempts: usize,
    ) -> Result<Level, Rejection> {
        let mut last = None;
        for attempt in 1..=max_attempts {
            match self.attempt(desc) {
                Ok(mut level) => {
                    level.attempts = attempt;
                    info!(id = desc.id, attempts = attempt, "level accepted");
                    return Ok(level);
                }
                Err(rejection) => {
                    debug!(id = desc.id, attempt, %rejection, "rejecting level");
                    last = Some(rejection);
                }
            }
        }
        Err(last.unwrap_or(Rejection::PlacementFailure {
            what: "level",
            samples: 0,
        }))
    }

    /// One generation attempt on a fresh grid.
    pub fn attempt(&mut self, desc: &LevelDescriptor) -> Result<Level, Rejection> {
        let mut grid = Grid::framed(desc.height, desc.width);

        self.carve_walls(&mut grid, desc)?;
        let player_start = self.place_player(&mut grid)?;

        let mut walks = Vec::with_capacity(desc.boxes);
        for goal in 0..desc.boxes {
            walks.push(self.place_goal(&mut grid, desc, goal)?);
        }

        let (boxes, goals) = (grid.box_count(), grid.goal_count());
        if boxes != goals {
            return Err(Rejection::ConsistencyViolation { boxes, goals });
        }

        validator::validate(&grid, &waypoint_chain(player_start, &walks))?;

        Ok(Level {
            descriptor: *desc,
            grid,
            player_start,
            walks,
            attempts: 1,
        })
    }

    fn random_interior(&mut self, grid: &Grid) -> Position {
        let row = self.rng.gen_range(1..grid.height() - 1);
        let col = self.rng.gen_range(1..grid.width() - 1);
        Position::new(row as u8, col as u8)
    }

    fn random_direction(&mut self) -> Direction {
        let vertical = self.rng.gen_bool(0.5);
        let positive = self.rng.gen_bool(0.5);
        match (vertical, positive) {
            (true, true) => Direction::Down,
            (true, false) => Direction::Up,
            (false, true) => Direction::Right,
            (false, false) => Direction::Left,
        }
    }

    /// Draw interior cells until one satisfies `accept`.
    fn sample(
        &mut self,
        grid: &Grid,
        what: &'static str,
        accept: impl Fn(&Grid, Position) -> bool,
    ) -> Result<Position, Rejection> {
        let samples = SAMPLES_PER_CELL * (grid.height() - 2) * (grid.width() - 2);
        for _ in 0..samples {
            let pos = self.random_interior(grid);
            if accept(grid, pos) {
                return Ok(pos);
            }
        }
        Err(Rejection::PlacementFailure { what, samples })
    }

    fn carve_walls(&mut self, grid: &mut Grid, desc: &LevelDescriptor) -> Result<(), Rejection> {
        for _ in 0..desc.walls {
            let start = self.random_interior(grid);
            let end = self.sample(grid, "wall end", |_, pos| pos != start)?;

            for pos in line_between(start, end, grid.height(), grid.width())? {
                if !grid.place(pos, TileKind::Wall) {
                    return Err(Rejection::OutOfBounds {
                        row: pos.row as i64,
                        col: pos.col as i64,
                    });
                }
            }
        }
        Ok(())
    }

    fn place_player(&mut self, grid: &mut Grid) -> Result<Position, Rejection> {
        let pos = self.sample(grid, "player", |grid, pos| grid.is_empty(pos))?;
        grid.set_occupant(pos, Occupant::Player);
        Ok(pos)
    }

    fn place_goal(
        &mut self,
        grid: &mut Grid,
        desc: &LevelDescriptor,
        goal: usize,
    ) -> Result<GoalWalk, Rejection> {
        let cap = desc.boxes * GOAL_ATTEMPTS_PER_BOX;
        let mut attempts = 0;

        loop {
            if attempts > cap {
                return Err(Rejection::DragExhausted { goal, attempts });
            }

            let pos = self.sample(grid, "goal", |grid, pos| {
                grid.tile(pos)
                    .is_some_and(|tile| tile.kind == TileKind::Floor && tile.is_empty())
            })?;
            grid.place(pos, TileKind::Goal);

            if let Some(walk) = self.reverse_walk(grid, pos, desc.difficulty)? {
                return Ok(walk);
            }

            attempts += 1;
            grid.place(pos, TileKind::Floor);
            trace!(goal, attempts, %pos, "walk failed, moving goal");
        }
    }

    /// Plant a box on `goal` and drag it `difficulty` successful steps,
    /// backing up one step whenever a drag fails. Leaves the grid as it found
    /// it and returns None if the drag budget runs out. A drag that leaves the
    /// grid rejects the whole attempt.
    fn reverse_walk(
        &mut self,
        grid: &mut Grid,
        goal: Position,
        difficulty: usize,
    ) -> Result<Option<GoalWalk>, Rejection> {
        if !grid.set_occupant(goal, Occupant::Box) {
            return Ok(None);
        }

        let budget = difficulty * DRAG_ATTEMPTS_PER_STEP;
        let mut path = vec![goal];
        let mut pushers: Vec<Position> = Vec::with_capacity(difficulty);
        let mut tries = 0;

        while pushers.len() < difficulty {
            let tip = path[path.len() - 1];
            tries += 1;
            if tries > budget {
                grid.clear_occupant(tip);
                return Ok(None);
            }

            let dir = self.random_direction();
            match movement::drag(grid, tip, dir) {
                Ok(step) => {
                    path.push(step.tip);
                    pushers.push(step.player);
                }
                Err(MoveError::OutOfBounds(at)) => {
                    grid.clear_occupant(tip);
                    let (drow, dcol) = dir.delta();
                    return Err(Rejection::OutOfBounds {
                        row: at.row as i64 + drow as i64,
                        col: at.col as i64 + dcol as i64,
                    });
                }
                Err(err) => {
                    if path.len() > 1 {
                        let previous = path[path.len() - 2];
                        trace!(%err, %tip, %previous, "backtracking");
                        if movement::retract(grid, tip, previous).is_err() {
                            grid.clear_occupant(tip);
                            return Ok(None);
                        }
                        path.pop();
                        pushers.pop();
                    }
                }
            }
        }

        Ok(Some(GoalWalk {
            goal,
            box_start: path[path.len() - 1],
            push_from: pushers.last().copied().unwrap_or(goal),
        }))
    }
}
