use std::fmt;

use thiserror::Error;

pub const MAX_SIZE: usize = 64;
pub const MIN_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("empty grid")]
    Empty,
    #[error("grid size {height}x{width} outside 3..=64")]
    InvalidSize { height: usize, width: usize },
    #[error("invalid character '{ch}' at row {row}, col {col}")]
    InvalidCharacter { ch: char, row: usize, col: usize },
    #[error("no player found on grid")]
    NoPlayer,
    #[error("multiple players found")]
    MultiplePlayers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Position { row, col }
    }

    /// Step one cell in `dir`, staying inside a `height` x `width` rectangle.
    pub fn step(self, dir: Direction, height: usize, width: usize) -> Option<Position> {
        let (drow, dcol) = dir.delta();
        let row = self.row as i32 + drow as i32;
        let col = self.col as i32 + dcol as i32;

        if row >= 0 && col >= 0 && row < height as i32 && col < width as i32 {
            Some(Position::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn manhattan(self, other: Position) -> usize {
        (self.row.abs_diff(other.row) + self.col.abs_diff(other.col)) as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    /// Unit step as (row delta, column delta).
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Parse a LURD move character (either case).
    pub fn from_lurd(ch: char) -> Option<Direction> {
        match ch.to_ascii_lowercase() {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Floor,
    Wall,
    Goal,
}

impl TileKind {
    /// Can an occupant be pushed onto a tile of this kind.
    pub fn obj_passable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }

    /// Can the player step onto a tile of this kind.
    pub fn player_passable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }

    pub fn can_hold_objects(self) -> bool {
        !matches!(self, TileKind::Wall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Player,
    Box,
}

/// One cell of the grid: its kind plus at most one occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub kind: TileKind,
    pub occupant: Option<Occupant>,
}

impl Tile {
    pub const fn new(kind: TileKind) -> Self {
        Tile {
            kind,
            occupant: None,
        }
    }

    pub fn obj_passable(&self) -> bool {
        self.kind.obj_passable()
    }

    pub fn player_passable(&self) -> bool {
        self.kind.player_passable()
    }

    pub fn can_hold_objects(&self) -> bool {
        self.kind.can_hold_objects()
    }

    /// No occupant, and the tile accepts one.
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none() && self.can_hold_objects()
    }

    /// A goal holding a box. Any box counts.
    pub fn is_full(&self) -> bool {
        self.kind == TileKind::Goal && self.occupant == Some(Occupant::Box)
    }

    fn is_open_goal(&self) -> bool {
        self.kind == TileKind::Goal && !self.is_full()
    }

    /// Text symbol:
    /// - `#` = Wall
    /// - ` ` = Floor
    /// - `.` = Goal
    /// - `$` = Box
    /// - `*` = Box on goal
    /// - `@` = Player
    /// - `+` = Player on goal
    pub fn symbol(&self) -> char {
        match (self.kind, self.occupant) {
            (TileKind::Goal, Some(Occupant::Box)) => '*',
            (TileKind::Goal, Some(Occupant::Player)) => '+',
            (_, Some(Occupant::Box)) => '$',
            (_, Some(Occupant::Player)) => '@',
            (TileKind::Wall, None) => '#',
            (TileKind::Floor, None) => ' ',
            (TileKind::Goal, None) => '.',
        }
    }

    pub fn from_symbol(ch: char) -> Option<Tile> {
        let (kind, occupant) = match ch {
            '#' => (TileKind::Wall, None),
            ' ' | '-' | '_' => (TileKind::Floor, None),
            '.' => (TileKind::Goal, None),
            '$' => (TileKind::Floor, Some(Occupant::Box)),
            '*' => (TileKind::Goal, Some(Occupant::Box)),
            '@' => (TileKind::Floor, Some(Occupant::Player)),
            '+' => (TileKind::Goal, Some(Occupant::Player)),
            _ => return None,
        };
        Some(Tile { kind, occupant })
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    tiles: Vec<Tile>,
    height: u8,
    width: u8,
    empty_goals: usize,
}

impl Grid {
    /// A `height` x `width` grid of floor surrounded by a ring of walls.
    ///
    /// Panics if either dimension lies outside `MIN_SIZE..=MAX_SIZE`.
    pub fn framed(height: usize, width: usize) -> Self {
        assert!(
            Self::valid_size(height, width),
            "grid size {}x{} outside {}..={}",
            height,
            width,
            MIN_SIZE,
            MAX_SIZE
        );

        let mut tiles = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                let border = row == 0 || col == 0 || row == height - 1 || col == width - 1;
                tiles.push(Tile::new(if border {
                    TileKind::Wall
                } else {
                    TileKind::Floor
                }));
            }
        }

        Grid {
            tiles,
            height: height as u8,
            width: width as u8,
            empty_goals: 0,
        }
    }

    pub fn valid_size(height: usize, width: usize) -> bool {
        (MIN_SIZE..=MAX_SIZE).contains(&height) && (MIN_SIZE..=MAX_SIZE).contains(&width)
    }

    /// Parse a grid from text, one character per tile (see [`Tile::symbol`]).
    /// Rows shorter than the widest row are padded with floor.
    pub fn from_text(text: &str) -> Result<Self, GridError> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.is_empty() {
            return Err(GridError::Empty);
        }

        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        if !Self::valid_size(height, width) {
            return Err(GridError::InvalidSize { height, width });
        }

        let mut tiles = vec![Tile::new(TileKind::Floor); height * width];
        let mut player_found = false;
        let mut empty_goals = 0;

        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let tile =
                    Tile::from_symbol(ch).ok_or(GridError::InvalidCharacter { ch, row, col })?;
                if tile.occupant == Some(Occupant::Player) {
                    if player_found {
                        return Err(GridError::MultiplePlayers);
                    }
                    player_found = true;
                }
                if tile.is_open_goal() {
                    empty_goals += 1;
                }
                tiles[row * width + col] = tile;
            }
        }

        if !player_found {
            return Err(GridError::NoPlayer);
        }

        Ok(Grid {
            tiles,
            height: height as u8,
            width: width as u8,
            empty_goals,
        })
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn contains(&self, pos: Position) -> bool {
        (pos.row as usize) < self.height() && (pos.col as usize) < self.width()
    }

    /// Inside the outer ring.
    pub fn is_interior(&self, pos: Position) -> bool {
        pos.row > 0
            && pos.col > 0
            && (pos.row as usize) < self.height() - 1
            && (pos.col as usize) < self.width() - 1
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.row as usize * self.width() + pos.col as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|idx| &self.tiles[idx])
    }

    /// Apply `f` to the tile at `pos`, keeping the empty-goal count exact.
    fn update<T>(&mut self, pos: Position, f: impl FnOnce(&mut Tile) -> T) -> Option<T> {
        let idx = self.index(pos)?;
        let tile = &mut self.tiles[idx];
        let was_open = tile.is_open_goal();
        let result = f(tile);
        let now_open = tile.is_open_goal();

        match (was_open, now_open) {
            (true, false) => self.empty_goals -= 1,
            (false, true) => self.empty_goals += 1,
            _ => {}
        }
        Some(result)
    }

    /// Move from `pos` one cell in `dir`. Returns None if that leaves the grid.
    pub fn move_pos(&self, pos: Position, dir: Direction) -> Option<Position> {
        pos.step(dir, self.height(), self.width())
    }

    /// Change the kind of the tile at `pos`. An occupant is dropped if the new
    /// kind cannot hold one. Returns false if `pos` is outside the grid.
    pub fn place(&mut self, pos: Position, kind: TileKind) -> bool {
        self.update(pos, |tile| {
            tile.kind = kind;
            if !kind.can_hold_objects() {
                tile.occupant = None;
            }
        })
        .is_some()
    }

    pub fn occupant_at(&self, pos: Position) -> Option<Occupant> {
        self.tile(pos).and_then(|tile| tile.occupant)
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(Tile::is_empty)
    }

    /// Put `occupant` on the tile at `pos`. Returns false, leaving the grid
    /// untouched, if the tile is missing, occupied or cannot hold objects.
    pub fn set_occupant(&mut self, pos: Position, occupant: Occupant) -> bool {
        if !self.is_empty(pos) {
            return false;
        }
        self.update(pos, |tile| tile.occupant = Some(occupant)).is_some()
    }

    pub fn clear_occupant(&mut self, pos: Position) -> Option<Occupant> {
        self.update(pos, |tile| tile.occupant.take()).flatten()
    }

    /// True iff every goal holds a box.
    pub fn is_complete(&self) -> bool {
        self.empty_goals == 0
    }

    pub fn empty_goals(&self) -> usize {
        self.empty_goals
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).map(move |col| Position::new(row, col)))
    }

    fn count_where(&self, pred: impl Fn(&Tile) -> bool) -> usize {
        self.tiles.iter().filter(|tile| pred(tile)).count()
    }

    pub fn box_count(&self) -> usize {
        self.count_where(|tile| tile.occupant == Some(Occupant::Box))
    }

    pub fn goal_count(&self) -> usize {
        self.count_where(|tile| tile.kind == TileKind::Goal)
    }

    pub fn player_count(&self) -> usize {
        self.count_where(|tile| tile.occupant == Some(Occupant::Player))
    }

    pub fn player_pos(&self) -> Option<Position> {
        self.positions()
            .find(|&pos| self.occupant_at(pos) == Some(Occupant::Player))
    }

    pub fn border_is_walled(&self) -> bool {
        self.positions()
            .filter(|&pos| !self.is_interior(pos))
            .all(|pos| self.tile(pos).is_some_and(|tile| tile.kind == TileKind::Wall))
    }

    /// Read-only snapshot of every tile, row by row, for renderers.
    pub fn render(&self) -> Vec<Vec<Tile>> {
        self.tiles
            .chunks(self.width())
            .map(|row| row.to_vec())
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.width()) {
            let line: String = row.iter().map(Tile::symbol).collect();
            // Trim trailing floor to match the usual level file layout
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
