use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::generator::Level;
use crate::grid::{Grid, GridError};
use crate::session::GameSession;
use crate::zobrist::Zobrist;

/// Error type for level set operations.
#[derive(Debug, Error)]
pub enum LevelError {
    /// IO error when reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Invalid level content
    #[error("invalid level {index}: {source}")]
    InvalidLevel {
        index: usize,
        #[source]
        source: GridError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLevel {
    pub id: usize,
    pub grid: Grid,
}

/// An ordered queue of levels with duplicates refused.
pub struct LevelSet {
    levels: Vec<StoredLevel>,
    fingerprints: HashSet<u64>,
    zobrist: Zobrist,
}

impl LevelSet {
    pub fn new() -> Self {
        LevelSet {
            levels: Vec::new(),
            fingerprints: HashSet::new(),
            zobrist: Zobrist::new(),
        }
    }

    /// Append a level. Returns false if an identical layout is already queued.
    pub fn push(&mut self, id: usize, grid: Grid) -> bool {
        if !self.fingerprints.insert(self.zobrist.fingerprint(&grid)) {
            return false;
        }
        self.levels.push(StoredLevel { id, grid });
        true
    }

    pub fn push_level(&mut self, level: &Level) -> bool {
        self.push(level.descriptor.id(), level.grid.clone())
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&StoredLevel> {
        self.levels.get(index)
    }

    /// A fresh play session on the nth level.
    pub fn session(&self, index: usize) -> Option<GameSession> {
        let stored = self.levels.get(index)?;
        GameSession::new(stored.grid.clone()).ok()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredLevel> {
        self.levels.iter()
    }

    /// Write every level as a `; <id>` header line followed by the grid, with
    /// a blank line between levels.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(&format!("; {}\n\n{}", level.id, level.grid));
        }
        text
    }

    /// Parse levels written by [`LevelSet::to_text`] or any XSB-style file:
    /// lines starting with `;` are headers or comments, and levels are
    /// separated by headers or blank lines. A numeric header sets the id of
    /// the level that follows; otherwise the id is the level's position in
    /// the file, counting from zero. A layout already seen earlier in the file
    /// is skipped, and its position still counts.
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut set = LevelSet::new();
        let mut current = String::new();
        let mut pending_id = None;
        let mut index = 0;

        let mut flush =
            |current: &mut String, pending_id: &mut Option<usize>| -> Result<(), LevelError> {
                if current.is_empty() {
                    return Ok(());
                }
                let grid = Grid::from_text(current.trim_end_matches('\n'))
                    .map_err(|source| LevelError::InvalidLevel { index, source })?;
                let id = pending_id.take().unwrap_or(index);
                if !set.push(id, grid) {
                    debug!(index, id, "duplicate level skipped");
                }
                current.clear();
                index += 1;
                Ok(())
            };

        for line in contents.lines() {
            // Header or comment line ends the level before it
            if let Some(comment) = line.trim_start().strip_prefix(';') {
                flush(&mut current, &mut pending_id)?;
                if let Ok(id) = comment.trim().parse() {
                    pending_id = Some(id);
                }
                continue;
            }

            if line.is_empty() {
                flush(&mut current, &mut pending_id)?;
                continue;
            }

            current.push_str(line);
            current.push('\n');
        }
        flush(&mut current, &mut pending_id)?;

        Ok(set)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL1: &str = "#####\n\
                          #@$.#\n\
                          #####";

    const LEVEL2: &str = "######\n\
                          #    #\n\
                          # #@ #\n\
                          # $* #\n\
                          # .  #\n\
                          ######";

    #[test]
    fn test_push_refuses_duplicates() {
        let mut set = LevelSet::new();
        assert!(set.push(0, Grid::from_text(LEVEL1).unwrap()));
        assert!(set.push(1, Grid::from_text(LEVEL2).unwrap()));
        assert!(!set.push(2, Grid::from_text(LEVEL1).unwrap()));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().id, 1);
    }

    #[test]
    fn test_text_round_trip() {
        let mut set = LevelSet::new();
        set.push(4, Grid::from_text(LEVEL1).unwrap());
        set.push(9, Grid::from_text(LEVEL2).unwrap());

        let text = set.to_text();
        assert!(text.starts_with("; 4\n\n#####\n"));

        let parsed = LevelSet::from_text(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        let originals: Vec<&StoredLevel> = set.iter().collect();
        let copies: Vec<&StoredLevel> = parsed.iter().collect();
        assert_eq!(originals, copies);
    }

    #[test]
    fn test_from_text_without_headers() {
        let text = format!("{}\n\n{}\n", LEVEL1, LEVEL2);
        let set = LevelSet::from_text(&text).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().id, 0);
        assert_eq!(set.get(1).unwrap().id, 1);
        assert_eq!(set.get(1).unwrap().grid.to_string().trim_end(), LEVEL2);
    }

    #[test]
    fn test_from_text_skips_repeated_layout() {
        let text = format!("{}\n\n{}\n\n{}\n", LEVEL1, LEVEL1, LEVEL2);
        let set = LevelSet::from_text(&text).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().id, 0);
        // The repeat still used up id 1
        assert_eq!(set.get(1).unwrap().id, 2);
        assert_eq!(set.get(1).unwrap().grid.to_string().trim_end(), LEVEL2);
    }

    #[test]
    fn test_from_text_invalid_level() {
        let text = "; 1\n\n####\n#@@#\n####\n";
        let result = LevelSet::from_text(text);
        assert!(matches!(
            result,
            Err(LevelError::InvalidLevel {
                index: 0,
                source: GridError::MultiplePlayers
            })
        ));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = LevelSet::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }

    #[test]
    fn test_session_from_set() {
        let mut set = LevelSet::new();
        set.push(0, Grid::from_text(LEVEL1).unwrap());
        let mut session = set.session(0).unwrap();
        assert!(session.apply_move(crate::grid::Direction::Right).completed);
        assert!(set.session(1).is_none());
    }
}
