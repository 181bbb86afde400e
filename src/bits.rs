use crate::grid::{MAX_SIZE, Position};

/// A `MAX_SIZE` x `MAX_SIZE` bit matrix, one `u64` per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitboard {
    rows: [u64; MAX_SIZE],
}

impl Bitboard {
    pub fn new() -> Self {
        Self {
            rows: [0; MAX_SIZE],
        }
    }

    pub fn get(&self, pos: Position) -> bool {
        assert!(
            (pos.row as usize) < MAX_SIZE && (pos.col as usize) < MAX_SIZE,
            "position out of bounds"
        );
        (self.rows[pos.row as usize] & (1u64 << pos.col)) != 0
    }

    pub fn set(&mut self, pos: Position) {
        assert!(
            (pos.row as usize) < MAX_SIZE && (pos.col as usize) < MAX_SIZE,
            "position out of bounds"
        );
        self.rows[pos.row as usize] |= 1u64 << pos.col;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> BitboardIter<'_> {
        BitboardIter {
            rows: &self.rows,
            row: 0,
            bits: self.rows[0],
        }
    }
}

impl Default for Bitboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Set positions in row-major order.
pub struct BitboardIter<'a> {
    rows: &'a [u64; MAX_SIZE],
    row: usize,
    bits: u64,
}

impl Iterator for BitboardIter<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bits != 0 {
                let col = self.bits.trailing_zeros() as u8;
                self.bits &= self.bits - 1; // Clear the lowest set bit
                return Some(Position::new(self.row as u8, col));
            }

            self.row += 1;
            if self.row >= MAX_SIZE {
                return None;
            }
            self.bits = self.rows[self.row];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_bitboard_get_set() {
        let mut bb = Bitboard::new();
        assert!(!bb.get(pos(0, 0)));
        assert!(!bb.get(pos(5, 63)));

        bb.set(pos(5, 63));
        assert!(bb.get(pos(5, 63)));
        assert!(!bb.get(pos(63, 5)));

        bb.set(pos(0, 0));
        bb.set(pos(63, 63));
        assert!(bb.get(pos(0, 0)));
        assert!(bb.get(pos(63, 63)));
    }

    #[test]
    fn test_bitboard_len() {
        let mut bb = Bitboard::new();
        assert!(bb.is_empty());
        assert_eq!(bb.len(), 0);

        bb.set(pos(1, 1));
        bb.set(pos(1, 2));
        bb.set(pos(40, 2));
        assert_eq!(bb.len(), 3);

        // Setting the same bit again should not change length
        bb.set(pos(1, 2));
        assert_eq!(bb.len(), 3);
        assert!(!bb.is_empty());
    }

    #[test]
    fn test_bitboard_iter() {
        let mut bb = Bitboard::new();
        bb.set(pos(3, 7));
        bb.set(pos(0, 5));
        bb.set(pos(63, 0));
        bb.set(pos(3, 1));

        let positions: Vec<Position> = bb.iter().collect();
        assert_eq!(positions, vec![pos(0, 5), pos(3, 1), pos(3, 7), pos(63, 0)]);
    }

    #[test]
    fn test_bitboard_iter_empty() {
        let bb = Bitboard::new();
        assert_eq!(bb.iter().count(), 0);
    }

    #[test]
    #[should_panic(expected = "position out of bounds")]
    fn test_bitboard_out_of_bounds() {
        let bb = Bitboard::new();
        bb.get(pos(64, 0));
    }
}
