//! Arena: settled cells, collision, merge and row sweep.

use crate::piece::{Piece, PieceColor};
use std::collections::VecDeque;
use tracing::debug;

/// Single cell: either empty or a settled block of some colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(PieceColor),
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Points for clearing rows in one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRules {
    /// Value of the first row cleared in a sweep.
    pub single_row: u32,
    /// Factor applied to the row value after each row cleared in the same sweep.
    pub multiplier: u32,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            single_row: 10,
            multiplier: 2,
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sweep {
    pub score: u32,
    pub rows_cleared: u32,
}

/// Grid of settled cells. y=0 is top; `rows[y][x]`.
#[derive(Debug, Clone)]
pub struct Arena {
    width: usize,
    height: usize,
    rows: VecDeque<Vec<Cell>>,
}

impl Arena {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![Cell::Empty; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Writes a cell; out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|c| c.is_empty())
    }

    /// Cell at signed coordinates, `None` when outside the grid on either axis.
    fn cell_at(&self, x: i32, y: i32) -> Option<Cell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.get(x, y)
    }

    /// True if any occupied piece cell is off the grid or on a settled block.
    pub fn collide(&self, piece: &Piece) -> bool {
        piece
            .cells()
            .any(|(x, y)| !matches!(self.cell_at(x, y), Some(Cell::Empty)))
    }

    /// Copy the piece's occupied cells into the grid as settled blocks.
    ///
    /// The caller guarantees the placement does not collide.
    pub fn merge(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
                self.set(x, y, Cell::Block(piece.color));
            }
        }
    }

    fn row_is_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|c| !c.is_empty()))
    }

    /// Clear full rows, bottom to top, and score them.
    ///
    /// Rows `height-1` down to `1` are eligible; row 0 is never cleared. After
    /// a clear the same index is checked again since the rows above moved down.
    pub fn sweep(&mut self, rules: ScoreRules) -> Sweep {
        let mut result = Sweep::default();
        // a zero-width row counts as full and would be cleared forever
        if self.width == 0 {
            return result;
        }
        let mut row_value = 1u32;
        let mut y = self.height.saturating_sub(1);
        while y > 0 {
            if !self.row_is_full(y) {
                y -= 1;
                continue;
            }
            if let Some(mut row) = self.rows.remove(y) {
                row.fill(Cell::Empty);
                self.rows.push_front(row);
            }
            result.score = result
                .score
                .saturating_add(row_value.saturating_mul(rules.single_row));
            row_value = row_value.saturating_mul(rules.multiplier);
            result.rows_cleared += 1;
        }
        if result.rows_cleared > 0 {
            debug!(rows = result.rows_cleared, score = result.score, "sweep");
        }
        result
    }
}
