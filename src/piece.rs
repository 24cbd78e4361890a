//! Active piece: tetromino kinds, occupancy matrix, position and rotation.

use crate::arena::Arena;
use crate::source::PieceSource;

/// Largest matrix side any tetromino uses (the I piece).
pub const MAX_SIDE: usize = 4;

/// Tetromino kinds (T, J, L, O, S, Z, I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoKind {
    T,
    J,
    L,
    O,
    S,
    Z,
    I,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::T, Self::J, Self::L, Self::O, Self::S, Self::Z, Self::I];

    /// Canonical occupancy template, rows top to bottom.
    pub fn template(self) -> Matrix {
        match self {
            Self::T => Matrix::from_rows(&[&[0, 0, 0], &[1, 1, 1], &[0, 1, 0]]),
            Self::O => Matrix::from_rows(&[&[1, 1], &[1, 1]]),
            Self::L => Matrix::from_rows(&[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]]),
            Self::J => Matrix::from_rows(&[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]]),
            Self::I => Matrix::from_rows(&[
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
                &[0, 1, 0, 0],
            ]),
            Self::S => Matrix::from_rows(&[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]]),
            Self::Z => Matrix::from_rows(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]]),
        }
    }

    pub fn color(self) -> PieceColor {
        match self {
            Self::T => PieceColor::Purple,
            Self::O => PieceColor::Yellow,
            Self::L => PieceColor::Orange,
            Self::J => PieceColor::Blue,
            Self::I => PieceColor::Cyan,
            Self::S => PieceColor::Green,
            Self::Z => PieceColor::Red,
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'T' => Some(Self::T),
            'J' => Some(Self::J),
            'L' => Some(Self::L),
            'O' => Some(Self::O),
            'S' => Some(Self::S),
            'Z' => Some(Self::Z),
            'I' => Some(Self::I),
            _ => None,
        }
    }
}

/// Colour a settled block carries. Resolved to a terminal colour by the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    Purple,
    Yellow,
    Orange,
    Blue,
    Cyan,
    Green,
    Red,
}

impl PieceColor {
    pub const ALL: [Self; 7] = [
        Self::Purple,
        Self::Yellow,
        Self::Orange,
        Self::Blue,
        Self::Cyan,
        Self::Green,
        Self::Red,
    ];

    /// Stable index 0..7, used for theme lookups.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Square occupancy matrix of side 1..=MAX_SIDE.
///
/// Only the top-left `side × side` region is meaningful; the rest stays empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    side: usize,
    cells: [[bool; MAX_SIDE]; MAX_SIDE],
}

impl Matrix {
    /// Build from 0/1 rows. Rows must form a square of side at most `MAX_SIDE`.
    fn from_rows(rows: &[&[u8]]) -> Self {
        let side = rows.len().min(MAX_SIDE);
        let mut cells = [[false; MAX_SIDE]; MAX_SIDE];
        for (y, row) in rows.iter().take(side).enumerate() {
            for (x, &v) in row.iter().take(side).enumerate() {
                cells[y][x] = v != 0;
            }
        }
        Self { side, cells }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.side && y < self.side && self.cells[y][x]
    }

    /// Occupied cells as (x, y) offsets from the top-left corner.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.side).flat_map(move |y| {
            (0..self.side).filter_map(move |x| self.is_filled(x, y).then_some((x, y)))
        })
    }

    /// 90° clockwise turn: `result[x][N-1-y] = self[y][x]`.
    ///
    /// The matrix is square by construction, so the result keeps the same side.
    pub fn transpose_clockwise(&self) -> Self {
        let n = self.side;
        let mut cells = [[false; MAX_SIDE]; MAX_SIDE];
        for y in 0..n {
            for x in 0..n {
                cells[x][n - 1 - y] = self.cells[y][x];
            }
        }
        Self { side: n, cells }
    }
}

/// Top-left corner of a piece's matrix in grid coordinates. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// The falling piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub matrix: Matrix,
    pub pos: Position,
    pub color: PieceColor,
}

impl Piece {
    /// Piece of `kind` centred horizontally on a grid `grid_width` wide, row 0.
    pub fn new(kind: TetrominoKind, grid_width: usize) -> Self {
        let matrix = kind.template();
        let x = (grid_width / 2) as i32 - (matrix.side() / 2) as i32;
        Self {
            kind,
            matrix,
            pos: Position { x, y: 0 },
            color: kind.color(),
        }
    }

    /// Draw the next kind from `source` and place it at the spawn position.
    /// Collision is the caller's concern.
    pub fn spawn(source: &mut dyn PieceSource, grid_width: usize) -> Self {
        Self::new(source.next_kind(), grid_width)
    }

    pub fn move_by(&mut self, dx: i32) {
        self.pos.x += dx;
    }

    pub fn drop(&mut self) {
        self.pos.y += 1;
    }

    pub fn rotate(&mut self) {
        self.matrix = self.matrix.transpose_clockwise();
    }

    /// Rotate clockwise, shifting sideways (+1, -2, +3, ...) until the piece fits.
    ///
    /// Gives up once the offset magnitude exceeds the matrix side: the piece is
    /// turned back to its original orientation and column. Returns whether the
    /// rotation was kept.
    pub fn rotate_with_kick(&mut self, arena: &Arena) -> bool {
        let original_x = self.pos.x;
        let side = self.matrix.side() as i32;
        let mut offset: i32 = 1;
        self.rotate();
        while arena.collide(self) {
            self.pos.x += offset;
            offset = -(offset + offset.signum());
            if offset.abs() > side {
                // three more quarter turns restore the original orientation
                self.rotate();
                self.rotate();
                self.rotate();
                self.pos.x = original_x;
                return false;
            }
        }
        true
    }

    /// Occupied cells in grid coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.matrix
            .filled_cells()
            .map(move |(x, y)| (self.pos.x + x as i32, self.pos.y + y as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Cell;

    #[test]
    fn test_four_rotations_restore_every_template() {
        for kind in TetrominoKind::ALL {
            let mut piece = Piece::new(kind, 10);
            let original = piece.matrix;
            for _ in 0..4 {
                piece.rotate();
            }
            assert_eq!(piece.matrix, original, "{kind:?}");
        }
    }

    #[test]
    fn test_rotation_keeps_side_and_cell_count() {
        for kind in TetrominoKind::ALL {
            let m = kind.template();
            let r = m.transpose_clockwise();
            assert_eq!(r.side(), m.side());
            assert_eq!(r.filled_cells().count(), 4);
        }
    }

    #[test]
    fn test_template_sides() {
        assert_eq!(TetrominoKind::O.template().side(), 2);
        assert_eq!(TetrominoKind::I.template().side(), 4);
        for kind in [TetrominoKind::T, TetrominoKind::J, TetrominoKind::L, TetrominoKind::S, TetrominoKind::Z] {
            assert_eq!(kind.template().side(), 3);
        }
    }

    #[test]
    fn test_transpose_clockwise_t() {
        // 000      010
        // 111  ->  110
        // 010      010
        let r = TetrominoKind::T.template().transpose_clockwise();
        let expected = Matrix::from_rows(&[&[0, 1, 0], &[1, 1, 0], &[0, 1, 0]]);
        assert_eq!(r, expected);
    }

    #[test]
    fn test_spawn_is_centred() {
        assert_eq!(Piece::new(TetrominoKind::T, 10).pos, Position { x: 4, y: 0 });
        assert_eq!(Piece::new(TetrominoKind::O, 10).pos, Position { x: 4, y: 0 });
        assert_eq!(Piece::new(TetrominoKind::I, 10).pos, Position { x: 3, y: 0 });
        assert_eq!(Piece::new(TetrominoKind::I, 7).pos, Position { x: 1, y: 0 });
    }

    #[test]
    fn test_spawn_draws_from_source() {
        let mut source = crate::source::Sequence::new(vec![TetrominoKind::Z, TetrominoKind::I]).unwrap();
        assert_eq!(Piece::spawn(&mut source, 10).kind, TetrominoKind::Z);
        let piece = Piece::spawn(&mut source, 10);
        assert_eq!(piece.kind, TetrominoKind::I);
        assert_eq!(piece.color, PieceColor::Cyan);
    }

    #[test]
    fn test_move_and_drop_do_not_validate() {
        let mut piece = Piece::new(TetrominoKind::O, 10);
        piece.move_by(-20);
        piece.drop();
        assert_eq!(piece.pos, Position { x: -16, y: 1 });
    }

    #[test]
    fn test_rotate_in_open_space_keeps_column() {
        let arena = Arena::new(10, 20);
        let mut piece = Piece::new(TetrominoKind::T, 10);
        piece.pos.y = 5;
        assert!(piece.rotate_with_kick(&arena));
        assert_eq!(piece.pos.x, 4);
        assert_eq!(piece.matrix, TetrominoKind::T.template().transpose_clockwise());
    }

    #[test]
    fn test_rotate_kicks_off_left_wall() {
        let arena = Arena::new(10, 20);
        let mut piece = Piece::new(TetrominoKind::I, 10);
        // vertical I sits in matrix column 1, so x = -1 touches the left wall
        piece.pos = Position { x: -1, y: 5 };
        assert!(!arena.collide(&piece));
        assert!(piece.rotate_with_kick(&arena));
        assert_eq!(piece.pos.x, 0);
        assert!(!arena.collide(&piece));
        let cols: Vec<i32> = piece.cells().map(|(x, _)| x).collect();
        assert_eq!(cols, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rotate_kicks_off_right_wall() {
        let arena = Arena::new(10, 20);
        let mut piece = Piece::new(TetrominoKind::I, 10);
        // rotate the vertical I to horizontal, then turn once more
        piece.pos = Position { x: 0, y: 5 };
        piece.rotate();
        piece.rotate();
        // vertical again, now in matrix column 2; x = 7 puts it at column 9
        piece.pos.x = 7;
        assert!(!arena.collide(&piece));
        assert!(piece.rotate_with_kick(&arena));
        assert!(!arena.collide(&piece));
        assert!(piece.cells().all(|(x, _)| (0..10).contains(&x)));
    }

    #[test]
    fn test_rotate_aborts_and_restores_when_boxed_in() {
        // a one-column shaft: the vertical I fits, the horizontal one never does
        let mut arena = Arena::new(10, 20);
        for y in 0..20 {
            for x in 0..10 {
                if x != 4 {
                    arena.set(x, y, Cell::Block(PieceColor::Red));
                }
            }
        }
        let mut piece = Piece::new(TetrominoKind::I, 10);
        piece.pos = Position { x: 3, y: 8 };
        assert!(!arena.collide(&piece));
        let before = piece.clone();
        assert!(!piece.rotate_with_kick(&arena));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_from_letter() {
        assert_eq!(TetrominoKind::from_letter('t'), Some(TetrominoKind::T));
        assert_eq!(TetrominoKind::from_letter('I'), Some(TetrominoKind::I));
        assert_eq!(TetrominoKind::from_letter('x'), None);
    }
}
