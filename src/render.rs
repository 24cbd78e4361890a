//! Scene drawing against an abstract pixel surface.
//!
//! The surface only knows rectangles; grid coordinates become pixels by
//! multiplying with the block size on each axis.

use crate::arena::{Arena, Cell};
use crate::piece::{Piece, PieceColor};

/// Rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// What to paint a rectangle with; the surface resolves it to a real colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Background,
    Block(PieceColor),
    Outline,
}

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSize {
    pub width: u16,
    pub height: u16,
}

impl Default for BlockSize {
    /// Terminal cells are about twice as tall as wide.
    fn default() -> Self {
        Self {
            width: 2,
            height: 1,
        }
    }
}

impl BlockSize {
    /// Pixel rectangle covering grid cell (x, y).
    /// Coordinates past the pixel range saturate at `u16::MAX`.
    pub fn cell_rect(self, x: usize, y: usize) -> PixelRect {
        PixelRect {
            x: scale(x, self.width),
            y: scale(y, self.height),
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel size of a whole `width × height` grid, saturating at `u16::MAX`.
    pub fn grid_size(self, width: usize, height: usize) -> (u16, u16) {
        (scale(width, self.width), scale(height, self.height))
    }

    /// Pixel size of a whole grid, or `None` if it does not fit in `u16`.
    pub fn checked_grid_size(self, width: usize, height: usize) -> Option<(u16, u16)> {
        let w = u16::try_from(width).ok()?.checked_mul(self.width)?;
        let h = u16::try_from(height).ok()?.checked_mul(self.height)?;
        Some((w, h))
    }
}

fn scale(n: usize, by: u16) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX).saturating_mul(by)
}

pub trait Surface {
    fn fill_rect(&mut self, rect: PixelRect, paint: Paint);
    fn stroke_rect(&mut self, rect: PixelRect, paint: Paint);
}

fn draw_block(surface: &mut dyn Surface, block: BlockSize, x: usize, y: usize, color: PieceColor) {
    let rect = block.cell_rect(x, y);
    surface.fill_rect(rect, Paint::Block(color));
    surface.stroke_rect(rect, Paint::Outline);
}

/// Clear the board, then draw settled blocks and the falling piece.
///
/// Piece cells outside the grid are skipped.
pub fn draw_scene(surface: &mut dyn Surface, arena: &Arena, piece: Option<&Piece>, block: BlockSize) {
    let (w, h) = block.grid_size(arena.width(), arena.height());
    surface.fill_rect(
        PixelRect {
            x: 0,
            y: 0,
            width: w,
            height: h,
        },
        Paint::Background,
    );
    for (y, row) in arena.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Cell::Block(color) = *cell {
                draw_block(surface, block, x, y, color);
            }
        }
    }
    let Some(piece) = piece else {
        return;
    };
    for (x, y) in piece.cells() {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            continue;
        };
        if x < arena.width() && y < arena.height() {
            draw_block(surface, block, x, y, piece.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Position, TetrominoKind};

    #[derive(Default)]
    struct Recorder {
        fills: Vec<(PixelRect, Paint)>,
        strokes: Vec<PixelRect>,
    }

    impl Surface for Recorder {
        fn fill_rect(&mut self, rect: PixelRect, paint: Paint) {
            self.fills.push((rect, paint));
        }

        fn stroke_rect(&mut self, rect: PixelRect, _paint: Paint) {
            self.strokes.push(rect);
        }
    }

    #[test]
    fn test_cell_rect_scales_by_block_size() {
        let block = BlockSize {
            width: 30,
            height: 30,
        };
        assert_eq!(
            block.cell_rect(3, 2),
            PixelRect {
                x: 90,
                y: 60,
                width: 30,
                height: 30
            }
        );
        assert_eq!(block.grid_size(10, 20), (300, 600));
    }

    #[test]
    fn test_oversized_coordinates_saturate() {
        let block = BlockSize::default();
        assert_eq!(block.cell_rect(70_000, 3).x, u16::MAX);
        assert_eq!(block.cell_rect(70_000, 3).y, 3);
        assert_eq!(block.grid_size(40_000, 20), (u16::MAX, 20));
        assert_eq!(block.checked_grid_size(40_000, 20), None);
        assert_eq!(block.checked_grid_size(70_000, 1), None);
        assert_eq!(block.checked_grid_size(10, 20), Some((20, 20)));
    }

    #[test]
    fn test_empty_scene_is_background_only() {
        let arena = Arena::new(10, 20);
        let mut rec = Recorder::default();
        draw_scene(&mut rec, &arena, None, BlockSize::default());
        assert_eq!(
            rec.fills,
            vec![(
                PixelRect {
                    x: 0,
                    y: 0,
                    width: 20,
                    height: 20
                },
                Paint::Background
            )]
        );
        assert!(rec.strokes.is_empty());
    }

    #[test]
    fn test_scene_draws_blocks_and_piece() {
        let mut arena = Arena::new(10, 20);
        arena.set(0, 19, Cell::Block(PieceColor::Red));
        let mut piece = Piece::new(TetrominoKind::O, 10);
        piece.pos = Position { x: 4, y: 0 };
        let mut rec = Recorder::default();
        draw_scene(&mut rec, &arena, Some(&piece), BlockSize::default());
        // background + 1 settled + 4 piece cells
        assert_eq!(rec.fills.len(), 6);
        assert_eq!(rec.strokes.len(), 5);
        assert_eq!(
            rec.fills[1],
            (
                PixelRect {
                    x: 0,
                    y: 19,
                    width: 2,
                    height: 1
                },
                Paint::Block(PieceColor::Red)
            )
        );
        assert!(rec.fills[2..]
            .iter()
            .all(|(_, p)| *p == Paint::Block(PieceColor::Yellow)));
    }

    #[test]
    fn test_piece_cells_off_grid_are_skipped() {
        let arena = Arena::new(10, 20);
        let mut piece = Piece::new(TetrominoKind::O, 10);
        piece.pos = Position { x: -1, y: -1 };
        let mut rec = Recorder::default();
        draw_scene(&mut rec, &arena, Some(&piece), BlockSize::default());
        assert_eq!(rec.strokes.len(), 1);
    }
}
