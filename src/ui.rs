//! Layout and drawing: playfield, score sidebar, start / game-over overlay, row-clear flash.

use crate::game::Game;
use crate::render::{self, BlockSize, Paint, PixelRect, Surface};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the row-clear flash (TachyonFX fade from the flash colour).
const FLASH_MS: u32 = 250;

/// Score and high score as last reported by the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub high_score: u32,
}

/// Everything one frame needs to know.
pub struct View<'a> {
    pub game: &'a Game,
    pub theme: &'a Theme,
    pub block: BlockSize,
    pub scoreboard: Scoreboard,
    /// False until the first session starts; picks the overlay text.
    pub started: bool,
    pub music_on: bool,
}

/// Row-clear flash over the board. Created lazily on the next frame since the
/// board rect is only known while drawing.
#[derive(Default)]
pub struct Flash {
    pending: bool,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl Flash {
    pub fn trigger(&mut self) {
        self.pending = true;
        self.effect = None;
        self.last_process = None;
    }

    fn render(&mut self, frame: &mut Frame, board: Rect, theme: &Theme, now: Instant) {
        if self.pending {
            self.pending = false;
            self.effect = Some(
                fx::fade_from(theme.flash, theme.flash, (FLASH_MS, Interpolation::Linear))
                    .with_area(board),
            );
        }
        let delta = self
            .last_process
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        self.last_process = Some(now);

        let done = match self.effect.as_mut() {
            Some(effect) => {
                frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
                effect.done()
            }
            None => false,
        };
        if done {
            self.effect = None;
            self.last_process = None;
        }
    }
}

/// `Surface` over a ratatui buffer; one pixel is one terminal cell.
/// Pixels outside `area` are dropped.
struct BufferSurface<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    theme: &'a Theme,
}

impl BufferSurface<'_> {
    fn color(&self, paint: Paint) -> Color {
        match paint {
            Paint::Background => self.theme.bg,
            Paint::Block(c) => self.theme.block_color(c),
            Paint::Outline => self.theme.outline,
        }
    }
}

/// Absolute buffer positions of `rect` clipped to `area`, with offsets inside `rect`.
fn pixels(area: Rect, rect: PixelRect) -> impl Iterator<Item = (u16, u16, u16, u16)> {
    let x_end = rect.x.saturating_add(rect.width).min(area.width);
    let y_end = rect.y.saturating_add(rect.height).min(area.height);
    let (x0, y0) = (rect.x, rect.y);
    (y0..y_end).flat_map(move |y| {
        (x0..x_end).map(move |x| (area.x + x, area.y + y, x - x0, y - y0))
    })
}

impl Surface for BufferSurface<'_> {
    fn fill_rect(&mut self, rect: PixelRect, paint: Paint) {
        let color = self.color(paint);
        for (x, y, _, _) in pixels(self.area, rect) {
            if let Some(cell) = self.buf.cell_mut((x, y)) {
                cell.set_symbol(" ").set_bg(color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: PixelRect, paint: Paint) {
        let color = self.color(paint);
        let (w, h) = (rect.width, rect.height);
        for (x, y, dx, dy) in pixels(self.area, rect) {
            let symbol = outline_symbol(dx, dy, w, h);
            if symbol.is_empty() {
                continue;
            }
            if let Some(cell) = self.buf.cell_mut((x, y)) {
                cell.set_symbol(symbol).set_fg(color);
            }
        }
    }
}

/// Glyph for pixel (dx, dy) on the outline of a `w × h` rectangle, or "" inside.
fn outline_symbol(dx: u16, dy: u16, w: u16, h: u16) -> &'static str {
    let (right, bottom) = (w.saturating_sub(1), h.saturating_sub(1));
    if h == 1 {
        return match (dx, w) {
            (_, 1) => "▪",
            (0, _) => "▏",
            (x, _) if x == right => "▕",
            _ => "",
        };
    }
    match (dx, dy) {
        (0, 0) => "┌",
        (x, 0) if x == right => "┐",
        (0, y) if y == bottom => "└",
        (x, y) if x == right && y == bottom => "┘",
        (_, 0) => "─",
        (_, y) if y == bottom => "─",
        (0, _) => "│",
        (x, _) if x == right => "│",
        _ => "",
    }
}

/// Terminal size of the whole layout (bordered board plus sidebar), or `None`
/// if it does not fit in `u16`.
pub fn layout_size(block: BlockSize, width: usize, height: usize) -> Option<(u16, u16)> {
    let (bw, bh) = block.checked_grid_size(width, height)?;
    let total_w = bw.checked_add(2)?.checked_add(SIDEBAR_WIDTH)?;
    Some((total_w, bh.checked_add(2)?))
}

/// Draw board and sidebar centred in the frame.
pub fn draw(frame: &mut Frame, view: &View, flash: &mut Flash, now: Instant) {
    let arena = view.game.arena();
    let (bw, bh) = view.block.grid_size(arena.width(), arena.height());
    let (pw, ph) = (bw.saturating_add(2), bh.saturating_add(2));
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(frame.area());
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let (playfield_area, sidebar_area) = (inner[0], inner[1]);

    let board = draw_playfield(frame, view, playfield_area);
    flash.render(frame, board, view.theme, now);
    draw_sidebar(frame, view, sidebar_area);
    if view.game.is_game_over() {
        draw_overlay(frame, view, board);
    }
}

/// Returns the board rect inside the border.
fn draw_playfield(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg))
        .title(Span::styled(" stacktui ", view.theme.title));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    // the idle piece from construction is not shown before the first start
    let piece = view.started.then(|| view.game.piece());
    let mut surface = BufferSurface {
        buf: frame.buffer_mut(),
        area: board,
        theme: view.theme,
    };
    render::draw_scene(&mut surface, view.game.arena(), piece, view.block);
    board
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let title_style = Style::default().fg(view.theme.title);
    let fg_style = Style::default().fg(view.theme.main_fg);
    let session = view.game.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Score, best, speed, music
            Constraint::Length(1), // gap
            Constraint::Length(8), // Controls
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg));
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats = vec![
        stat("Score: ", view.scoreboard.score.to_string()),
        stat("Best:  ", view.scoreboard.high_score.to_string()),
        stat(
            "Drop:  ",
            format!("{} ms", session.drop_interval.as_millis()),
        ),
        stat("Music: ", if view.music_on { "on" } else { "off" }.to_string()),
    ];
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    let help_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg));
    let help_inner = help_block.inner(chunks[2]);
    help_block.render(chunks[2], frame.buffer_mut());
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{k:<7}"), title_style),
            Span::styled(what, fg_style),
        ])
    };
    let help = vec![
        key("← h", "Move left"),
        key("→ l", "Move right"),
        key("↓ j", "Drop"),
        key("↑ k", "Rotate"),
        key("Enter", "Start"),
        key("q Esc", "Quit"),
    ];
    Paragraph::new(Text::from(help)).render(help_inner, frame.buffer_mut());
}

fn draw_overlay(frame: &mut Frame, view: &View, board: Rect) {
    let popup_w = 20u16.min(board.width);
    let popup_h = 5u16.min(board.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(popup_w) / 2,
        y: board.y + board.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let (title, hint) = if view.started {
        (" Game Over ", " Enter: again ")
    } else {
        (" stacktui ", " Enter: start ")
    };
    let lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(view.theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Cell;
    use crate::piece::PieceColor;

    fn surface_test(area: Rect, f: impl FnOnce(&mut BufferSurface)) -> Buffer {
        let theme = Theme::onedark_default();
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 5));
        let mut surface = BufferSurface {
            buf: &mut buf,
            area,
            theme: &theme,
        };
        f(&mut surface);
        buf
    }

    #[test]
    fn test_fill_rect_is_offset_and_clipped() {
        let buf = surface_test(Rect::new(2, 1, 4, 2), |s| {
            s.fill_rect(
                PixelRect {
                    x: 2,
                    y: 1,
                    width: 10,
                    height: 10,
                },
                Paint::Block(PieceColor::Red),
            );
        });
        let red = Theme::onedark_default().block_color(PieceColor::Red);
        assert_eq!(buf[(4, 2)].bg, red);
        assert_eq!(buf[(5, 2)].bg, red);
        // outside the surface area
        assert_ne!(buf[(6, 2)].bg, red);
        assert_ne!(buf[(4, 3)].bg, red);
        assert_ne!(buf[(3, 2)].bg, red);
    }

    #[test]
    fn test_stroke_single_row_block() {
        let buf = surface_test(Rect::new(0, 0, 10, 5), |s| {
            s.stroke_rect(
                PixelRect {
                    x: 0,
                    y: 0,
                    width: 2,
                    height: 1,
                },
                Paint::Outline,
            );
        });
        assert_eq!(buf[(0, 0)].symbol(), "▏");
        assert_eq!(buf[(1, 0)].symbol(), "▕");
    }

    #[test]
    fn test_outline_symbols_for_box() {
        assert_eq!(outline_symbol(0, 0, 3, 3), "┌");
        assert_eq!(outline_symbol(2, 2, 3, 3), "┘");
        assert_eq!(outline_symbol(1, 0, 3, 3), "─");
        assert_eq!(outline_symbol(0, 1, 3, 3), "│");
        assert_eq!(outline_symbol(1, 1, 3, 3), "");
        assert_eq!(outline_symbol(0, 0, 1, 1), "▪");
    }

    #[test]
    fn test_scene_through_buffer_surface() {
        let mut arena = crate::arena::Arena::new(3, 2);
        arena.set(1, 1, Cell::Block(PieceColor::Green));
        let buf = surface_test(Rect::new(0, 0, 6, 2), |s| {
            render::draw_scene(s, &arena, None, BlockSize::default());
        });
        let theme = Theme::onedark_default();
        assert_eq!(buf[(2, 1)].bg, theme.block_color(PieceColor::Green));
        assert_eq!(buf[(3, 1)].bg, theme.block_color(PieceColor::Green));
        assert_eq!(buf[(0, 0)].bg, theme.bg);
    }

    #[test]
    fn test_layout_size_bounds() {
        let block = BlockSize::default();
        assert_eq!(layout_size(block, 10, 20), Some((22 + SIDEBAR_WIDTH, 22)));
        assert_eq!(layout_size(block, 40_000, 20), None);
        // grid fits, but not with the borders and sidebar
        assert_eq!(layout_size(block, 32_760, 20), None);
        assert_eq!(layout_size(block, 10, 70_000), None);
    }

    #[test]
    fn test_draw_oversized_grid_into_small_frame() {
        use crate::game::{Game, Rules};
        use crate::piece::TetrominoKind;
        use crate::source::Sequence;
        use ratatui::Terminal;
        use ratatui::backend::TestBackend;

        let rules = Rules {
            width: 40_000,
            ..Rules::default()
        };
        let source = Sequence::new(vec![TetrominoKind::O]).unwrap();
        let mut game = Game::new(rules, Box::new(source));
        game.start();
        let theme = Theme::onedark_default();
        let view = View {
            game: &game,
            theme: &theme,
            block: BlockSize::default(),
            scoreboard: Scoreboard::default(),
            started: true,
            music_on: true,
        };
        let mut flash = Flash::default();
        flash.trigger();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|f| draw(f, &view, &mut flash, Instant::now()))
            .unwrap();
    }
}
