//! Game controller: session state, timing, input dispatch, lock and game over.

use crate::arena::{Arena, ScoreRules};
use crate::input::Action;
use crate::piece::Piece;
use crate::source::PieceSource;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Rules a session is played with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    pub width: usize,
    pub height: usize,
    pub initial_interval: Duration,
    /// Speed-up stops once the interval is at or below this.
    pub min_interval: Duration,
    /// Interval multiplier applied after each lock; below 1 speeds the game up.
    pub speed_factor: f64,
    pub score: ScoreRules,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            initial_interval: Duration::from_millis(1000),
            min_interval: Duration::from_millis(300),
            speed_factor: 0.9,
            score: ScoreRules::default(),
        }
    }
}

/// Sound cues for the audio collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Lock,
    RowClear,
    Rotate,
    GameOver,
}

/// Notifications for the host, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Cue(Cue),
    MusicStarted,
    MusicPaused,
    ScoreChanged { score: u32, high_score: u32 },
    RowsCleared { rows: u32, points: u32 },
}

/// Per-session bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub score: u32,
    pub high_score: u32,
    pub drop_interval: Duration,
    /// Time since the last drop.
    pub drop_counter: Duration,
    pub game_over: bool,
}

impl Session {
    /// No session in progress yet.
    fn idle(rules: &Rules) -> Self {
        Self {
            score: 0,
            high_score: 0,
            drop_interval: rules.initial_interval,
            drop_counter: Duration::ZERO,
            game_over: true,
        }
    }

    fn record_high_score(&mut self) {
        self.high_score = self.high_score.max(self.score);
    }
}

/// Arena, active piece and session, driven by `tick` and input.
#[derive(Debug)]
pub struct Game {
    rules: Rules,
    arena: Arena,
    piece: Piece,
    session: Session,
    source: Box<dyn PieceSource>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(rules: Rules, mut source: Box<dyn PieceSource>) -> Self {
        let piece = Piece::spawn(source.as_mut(), rules.width);
        Self {
            arena: Arena::new(rules.width, rules.height),
            piece,
            session: Session::idle(&rules),
            source,
            events: Vec::new(),
            rules,
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    /// Take queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        trace!(?event, "emit");
        self.events.push(event);
    }

    fn emit_score(&mut self) {
        self.emit(GameEvent::ScoreChanged {
            score: self.session.score,
            high_score: self.session.high_score,
        });
    }

    /// Begin a new session. A session still in progress counts toward the high score.
    pub fn start(&mut self) {
        if !self.session.game_over {
            self.session.record_high_score();
        }
        self.arena = Arena::new(self.rules.width, self.rules.height);
        self.session.score = 0;
        self.session.game_over = false;
        self.session.drop_interval = self.rules.initial_interval;
        self.piece = Piece::spawn(self.source.as_mut(), self.rules.width);
        if self.arena.collide(&self.piece) {
            info!(
                width = self.rules.width,
                height = self.rules.height,
                "spawn blocked at start"
            );
            self.session.record_high_score();
            self.session.game_over = true;
            self.emit_score();
            return;
        }
        info!(kind = ?self.piece.kind, "session started");
        self.session.drop_counter = Duration::ZERO;
        self.emit_score();
        self.emit(GameEvent::MusicStarted);
    }

    /// Advance time; forces a drop once more than one interval has passed.
    pub fn tick(&mut self, delta: Duration) {
        if self.session.game_over {
            return;
        }
        self.session.drop_counter += delta;
        if self.session.drop_counter > self.session.drop_interval {
            self.player_drop();
        }
    }

    /// Run one player action. Ignored while game over.
    pub fn apply(&mut self, action: Action) {
        if self.session.game_over {
            return;
        }
        match action {
            Action::MoveLeft => self.player_move(-1),
            Action::MoveRight => self.player_move(1),
            Action::SoftDrop => self.player_drop(),
            Action::Rotate => self.player_rotate(),
            Action::Start | Action::Quit | Action::None => {}
        }
    }

    /// Move down one row, locking the piece if it lands.
    pub fn player_drop(&mut self) {
        self.piece.drop();
        if self.arena.collide(&self.piece) {
            self.piece.pos.y -= 1;
            self.lock_piece();
            if self.session.game_over {
                return;
            }
        }
        self.session.drop_counter = Duration::ZERO;
    }

    fn lock_piece(&mut self) {
        self.arena.merge(&self.piece);
        debug!(kind = ?self.piece.kind, x = self.piece.pos.x, y = self.piece.pos.y, "lock");
        self.emit(GameEvent::Cue(Cue::Lock));

        let sweep = self.arena.sweep(self.rules.score);
        if sweep.rows_cleared > 0 {
            self.emit(GameEvent::Cue(Cue::RowClear));
            self.emit(GameEvent::RowsCleared {
                rows: sweep.rows_cleared,
                points: sweep.score,
            });
        }
        self.session.score = self.session.score.saturating_add(sweep.score);
        self.emit_score();

        self.piece = Piece::spawn(self.source.as_mut(), self.rules.width);
        self.increase_speed();
        if self.arena.collide(&self.piece) {
            self.session.record_high_score();
            self.session.game_over = true;
            info!(
                score = self.session.score,
                high_score = self.session.high_score,
                "game over"
            );
            self.emit(GameEvent::MusicPaused);
            self.emit(GameEvent::Cue(Cue::GameOver));
            self.emit_score();
        }
    }

    fn increase_speed(&mut self) {
        if self.session.drop_interval > self.rules.min_interval {
            self.session.drop_interval = self
                .session
                .drop_interval
                .mul_f64(self.rules.speed_factor);
            debug!(interval_ms = self.session.drop_interval.as_millis(), "speed up");
        }
    }

    /// Shift sideways, or stay put if the new spot is blocked.
    pub fn player_move(&mut self, dir: i32) {
        self.piece.move_by(dir);
        if self.arena.collide(&self.piece) {
            self.piece.move_by(-dir);
        }
    }

    pub fn player_rotate(&mut self) {
        let rotated = self.piece.rotate_with_kick(&self.arena);
        trace!(rotated, x = self.piece.pos.x, "rotate");
        self.emit(GameEvent::Cue(Cue::Rotate));
    }
}
