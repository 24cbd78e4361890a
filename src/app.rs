//! App: terminal init, frame loop, input and event dispatch.

use crate::GameConfig;
use crate::audio::{AudioSink, TerminalBell};
use crate::game::{Game, GameEvent};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Flash, Scoreboard, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: Game,
    audio: TerminalBell,
    flash: Flash,
    scoreboard: Scoreboard,
    /// Set by the first start; until then the board shows the start prompt.
    started: bool,
    last_tick: Instant,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let game = Game::new(config.rules, config.piece_source());
        Self {
            audio: TerminalBell::new(config.bell),
            config,
            theme,
            game,
            flash: Flash::default(),
            scoreboard: Scoreboard::default(),
            started: false,
            last_tick: Instant::now(),
        }
    }

    fn start(&mut self) {
        self.started = true;
        self.game.start();
        self.last_tick = Instant::now();
    }

    /// Hand queued game events to the audio sink, the scoreboard and the flash.
    fn dispatch_events(&mut self) {
        for event in self.game.drain_events() {
            match event {
                GameEvent::Cue(cue) => self.audio.play(cue),
                GameEvent::MusicStarted => self.audio.start_music(),
                GameEvent::MusicPaused => self.audio.pause_music(),
                GameEvent::ScoreChanged { score, high_score } => {
                    self.scoreboard = Scoreboard { score, high_score };
                }
                GameEvent::RowsCleared { rows, points } => {
                    debug!(rows, points, "rows cleared");
                    if !self.config.no_animation {
                        self.flash.trigger();
                    }
                }
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.config.autostart {
            self.start();
            self.dispatch_events();
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        info!(
            score = self.scoreboard.score,
            high_score = self.scoreboard.high_score,
            "exit"
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            let now = Instant::now();
            let view = View {
                game: &self.game,
                theme: &self.theme,
                block: self.config.block,
                scoreboard: self.scoreboard,
                started: self.started,
                music_on: self.audio.music_playing(),
            };
            terminal.draw(|f| ui::draw(f, &view, &mut self.flash, now))?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key_to_action(key) {
                        Action::Quit => return Ok(()),
                        Action::Start => self.start(),
                        action => self.game.apply(action),
                    }
                    self.dispatch_events();
                }
            }

            let tick_now = Instant::now();
            self.game.tick(tick_now.duration_since(self.last_tick));
            self.last_tick = tick_now;
            self.dispatch_events();
        }
    }
}
