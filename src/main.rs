//! stacktui — falling-block puzzle game in the terminal.

mod app;
mod arena;
mod audio;
mod game;
mod input;
mod piece;
mod render;
mod source;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use arena::ScoreRules;
use clap::{ArgAction, Parser, ValueEnum};
use game::Rules;
use piece::TetrominoKind;
use render::BlockSize;
use source::{PieceSource, RandomSource, Sequence};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;
    let config = GameConfig::from_args(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "theme not loaded, using defaults");
        theme::Theme::default()
    });
    tracing::info!(?config, "starting");
    let mut app = App::new(config, theme);
    app.run()
}

/// Install a file subscriber when `--log-file` is given; stdout belongs to the UI.
fn init_logging(path: Option<&Path>, verbose: u8) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stacktui",
    version,
    about = "Falling-block puzzle in the terminal. Fill rows to clear them; several at once score more.",
    long_about = "stacktui is a terminal falling-block puzzle.\n\n\
        Pieces fall one row per drop interval. Complete rows clear; each further row \
        cleared by the same lock is worth double the previous one. The game speeds up \
        after every lock and ends when a new piece has no room.\n\n\
        CONTROLS:\n  Left/h  Move left    Right/l  Move right\n  Down/j  Drop         Up/k     Rotate\n  \
        Enter/s Start        q/Esc    Quit"
)]
pub struct Args {
    /// Grid width in columns.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: usize,

    /// Grid height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: usize,

    /// Initial time between forced drops.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub drop_interval_ms: u64,

    /// Speed-up stops once the drop interval is at or below this.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub min_interval_ms: u64,

    /// Drop interval multiplier applied after every lock (0 < factor <= 1).
    #[arg(long, default_value = "0.9", value_name = "FACTOR")]
    pub speed_factor: f64,

    /// Points for the first row cleared by a lock.
    #[arg(long, default_value = "10", value_name = "POINTS")]
    pub row_value: u32,

    /// Each further row cleared by the same lock is worth this many times the previous one.
    #[arg(long, default_value = "2", value_name = "N")]
    pub row_multiplier: u32,

    /// Seed for the piece randomizer (reproducible games).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Fixed repeating piece order instead of random draws, e.g. "TJLOSZI".
    #[arg(long, value_name = "PIECES", conflicts_with = "seed")]
    pub sequence: Option<String>,

    /// Terminal columns per grid cell.
    #[arg(long, default_value = "2", value_name = "COLS")]
    pub block_width: u16,

    /// Terminal rows per grid cell.
    #[arg(long, default_value = "1", value_name = "ROWS")]
    pub block_height: u16,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the row-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Ring the terminal bell on row clears and game over.
    #[arg(long)]
    pub bell: bool,

    /// Start a game immediately instead of waiting for Enter.
    #[arg(long)]
    pub autostart: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("grid {width}x{height} does not fit on a terminal at this block size")]
    GridTooLarge { width: usize, height: usize },
    #[error("block size must be at least 1x1, got {width}x{height}")]
    EmptyBlock { width: u16, height: u16 },
    #[error("speed factor must be in (0, 1], got {0}")]
    SpeedFactor(f64),
    #[error("drop interval must be positive")]
    ZeroInterval,
    #[error("frame rate must be positive, got {0}")]
    FrameRate(f64),
    #[error("unknown piece '{0}' in sequence (expected T, J, L, O, S, Z or I)")]
    UnknownPiece(char),
    #[error("piece sequence is empty")]
    EmptySequence,
}

/// Where spawned pieces come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Random { seed: Option<u64> },
    Sequence(Sequence),
}

/// Validated settings derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rules: Rules,
    pub block: BlockSize,
    pub source: SourceConfig,
    pub frame_rate: f64,
    pub no_animation: bool,
    pub bell: bool,
    pub autostart: bool,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.width == 0 || args.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: args.width,
                height: args.height,
            });
        }
        if args.block_width == 0 || args.block_height == 0 {
            return Err(ConfigError::EmptyBlock {
                width: args.block_width,
                height: args.block_height,
            });
        }
        let block = BlockSize {
            width: args.block_width,
            height: args.block_height,
        };
        if ui::layout_size(block, args.width, args.height).is_none() {
            return Err(ConfigError::GridTooLarge {
                width: args.width,
                height: args.height,
            });
        }
        if !(args.speed_factor > 0.0 && args.speed_factor <= 1.0) {
            return Err(ConfigError::SpeedFactor(args.speed_factor));
        }
        if args.drop_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !(args.frame_rate.is_finite() && args.frame_rate > 0.0) {
            return Err(ConfigError::FrameRate(args.frame_rate));
        }
        let source = match &args.sequence {
            Some(s) => SourceConfig::Sequence(parse_sequence(s)?),
            None => SourceConfig::Random { seed: args.seed },
        };
        Ok(Self {
            rules: Rules {
                width: args.width,
                height: args.height,
                initial_interval: Duration::from_millis(args.drop_interval_ms),
                min_interval: Duration::from_millis(args.min_interval_ms),
                speed_factor: args.speed_factor,
                score: ScoreRules {
                    single_row: args.row_value,
                    multiplier: args.row_multiplier,
                },
            },
            block,
            source,
            frame_rate: args.frame_rate,
            no_animation: args.no_animation,
            bell: args.bell,
            autostart: args.autostart,
        })
    }

    pub fn piece_source(&self) -> Box<dyn PieceSource> {
        match &self.source {
            SourceConfig::Random { seed: Some(seed) } => Box::new(RandomSource::seeded(*seed)),
            SourceConfig::Random { seed: None } => Box::new(RandomSource::from_entropy()),
            SourceConfig::Sequence(sequence) => Box::new(sequence.clone()),
        }
    }
}

/// Piece letters, ignoring whitespace and commas.
fn parse_sequence(s: &str) -> Result<Sequence, ConfigError> {
    let kinds = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| TetrominoKind::from_letter(c).ok_or(ConfigError::UnknownPiece(c)))
        .collect::<Result<Vec<_>, _>>()?;
    Sequence::new(kinds).ok_or(ConfigError::EmptySequence)
}
