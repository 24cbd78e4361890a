//! Sound cues. The terminal has no mixer, so the only voice is the bell.

use crate::game::Cue;
use std::io::Write;
use tracing::{debug, trace};

/// Receives cue triggers and background-music start/pause.
pub trait AudioSink {
    fn play(&mut self, cue: Cue);
    fn start_music(&mut self);
    fn pause_music(&mut self);
}

/// Rings the terminal bell on row clears and game over when enabled.
#[derive(Debug, Default)]
pub struct TerminalBell {
    enabled: bool,
    music_playing: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            music_playing: false,
        }
    }

    pub fn music_playing(&self) -> bool {
        self.music_playing
    }

    fn rings_for(cue: Cue) -> bool {
        matches!(cue, Cue::RowClear | Cue::GameOver)
    }
}

impl AudioSink for TerminalBell {
    fn play(&mut self, cue: Cue) {
        trace!(?cue, "cue");
        if self.enabled && Self::rings_for(cue) {
            let mut out = std::io::stdout();
            // bell write errors are ignored
            let _ = out.write_all(b"\x07").and_then(|()| out.flush());
        }
    }

    fn start_music(&mut self) {
        self.music_playing = true;
        debug!("music start");
    }

    fn pause_music(&mut self) {
        self.music_playing = false;
        debug!("music pause");
    }
}
