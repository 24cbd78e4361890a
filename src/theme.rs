//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::PieceColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours indexed by `PieceColor::index()`:
    /// purple, yellow, orange, blue, cyan, green, red.
    pub blocks: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Block outlines.
    pub outline: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, high score).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Row-clear flash.
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// One Dark hex values, same order as `Theme::blocks`.
const ONEDARK_BLOCKS: [&str; 7] = [
    "#C678DD", "#E5C07B", "#D19A66", "#61AFEF", "#56B6C2", "#98C379", "#E06C75",
];

/// Theme keys per block colour: our own key first, then btop equivalents.
const BLOCK_KEYS: [&[&str]; 7] = [
    &["block_purple", "net_box"],
    &["block_yellow", "title", "cpu_mid"],
    &["block_orange", "temp_mid"],
    &["block_blue", "cpu_box"],
    &["block_cyan", "hi_fg", "proc_misc"],
    &["block_green", "mem_box", "cpu_start"],
    &["block_red", "cpu_end", "temp_end"],
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            blocks: ONEDARK_BLOCKS.map(hex_or_gray),
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            outline: Color::Rgb(0x1E, 0x21, 0x27),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            flash: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` then overrides block colours for high-contrast or colorblind play.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        let hexes = match palette {
            crate::Palette::Normal => return,
            crate::Palette::HighContrast => [
                "#FF00FF", "#FFFF00", "#FF8800", "#0088FF", "#00FFFF", "#00FF00", "#FF0000",
            ],
            // Okabe-Ito style: no red/green pair relies on hue alone
            crate::Palette::Colorblind => [
                "#CC79A7", "#F0E442", "#E69F00", "#0072B2", "#56B4E9", "#009E73", "#D55E00",
            ],
        };
        self.blocks = hexes.map(hex_or_gray);
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut blocks = defaults.blocks;
        for (slot, keys) in blocks.iter_mut().zip(BLOCK_KEYS) {
            if let Some(c) = keys.iter().find_map(|&k| get(k)) {
                *slot = c;
            }
        }
        Self {
            blocks,
            bg: get("main_bg").unwrap_or(defaults.bg),
            outline: get("block_outline")
                .or_else(|| get("meter_bg"))
                .unwrap_or(defaults.outline),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            flash: get("hi_fg").unwrap_or(defaults.flash),
        }
    }

    #[inline]
    pub fn block_color(&self, color: PieceColor) -> Color {
        self.blocks[color.index()]
    }
}

fn hex_or_gray(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Gray)
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_keys_override_blocks() {
        let map = parse_theme_file(
            "# comment\ntheme[block_orange]='#010203'\ntheme[cpu_box]=\"#0000FF\"\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.block_color(PieceColor::Orange), Color::Rgb(1, 2, 3));
        assert_eq!(theme.block_color(PieceColor::Blue), Color::Rgb(0, 0, 255));
        assert_eq!(
            theme.block_color(PieceColor::Red),
            Theme::onedark_default().block_color(PieceColor::Red)
        );
    }

    #[test]
    fn test_palette_replaces_blocks() {
        let mut theme = Theme::onedark_default();
        theme.apply_palette(crate::Palette::HighContrast);
        assert_eq!(theme.block_color(PieceColor::Red), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let theme = Theme::load(Some(Path::new("/nonexistent/theme")), crate::Palette::Normal).unwrap();
        assert_eq!(theme.blocks, Theme::onedark_default().blocks);
    }
}
