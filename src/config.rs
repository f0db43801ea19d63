use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::render::{LayoutConfig, VisualStyle};

/// Construction parameters, as given by the user (CLI flags or a JSON
/// preset). All optional with defaults; colors are hex strings until
/// [`VisualizerConfig::resolve`] validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub audio_src: PathBuf,
    pub author: String,
    pub title: String,
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub style: String,
    pub bar_width: f32,
    pub bar_height: f32,
    pub bar_spacing: f32,
    pub bar_color: String,
    pub shadow_blur: f32,
    pub shadow_color: String,
    pub font_px: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            audio_src: PathBuf::new(),
            author: String::new(),
            title: String::new(),
            autoplay: false,
            loop_playback: false,
            style: "lounge".to_string(),
            bar_width: 2.0,
            bar_height: 2.0,
            bar_spacing: 5.0,
            bar_color: "#cafdff".to_string(),
            shadow_blur: 10.0,
            shadow_color: "#ffffff".to_string(),
            font_px: 12.0,
        }
    }
}

impl VisualizerConfig {
    pub fn from_preset(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read preset {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("invalid preset {:?}", path))
    }

    /// Fail-fast validation: resolves the style tag, parses colors and
    /// rejects degenerate bar geometry before any window opens.
    pub fn resolve(&self) -> Result<(VisualStyle, LayoutConfig)> {
        let style = VisualStyle::from_tag(&self.style)?;

        if self.bar_width < 0.0 || self.bar_height < 0.0 || self.bar_spacing < 0.0 {
            bail!("bar geometry must be non-negative");
        }
        if !(self.bar_width + self.bar_spacing > 0.0) {
            bail!("bar width plus bar spacing must be positive");
        }
        if self.shadow_blur < 0.0 {
            bail!("shadow blur must be non-negative");
        }
        if !(self.font_px > 0.0) {
            bail!("font size must be positive");
        }

        let layout = LayoutConfig {
            bar_width: self.bar_width,
            bar_height: self.bar_height,
            bar_spacing: self.bar_spacing,
            bar_color: parse_hex_color(&self.bar_color)?,
            shadow_blur: self.shadow_blur,
            shadow_color: parse_hex_color(&self.shadow_color)?,
            font_px: self.font_px,
        };

        Ok((style, layout))
    }
}

/// Parse a `#rrggbb` color into sRGB components in 0..=1.
pub fn parse_hex_color(value: &str) -> Result<[f32; 4]> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        bail!("expected a #rrggbb color, got '{}'", value);
    }

    let channel = |range: std::ops::Range<usize>| -> Result<f32> {
        let byte = u8::from_str_radix(&hex[range], 16)
            .with_context(|| format!("invalid hex color '{}'", value))?;
        Ok(byte as f32 / 255.0)
    };

    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = VisualizerConfig::default();
        assert_eq!(config.style, "lounge");
        assert_eq!(config.bar_width, 2.0);
        assert_eq!(config.bar_height, 2.0);
        assert_eq!(config.bar_spacing, 5.0);
        assert_eq!(config.bar_color, "#cafdff");
        assert_eq!(config.shadow_blur, 10.0);
        assert_eq!(config.shadow_color, "#ffffff");
        assert!(!config.autoplay);
        assert!(!config.loop_playback);
    }

    #[test]
    fn default_config_resolves() {
        let (style, layout) = VisualizerConfig::default().resolve().unwrap();
        assert_eq!(style, VisualStyle::Lounge);
        assert_eq!(layout.bar_width, 2.0);
        assert_eq!(layout.bar_color[3], 1.0);
    }

    #[test]
    fn unknown_style_fails_at_construction() {
        let config = VisualizerConfig {
            style: "plasma".to_string(),
            ..VisualizerConfig::default()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let config = VisualizerConfig {
            bar_width: 0.0,
            bar_spacing: 0.0,
            ..VisualizerConfig::default()
        };
        assert!(config.resolve().is_err());

        let config = VisualizerConfig {
            bar_width: -1.0,
            ..VisualizerConfig::default()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn hex_colors_parse_with_and_without_hash() {
        let c = parse_hex_color("#cafdff").unwrap();
        assert!((c[0] - 202.0 / 255.0).abs() < 1e-6);
        assert!((c[1] - 253.0 / 255.0).abs() < 1e-6);
        assert!((c[2] - 1.0).abs() < 1e-6);
        assert_eq!(c[3], 1.0);

        assert_eq!(parse_hex_color("000000").unwrap(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn malformed_colors_are_rejected() {
        for bad in ["", "#fff", "#gggggg", "#cafdff00", "white"] {
            assert!(parse_hex_color(bad).is_err(), "accepted '{}'", bad);
        }
    }

    #[test]
    fn preset_json_round() {
        let json = r#"{
            "audio_src": "track.mp3",
            "title": "Nightdrive",
            "author": "Someone",
            "autoplay": true,
            "loop": true,
            "bar_width": 3.0
        }"#;
        let config: VisualizerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.audio_src, PathBuf::from("track.mp3"));
        assert!(config.autoplay);
        assert!(config.loop_playback);
        assert_eq!(config.bar_width, 3.0);
        // unspecified fields keep their defaults
        assert_eq!(config.bar_spacing, 5.0);
        assert_eq!(config.style, "lounge");
    }
}
