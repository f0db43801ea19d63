pub mod lounge;

use anyhow::{bail, Result};

use crate::audio::FrequencyFrame;

/// Logical drawing surface, fixed regardless of window size.
pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 400.0;

/// Resolved visual parameters, immutable after construction. Colors are
/// sRGB components in 0..=1.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub bar_width: f32,
    pub bar_height: f32,
    pub bar_spacing: f32,
    pub bar_color: [f32; 4],
    pub shadow_blur: f32,
    pub shadow_color: [f32; 4],
    pub font_px: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bar_width: 2.0,
            bar_height: 2.0,
            bar_spacing: 5.0,
            // #cafdff
            bar_color: [0xca as f32 / 255.0, 0xfd as f32 / 255.0, 1.0, 1.0],
            shadow_blur: 10.0,
            shadow_color: [1.0, 1.0, 1.0, 1.0],
            font_px: 12.0,
        }
    }
}

/// One filled rectangle in its own translated+rotated frame. Commands are
/// independent: every bar carries its full transform, nothing accumulates
/// from one command to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarCommand {
    /// Canvas-space translation applied before the rotation.
    pub origin: [f32; 2],
    /// Rotation around the origin, radians, canvas orientation (y down).
    pub rotation: f32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Visualization style, resolved once at construction. Unrecognized tags
/// are a configuration error, not a silent no-op at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualStyle {
    Lounge,
}

impl VisualStyle {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "lounge" => Ok(VisualStyle::Lounge),
            other => bail!("unrecognized visualization style '{}'", other),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            VisualStyle::Lounge => "lounge",
        }
    }

    /// Map one frequency frame onto draw commands for one rendered frame.
    pub fn render(
        &self,
        frame: &FrequencyFrame,
        layout: &LayoutConfig,
        canvas: (f32, f32),
    ) -> Vec<BarCommand> {
        match self {
            VisualStyle::Lounge => lounge::render(frame, layout, canvas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lounge_tag_resolves() {
        assert_eq!(VisualStyle::from_tag("lounge").unwrap(), VisualStyle::Lounge);
        assert_eq!(VisualStyle::Lounge.tag(), "lounge");
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert!(VisualStyle::from_tag("disco").is_err());
        assert!(VisualStyle::from_tag("").is_err());
        // tags are case-sensitive
        assert!(VisualStyle::from_tag("Lounge").is_err());
    }

    #[test]
    fn style_dispatch_reaches_the_renderer() {
        let frame = FrequencyFrame::default();
        let layout = LayoutConfig::default();
        let commands =
            VisualStyle::Lounge.render(&frame, &layout, (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(!commands.is_empty());
    }
}
