use std::f32::consts::PI;

use super::{BarCommand, LayoutConfig};
use crate::audio::FrequencyFrame;

/// Ring radius of the bar layout, in canvas units.
pub const RADIUS: f32 = 140.0;

/// How many bars fit the ring, how many are actually drawn, and the
/// stride through the frequency bins. Recomputed on every render so layout
/// changes take effect immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    pub max_bars: usize,
    pub bar_count: usize,
    pub freq_step: usize,
}

pub fn bar_layout(layout: &LayoutConfig, bin_count: usize) -> BarLayout {
    let pitch = layout.bar_width + layout.bar_spacing;
    if pitch <= 0.0 {
        return BarLayout {
            max_bars: 0,
            bar_count: 0,
            freq_step: 0,
        };
    }

    let max_bars = ((RADIUS * 2.0 * PI) / pitch).floor() as usize;
    let sliced = max_bars * 25 / 100;
    let bar_count = max_bars - sliced;
    let freq_step = if max_bars == 0 { 0 } else { bin_count / max_bars };

    BarLayout {
        max_bars,
        bar_count,
        freq_step,
    }
}

/// Radial bar-graph mapping of one frequency frame.
///
/// Bars sit on a ring of radius [`RADIUS`] around the canvas center; a
/// quarter of the ring positions are deliberately left empty, producing a
/// gap arc. Each bar reads one bin by stride sampling (no averaging) and
/// grows both inward and outward with amplitude. The angular offset `beta`
/// is a calibration constant kept for visual compatibility.
pub fn render(
    frame: &FrequencyFrame,
    layout: &LayoutConfig,
    canvas: (f32, f32),
) -> Vec<BarCommand> {
    let bars = bar_layout(layout, frame.len());
    if bars.max_bars == 0 {
        return Vec::new();
    }

    let cx = canvas.0 / 2.0;
    let cy = canvas.1 / 2.0;
    let origin = [cx + layout.bar_spacing, cy + layout.bar_spacing];
    let beta = (3.0 * 45.0 - layout.bar_width) * PI / 180.0;

    (0..bars.bar_count)
        .map(|i| {
            let amplitude = frame.bins[i * bars.freq_step] as f32;
            let alfa = i as f32 * 2.0 * PI / bars.max_bars as f32;

            BarCommand {
                origin,
                rotation: alfa - beta,
                x: 0.0,
                y: RADIUS - (amplitude / 12.0 - layout.bar_height),
                w: layout.bar_width,
                h: amplitude / 6.0 + layout.bar_height,
            }
        })
        .collect()
}
