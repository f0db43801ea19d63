use anyhow::Result;
use std::time::Instant;
use winit::window::Window;

use crate::audio::{PlaybackController, PlaybackState};
use crate::graphics::GraphicsEngine;
use crate::hud::{Hud, Overlay};
use crate::render::{LayoutConfig, VisualStyle, CANVAS_HEIGHT, CANVAS_WIDTH};

/// One tick per display refresh, scheduled by the window's continuous
/// redraw loop.
///
/// The loop itself lives exactly as long as the window, so teardown cancels
/// it; a tick outside the Playing state skips spectral analysis (the
/// controller hands back a held or silent frame) and only repaints the ring
/// and overlay.
pub struct FrameScheduler {
    style: VisualStyle,
    layout: LayoutConfig,
    title: String,
    author: String,
}

impl FrameScheduler {
    pub fn new(style: VisualStyle, layout: LayoutConfig, title: String, author: String) -> Self {
        Self {
            style,
            layout,
            title,
            author,
        }
    }

    /// Clear, sample, overlay, render.
    pub fn tick(
        &mut self,
        controller: &mut PlaybackController,
        engine: &mut GraphicsEngine,
        hud: &mut Hud,
        window: &Window,
    ) -> Result<()> {
        controller.update(Instant::now());

        let frame = controller.sample_frame();
        let commands = self
            .style
            .render(&frame, &self.layout, (CANVAS_WIDTH, CANVAS_HEIGHT));

        let overlay = Overlay {
            title: &self.title,
            author: &self.author,
            time: controller.time_display(),
            loading: controller.state() == PlaybackState::Loading,
        };

        engine.render(&commands, &self.layout, hud, &overlay, window)
    }
}
