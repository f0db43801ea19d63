use anyhow::Result;
use egui_wgpu::Renderer;
use egui_winit::State;
use wgpu::{CommandEncoder, Device, Queue, TextureView};
use winit::{event::WindowEvent, window::Window};

use crate::render::{LayoutConfig, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Horizontal nudge applied to all overlay text, matching the reference
/// visual layout.
const TEXT_CORRECTION: f32 = 10.0;

/// Per-frame overlay content.
pub struct Overlay<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub time: String,
    pub loading: bool,
}

/// Text overlay pass: track title above the ring center, author below it,
/// elapsed MM:SS underneath, or a loading notice while decoding. Runs as an
/// egui pass over the bar pipeline's output.
pub struct Hud {
    context: egui::Context,
    state: State,
    renderer: Renderer,
}

impl Hud {
    pub fn new(window: &Window, device: &Device, format: wgpu::TextureFormat) -> Self {
        let context = egui::Context::default();

        let state = State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
        );

        let renderer = Renderer::new(device, format, None, 1);

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) {
        let _ = self.state.on_window_event(window, event);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        device: &Device,
        queue: &Queue,
        window: &Window,
        overlay: &Overlay<'_>,
        layout: &LayoutConfig,
    ) -> Result<()> {
        let raw_input = self.state.take_egui_input(window);

        let full_output = self.context.run(raw_input, |ctx| {
            Self::overlay_content(ctx, overlay, layout);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        self.renderer
            .update_buffers(device, queue, encoder, &tris, &screen_descriptor);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hud render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        Ok(())
    }

    fn overlay_content(ctx: &egui::Context, overlay: &Overlay<'_>, layout: &LayoutConfig) {
        let color = text_color(layout.bar_color);
        let cx = CANVAS_WIDTH / 2.0 + TEXT_CORRECTION;
        let cy = CANVAS_HEIGHT / 2.0;

        if overlay.loading {
            Self::text_at(
                ctx,
                "vz-loading",
                egui::pos2(cx, cy),
                egui::Align2::CENTER_CENTER,
                "Loading...",
                layout.font_px,
                color,
            );
            return;
        }

        // title rides above center with a bigger face, author hangs below
        Self::text_at(
            ctx,
            "vz-title",
            egui::pos2(cx, cy),
            egui::Align2::CENTER_BOTTOM,
            overlay.title,
            layout.font_px + 8.0,
            color,
        );
        Self::text_at(
            ctx,
            "vz-author",
            egui::pos2(cx, cy),
            egui::Align2::CENTER_TOP,
            &format!("by {}", overlay.author),
            layout.font_px,
            color,
        );
        Self::text_at(
            ctx,
            "vz-time",
            egui::pos2(cx, cy + 40.0),
            egui::Align2::CENTER_CENTER,
            &overlay.time,
            layout.font_px,
            color,
        );
    }

    fn text_at(
        ctx: &egui::Context,
        id: &str,
        pos: egui::Pos2,
        pivot: egui::Align2,
        text: &str,
        size: f32,
        color: egui::Color32,
    ) {
        egui::Area::new(egui::Id::new(id))
            .fixed_pos(pos)
            .pivot(pivot)
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(text).size(size).color(color));
            });
    }
}

fn text_color(srgb: [f32; 4]) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (srgb[0] * 255.0).round() as u8,
        (srgb[1] * 255.0).round() as u8,
        (srgb[2] * 255.0).round() as u8,
        (srgb[3] * 255.0).round() as u8,
    )
}
