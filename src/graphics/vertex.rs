use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::render::{BarCommand, LayoutConfig};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Expand bar commands into canvas-space triangles: a soft shadow underlay
/// quad per bar (approximating the original canvas shadow blur), then the
/// bar itself. Vertex colors are linearized for the sRGB surface.
pub fn tessellate(commands: &[BarCommand], layout: &LayoutConfig, out: &mut Vec<Vertex>) {
    out.clear();

    let bar_color = linear_color(layout.bar_color);
    let spread = layout.shadow_blur * 0.5;
    let shadow_color = {
        let mut c = linear_color(layout.shadow_color);
        c[3] *= 0.35;
        c
    };

    for cmd in commands {
        if spread > 0.0 {
            push_rect(
                out,
                cmd,
                cmd.x - spread,
                cmd.y - spread,
                cmd.w + spread * 2.0,
                cmd.h + spread * 2.0,
                shadow_color,
            );
        }
        push_rect(out, cmd, cmd.x, cmd.y, cmd.w, cmd.h, bar_color);
    }
}

fn push_rect(
    out: &mut Vec<Vertex>,
    cmd: &BarCommand,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    color: [f32; 4],
) {
    let origin = Vec2::from(cmd.origin);
    let rot = Vec2::from_angle(cmd.rotation);
    let corner = |px: f32, py: f32| -> [f32; 2] {
        let p = origin + rot.rotate(Vec2::new(px, py));
        [p.x, p.y]
    };

    let tl = corner(x, y);
    let tr = corner(x + w, y);
    let br = corner(x + w, y + h);
    let bl = corner(x, y + h);

    for position in [tl, tr, br, tl, br, bl] {
        out.push(Vertex { position, color });
    }
}

fn linear_color(srgb: [f32; 4]) -> [f32; 4] {
    [
        srgb_to_linear(srgb[0]),
        srgb_to_linear(srgb[1]),
        srgb_to_linear(srgb[2]),
        srgb[3],
    ]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_command() -> BarCommand {
        BarCommand {
            origin: [100.0, 100.0],
            rotation: 0.0,
            x: 0.0,
            y: 10.0,
            w: 2.0,
            h: 20.0,
        }
    }

    #[test]
    fn twelve_vertices_per_bar_with_shadow() {
        let layout = LayoutConfig::default();
        let mut out = Vec::new();
        tessellate(&[flat_command(), flat_command()], &layout, &mut out);
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn six_vertices_per_bar_without_shadow() {
        let layout = LayoutConfig {
            shadow_blur: 0.0,
            ..LayoutConfig::default()
        };
        let mut out = Vec::new();
        tessellate(&[flat_command()], &layout, &mut out);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn unrotated_rect_lands_at_origin_offset() {
        let layout = LayoutConfig {
            shadow_blur: 0.0,
            ..LayoutConfig::default()
        };
        let mut out = Vec::new();
        tessellate(&[flat_command()], &layout, &mut out);

        // top-left corner: origin + (x, y)
        assert_eq!(out[0].position, [100.0, 110.0]);
        // bottom-right corner: origin + (x + w, y + h)
        assert_eq!(out[2].position, [102.0, 130.0]);
    }

    #[test]
    fn half_turn_mirrors_through_the_origin() {
        let layout = LayoutConfig {
            shadow_blur: 0.0,
            ..LayoutConfig::default()
        };
        let cmd = BarCommand {
            rotation: std::f32::consts::PI,
            ..flat_command()
        };
        let mut out = Vec::new();
        tessellate(&[cmd], &layout, &mut out);

        let [px, py] = out[0].position;
        assert!((px - 100.0).abs() < 1e-4);
        assert!((py - 90.0).abs() < 1e-4);
    }

    #[test]
    fn srgb_linearization_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }
}
