//! Circular bar-graph audio visualizer.
//!
//! Plays an audio file through rodio while rendering its frequency spectrum
//! as a radial ring of bars, with a title/author/elapsed-time overlay. The
//! analysis and rendering core is pure and lives in [`audio`] and [`render`];
//! the wgpu/egui display backend consumes the draw commands it produces.

pub mod audio;
pub mod config;
pub mod graphics;
pub mod hud;
pub mod render;
pub mod scheduler;
