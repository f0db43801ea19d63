pub mod engine;
pub mod vertex;

pub use engine::GraphicsEngine;
pub use vertex::{tessellate, Vertex};
