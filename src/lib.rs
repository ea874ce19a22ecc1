//! Freehand stroke capture, cubic Bezier fitting and GPU tessellation.
//!
//! Pointer samples flow through [`engine::ActiveStroke`] while drawing, are fit into chunked Bezier
//! segments by [`engine::StrokeStore`], and are drawn through an [`engine::Scene`], of which
//! [`render::WgpuScene`] is the wgpu implementation.

pub(crate) mod util;

pub mod config;
pub mod engine;
pub mod geom;
pub mod render;
pub mod shaders;

mod wgpu_context;
pub use wgpu_context::*;

#[cfg(test)]
pub mod test;
