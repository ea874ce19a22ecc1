use super::{CurveGeometry, FlatGeometry};
use glam::Vec4;
use std::fmt::Debug;
use std::hash::Hash;

/// Geometry handed to a scene for upload.
#[derive(Debug, Clone, Copy)]
pub enum Geometry<'a> {
	/// Curve ribbon evaluated per vertex on the GPU.
	Curve(&'a CurveGeometry),
	/// Pre-positioned triangles: preview ribbons, discs and debug markers.
	Flat(&'a FlatGeometry),
}

impl Geometry<'_> {
	pub fn vertex_count(&self) -> usize {
		match self {
			Geometry::Curve(g) => g.vertices.len(),
			Geometry::Flat(g) => g.vertices.len(),
		}
	}

	pub fn index_count(&self) -> usize {
		match self {
			Geometry::Curve(g) => g.indices.len(),
			Geometry::Flat(g) => g.indices.len(),
		}
	}
}

/// Per-mesh shading parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
	pub color: Vec4,
	pub half_width: f32,
	/// Draw order, lowest first.
	pub z_index: u64,
	/// Replace the uniform color with a color per Bezier segment.
	pub segment_coloring: bool,
}

/// The container strokes are drawn into.
///
/// Each `add` allocates GPU resources owned by the scene until the returned handle is passed to
/// `remove`. Handles are never reused while alive, and every handle must be removed exactly once.
pub trait Scene {
	type Handle: Copy + Eq + Hash + Debug;

	fn add(&mut self, geometry: Geometry<'_>, material: &Material) -> Self::Handle;

	fn remove(&mut self, handle: Self::Handle);
}
