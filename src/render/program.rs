//! The fixed interface between the geometry builders and the shaders in `crate::shaders`.
//!
//! Attribute locations here must match the `@location`s in the WGSL, and the uniform structs must
//! match its `struct` declarations field for field. `evaluate_vertex` and `segment_color` mirror the
//! vertex stage on the CPU.

use crate::engine::{FlatVertex, Material, StrokeVertex};
use crate::geom::PLANE_NORMAL;
use glam::{Mat4, Vec3, Vec4};

const MIN_NORMAL_LENGTH_SQUARED: f32 = 1e-20;

impl StrokeVertex {
	pub const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
		0 => Float32x3,
		1 => Float32x3,
		2 => Float32x3,
		3 => Float32x3,
		4 => Float32,
		5 => Float32,
		6 => Float32x2,
		7 => Uint32,
	];

	pub fn layout() -> wgpu::VertexBufferLayout<'static> {
		wgpu::VertexBufferLayout {
			array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
			step_mode: wgpu::VertexStepMode::Vertex,
			attributes: &Self::ATTRIBUTES,
		}
	}
}

impl FlatVertex {
	pub const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

	pub fn layout() -> wgpu::VertexBufferLayout<'static> {
		wgpu::VertexBufferLayout {
			array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
			step_mode: wgpu::VertexStepMode::Vertex,
			attributes: &Self::ATTRIBUTES,
		}
	}
}

/// Group 0, shared by every mesh.
#[derive(Debug, Clone, Copy, PartialEq, encase::ShaderType)]
pub struct CameraUniforms {
	pub view_projection: Mat4,
}

/// Group 1, one per mesh.
#[derive(Debug, Clone, Copy, PartialEq, encase::ShaderType)]
pub struct StrokeUniforms {
	pub color: Vec4,
	pub half_width: f32,
	/// Nonzero to color each Bezier segment by `segment_color`.
	pub segment_coloring: u32,
}

impl StrokeUniforms {
	pub fn new(material: &Material) -> Self {
		Self {
			color: material.color,
			half_width: material.half_width,
			segment_coloring: material.segment_coloring.into(),
		}
	}
}

fn ribbon_normal(tangent: Vec3, chord: Vec3) -> Vec3 {
	[tangent, chord]
		.into_iter()
		.map(|direction| direction.cross(PLANE_NORMAL))
		.find(|normal| normal.length_squared() > MIN_NORMAL_LENGTH_SQUARED)
		.map_or(Vec3::ZERO, Vec3::normalize)
}

/// Where the vertex stage places `vertex`, in plane-local coordinates.
pub fn evaluate_vertex(vertex: &StrokeVertex, half_width: f32) -> Vec3 {
	if vertex.is_end_cap() {
		let offset = (vertex.uv - 0.5) * 2.0 * half_width;
		return vertex.position + offset.extend(0.0);
	}
	let segment = vertex.segment();
	let point = segment.evaluate(vertex.t);
	let tangent = segment.derivative(vertex.t);
	let normal = ribbon_normal(tangent, segment.p3 - segment.p0);
	point + normal * ((vertex.uv.x - 0.5) * 2.0 * half_width)
}

/// Debug color for the segment at `index` within its chunk.
pub fn segment_color(index: u32) -> Vec4 {
	let hash = index.wrapping_mul(2654435761);
	let channel = |shift: u32| ((hash >> shift) & 255) as f32 / 255.0;
	let rgb = Vec3::new(channel(24), channel(16), channel(8));
	(0.25 + 0.75 * rgb).extend(1.0)
}
