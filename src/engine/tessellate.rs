use super::fit::BezierSegment;
use crate::config::LodConfig;
use crate::geom::Point;
use glam::{Vec2, Vec3};

/// One vertex of the curve ribbon as laid out in the GPU vertex buffer.
///
/// `position` is the segment's start point for every vertex of that segment, not the point on the
/// curve. The vertex shader evaluates the curve from `control1`, `control2`, `end` and `t`. For end
/// cap vertices `position` is the cap center and `uv` the quad corner.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StrokeVertex {
	pub position: Vec3,
	pub control1: Vec3,
	pub control2: Vec3,
	pub end: Vec3,
	pub t: f32,
	pub is_end_cap: f32,
	/// `x` is the ribbon side (0 or 1), `y` repeats `t`.
	pub uv: Vec2,
	/// Index of the segment within its chunk, used only by the debug coloring.
	pub segment: u32,
}

static_assertions::assert_eq_size!(StrokeVertex, [u8; 68]);

impl StrokeVertex {
	fn ribbon(segment: &BezierSegment, index: u32, t: f32, side: f32) -> Self {
		Self {
			position: segment.p0,
			control1: segment.p1,
			control2: segment.p2,
			end: segment.p3,
			t,
			is_end_cap: 0.0,
			uv: Vec2::new(side, t),
			segment: index,
		}
	}

	fn cap(center: Point, corner: Vec2) -> Self {
		Self {
			position: center,
			control1: center,
			control2: center,
			end: center,
			t: 0.0,
			is_end_cap: 1.0,
			uv: corner,
			segment: 0,
		}
	}

	pub fn is_end_cap(&self) -> bool {
		self.is_end_cap != 0.0
	}

	pub fn segment(&self) -> BezierSegment {
		BezierSegment::new(self.position, self.control1, self.control2, self.end)
	}
}

/// Where round caps go for a chunk. Caps sit at the stroke's true end points, which need not be
/// the chunk's own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Caps {
	pub start: Option<Point>,
	pub end: Option<Point>,
}

impl Caps {
	pub fn count(&self) -> usize {
		self.start.is_some() as usize + self.end.is_some() as usize
	}
}

/// Vertex and index data for one chunk of the curve ribbon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveGeometry {
	pub vertices: Vec<StrokeVertex>,
	pub indices: Vec<u32>,
}

impl CurveGeometry {
	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	pub fn cap_vertices(&self) -> impl Iterator<Item = &StrokeVertex> {
		self.vertices.iter().filter(|v| v.is_end_cap())
	}
}

/// Subdivision count for the given zoom, growing linearly with zoom between the configured bounds.
/// Infinite zooms saturate at a bound; NaN is treated as no zoom.
pub fn subdivisions_for_zoom(zoom_factor: f32, lod: &LodConfig) -> u32 {
	let base = lod.base_subdivisions as f32;
	let max = lod.max_subdivisions as f32;
	let zoom = if zoom_factor.is_nan() { 1.0 } else { zoom_factor };
	let scaled = (base * zoom.min(max / base)).round();
	(scaled.max(0.0) as u32).clamp(lod.base_subdivisions, lod.max_subdivisions)
}

const CAP_CORNERS: [Vec2; 4] = [
	Vec2::new(0.0, 0.0),
	Vec2::new(1.0, 0.0),
	Vec2::new(1.0, 1.0),
	Vec2::new(0.0, 1.0),
];

/// Emits `subdivisions` parameter steps per segment, two vertices per step, followed by one quad
/// per requested cap.
pub fn tessellate_chunk(segments: &[BezierSegment], subdivisions: u32, caps: Caps) -> CurveGeometry {
	debug_assert!(subdivisions >= 2);
	let steps = subdivisions as usize;
	let mut vertices = Vec::with_capacity(segments.len() * steps * 2 + 4 * caps.count());
	let mut indices = Vec::with_capacity(segments.len() * (steps - 1) * 6 + 6 * caps.count());

	let last_step = (subdivisions - 1) as f32;
	for (index, segment) in segments.iter().enumerate() {
		let first = vertices.len() as u32;
		for i in 0..subdivisions {
			let t = i as f32 / last_step;
			vertices.push(StrokeVertex::ribbon(segment, index as u32, t, 0.0));
			vertices.push(StrokeVertex::ribbon(segment, index as u32, t, 1.0));
		}
		for i in 0..subdivisions - 1 {
			let base = first + 2 * i;
			indices.extend([base, base + 1, base + 2, base + 1, base + 3, base + 2]);
		}
	}

	for center in [caps.start, caps.end].into_iter().flatten() {
		let base = vertices.len() as u32;
		vertices.extend(CAP_CORNERS.map(|corner| StrokeVertex::cap(center, corner)));
		indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
	}

	CurveGeometry { vertices, indices }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::fit::fit_bezier_segments;
	use glam::vec3;

	fn example_segments() -> Vec<BezierSegment> {
		fit_bezier_segments(&[
			vec3(0.0, 0.0, 0.0),
			vec3(1.0, 0.0, 0.0),
			vec3(2.0, 1.0, 0.0),
			vec3(3.0, 1.0, 0.0),
			vec3(4.0, 0.0, 0.0),
		])
		.unwrap()
	}

	#[test]
	fn subdivisions() {
		let lod = LodConfig::default();
		assert_eq!(subdivisions_for_zoom(1.0, &lod), 20);
		assert_eq!(subdivisions_for_zoom(0.25, &lod), 20);
		assert_eq!(subdivisions_for_zoom(2.5, &lod), 50);
		assert_eq!(subdivisions_for_zoom(10.0, &lod), 200);
		assert_eq!(subdivisions_for_zoom(1000.0, &lod), 200);
		assert_eq!(subdivisions_for_zoom(f32::INFINITY, &lod), 200);
		assert_eq!(subdivisions_for_zoom(f32::NEG_INFINITY, &lod), 20);
		assert_eq!(subdivisions_for_zoom(f32::NAN, &lod), 20);
	}

	#[test]
	fn vertex_count_law() {
		let segments = example_segments();
		for subdivisions in [2, 3, 20, 57] {
			for caps in [
				Caps::default(),
				Caps {
					start: Some(Vec3::ZERO),
					end: None,
				},
				Caps {
					start: Some(Vec3::ZERO),
					end: Some(Vec3::X),
				},
			] {
				let s = segments.len();
				let n = subdivisions as usize;
				let geometry = tessellate_chunk(&segments, subdivisions, caps);
				assert_eq!(geometry.vertices.len(), s * n * 2 + 4 * caps.count());
				assert_eq!(geometry.indices.len(), s * (n - 1) * 6 + 6 * caps.count());
				assert_eq!(geometry.cap_vertices().count(), 4 * caps.count());
				let vertex_count = geometry.vertices.len() as u32;
				assert!(geometry.indices.iter().all(|&i| i < vertex_count));
			}
		}
	}

	#[test]
	fn vertices_carry_raw_control_points() {
		let segments = example_segments();
		let geometry = tessellate_chunk(&segments, 4, Caps::default());
		for (index, vertices) in geometry.vertices.chunks(8).enumerate() {
			let segment = &segments[index];
			let expected_t = [0.0, 0.0, 1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 1.0, 1.0];
			for (vertex, t) in vertices.iter().zip(expected_t) {
				assert_eq!(vertex.segment(), *segment);
				assert_eq!(vertex.position, segment.p0);
				assert_eq!(vertex.segment, index as u32);
				approx::assert_abs_diff_eq!(vertex.t, t);
				assert_eq!(vertex.uv.y, vertex.t);
				assert!(!vertex.is_end_cap());
			}
			assert_eq!(vertices[0].uv.x, 0.0);
			assert_eq!(vertices[1].uv.x, 1.0);
		}
	}

	#[test]
	fn caps_anchor_at_given_points() {
		let segments = example_segments();
		let caps = Caps {
			start: Some(vec3(-1.0, -1.0, 0.0)),
			end: Some(vec3(5.0, 5.0, 0.0)),
		};
		let geometry = tessellate_chunk(&segments, 2, caps);
		let cap_vertices: Vec<_> = geometry.cap_vertices().collect();
		assert!(cap_vertices[..4].iter().all(|v| v.position == vec3(-1.0, -1.0, 0.0)));
		assert!(cap_vertices[4..].iter().all(|v| v.position == vec3(5.0, 5.0, 0.0)));
		let corners: Vec<_> = cap_vertices[..4].iter().map(|v| v.uv).collect();
		assert_eq!(corners, CAP_CORNERS.to_vec());
	}

	#[test]
	fn empty_segments() {
		let geometry = tessellate_chunk(&[], 20, Caps::default());
		assert!(geometry.is_empty());
		assert!(geometry.vertices.is_empty());
	}
}
