//! Straight polyline ribbons for feedback while a stroke is being drawn or transformed.
//!
//! These meshes are rebuilt from scratch on every input event, so they skip curve fitting entirely.

use crate::geom::Point;
use glam::{Vec2, Vec3};
use itertools::Itertools;

/// Tangents shorter than this keep the previous direction.
const MIN_TANGENT_LENGTH: f32 = 1e-12;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlatVertex {
	pub position: Vec3,
}

static_assertions::assert_eq_size!(FlatVertex, [u8; 12]);

/// Already-positioned triangles, drawn without any per-vertex curve evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGeometry {
	pub vertices: Vec<FlatVertex>,
	pub indices: Vec<u32>,
}

impl FlatGeometry {
	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
		self.vertices.iter().map(|v| v.position)
	}
}

/// A filled regular polygon approximating a disc, as a triangle fan around its center.
pub fn disc(center: Point, radius: f32, segments: u32) -> FlatGeometry {
	let segments = segments.max(3);
	let mut vertices = Vec::with_capacity(segments as usize + 1);
	vertices.push(FlatVertex { position: center });
	for i in 0..segments {
		let angle = std::f32::consts::TAU * i as f32 / segments as f32;
		let offset = radius * Vec2::from_angle(angle);
		vertices.push(FlatVertex {
			position: center + offset.extend(0.0),
		});
	}
	let indices = (0..segments)
		.flat_map(|i| [0, i + 1, (i + 1) % segments + 1])
		.collect();
	FlatGeometry { vertices, indices }
}

/// Estimates a unit tangent per point: forward difference at the start, backward difference at the
/// end, central difference in between. Degenerate tangents reuse the previous direction.
fn tangents(points: &[Point]) -> Vec<Vec2> {
	let n = points.len();
	let mut previous = Vec2::X;
	(0..n)
		.map(|i| {
			let before = points[i.saturating_sub(1)].truncate();
			let after = points[(i + 1).min(n - 1)].truncate();
			let difference = after - before;
			if difference.length() > MIN_TANGENT_LENGTH {
				previous = difference.normalize();
			}
			previous
		})
		.collect()
}

/// Builds a ribbon of total width `2 * half_width` through `points`. A single point yields a disc.
pub fn build_ribbon(
	points: impl IntoIterator<Item = Point>,
	half_width: f32,
	disc_segments: u32,
) -> FlatGeometry {
	let points = points.into_iter().collect_vec();
	match points.len() {
		0 => FlatGeometry::default(),
		1 => disc(points[0], half_width, disc_segments),
		n => {
			let mut vertices = Vec::with_capacity(2 * n);
			for (point, tangent) in points.iter().zip(tangents(&points)) {
				let normal = (half_width * tangent.perp()).extend(0.0);
				vertices.push(FlatVertex {
					position: *point - normal,
				});
				vertices.push(FlatVertex {
					position: *point + normal,
				});
			}
			let indices = (0..n as u32 - 1)
				.flat_map(|i| {
					let base = 2 * i;
					[base, base + 1, base + 2, base + 1, base + 3, base + 2]
				})
				.collect();
			FlatGeometry { vertices, indices }
		}
	}
}

/// Everything drawn for an in-progress or transformed stroke.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewGeometry {
	pub ribbon: FlatGeometry,
	pub start_cap: Option<FlatGeometry>,
	pub end_cap: Option<FlatGeometry>,
}

impl PreviewGeometry {
	/// Builds the ribbon plus round caps tracking the first and last point. Both the live drawing
	/// path and the drag/scale path go through here, differing only in the points they supply.
	pub fn build(points: impl IntoIterator<Item = Point>, half_width: f32, disc_segments: u32) -> Self {
		let points = points.into_iter().collect_vec();
		let ribbon = build_ribbon(points.iter().copied(), half_width, disc_segments);
		let (start_cap, end_cap) = if points.len() > 1 {
			let cap = |p: Point| Some(disc(p, half_width, disc_segments));
			(cap(points[0]), cap(points[points.len() - 1]))
		} else {
			(None, None)
		};
		Self {
			ribbon,
			start_cap,
			end_cap,
		}
	}

	pub fn meshes(&self) -> impl Iterator<Item = &FlatGeometry> {
		std::iter::once(&self.ribbon)
			.chain(self.start_cap.as_ref())
			.chain(self.end_cap.as_ref())
			.filter(|g| !g.is_empty())
	}
}
