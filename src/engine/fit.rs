//! Interpolating cubic Bezier fit through an ordered point list.
//!
//! The points are treated as the knots of a natural cubic B-spline. Solving the tridiagonal knot
//! system recovers the B-spline nodes, and each span between two knots converts to one cubic Bezier
//! whose inner control points sit a third of the way between consecutive nodes. Consecutive segments
//! share their knot and their tangent there.

use crate::geom::Point;
use crate::util::Matrix;
pub use crate::util::SingularMatrix;
use glam::{DVec2, Vec3};
use thiserror::Error;

/// The fewest points the knot system accepts.
pub const MIN_FIT_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FitError {
	#[error("curve fitting needs at least {MIN_FIT_POINTS} points, got {count}")]
	InsufficientPoints { count: usize },
	#[error(transparent)]
	SingularMatrix(#[from] SingularMatrix),
}

static_assertions::assert_impl_all!(FitError: std::error::Error, Send, Sync);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSegment {
	pub p0: Point,
	pub p1: Point,
	pub p2: Point,
	pub p3: Point,
}

impl BezierSegment {
	pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
		Self { p0, p1, p2, p3 }
	}

	pub fn control_points(&self) -> [Point; 4] {
		[self.p0, self.p1, self.p2, self.p3]
	}

	/// Position at `t` in `[0, 1]`, in Bernstein form.
	pub fn evaluate(&self, t: f32) -> Point {
		let s = 1.0 - t;
		self.p0 * (s * s * s)
			+ self.p1 * (3.0 * s * s * t)
			+ self.p2 * (3.0 * s * t * t)
			+ self.p3 * (t * t * t)
	}

	pub fn derivative(&self, t: f32) -> Vec3 {
		let s = 1.0 - t;
		(self.p1 - self.p0) * (3.0 * s * s)
			+ (self.p2 - self.p1) * (6.0 * s * t)
			+ (self.p3 - self.p2) * (3.0 * t * t)
	}
}

fn planar(point: Point) -> DVec2 {
	point.truncate().as_dvec2()
}

/// Fits one segment per consecutive pair of `points`.
///
/// Segment end points are copied from the input, so the curve passes through every point exactly.
/// Only `x` and `y` are fit; each inner control point takes the `z` of the knot it is attached to.
pub fn fit_bezier_segments(points: &[Point]) -> Result<Vec<BezierSegment>, FitError> {
	let n = points.len();
	if n < MIN_FIT_POINTS {
		Err(FitError::InsufficientPoints { count: n })?;
	}

	let interior = n - 2;
	let c = Matrix::tridiagonal(interior, 4.0, 1.0);

	let mut s = Matrix::zeros(interior, 2);
	for row in 0..interior {
		let mut value = 6.0 * planar(points[row + 1]);
		if row == 0 {
			value -= planar(points[0]);
		}
		if row == interior - 1 {
			value -= planar(points[n - 1]);
		}
		s[(row, 0)] = value.x;
		s[(row, 1)] = value.y;
	}

	let b = &c.inverse()? * &s;

	// B-spline nodes, with the natural end condition pinning the outer nodes to the end points.
	let nodes: Vec<DVec2> = std::iter::once(planar(points[0]))
		.chain((0..interior).map(|row| DVec2::new(b[(row, 0)], b[(row, 1)])))
		.chain(std::iter::once(planar(points[n - 1])))
		.collect();

	let segments = points
		.windows(2)
		.zip(nodes.windows(2))
		.map(|(knots, nodes)| {
			let (start, end) = (knots[0], knots[1]);
			let d0 = nodes[0].lerp(nodes[1], 1.0 / 3.0).as_vec2();
			let d1 = nodes[0].lerp(nodes[1], 2.0 / 3.0).as_vec2();
			BezierSegment::new(start, d0.extend(start.z), d1.extend(end.z), end)
		})
		.collect();
	Ok(segments)
}
