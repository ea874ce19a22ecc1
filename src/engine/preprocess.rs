//! Filters applied to the raw sample stream before fitting. Both keep the first and last point.

use crate::geom::Point;
use glam::Vec2;

/// Centered moving average over `window` samples (odd). The window shrinks symmetrically near the
/// ends and the end points themselves are left untouched. Only `x` and `y` are averaged.
pub fn smooth_jitter(points: &[Point], window: usize) -> Vec<Point> {
	let n = points.len();
	let half = window / 2;
	if n <= 2 || half == 0 {
		return points.to_vec();
	}

	let mut smoothed = Vec::with_capacity(n);
	smoothed.push(points[0]);
	for i in 1..n - 1 {
		let radius = half.min(i).min(n - 1 - i);
		let neighborhood = &points[i - radius..=i + radius];
		let sum: Vec2 = neighborhood.iter().map(|p| p.truncate()).sum();
		let mean = sum / neighborhood.len() as f32;
		smoothed.push(mean.extend(points[i].z));
	}
	smoothed.push(points[n - 1]);
	smoothed
}

/// Drops points closer than `min_distance` (in the plane) to the previously kept point. The last
/// point always survives, replacing a crowded predecessor unless that predecessor is the first.
pub fn filter_world_distance(points: &[Point], min_distance: f32) -> Vec<Point> {
	let Some((&last, rest)) = points.split_last() else {
		return Vec::new();
	};
	let Some((&first, interior)) = rest.split_first() else {
		return vec![last];
	};

	let min_distance_squared = min_distance * min_distance;
	let far_enough =
		|a: Point, b: Point| a.truncate().distance_squared(b.truncate()) > min_distance_squared;

	let mut kept = vec![first];
	for &point in interior {
		if far_enough(point, kept[kept.len() - 1]) {
			kept.push(point);
		}
	}
	if kept.len() > 1 && !far_enough(last, kept[kept.len() - 1]) {
		kept.pop();
	}
	kept.push(last);
	kept
}

/// Screen-space spacing filter used while samples are arriving.
#[derive(Debug, Clone)]
pub struct DensityFilter {
	min_pixel_distance: f32,
	last_accepted: Option<Vec2>,
}

impl DensityFilter {
	pub fn new(min_pixel_distance: f32) -> Self {
		Self {
			min_pixel_distance,
			last_accepted: None,
		}
	}

	/// Returns whether a sample at pixel position `screen` should be kept. The first sample always is.
	pub fn accept(&mut self, screen: Vec2) -> bool {
		let accepted = match self.last_accepted {
			Some(last) => last.distance(screen) > self.min_pixel_distance,
			None => true,
		};
		if accepted {
			self.last_accepted = Some(screen);
		}
		accepted
	}

	pub fn reset(&mut self) {
		self.last_accepted = None;
	}
}
