use super::chunk::chunk_ranges;
use super::fit::{fit_bezier_segments, BezierSegment, FitError};
use super::preprocess::{filter_world_distance, smooth_jitter, DensityFilter};
use super::tessellate::Caps;
use crate::config::{PipelineConfig, StrokeOptions};
use crate::geom::{Point, View};
use crate::util::ResultExt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("stroke#{_0}")]
pub struct StrokeId(pub(crate) u64);

/// An overlapping window of a stroke's points, fit and drawn as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
	pub range: Range<usize>,
	pub segments: Vec<BezierSegment>,
	pub caps: Caps,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStats {
	pub total_points: usize,
	pub chunk_count: usize,
	pub total_segments: usize,
	pub avg_points_per_chunk: f32,
	pub avg_segments_per_chunk: f32,
}

#[derive(Debug, Clone)]
pub struct Stroke {
	pub(crate) id: StrokeId,
	pub(crate) points: Vec<Point>,
	pub(crate) options: StrokeOptions,
	pub(crate) z_index: u64,
	pub(crate) chunks: Vec<Chunk>,
	pub(crate) complete: bool,
}

impl Stroke {
	pub fn id(&self) -> StrokeId {
		self.id
	}

	pub fn points(&self) -> &[Point] {
		&self.points
	}

	pub fn options(&self) -> &StrokeOptions {
		&self.options
	}

	pub fn z_index(&self) -> u64 {
		self.z_index
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	/// Whether every chunk fit. A failed chunk leaves a gap in the drawn stroke.
	pub fn is_complete(&self) -> bool {
		self.complete
	}

	pub fn segments(&self) -> impl Iterator<Item = &BezierSegment> {
		self.chunks.iter().flat_map(|c| c.segments.iter())
	}

	pub fn stats(&self) -> StrokeStats {
		let chunk_count = self.chunks.len();
		let chunk_points: usize = self.chunks.iter().map(|c| c.range.len()).sum();
		let total_segments = self.segments().count();
		let average = |total: usize| {
			if chunk_count == 0 {
				0.0
			} else {
				total as f32 / chunk_count as f32
			}
		};
		StrokeStats {
			total_points: self.points.len(),
			chunk_count,
			total_segments,
			avg_points_per_chunk: average(chunk_points),
			avg_segments_per_chunk: average(total_segments),
		}
	}

	/// Recomputes the chunks from the current points.
	pub(crate) fn rebuild_chunks(&mut self, config: &PipelineConfig) {
		let (chunks, complete) = build_chunks(&self.points, config);
		self.chunks = chunks;
		self.complete = complete;
	}
}

/// Chunks `points` and fits each chunk. A chunk whose fit fails keeps an empty segment list.
pub fn build_chunks(points: &[Point], config: &PipelineConfig) -> (Vec<Chunk>, bool) {
	build_chunks_with(points, config, fit_bezier_segments)
}

/// [`build_chunks`] with the per-chunk fit supplied by the caller.
pub fn build_chunks_with(
	points: &[Point],
	config: &PipelineConfig,
	fit: impl Fn(&[Point]) -> Result<Vec<BezierSegment>, FitError>,
) -> (Vec<Chunk>, bool) {
	let ranges = chunk_ranges(points.len(), &config.chunk);
	let last = ranges.len().saturating_sub(1);
	let mut complete = true;
	let chunks = ranges
		.into_iter()
		.enumerate()
		.map(|(index, range)| {
			let _span = tracing::debug_span!("chunk", ?range).entered();
			let result = fit(&points[range.clone()]);
			let segments = match result {
				Err(FitError::InsufficientPoints { .. }) => result.ok_or_warn(),
				_ => result.ok_or_log(),
			};
			complete &= segments.is_some();
			let segments = segments.unwrap_or_default();
			let caps = Caps {
				start: (index == 0).then(|| points[0]),
				end: (index == last).then(|| points[points.len() - 1]),
			};
			Chunk {
				range,
				segments,
				caps,
			}
		})
		.collect();
	(chunks, complete)
}

/// Samples collected while the pointer is down.
///
/// Every sample goes into the display list that feeds the live preview. Only samples far enough
/// apart on screen are marked for fitting, so the fit stays sparse while the feedback stays dense.
#[derive(Debug, Clone)]
pub struct ActiveStroke {
	display: Vec<Point>,
	fit_indices: Vec<usize>,
	density: DensityFilter,
	smoothing_window: usize,
	min_world_distance: f32,
}

impl ActiveStroke {
	pub fn start(point: Point, view: &impl View, config: &PipelineConfig) -> Self {
		let mut stroke = Self {
			display: Vec::new(),
			fit_indices: Vec::new(),
			density: DensityFilter::new(config.min_pixel_distance),
			smoothing_window: config.smoothing_window,
			min_world_distance: config.min_world_distance,
		};
		stroke.add_point(point, view);
		stroke
	}

	pub fn add_point(&mut self, point: Point, view: &impl View) {
		if self.density.accept(view.to_screen(point)) {
			self.fit_indices.push(self.display.len());
		}
		self.display.push(point);
	}

	pub fn display_points(&self) -> &[Point] {
		&self.display
	}

	pub fn fit_points(&self) -> impl Iterator<Item = Point> + '_ {
		self.fit_indices.iter().map(|&i| self.display[i])
	}

	/// Ends the stroke and returns the points to fit.
	///
	/// The stroke ends at the final sample, or, if the pointer `left_surface`, at the sample before
	/// it unless that would leave fewer than two. The result is smoothed and then thinned in world
	/// space.
	pub fn finish(self, left_surface: bool) -> Vec<Point> {
		let Some(mut end) = self.display.len().checked_sub(1) else {
			return Vec::new();
		};
		// Dropping the final sample must still leave a start and an end.
		if left_surface && end > 1 {
			end -= 1;
		}
		let mut points: Vec<Point> = self
			.fit_indices
			.iter()
			.take_while(|&&i| i < end)
			.map(|&i| self.display[i])
			.collect();
		points.push(self.display[end]);

		let points = smooth_jitter(&points, self.smoothing_window);
		filter_world_distance(&points, self.min_world_distance)
	}
}
