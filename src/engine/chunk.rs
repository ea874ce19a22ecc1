use super::fit::MIN_FIT_POINTS;
use crate::config::ChunkConfig;
use std::ops::Range;

/// Splits `len` points into overlapping windows of at most `config.window` points.
///
/// Consecutive windows share `config.overlap` points. A trailing window with fewer than
/// `MIN_FIT_POINTS` points is dropped, which can only happen when the overlap is below 3.
pub fn chunk_ranges(len: usize, config: &ChunkConfig) -> Vec<Range<usize>> {
	let ChunkConfig { window, overlap } = *config;
	debug_assert!(window > overlap, "chunk windows must advance");

	let mut ranges = Vec::new();
	let mut start = 0;
	loop {
		let end = (start + window).min(len);
		if end - start >= MIN_FIT_POINTS {
			ranges.push(start..end);
		} else {
			tracing::warn!(start, end, len, "dropping chunk window too short to fit");
		}
		if end >= len {
			break;
		}
		start = end - overlap;
	}
	ranges
}
