use bon::Builder;
use glam::Vec4;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
	#[error("smoothing window must be odd and at least 1, got {0}")]
	SmoothingWindow(usize),
	#[error("chunk window must hold at least 4 points, got {0}")]
	ChunkWindow(usize),
	#[error("chunk overlap {overlap} must be smaller than the window {window}")]
	ChunkOverlap { window: usize, overlap: usize },
	#[error("subdivisions must satisfy 2 <= base ({base}) <= max ({max})")]
	Subdivisions { base: u32, max: u32 },
	#[error("distance threshold must be finite and non-negative, got {0}")]
	Threshold(f32),
	#[error("stroke width must be finite and positive, got {0}")]
	Width(f32),
	#[error("invalid color: {0}")]
	Color(String),
}

static_assertions::assert_impl_all!(ConfigError: std::error::Error, Send, Sync);

/// Window policy for splitting a stroke before curve fitting.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct ChunkConfig {
	#[builder(default = 12)]
	pub window: usize,
	#[builder(default = 3)]
	pub overlap: usize,
}

impl Default for ChunkConfig {
	fn default() -> Self {
		Self::builder().build()
	}
}

/// Tessellation density bounds. The effective count scales with zoom between the two.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct LodConfig {
	#[builder(default = 20)]
	pub base_subdivisions: u32,
	#[builder(default = 200)]
	pub max_subdivisions: u32,
}

impl Default for LodConfig {
	fn default() -> Self {
		Self::builder().build()
	}
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PipelineConfig {
	#[builder(default = 3)]
	pub smoothing_window: usize,
	/// Screen-space spacing, in pixels, between points kept for fitting while the pointer moves.
	#[builder(default = 2.0)]
	pub min_pixel_distance: f32,
	/// World-space spacing applied once the stroke is complete.
	#[builder(default = 1e-3)]
	pub min_world_distance: f32,
	#[builder(default)]
	pub chunk: ChunkConfig,
	#[builder(default)]
	pub lod: LodConfig,
	#[builder(default = 16)]
	pub preview_disc_segments: u32,
	/// Debug markers are discs of this fraction of the stroke half width.
	#[builder(default = 0.5)]
	pub debug_marker_scale: f32,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self::builder().build()
	}
}

impl PipelineConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		use ConfigError::*;
		if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
			Err(SmoothingWindow(self.smoothing_window))?;
		}
		if self.chunk.window < 4 {
			Err(ChunkWindow(self.chunk.window))?;
		}
		if self.chunk.overlap >= self.chunk.window {
			Err(ChunkOverlap {
				window: self.chunk.window,
				overlap: self.chunk.overlap,
			})?;
		}
		let LodConfig {
			base_subdivisions: base,
			max_subdivisions: max,
		} = self.lod;
		if base < 2 || base > max {
			Err(Subdivisions { base, max })?;
		}
		for threshold in [self.min_pixel_distance, self.min_world_distance] {
			if !threshold.is_finite() || threshold < 0.0 {
				Err(Threshold(threshold))?;
			}
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct StrokeOptions {
	/// Full ribbon width in world units.
	#[builder(default = 0.01)]
	pub width: f32,
	/// Linear RGBA.
	#[builder(default = Vec4::new(0.0, 0.0, 0.0, 1.0))]
	pub color: Vec4,
	#[builder(default)]
	pub debug_mode: bool,
}

impl Default for StrokeOptions {
	fn default() -> Self {
		Self::builder().build()
	}
}

impl StrokeOptions {
	pub fn half_width(&self) -> f32 {
		0.5 * self.width
	}

	/// Replaces the color with one parsed from any CSS color syntax, e.g. `"#ff8800"` or `"teal"`.
	pub fn with_css_color(self, css: &str) -> Result<Self, ConfigError> {
		let color = csscolorparser::parse(css).map_err(|err| ConfigError::Color(err.to_string()))?;
		let [r, g, b, a] = color.to_array();
		Ok(Self {
			color: Vec4::new(r as f32, g as f32, b as f32, a as f32),
			..self
		})
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.width.is_finite() || self.width <= 0.0 {
			Err(ConfigError::Width(self.width))?;
		}
		Ok(())
	}
}
