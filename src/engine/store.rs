use super::ribbon::{disc, PreviewGeometry};
use super::scene::{Geometry, Material, Scene};
use super::stroke::{Stroke, StrokeId, StrokeStats};
use super::tessellate::{subdivisions_for_zoom, tessellate_chunk};
use super::MIN_FIT_POINTS;
use crate::config::{ConfigError, PipelineConfig, StrokeOptions};
use crate::geom::{Point, View};
use crate::util::ResultExt;
use glam::Vec4;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
	#[error("unknown stroke {0}")]
	UnknownStroke(StrokeId),
	#[error("a stroke needs at least {MIN_FIT_POINTS} points, got {count}")]
	InsufficientPoints { count: usize },
	#[error(transparent)]
	Config(#[from] ConfigError),
}

static_assertions::assert_impl_all!(StoreError: std::error::Error, Send, Sync);

const DEBUG_MARKER_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// Scene handles owned by one stroke.
#[derive(Debug)]
struct StrokeMeshes<H> {
	/// One per chunk, in chunk order.
	chunks: Vec<H>,
	markers: Vec<H>,
}

impl<H> Default for StrokeMeshes<H> {
	fn default() -> Self {
		Self {
			chunks: Vec::new(),
			markers: Vec::new(),
		}
	}
}

/// Owns every finished stroke, the scene meshes drawn for them, and the live preview.
///
/// Strokes live in an arena keyed by `StrokeId`; their meshes are a separate index from id to scene
/// handles. Any change to a stroke's points, width, color or the view's level of detail rebuilds
/// that stroke's meshes synchronously, releasing the previous ones first.
pub struct StrokeStore<S: Scene> {
	scene: S,
	config: PipelineConfig,
	strokes: BTreeMap<StrokeId, Stroke>,
	meshes: HashMap<StrokeId, StrokeMeshes<S::Handle>>,
	preview: Vec<S::Handle>,
	next_id: u64,
	next_z_index: u64,
	subdivisions: u32,
}

impl<S: Scene> StrokeStore<S> {
	pub fn new(scene: S, config: PipelineConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		let subdivisions = config.lod.base_subdivisions;
		Ok(Self {
			scene,
			config,
			strokes: BTreeMap::new(),
			meshes: HashMap::new(),
			preview: Vec::new(),
			next_id: 0,
			next_z_index: 0,
			subdivisions,
		})
	}

	pub fn scene(&self) -> &S {
		&self.scene
	}

	pub fn scene_mut(&mut self) -> &mut S {
		&mut self.scene
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	pub fn subdivisions(&self) -> u32 {
		self.subdivisions
	}

	/// Draws the next value from the z-order counter shared by everything placed in the scene.
	pub fn next_z_index(&mut self) -> u64 {
		let z_index = self.next_z_index;
		self.next_z_index += 1;
		z_index
	}

	pub fn stroke(&self, id: StrokeId) -> Option<&Stroke> {
		self.strokes.get(&id)
	}

	/// Strokes in creation order.
	pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
		self.strokes.values()
	}

	pub fn len(&self) -> usize {
		self.strokes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strokes.is_empty()
	}

	/// Number of scene meshes currently held for `id`.
	pub fn mesh_count(&self, id: StrokeId) -> usize {
		self
			.meshes
			.get(&id)
			.map_or(0, |m| m.chunks.len() + m.markers.len())
	}

	/// Creates a stroke from finished points. Returns `None` if there are fewer than four points or
	/// the options are invalid.
	#[tracing::instrument(skip_all, fields(points = points.len()))]
	pub fn create_stroke(&mut self, points: Vec<Point>, options: StrokeOptions) -> Option<StrokeId> {
		if points.len() < MIN_FIT_POINTS {
			tracing::warn!(
				count = points.len(),
				"not creating stroke: needs at least {MIN_FIT_POINTS} points"
			);
			return None;
		}
		if let Err(err) = options.validate() {
			tracing::warn!("not creating stroke: {err}");
			return None;
		}

		let id = StrokeId(self.next_id);
		self.next_id += 1;
		let z_index = self.next_z_index();
		let mut stroke = Stroke {
			id,
			points,
			options,
			z_index,
			chunks: Vec::new(),
			complete: false,
		};
		stroke.rebuild_chunks(&self.config);
		tracing::debug!(%id, z_index, chunks = stroke.chunks.len(), "created stroke");
		self.strokes.insert(id, stroke);
		self.rebuild_meshes(id);
		Some(id)
	}

	/// Refits and re-tessellates a stroke from its current points.
	pub fn update_stroke_geometry(&mut self, id: StrokeId) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		stroke.rebuild_chunks(&self.config);
		self.rebuild_meshes(id);
		Ok(())
	}

	/// Replaces a stroke's points, e.g. after a drag or scale, and rebuilds it. Too few points leave
	/// the stroke unchanged.
	pub fn set_points(&mut self, id: StrokeId, points: Vec<Point>) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		if points.len() < MIN_FIT_POINTS {
			return Err(StoreError::InsufficientPoints {
				count: points.len(),
			});
		}
		stroke.points = points;
		self.update_stroke_geometry(id)
	}

	pub fn transform_stroke(
		&mut self,
		id: StrokeId,
		mut transform: impl FnMut(Point) -> Point,
	) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		for point in &mut stroke.points {
			*point = transform(*point);
		}
		self.update_stroke_geometry(id)
	}

	pub fn set_width(&mut self, id: StrokeId, width: f32) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		let options = StrokeOptions {
			width,
			..stroke.options.clone()
		};
		options.validate()?;
		stroke.options = options;
		self.rebuild_meshes(id);
		Ok(())
	}

	pub fn set_color(&mut self, id: StrokeId, color: Vec4) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		stroke.options.color = color;
		self.rebuild_meshes(id);
		Ok(())
	}

	/// Toggles per-point markers and per-segment coloring for visual inspection.
	pub fn set_debug_mode(&mut self, id: StrokeId, enabled: bool) -> Result<(), StoreError> {
		let stroke = self.strokes.get_mut(&id).ok_or(StoreError::UnknownStroke(id))?;
		if stroke.options.debug_mode != enabled {
			stroke.options.debug_mode = enabled;
			self.rebuild_meshes(id);
		}
		Ok(())
	}

	pub fn stats(&self, id: StrokeId) -> Option<StrokeStats> {
		self.strokes.get(&id).map(Stroke::stats)
	}

	/// Deletes a stroke and releases its meshes.
	pub fn delete_stroke(&mut self, id: StrokeId) -> Result<Stroke, StoreError> {
		let stroke = self.strokes.remove(&id).ok_or(StoreError::UnknownStroke(id))?;
		self.release_meshes(id);
		tracing::debug!(%id, "deleted stroke");
		Ok(stroke)
	}

	/// Deletes every listed stroke that exists, returning how many were deleted.
	pub fn delete_strokes(&mut self, ids: impl IntoIterator<Item = StrokeId>) -> usize {
		ids
			.into_iter()
			.filter(|&id| self.delete_stroke(id).ok_or_warn().is_some())
			.count()
	}

	/// Deletes all strokes and the preview.
	pub fn clear(&mut self) {
		let ids: Vec<_> = self.strokes.keys().copied().collect();
		self.delete_strokes(ids);
		self.clear_preview();
	}

	/// Adapts tessellation density to the view. Rebuilds every stroke if the density changed.
	pub fn set_view(&mut self, view: &impl View) {
		let subdivisions = subdivisions_for_zoom(view.zoom_factor(), &self.config.lod);
		if subdivisions == self.subdivisions {
			return;
		}
		tracing::debug!(from = self.subdivisions, to = subdivisions, "changing subdivisions");
		self.subdivisions = subdivisions;
		let ids: Vec<_> = self.strokes.keys().copied().collect();
		for id in ids {
			self.rebuild_meshes(id);
		}
	}

	/// Replaces the preview with a straight ribbon through `points`, drawn above every stroke.
	pub fn update_preview(
		&mut self,
		points: impl IntoIterator<Item = Point>,
		options: &StrokeOptions,
	) {
		self.clear_preview();
		let preview = PreviewGeometry::build(
			points,
			options.half_width(),
			self.config.preview_disc_segments,
		);
		let material = Material {
			color: options.color,
			half_width: options.half_width(),
			z_index: self.next_z_index,
			segment_coloring: false,
		};
		for mesh in preview.meshes() {
			let handle = self.scene.add(Geometry::Flat(mesh), &material);
			self.preview.push(handle);
		}
	}

	pub fn clear_preview(&mut self) {
		for handle in self.preview.drain(..) {
			self.scene.remove(handle);
		}
	}

	pub fn has_preview(&self) -> bool {
		!self.preview.is_empty()
	}

	fn release_meshes(&mut self, id: StrokeId) {
		if let Some(meshes) = self.meshes.remove(&id) {
			for handle in meshes.chunks.into_iter().chain(meshes.markers) {
				self.scene.remove(handle);
			}
		}
	}

	fn rebuild_meshes(&mut self, id: StrokeId) {
		self.release_meshes(id);
		let Some(stroke) = self.strokes.get(&id) else {
			return;
		};

		let options = &stroke.options;
		let material = Material {
			color: options.color,
			half_width: options.half_width(),
			z_index: stroke.z_index,
			segment_coloring: options.debug_mode,
		};
		let mut meshes = StrokeMeshes::default();
		for chunk in &stroke.chunks {
			let geometry = tessellate_chunk(&chunk.segments, self.subdivisions, chunk.caps);
			meshes
				.chunks
				.push(self.scene.add(Geometry::Curve(&geometry), &material));
		}

		if options.debug_mode {
			let marker_material = Material {
				color: DEBUG_MARKER_COLOR,
				segment_coloring: false,
				..material
			};
			let radius = self.config.debug_marker_scale * options.half_width();
			for &point in &stroke.points {
				let marker = disc(point, radius, self.config.preview_disc_segments);
				meshes
					.markers
					.push(self.scene.add(Geometry::Flat(&marker), &marker_material));
			}
		}

		tracing::trace!(%id, chunks = meshes.chunks.len(), markers = meshes.markers.len(), "rebuilt meshes");
		self.meshes.insert(id, meshes);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{ChunkConfig, LodConfig};
	use crate::geom::OrthographicView;
	use glam::{vec3, Vec2};
	use std::collections::HashSet;

	/// Tracks live handles and fails on any double release.
	#[derive(Default)]
	struct CountingScene {
		next: u32,
		live: HashSet<u32>,
		added: usize,
		removed: usize,
		last_curve_vertices: usize,
		empty_curves: usize,
	}

	impl Scene for CountingScene {
		type Handle = u32;

		fn add(&mut self, geometry: Geometry<'_>, _material: &Material) -> u32 {
			if let Geometry::Curve(g) = geometry {
				self.last_curve_vertices = g.vertices.len();
				self.empty_curves += usize::from(g.is_empty());
			}
			let handle = self.next;
			self.next += 1;
			self.live.insert(handle);
			self.added += 1;
			handle
		}

		fn remove(&mut self, handle: u32) {
			assert!(self.live.remove(&handle), "released {handle} twice");
			self.removed += 1;
		}
	}

	fn store() -> StrokeStore<CountingScene> {
		StrokeStore::new(CountingScene::default(), PipelineConfig::default()).unwrap()
	}

	fn line(count: usize) -> Vec<Point> {
		(0..count).map(|i| vec3(i as f32, 0.0, 0.0)).collect()
	}

	#[test]
	fn rejects_invalid_config() {
		let config = PipelineConfig::builder()
			.chunk(ChunkConfig::builder().window(3).build())
			.build();
		assert!(StrokeStore::new(CountingScene::default(), config).is_err());
	}

	#[test]
	fn refuses_short_strokes() {
		let mut store = store();
		assert_eq!(store.create_stroke(line(3), StrokeOptions::default()), None);
		assert!(store.is_empty());
		assert_eq!(store.scene().added, 0);
	}

	#[test]
	fn one_mesh_per_chunk() {
		let mut store = store();
		let id = store.create_stroke(line(20), StrokeOptions::default()).unwrap();
		assert_eq!(store.mesh_count(id), 2);
		assert_eq!(store.scene().live.len(), 2);
		let stats = store.stats(id).unwrap();
		assert_eq!(stats.chunk_count, 2);
		assert_eq!(stats.total_points, 20);
		assert_eq!(stats.total_segments, 21);
		approx::assert_abs_diff_eq!(stats.avg_points_per_chunk, 11.5);
		approx::assert_abs_diff_eq!(stats.avg_segments_per_chunk, 10.5);
	}

	#[test]
	fn z_order_is_strictly_increasing() {
		let mut store = store();
		let mut last = None;
		for i in 0..5 {
			let z = if i % 2 == 0 {
				let id = store.create_stroke(line(6), StrokeOptions::default()).unwrap();
				store.stroke(id).unwrap().z_index()
			} else {
				store.next_z_index()
			};
			assert!(last.map_or(true, |last| z > last));
			last = Some(z);
		}
	}

	#[test]
	fn rebuilds_release_previous_meshes() {
		let mut store = store();
		let id = store.create_stroke(line(30), StrokeOptions::default()).unwrap();
		let meshes = store.mesh_count(id);

		store.update_stroke_geometry(id).unwrap();
		store.transform_stroke(id, |p| 2.0 * p).unwrap();
		store.set_width(id, 0.5).unwrap();
		store.set_color(id, Vec4::ONE).unwrap();
		assert_eq!(store.scene().live.len(), meshes);

		store.set_debug_mode(id, true).unwrap();
		assert_eq!(store.scene().live.len(), meshes + 30);
		store.set_debug_mode(id, false).unwrap();
		assert_eq!(store.scene().live.len(), meshes);

		store.delete_stroke(id).unwrap();
		assert!(store.scene().live.is_empty());
		assert_eq!(store.scene().added, store.scene().removed);
	}

	#[test]
	fn unknown_strokes() {
		let mut store = store();
		let id = store.create_stroke(line(5), StrokeOptions::default()).unwrap();
		store.delete_stroke(id).unwrap();
		assert_eq!(store.delete_stroke(id).unwrap_err(), StoreError::UnknownStroke(id));
		assert_eq!(store.update_stroke_geometry(id), Err(StoreError::UnknownStroke(id)));
		assert_eq!(store.delete_strokes([id]), 0);
		assert!(store.stats(id).is_none());
	}

	#[test]
	fn failed_chunk_still_gets_a_mesh() {
		let mut store = store();
		let id = store.create_stroke(line(27), StrokeOptions::default()).unwrap();
		assert_eq!(store.mesh_count(id), 3);
		assert_eq!(store.scene().empty_curves, 0);

		let stroke = store.strokes.get_mut(&id).unwrap();
		stroke.chunks[1].segments.clear();
		stroke.complete = false;
		store.rebuild_meshes(id);

		assert!(!store.stroke(id).unwrap().is_complete());
		assert_eq!(store.mesh_count(id), 3);
		assert_eq!(store.scene().live.len(), 3);
		assert_eq!(store.scene().empty_curves, 1);
	}

	#[test]
	fn set_points_refuses_too_few() {
		let mut store = store();
		let id = store.create_stroke(line(5), StrokeOptions::default()).unwrap();
		let added = store.scene().added;
		assert_eq!(
			store.set_points(id, line(3)),
			Err(StoreError::InsufficientPoints { count: 3 })
		);
		assert_eq!(store.stroke(id).unwrap().points(), &line(5)[..]);
		assert_eq!(store.stats(id).unwrap().chunk_count, 1);
		assert_eq!(store.mesh_count(id), 1);
		assert_eq!(store.scene().added, added);

		store.set_points(id, line(6)).unwrap();
		assert_eq!(store.stroke(id).unwrap().points().len(), 6);
	}

	#[test]
	fn invalid_width_keeps_stroke() {
		let mut store = store();
		let id = store.create_stroke(line(5), StrokeOptions::default()).unwrap();
		assert!(matches!(store.set_width(id, -1.0), Err(StoreError::Config(_))));
		assert_eq!(store.stroke(id).unwrap().options().width, 0.01);
		assert_eq!(store.mesh_count(id), 1);
	}

	#[test]
	fn zoom_changes_subdivisions() {
		let mut store = store();
		store.create_stroke(line(5), StrokeOptions::default()).unwrap();
		// Four segments at 20 steps, plus two caps.
		assert_eq!(store.scene().last_curve_vertices, 4 * 20 * 2 + 8);

		let view = OrthographicView::new(1.0, Vec2::new(100.0, 100.0));
		store.set_view(&view);
		let added = store.scene().added;
		assert_eq!(added, 1);

		store.set_view(&view.zoomed(3.0));
		assert_eq!(store.subdivisions(), 60);
		assert_eq!(store.scene().added, 2);
		assert_eq!(store.scene().live.len(), 1);
		assert_eq!(store.scene().last_curve_vertices, 4 * 60 * 2 + 8);
	}

	#[test]
	fn lod_respects_config() {
		let config = PipelineConfig::builder()
			.lod(LodConfig::builder().base_subdivisions(4).max_subdivisions(8).build())
			.build();
		let mut store = StrokeStore::new(CountingScene::default(), config).unwrap();
		let view = OrthographicView::new(1.0, Vec2::ONE);
		store.set_view(&view.zoomed(100.0));
		assert_eq!(store.subdivisions(), 8);
	}

	#[test]
	fn preview_is_replaced_not_leaked() {
		let mut store = store();
		let options = StrokeOptions::default();
		store.update_preview([Point::ZERO], &options);
		assert_eq!(store.scene().live.len(), 1);
		store.update_preview(line(2), &options);
		assert_eq!(store.scene().live.len(), 3);
		store.update_preview(line(10), &options);
		assert_eq!(store.scene().live.len(), 3);
		store.clear_preview();
		assert!(!store.has_preview());
		assert!(store.scene().live.is_empty());
	}

	#[test]
	fn clear_releases_everything() {
		let mut store = store();
		for count in [4, 12, 13, 40] {
			let options = StrokeOptions::builder().debug_mode(true).build();
			store.create_stroke(line(count), options).unwrap();
		}
		store.update_preview(line(4), &StrokeOptions::default());
		store.clear();
		assert!(store.is_empty());
		assert!(store.scene().live.is_empty());
		assert_eq!(store.scene().added, store.scene().removed);
	}
}
