use glam::{Mat4, Vec2, Vec3};

/// A position in the drawing plane's local space. `z` only orders layers and is never touched by
/// curve math.
pub type Point = Vec3;

/// Normal of the drawing plane in plane-local space. Ribbon offsets and caps lie in the `xy` plane.
pub const PLANE_NORMAL: Vec3 = Vec3::Z;

/// What the geometry pipeline needs to know about the camera.
pub trait View {
	/// How far the view is zoomed in relative to its default framing. `1.0` at default zoom.
	fn zoom_factor(&self) -> f32;

	/// Projects a plane-local point to pixel coordinates.
	fn to_screen(&self, point: Point) -> Vec2;

	/// Maps plane-local coordinates to clip space.
	fn view_projection(&self) -> Mat4;
}

/// Orthographic camera looking down the plane normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicView {
	pub center: Vec2,
	/// Visible world height at default zoom.
	pub default_view_height: f32,
	/// Currently visible world height.
	pub view_height: f32,
	/// Viewport size in pixels.
	pub viewport: Vec2,
}

impl OrthographicView {
	pub fn new(view_height: f32, viewport: Vec2) -> Self {
		Self {
			center: Vec2::ZERO,
			default_view_height: view_height,
			view_height,
			viewport,
		}
	}

	pub fn zoomed(self, zoom_factor: f32) -> Self {
		Self {
			view_height: self.default_view_height / zoom_factor,
			..self
		}
	}

	fn aspect(&self) -> f32 {
		self.viewport.x / self.viewport.y.max(1.0)
	}

	fn half_extent(&self) -> Vec2 {
		let half_height = 0.5 * self.view_height;
		Vec2::new(half_height * self.aspect(), half_height)
	}
}

impl View for OrthographicView {
	fn zoom_factor(&self) -> f32 {
		self.default_view_height / self.view_height
	}

	fn to_screen(&self, point: Point) -> Vec2 {
		let ndc = (point.truncate() - self.center) / self.half_extent();
		Vec2::new(0.5 * (ndc.x + 1.0), 0.5 * (1.0 - ndc.y)) * self.viewport
	}

	fn view_projection(&self) -> Mat4 {
		let min = self.center - self.half_extent();
		let max = self.center + self.half_extent();
		// Layers live in a thin band around the plane.
		Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -1000.0, 1000.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	#[test]
	fn zoom_factor() {
		let view = OrthographicView::new(2.0, Vec2::new(200.0, 100.0));
		assert_abs_diff_eq!(view.zoom_factor(), 1.0);
		assert_abs_diff_eq!(view.zoomed(4.0).zoom_factor(), 4.0);
	}

	#[test]
	fn to_screen() {
		let view = OrthographicView::new(2.0, Vec2::new(100.0, 100.0));
		let center = view.to_screen(Vec3::ZERO);
		assert_abs_diff_eq!(center.x, 50.0);
		assert_abs_diff_eq!(center.y, 50.0);
		let top_right = view.to_screen(Vec3::new(1.0, 1.0, 0.0));
		assert_abs_diff_eq!(top_right.x, 100.0);
		assert_abs_diff_eq!(top_right.y, 0.0);
		// One world unit spans 50 pixels at this zoom, and 200 when zoomed in four times.
		let zoomed = view.zoomed(4.0);
		let delta = zoomed.to_screen(Vec3::new(0.25, 0.0, 0.0)) - zoomed.to_screen(Vec3::ZERO);
		assert_abs_diff_eq!(delta.x, 50.0, epsilon = 1e-4);
	}
}
