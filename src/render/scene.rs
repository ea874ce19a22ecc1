use super::{BindingBuffer, CameraUniforms, Resources, StrokeUniforms};
use crate::engine::{Geometry, Material, Scene};
use crate::geom::View;
use crate::WgpuContext;
use glam::Mat4;
use std::collections::HashMap;
use std::rc::Rc;
use wgpu::util::DeviceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshKind {
	Curve,
	Flat,
}

#[derive(Debug)]
struct Mesh {
	kind: MeshKind,
	z_index: u64,
	vertices: wgpu::Buffer,
	indices: wgpu::Buffer,
	index_count: u32,
	uniforms: BindingBuffer<StrokeUniforms>,
	bind_group: wgpu::BindGroup,
}

impl Mesh {
	fn destroy(self) {
		self.vertices.destroy();
		self.indices.destroy();
		self.uniforms.destroy();
	}
}

/// Draws scene meshes with wgpu, back to front by z-index.
pub struct WgpuScene {
	context: Rc<WgpuContext>,
	resources: Resources,
	camera: BindingBuffer<CameraUniforms>,
	camera_bind_group: wgpu::BindGroup,
	meshes: HashMap<MeshHandle, Mesh>,
	next_handle: u64,
}

impl WgpuScene {
	pub fn new(context: Rc<WgpuContext>, target_format: wgpu::TextureFormat) -> Self {
		let device = context.device();
		let resources = Resources::new(device, target_format);
		let camera = BindingBuffer::init(&CameraUniforms {
			view_projection: Mat4::IDENTITY,
		})
		.label("camera")
		.create(device);
		let camera_bind_group = camera.bind_group(device, Some("camera"), &resources.camera_layout);
		Self {
			context,
			resources,
			camera,
			camera_bind_group,
			meshes: HashMap::new(),
			next_handle: 0,
		}
	}

	pub fn context(&self) -> &WgpuContext {
		&self.context
	}

	pub fn len(&self) -> usize {
		self.meshes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.meshes.is_empty()
	}

	pub fn set_view(&self, view: &impl View) {
		self.camera.write(
			self.context.queue(),
			CameraUniforms {
				view_projection: view.view_projection(),
			},
		);
	}

	/// Records draws for every non-empty mesh, lowest z-index first. Ties draw in insertion order.
	pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
		let mut meshes: Vec<_> = self
			.meshes
			.iter()
			.filter(|(_, mesh)| mesh.index_count > 0)
			.collect();
		meshes.sort_by_key(|(handle, mesh)| (mesh.z_index, **handle));

		pass.set_bind_group(0, &self.camera_bind_group, &[]);
		let mut current = None;
		for (_, mesh) in meshes {
			if current != Some(mesh.kind) {
				pass.set_pipeline(match mesh.kind {
					MeshKind::Curve => &self.resources.curve_pipeline,
					MeshKind::Flat => &self.resources.flat_pipeline,
				});
				current = Some(mesh.kind);
			}
			pass.set_bind_group(1, &mesh.bind_group, &[]);
			pass.set_vertex_buffer(0, mesh.vertices.slice(..));
			pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
			pass.draw_indexed(0..mesh.index_count, 0, 0..1);
		}
	}

	/// Clears `target` and draws the scene into it.
	pub fn render(&self, target: &wgpu::TextureView, clear: wgpu::Color) {
		let mut encoder = self
			.context
			.device()
			.create_command_encoder(&wgpu::CommandEncoderDescriptor {
				label: Some("scene"),
			});
		{
			let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
				label: Some("scene"),
				color_attachments: &[Some(wgpu::RenderPassColorAttachment {
					view: target,
					resolve_target: None,
					ops: wgpu::Operations {
						load: wgpu::LoadOp::Clear(clear),
						store: wgpu::StoreOp::Store,
					},
				})],
				..Default::default()
			});
			self.draw(&mut pass);
		}
		self.context.queue().submit([encoder.finish()]);
	}
}

impl Scene for WgpuScene {
	type Handle = MeshHandle;

	fn add(&mut self, geometry: Geometry<'_>, material: &Material) -> MeshHandle {
		let device = self.context.device();
		let (kind, vertex_data, index_data): (_, &[u8], &[u8]) = match geometry {
			Geometry::Curve(g) => (
				MeshKind::Curve,
				bytemuck::cast_slice(&g.vertices),
				bytemuck::cast_slice(&g.indices),
			),
			Geometry::Flat(g) => (
				MeshKind::Flat,
				bytemuck::cast_slice(&g.vertices),
				bytemuck::cast_slice(&g.indices),
			),
		};
		let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
			label: Some("mesh vertices"),
			contents: vertex_data,
			usage: wgpu::BufferUsages::VERTEX,
		});
		let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
			label: Some("mesh indices"),
			contents: index_data,
			usage: wgpu::BufferUsages::INDEX,
		});
		let uniforms = BindingBuffer::init(&StrokeUniforms::new(material))
			.label("material")
			.create(device);
		let bind_group = uniforms.bind_group(device, Some("material"), &self.resources.material_layout);

		let handle = MeshHandle(self.next_handle);
		self.next_handle += 1;
		self.meshes.insert(
			handle,
			Mesh {
				kind,
				z_index: material.z_index,
				vertices,
				indices,
				index_count: geometry.index_count() as u32,
				uniforms,
				bind_group,
			},
		);
		handle
	}

	fn remove(&mut self, handle: MeshHandle) {
		match self.meshes.remove(&handle) {
			Some(mesh) => mesh.destroy(),
			None => tracing::warn!(?handle, "removing unknown mesh"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{PipelineConfig, StrokeOptions};
	use crate::engine::{CurveGeometry, StrokeStore};
	use crate::geom::OrthographicView;
	use crate::test::WgpuTestContext;
	use glam::{vec3, Vec2, Vec4};

	const SIZE: u32 = 64;
	const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
	const RED: [u8; 4] = [255, 0, 0, 255];
	const CLEAR: [u8; 4] = [0, 0, 0, 0];

	fn store(context: &WgpuTestContext) -> anyhow::Result<StrokeStore<WgpuScene>> {
		let config = PipelineConfig::default();
		let scene = WgpuScene::new(context.context(), FORMAT);
		// Two world units tall, so 32 pixels per unit.
		let view = OrthographicView::new(2.0, Vec2::splat(SIZE as f32));
		scene.set_view(&view);
		Ok(StrokeStore::new(scene, config)?)
	}

	fn horizontal_stroke() -> Vec<glam::Vec3> {
		(0..9).map(|i| vec3(-0.8 + 0.2 * i as f32, 0.0, 0.0)).collect()
	}

	#[test]
	fn draws_stroke_with_round_caps() -> anyhow::Result<()> {
		let Some(context) = WgpuTestContext::try_new() else {
			return Ok(());
		};
		let mut store = store(&context)?;
		let options = StrokeOptions::builder()
			.width(0.2)
			.color(Vec4::new(1.0, 0.0, 0.0, 1.0))
			.build();
		let id = store.create_stroke(horizontal_stroke(), options);
		assert!(id.is_some());

		let pixels = context.render(store.scene(), SIZE, SIZE, FORMAT);
		// On the curve.
		assert_eq!(pixels.at(32, 32), RED);
		// Inside the end cap, past the last point.
		assert_eq!(pixels.at(59, 32), RED);
		// Far from the stroke.
		assert_eq!(pixels.at(32, 5), CLEAR);
		// Inside the end cap's quad but outside its circle.
		assert_eq!(pixels.at(60, 29), CLEAR);
		Ok(())
	}

	#[test]
	fn removed_meshes_are_not_drawn() -> anyhow::Result<()> {
		let Some(context) = WgpuTestContext::try_new() else {
			return Ok(());
		};
		let mut store = store(&context)?;
		let id = store
			.create_stroke(horizontal_stroke(), StrokeOptions::builder().width(0.2).build())
			.unwrap();
		store.update_preview(horizontal_stroke(), &StrokeOptions::default());
		assert_eq!(store.scene().len(), 4);

		store.delete_stroke(id)?;
		store.clear_preview();
		assert!(store.scene().is_empty());

		let pixels = context.render(store.scene(), SIZE, SIZE, FORMAT);
		assert!(pixels.data.chunks(4).all(|pixel| pixel == CLEAR));
		Ok(())
	}

	#[test]
	fn empty_meshes_are_held_but_not_drawn() -> anyhow::Result<()> {
		let Some(context) = WgpuTestContext::try_new() else {
			return Ok(());
		};
		let mut store = store(&context)?;
		let material = Material {
			color: Vec4::ONE,
			half_width: 0.1,
			z_index: store.next_z_index(),
			segment_coloring: false,
		};
		let scene = store.scene_mut();
		let handle = scene.add(Geometry::Curve(&CurveGeometry::default()), &material);
		assert_eq!(scene.len(), 1);

		let pixels = context.render(store.scene(), SIZE, SIZE, FORMAT);
		assert!(pixels.data.chunks(4).all(|pixel| pixel == CLEAR));
		store.scene_mut().remove(handle);
		assert!(store.scene().is_empty());
		Ok(())
	}
}
