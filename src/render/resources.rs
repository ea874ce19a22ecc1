use super::{render_pipeline, CameraUniforms, Shader, StrokeUniforms};
use crate::engine::{FlatVertex, StrokeVertex};
use crate::shaders;
use encase::ShaderType;
use std::num::NonZeroU64;

fn uniform_layout(
	device: &wgpu::Device,
	label: &str,
	visibility: wgpu::ShaderStages,
	min_binding_size: NonZeroU64,
) -> wgpu::BindGroupLayout {
	device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
		label: Some(label),
		entries: &[wgpu::BindGroupLayoutEntry {
			binding: 0,
			visibility,
			ty: wgpu::BindingType::Buffer {
				ty: wgpu::BufferBindingType::Uniform,
				has_dynamic_offset: false,
				min_binding_size: Some(min_binding_size),
			},
			count: None,
		}],
	})
}

fn pipeline(
	device: &wgpu::Device,
	label: &str,
	shader: &Shader,
	vertex_layout: wgpu::VertexBufferLayout<'_>,
	target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
	render_pipeline()
		.label(label)
		.layout(&shader.layout)
		.vertex(wgpu::VertexState {
			module: &shader.module,
			entry_point: shaders::VERTEX_ENTRY_POINT,
			compilation_options: Default::default(),
			buffers: &[vertex_layout],
		})
		.fragment(wgpu::FragmentState {
			module: &shader.module,
			entry_point: shaders::FRAGMENT_ENTRY_POINT,
			compilation_options: Default::default(),
			targets: &[Some(wgpu::ColorTargetState {
				format: target_format,
				blend: Some(wgpu::BlendState::ALPHA_BLENDING),
				write_mask: wgpu::ColorWrites::ALL,
			})],
		})
		.create(device)
}

/// Resources that only need to be loaded once for a given device and target format.
#[derive(Debug)]
pub struct Resources {
	/// Group 0: `CameraUniforms`.
	pub camera_layout: wgpu::BindGroupLayout,
	/// Group 1: `StrokeUniforms`.
	pub material_layout: wgpu::BindGroupLayout,

	pub curve_pipeline: wgpu::RenderPipeline,
	pub flat_pipeline: wgpu::RenderPipeline,
}

impl Resources {
	pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
		let camera_layout = uniform_layout(
			device,
			"camera",
			wgpu::ShaderStages::VERTEX,
			CameraUniforms::min_size(),
		);
		let material_layout = uniform_layout(
			device,
			"material",
			wgpu::ShaderStages::VERTEX_FRAGMENT,
			StrokeUniforms::min_size(),
		);
		let groups = [&camera_layout, &material_layout];

		let curve_shader = Shader::new(device, "stroke", shaders::STROKE, &groups);
		let curve_pipeline = pipeline(
			device,
			"stroke",
			&curve_shader,
			StrokeVertex::layout(),
			target_format,
		);

		let flat_shader = Shader::new(device, "flat", shaders::FLAT, &groups);
		let flat_pipeline = pipeline(
			device,
			"flat",
			&flat_shader,
			FlatVertex::layout(),
			target_format,
		);

		Resources {
			camera_layout,
			material_layout,
			curve_pipeline,
			flat_pipeline,
		}
	}
}
