mod program;
pub use program::*;

mod resources;
pub use resources::*;

mod scene;
pub use scene::*;

use std::{borrow::Borrow, ops::Deref};

use bon::{bon, builder};
use wgpu::util::DeviceExt;

/// A compiled shader module with the pipeline layout its entry points expect.
#[derive(Debug)]
pub struct Shader {
	pub module: wgpu::ShaderModule,
	pub layout: wgpu::PipelineLayout,
}

impl Shader {
	pub fn new(
		device: &wgpu::Device,
		label: &str,
		source: &str,
		bind_group_layouts: &[&wgpu::BindGroupLayout],
	) -> Self {
		let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
			label: Some(label),
			source: wgpu::ShaderSource::Wgsl(source.into()),
		});
		let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
			label: Some(label),
			bind_group_layouts,
			push_constant_ranges: &[],
		});
		Self { module, layout }
	}
}

#[builder(finish_fn = create)]
pub fn render_pipeline<'a>(
	#[builder(finish_fn)] device: &wgpu::Device,
	label: Option<&str>,
	layout: Option<&wgpu::PipelineLayout>,
	vertex: wgpu::VertexState<'a>,
	fragment: Option<wgpu::FragmentState<'a>>,
	#[builder(default = wgpu::PrimitiveTopology::TriangleList)] topology: wgpu::PrimitiveTopology,
	depth_stencil: Option<wgpu::DepthStencilState>,
	#[builder(default)] multisample: wgpu::MultisampleState,
	cache: Option<&wgpu::PipelineCache>,
) -> wgpu::RenderPipeline {
	device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
		label,
		layout,
		vertex,
		fragment,
		primitive: wgpu::PrimitiveState {
			topology,
			strip_index_format: None,
			front_face: wgpu::FrontFace::Ccw,
			// Ribbon winding flips wherever the curve turns back on itself.
			cull_mode: None,
			polygon_mode: wgpu::PolygonMode::Fill,
			unclipped_depth: false,
			conservative: false,
		},
		depth_stencil,
		multisample,
		multiview: None,
		cache,
	})
}

/// A 2D texture, by default usable as a render target that can be read back.
#[builder(finish_fn = create)]
pub fn texture(
	#[builder(finish_fn)] device: &wgpu::Device,
	label: Option<&str>,
	width: u32,
	height: u32,
	#[builder(default = 1)] sample_count: u32,
	#[builder(default = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC)]
	usage: wgpu::TextureUsages,
	format: wgpu::TextureFormat,
	#[builder(default = &[])] view_formats: &[wgpu::TextureFormat],
) -> wgpu::Texture {
	device.create_texture(&wgpu::TextureDescriptor {
		label,
		size: wgpu::Extent3d {
			width,
			height,
			depth_or_array_layers: 1,
		},
		mip_level_count: 1,
		sample_count,
		dimension: wgpu::TextureDimension::D2,
		format,
		usage,
		view_formats,
	})
}

/// Thin wrapper around a `wgpu::Buffer` that stores a type `T` in a format suitable for binding to
/// a uniform.
#[derive(Debug)]
pub struct BindingBuffer<T> {
	buffer: wgpu::Buffer,
	_t: std::marker::PhantomData<T>,
}

impl<T> Deref for BindingBuffer<T> {
	type Target = wgpu::Buffer;
	fn deref(&self) -> &Self::Target {
		&self.buffer
	}
}

impl<T> BindingBuffer<T> {
	fn default_usages() -> wgpu::BufferUsages {
		wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM
	}
}

#[bon]
impl<T: encase::ShaderType + encase::internal::WriteInto> BindingBuffer<T> {
	fn value_to_data(value: &T) -> impl Borrow<[u8]> {
		let mut data = encase::UniformBuffer::new(Vec::<u8>::with_capacity(T::min_size().get() as usize));
		// Writing into a `Vec` grows it as needed and cannot fail.
		data.write(value).expect("uniform write into a Vec");
		data.into_inner()
	}

	/// Builds a buffer with the given initial `value`.
	#[builder(finish_fn = "create")]
	pub fn init(
		#[builder(start_fn)] value: &T,
		#[builder(finish_fn)] device: &wgpu::Device,
		label: Option<&str>,
		usage: Option<wgpu::BufferUsages>,
	) -> Self {
		let usage = usage.unwrap_or(Self::default_usages());
		let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
			label,
			contents: Self::value_to_data(value).borrow(),
			usage,
		});
		Self {
			buffer,
			_t: Default::default(),
		}
	}

	/// Writes the given `value` to the buffer.
	pub fn write(&self, queue: &wgpu::Queue, value: impl Borrow<T>) {
		queue.write_buffer(
			&self.buffer,
			0,
			Self::value_to_data(value.borrow()).borrow(),
		)
	}

	/// Binds the whole buffer at binding 0 of a group with the given `layout`.
	pub fn bind_group(
		&self,
		device: &wgpu::Device,
		label: Option<&str>,
		layout: &wgpu::BindGroupLayout,
	) -> wgpu::BindGroup {
		device.create_bind_group(&wgpu::BindGroupDescriptor {
			label,
			layout,
			entries: &[wgpu::BindGroupEntry {
				binding: 0,
				resource: self.buffer.as_entire_binding(),
			}],
		})
	}
}
