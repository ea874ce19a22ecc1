use crate::*;
use std::ops::Deref;
use std::rc::Rc;

pub struct WgpuTestContext {
	context: Rc<WgpuContext>,
}

impl Deref for WgpuTestContext {
	type Target = Rc<WgpuContext>;
	fn deref(&self) -> &Rc<WgpuContext> {
		&self.context
	}
}

/// RGBA8 pixels read back from a texture, row-major from the top left.
pub struct Pixels {
	pub width: u32,
	pub height: u32,
	pub data: Vec<u8>,
}

impl Pixels {
	pub fn at(&self, x: u32, y: u32) -> [u8; 4] {
		let offset = 4 * (y * self.width + x) as usize;
		[
			self.data[offset],
			self.data[offset + 1],
			self.data[offset + 2],
			self.data[offset + 3],
		]
	}
}

impl WgpuTestContext {
	pub fn barrier(&self) {
		self
			.device()
			.poll(wgpu::Maintain::wait())
			.panic_on_timeout()
	}

	/// Returns `None`, with a warning, on machines without a usable adapter so GPU tests can bail out.
	pub fn try_new() -> Option<Self> {
		match pollster::block_on(WgpuContext::new()) {
			Ok(context) => Some(Self {
				context: Rc::new(context),
			}),
			Err(err) => {
				eprintln!("skipping GPU test: {err}");
				None
			}
		}
	}

	pub fn context(&self) -> Rc<WgpuContext> {
		self.context.clone()
	}

	fn get_buffer_data(&self, buffer: &wgpu::Buffer) -> Vec<u8> {
		let slice = buffer.slice(..);
		slice.map_async(wgpu::MapMode::Read, |_| ());
		self.barrier();
		slice.get_mapped_range().to_vec()
	}

	pub fn read_pixels(&self, texture: &wgpu::Texture) -> Pixels {
		assert_eq!(texture.format().block_copy_size(None), Some(4));
		let bytes_per_row = 4 * texture.width();
		let row_stride = wgpu::util::align_to(bytes_per_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

		let device = self.device();
		let buffer = device.create_buffer(&wgpu::BufferDescriptor {
			label: None,
			size: (row_stride * texture.height()) as wgpu::BufferAddress,
			usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
			mapped_at_creation: false,
		});
		let mut encoder = device.create_command_encoder(&Default::default());
		encoder.copy_texture_to_buffer(
			wgpu::ImageCopyTexture {
				texture,
				mip_level: 0,
				origin: wgpu::Origin3d::ZERO,
				aspect: wgpu::TextureAspect::All,
			},
			wgpu::ImageCopyBuffer {
				buffer: &buffer,
				layout: wgpu::ImageDataLayout {
					offset: 0,
					bytes_per_row: Some(row_stride),
					rows_per_image: Some(texture.height()),
				},
			},
			texture.size(),
		);
		self.queue().submit([encoder.finish()]);
		let data = self
			.get_buffer_data(&buffer)
			.chunks_exact(row_stride as usize)
			.flat_map(|row| &row[..bytes_per_row as usize])
			.copied()
			.collect();
		Pixels {
			width: texture.width(),
			height: texture.height(),
			data,
		}
	}

	/// Renders `scene` into a fresh transparent target and reads it back.
	pub fn render(
		&self,
		scene: &render::WgpuScene,
		width: u32,
		height: u32,
		format: wgpu::TextureFormat,
	) -> Pixels {
		let texture = render::texture()
			.label("test_target")
			.width(width)
			.height(height)
			.format(format)
			.create(self.device());
		scene.render(&texture.create_view(&Default::default()), wgpu::Color::TRANSPARENT);
		self.read_pixels(&texture)
	}
}
