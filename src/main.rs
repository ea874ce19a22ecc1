use glam::{vec3, Vec2};
use inkline::config::{PipelineConfig, StrokeOptions};
use inkline::engine::{ActiveStroke, StrokeStore};
use inkline::geom::OrthographicView;
use inkline::render::{texture, WgpuScene};
use inkline::WgpuContext;
use std::rc::Rc;

#[derive(thiserror::Error, Debug)]
#[error("no global tracing subscriber set")]
struct NoTracingSubscriber;

fn configure_tracing() -> anyhow::Result<()> {
	let result = Err(NoTracingSubscriber);

	#[cfg(all(target_arch = "wasm32", feature = "wasm-console"))]
	let result = result.or_else(|_| tracing_wasm::try_set_as_global_default());

	let result = result.or_else(|_| {
		let max_level = if cfg!(debug_assertions) {
			tracing::Level::TRACE
		} else {
			tracing::Level::INFO
		};
		tracing::subscriber::set_global_default(
			tracing_subscriber::FmtSubscriber::builder()
				.with_max_level(max_level)
				.finish(),
		)
	});

	Ok(result?)
}

fn configure_logging() -> anyhow::Result<()> {
	configure_tracing()?;

	// wgpu logs through `log`, so forward those records to `tracing`.
	#[cfg(feature = "log")]
	tracing_log::LogTracer::init()?;
	Ok(())
}

const SIZE: u32 = 512;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Feeds a wobbly spiral through the same capture path a pointer would take.
fn capture_sample_stroke(view: &OrthographicView, config: &PipelineConfig) -> Vec<glam::Vec3> {
	let mut rng = fastrand::Rng::with_seed(7);
	let sample = |i: usize, rng: &mut fastrand::Rng| {
		let angle = 0.05 * i as f32;
		let radius = 0.05 + 0.05 * angle;
		let jitter = 0.002 * (rng.f32() - 0.5);
		vec3(radius * angle.cos() + jitter, radius * angle.sin() + jitter, 0.0)
	};
	let mut stroke = ActiveStroke::start(sample(0, &mut rng), view, config);
	for i in 1..300 {
		stroke.add_point(sample(i, &mut rng), view);
	}
	stroke.finish(false)
}

async fn run() -> anyhow::Result<()> {
	let context = Rc::new(WgpuContext::new().await?);
	let config = PipelineConfig::default();
	let view = OrthographicView::new(2.0, Vec2::splat(SIZE as f32));

	let scene = WgpuScene::new(context.clone(), FORMAT);
	scene.set_view(&view);
	let mut store = StrokeStore::new(scene, config.clone())?;
	store.set_view(&view);

	let points = capture_sample_stroke(&view, &config);
	let options = StrokeOptions::builder().width(0.02).build().with_css_color("teal")?;
	let Some(id) = store.create_stroke(points, options) else {
		anyhow::bail!("sample stroke was too short to fit");
	};
	if let Some(stats) = store.stats(id) {
		tracing::info!(%id, ?stats, "created sample stroke");
	}

	let target = texture()
		.label("demo_target")
		.width(SIZE)
		.height(SIZE)
		.format(FORMAT)
		.create(context.device());
	store
		.scene()
		.render(&target.create_view(&Default::default()), wgpu::Color::WHITE);
	tracing::info!(meshes = store.scene().len(), "rendered sample stroke");
	Ok(())
}

fn main() {
	#[cfg(all(target_arch = "wasm32", feature = "wasm-console"))]
	console_error_panic_hook::set_once();

	if let Err(error) = configure_logging() {
		// We can technically continue without logging.
		tracing::error!(error = error.to_string());
	}

	if let Err(error) = futures::executor::block_on(run()) {
		tracing::error!(error = error.to_string(), "demo failed");
		std::process::exit(1);
	}
}
