use anyhow::Result;
use winit::dpi::LogicalSize;

use tessera_engine::coords::{Rect, Vec2};
use tessera_engine::core::{App, AppControl, FrameCtx};
use tessera_engine::device::GpuInit;
use tessera_engine::gpu::{Texture, WgpuDevice};
use tessera_engine::logging::{init_logging, LoggingConfig};
use tessera_engine::math::{Transform2D, DEG_TO_RAD};
use tessera_engine::paint::Color;
use tessera_engine::render::{Canvas, FrameStats, Renderer, RendererConfig, SpriteQuad};
use tessera_engine::window::{Runtime, RuntimeConfig, WindowMode};
use tessera_engine::RenderError;

const BACKGROUND: Color = Color::rgb(24, 26, 32);
const STATS_EVERY: u64 = 240;

/// GPU-side state created on the first frame, once a device exists.
struct Scene {
    renderer: Renderer<WgpuDevice>,
    checker: Texture,
    mask: Texture,
}

#[derive(Default)]
struct Demo {
    scene: Option<Scene>,
    elapsed: f32,
    last_stats: FrameStats,
}

impl Scene {
    fn new(mut renderer: Renderer<WgpuDevice>) -> Result<Self, RenderError> {
        let checker = renderer.device_mut().create_texture(&checker_pixels(64, 8), 64, 64)?;
        let mask = renderer.device_mut().create_texture(&disc_mask(32), 32, 32)?;
        Ok(Self { renderer, checker, mask })
    }

    fn draw(&mut self, t: f32) -> Result<(), RenderError> {
        let r = &mut self.renderer;

        // Filled and stroked primitives share one batch.
        r.fill_rect(Rect::new(40.0, 40.0, 200.0, 120.0), Color::rgb(60, 140, 220))?;
        r.stroke_rect(Rect::new(40.0, 40.0, 200.0, 120.0), Color::WHITE, 3.0)?;
        r.draw_filled_shape(
            &[Vec2::new(300.0, 160.0), Vec2::new(360.0, 40.0), Vec2::new(420.0, 160.0)],
            Color::rgba(240, 180, 40, 200),
            0.0,
        )?;
        r.draw_circle(Vec2::new(520.0, 100.0), 50.0 + 10.0 * t.sin(), Color::rgba(220, 60, 90, 160), 0.0)?;
        r.draw_circle(Vec2::new(520.0, 100.0), 60.0, Color::WHITE, 2.0)?;

        // Rotating sprite around its own center.
        let transform = Transform2D::translation(-32.0, -32.0)
            .then_rotate(t * 45.0 * DEG_TO_RAD)
            .then_translate(140.0, 300.0);
        r.draw_sprite(&self.checker, Rect::new(0.0, 0.0, 64.0, 64.0), &transform, Color::WHITE)?;

        // Sprites clipped to a sliding window.
        let clip_x = 260.0 + 120.0 * (t * 0.7).sin();
        r.push_clip(clip_x, 220.0, 200.0, 160.0)?;
        r.fill_rect(Rect::new(200.0, 220.0, 400.0, 160.0), Color::WHITE.with_alpha(24))?;
        let quads: Vec<SpriteQuad> = (0..40)
            .map(|i| {
                let origin = Vec2::new(220.0 + (i % 10) as f32 * 36.0, 230.0 + (i / 10) as f32 * 36.0);
                SpriteQuad {
                    source: Rect::new(0.0, 0.0, 32.0, 32.0),
                    dest: Rect::from_origin_size(origin, Vec2::new(32.0, 32.0)),
                    color: Color::rgb(120 + (i * 3) as u8, 200, 255 - (i * 4) as u8),
                }
            })
            .collect();
        r.draw_sprites(&self.mask, &quads)?;
        r.pop_clip()?;

        Ok(())
    }
}

impl App for Demo {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.elapsed += ctx.time.dt;
        let t = self.elapsed;
        let frame_index = ctx.time.frame_index;
        let fps = ctx.time.fps;

        let scene = &mut self.scene;
        let last_stats = &mut self.last_stats;
        let mut failed = false;

        let control = ctx.render(BACKGROUND, |rctx, target| {
            if scene.is_none() {
                let renderer = Renderer::new(
                    WgpuDevice::new(rctx),
                    RendererConfig::default(),
                    rctx.viewport.width,
                    rctx.viewport.height,
                );
                match Scene::new(renderer) {
                    Ok(s) => *scene = Some(s),
                    Err(e) => {
                        log::error!("failed to set up scene: {e}");
                        failed = true;
                        return;
                    }
                }
            }
            let Some(scene) = scene.as_mut() else { return };

            // Keep the projection current before anything is recorded.
            if let Err(e) = scene.renderer.resize(rctx.viewport.width, rctx.viewport.height) {
                log::error!("{e}");
            }
            if let Err(e) = scene.draw(t) {
                log::error!("draw failed: {e}");
            }
            match scene.renderer.render(rctx, target) {
                Ok(stats) => *last_stats = stats,
                Err(e) => {
                    log::error!("frame failed: {e}");
                    failed = true;
                }
            }
        });

        if frame_index % STATS_EVERY == 0 {
            log::info!(
                "{fps:.0} fps, {} draw calls, {} vertices",
                self.last_stats.draw_calls,
                self.last_stats.vertices
            );
        }

        if failed { AppControl::Exit } else { control }
    }

    fn on_exit(&mut self) {
        // Programs are released while the device is still alive.
        self.scene = None;
        log::info!("demo finished after {:.1}s", self.elapsed);
    }
}

/// RGBA checkerboard with `cell`-sized squares.
fn checker_pixels(size: u32, cell: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let px: [u8; 4] = if on { [250, 250, 250, 255] } else { [90, 90, 110, 255] };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

/// White disc with an anti-aliased edge stored in alpha (coverage mask).
fn disc_mask(size: u32) -> Vec<u8> {
    let c = size as f32 / 2.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5 - c, y as f32 + 0.5 - c).length();
            let coverage = (c - 1.0 - d + 0.5).clamp(0.0, 1.0);
            pixels.extend_from_slice(&[255, 255, 255, (coverage * 255.0) as u8]);
        }
    }
    pixels
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "tessera demo".to_string(),
            initial_size: LogicalSize::new(720.0, 420.0),
            mode: WindowMode::Continuous,
        },
        GpuInit::default(),
        Demo::default(),
    )
}
