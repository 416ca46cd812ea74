mod platform;

use std::path::PathBuf;

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;

use tessel_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use tessel_engine::device::GpuInit;
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::Color;
use tessel_engine::render::immediate::{ImmediateConfig, ImmediateRenderer, TextureError};
use tessel_engine::window::{Runtime, RuntimeConfig};
use tessel_imgui::Renderer;

const DEFAULT_FONT_SIZE: f32 = 13.0;

/// imgui demo window rendered through the immediate-mode rasterizer.
struct Studio {
    imgui: imgui::Context,
    renderer: Renderer,
    raster: ImmediateRenderer,
    show_demo: bool,
    font_size: f32,
    rebuild_fonts: bool,
    clear: [f32; 3],
}

impl Studio {
    fn new() -> Result<Self> {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None::<PathBuf>);

        let mut raster = ImmediateRenderer::new(ImmediateConfig::default());
        let renderer =
            Renderer::init(&mut imgui, &mut raster).context("failed to upload imgui font atlas")?;

        Ok(Self {
            imgui,
            renderer,
            raster,
            show_demo: true,
            font_size: DEFAULT_FONT_SIZE,
            rebuild_fonts: false,
            clear: [0.10, 0.11, 0.13],
        })
    }

    fn reload_fonts(&mut self) -> Result<(), TextureError> {
        let fonts = self.imgui.fonts();
        fonts.clear();
        fonts.add_font(&[imgui::FontSource::DefaultFontData {
            config: Some(imgui::FontConfig {
                size_pixels: self.font_size,
                ..imgui::FontConfig::default()
            }),
        }]);
        self.renderer.refresh_font_texture(&mut self.raster, fonts)?;
        Ok(())
    }

    fn clear_color(&self) -> Color {
        let [r, g, b] = self.clear.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        Color::from_srgb_u8(r, g, b, 255)
    }
}

impl App for Studio {
    fn on_window_event(&mut self, window: &WindowCtx<'_>, event: &WindowEvent) -> AppControl {
        platform::handle_event(self.imgui.io_mut(), window.scale_factor(), event);

        if let WindowEvent::CloseRequested = event {
            self.renderer
                .invalidate_device_objects(&mut self.raster, self.imgui.fonts());
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if std::mem::take(&mut self.rebuild_fonts) {
            match self.reload_fonts() {
                Ok(()) => log::info!("font atlas rebuilt at {:.0}px", self.font_size),
                Err(err) => log::error!("font atlas rebuild failed: {err}"),
            }
        }

        let (width, height) = ctx.window.logical_size();
        let scale = ctx.window.scale_factor();
        let io = self.imgui.io_mut();
        io.display_size = [width, height];
        io.display_framebuffer_scale = [scale, scale];
        io.update_delta_time(ctx.time.delta);

        let stats = self.renderer.last_frame_stats();
        let adapter = &ctx.gpu.adapter_info().name;
        let ui = self.imgui.new_frame();
        if self.show_demo {
            ui.show_demo_window(&mut self.show_demo);
        }
        ui.window("tessel studio")
            .position([16.0, 16.0], imgui::Condition::FirstUseEver)
            .size([320.0, 170.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("{:.1} fps (frame {})", ui.io().framerate, ctx.time.frame_index));
                ui.text(format!("adapter: {adapter}"));
                ui.text(format!(
                    "{} commands, {} triangles, {} callbacks",
                    stats.commands, stats.triangles, stats.callbacks
                ));
                ui.checkbox("demo window", &mut self.show_demo);
                ui.slider("font size", 8.0, 32.0, &mut self.font_size);
                if ui.button("rebuild font atlas") {
                    self.rebuild_fonts = true;
                }
                ui.color_edit3("clear", &mut self.clear);
            });

        let draw_data = self.imgui.render();
        self.renderer.render_imgui(&mut self.raster, draw_data);

        let clear = self.clear_color();
        let raster = &mut self.raster;
        let mut drawn = false;
        let control = ctx.render(clear, |rctx, target| {
            raster.render(rctx, target);
            drawn = true;
        });
        if !drawn {
            raster.discard_frame();
        }
        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let studio = Studio::new()?;
    let config = RuntimeConfig {
        title: "tessel studio".to_string(),
        initial_size: LogicalSize::new(1280.0, 800.0),
    };

    Runtime::run(config, GpuInit::default(), studio)
}
