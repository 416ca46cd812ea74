use tessel_engine::render::immediate::{Rasterizer, TextureError, TextureId};

use crate::draw::{DrawDataRenderer, FrameStats};
use crate::font::{FontAtlasSource, FontTextureManager};
use crate::frame::DrawData;

/// Dear ImGui renderer backend: draw data rendering plus the font texture.
///
/// The rasterizer is passed to every call so the renderer can live next to it
/// without borrowing it.
#[derive(Debug, Default)]
pub struct Renderer {
    draw: DrawDataRenderer,
    fonts: FontTextureManager,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers this backend with `imgui` and uploads the font atlas.
    pub fn init<R: Rasterizer + ?Sized>(
        imgui: &mut imgui::Context,
        rl: &mut R,
    ) -> Result<Self, TextureError> {
        imgui.set_renderer_name(Some(format!("tessel-imgui {}", env!("CARGO_PKG_VERSION"))));
        imgui
            .io_mut()
            .backend_flags
            .insert(imgui::BackendFlags::RENDERER_HAS_VTX_OFFSET);

        let mut renderer = Self::new();
        renderer.refresh_font_texture(rl, imgui.fonts())?;
        log::info!("imgui renderer initialized");
        Ok(renderer)
    }

    pub fn render<R: Rasterizer + ?Sized>(&mut self, rl: &mut R, draw_data: Option<&DrawData<'_>>) {
        self.draw.render(rl, draw_data);
    }

    /// Converts and renders the output of `imgui::Context::render`.
    pub fn render_imgui<R: Rasterizer + ?Sized>(&mut self, rl: &mut R, draw_data: &imgui::DrawData) {
        let data = DrawData::from_imgui(draw_data);
        self.draw.render(rl, Some(&data));
    }

    pub fn refresh_font_texture<R, A>(&mut self, rl: &mut R, atlas: &mut A) -> Result<TextureId, TextureError>
    where
        R: Rasterizer + ?Sized,
        A: FontAtlasSource + ?Sized,
    {
        self.fonts.refresh_font_texture(rl, atlas)
    }

    pub fn invalidate_device_objects<R, A>(&mut self, rl: &mut R, atlas: &mut A)
    where
        R: Rasterizer + ?Sized,
        A: FontAtlasSource + ?Sized,
    {
        self.fonts.invalidate_device_objects(rl, atlas);
    }

    pub fn font_texture(&self) -> Option<TextureId> {
        self.fonts.texture()
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.draw.last_frame_stats()
    }
}
