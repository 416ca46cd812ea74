//! Test doubles: a rasterizer that records every call and an in-memory atlas.

use tessel_engine::render::immediate::{DrawMode, PixelFormat, Rasterizer, TextureError, TextureId};

use crate::font::{AtlasPixels, FontAtlasSource};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin(DrawMode),
    End,
    Color(u8, u8, u8, u8),
    TexCoord(f32, f32),
    Vertex(f32, f32),
    SetTexture(Option<TextureId>),
    EnableScissor,
    DisableScissor,
    Scissor(i32, i32, i32, i32),
    EnableCulling,
    DisableCulling,
    LoadTexture(u32, u32, PixelFormat, u32),
    UnloadTexture(TextureId),
    Flush,
}

#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    pub calls: Vec<Call>,
    next_texture: u32,
}

impl RecordingRasterizer {
    pub fn vertex_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Vertex(..))).count()
    }

    pub fn positions(&self) -> Vec<(f32, f32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Vertex(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }
}

impl Rasterizer for RecordingRasterizer {
    fn begin(&mut self, mode: DrawMode) {
        self.calls.push(Call::Begin(mode));
    }

    fn end(&mut self) {
        self.calls.push(Call::End);
    }

    fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.calls.push(Call::Color(r, g, b, a));
    }

    fn tex_coord2f(&mut self, u: f32, v: f32) {
        self.calls.push(Call::TexCoord(u, v));
    }

    fn vertex2f(&mut self, x: f32, y: f32) {
        self.calls.push(Call::Vertex(x, y));
    }

    fn set_texture(&mut self, texture: Option<TextureId>) {
        self.calls.push(Call::SetTexture(texture));
    }

    fn enable_scissor_test(&mut self) {
        self.calls.push(Call::EnableScissor);
    }

    fn disable_scissor_test(&mut self) {
        self.calls.push(Call::DisableScissor);
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.calls.push(Call::Scissor(x, y, width, height));
    }

    fn enable_backface_culling(&mut self) {
        self.calls.push(Call::EnableCulling);
    }

    fn disable_backface_culling(&mut self) {
        self.calls.push(Call::DisableCulling);
    }

    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        mip_levels: u32,
    ) -> Result<TextureId, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyExtent { width, height });
        }
        assert_eq!(pixels.len(), width as usize * height as usize * format.bytes_per_pixel());
        self.calls.push(Call::LoadTexture(width, height, format, mip_levels));
        self.next_texture += 1;
        Ok(TextureId::new(self.next_texture).expect("non-zero"))
    }

    fn unload_texture(&mut self, texture: TextureId) {
        self.calls.push(Call::UnloadTexture(texture));
    }

    fn draw_render_batch_active(&mut self) {
        self.calls.push(Call::Flush);
    }
}

#[derive(Debug)]
pub struct FakeAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    pub texture_id: Option<TextureId>,
    pub cleared: bool,
}

impl FakeAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0xff; width as usize * height as usize * 4],
            texture_id: None,
            cleared: false,
        }
    }
}

impl FontAtlasSource for FakeAtlas {
    fn build_rgba32(&mut self) -> AtlasPixels<'_> {
        AtlasPixels { width: self.width, height: self.height, rgba: &self.pixels }
    }

    fn set_texture_id(&mut self, texture: Option<TextureId>) {
        self.texture_id = texture;
    }

    fn clear_tex_data(&mut self) {
        self.cleared = true;
    }
}
