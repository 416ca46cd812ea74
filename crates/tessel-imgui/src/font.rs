//! Font atlas texture ownership.

use tessel_engine::render::immediate::{PixelFormat, Rasterizer, TextureError, TextureId};

/// RGBA8 pixels of a built font atlas, borrowed from the atlas.
#[derive(Debug, Copy, Clone)]
pub struct AtlasPixels<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

/// The parts of a GUI font atlas the texture manager touches.
pub trait FontAtlasSource {
    /// Builds the atlas (if needed) and returns its RGBA8 pixels.
    fn build_rgba32(&mut self) -> AtlasPixels<'_>;

    /// Stores the texture the GUI library should reference for font glyphs.
    fn set_texture_id(&mut self, texture: Option<TextureId>);

    /// Drops the CPU copy of the atlas pixels.
    fn clear_tex_data(&mut self);
}

/// Owns the font atlas texture on the rasterizer.
///
/// Starts with no texture. [`refresh_font_texture`](Self::refresh_font_texture) replaces
/// whatever is bound; [`invalidate_device_objects`](Self::invalidate_device_objects)
/// releases it.
#[derive(Debug, Default)]
pub struct FontTextureManager {
    texture: Option<TextureId>,
}

impl FontTextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Uploads the atlas as a new texture, releasing the previous one first.
    ///
    /// On failure no texture is bound and the atlas texture id is cleared.
    pub fn refresh_font_texture<R, A>(&mut self, rl: &mut R, atlas: &mut A) -> Result<TextureId, TextureError>
    where
        R: Rasterizer + ?Sized,
        A: FontAtlasSource + ?Sized,
    {
        let loaded = {
            let pixels = atlas.build_rgba32();
            if let Some(old) = self.texture.take() {
                rl.unload_texture(old);
            }
            rl.load_texture(pixels.rgba, pixels.width, pixels.height, PixelFormat::R8G8B8A8, 1)
                .map(|id| (id, pixels.width, pixels.height))
        };

        match loaded {
            Ok((id, width, height)) => {
                log::debug!("font atlas uploaded: {width}x{height} as texture {}", id.get());
                self.texture = Some(id);
                atlas.set_texture_id(Some(id));
                atlas.clear_tex_data();
                Ok(id)
            }
            Err(err) => {
                log::error!("font atlas upload failed: {err}");
                atlas.set_texture_id(None);
                Err(err)
            }
        }
    }

    /// Releases the font texture, if any, and clears the atlas texture id.
    pub fn invalidate_device_objects<R, A>(&mut self, rl: &mut R, atlas: &mut A)
    where
        R: Rasterizer + ?Sized,
        A: FontAtlasSource + ?Sized,
    {
        if let Some(texture) = self.texture.take() {
            rl.unload_texture(texture);
        }
        atlas.set_texture_id(None);
    }
}
