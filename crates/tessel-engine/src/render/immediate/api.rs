use std::num::NonZeroU32;

use super::TextureError;

/// Handle of a texture loaded through [`Rasterizer::load_texture`].
///
/// Never zero; "no texture" is `Option::<TextureId>::None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(NonZeroU32);

impl TextureId {
    /// Wraps a raw handle. `0` is the "no texture" sentinel and yields `None`.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Primitive assembled from vertices between `begin` and `end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    /// Every 3 vertices form a triangle.
    Triangles,
    /// Every 4 vertices form a quad (split into two triangles).
    Quads,
}

impl DrawMode {
    /// Vertices consumed per primitive.
    #[inline]
    pub const fn vertices_per_primitive(self) -> usize {
        match self {
            DrawMode::Triangles => 3,
            DrawMode::Quads => 4,
        }
    }
}

/// Layout of pixel data passed to [`Rasterizer::load_texture`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luminance.
    Grayscale,
    /// 8-bit luminance + 8-bit alpha.
    GrayAlpha,
    /// 8 bits per channel RGBA.
    R8G8B8A8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Grayscale => 1,
            PixelFormat::GrayAlpha => 2,
            PixelFormat::R8G8B8A8 => 4,
        }
    }
}

/// rlgl-style immediate-mode rasterization calls.
///
/// State (color, texcoord, texture, scissor, culling) is latched: it applies to
/// every vertex emitted until it changes. Geometry is only guaranteed to be
/// ordered against state changes at `draw_render_batch_active` boundaries.
pub trait Rasterizer {
    /// Starts assembling primitives of `mode`.
    fn begin(&mut self, mode: DrawMode);

    /// Finishes the primitives started by `begin`. Incomplete primitives are dropped.
    fn end(&mut self);

    /// Sets the color of subsequent vertices.
    fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8);

    /// Sets the texture coordinate of subsequent vertices.
    fn tex_coord2f(&mut self, u: f32, v: f32);

    /// Emits a vertex at `(x, y)` logical pixels using the latched color/texcoord.
    fn vertex2f(&mut self, x: f32, y: f32);

    /// Binds `texture` for subsequent geometry; `None` samples plain white.
    fn set_texture(&mut self, texture: Option<TextureId>);

    fn enable_scissor_test(&mut self);

    fn disable_scissor_test(&mut self);

    /// Sets the scissor rectangle in physical pixels, bottom-left origin.
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);

    fn enable_backface_culling(&mut self);

    fn disable_backface_culling(&mut self);

    /// Loads a texture from raw pixels.
    ///
    /// `mip_levels` counts the levels present in `pixels`; only the first is used.
    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        mip_levels: u32,
    ) -> Result<TextureId, TextureError>;

    /// Releases a texture. Unknown handles are ignored.
    fn unload_texture(&mut self, texture: TextureId);

    /// Closes the active batch so later state changes cannot affect it.
    fn draw_render_batch_active(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_no_texture() {
        assert_eq!(TextureId::new(0), None);
        assert_eq!(TextureId::new(7).map(TextureId::get), Some(7));
    }

    #[test]
    fn bytes_per_pixel() {
        assert_eq!(PixelFormat::Grayscale.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::GrayAlpha.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::R8G8B8A8.bytes_per_pixel(), 4);
    }
}
