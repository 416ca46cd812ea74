use std::collections::BTreeSet;

use super::{PixelFormat, TextureError, TextureId};

/// A validated texture waiting for the next GPU upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUpload {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub rgba: Vec<u8>,
}

/// Texture handle bookkeeping, independent of the GPU.
///
/// Loads and unloads are queued; the renderer drains them once per frame
/// (uploads before encoding, releases after), so a texture unloaded mid-frame
/// still renders the geometry already batched against it.
#[derive(Debug)]
pub struct TextureRegistry {
    next_id: u32,
    max_extent: u32,
    live: BTreeSet<TextureId>,
    uploads: Vec<TextureUpload>,
    releases: Vec<TextureId>,
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new(wgpu::Limits::default().max_texture_dimension_2d)
    }
}

impl TextureRegistry {
    pub fn new(max_extent: u32) -> Self {
        Self {
            next_id: 1,
            max_extent,
            live: BTreeSet::new(),
            uploads: Vec::new(),
            releases: Vec::new(),
        }
    }

    /// Whether `id` is loaded and not yet unloaded.
    #[inline]
    pub fn contains(&self, id: TextureId) -> bool {
        self.live.contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Validates `pixels` and queues an upload under a fresh id.
    pub fn load(
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
        if width > self.max_extent || height > self.max_extent {
            return Err(TextureError::TooLarge { width, height, max: self.max_extent });
        }
        if mip_levels == 0 {
            return Err(TextureError::NoMipLevels);
        }

        let expected = width as usize * height as usize * format.bytes_per_pixel();
        // Extra mip levels may follow the base level; only the base is read.
        let too_short = pixels.len() < expected;
        let exact_required = mip_levels == 1 && pixels.len() != expected;
        if too_short || exact_required {
            return Err(TextureError::DataLength { format, expected, actual: pixels.len() });
        }
        if mip_levels > 1 {
            log::debug!("texture has {mip_levels} mip levels; uploading the base level only");
        }

        let id = self.allocate_id();
        self.live.insert(id);
        self.uploads.push(TextureUpload {
            id,
            width,
            height,
            rgba: expand_to_rgba8(&pixels[..expected], format),
        });

        log::debug!("texture {} queued ({width}x{height} {format:?})", id.get());
        Ok(id)
    }

    /// Releases `id`. A texture unloaded before its upload is never uploaded.
    pub fn unload(&mut self, id: TextureId) {
        if !self.live.remove(&id) {
            log::warn!("unload of unknown texture {}", id.get());
            return;
        }

        let before = self.uploads.len();
        self.uploads.retain(|u| u.id != id);
        if self.uploads.len() == before {
            self.releases.push(id);
        }
        log::debug!("texture {} released", id.get());
    }

    /// Takes the uploads queued since the last call.
    pub fn take_uploads(&mut self) -> Vec<TextureUpload> {
        std::mem::take(&mut self.uploads)
    }

    /// Takes the releases queued since the last call.
    pub fn take_releases(&mut self) -> Vec<TextureId> {
        std::mem::take(&mut self.releases)
    }

    fn allocate_id(&mut self) -> TextureId {
        loop {
            let raw = self.next_id;
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if let Some(id) = TextureId::new(raw) {
                if !self.live.contains(&id) {
                    return id;
                }
            }
        }
    }
}

/// Converts tightly packed pixels of `format` to RGBA8.
pub fn expand_to_rgba8(pixels: &[u8], format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::R8G8B8A8 => pixels.to_vec(),
        PixelFormat::Grayscale => pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        PixelFormat::GrayAlpha => pixels
            .chunks_exact(2)
            .flat_map(|la| [la[0], la[0], la[0], la[1]])
            .collect(),
    }
}
