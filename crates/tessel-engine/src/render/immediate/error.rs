use std::fmt;

use super::PixelFormat;

/// Why a texture could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// Width or height is zero.
    EmptyExtent { width: u32, height: u32 },
    /// Pixel data does not match `width × height` of `format`.
    DataLength {
        format: PixelFormat,
        expected: usize,
        actual: usize,
    },
    /// `mip_levels` was zero.
    NoMipLevels,
    /// The extent exceeds what the backend can allocate.
    TooLarge { width: u32, height: u32, max: u32 },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::EmptyExtent { width, height } => {
                write!(f, "texture extent {width}x{height} is empty")
            }
            TextureError::DataLength { format, expected, actual } => write!(
                f,
                "{format:?} texture needs {expected} bytes of pixel data, got {actual}"
            ),
            TextureError::NoMipLevels => write!(f, "texture must have at least one mip level"),
            TextureError::TooLarge { width, height, max } => {
                write!(f, "texture extent {width}x{height} exceeds the {max}px limit")
            }
        }
    }
}

impl std::error::Error for TextureError {}
