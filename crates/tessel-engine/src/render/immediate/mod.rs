//! Immediate-mode rasterizer.
//!
//! [`Rasterizer`] is the call surface GUI adapters target. [`ImmediateBatch`] is
//! its CPU-side state machine and [`ImmediateRenderer`] the wgpu implementation.
//!
//! Per frame:
//!
//! ```text
//! adapter.render(&mut renderer, draw_data)   // streams vertices + state
//! frame_ctx.render(clear, |ctx, target| renderer.render(ctx, target))
//! ```

mod api;
mod batch;
mod error;
mod renderer;
mod texture;

pub use api::{DrawMode, PixelFormat, Rasterizer, TextureId};
pub use batch::{BatchVertex, DrawCall, ImmediateBatch};
pub use error::TextureError;
pub use renderer::{ImmediateConfig, ImmediateRenderer};
pub use texture::{expand_to_rgba8, TextureRegistry, TextureUpload};
