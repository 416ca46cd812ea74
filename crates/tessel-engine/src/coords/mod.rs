//! Coordinate types shared by the rasterizer and its callers.
//!
//! Two spaces meet here:
//! - logical pixels, origin top-left, +Y down (GUI geometry, viewport)
//! - physical framebuffer pixels, origin bottom-left (scissor rectangles, GL style)
//!
//! wgpu itself is top-left; `ScissorRect::to_top_left` is the only place that flips.

mod scissor;
mod viewport;

pub use scissor::ScissorRect;
pub use viewport::Viewport;
