//! GPU rendering subsystem.
//!
//! `immediate` provides an rlgl-style immediate-mode rasterizer: callers stream
//! per-vertex color/texcoord/position calls, the batch records draw calls, and
//! the wgpu backend encodes them once per frame.
//!
//! Convention:
//! - vertex positions are logical pixels (top-left origin, +Y down)
//! - the vertex shader converts to NDC using a viewport uniform
//! - scissor rectangles are physical pixels with a bottom-left origin

mod ctx;
pub mod immediate;

pub use ctx::{RenderCtx, RenderTarget};
