//! Dear ImGui rendering through the tessel immediate-mode rasterizer.
//!
//! - [`DrawDataRenderer`] turns a frame's [`DrawData`] into scissored, textured
//!   triangles on any [`Rasterizer`](tessel_engine::render::immediate::Rasterizer).
//! - [`FontTextureManager`] owns the font atlas texture.
//! - [`Renderer`] bundles both and wires them to an `imgui::Context`.

mod bridge;
mod draw;
mod font;
mod frame;
mod renderer;

#[cfg(test)]
mod testing;

pub use bridge::{from_imgui_texture, to_imgui_texture};
pub use draw::{scissor_rect, DrawDataRenderer, FrameStats};
pub use font::{AtlasPixels, FontAtlasSource, FontTextureManager};
pub use frame::{unpack_color, CommandList, DrawCommand, DrawData, DrawIdx, DrawVert, UserCallback};
pub use renderer::Renderer;
