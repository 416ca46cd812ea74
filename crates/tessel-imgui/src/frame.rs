//! Per-frame draw data, shaped like Dear ImGui's `ImDrawData`.
//!
//! The adapter only reads these types. They can be built from `imgui::DrawData`
//! (`DrawData::from_imgui`) or by hand.

use std::fmt;

use tessel_engine::render::immediate::TextureId;

/// Index into a command list's vertex buffer.
pub type DrawIdx = u16;

/// One GUI vertex.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DrawVert {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    /// Packed RGBA; see [`unpack_color`].
    pub col: u32,
}

/// Splits a packed color into `[r, g, b, a]`.
///
/// R is bits `[0, 8)`, G `[8, 16)`, B `[16, 24)` and A `[24, 32)`.
#[inline]
pub const fn unpack_color(col: u32) -> [u8; 4] {
    [
        (col & 0xff) as u8,
        ((col >> 8) & 0xff) as u8,
        ((col >> 16) & 0xff) as u8,
        ((col >> 24) & 0xff) as u8,
    ]
}

/// A draw command that replaces geometry with caller code.
pub enum UserCallback<'a> {
    /// Restore the renderer's own render state (`ImDrawCallback_ResetRenderState`).
    ResetRenderState,
    /// Invoked with the owning command list and the command itself.
    Custom(Box<dyn Fn(&CommandList<'a>, &DrawCommand<'a>) + 'a>),
}

impl<'a> UserCallback<'a> {
    pub fn new(f: impl Fn(&CommandList<'a>, &DrawCommand<'a>) + 'a) -> Self {
        UserCallback::Custom(Box::new(f))
    }
}

impl fmt::Debug for UserCallback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserCallback::ResetRenderState => f.write_str("ResetRenderState"),
            UserCallback::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A batch of triangles sharing one clip rectangle and texture, or a callback.
#[derive(Debug)]
pub struct DrawCommand<'a> {
    /// `[x0, y0, x1, y1]` in display coordinates.
    pub clip_rect: [f32; 4],
    /// Number of indices, normally a multiple of 3.
    pub elem_count: usize,
    /// First index in the list's index buffer.
    pub idx_offset: usize,
    /// Added to every index before the vertex lookup.
    pub vtx_offset: usize,
    pub texture_id: Option<TextureId>,
    pub user_callback: Option<UserCallback<'a>>,
}

impl<'a> DrawCommand<'a> {
    /// A geometry command.
    pub fn elements(
        clip_rect: [f32; 4],
        elem_count: usize,
        idx_offset: usize,
        texture_id: Option<TextureId>,
    ) -> Self {
        Self {
            clip_rect,
            elem_count,
            idx_offset,
            vtx_offset: 0,
            texture_id,
            user_callback: None,
        }
    }

    /// A callback command clipped to `clip_rect`.
    pub fn callback(clip_rect: [f32; 4], callback: UserCallback<'a>) -> Self {
        Self {
            clip_rect,
            elem_count: 0,
            idx_offset: 0,
            vtx_offset: 0,
            texture_id: None,
            user_callback: Some(callback),
        }
    }
}

/// Vertex/index buffers plus the commands indexing into them.
#[derive(Debug, Default)]
pub struct CommandList<'a> {
    pub vtx_buffer: Vec<DrawVert>,
    pub idx_buffer: Vec<DrawIdx>,
    pub cmd_buffer: Vec<DrawCommand<'a>>,
}

/// Everything needed to render one GUI frame.
#[derive(Debug)]
pub struct DrawData<'a> {
    pub cmd_lists: Vec<CommandList<'a>>,
    /// Top-left of the displayed area in display coordinates.
    pub display_pos: [f32; 2],
    pub display_size: [f32; 2],
    /// Framebuffer pixels per display unit.
    pub framebuffer_scale: [f32; 2],
}

impl Default for DrawData<'_> {
    fn default() -> Self {
        Self {
            cmd_lists: Vec::new(),
            display_pos: [0.0, 0.0],
            display_size: [0.0, 0.0],
            framebuffer_scale: [1.0, 1.0],
        }
    }
}

impl<'a> DrawData<'a> {
    #[inline]
    pub fn cmd_lists_count(&self) -> usize {
        self.cmd_lists.len()
    }

    pub fn total_vtx_count(&self) -> usize {
        self.cmd_lists.iter().map(|l| l.vtx_buffer.len()).sum()
    }

    pub fn total_idx_count(&self) -> usize {
        self.cmd_lists.iter().map(|l| l.idx_buffer.len()).sum()
    }
}
