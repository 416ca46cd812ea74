//! Conversions from the `imgui` crate's types.

use imgui::internal::RawWrapper;
use tessel_engine::render::immediate::TextureId;

use crate::font::{AtlasPixels, FontAtlasSource};
use crate::frame::{CommandList, DrawCommand, DrawData, DrawVert, UserCallback};

/// imgui's texture id for a rasterizer handle; `None` maps to 0.
pub fn to_imgui_texture(texture: Option<TextureId>) -> imgui::TextureId {
    imgui::TextureId::new(texture.map_or(0, |t| t.get() as usize))
}

/// Rasterizer handle for an imgui texture id; 0 and out-of-range ids map to `None`.
pub fn from_imgui_texture(texture: imgui::TextureId) -> Option<TextureId> {
    u32::try_from(texture.id()).ok().and_then(TextureId::new)
}

impl<'a> DrawData<'a> {
    /// Copies a rendered imgui frame.
    ///
    /// Raw callbacks keep pointers into `draw_data`; the borrow keeps them valid
    /// for as long as the returned value lives.
    pub fn from_imgui(draw_data: &'a imgui::DrawData) -> Self {
        let [px, py] = draw_data.display_pos;
        let [w, h] = draw_data.display_size;
        let full_clip = [px, py, px + w, py + h];

        // imgui leaves the list array null on frames without draw lists.
        let cmd_lists = if draw_data.draw_lists_count() == 0 {
            Vec::new()
        } else {
            draw_data
                .draw_lists()
                .map(|list| command_list(list, full_clip))
                .collect()
        };

        Self {
            cmd_lists,
            display_pos: draw_data.display_pos,
            display_size: draw_data.display_size,
            framebuffer_scale: draw_data.framebuffer_scale,
        }
    }
}

fn command_list<'a>(list: &'a imgui::DrawList, full_clip: [f32; 4]) -> CommandList<'a> {
    let vtx_buffer = list
        .vtx_buffer()
        .iter()
        .map(|v| DrawVert {
            pos: v.pos,
            uv: v.uv,
            col: u32::from_le_bytes(v.col),
        })
        .collect();

    let cmd_buffer = list
        .commands()
        .map(|cmd| match cmd {
            imgui::DrawCmd::Elements { count, cmd_params } => DrawCommand {
                clip_rect: cmd_params.clip_rect,
                elem_count: count,
                idx_offset: cmd_params.idx_offset,
                vtx_offset: cmd_params.vtx_offset,
                texture_id: from_imgui_texture(cmd_params.texture_id),
                user_callback: None,
            },
            imgui::DrawCmd::ResetRenderState => {
                DrawCommand::callback(full_clip, UserCallback::ResetRenderState)
            }
            imgui::DrawCmd::RawCallback { callback, raw_cmd } => {
                // SAFETY: `raw_cmd` points into `list`, which outlives 'a.
                let clip = unsafe { (*raw_cmd).ClipRect };
                let raw_list = unsafe { list.raw() } as *const _;
                DrawCommand::callback(
                    [clip.x, clip.y, clip.z, clip.w],
                    // SAFETY: both pointers stay valid while the imgui draw data is borrowed.
                    UserCallback::new(move |_, _| unsafe { callback(raw_list, raw_cmd) }),
                )
            }
        })
        .collect();

    CommandList {
        vtx_buffer,
        idx_buffer: list.idx_buffer().to_vec(),
        cmd_buffer,
    }
}

impl FontAtlasSource for imgui::FontAtlas {
    fn build_rgba32(&mut self) -> AtlasPixels<'_> {
        let texture = self.build_rgba32_texture();
        AtlasPixels {
            width: texture.width,
            height: texture.height,
            rgba: texture.data,
        }
    }

    fn set_texture_id(&mut self, texture: Option<TextureId>) {
        self.tex_id = to_imgui_texture(texture);
    }

    fn clear_tex_data(&mut self) {
        imgui::FontAtlas::clear_tex_data(self);
    }
}
