//! Draw data → rasterizer calls.

use tessel_engine::coords::ScissorRect;
use tessel_engine::render::immediate::{DrawMode, Rasterizer};

use crate::frame::{unpack_color, CommandList, DrawCommand, DrawData, DrawVert, UserCallback};

/// Counters from the most recent [`DrawDataRenderer::render`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Commands that emitted geometry.
    pub commands: usize,
    pub triangles: usize,
    pub callbacks: usize,
    /// Triangles dropped because an index pointed outside the vertex buffer.
    pub skipped_triangles: usize,
}

/// Rasterizer scissor for a clip rectangle, bottom-left origin in framebuffer pixels.
pub fn scissor_rect(clip_rect: [f32; 4], draw_data: &DrawData<'_>) -> ScissorRect {
    let [x0, y0, x1, y1] = clip_rect;
    let [dx, dy] = draw_data.display_pos;
    let display_h = draw_data.display_size[1];
    let [sx, sy] = draw_data.framebuffer_scale;

    ScissorRect::new(
        ((x0 - dx) * sx).round() as i32,
        ((display_h - (y1 - dy)) * sy).round() as i32,
        ((x1 - x0) * sx).round() as i32,
        ((y1 - y0) * sy).round() as i32,
    )
}

/// Walks a frame's command lists and feeds every triangle to a [`Rasterizer`].
#[derive(Debug, Default)]
pub struct DrawDataRenderer {
    stats: FrameStats,
}

impl DrawDataRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Renders one frame. `None` issues no calls at all.
    pub fn render<R: Rasterizer + ?Sized>(&mut self, rl: &mut R, draw_data: Option<&DrawData<'_>>) {
        let Some(data) = draw_data else {
            return;
        };

        let mut stats = FrameStats::default();
        setup_render_state(rl);

        for list in &data.cmd_lists {
            for cmd in &list.cmd_buffer {
                let rect = scissor_rect(cmd.clip_rect, data);
                rl.enable_scissor_test();
                rl.scissor(rect.x, rect.y, rect.width, rect.height);

                match &cmd.user_callback {
                    Some(UserCallback::ResetRenderState) => {
                        setup_render_state(rl);
                        stats.callbacks += 1;
                        continue;
                    }
                    Some(UserCallback::Custom(callback)) => {
                        callback(list, cmd);
                        stats.callbacks += 1;
                        continue;
                    }
                    None => {}
                }

                if cmd.elem_count >= 3 {
                    emit_triangles(rl, list, cmd, &mut stats);
                    stats.commands += 1;
                }
                rl.draw_render_batch_active();
            }
        }

        rl.set_texture(None);
        rl.enable_backface_culling();
        rl.disable_scissor_test();

        if stats.skipped_triangles > 0 {
            log::warn!(
                "skipped {} triangle(s) with out-of-range vertex indices",
                stats.skipped_triangles
            );
        }
        log::trace!(
            "imgui frame: {} lists, {} commands, {} triangles",
            data.cmd_lists_count(),
            stats.commands,
            stats.triangles
        );
        self.stats = stats;
    }
}

/// GUI geometry is two-sided; culling stays off until the frame ends.
fn setup_render_state<R: Rasterizer + ?Sized>(rl: &mut R) {
    rl.draw_render_batch_active();
    rl.disable_backface_culling();
}

fn emit_triangles<R: Rasterizer + ?Sized>(
    rl: &mut R,
    list: &CommandList<'_>,
    cmd: &DrawCommand<'_>,
    stats: &mut FrameStats,
) {
    let whole = cmd.elem_count - cmd.elem_count % 3;
    let start = cmd.idx_offset.min(list.idx_buffer.len());
    let end = (cmd.idx_offset + whole).min(list.idx_buffer.len());
    let indices = &list.idx_buffer[start..end];
    let vertex = |idx: u16| list.vtx_buffer.get(cmd.vtx_offset + usize::from(idx));

    rl.set_texture(cmd.texture_id);
    rl.begin(DrawMode::Triangles);
    for tri in indices.chunks_exact(3) {
        match (vertex(tri[0]), vertex(tri[1]), vertex(tri[2])) {
            (Some(a), Some(b), Some(c)) => {
                emit_vertex(rl, a);
                emit_vertex(rl, b);
                emit_vertex(rl, c);
                stats.triangles += 1;
            }
            _ => stats.skipped_triangles += 1,
        }
    }
    stats.skipped_triangles += (whole / 3).saturating_sub(indices.len() / 3);
    rl.end();
}

#[inline]
fn emit_vertex<R: Rasterizer + ?Sized>(rl: &mut R, v: &DrawVert) {
    let [r, g, b, a] = unpack_color(v.col);
    rl.color4ub(r, g, b, a);
    rl.tex_coord2f(v.uv[0], v.uv[1]);
    rl.vertex2f(v.pos[0], v.pos[1]);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tessel_engine::render::immediate::TextureId;

    use super::*;
    use crate::testing::{Call, RecordingRasterizer};

    fn vert(x: f32, y: f32, col: u32) -> DrawVert {
        DrawVert { pos: [x, y], uv: [x / 100.0, y / 100.0], col }
    }

    fn frame<'a>(lists: Vec<CommandList<'a>>) -> DrawData<'a> {
        DrawData {
            cmd_lists: lists,
            display_pos: [0.0, 0.0],
            display_size: [800.0, 600.0],
            framebuffer_scale: [1.0, 1.0],
        }
    }

    fn quad_list<'a>(cmds: Vec<DrawCommand<'a>>) -> CommandList<'a> {
        CommandList {
            vtx_buffer: vec![
                vert(0.0, 0.0, 0xFF00_00FF),
                vert(10.0, 0.0, 0xFF00_FF00),
                vert(10.0, 10.0, 0xFFFF_0000),
                vert(0.0, 10.0, 0xAABB_CCDD),
            ],
            idx_buffer: vec![0, 1, 2, 0, 2, 3],
            cmd_buffer: cmds,
        }
    }

    const FULL: [f32; 4] = [0.0, 0.0, 800.0, 600.0];

    #[test]
    fn none_issues_no_calls() {
        let mut rl = RecordingRasterizer::default();
        DrawDataRenderer::new().render(&mut rl, None);
        assert!(rl.calls.is_empty());
    }

    #[test]
    fn empty_frame_only_sets_and_restores_state() {
        let mut rl = RecordingRasterizer::default();
        DrawDataRenderer::new().render(&mut rl, Some(&frame(Vec::new())));
        assert_eq!(
            rl.calls,
            vec![
                Call::Flush,
                Call::DisableCulling,
                Call::SetTexture(None),
                Call::EnableCulling,
                Call::DisableScissor,
            ]
        );
    }

    #[test]
    fn short_commands_emit_no_geometry_but_still_flush() {
        let mut rl = RecordingRasterizer::default();
        let data = frame(vec![quad_list(vec![DrawCommand::elements(FULL, 2, 0, None)])]);
        let mut renderer = DrawDataRenderer::new();
        renderer.render(&mut rl, Some(&data));

        assert_eq!(rl.vertex_count(), 0);
        assert!(!rl.calls.contains(&Call::Begin(DrawMode::Triangles)));
        assert_eq!(rl.calls.iter().filter(|c| **c == Call::Flush).count(), 2);
        assert_eq!(renderer.last_frame_stats().commands, 0);
    }

    #[test]
    fn six_indices_emit_color_texcoord_vertex_per_vertex() {
        let mut rl = RecordingRasterizer::default();
        let data = frame(vec![quad_list(vec![DrawCommand::elements(FULL, 6, 0, None)])]);
        DrawDataRenderer::new().render(&mut rl, Some(&data));

        let begin = rl.calls.iter().position(|c| *c == Call::Begin(DrawMode::Triangles)).unwrap();
        let end = rl.calls.iter().position(|c| *c == Call::End).unwrap();
        let body = &rl.calls[begin + 1..end];
        assert_eq!(body.len(), 18);
        for triple in body.chunks_exact(3) {
            assert!(matches!(triple[0], Call::Color(..)));
            assert!(matches!(triple[1], Call::TexCoord(..)));
            assert!(matches!(triple[2], Call::Vertex(..)));
        }

        let positions: Vec<_> = body
            .iter()
            .filter_map(|c| match c {
                Call::Vertex(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(
            positions,
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
        );
        assert_eq!(body[15], Call::Color(0xDD, 0xCC, 0xBB, 0xAA));
    }

    #[test]
    fn command_sequence_matches_rlgl_order() {
        let tex = TextureId::new(7);
        let mut rl = RecordingRasterizer::default();
        let data = frame(vec![quad_list(vec![DrawCommand::elements(FULL, 3, 0, tex)])]);
        DrawDataRenderer::new().render(&mut rl, Some(&data));

        assert_eq!(&rl.calls[..6], &[
            Call::Flush,
            Call::DisableCulling,
            Call::EnableScissor,
            Call::Scissor(0, 0, 800, 600),
            Call::SetTexture(tex),
            Call::Begin(DrawMode::Triangles),
        ]);
        assert_eq!(&rl.calls[rl.calls.len() - 5..], &[
            Call::End,
            Call::Flush,
            Call::SetTexture(None),
            Call::EnableCulling,
            Call::DisableScissor,
        ]);
    }

    #[test]
    fn remainder_indices_are_dropped() {
        let mut rl = RecordingRasterizer::default();
        let data = frame(vec![quad_list(vec![DrawCommand::elements(FULL, 5, 0, None)])]);
        let mut renderer = DrawDataRenderer::new();
        renderer.render(&mut rl, Some(&data));
        assert_eq!(rl.vertex_count(), 3);
        assert_eq!(renderer.last_frame_stats().triangles, 1);
    }

    #[test]
    fn idx_and_vtx_offsets_resolve_vertices() {
        let mut list = quad_list(Vec::new());
        list.vtx_buffer.push(vert(50.0, 60.0, 0));
        list.idx_buffer.extend_from_slice(&[0, 1, 2]);
        let mut cmd = DrawCommand::elements(FULL, 3, 6, None);
        cmd.vtx_offset = 2;
        list.cmd_buffer.push(cmd);

        let mut rl = RecordingRasterizer::default();
        DrawDataRenderer::new().render(&mut rl, Some(&frame(vec![list])));
        assert_eq!(rl.positions(), vec![(10.0, 10.0), (0.0, 10.0), (50.0, 60.0)]);
    }

    #[test]
    fn out_of_range_indices_skip_the_triangle() {
        let mut list = quad_list(Vec::new());
        list.idx_buffer = vec![0, 1, 9, 0, 2, 3];
        list.cmd_buffer.push(DrawCommand::elements(FULL, 6, 0, None));

        let mut rl = RecordingRasterizer::default();
        let mut renderer = DrawDataRenderer::new();
        renderer.render(&mut rl, Some(&frame(vec![list])));
        assert_eq!(rl.vertex_count(), 3);
        assert_eq!(renderer.last_frame_stats().skipped_triangles, 1);
    }

    #[test]
    fn scissor_flips_to_bottom_left_and_scales() {
        let data = DrawData {
            cmd_lists: Vec::new(),
            display_pos: [0.0, 0.0],
            display_size: [800.0, 600.0],
            framebuffer_scale: [2.0, 2.0],
        };
        assert_eq!(
            scissor_rect([10.0, 20.0, 110.0, 70.0], &data),
            ScissorRect::new(20, 1060, 200, 100)
        );
    }

    #[test]
    fn scissor_subtracts_display_origin_and_rounds() {
        let data = DrawData {
            cmd_lists: Vec::new(),
            display_pos: [100.0, 50.0],
            display_size: [400.0, 300.0],
            framebuffer_scale: [1.5, 1.5],
        };
        // x: (110.3 - 100) * 1.5 = 15.45, y: (300 - (150 - 50)) * 1.5 = 300
        assert_eq!(
            scissor_rect([110.3, 60.0, 130.3, 150.0], &data),
            ScissorRect::new(15, 300, 30, 135)
        );
    }

    #[test]
    fn custom_callback_runs_instead_of_geometry() {
        let hits = Cell::new(0);
        let mut list = quad_list(Vec::new());
        list.cmd_buffer.push(DrawCommand::callback(
            [0.0, 0.0, 100.0, 100.0],
            UserCallback::new(|l, c| {
                assert_eq!(l.vtx_buffer.len(), 4);
                assert_eq!(c.clip_rect[2], 100.0);
                hits.set(hits.get() + 1);
            }),
        ));
        list.cmd_buffer.push(DrawCommand::elements(FULL, 3, 0, None));

        let mut rl = RecordingRasterizer::default();
        let mut renderer = DrawDataRenderer::new();
        renderer.render(&mut rl, Some(&frame(vec![list])));

        assert_eq!(hits.get(), 1);
        assert_eq!(rl.vertex_count(), 3);
        assert_eq!(renderer.last_frame_stats().callbacks, 1);
        // Scissor is set for the callback command too.
        assert_eq!(rl.calls[2], Call::EnableScissor);
        assert_eq!(rl.calls[3], Call::Scissor(0, 500, 100, 100));
    }

    #[test]
    fn reset_render_state_reapplies_pre_state() {
        let mut list = quad_list(Vec::new());
        list.cmd_buffer.push(DrawCommand::callback(FULL, UserCallback::ResetRenderState));

        let mut rl = RecordingRasterizer::default();
        DrawDataRenderer::new().render(&mut rl, Some(&frame(vec![list])));
        assert_eq!(
            rl.calls,
            vec![
                Call::Flush,
                Call::DisableCulling,
                Call::EnableScissor,
                Call::Scissor(0, 0, 800, 600),
                Call::Flush,
                Call::DisableCulling,
                Call::SetTexture(None),
                Call::EnableCulling,
                Call::DisableScissor,
            ]
        );
    }

    #[test]
    fn each_command_is_flushed_separately() {
        let list = quad_list(vec![
            DrawCommand::elements(FULL, 3, 0, TextureId::new(1)),
            DrawCommand::elements(FULL, 3, 3, TextureId::new(2)),
        ]);
        let mut rl = RecordingRasterizer::default();
        DrawDataRenderer::new().render(&mut rl, Some(&frame(vec![list])));

        let ends: Vec<usize> = rl
            .calls
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Call::End)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ends.len(), 2);
        for i in ends {
            assert_eq!(rl.calls[i + 1], Call::Flush);
        }
    }
}
