use bytemuck::{Pod, Zeroable};

use crate::coords::ScissorRect;

use super::{DrawMode, TextureId};

/// Vertex as uploaded to the GPU (20 bytes).
///
///  offset  0  pos    [f32; 2]   loc 0
///  offset  8  uv     [f32; 2]   loc 1
///  offset 16  color  [u8; 4]    loc 2 (unorm)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BatchVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

/// A contiguous run of triangles sharing one texture, scissor and cull state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: Option<TextureId>,
    /// `None` when the scissor test is disabled.
    pub scissor: Option<ScissorRect>,
    pub cull_back_faces: bool,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

impl DrawCall {
    fn same_state(&self, texture: Option<TextureId>, scissor: Option<ScissorRect>, cull: bool) -> bool {
        self.texture == texture && self.scissor == scissor && self.cull_back_faces == cull
    }
}

/// CPU side of the immediate-mode rasterizer.
///
/// Vertices emitted between `begin` and `end` collect in a pending primitive
/// buffer. Completed primitives are committed as triangles to the current draw
/// call whenever state changes, the primitive group ends, or the batch is
/// flushed; a state change opens a new draw call.
#[derive(Debug)]
pub struct ImmediateBatch {
    vertices: Vec<BatchVertex>,
    draws: Vec<DrawCall>,
    /// Set by `flush`; the next commit opens a new draw call.
    sealed: bool,

    mode: Option<DrawMode>,
    pending: Vec<BatchVertex>,

    color: [u8; 4],
    uv: [f32; 2],
    texture: Option<TextureId>,
    scissor_enabled: bool,
    scissor: ScissorRect,
    cull_back_faces: bool,

    warned_outside_begin: bool,
}

impl Default for ImmediateBatch {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            draws: Vec::new(),
            sealed: false,
            mode: None,
            pending: Vec::new(),
            color: [255; 4],
            uv: [0.0; 2],
            texture: None,
            scissor_enabled: false,
            scissor: ScissorRect::default(),
            cull_back_faces: true,
            warned_outside_begin: false,
        }
    }
}

impl ImmediateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            ..Self::default()
        }
    }

    /// Committed vertices, in draw order.
    #[inline]
    pub fn vertices(&self) -> &[BatchVertex] {
        &self.vertices
    }

    #[inline]
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draws
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Drops committed geometry. Latched state (color, texture, scissor,
    /// culling) survives, as it does across rlgl frames.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.draws.clear();
        self.sealed = false;
    }

    pub fn begin(&mut self, mode: DrawMode) {
        if self.mode.is_some() {
            log::trace!("begin() inside an open primitive group; closing it");
            self.end();
        }
        self.mode = Some(mode);
        self.pending.clear();
    }

    pub fn end(&mut self) {
        self.commit_pending();
        if !self.pending.is_empty() {
            log::trace!("dropping {} vertices of an incomplete primitive", self.pending.len());
            self.pending.clear();
        }
        self.mode = None;
    }

    #[inline]
    pub fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.color = [r, g, b, a];
    }

    #[inline]
    pub fn tex_coord2f(&mut self, u: f32, v: f32) {
        self.uv = [u, v];
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) {
        if self.mode.is_none() {
            if !self.warned_outside_begin {
                log::warn!("vertex emitted outside begin()/end(); ignoring");
                self.warned_outside_begin = true;
            }
            return;
        }

        self.pending.push(BatchVertex {
            pos: [x, y],
            uv: self.uv,
            color: self.color,
        });
    }

    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        if self.texture != texture {
            self.commit_pending();
            self.texture = texture;
        }
    }

    pub fn set_scissor_test(&mut self, enabled: bool) {
        if self.scissor_enabled != enabled {
            self.commit_pending();
            self.scissor_enabled = enabled;
        }
    }

    pub fn scissor(&mut self, rect: ScissorRect) {
        if self.scissor != rect {
            self.commit_pending();
            self.scissor = rect;
        }
    }

    pub fn set_backface_culling(&mut self, enabled: bool) {
        if self.cull_back_faces != enabled {
            self.commit_pending();
            self.cull_back_faces = enabled;
        }
    }

    /// Commits pending primitives and seals the current draw call.
    pub fn flush(&mut self) {
        self.commit_pending();
        self.sealed = true;
    }

    #[inline]
    fn active_scissor(&self) -> Option<ScissorRect> {
        self.scissor_enabled.then_some(self.scissor)
    }

    /// Moves every complete primitive from `pending` into the current draw call,
    /// keeping a trailing partial primitive pending.
    fn commit_pending(&mut self) {
        let Some(mode) = self.mode else { return };

        let per = mode.vertices_per_primitive();
        let complete = self.pending.len() - self.pending.len() % per;
        if complete == 0 {
            return;
        }

        let first = self.vertices.len();
        match mode {
            DrawMode::Triangles => self.vertices.extend_from_slice(&self.pending[..complete]),
            DrawMode::Quads => {
                for q in self.pending[..complete].chunks_exact(4) {
                    self.vertices.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
                }
            }
        }
        self.pending.drain(..complete);

        let added = (self.vertices.len() - first) as u32;
        let texture = self.texture;
        let scissor = self.active_scissor();
        let cull = self.cull_back_faces;

        match self.draws.last_mut() {
            Some(last) if !self.sealed && last.same_state(texture, scissor, cull) => {
                last.vertex_count += added;
            }
            _ => self.draws.push(DrawCall {
                texture,
                scissor,
                cull_back_faces: cull,
                first_vertex: first as u32,
                vertex_count: added,
            }),
        }
        self.sealed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(id: u32) -> Option<TextureId> {
        TextureId::new(id)
    }

    fn triangle(batch: &mut ImmediateBatch, x: f32) {
        batch.vertex2f(x, 0.0);
        batch.vertex2f(x + 1.0, 0.0);
        batch.vertex2f(x, 1.0);
    }

    #[test]
    fn latched_color_and_uv_apply_to_vertices() {
        let mut b = ImmediateBatch::new();
        b.begin(DrawMode::Triangles);
        b.color4ub(1, 2, 3, 4);
        b.tex_coord2f(0.25, 0.5);
        b.vertex2f(10.0, 20.0);
        b.vertex2f(11.0, 20.0);
        b.color4ub(9, 9, 9, 9);
        b.vertex2f(10.0, 21.0);
        b.end();

        let v = b.vertices();
        assert_eq!(v.len(), 3);
        assert_eq!(v[0], BatchVertex { pos: [10.0, 20.0], uv: [0.25, 0.5], color: [1, 2, 3, 4] });
        assert_eq!(v[2].color, [9, 9, 9, 9]);
        assert_eq!(b.draw_calls().len(), 1);
        assert_eq!(b.draw_calls()[0].vertex_count, 3);
    }

    #[test]
    fn incomplete_triangle_is_dropped() {
        let mut b = ImmediateBatch::new();
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.vertex2f(5.0, 5.0);
        b.vertex2f(6.0, 5.0);
        b.end();

        assert_eq!(b.vertices().len(), 3);
    }

    #[test]
    fn quads_expand_to_two_triangles() {
        let mut b = ImmediateBatch::new();
        b.begin(DrawMode::Quads);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            b.vertex2f(x, y);
        }
        b.end();

        let pos: Vec<[f32; 2]> = b.vertices().iter().map(|v| v.pos).collect();
        assert_eq!(
            pos,
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
        );
    }

    #[test]
    fn vertices_outside_begin_are_ignored() {
        let mut b = ImmediateBatch::new();
        triangle(&mut b, 0.0);
        assert!(b.is_empty());
        assert!(b.vertices().is_empty());
    }

    #[test]
    fn same_state_merges_into_one_draw_call() {
        let mut b = ImmediateBatch::new();
        b.set_texture(tex(3));
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 5.0);
        b.end();

        assert_eq!(b.draw_calls().len(), 1);
        assert_eq!(b.draw_calls()[0].vertex_count, 6);
        assert_eq!(b.draw_calls()[0].texture, tex(3));
    }

    #[test]
    fn flush_seals_the_draw_call() {
        let mut b = ImmediateBatch::new();
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();
        b.flush();
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 5.0);
        b.end();

        let draws = b.draw_calls();
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[1].first_vertex, draws[1].vertex_count), (3, 3));
    }

    #[test]
    fn state_change_mid_primitive_group_splits_draws() {
        let mut b = ImmediateBatch::new();
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.set_texture(tex(1));
        triangle(&mut b, 5.0);
        b.end();

        let draws = b.draw_calls();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture, None);
        assert_eq!(draws[1].texture, tex(1));
    }

    #[test]
    fn scissor_only_recorded_while_enabled() {
        let mut b = ImmediateBatch::new();
        let rect = ScissorRect::new(1, 2, 3, 4);

        b.scissor(rect);
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();

        b.set_scissor_test(true);
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();

        let draws = b.draw_calls();
        assert_eq!(draws[0].scissor, None);
        assert_eq!(draws[1].scissor, Some(rect));
    }

    #[test]
    fn culling_is_part_of_draw_state() {
        let mut b = ImmediateBatch::new();
        b.set_backface_culling(false);
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();

        assert!(!b.draw_calls()[0].cull_back_faces);
    }

    #[test]
    fn clear_keeps_latched_state() {
        let mut b = ImmediateBatch::new();
        b.set_texture(tex(2));
        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();
        b.clear();
        assert!(b.is_empty());

        b.begin(DrawMode::Triangles);
        triangle(&mut b, 0.0);
        b.end();
        assert_eq!(b.draw_calls()[0].texture, tex(2));
        assert_eq!(b.draw_calls()[0].first_vertex, 0);
    }
}
