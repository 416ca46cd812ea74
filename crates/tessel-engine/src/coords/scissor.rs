/// Scissor rectangle in physical framebuffer pixels, bottom-left origin.
///
/// Width/height may be zero or negative when a caller computes them from a
/// degenerate clip rect; such rects clip everything.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScissorRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Converts to a top-left origin `(x, y, w, h)` clamped to a target of
    /// `target_width × target_height`.
    ///
    /// Returns `None` when nothing of the rect is visible.
    pub fn to_top_left(self, target_width: u32, target_height: u32) -> Option<(u32, u32, u32, u32)> {
        let tw = i64::from(target_width);
        let th = i64::from(target_height);

        let left = i64::from(self.x);
        let right = left + i64::from(self.width);
        let bottom = i64::from(self.y);
        let top = bottom + i64::from(self.height);

        let x0 = left.clamp(0, tw);
        let x1 = right.clamp(0, tw);
        let y0 = (th - top).clamp(0, th);
        let y1 = (th - bottom).clamp(0, th);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        // All four values are within [0, u32::MAX] after clamping.
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_vertical_axis() {
        let r = ScissorRect::new(10, 100, 50, 20);
        assert_eq!(r.to_top_left(800, 600), Some((10, 480, 50, 20)));
    }

    #[test]
    fn full_target_round_trips() {
        let r = ScissorRect::new(0, 0, 800, 600);
        assert_eq!(r.to_top_left(800, 600), Some((0, 0, 800, 600)));
    }

    #[test]
    fn clamps_to_target() {
        // Extends past the left, right and top edges.
        let r = ScissorRect::new(-20, 500, 900, 200);
        assert_eq!(r.to_top_left(800, 600), Some((0, 0, 800, 100)));
    }

    #[test]
    fn empty_and_negative_rects_are_invisible() {
        assert_eq!(ScissorRect::new(10, 10, 0, 10).to_top_left(800, 600), None);
        assert_eq!(ScissorRect::new(10, 10, 10, -5).to_top_left(800, 600), None);
    }

    #[test]
    fn offscreen_rect_is_invisible() {
        assert_eq!(ScissorRect::new(900, 10, 50, 50).to_top_left(800, 600), None);
        assert_eq!(ScissorRect::new(10, -80, 50, 50).to_top_left(800, 600), None);
    }
}
