//! Time subsystem.
//!
//! One `FrameClock` per window; `tick()` once per presented frame. The resulting
//! delta feeds the GUI context's frame timing.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
