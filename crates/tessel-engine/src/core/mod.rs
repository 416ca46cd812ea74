//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and the studio or
//! any other embedding application.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
