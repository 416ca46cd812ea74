//! Tessel engine crate.
//!
//! Owns the platform + GPU runtime pieces and the immediate-mode rasterizer that
//! higher layers (the imgui adapter, the studio) draw through.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
