//! Color types used outside the vertex stream (clear colors).
//!
//! Vertex colors travel as packed `u8` RGBA through the rasterizer and are not
//! represented here.

pub mod color;

pub use color::Color;
