//! Color values consumed by the GPU command boundary.

mod color;

pub use color::Color;
