//! Color values used by the renderer (clear color).

mod color;

pub use color::Color;
