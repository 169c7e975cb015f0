//! cubix engine crate.
//!
//! Platform + GPU runtime for the rotating cube viewer: window and event
//! loop, wgpu device and surface, frame timing, keyboard input, and the cube
//! renderer with its CPU-side scene data.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
