//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! drives the application through the running → closing lifecycle.

mod lifecycle;
mod runtime;
mod session;

pub use lifecycle::{CloseReason, Lifecycle, LoopState};
pub use runtime::{Runtime, RuntimeConfig};
pub use session::Session;
