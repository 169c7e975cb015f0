//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the
//! application: startup, per-frame and shutdown hooks plus the per-frame
//! context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
