use anyhow::Result;

use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// Normal shutdown; the process exits with 0.
    Exit,
    /// The frame cannot continue (fatal surface error). The loop closes and
    /// `Runtime::run` returns an error.
    Fatal,
}

/// Application contract implemented by the binary.
///
/// Call order: `on_gpu_ready` once, `on_frame` per redraw while running,
/// `on_exit` exactly once when the loop closes (only if `on_gpu_ready` ran).
pub trait App {
    /// Called once after the window and GPU context exist.
    ///
    /// GPU resources (pipelines, buffers) are created here. An error aborts
    /// startup and is returned from `Runtime::run`.
    fn on_gpu_ready(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the loop leaves the running state, before the GPU
    /// context and window are dropped. Release GPU resources here.
    fn on_exit(&mut self) {}
}
