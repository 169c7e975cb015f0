use anyhow::{Context, Result};

use cubix_engine::core::{App, AppControl, FrameCtx};
use cubix_engine::input::{InputState, Key};
use cubix_engine::paint::Color;
use cubix_engine::render::{CubeRenderer, RenderCtx, ShaderError};
use cubix_engine::scene::{Camera, Projection, Transforms};

/// Spinning cube: one mesh, one program, fixed camera.
pub struct CubeApp {
    camera: Camera,
    projection: Projection,
    renderer: Option<CubeRenderer>,
}

impl CubeApp {
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            projection: Projection::default(),
            renderer: None,
        }
    }

    /// Keeps a successfully built renderer; a shader error aborts startup.
    fn install_renderer(&mut self, built: Result<CubeRenderer, ShaderError>) -> Result<()> {
        let renderer = built.context("failed to build the cube renderer")?;
        log::info!("cube uploaded ({} indices)", renderer.index_count());
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Decides the frame before anything is drawn: `Some` ends the loop.
    fn frame_control(&self, input: &InputState) -> Option<AppControl> {
        if close_requested(input) {
            log::info!("escape pressed");
            return Some(AppControl::Exit);
        }
        if self.renderer.is_none() {
            log::error!("frame requested without a renderer");
            return Some(AppControl::Fatal);
        }
        None
    }
}

impl Default for CubeApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape held → leave the loop.
pub fn close_requested(input: &InputState) -> bool {
    input.key_down(Key::Escape)
}

impl App for CubeApp {
    fn on_gpu_ready(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        self.install_renderer(CubeRenderer::new(ctx))
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Some(control) = self.frame_control(ctx.input) {
            return control;
        }
        let Some(renderer) = self.renderer.as_ref() else {
            return AppControl::Fatal;
        };

        // View and projection are fixed but rebuilt every frame along with the model.
        let transforms = Transforms::for_frame(ctx.time.elapsed, &self.camera, &self.projection);

        ctx.render(Color::DARK_GRAY, |rctx, target| {
            renderer.render(rctx, target, &transforms);
        })
    }

    fn on_exit(&mut self) {
        // Drops the program, mesh buffers and uniform buffer.
        self.renderer = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use cubix_engine::input::{InputEvent, InputFrame, KeyState};
    use cubix_engine::render::{compile_stage, ShaderStage};
    use cubix_engine::window::{CloseReason, Session};

    use super::*;

    #[rustfmt::skip]
    const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];

    /// Stands in for the window entry; counts releases.
    struct Tracked(Rc<Cell<u32>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(
            frame,
            InputEvent::Key { key, state: KeyState::Pressed, code: 0, repeat: false },
        );
    }

    fn broken_shader() -> ShaderError {
        compile_stage("cubix cube", ShaderStage::Vertex, "fn vs_main( -> {").unwrap_err()
    }

    #[test]
    fn only_escape_requests_close() {
        let mut input = InputState::default();
        let mut frame = InputFrame::default();

        press(&mut input, &mut frame, Key::Unknown(62));
        assert!(!close_requested(&input));

        press(&mut input, &mut frame, Key::Escape);
        assert!(close_requested(&input));
    }

    #[test]
    fn escape_wins_over_missing_renderer() {
        let app = CubeApp::new();
        let mut input = InputState::default();
        let mut frame = InputFrame::default();

        assert_eq!(app.frame_control(&input), Some(AppControl::Fatal));

        press(&mut input, &mut frame, Key::Escape);
        assert_eq!(app.frame_control(&input), Some(AppControl::Exit));
    }

    #[test]
    fn launch_first_frame_escape_close_scenario() {
        let released = Rc::new(Cell::new(0));
        let mut session = Session::new(CubeApp::new());
        assert!(session.attach(Tracked(released.clone())).is_ok());

        // First frame: t = 0 → unrotated model.
        let app = session.app_mut();
        let first = Transforms::for_frame(0.0, &app.camera, &app.projection);
        for (got, want) in first.model.to_cols_array().iter().zip(IDENTITY) {
            assert!((got - want).abs() < 1e-6);
        }
        assert!(session.is_running());

        // Escape pressed → the frame ends the loop.
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        press(&mut input, &mut frame, Key::Escape);
        let control = session.app_mut().frame_control(&input);
        assert_eq!(control, Some(AppControl::Exit));

        assert!(session.apply(AppControl::Exit));
        assert_eq!(released.get(), 1);

        // The event loop's own shutdown arriving afterwards changes nothing.
        assert!(!session.shut_down(CloseReason::LoopExited));
        assert_eq!(released.get(), 1);

        assert_eq!(crate::exit_code(&session.finish()), 0);
    }

    #[test]
    fn shader_failure_at_startup_exits_with_minus_one() {
        let mut session: Session<CubeApp, Tracked> = Session::new(CubeApp::new());

        let err = session.app_mut().install_renderer(Err(broken_shader())).unwrap_err();
        assert!(session.app_mut().renderer.is_none());
        session.fail(err, CloseReason::StartupFailed);
        assert!(!session.is_running());

        let result = session.finish();
        let message = format!("{:#}", result.as_ref().unwrap_err());
        assert!(message.contains("failed to build the cube renderer"));
        assert!(message.contains("vertex stage failed to compile"));
        assert_eq!(crate::exit_code(&result), -1);
    }

    #[test]
    fn fatal_surface_error_exits_with_minus_one() {
        let released = Rc::new(Cell::new(0));
        let mut session = Session::new(CubeApp::new());
        assert!(session.attach(Tracked(released.clone())).is_ok());

        assert!(session.apply(AppControl::Fatal));
        assert_eq!(released.get(), 1);
        assert_eq!(crate::exit_code(&session.finish()), -1);
    }
}
