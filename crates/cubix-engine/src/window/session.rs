use anyhow::{anyhow, Result};

use crate::core::{App, AppControl};

use super::lifecycle::{CloseReason, Lifecycle};

/// The application, its per-window resources and the first fatal error.
///
/// Owns every decision taken when the loop closes, so the runtime only has
/// to forward winit callbacks and tell the event loop to exit.
pub struct Session<A, R> {
    app: A,
    lifecycle: Lifecycle<R>,
    fatal: Option<anyhow::Error>,
}

impl<A, R> Session<A, R>
where
    A: App,
{
    pub fn new(app: A) -> Self {
        Self {
            app,
            lifecycle: Lifecycle::new(),
            fatal: None,
        }
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Hands the window resources to the session once startup succeeded.
    pub fn attach(&mut self, resources: R) -> Result<(), R> {
        self.lifecycle.attach(resources)
    }

    pub fn resources_mut(&mut self) -> Option<&mut R> {
        self.lifecycle.resources_mut()
    }

    /// The app and the live resources, borrowed together for a frame.
    pub fn parts_mut(&mut self) -> (&mut A, Option<&mut R>) {
        (&mut self.app, self.lifecycle.resources_mut())
    }

    /// Applies the directive returned by `App::on_frame`.
    ///
    /// Returns `true` when the event loop must exit.
    pub fn apply(&mut self, control: AppControl) -> bool {
        match control {
            AppControl::Continue => false,
            AppControl::Exit => {
                self.shut_down(CloseReason::AppExit);
                true
            }
            AppControl::Fatal => {
                self.fail(
                    anyhow!("fatal surface error, rendering stopped"),
                    CloseReason::SurfaceFailed,
                );
                true
            }
        }
    }

    /// Leaves the running state.
    ///
    /// Returns `true` only for the call that tore the resources down:
    /// `App::on_exit` runs there, before the resources are dropped. Later
    /// calls, or a close before anything was attached, return `false`.
    pub fn shut_down(&mut self, reason: CloseReason) -> bool {
        let Some(resources) = self.lifecycle.close(reason) else {
            return false;
        };

        self.app.on_exit();
        drop(resources);
        log::info!("window and GPU context released");
        true
    }

    /// Records `err` (the first one wins) and shuts down.
    pub fn fail(&mut self, err: anyhow::Error, reason: CloseReason) {
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        self.shut_down(reason);
    }

    /// The run's outcome: the first fatal error, if any.
    pub fn finish(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::core::FrameCtx;

    use super::*;

    /// Counts `on_exit` calls.
    struct CountingApp {
        exits: Rc<Cell<u32>>,
    }

    impl App for CountingApp {
        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_, '_>) -> AppControl {
            AppControl::Continue
        }

        fn on_exit(&mut self) {
            self.exits.set(self.exits.get() + 1);
        }
    }

    /// Counts drops.
    struct Tracked(Rc<Cell<u32>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn running_session() -> (Session<CountingApp, Tracked>, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let exits = Rc::new(Cell::new(0));
        let drops = Rc::new(Cell::new(0));
        let mut session = Session::new(CountingApp { exits: exits.clone() });
        assert!(session.attach(Tracked(drops.clone())).is_ok());
        (session, exits, drops)
    }

    #[test]
    fn continue_keeps_the_loop_running() {
        let (mut session, exits, _) = running_session();
        assert!(!session.apply(AppControl::Continue));
        assert!(session.is_running());
        assert!(session.resources_mut().is_some());
        assert_eq!(exits.get(), 0);
    }

    #[test]
    fn app_exit_then_loop_exit_tears_down_once() {
        let (mut session, exits, drops) = running_session();

        assert!(session.apply(AppControl::Exit));
        assert_eq!((exits.get(), drops.get()), (1, 1));

        // winit follows up with `exiting()`.
        assert!(!session.shut_down(CloseReason::LoopExited));
        assert_eq!((exits.get(), drops.get()), (1, 1));

        assert!(session.finish().is_ok());
    }

    #[test]
    fn window_close_then_loop_exit_tears_down_once() {
        let (mut session, exits, drops) = running_session();

        assert!(session.shut_down(CloseReason::WindowClosed));
        assert!(!session.shut_down(CloseReason::LoopExited));
        // A late escape still asks the loop to exit but tears nothing down.
        assert!(session.apply(AppControl::Exit));

        assert_eq!((exits.get(), drops.get()), (1, 1));
        assert!(session.parts_mut().1.is_none());
    }

    #[test]
    fn fatal_control_closes_with_an_error() {
        let (mut session, exits, drops) = running_session();

        assert!(session.apply(AppControl::Fatal));
        assert_eq!((exits.get(), drops.get()), (1, 1));
        assert!(!session.is_running());

        let err = session.finish().unwrap_err();
        assert!(err.to_string().contains("fatal surface error"));
    }

    #[test]
    fn startup_failure_skips_on_exit_and_refuses_resources() {
        let exits = Rc::new(Cell::new(0));
        let drops = Rc::new(Cell::new(0));
        let mut session: Session<CountingApp, Tracked> =
            Session::new(CountingApp { exits: exits.clone() });

        session.fail(anyhow!("shader failed"), CloseReason::StartupFailed);
        assert_eq!(exits.get(), 0);

        // A window created after the failure is dropped immediately.
        assert!(session.attach(Tracked(drops.clone())).is_err());
        assert_eq!(drops.get(), 1);

        assert!(session.finish().is_err());
    }

    #[test]
    fn first_fatal_error_wins() {
        let (mut session, _, _) = running_session();
        session.fail(anyhow!("first"), CloseReason::StartupFailed);
        session.fail(anyhow!("second"), CloseReason::SurfaceFailed);
        assert_eq!(session.finish().unwrap_err().to_string(), "first");
    }
}
