use std::fmt;

/// State of the render loop. `Closing` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Closing,
}

/// Why the loop left the running state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CloseReason {
    /// The application asked to exit (escape key).
    AppExit,
    /// The window system delivered a close request.
    WindowClosed,
    /// Window, GPU or application startup failed.
    StartupFailed,
    /// A fatal surface error stopped rendering.
    SurfaceFailed,
    /// The event loop is shutting down on its own.
    LoopExited,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::AppExit => "application exit",
            CloseReason::WindowClosed => "window closed",
            CloseReason::StartupFailed => "startup failed",
            CloseReason::SurfaceFailed => "surface failed",
            CloseReason::LoopExited => "event loop exited",
        };
        f.write_str(s)
    }
}

/// Two-state loop lifecycle owning the per-window resources.
///
/// Resources can only be reached while running. The single
/// `Running → Closing` transition hands them back to the caller exactly
/// once; every later close request is a no-op.
#[derive(Debug)]
pub struct Lifecycle<R> {
    state: LoopState,
    resources: Option<R>,
}

impl<R> Default for Lifecycle<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Lifecycle<R> {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            resources: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn has_resources(&self) -> bool {
        self.resources.is_some()
    }

    /// Stores the resources. Once closing, they are handed straight back.
    pub fn attach(&mut self, resources: R) -> Result<(), R> {
        if !self.is_running() {
            return Err(resources);
        }
        self.resources = Some(resources);
        Ok(())
    }

    pub fn resources_mut(&mut self) -> Option<&mut R> {
        match self.state {
            LoopState::Running => self.resources.as_mut(),
            LoopState::Closing => None,
        }
    }

    /// Transitions to `Closing`.
    ///
    /// Returns the resources on the first call only; the caller tears them
    /// down. `None` when already closing or nothing was attached.
    pub fn close(&mut self, reason: CloseReason) -> Option<R> {
        if self.state == LoopState::Closing {
            return None;
        }

        log::info!("render loop closing: {reason}");
        self.state = LoopState::Closing;
        self.resources.take()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Counts how many times it has been dropped.
    struct Tracked(Rc<Cell<u32>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn starts_running_without_resources() {
        let lc: Lifecycle<u32> = Lifecycle::new();
        assert_eq!(lc.state(), LoopState::Running);
        assert!(!lc.has_resources());
    }

    #[test]
    fn close_transitions_exactly_once() {
        let mut lc = Lifecycle::new();
        lc.attach(7u32).unwrap();

        assert_eq!(lc.close(CloseReason::AppExit), Some(7));
        assert_eq!(lc.state(), LoopState::Closing);

        assert_eq!(lc.close(CloseReason::WindowClosed), None);
        assert_eq!(lc.close(CloseReason::LoopExited), None);
        assert_eq!(lc.state(), LoopState::Closing);
    }

    #[test]
    fn resources_are_released_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let mut lc = Lifecycle::new();
        lc.attach(Tracked(drops.clone())).ok().unwrap();

        drop(lc.close(CloseReason::AppExit));
        assert_eq!(drops.get(), 1);

        drop(lc.close(CloseReason::WindowClosed));
        drop(lc);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn resources_unreachable_after_close() {
        let mut lc = Lifecycle::new();
        lc.attach(1u32).unwrap();
        assert!(lc.resources_mut().is_some());

        lc.close(CloseReason::WindowClosed);
        assert!(lc.resources_mut().is_none());
    }

    #[test]
    fn attach_after_close_is_refused() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.close(CloseReason::StartupFailed), None);
        assert_eq!(lc.attach(3u32), Err(3));
        assert!(!lc.has_resources());
    }
}
