//! Frame timing.
//!
//! One `FrameClock` per window. `tick()` once per presented frame yields a
//! `FrameTime` with both the clamped delta and the unclamped elapsed time
//! since the clock started; animation is driven by the latter so playback
//! speed does not depend on frame rate.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
