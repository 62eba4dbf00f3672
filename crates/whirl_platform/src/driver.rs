//! Frame driver trait

use std::time::Instant;

use whirl_animation::FrameScheduler;

/// Decides when the frame scheduler ticks
///
/// Implemented by each host adapter so the application loop can treat
/// them uniformly.
pub trait FrameDriver {
    /// Adapter name, such as "host" or "paced"
    fn name(&self) -> &'static str;

    /// The scheduler this driver ticks
    fn scheduler(&self) -> &FrameScheduler;

    /// Deliver a frame if one is due
    ///
    /// Returns true if a frame was delivered.
    fn pump(&mut self, now: Instant) -> bool;

    /// Check whether any per-frame callback is registered
    fn wants_frames(&self) -> bool {
        self.scheduler().has_subscribers()
    }
}
