//! Host-owned vsync adapter

use std::time::Instant;

use whirl_animation::{DisplaySync, FrameScheduler, SyncSource};

use crate::driver::FrameDriver;

type RedrawFn = Box<dyn Fn()>;

/// Frame driver for hosts that already receive a per-refresh callback
///
/// Call [`HostDriver::on_frame`] from the host's redraw handler with the
/// refresh timestamp. While animations are live the driver asks the host
/// for another redraw through the callback set with
/// [`HostDriver::set_request_redraw`].
pub struct HostDriver {
    scheduler: FrameScheduler,
    request_redraw: Option<RedrawFn>,
}

impl HostDriver {
    pub fn new() -> Self {
        Self {
            scheduler: FrameScheduler::new(),
            request_redraw: None,
        }
    }

    /// Set the callback used to ask the host for another refresh
    pub fn set_request_redraw<F>(&mut self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.request_redraw = Some(Box::new(callback));
    }

    /// Tick the scheduler for a host refresh at `timestamp`
    ///
    /// Returns true if another frame is wanted.
    pub fn on_frame(&self, timestamp: Instant) -> bool {
        let more = self.scheduler.tick_at(timestamp);
        if more {
            self.request_redraw();
        }
        more
    }

    /// Ask for a refresh if any callback is registered
    ///
    /// Hosts call this after handling input, since an event handler may have
    /// started an animation while no frames were flowing.
    pub fn request_frame_if_needed(&self) -> bool {
        let wanted = self.scheduler.has_subscribers();
        if wanted {
            self.request_redraw();
        }
        wanted
    }

    fn request_redraw(&self) {
        if let Some(ref callback) = self.request_redraw {
            callback();
        }
    }
}

impl Default for HostDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver for HostDriver {
    fn name(&self) -> &'static str {
        "host"
    }

    fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    fn pump(&mut self, now: Instant) -> bool {
        if !self.scheduler.has_subscribers() {
            return false;
        }
        self.on_frame(now);
        true
    }
}

impl SyncSource for HostDriver {
    fn display_sync(&self) -> Box<dyn DisplaySync> {
        self.scheduler.display_sync()
    }
}

impl std::fmt::Debug for HostDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostDriver")
            .field("scheduler", &self.scheduler)
            .field("has_redraw_callback", &self.request_redraw.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn redraw_counter(driver: &mut HostDriver) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let count_in = Rc::clone(&count);
        driver.set_request_redraw(move || count_in.set(count_in.get() + 1));
        count
    }

    #[test]
    fn test_on_frame_requests_redraw_while_live() {
        let mut driver = HostDriver::new();
        let redraws = redraw_counter(&mut driver);

        let mut link = driver.display_sync();
        link.set_on_update(Some(Box::new(|_| {})));
        link.start();

        let t0 = Instant::now();
        assert!(driver.on_frame(t0));
        assert_eq!(redraws.get(), 1);

        link.stop();
        assert!(!driver.on_frame(t0 + Duration::from_millis(16)));
        assert_eq!(redraws.get(), 1);
    }

    #[test]
    fn test_idle_host_is_not_pumped() {
        let mut driver = HostDriver::default();
        let redraws = redraw_counter(&mut driver);

        assert!(!driver.pump(Instant::now()));
        assert!(!driver.request_frame_if_needed());
        assert_eq!(driver.scheduler().frame_count(), 0);
        assert_eq!(redraws.get(), 0);
        assert_eq!(driver.name(), "host");
    }

    #[test]
    fn test_request_frame_after_event_starts_animation() {
        let mut driver = HostDriver::new();
        let redraws = redraw_counter(&mut driver);

        let mut link = driver.display_sync();
        link.start();
        assert!(driver.request_frame_if_needed());
        assert_eq!(redraws.get(), 1);
        assert!(driver.wants_frames());
    }
}
