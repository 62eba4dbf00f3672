//! Software frame pacing
//!
//! For hosts without a vsync source. A background thread wakes at the target
//! refresh rate and, while the scheduler has work, raises `needs_frame` and
//! invokes the wake callback. The scheduler itself stays on the UI thread:
//! the host calls [`FrameDriver::pump`] (or checks [`PacedDriver::take_needs_frame`]
//! and ticks) after waking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use whirl_animation::{DisplaySync, FrameScheduler, SyncSource};

use crate::driver::FrameDriver;
use crate::error::{PlatformError, Result};

/// Default pacing rate in Hz
pub const DEFAULT_REFRESH_RATE: u32 = 120;

const MAX_REFRESH_RATE: u32 = 1000;

/// Callback used to wake the UI thread from the pacing thread
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Pacing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Target refresh rate in Hz
    pub refresh_rate: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

/// Frame driver backed by a background pacing thread
pub struct PacedDriver {
    scheduler: FrameScheduler,
    frame_interval: Duration,
    /// Stop signal for the pacing thread
    stop_flag: Arc<AtomicBool>,
    /// Raised by the pacing thread when a frame is due
    needs_frame: Arc<AtomicBool>,
    /// Mirrors `scheduler.has_subscribers()`, refreshed on every pump
    active: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    wake_callback: Option<WakeCallback>,
}

impl PacedDriver {
    pub fn new(config: PacingConfig) -> Result<Self> {
        if config.refresh_rate == 0 || config.refresh_rate > MAX_REFRESH_RATE {
            return Err(PlatformError::InvalidRefreshRate(config.refresh_rate));
        }

        Ok(Self {
            scheduler: FrameScheduler::new(),
            frame_interval: Duration::from_nanos(1_000_000_000 / config.refresh_rate as u64),
            stop_flag: Arc::new(AtomicBool::new(false)),
            needs_frame: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            wake_callback: None,
        })
    }

    /// Set a callback invoked from the pacing thread when a frame is due
    ///
    /// Takes effect on the next `start()`.
    ///
    /// ```ignore
    /// let main = std::thread::current();
    /// driver.set_wake_callback(move || main.unpark());
    /// ```
    pub fn set_wake_callback<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.wake_callback = Some(Arc::new(callback));
    }

    /// Start the pacing thread
    ///
    /// Starting an already running driver is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }

        self.active
            .store(self.scheduler.has_subscribers(), Ordering::Release);

        let stop_flag = Arc::clone(&self.stop_flag);
        let needs_frame = Arc::clone(&self.needs_frame);
        let active = Arc::clone(&self.active);
        let wake_callback = self.wake_callback.clone();
        let frame_interval = self.frame_interval;

        let handle = thread::Builder::new()
            .name("whirl-frame-pacer".into())
            .spawn(move || {
                let mut wakes: u64 = 0;
                while !stop_flag.load(Ordering::Relaxed) {
                    let start = Instant::now();

                    if active.load(Ordering::Acquire) {
                        needs_frame.store(true, Ordering::Release);
                        if let Some(ref callback) = wake_callback {
                            if wakes % 120 == 0 {
                                tracing::trace!(wakes, "frame pacer: waking host");
                            }
                            wakes += 1;
                            callback();
                        }
                    }

                    let elapsed = start.elapsed();
                    if elapsed < frame_interval {
                        thread::sleep(frame_interval - elapsed);
                    }
                }
            })?;

        tracing::debug!(
            interval_us = self.frame_interval.as_micros() as u64,
            "PacedDriver: started"
        );
        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop the pacing thread and wait for it to exit
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("PacedDriver: pacing thread panicked");
            }
            tracing::debug!("PacedDriver: stopped");
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    /// Check if the pacing thread is running
    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Check and clear the `needs_frame` flag
    pub fn take_needs_frame(&self) -> bool {
        self.needs_frame.swap(false, Ordering::Acquire)
    }

    /// Ask for a frame without waiting for the pacing thread
    pub fn request_frame(&self) {
        self.needs_frame.store(true, Ordering::Release);
    }

    /// Time between paced frames
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn sync_active(&self) {
        self.active
            .store(self.scheduler.has_subscribers(), Ordering::Release);
    }
}

impl FrameDriver for PacedDriver {
    fn name(&self) -> &'static str {
        "paced"
    }

    fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Tick if the pacing thread (or `request_frame`) asked for a frame
    ///
    /// Call after handling host events as well, so work registered from an
    /// event handler wakes the pacing thread.
    fn pump(&mut self, now: Instant) -> bool {
        let ticked = if self.take_needs_frame() {
            self.scheduler.tick_at(now);
            true
        } else {
            false
        };
        self.sync_active();
        ticked
    }
}

impl SyncSource for PacedDriver {
    fn display_sync(&self) -> Box<dyn DisplaySync> {
        self.scheduler.display_sync()
    }
}

impl Drop for PacedDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PacedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacedDriver")
            .field("frame_interval", &self.frame_interval)
            .field("running", &self.is_running())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_rejects_invalid_refresh_rate() {
        assert!(matches!(
            PacedDriver::new(PacingConfig { refresh_rate: 0 }),
            Err(PlatformError::InvalidRefreshRate(0))
        ));
        assert!(PacedDriver::new(PacingConfig { refresh_rate: 5000 }).is_err());
    }

    #[test]
    fn test_frame_interval_from_rate() {
        let driver = PacedDriver::new(PacingConfig { refresh_rate: 100 }).unwrap();
        assert_eq!(driver.frame_interval(), Duration::from_millis(10));
        assert_eq!(driver.name(), "paced");
    }

    #[test]
    fn test_pump_without_request_does_not_tick() {
        let mut driver = PacedDriver::new(PacingConfig::default()).unwrap();
        assert!(!driver.pump(Instant::now()));
        assert_eq!(driver.scheduler().frame_count(), 0);

        driver.request_frame();
        assert!(driver.pump(Instant::now()));
        assert_eq!(driver.scheduler().frame_count(), 1);
    }

    #[test]
    fn test_pacing_thread_wakes_while_active() {
        let mut driver = PacedDriver::new(PacingConfig { refresh_rate: 500 }).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        driver.set_wake_callback(move || {
            let _ = tx.lock().map(|tx| tx.send(()));
        });

        let mut link = driver.display_sync();
        link.set_on_update(Some(Box::new(|_| {})));
        link.start();

        driver.start().unwrap();
        assert!(driver.is_running());

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(driver.pump(Instant::now()));
        assert_eq!(driver.scheduler().frame_count(), 1);

        driver.stop();
        assert!(!driver.is_running());
    }

    #[test]
    fn test_idle_driver_never_wakes() {
        let mut driver = PacedDriver::new(PacingConfig { refresh_rate: 1000 }).unwrap();
        driver.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(!driver.take_needs_frame());
    }

    #[test]
    fn test_drop_stops_thread() {
        let mut driver = PacedDriver::new(PacingConfig::default()).unwrap();
        driver.start().unwrap();
        driver.start().unwrap();
        drop(driver);
    }
}
