//! Whirl Platform Adapters
//!
//! Whirl animations run off a [`FrameScheduler`] that must be ticked once per
//! display refresh on the UI thread. This crate provides the adapters that
//! decide *when* to tick, one per kind of host:
//!
//! - [`HostDriver`] - the host already has a vsync/redraw callback (winit
//!   `RedrawRequested`, a platform display link shim). The driver ticks on
//!   that callback and asks for another redraw while animations are live.
//! - [`PacedDriver`] - the host has no vsync source. A background pacing
//!   thread wakes the UI thread at a target refresh rate; the UI thread
//!   calls [`FrameDriver::pump`] and the scheduler ticks there.
//!
//! Both implement [`FrameDriver`] and hand out display synchronizers through
//! [`SyncSource`], so carousel code never names a platform type.
//!
//! # Example
//!
//! ```ignore
//! use whirl_platform::prelude::*;
//!
//! let mut driver = PacedDriver::new(PacingConfig::default())?;
//! let waker = std::thread::current();
//! driver.set_wake_callback(move || waker.unpark());
//! driver.start()?;
//!
//! loop {
//!     std::thread::park();
//!     driver.pump(std::time::Instant::now());
//! }
//! ```

mod driver;
mod error;
mod host;
mod paced;

pub use driver::FrameDriver;
pub use error::{PlatformError, Result};
pub use host::HostDriver;
pub use paced::{PacedDriver, PacingConfig, WakeCallback, DEFAULT_REFRESH_RATE};

pub use whirl_animation::{FrameScheduler, SyncSource};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::FrameDriver;
    pub use crate::error::{PlatformError, Result};
    pub use crate::host::HostDriver;
    pub use crate::paced::{PacedDriver, PacingConfig};
    pub use whirl_animation::{FrameScheduler, SyncSource};
}
