//! Whirl Animation System
//!
//! Frame-synchronized animation for carousel scroll positions.
//!
//! # Features
//!
//! - **Easing**: Pure curves mapping elapsed fraction to progress fraction
//! - **Frame Scheduler**: One repeating callback per subscriber per display refresh
//! - **DisplaySync**: Platform-agnostic start/stop contract over the frame scheduler
//! - **Value Animator**: Time-bounded eased animation with exactly-once completion
//! - **Interpolate**: Values that can be blended by an eased factor

pub mod animator;
pub mod easing;
pub mod frame;
pub mod values;

pub use animator::{AnimationSpec, FinishReason, ValueAnimator};
pub use easing::Easing;
pub use frame::{
    DisplaySync, FrameCallback, FrameHandle, FrameLink, FrameScheduler, FrameSubscriptionId,
    FrameTick, SyncSource,
};
pub use values::Interpolate;
