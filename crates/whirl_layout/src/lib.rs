//! Whirl Layout
//!
//! Infinite-scrolling carousel primitives:
//!
//! - [`WrapLayout`]: places items in a strip shifted by a scroll offset,
//!   wrapping items that leave one edge around to the other
//! - [`ScrollController`]: advances a scroll position by a fixed delta per
//!   display refresh
//! - [`DragBridge`]: maps drag gestures onto the scroll position and settles
//!   flings with an eased animation
//! - [`Carousel`]: the three composed, with the controller held back while the
//!   user interacts
//!
//! All state is single-threaded and driven from the host's UI thread through
//! a [`whirl_animation::FrameScheduler`].
//!
//! # Example
//!
//! ```rust
//! use whirl_core::{Rect, Size, SizeProposal};
//! use whirl_layout::WrapLayout;
//!
//! let items = vec![Size::new(100.0, 40.0); 5];
//! let bounds = Rect::new(0.0, 0.0, 300.0, 40.0);
//!
//! let placements = WrapLayout::horizontal(450.0).place(&items, bounds, SizeProposal::UNSPECIFIED);
//! assert_eq!(placements[0].rect.x(), 50.0);
//! ```

pub mod carousel;
pub mod controller;
pub mod drag;
pub mod wrap;

pub use carousel::Carousel;
pub use controller::{ControllerConfig, ControllerHandle, ScrollController, DEFAULT_DELTA};
pub use drag::{
    DragBridge, DragConfig, DragEvent, DragGesture, DragPhase, DragState,
    DEFAULT_DECELERATION_RATE,
};
pub use wrap::{Measurable, Placement, ScrollEncoding, WrapLayout, WrapShift};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::carousel::Carousel;
    pub use crate::controller::{ControllerConfig, ScrollController};
    pub use crate::drag::{DragBridge, DragConfig, DragGesture, DragState};
    pub use crate::wrap::{Measurable, Placement, WrapLayout, WrapShift};
    pub use whirl_animation::{FrameScheduler, SyncSource};
    pub use whirl_core::{Axis, Rect, ScrollPosition, Size, SizeProposal, Vec2};
}
