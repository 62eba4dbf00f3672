//! Whirl Core
//!
//! Foundational types shared by the Whirl carousel crates:
//!
//! - **Geometry**: `Point`, `Size`, `Rect`, `Vec2` in layout points
//! - **Axis**: selects the scroll dimension and the cross dimension
//! - **Observable values**: single-threaded cells that notify subscribers on change
//!
//! # Example
//!
//! ```rust
//! use whirl_core::{Axis, Observable, Size};
//!
//! let offset = Observable::new(0.0_f64);
//! let _sub = offset.subscribe(|value| println!("offset is now {value}"));
//! offset.set(12.5);
//!
//! let size = Size::new(100.0, 40.0);
//! assert_eq!(Axis::Horizontal.main(size), 100.0);
//! assert_eq!(Axis::Vertical.main(size), 40.0);
//! ```

pub mod axis;
pub mod geometry;
pub mod observable;

pub use axis::Axis;
pub use geometry::{Point, Rect, Size, SizeProposal, Vec2, DEFAULT_UNSPECIFIED_EXTENT};
pub use observable::{Observable, ObserverId, ScrollPosition, Subscription};
