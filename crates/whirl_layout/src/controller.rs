//! Auto-scroll controller
//!
//! Advances a [`ScrollPosition`] by a fixed delta on every display refresh
//! while playing. The position is an observable shared with the carousel, so
//! the layout picks up each step without the controller knowing about it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use whirl_animation::{DisplaySync, SyncSource};
use whirl_core::{Observable, ScrollPosition};

/// Default advance per refresh, in points
pub const DEFAULT_DELTA: f64 = 0.2;

/// Scroll controller configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Points added to the position on every refresh; negative scrolls backward
    pub delta: f64,
    /// Starting scroll offset
    pub initial_offset: f64,
    /// Start playing as soon as the controller is built
    pub autoplay: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
            initial_offset: 0.0,
            autoplay: false,
        }
    }
}

impl ControllerConfig {
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_initial_offset(mut self, offset: f64) -> Self {
        self.initial_offset = offset;
        self
    }
}

/// Where a run of steps began
///
/// Each step writes `origin + steps * delta` rather than adding to the
/// previous value, so rounding never accumulates. A write from anyone else
/// (a drag, `set_offset`) starts a new run from the written value.
#[derive(Clone, Copy, Debug)]
struct StepAnchor {
    origin: f64,
    steps: u64,
    last_written: f64,
}

impl StepAnchor {
    fn at(offset: f64) -> Self {
        Self {
            origin: offset,
            steps: 0,
            last_written: offset,
        }
    }
}

struct ControllerState {
    position: ScrollPosition,
    delta: Cell<f64>,
    anchor: Cell<StepAnchor>,
    suppressed: Cell<bool>,
    playing: Observable<bool>,
    sync: RefCell<Box<dyn DisplaySync>>,
}

impl ControllerState {
    fn advance(&self) {
        if self.suppressed.get() {
            return;
        }

        let current = self.position.get();
        let mut anchor = self.anchor.get();
        if current.to_bits() != anchor.last_written.to_bits() {
            anchor = StepAnchor::at(current);
        }

        anchor.steps += 1;
        let next = anchor.origin + anchor.steps as f64 * self.delta.get();
        anchor.last_written = next;
        self.anchor.set(anchor);
        self.position.set(next);
    }

    fn rebase(&self) {
        self.anchor.set(StepAnchor::at(self.position.get()));
    }
}

/// Drives a scroll position at a constant rate
pub struct ScrollController {
    state: Rc<ControllerState>,
}

impl ScrollController {
    /// Create a controller fed by a display synchronizer from `source`
    pub fn new(source: &impl SyncSource, config: ControllerConfig) -> Self {
        Self::with_display_sync(source.display_sync(), config)
    }

    /// Create a controller fed by an explicit display synchronizer
    pub fn with_display_sync(sync: Box<dyn DisplaySync>, config: ControllerConfig) -> Self {
        let state = Rc::new(ControllerState {
            position: Observable::new(config.initial_offset),
            delta: Cell::new(config.delta),
            anchor: Cell::new(StepAnchor::at(config.initial_offset)),
            suppressed: Cell::new(false),
            playing: Observable::new(false),
            sync: RefCell::new(sync),
        });

        let weak = Rc::downgrade(&state);
        state
            .sync
            .borrow_mut()
            .set_on_update(Some(Box::new(move |_tick| {
                if let Some(state) = weak.upgrade() {
                    state.advance();
                }
            })));

        let controller = Self { state };
        if config.autoplay {
            controller.start_animation();
        }
        controller
    }

    /// Start advancing on every refresh
    ///
    /// Calling it while already playing does not add a second subscription.
    pub fn start_animation(&self) {
        self.state.sync.borrow_mut().start();
        if !self.state.playing.get() {
            tracing::debug!(delta = self.state.delta.get(), "ScrollController: play");
            self.state.playing.set(true);
        }
    }

    /// Stop advancing; the position stays where it is
    pub fn stop_animation(&self) {
        self.state.sync.borrow_mut().stop();
        if self.state.playing.get() {
            tracing::debug!(offset = self.offset(), "ScrollController: stop");
            self.state.playing.set(false);
        }
    }

    /// The shared scroll position this controller writes to
    pub fn position(&self) -> ScrollPosition {
        self.state.position.clone()
    }

    /// Current offset in points
    pub fn offset(&self) -> f64 {
        self.state.position.get()
    }

    pub fn set_offset(&self, offset: f64) {
        self.state.position.set(offset);
        self.state.rebase();
    }

    /// Advance per refresh
    pub fn delta(&self) -> f64 {
        self.state.delta.get()
    }

    /// Change the advance per refresh; takes effect on the next refresh
    pub fn set_delta(&self, delta: f64) {
        self.state.rebase();
        self.state.delta.set(delta);
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing.get()
    }

    /// Observable playing flag
    pub fn playing(&self) -> Observable<bool> {
        self.state.playing.clone()
    }

    /// Keep the refresh subscription but skip advancing
    ///
    /// Used while the user is dragging or a fling is settling, so the two
    /// drivers never write the position in the same frame.
    pub fn set_suppressed(&self, suppressed: bool) {
        if self.state.suppressed.replace(suppressed) != suppressed {
            tracing::trace!(suppressed, "ScrollController: suppression changed");
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.state.suppressed.get()
    }

    /// Get a weak handle for components that only need to suppress playback
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            state: Rc::downgrade(&self.state),
        }
    }
}

impl Drop for ScrollController {
    fn drop(&mut self) {
        if let Ok(mut sync) = self.state.sync.try_borrow_mut() {
            sync.stop();
        }
    }
}

impl fmt::Debug for ScrollController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollController")
            .field("offset", &self.offset())
            .field("delta", &self.delta())
            .field("playing", &self.is_playing())
            .field("suppressed", &self.is_suppressed())
            .finish()
    }
}

/// A weak handle to a [`ScrollController`]
///
/// Won't keep the controller (or its refresh subscription) alive.
#[derive(Clone)]
pub struct ControllerHandle {
    state: Weak<ControllerState>,
}

impl ControllerHandle {
    /// Suppress or release the controller, if it is still alive
    pub fn set_suppressed(&self, suppressed: bool) {
        if let Some(state) = self.state.upgrade() {
            state.suppressed.set(suppressed);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Check whether this handle refers to a controller writing `position`
    pub fn drives(&self, position: &ScrollPosition) -> bool {
        self.state
            .upgrade()
            .map(|state| state.position.ptr_eq(position))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
