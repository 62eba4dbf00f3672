//! Frame scheduler
//!
//! Runs registered callbacks once per display refresh. The host's main loop
//! owns the [`FrameScheduler`] and calls [`FrameScheduler::tick`] from its
//! vsync/redraw hook; components register through a weak [`FrameHandle`] so
//! they never keep the scheduler alive.
//!
//! [`DisplaySync`] is the start/stop contract components program against.
//! [`FrameLink`] implements it on top of a [`FrameHandle`], the way a
//! platform display link sits on top of the compositor clock. Hosts with their
//! own per-frame callback can implement [`DisplaySync`] directly.
//!
//! # Re-entrancy
//!
//! No internal borrow is held while a callback runs. A callback may stop its
//! own link, stop other links, or start new ones. Removals take effect
//! immediately; registrations made during a tick first run on the next tick.
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let mut link = scheduler.handle().display_sync();
//! link.set_on_update(Some(Box::new(|tick| println!("frame {}", tick.frame))));
//! link.start();
//!
//! // In the host's redraw handler:
//! scheduler.tick();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a registered per-frame callback
    pub struct FrameSubscriptionId;
}

/// Information delivered to every callback on a display refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTick {
    /// Timestamp of this refresh
    pub timestamp: Instant,
    /// Time since the previous refresh (zero on the first one)
    pub delta: Duration,
    /// Monotonic frame counter, starting at 1
    pub frame: u64,
}

/// Per-frame callback
pub type FrameCallback = Box<dyn FnMut(FrameTick)>;

struct FrameSlot {
    /// `None` while the callback is running
    callback: Option<FrameCallback>,
}

struct SchedulerInner {
    subscribers: SlotMap<FrameSubscriptionId, FrameSlot>,
    frame: u64,
    last_tick: Option<Instant>,
    ticking: bool,
}

/// Owner of all per-frame callbacks for one display
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                subscribers: SlotMap::with_key(),
                frame: 0,
                last_tick: None,
                ticking: false,
            })),
        }
    }

    /// Get a weak handle for registering callbacks
    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver a frame stamped with the current time
    ///
    /// Returns true if callbacks are still registered (another frame is wanted).
    pub fn tick(&self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Deliver a frame stamped with `now`
    ///
    /// Returns true if callbacks are still registered (another frame is wanted).
    pub fn tick_at(&self, now: Instant) -> bool {
        let (tick, ids) = {
            let mut inner = self.inner.borrow_mut();
            if inner.ticking {
                tracing::warn!("FrameScheduler: nested tick ignored");
                return !inner.subscribers.is_empty();
            }
            inner.ticking = true;
            inner.frame += 1;

            let delta = inner
                .last_tick
                .map(|last| now.saturating_duration_since(last))
                .unwrap_or(Duration::ZERO);
            inner.last_tick = Some(now);

            let tick = FrameTick {
                timestamp: now,
                delta,
                frame: inner.frame,
            };
            let ids: SmallVec<[FrameSubscriptionId; 8]> = inner.subscribers.keys().collect();
            (tick, ids)
        };

        for id in ids {
            let callback = self
                .inner
                .borrow_mut()
                .subscribers
                .get_mut(id)
                .and_then(|slot| slot.callback.take());

            let Some(mut callback) = callback else {
                continue;
            };

            callback(tick);

            // Put it back unless the slot was removed or given a new callback.
            let mut inner = self.inner.borrow_mut();
            if let Some(slot) = inner.subscribers.get_mut(id) {
                if slot.callback.is_none() {
                    slot.callback = Some(callback);
                    continue;
                }
            }
            drop(inner);
            drop(callback);
        }

        let mut inner = self.inner.borrow_mut();
        inner.ticking = false;
        !inner.subscribers.is_empty()
    }

    /// Check whether any callback is registered
    pub fn has_subscribers(&self) -> bool {
        !self.inner.borrow().subscribers.is_empty()
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Number of frames delivered so far
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("subscribers", &inner.subscribers.len())
            .field("frame", &inner.frame)
            .finish()
    }
}

/// A weak handle to the frame scheduler
///
/// This is passed to components that need per-frame callbacks.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct FrameHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl FrameHandle {
    /// Register a per-frame callback and return its ID
    ///
    /// Returns `None` if the scheduler has been dropped.
    pub fn register(&self, callback: FrameCallback) -> Option<FrameSubscriptionId> {
        self.inner.upgrade().map(|inner| {
            let id = inner.borrow_mut().subscribers.insert(FrameSlot {
                callback: Some(callback),
            });
            tracing::trace!(?id, "frame callback registered");
            id
        })
    }

    /// Replace the callback of an existing registration
    pub fn set_callback(&self, id: FrameSubscriptionId, callback: FrameCallback) {
        if let Some(inner) = self.inner.upgrade() {
            let previous = inner
                .borrow_mut()
                .subscribers
                .get_mut(id)
                .map(|slot| slot.callback.replace(callback));
            drop(previous);
        }
    }

    /// Remove a registration
    ///
    /// Removing an unknown or already-removed ID is a no-op.
    pub fn unregister(&self, id: FrameSubscriptionId) {
        if let Some(inner) = self.inner.upgrade() {
            // Drop outside the borrow: the callback may own other links.
            let removed = inner.borrow_mut().subscribers.remove(id);
            if removed.is_some() {
                tracing::trace!(?id, "frame callback unregistered");
            }
            drop(removed);
        }
    }

    /// Check whether a registration is still live
    pub fn is_registered(&self, id: FrameSubscriptionId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().subscribers.contains_key(id))
            .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ============================================================================
// Display synchronizer contract
// ============================================================================

/// Runs a callback once per display refresh between `start` and `stop`
///
/// Implementations must not invoke the callback synchronously from `start`.
pub trait DisplaySync {
    /// Set (or clear) the callback invoked on every refresh
    fn set_on_update(&mut self, callback: Option<FrameCallback>);

    /// Begin delivering refreshes; restarting replaces the previous registration
    fn start(&mut self);

    /// Stop delivering refreshes; calling it while stopped is a no-op
    fn stop(&mut self);

    /// Check whether refreshes are being delivered
    fn is_running(&self) -> bool;
}

/// Factory for display synchronizers
///
/// Components that create animators on demand (such as a drag bridge starting
/// a fling) take a `SyncSource` instead of a concrete platform type.
pub trait SyncSource {
    fn display_sync(&self) -> Box<dyn DisplaySync>;
}

impl SyncSource for FrameHandle {
    fn display_sync(&self) -> Box<dyn DisplaySync> {
        Box::new(FrameLink::new(self.clone()))
    }
}

impl SyncSource for FrameScheduler {
    fn display_sync(&self) -> Box<dyn DisplaySync> {
        self.handle().display_sync()
    }
}

type SharedCallback = Rc<RefCell<FrameCallback>>;

/// [`DisplaySync`] driven by a [`FrameScheduler`]
pub struct FrameLink {
    handle: FrameHandle,
    on_update: Option<SharedCallback>,
    subscription: Option<FrameSubscriptionId>,
}

impl FrameLink {
    pub fn new(handle: FrameHandle) -> Self {
        Self {
            handle,
            on_update: None,
            subscription: None,
        }
    }

    fn trampoline(&self) -> FrameCallback {
        let on_update = self.on_update.clone();
        Box::new(move |tick| {
            if let Some(callback) = &on_update {
                // A link never re-enters its own callback: ticks are not nested.
                if let Ok(mut callback) = callback.try_borrow_mut() {
                    callback(tick);
                }
            }
        })
    }
}

impl DisplaySync for FrameLink {
    fn set_on_update(&mut self, callback: Option<FrameCallback>) {
        self.on_update = callback.map(|cb| Rc::new(RefCell::new(cb)));
        if let Some(id) = self.subscription {
            self.handle.set_callback(id, self.trampoline());
        }
    }

    fn start(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.handle.unregister(id);
        }
        self.subscription = self.handle.register(self.trampoline());
        if self.subscription.is_none() {
            tracing::warn!("FrameLink: scheduler dropped, start ignored");
        }
    }

    fn stop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.handle.unregister(id);
        }
    }

    fn is_running(&self) -> bool {
        self.subscription
            .map(|id| self.handle.is_registered(id))
            .unwrap_or(false)
    }
}

impl Drop for FrameLink {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for FrameLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLink")
            .field("subscription", &self.subscription)
            .field("has_callback", &self.on_update.is_some())
            .finish()
    }
}
