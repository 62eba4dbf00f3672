//! Value animator
//!
//! Drives a value from a start to a target over a fixed duration, emitting
//! one update per display refresh through a [`DisplaySync`].
//!
//! Guarantees per run:
//!
//! - the first refresh emits the `t = 0` value without consuming time;
//! - the last update of a completed run is exactly the target value (for
//!   easings that map 1 to 1) and is emitted once;
//! - `on_finish` fires exactly once, for completion or cancellation;
//! - a run cancelled before its first refresh still emits the `t = 0` value.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use whirl_animation::{AnimationSpec, FrameScheduler, SyncSource, ValueAnimator};
//!
//! let scheduler = FrameScheduler::new();
//! let mut animator = ValueAnimator::new(scheduler.display_sync());
//! animator.start(
//!     AnimationSpec::new(0.0, 10.0, Duration::from_secs(1)),
//!     |value| println!("value: {value}"),
//!     |reason| println!("finished: {reason:?}"),
//! );
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::easing::Easing;
use crate::frame::{DisplaySync, FrameTick};
use crate::values::Interpolate;

/// Parameters of one animation run
#[derive(Clone, Debug)]
pub struct AnimationSpec<T: Interpolate = f64> {
    pub from: T,
    pub to: T,
    pub duration: Duration,
    pub easing: Easing,
}

impl<T: Interpolate> AnimationSpec<T> {
    /// Create a spec with the default quartic ease-out
    pub fn new(from: T, to: T, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::default(),
        }
    }

    /// Set the easing curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value after `elapsed`, with `elapsed` clamped to the duration
    pub fn value_at(&self, elapsed: Duration) -> T {
        let elapsed = elapsed.min(self.duration);
        let progress = self.easing.sample(elapsed, self.duration);
        if progress == 1.0 {
            return self.to.clone();
        }
        self.from.lerp(&self.to, progress)
    }
}

/// Why a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// The run reached its duration and emitted its terminal value
    Completed,
    /// The run was cancelled (explicitly, or by starting a new run)
    Cancelled,
}

type UpdateFn<T> = Rc<dyn Fn(&T)>;
type FinishFn = Box<dyn FnOnce(FinishReason)>;

struct AnimatorRun<T: Interpolate> {
    generation: u64,
    spec: AnimationSpec<T>,
    started_at: Option<Instant>,
    emitted: bool,
    on_update: UpdateFn<T>,
    on_finish: Option<FinishFn>,
}

struct AnimatorShared<T: Interpolate> {
    sync: RefCell<Box<dyn DisplaySync>>,
    run: RefCell<Option<AnimatorRun<T>>>,
    last_value: RefCell<Option<T>>,
    generation: Cell<u64>,
}

/// Drives a value along an [`AnimationSpec`] once per display refresh
pub struct ValueAnimator<T: Interpolate = f64> {
    shared: Rc<AnimatorShared<T>>,
}

impl<T: Interpolate> ValueAnimator<T> {
    pub fn new(sync: Box<dyn DisplaySync>) -> Self {
        Self {
            shared: Rc::new(AnimatorShared {
                sync: RefCell::new(sync),
                run: RefCell::new(None),
                last_value: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Start a run, cancelling any run in progress first
    pub fn start<U, F>(&mut self, spec: AnimationSpec<T>, on_update: U, on_finish: F)
    where
        U: Fn(&T) + 'static,
        F: FnOnce(FinishReason) + 'static,
    {
        self.cancel();

        let generation = self.shared.generation.get() + 1;
        self.shared.generation.set(generation);

        tracing::debug!(
            generation,
            duration_ms = spec.duration.as_millis() as u64,
            "ValueAnimator: start"
        );

        *self.shared.run.borrow_mut() = Some(AnimatorRun {
            generation,
            spec,
            started_at: None,
            emitted: false,
            on_update: Rc::new(on_update),
            on_finish: Some(Box::new(on_finish)),
        });

        let weak = Rc::downgrade(&self.shared);
        let mut sync = self.shared.sync.borrow_mut();
        sync.set_on_update(Some(Box::new(move |tick| {
            if let Some(shared) = weak.upgrade() {
                AnimatorShared::on_frame(&shared, tick);
            }
        })));
        sync.start();
    }

    /// Cancel the run in progress
    ///
    /// Idempotent, and safe to call from inside `on_update` or `on_finish`.
    pub fn cancel(&self) {
        AnimatorShared::finish(&self.shared, FinishReason::Cancelled, None);
    }

    /// Check whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.shared.run.borrow().is_some()
    }

    /// The most recently emitted value, across runs
    pub fn last_value(&self) -> Option<T> {
        self.shared.last_value.borrow().clone()
    }

    /// Target of the run in progress
    pub fn target(&self) -> Option<T> {
        self.shared
            .run
            .borrow()
            .as_ref()
            .map(|run| run.spec.to.clone())
    }
}

impl<T: Interpolate> AnimatorShared<T> {
    fn on_frame(shared: &Rc<Self>, tick: FrameTick) {
        let (generation, value, finished, on_update) = {
            let mut run = shared.run.borrow_mut();
            let Some(run) = run.as_mut() else {
                return;
            };

            let (value, finished) = match run.started_at {
                None => {
                    run.started_at = Some(tick.timestamp);
                    if run.spec.duration.is_zero() {
                        (run.spec.to.clone(), true)
                    } else {
                        (run.spec.value_at(Duration::ZERO), false)
                    }
                }
                Some(started_at) => {
                    let elapsed = tick.timestamp.saturating_duration_since(started_at);
                    if elapsed >= run.spec.duration {
                        (run.spec.value_at(run.spec.duration), true)
                    } else {
                        (run.spec.value_at(elapsed), false)
                    }
                }
            };
            run.emitted = true;
            (run.generation, value, finished, Rc::clone(&run.on_update))
        };

        shared.emit(&on_update, value);

        if finished {
            Self::finish(shared, FinishReason::Completed, Some(generation));
        }
    }

    fn emit(&self, on_update: &UpdateFn<T>, value: T) {
        *self.last_value.borrow_mut() = Some(value.clone());
        on_update(&value);
    }

    /// End the current run, if it matches `generation` (any run when `None`)
    fn finish(shared: &Rc<Self>, reason: FinishReason, generation: Option<u64>) {
        let run = {
            let mut run = shared.run.borrow_mut();
            match (run.as_ref(), generation) {
                (None, _) => None,
                (Some(current), Some(g)) if current.generation != g => None,
                _ => run.take(),
            }
        };
        let Some(mut run) = run else {
            return;
        };

        shared.sync.borrow_mut().stop();

        if !run.emitted {
            let value = run.spec.value_at(Duration::ZERO);
            shared.emit(&run.on_update, value);
        }

        tracing::debug!(generation = run.generation, ?reason, "ValueAnimator: finish");

        if let Some(on_finish) = run.on_finish.take() {
            on_finish(reason);
        }
    }
}

impl<T: Interpolate> Drop for ValueAnimator<T> {
    fn drop(&mut self) {
        // Tear down silently: the owner is going away.
        let run = self.shared.run.borrow_mut().take();
        if let Ok(mut sync) = self.shared.sync.try_borrow_mut() {
            sync.stop();
        }
        drop(run);
    }
}

impl<T: Interpolate + fmt::Debug> fmt::Debug for ValueAnimator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAnimator")
            .field("running", &self.is_running())
            .field("last_value", &*self.shared.last_value.borrow())
            .finish()
    }
}
