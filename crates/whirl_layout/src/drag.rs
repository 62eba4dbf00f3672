//! Drag gestures and fling settling
//!
//! [`DragBridge`] turns a stream of drag events into scroll position writes:
//! while the finger is down the position follows the translation, and on
//! release an eased animation carries it to the projected resting point.
//!
//! # State Machine
//!
//! ```text
//! Idle ──Start/Change──► Dragging ──End──► Settling ──Settled──► Idle
//!                           ▲                 │
//!                           └────Start/Change─┘  (cancels the settle)
//! ```
//!
//! The host hears about every phase change through
//! [`DragBridge::on_state_changed`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use whirl_animation::{AnimationSpec, Easing, SyncSource, ValueAnimator};
use whirl_core::{Axis, ScrollPosition, Vec2};

/// Deceleration rate per millisecond used to project a fling
pub const DEFAULT_DECELERATION_RATE: f32 = 0.998;

/// Drag activity reported to the host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    /// The finger is down
    pub is_dragging: bool,
    /// The finger lifted and the fling is settling
    pub is_ending: bool,
}

impl DragState {
    pub const INACTIVE: DragState = DragState {
        is_dragging: false,
        is_ending: false,
    };

    pub const DRAGGING: DragState = DragState {
        is_dragging: true,
        is_ending: false,
    };

    pub const ENDING: DragState = DragState {
        is_dragging: false,
        is_ending: true,
    };

    pub fn is_active(&self) -> bool {
        self.is_dragging || self.is_ending
    }
}

/// Drag interaction phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// No interaction
    #[default]
    Idle,
    /// Finger down, position follows the translation
    Dragging,
    /// Fling animation in flight
    Settling,
}

/// Inputs to the drag state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent {
    /// Finger down
    Start,
    /// Finger moved
    Change,
    /// Finger lifted
    End,
    /// Fling animation completed or was cancelled
    Settled,
    /// Interaction abandoned without a fling
    Cancel,
}

impl DragPhase {
    /// Next phase for `event`, or `None` if the event does not change phase
    pub fn on_event(&self, event: DragEvent) -> Option<DragPhase> {
        match (self, event) {
            // Idle -> Dragging: a change without a start begins the drag too
            (DragPhase::Idle, DragEvent::Start | DragEvent::Change) => Some(DragPhase::Dragging),

            // Dragging -> Settling: finger lifted, start the fling
            (DragPhase::Dragging, DragEvent::End) => Some(DragPhase::Settling),

            // Dragging -> Idle: interaction abandoned
            (DragPhase::Dragging, DragEvent::Cancel) => Some(DragPhase::Idle),

            // Settling -> Idle: fling finished
            (DragPhase::Settling, DragEvent::Settled) => Some(DragPhase::Idle),

            // Settling -> Dragging: caught mid-flight
            (DragPhase::Settling, DragEvent::Start | DragEvent::Change) => {
                Some(DragPhase::Dragging)
            }

            _ => None,
        }
    }

    /// State reported to the host while in this phase
    pub fn drag_state(&self) -> DragState {
        match self {
            DragPhase::Idle => DragState::INACTIVE,
            DragPhase::Dragging => DragState::DRAGGING,
            DragPhase::Settling => DragState::ENDING,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DragPhase::Idle)
    }
}

/// One drag gesture sample
///
/// Translation is measured from the point where the finger went down.
/// Velocity is in points per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragGesture {
    pub translation: Vec2,
    pub velocity: Vec2,
    /// Where the platform predicts the translation would come to rest
    pub predicted_end_translation: Option<Vec2>,
}

impl DragGesture {
    pub fn new(translation: Vec2, velocity: Vec2) -> Self {
        Self {
            translation,
            velocity,
            predicted_end_translation: None,
        }
    }

    pub fn predicted(mut self, predicted_end_translation: Vec2) -> Self {
        self.predicted_end_translation = Some(predicted_end_translation);
        self
    }
}

/// Fling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Fraction of velocity kept per millisecond when projecting a fling
    pub deceleration_rate: f32,
    /// Settle duration as a multiple of the projected flight time
    pub settle_multiplier: f32,
    /// Upper bound on the settle duration in seconds; zero or less disables it
    pub max_settle_secs: f32,
    /// Easing of the settle animation
    pub easing: Easing,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            deceleration_rate: DEFAULT_DECELERATION_RATE,
            settle_multiplier: 3.0,
            max_settle_secs: 3.0,
            easing: Easing::EaseOutQuart,
        }
    }
}

impl DragConfig {
    /// Seconds a fling needs to cover its projected distance at this rate
    pub fn projection_time(&self) -> f32 {
        let r = self.deceleration_rate;
        r / (1000.0 * (1.0 - r))
    }

    /// Resting translation of a fling released at `gesture`
    pub fn project(&self, gesture: &DragGesture) -> Vec2 {
        gesture
            .predicted_end_translation
            .unwrap_or_else(|| gesture.translation + gesture.velocity * self.projection_time())
    }

    /// Settle animation for a drag that began at `start_offset` and was
    /// released at `gesture` while the position reads `current`
    pub fn plan_settle(
        &self,
        axis: Axis,
        start_offset: f64,
        current: f64,
        gesture: &DragGesture,
    ) -> AnimationSpec {
        let predicted = axis.component(self.project(gesture));
        let translation = axis.component(gesture.translation);
        let velocity = axis.component(gesture.velocity);

        let flight = (predicted - translation) / velocity;
        let flight = if flight.is_finite() && flight > 0.0 {
            flight
        } else {
            0.0
        };

        let mut secs = flight * self.settle_multiplier;
        if self.max_settle_secs > 0.0 {
            secs = secs.min(self.max_settle_secs);
        }
        let duration = Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO);

        let destination = start_offset - f64::from(predicted);
        let destination = if destination.is_finite() {
            destination
        } else {
            current
        };

        AnimationSpec::new(current, destination, duration).easing(self.easing)
    }
}

type StateCallback = Rc<dyn Fn(DragState)>;

struct BridgeState {
    axis: Cell<Axis>,
    position: ScrollPosition,
    config: DragConfig,
    phase: Cell<DragPhase>,
    /// Position when the current drag began
    start_offset: Cell<Option<f64>>,
    enabled: Cell<bool>,
    /// Bumped when a settle is superseded, so its finish is ignored
    settle_generation: Cell<u64>,
    animator: RefCell<ValueAnimator>,
    on_state_changed: RefCell<Option<StateCallback>>,
}

impl BridgeState {
    fn transition(&self, event: DragEvent) -> bool {
        let from = self.phase.get();
        let Some(to) = from.on_event(event) else {
            return false;
        };
        self.phase.set(to);
        tracing::debug!(?from, ?to, ?event, "DragBridge: transition");

        let callback = self.on_state_changed.borrow().clone();
        if let Some(callback) = callback {
            callback(to.drag_state());
        }
        true
    }

    fn begin(&self, event: DragEvent) {
        if self.phase.get() == DragPhase::Settling {
            self.settle_generation.set(self.settle_generation.get() + 1);
            // The position keeps the value the settle last wrote.
            self.animator.borrow().cancel();
        }
        self.start_offset.set(Some(self.position.get()));
        self.transition(event);
    }
}

/// Maps drag gestures onto a scroll position
pub struct DragBridge {
    state: Rc<BridgeState>,
}

impl DragBridge {
    pub fn new(
        axis: Axis,
        position: ScrollPosition,
        source: &impl SyncSource,
        config: DragConfig,
    ) -> Self {
        Self {
            state: Rc::new(BridgeState {
                axis: Cell::new(axis),
                position,
                config,
                phase: Cell::new(DragPhase::Idle),
                start_offset: Cell::new(None),
                enabled: Cell::new(true),
                settle_generation: Cell::new(0),
                animator: RefCell::new(ValueAnimator::new(source.display_sync())),
                on_state_changed: RefCell::new(None),
            }),
        }
    }

    /// Set the callback invoked on every phase change
    pub fn on_state_changed<F>(&self, callback: F)
    where
        F: Fn(DragState) + 'static,
    {
        *self.state.on_state_changed.borrow_mut() = Some(Rc::new(callback));
    }

    /// Finger down
    ///
    /// Catching a settling fling cancels it and continues from the position
    /// it last wrote.
    pub fn drag_start(&self) {
        if !self.state.enabled.get() || self.state.phase.get() == DragPhase::Dragging {
            return;
        }
        self.state.begin(DragEvent::Start);
    }

    /// Finger moved
    ///
    /// A change with no preceding start begins the drag at the current
    /// position.
    pub fn drag_changed(&self, gesture: DragGesture) {
        let state = &self.state;
        if !state.enabled.get() {
            return;
        }
        if state.phase.get() != DragPhase::Dragging {
            state.begin(DragEvent::Change);
        }

        if let Some(start) = state.start_offset.get() {
            let translation = state.axis.get().component(gesture.translation);
            state.position.set(start - f64::from(translation));
        }
    }

    /// Finger lifted: fling toward the projected resting point
    pub fn drag_end(&self, gesture: DragGesture) {
        let state = &self.state;
        if state.phase.get() != DragPhase::Dragging {
            return;
        }
        let Some(start) = state.start_offset.take() else {
            return;
        };

        let spec = state
            .config
            .plan_settle(state.axis.get(), start, state.position.get(), &gesture);
        tracing::debug!(
            from = spec.from,
            to = spec.to,
            duration_ms = spec.duration.as_millis() as u64,
            "DragBridge: settle"
        );

        state.transition(DragEvent::End);

        let generation = state.settle_generation.get();
        let on_update = {
            let weak = Rc::downgrade(&self.state);
            move |value: &f64| {
                if let Some(state) = weak.upgrade() {
                    state.position.set(*value);
                }
            }
        };
        let on_finish = {
            let weak = Rc::downgrade(&self.state);
            move |_reason| {
                if let Some(state) = weak.upgrade() {
                    if state.settle_generation.get() == generation {
                        state.transition(DragEvent::Settled);
                    }
                }
            }
        };
        state.animator.borrow_mut().start(spec, on_update, on_finish);
    }

    /// Abandon the interaction: end a drag without a fling, or stop a fling
    /// where it is
    pub fn cancel(&self) {
        match self.state.phase.get() {
            DragPhase::Dragging => {
                self.state.start_offset.set(None);
                self.state.transition(DragEvent::Cancel);
            }
            DragPhase::Settling => self.state.animator.borrow().cancel(),
            DragPhase::Idle => {}
        }
    }

    /// Enable or disable gesture handling
    ///
    /// Disabling abandons a drag in progress; a settling fling runs to the end.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.set(enabled);
        if !enabled && self.state.phase.get() == DragPhase::Dragging {
            self.cancel();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.get()
    }

    pub fn set_axis(&self, axis: Axis) {
        self.state.axis.set(axis);
    }

    pub fn axis(&self) -> Axis {
        self.state.axis.get()
    }

    pub fn phase(&self) -> DragPhase {
        self.state.phase.get()
    }

    pub fn drag_state(&self) -> DragState {
        self.phase().drag_state()
    }

    /// Check whether a drag or fling is in progress
    pub fn is_interacting(&self) -> bool {
        self.phase().is_active()
    }

    /// The scroll position this bridge writes to
    pub fn position(&self) -> &ScrollPosition {
        &self.state.position
    }
}

impl fmt::Debug for DragBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragBridge")
            .field("axis", &self.axis())
            .field("phase", &self.phase())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
