//! Carousel widget
//!
//! Ties a [`WrapLayout`] to a shared scroll position and an optional drag
//! bridge. An attached [`ScrollController`] is held back while the user is
//! dragging or a fling is settling, and resumes once the interaction ends.
//!
//! ```ignore
//! let controller = ScrollController::new(&scheduler, ControllerConfig::default());
//! let carousel = Carousel::new(Axis::Horizontal, controller.position(), &scheduler)
//!     .dragging(true)
//!     .controller(&controller)
//!     .on_drag_state_changed(|state| println!("touching: {}", state.is_active()));
//!
//! let placements = carousel.place(&items, bounds, SizeProposal::fixed(bounds.size));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use whirl_animation::SyncSource;
use whirl_core::{Axis, Rect, ScrollPosition, Size, SizeProposal};

use crate::controller::{ControllerHandle, ScrollController};
use crate::drag::{DragBridge, DragConfig, DragGesture, DragState};
use crate::wrap::{Measurable, Placement, WrapLayout};

type DragStateCallback = Rc<dyn Fn(DragState)>;

#[derive(Default)]
struct CarouselHooks {
    controller: RefCell<Option<ControllerHandle>>,
    on_drag_state_changed: RefCell<Option<DragStateCallback>>,
}

impl CarouselHooks {
    fn drag_state_changed(&self, state: DragState) {
        if let Some(controller) = self.controller.borrow().as_ref() {
            controller.set_suppressed(state.is_active());
        }

        let callback = self.on_drag_state_changed.borrow().clone();
        if let Some(callback) = callback {
            callback(state);
        }
    }
}

/// An endlessly wrapping strip of items
pub struct Carousel {
    axis: Axis,
    position: ScrollPosition,
    drag: DragBridge,
    hooks: Rc<CarouselHooks>,
}

impl Carousel {
    /// Create a carousel showing `position`
    ///
    /// Dragging starts disabled; `source` feeds the fling animations once it
    /// is enabled.
    pub fn new(axis: Axis, position: ScrollPosition, source: &impl SyncSource) -> Self {
        Self::with_drag_config(axis, position, source, DragConfig::default())
    }

    pub fn with_drag_config(
        axis: Axis,
        position: ScrollPosition,
        source: &impl SyncSource,
        config: DragConfig,
    ) -> Self {
        let drag = DragBridge::new(axis, position.clone(), source, config);
        drag.set_enabled(false);

        let hooks = Rc::new(CarouselHooks::default());
        let hooks_in = Rc::clone(&hooks);
        drag.on_state_changed(move |state| hooks_in.drag_state_changed(state));

        Self {
            axis,
            position,
            drag,
            hooks,
        }
    }

    /// Enable or disable drag gestures
    pub fn dragging(self, enabled: bool) -> Self {
        self.drag.set_enabled(enabled);
        self
    }

    /// Set a callback for drag activity changes
    pub fn on_drag_state_changed<F>(self, callback: F) -> Self
    where
        F: Fn(DragState) + 'static,
    {
        *self.hooks.on_drag_state_changed.borrow_mut() = Some(Rc::new(callback));
        self
    }

    /// Hold `controller` back while the user interacts with this carousel
    pub fn controller(self, controller: &ScrollController) -> Self {
        let handle = controller.handle();
        if !handle.drives(&self.position) {
            tracing::warn!("Carousel: attached controller drives a different scroll position");
        }
        *self.hooks.controller.borrow_mut() = Some(handle);
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Switch orientation
    pub fn set_axis(&mut self, axis: Axis) {
        if self.axis != axis {
            tracing::debug!(?axis, "Carousel: axis changed");
        }
        self.axis = axis;
        self.drag.set_axis(axis);
    }

    pub fn set_dragging(&self, enabled: bool) {
        self.drag.set_enabled(enabled);
    }

    /// The scroll position this carousel shows
    pub fn position(&self) -> &ScrollPosition {
        &self.position
    }

    /// Current scroll offset in points
    pub fn offset(&self) -> f64 {
        self.position.get()
    }

    /// Layout for the current position
    pub fn layout(&self) -> WrapLayout {
        WrapLayout::new(self.axis, self.position.get())
    }

    pub fn measure<I: Measurable>(&self, items: &[I], proposal: SizeProposal) -> Size {
        self.layout().measure(items, proposal)
    }

    pub fn place<I: Measurable>(
        &self,
        items: &[I],
        bounds: Rect,
        proposal: SizeProposal,
    ) -> Vec<Placement> {
        self.layout().place(items, bounds, proposal)
    }

    pub fn place_into<I, F>(&self, items: &[I], bounds: Rect, proposal: SizeProposal, sink: &mut F)
    where
        I: Measurable,
        F: FnMut(Placement),
    {
        self.layout().place_into(items, bounds, proposal, sink)
    }

    pub fn drag_start(&self) {
        self.drag.drag_start();
    }

    pub fn drag_changed(&self, gesture: DragGesture) {
        self.drag.drag_changed(gesture);
    }

    pub fn drag_end(&self, gesture: DragGesture) {
        self.drag.drag_end(gesture);
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.drag_state()
    }

    /// Check whether a drag or fling is in progress
    pub fn is_interacting(&self) -> bool {
        self.drag.is_interacting()
    }

    pub fn drag_bridge(&self) -> &DragBridge {
        &self.drag
    }
}

impl fmt::Debug for Carousel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carousel")
            .field("axis", &self.axis)
            .field("offset", &self.offset())
            .field("drag", &self.drag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::{Duration, Instant};
    use whirl_animation::FrameScheduler;
    use whirl_core::Vec2;

    use crate::controller::ControllerConfig;
    use crate::wrap::WrapShift;

    fn items() -> Vec<Size> {
        vec![Size::new(100.0, 40.0); 5]
    }

    #[test]
    fn test_dragging_disabled_by_default() {
        let scheduler = FrameScheduler::new();
        let carousel = Carousel::new(Axis::Horizontal, ScrollPosition::new(0.0), &scheduler);

        carousel.drag_changed(DragGesture::new(Vec2::new(40.0, 0.0), Vec2::ZERO));
        assert_eq!(carousel.offset(), 0.0);
        assert!(!carousel.is_interacting());
    }

    #[test]
    fn test_place_follows_position() {
        let scheduler = FrameScheduler::new();
        let position = ScrollPosition::new(0.0);
        let carousel = Carousel::new(Axis::Horizontal, position.clone(), &scheduler);
        let bounds = Rect::new(0.0, 0.0, 300.0, 40.0);

        position.set(450.0);
        let placements = carousel.place(&items(), bounds, SizeProposal::fixed(bounds.size));
        assert_eq!(placements[0].rect.x(), 50.0);
        assert_eq!(placements[0].wrapped, WrapShift::Forward);
    }

    #[test]
    fn test_set_axis_switches_orientation() {
        let scheduler = FrameScheduler::new();
        let mut carousel = Carousel::new(Axis::Horizontal, ScrollPosition::new(0.0), &scheduler)
            .dragging(true);
        carousel.set_axis(Axis::Vertical);

        let tall = vec![Size::new(40.0, 100.0); 4];
        let placements = carousel.place(
            &tall,
            Rect::new(0.0, 0.0, 40.0, 300.0),
            SizeProposal::UNSPECIFIED,
        );
        assert_eq!(placements[1].rect.y(), 100.0);

        carousel.drag_changed(DragGesture::new(Vec2::new(0.0, 30.0), Vec2::ZERO));
        assert_eq!(carousel.offset(), -30.0);
    }

    #[test]
    fn test_interaction_suppresses_controller() {
        let scheduler = FrameScheduler::new();
        let controller =
            ScrollController::new(&scheduler, ControllerConfig::default().with_delta(1.0));
        let touching = Rc::new(Cell::new(false));
        let carousel = Carousel::new(Axis::Horizontal, controller.position(), &scheduler)
            .dragging(true)
            .controller(&controller)
            .on_drag_state_changed({
                let touching = Rc::clone(&touching);
                move |state| touching.set(state.is_active())
            });

        controller.start_animation();
        let t0 = Instant::now();
        scheduler.tick_at(t0);
        assert_eq!(controller.offset(), 1.0);

        carousel.drag_start();
        assert!(controller.is_suppressed());
        assert!(touching.get());

        carousel.drag_changed(DragGesture::new(Vec2::new(10.0, 0.0), Vec2::ZERO));
        scheduler.tick_at(t0 + Duration::from_millis(8));
        assert_eq!(controller.offset(), -9.0);

        // Zero velocity: the fling completes on the next frame.
        carousel.drag_end(DragGesture::new(Vec2::new(10.0, 0.0), Vec2::ZERO));
        assert!(controller.is_suppressed());
        scheduler.tick_at(t0 + Duration::from_millis(16));
        assert!(!controller.is_suppressed());
        assert!(!touching.get());
        assert_eq!(controller.offset(), -9.0);

        scheduler.tick_at(t0 + Duration::from_millis(24));
        assert_eq!(controller.offset(), -8.0);
    }
}
