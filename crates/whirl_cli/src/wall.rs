//! Headless photo wall
//!
//! Several carousel rows over the same photos, each with its own auto-scroll
//! controller. Touching a row holds its controller back until the fling
//! settles.

use std::cell::Cell;
use std::rc::Rc;

use whirl_animation::SyncSource;
use whirl_core::{Axis, Rect, Size, SizeProposal, Vec2};
use whirl_layout::{Carousel, DragGesture, Placement, ScrollController};

use crate::config::WhirlConfig;

struct Row {
    controller: ScrollController,
    carousel: Carousel,
    touching: Rc<Cell<bool>>,
}

/// Per-row state at one point in time
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    pub offset: f64,
    pub touching: bool,
    /// Indices of photos intersecting the viewport, in on-screen order
    pub visible: Vec<usize>,
}

pub struct PhotoWall {
    axis: Axis,
    items: Vec<Size>,
    bounds: Rect,
    rows: Vec<Row>,
}

impl PhotoWall {
    pub fn new(config: &WhirlConfig, source: &impl SyncSource) -> Self {
        let rows = config
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let controller = ScrollController::new(source, row.clone());
                let touching = Rc::new(Cell::new(false));
                let carousel = Carousel::with_drag_config(
                    config.wall.axis,
                    controller.position(),
                    source,
                    config.drag.clone(),
                )
                .dragging(true)
                .controller(&controller)
                .on_drag_state_changed({
                    let touching = Rc::clone(&touching);
                    move |state| {
                        if touching.replace(state.is_active()) != state.is_active() {
                            tracing::info!(row = index, ?state, "touch state changed");
                        }
                    }
                });

                Row {
                    controller,
                    carousel,
                    touching,
                }
            })
            .collect();

        Self {
            axis: config.wall.axis,
            items: config.wall.items(),
            bounds: config.wall.bounds(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_playing(&self) -> bool {
        self.rows.iter().any(|row| row.controller.is_playing())
    }

    pub fn start(&self) {
        for row in &self.rows {
            row.controller.start_animation();
        }
    }

    pub fn stop(&self) {
        for row in &self.rows {
            row.controller.stop_animation();
        }
    }

    /// Switch every row between horizontal and vertical
    pub fn toggle_axis(&mut self) {
        let axis = self.axis.cross_axis();
        self.axis = axis;
        self.items = self
            .items
            .iter()
            .map(|size| axis.size(axis.cross(*size), axis.main(*size)))
            .collect();
        self.bounds = axis
            .size(axis.cross(self.bounds.size), axis.main(self.bounds.size))
            .to_rect();
        for row in &mut self.rows {
            row.carousel.set_axis(axis);
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn drag_start(&self, row: usize) {
        if let Some(row) = self.rows.get(row) {
            row.carousel.drag_start();
        }
    }

    /// Move a held row by `translation` points along the scroll axis
    pub fn drag_to(&self, row: usize, translation: f32) {
        if let Some(row) = self.rows.get(row) {
            row.carousel
                .drag_changed(DragGesture::new(self.along_axis(translation), Vec2::ZERO));
        }
    }

    /// Release a held row with `velocity` points per second
    pub fn release(&self, row: usize, translation: f32, velocity: f32) {
        if let Some(row) = self.rows.get(row) {
            row.carousel.drag_end(DragGesture::new(
                self.along_axis(translation),
                self.along_axis(velocity),
            ));
        }
    }

    fn along_axis(&self, value: f32) -> Vec2 {
        match self.axis {
            Axis::Horizontal => Vec2::new(value, 0.0),
            Axis::Vertical => Vec2::new(0.0, value),
        }
    }

    pub fn place_row(&self, row: usize) -> Vec<Placement> {
        self.rows
            .get(row)
            .map(|row| {
                row.carousel
                    .place(&self.items, self.bounds, SizeProposal::fixed(self.bounds.size))
            })
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<RowSnapshot> {
        (0..self.rows.len())
            .map(|index| {
                let row = &self.rows[index];
                let mut visible: Vec<Placement> = self
                    .place_row(index)
                    .into_iter()
                    .filter(|p| p.rect.intersects(&self.bounds))
                    .collect();
                visible.sort_by(|a, b| {
                    self.axis
                        .leading(&a.rect)
                        .total_cmp(&self.axis.leading(&b.rect))
                });
                RowSnapshot {
                    offset: row.carousel.offset(),
                    touching: row.touching.get(),
                    visible: visible.into_iter().map(|p| p.index).collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use whirl_animation::FrameScheduler;

    fn run(scheduler: &FrameScheduler, start: Instant, from: u64, to: u64) {
        for i in from..to {
            scheduler.tick_at(start + Duration::from_millis(8 * i));
        }
    }

    #[test]
    fn test_rows_scroll_in_configured_directions() {
        let scheduler = FrameScheduler::new();
        let wall = PhotoWall::new(&WhirlConfig::default(), &scheduler);
        wall.start();
        assert!(wall.is_playing());

        run(&scheduler, Instant::now(), 0, 10);
        let rows = wall.snapshot();
        assert!((rows[0].offset - (-600.0 - 2.0)).abs() < 1e-3);
        assert!((rows[1].offset - 2.0).abs() < 1e-3);
        assert!((rows[2].offset - 598.0).abs() < 1e-3);
        assert!(rows.iter().all(|r| !r.visible.is_empty()));
    }

    #[test]
    fn test_touching_a_row_holds_it() {
        let scheduler = FrameScheduler::new();
        let wall = PhotoWall::new(&WhirlConfig::default(), &scheduler);
        wall.start();

        let t0 = Instant::now();
        wall.drag_start(1);
        wall.drag_to(1, 30.0);
        run(&scheduler, t0, 0, 5);

        let rows = wall.snapshot();
        assert!(rows[1].touching);
        assert_eq!(rows[1].offset, -30.0);

        wall.release(1, 30.0, 0.0);
        run(&scheduler, t0, 5, 7);
        let rows = wall.snapshot();
        assert!(!rows[1].touching);
        assert!((rows[1].offset - (-29.8)).abs() < 1e-3);
    }

    #[test]
    fn test_toggle_axis_rotates_geometry() {
        let scheduler = FrameScheduler::new();
        let mut wall = PhotoWall::new(&WhirlConfig::default(), &scheduler);
        wall.toggle_axis();

        assert_eq!(wall.axis(), Axis::Vertical);
        let placed = wall.place_row(1);
        assert_eq!(placed[0].rect.width(), 120.0);
        assert_eq!(placed[0].rect.height(), 160.0);
    }
}
