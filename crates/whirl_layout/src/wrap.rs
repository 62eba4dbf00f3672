//! Wraparound layout
//!
//! Lays items out in a single row (or column) shifted by a scroll offset,
//! moving each item that falls entirely off one edge of the bounds to the
//! other end of the sequence. The result is a strip that appears to repeat
//! forever in both directions while each item is placed exactly once.
//!
//! Placement is periodic: offsets `p` and `p + total` (where `total` is the
//! summed extent of all items along the scroll axis) produce identical
//! rectangles. The effect only looks seamless when the content is at least as
//! long as the viewport; shorter content is still placed, with gaps.

use smallvec::SmallVec;
use whirl_core::{Axis, Rect, Size, SizeProposal};

/// An item the wrap layout can size
pub trait Measurable {
    /// Size of the item under `proposal`
    fn measure(&self, proposal: SizeProposal) -> Size;
}

/// Fixed-size items
impl Measurable for Size {
    fn measure(&self, _proposal: SizeProposal) -> Size {
        *self
    }
}

impl<T: Measurable + ?Sized> Measurable for &T {
    fn measure(&self, proposal: SizeProposal) -> Size {
        (**self).measure(proposal)
    }
}

impl<T: Measurable + ?Sized> Measurable for Box<T> {
    fn measure(&self, proposal: SizeProposal) -> Size {
        (**self).measure(proposal)
    }
}

/// How a placed item was moved to keep the strip continuous
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapShift {
    /// Natural position
    #[default]
    None,
    /// Fell off the leading edge and was moved forward by one content extent
    Forward,
    /// Fell off the trailing edge and was moved backward by one content extent
    Backward,
}

/// Final frame of one item
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Index of the item in the input sequence
    pub index: usize,
    pub rect: Rect,
    pub wrapped: WrapShift,
}

/// How a scroll position scalar is interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollEncoding {
    /// Length units along the scroll axis
    #[default]
    Offset,
    /// Whole content cycles; `1.0` is one full trip around
    Progress,
}

impl ScrollEncoding {
    /// Convert a position in this encoding to an offset in length units
    pub fn to_offset(self, value: f64, total: f64) -> f64 {
        match self {
            ScrollEncoding::Offset => value,
            ScrollEncoding::Progress => value * total,
        }
    }
}

/// Wraparound layout along one axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WrapLayout {
    pub axis: Axis,
    /// Scroll offset in length units, unbounded
    pub offset: f64,
}

impl WrapLayout {
    pub fn new(axis: Axis, offset: f64) -> Self {
        Self { axis, offset }
    }

    pub fn horizontal(offset: f64) -> Self {
        Self::new(Axis::Horizontal, offset)
    }

    pub fn vertical(offset: f64) -> Self {
        Self::new(Axis::Vertical, offset)
    }

    /// Layout for a position expressed in content cycles
    pub fn with_progress(axis: Axis, progress: f64, total: f64) -> Self {
        Self::new(axis, ScrollEncoding::Progress.to_offset(progress, total))
    }

    /// Unclamped content size: summed along the scroll axis, max across it
    pub fn content_size<I: Measurable>(&self, items: &[I], proposal: SizeProposal) -> Size {
        let (main, cross) = items.iter().fold((0.0_f32, 0.0_f32), |(main, cross), item| {
            let size = item.measure(proposal);
            (
                main + self.axis.main(size),
                cross.max(self.axis.cross(size)),
            )
        });
        self.axis.size(main, cross)
    }

    /// Size the layout reports to its parent
    ///
    /// The scroll extent is clamped to the resolved proposal so a long strip
    /// never asks for more room than offered.
    pub fn measure<I: Measurable>(&self, items: &[I], proposal: SizeProposal) -> Size {
        if items.is_empty() {
            return Size::ZERO;
        }

        let content = self.content_size(items, proposal);
        let resolved = proposal.replacing_unspecified();
        self.axis.size(
            self.axis.main(content).min(self.axis.main(resolved)),
            self.axis.cross(content),
        )
    }

    /// Place every item inside `bounds`
    ///
    /// Returns an empty vec when the content has no extent along the scroll
    /// axis.
    pub fn place<I: Measurable>(
        &self,
        items: &[I],
        bounds: Rect,
        proposal: SizeProposal,
    ) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(items.len());
        self.place_into(items, bounds, proposal, &mut |placement| {
            placements.push(placement)
        });
        placements
    }

    /// Place every item, handing each placement to `sink` in input order
    pub fn place_into<I, F>(&self, items: &[I], bounds: Rect, proposal: SizeProposal, sink: &mut F)
    where
        I: Measurable,
        F: FnMut(Placement),
    {
        let axis = self.axis;
        let sizes: SmallVec<[Size; 16]> = items.iter().map(|item| item.measure(proposal)).collect();
        let total: f32 = sizes.iter().map(|size| axis.main(*size)).sum();

        if !(total.is_finite() && total > 0.0) {
            tracing::trace!(total, "WrapLayout: no scroll extent, nothing placed");
            return;
        }

        let viewport_leading = axis.leading(&bounds);
        let viewport_trailing = axis.trailing(&bounds);
        if total < viewport_trailing - viewport_leading {
            tracing::debug!(
                total,
                viewport = viewport_trailing - viewport_leading,
                "WrapLayout: content shorter than viewport, wraparound will show gaps"
            );
        }

        let offset = self.reduced_offset(total);
        let cross_origin = axis.cross_axis().main_of(bounds.origin);
        let mut cursor = viewport_leading - offset;

        for (index, size) in sizes.iter().enumerate() {
            let extent = axis.main(*size);
            let leading = cursor;
            let trailing = cursor + extent;

            let (main, wrapped) = if trailing < viewport_leading {
                (leading + total, WrapShift::Forward)
            } else if leading > viewport_trailing {
                (leading - total, WrapShift::Backward)
            } else {
                (leading, WrapShift::None)
            };

            sink(Placement {
                index,
                rect: Rect::from_origin_size(axis.point(main, cross_origin), *size),
                wrapped,
            });

            cursor += extent;
        }
    }

    /// Offset reduced into `[0, total)`
    ///
    /// The reduction runs at full precision; only the in-cycle remainder is
    /// narrowed to layout coordinates.
    fn reduced_offset(&self, total: f32) -> f32 {
        if !self.offset.is_finite() {
            return 0.0;
        }
        let actual = self.offset.rem_euclid(f64::from(total)) as f32;
        // Tiny negative offsets can round up to exactly `total`.
        if actual >= total {
            0.0
        } else {
            actual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: usize, width: f32) -> Vec<Size> {
        vec![Size::new(width, 40.0); count]
    }

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 300.0, 40.0)
    }

    #[test]
    fn test_measure_clamps_scroll_extent() {
        let layout = WrapLayout::horizontal(0.0);
        let items = vec![Size::new(100.0, 20.0), Size::new(100.0, 60.0)];

        let size = layout.measure(&items, SizeProposal::new(Some(150.0), None));
        assert_eq!(size, Size::new(150.0, 60.0));

        // Unspecified width resolves to the default extent.
        let size = layout.measure(&items, SizeProposal::UNSPECIFIED);
        assert_eq!(size, Size::new(10.0, 60.0));
    }

    #[test]
    fn test_measure_vertical() {
        let layout = WrapLayout::vertical(0.0);
        let items = vec![Size::new(30.0, 100.0), Size::new(50.0, 100.0)];
        let size = layout.measure(&items, SizeProposal::new(None, Some(500.0)));
        assert_eq!(size, Size::new(50.0, 200.0));
    }

    #[test]
    fn test_measure_empty_is_zero() {
        let items: Vec<Size> = Vec::new();
        assert_eq!(
            WrapLayout::horizontal(0.0).measure(&items, SizeProposal::UNSPECIFIED),
            Size::ZERO
        );
    }

    #[test]
    fn test_place_at_zero_offset() {
        let placements =
            WrapLayout::horizontal(0.0).place(&row(5, 100.0), viewport(), SizeProposal::UNSPECIFIED);

        let xs: Vec<f32> = placements.iter().map(|p| p.rect.x()).collect();
        // Items 3 and 4 start at 300 and 400: item 3 touches the trailing edge
        // and stays, item 4 is past it and moves to -100.
        assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0, -100.0]);
        assert_eq!(placements[4].wrapped, WrapShift::Backward);
        assert!(placements.iter().all(|p| p.rect.y() == 0.0));
    }

    #[test]
    fn test_place_wraps_leading_items_forward() {
        let placements = WrapLayout::horizontal(450.0).place(
            &row(5, 100.0),
            viewport(),
            SizeProposal::UNSPECIFIED,
        );

        assert_eq!(placements[0].rect.x(), 50.0);
        assert_eq!(placements[0].wrapped, WrapShift::Forward);
        assert_eq!(placements[4].rect.x(), -50.0);
        assert_eq!(placements[4].wrapped, WrapShift::None);
    }

    #[test]
    fn test_negative_offset_is_periodic() {
        let items = row(5, 100.0);
        let a = WrapLayout::horizontal(-50.0).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        let b = WrapLayout::horizontal(450.0).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        assert_eq!(a, b);
    }

    #[test]
    fn test_vertical_pins_cross_axis_to_origin() {
        let bounds = Rect::new(20.0, 10.0, 40.0, 300.0);
        let items = vec![Size::new(40.0, 100.0); 4];
        let placements = WrapLayout::vertical(0.0).place(&items, bounds, SizeProposal::UNSPECIFIED);

        assert_eq!(placements[0].rect, Rect::new(20.0, 10.0, 40.0, 100.0));
        assert_eq!(placements[1].rect.y(), 110.0);
        assert!(placements.iter().all(|p| p.rect.x() == 20.0));
    }

    #[test]
    fn test_zero_extent_places_nothing() {
        let items = vec![Size::new(0.0, 40.0); 3];
        assert!(WrapLayout::horizontal(10.0)
            .place(&items, viewport(), SizeProposal::UNSPECIFIED)
            .is_empty());

        let empty: Vec<Size> = Vec::new();
        assert!(WrapLayout::horizontal(10.0)
            .place(&empty, viewport(), SizeProposal::UNSPECIFIED)
            .is_empty());
    }

    #[test]
    fn test_non_finite_offset_treated_as_zero() {
        let items = row(5, 100.0);
        let at_zero = WrapLayout::horizontal(0.0).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        for offset in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let placed =
                WrapLayout::horizontal(offset).place(&items, viewport(), SizeProposal::UNSPECIFIED);
            assert_eq!(placed, at_zero);
        }
    }

    #[test]
    fn test_short_content_stays_finite() {
        let items = row(2, 50.0);
        let placements =
            WrapLayout::horizontal(1234.5).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        assert_eq!(placements.len(), 2);
        assert!(placements
            .iter()
            .all(|p| p.rect.x().is_finite() && p.rect.width() == 50.0));
    }

    #[test]
    fn test_progress_encoding() {
        let layout = WrapLayout::with_progress(Axis::Horizontal, 0.25, 400.0);
        assert_eq!(layout.offset, 100.0);
        assert_eq!(ScrollEncoding::Offset.to_offset(7.0, 400.0), 7.0);
    }

    #[test]
    fn test_far_offset_reduces_exactly() {
        let items = row(5, 100.0);
        let near = WrapLayout::horizontal(450.25).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        // 10^9 whole cycles past the near offset.
        let far = WrapLayout::horizontal(450.25 + 500.0 * 1e9).place(
            &items,
            viewport(),
            SizeProposal::UNSPECIFIED,
        );
        assert_eq!(near, far);
        assert_eq!(far[0].rect.x(), 49.75);
    }

    #[test]
    fn test_tiny_negative_offset_stays_in_cycle() {
        let items = row(5, 100.0);
        let at_zero = WrapLayout::horizontal(0.0).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        let placed = WrapLayout::horizontal(-1e-300).place(&items, viewport(), SizeProposal::UNSPECIFIED);
        assert_eq!(placed, at_zero);
    }

    #[test]
    fn test_place_into_matches_place() {
        let items = row(5, 100.0);
        let layout = WrapLayout::horizontal(123.0);
        let mut streamed = Vec::new();
        layout.place_into(&items, viewport(), SizeProposal::UNSPECIFIED, &mut |p| {
            streamed.push(p)
        });
        assert_eq!(
            streamed,
            layout.place(&items, viewport(), SizeProposal::UNSPECIFIED)
        );
    }
}
