//! Scroll axis
//!
//! A carousel scrolls along one axis. The other axis is the cross axis, where
//! items are pinned to the bounds origin without alignment or spacing.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size, Vec2};

/// The axis a carousel scrolls along
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Items flow left to right
    #[default]
    Horizontal,
    /// Items flow top to bottom
    Vertical,
}

impl Axis {
    /// The other axis
    pub fn cross_axis(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Extent of `size` along this axis
    pub fn main(self, size: Size) -> f32 {
        match self {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }

    /// Extent of `size` along the cross axis
    pub fn cross(self, size: Size) -> f32 {
        self.cross_axis().main(size)
    }

    /// Coordinate of `point` along this axis
    pub fn main_of(self, point: Point) -> f32 {
        match self {
            Axis::Horizontal => point.x,
            Axis::Vertical => point.y,
        }
    }

    /// Component of `v` along this axis
    pub fn component(self, v: Vec2) -> f32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    /// Build a size from main and cross extents
    pub fn size(self, main: f32, cross: f32) -> Size {
        match self {
            Axis::Horizontal => Size::new(main, cross),
            Axis::Vertical => Size::new(cross, main),
        }
    }

    /// Build a point from main and cross coordinates
    pub fn point(self, main: f32, cross: f32) -> Point {
        match self {
            Axis::Horizontal => Point::new(main, cross),
            Axis::Vertical => Point::new(cross, main),
        }
    }

    /// Leading edge of `rect` along this axis (min x or min y)
    pub fn leading(self, rect: &Rect) -> f32 {
        match self {
            Axis::Horizontal => rect.min_x(),
            Axis::Vertical => rect.min_y(),
        }
    }

    /// Trailing edge of `rect` along this axis (max x or max y)
    pub fn trailing(self, rect: &Rect) -> f32 {
        match self {
            Axis::Horizontal => rect.max_x(),
            Axis::Vertical => rect.max_y(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_mirrors() {
        let size = Size::new(3.0, 7.0);
        assert_eq!(Axis::Horizontal.main(size), 3.0);
        assert_eq!(Axis::Horizontal.cross(size), 7.0);
        assert_eq!(Axis::Vertical.main(size), 7.0);
        assert_eq!(Axis::Vertical.cross(size), 3.0);

        assert_eq!(Axis::Vertical.size(7.0, 3.0), size);
        assert_eq!(Axis::Vertical.point(5.0, 1.0), Point::new(1.0, 5.0));
    }

    #[test]
    fn test_axis_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(Axis::Horizontal.leading(&r), 10.0);
        assert_eq!(Axis::Horizontal.trailing(&r), 40.0);
        assert_eq!(Axis::Vertical.leading(&r), 20.0);
        assert_eq!(Axis::Vertical.trailing(&r), 60.0);
    }

    #[test]
    fn test_axis_deserialize() {
        #[derive(Deserialize)]
        struct Row {
            axis: Axis,
        }

        let row: Row = toml::from_str("axis = \"vertical\"").unwrap();
        assert_eq!(row.axis, Axis::Vertical);
    }
}
