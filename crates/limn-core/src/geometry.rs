//! Geometric primitives for diagram layout and drawing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Layout positions are the top-left corner of a node; connectors attach to
//! node centers. Converting to the coordinate system of a concrete automation
//! backend is that backend's concern.

use serde::{Deserialize, Serialize};

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use limn_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Converts a top-left point and a size into a bounds rectangle.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_top_left(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns true if both dimensions are finite and not negative
    pub fn is_non_negative(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Replaces every non-positive or non-finite dimension with the matching
    /// dimension of `fallback`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use limn_core::geometry::Size;
    /// let fallback = Size::new(120.0, 60.0);
    /// let size = Size::new(-3.0, 40.0).or_dimensions_of(fallback);
    /// assert_eq!(size, Size::new(120.0, 40.0));
    /// ```
    pub fn or_dimensions_of(self, fallback: Size) -> Self {
        let pick = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            width: pick(self.width, fallback.width),
            height: pick(self.height, fallback.height),
        }
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns the smallest bounds containing both `self` and `other`
    pub fn merge(self, other: Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns the smallest bounds containing every point, or `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Bounds::new_from_top_left(*first, Size::default());
        Some(rest.iter().fold(start, |bounds, point| {
            bounds.merge(Bounds::new_from_top_left(*point, Size::default()))
        }))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_midpoint() {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(4.0, 6.0);

        assert_eq!(a.midpoint(b), Point::new(7.0, 13.0));
    }

    #[test]
    fn test_to_bounds_uses_top_left() {
        let bounds = Point::new(162.0, 0.0).to_bounds(Size::new(120.0, 60.0));

        assert_approx_eq!(f32, bounds.min_x(), 162.0);
        assert_approx_eq!(f32, bounds.max_x(), 282.0);
        assert_approx_eq!(f32, bounds.center().x(), 222.0);
        assert_approx_eq!(f32, bounds.center().y(), 30.0);
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(50.0, 50.0), Size::new(20.0, 10.0));

        assert_approx_eq!(f32, bounds.min_x(), 40.0);
        assert_approx_eq!(f32, bounds.min_y(), 45.0);
        assert_approx_eq!(f32, bounds.width(), 20.0);
        assert_approx_eq!(f32, bounds.height(), 10.0);
        assert_eq!(bounds.to_size(), Size::new(20.0, 10.0));
    }

    #[test]
    fn test_bounds_merge() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new_from_top_left(Point::new(20.0, -5.0), Size::new(5.0, 5.0));

        let merged = a.merge(b);

        assert_approx_eq!(f32, merged.min_x(), 0.0);
        assert_approx_eq!(f32, merged.min_y(), -5.0);
        assert_approx_eq!(f32, merged.max_x(), 25.0);
        assert_approx_eq!(f32, merged.max_y(), 10.0);
        assert_eq!(merged, b.merge(a));
    }

    #[test]
    fn test_bounds_from_points() {
        assert!(Bounds::from_points(&[]).is_none());

        let bounds = Bounds::from_points(&[
            Point::new(3.0, 8.0),
            Point::new(-2.0, 1.0),
            Point::new(7.0, 4.0),
        ])
        .expect("non-empty slice");

        assert_approx_eq!(f32, bounds.min_x(), -2.0);
        assert_approx_eq!(f32, bounds.min_y(), 1.0);
        assert_approx_eq!(f32, bounds.max_x(), 7.0);
        assert_approx_eq!(f32, bounds.max_y(), 8.0);
    }

    #[test]
    fn test_size_fallback_dimensions() {
        let fallback = Size::new(120.0, 60.0);

        assert_eq!(Size::new(0.0, 0.0).or_dimensions_of(fallback), fallback);
        assert_eq!(
            Size::new(f32::NAN, 10.0).or_dimensions_of(fallback),
            Size::new(120.0, 10.0)
        );
        assert_eq!(
            Size::new(30.0, 40.0).or_dimensions_of(fallback),
            Size::new(30.0, 40.0)
        );
    }

    #[test]
    fn test_size_max_takes_each_dimension() {
        let size = Size::new(120.0, 20.0).max(Size::new(80.0, 60.0));
        assert_eq!(size, Size::new(120.0, 60.0));
    }

    #[test]
    fn test_size_non_negative() {
        assert!(Size::new(0.0, 0.0).is_non_negative());
        assert!(!Size::new(-1.0, 0.0).is_non_negative());
        assert!(!Size::new(1.0, f32::INFINITY).is_non_negative());
    }
}
