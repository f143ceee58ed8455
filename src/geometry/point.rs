//! Planar points and the small vector algebra the division engine needs.
//!
//! The tissue mesh is embedded in the Euclidean plane and every geometric
//! computation in the crate (areas, centroids, cut-point parametrization,
//! clearance checks) bottoms out in the operations defined here. Coordinates
//! are concrete `f64`; the mechanical state this crate consumes is stored in
//! double precision.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point (or free vector) in the plane.
///
/// `Point2` is deliberately both point and vector: wall endpoints, cut
/// points, anchors, and directions all use it, and the distinction carries
/// no weight at this scale.
///
/// # Examples
///
/// ```rust
/// use cytokinesis::geometry::point::Point2;
///
/// let a = Point2::new(1.0, 0.0);
/// let b = Point2::new(0.0, 1.0);
/// assert_eq!(a.dot(b), 0.0);
/// assert_eq!(a.cross(b), 1.0);
/// assert_eq!(a.distance(b), 2.0_f64.sqrt());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2 {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a point from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product with another vector.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Scalar (z-component of the) cross product with another vector.
    ///
    /// Positive when `other` lies counter-clockwise of `self`.
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.y, -(self.y * other.x))
    }

    /// Squared Euclidean norm.
    #[inline]
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm, computed via `hypot` for robustness near the
    /// extremes of the exponent range.
    #[inline]
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).norm()
    }

    /// The counter-clockwise perpendicular of this vector.
    #[inline]
    #[must_use]
    pub const fn perp(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Unit vector in the direction of `self`, or `None` for vectors too
    /// short to normalize meaningfully.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let n = self.norm();
        if n < f64::EPSILON {
            None
        } else {
            Some(Self {
                x: self.x / n,
                y: self.y / n,
            })
        }
    }

    /// Linear interpolation between two points: `t = 0` gives `a`,
    /// `t = 1` gives `b`. `t` is not clamped.
    #[inline]
    #[must_use]
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        a + (b - a) * t
    }

    /// Midpoint of two points.
    #[inline]
    #[must_use]
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self::lerp(a, b, 0.5)
    }

    /// True when both coordinates are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f64; 2]> for Point2 {
    #[inline]
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2> for [f64; 2] {
    #[inline]
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}
