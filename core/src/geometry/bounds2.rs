//! 2-D Axis Aligned Bounding Boxes

use super::*;
use crate::base::*;
use num_traits::Num;
use std::fmt;

/// A 2-D axis aligned bounding box. The maximum corner is exclusive when the
/// box is iterated as a pixel range.
#[derive(Copy, Clone, Default, PartialEq)]
pub struct Bounds2<T> {
    /// Minimum bounds.
    pub p_min: Point2<T>,

    /// Maximum bounds.
    pub p_max: Point2<T>,
}

/// 2-D bounding box containing `Int` points.
pub type Bounds2i = Bounds2<Int>;

impl<T: Num + PartialOrd + Copy> Bounds2<T> {
    /// Creates a new 2-D bounding box from 2 points. The minimum and maximum
    /// bounds are used for each coordinate axis.
    ///
    /// * `p1` - First point.
    /// * `p2` - Second point.
    pub fn new(p1: Point2<T>, p2: Point2<T>) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns the vector from the minimum to the maximum point.
    pub fn diagonal(&self) -> Vector2<T> {
        self.p_max - self.p_min
    }

    /// Returns the area of the box.
    pub fn area(&self) -> T {
        let d = self.diagonal();
        d.x * d.y
    }

    /// Returns true if the box has no interior.
    pub fn is_empty(&self) -> bool {
        self.p_min.x >= self.p_max.x || self.p_min.y >= self.p_max.y
    }

    /// Returns true if a point lies inside the box, excluding the maximum edges.
    ///
    /// * `p` - The point.
    pub fn contains_exclusive(&self, p: &Point2<T>) -> bool {
        p.x >= self.p_min.x && p.x < self.p_max.x && p.y >= self.p_min.y && p.y < self.p_max.y
    }

    /// Returns the overlap of two boxes. The result may be empty.
    ///
    /// * `other` - The other box.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.max(&other.p_min),
            p_max: self.p_max.min(&other.p_max),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Bounds2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} - {} ]", self.p_min, self.p_max)
    }
}

impl<T: fmt::Display> fmt::Debug for Bounds2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl IntoIterator for Bounds2i {
    type Item = Point2i;
    type IntoIter = Bounds2iIterator;

    /// Returns an iterator over the pixels of the box in scanline order.
    fn into_iter(self) -> Self::IntoIter {
        Bounds2iIterator {
            p: self.p_min,
            bounds: self,
        }
    }
}

/// Scanline iterator over the integer points of a `Bounds2i`.
pub struct Bounds2iIterator {
    /// The next point.
    p: Point2i,

    /// The bounds.
    bounds: Bounds2i,
}

impl Iterator for Bounds2iIterator {
    type Item = Point2i;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bounds.is_empty() || self.p.y >= self.bounds.p_max.y {
            return None;
        }

        let p = self.p;
        self.p.x += 1;
        if self.p.x == self.bounds.p_max.x {
            self.p.x = self.bounds.p_min.x;
            self.p.y += 1;
        }
        Some(p)
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn iterating_empty_bounds_returns_none() {
        let b = Bounds2i::new(Point2i::new(2, 2), Point2i::new(2, 5));
        assert_eq!(b.into_iter().next(), None);
    }

    #[test]
    fn iteration_is_scanline_ordered() {
        let b = Bounds2i::new(Point2i::new(0, 0), Point2i::new(2, 2));
        let pixels: Vec<Point2i> = b.into_iter().collect();
        assert_eq!(
            pixels,
            vec![
                Point2i::new(0, 0),
                Point2i::new(1, 0),
                Point2i::new(0, 1),
                Point2i::new(1, 1)
            ]
        );
    }

    proptest! {
        #[test]
        fn iteration_visits_area_points(x0 in -20i32..20, y0 in -20i32..20, w in 0i32..12, h in 0i32..12) {
            let b = Bounds2i::new(Point2i::new(x0, y0), Point2i::new(x0 + w, y0 + h));
            let n = b.into_iter().count() as i32;
            prop_assert_eq!(n, b.area());
            prop_assert!(b.into_iter().all(|p| b.contains_exclusive(&p)));
        }

        #[test]
        fn intersection_is_contained_in_both(x0 in -20i32..20, y0 in -20i32..20, x1 in -20i32..20, y1 in -20i32..20) {
            let a = Bounds2i::new(Point2i::new(x0, y0), Point2i::new(x0 + 10, y0 + 10));
            let b = Bounds2i::new(Point2i::new(x1, y1), Point2i::new(x1 + 10, y1 + 10));
            let c = a.intersect(&b);
            for p in c {
                prop_assert!(a.contains_exclusive(&p) && b.contains_exclusive(&p));
            }
        }
    }
}
