//! 3-D Points and Vectors

use crate::base::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub};

/// A 3-D direction or displacement.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3f {
    /// X-coordinate.
    pub x: Float,

    /// Y-coordinate.
    pub y: Float,

    /// Z-coordinate.
    pub z: Float,
}

/// A 3-D position.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3f {
    /// X-coordinate.
    pub x: Float,

    /// Y-coordinate.
    pub y: Float,

    /// Z-coordinate.
    pub z: Float,
}

impl Vector3f {
    /// Creates a new 3-D vector.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub const fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Returns the dot product with another vector.
    ///
    /// * `v` - The other vector.
    pub fn dot(&self, v: &Self) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Returns the absolute value of the dot product with another vector.
    ///
    /// * `v` - The other vector.
    pub fn abs_dot(&self, v: &Self) -> Float {
        abs(self.dot(v))
    }

    /// Returns the cross product with another vector.
    ///
    /// * `v` - The other vector.
    pub fn cross(&self, v: &Self) -> Self {
        Self::new(
            self.y * v.z - self.z * v.y,
            self.z * v.x - self.x * v.z,
            self.x * v.y - self.y * v.x,
        )
    }

    /// Returns the square of the vector's length.
    pub fn length_squared(&self) -> Float {
        self.dot(self)
    }

    /// Returns the vector's length.
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector pointing in the same direction.
    pub fn normalize(&self) -> Self {
        *self / self.length()
    }

    /// Returns true if any component is NaN.
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl Point3f {
    /// Creates a new 3-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub const fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Returns the distance to another point.
    ///
    /// * `p` - The other point.
    pub fn distance(&self, p: &Self) -> Float {
        (*self - *p).length()
    }

    /// Returns the squared distance to another point.
    ///
    /// * `p` - The other point.
    pub fn distance_squared(&self, p: &Self) -> Float {
        (*self - *p).length_squared()
    }
}

impl Add for Vector3f {
    type Output = Self;

    fn add(self, v: Self) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl AddAssign for Vector3f {
    fn add_assign(&mut self, v: Self) {
        self.x += v.x;
        self.y += v.y;
        self.z += v.z;
    }
}

impl Sub for Vector3f {
    type Output = Self;

    fn sub(self, v: Self) -> Self::Output {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl Neg for Vector3f {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Float> for Vector3f {
    type Output = Self;

    fn mul(self, f: Float) -> Self::Output {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

impl Mul<Vector3f> for Float {
    type Output = Vector3f;

    fn mul(self, v: Vector3f) -> Self::Output {
        v * self
    }
}

impl Div<Float> for Vector3f {
    type Output = Self;

    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        let inv = 1.0 / f;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl Index<usize> for Vector3f {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Invalid axis for Vector3f"),
        }
    }
}

impl Sub for Point3f {
    type Output = Vector3f;

    fn sub(self, p: Self) -> Self::Output {
        Vector3f::new(self.x - p.x, self.y - p.y, self.z - p.z)
    }
}

impl Add<Vector3f> for Point3f {
    type Output = Self;

    fn add(self, v: Vector3f) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub<Vector3f> for Point3f {
    type Output = Self;

    fn sub(self, v: Vector3f) -> Self::Output {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<Vector3f> for Point3f {
    fn from(v: Vector3f) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl fmt::Display for Point3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn vector3f() -> impl Strategy<Value = Vector3f> {
        (-100.0f32..100.0f32, -100.0f32..100.0f32, -100.0f32..100.0f32).prop_map(|(x, y, z)| Vector3f::new(x, y, z))
    }

    proptest! {
        #[test]
        fn cross_is_orthogonal_to_inputs(a in vector3f(), b in vector3f()) {
            let c = a.cross(&b);
            let scale = a.length() * b.length() * (a.length() + b.length()) + 1.0;
            prop_assert!(abs(c.dot(&a)) / scale < 1e-4);
            prop_assert!(abs(c.dot(&b)) / scale < 1e-4);
        }

        #[test]
        fn normalized_vector_has_unit_length(a in vector3f()) {
            prop_assume!(a.length() > 1e-3);
            prop_assert!(approx_eq!(f32, a.normalize().length(), 1.0, epsilon = 1e-5));
        }

        #[test]
        fn point_distance_is_symmetric(a in vector3f(), b in vector3f()) {
            let p = Point3f::from(a);
            let q = Point3f::from(b);
            prop_assert_eq!(p.distance(&q), q.distance(&p));
        }
    }
}
