//! RGB Spectrum

use crate::base::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign};

/// CIE Y weights for linear sRGB.
const Y_WEIGHT: [Float; 3] = [0.212671, 0.715160, 0.072169];

/// Spectral value stored as linear RGB coefficients.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    /// RGB coefficients.
    pub c: [Float; 3],
}

impl RGBSpectrum {
    /// Black.
    pub const ZERO: Self = Self { c: [0.0; 3] };

    /// White.
    pub const ONE: Self = Self { c: [1.0; 3] };

    /// Creates a spectrum with the same value in every channel.
    ///
    /// * `v` - The value.
    pub const fn new(v: Float) -> Self {
        Self { c: [v; 3] }
    }

    /// Creates a spectrum from RGB coefficients.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub const fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns true if every channel is zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|&v| v == 0.0)
    }

    /// Returns true if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns true if every channel is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.c.iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Returns the luminance.
    pub fn y(&self) -> Float {
        self.c[0] * Y_WEIGHT[0] + self.c[1] * Y_WEIGHT[1] + self.c[2] * Y_WEIGHT[2]
    }

    /// Returns the largest channel value.
    pub fn max_component_value(&self) -> Float {
        max(self.c[0], max(self.c[1], self.c[2]))
    }

    /// Returns the channel-wise exponential.
    pub fn exp(&self) -> Self {
        Self::from_rgb(self.c[0].exp(), self.c[1].exp(), self.c[2].exp())
    }

    /// Returns the average of the channels.
    pub fn average(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) / 3.0
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, s: Self) -> Self::Output {
        Self::from_rgb(self.c[0] + s.c[0], self.c[1] + s.c[1], self.c[2] + s.c[2])
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, s: Self) {
        for i in 0..3 {
            self.c[i] += s.c[i];
        }
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, s: Self) -> Self::Output {
        Self::from_rgb(self.c[0] * s.c[0], self.c[1] * s.c[1], self.c[2] * s.c[2])
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, s: Self) {
        for i in 0..3 {
            self.c[i] *= s.c[i];
        }
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self::Output {
        Self::from_rgb(self.c[0] * f, self.c[1] * f, self.c[2] * f)
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> Self::Output {
        s * self
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, f: Float) {
        for i in 0..3 {
            self.c[i] *= f;
        }
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        let inv = 1.0 / f;
        self * inv
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl IndexMut<usize> for RGBSpectrum {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.c[i]
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}

// ---- Tests ----
