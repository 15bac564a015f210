//! Double-precision complex values for orbits and pixel coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Complex number with f64 components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Complex square (optimized).
    #[inline]
    pub fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    /// Multiply by f64 scalar.
    #[inline]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    /// Magnitude squared.
    #[inline]
    pub fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, other: Complex) -> Complex {
        Complex::new(self.re + other.re, self.im + other.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    #[inline]
    fn sub(self, other: Complex) -> Complex {
        Complex::new(self.re - other.re, self.im - other.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, other: Complex) -> Complex {
        Complex::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_matches_self_multiplication() {
        let z = Complex::new(1.5, -0.25);
        assert_eq!(z.square(), z * z);
    }

    #[test]
    fn norm_sq_of_three_four() {
        assert_eq!(Complex::new(3.0, 4.0).norm_sq(), 25.0);
    }

    #[test]
    fn add_sub_are_inverse() {
        let a = Complex::new(0.5, 2.0);
        let b = Complex::new(-1.25, 0.75);
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn zero_detection() {
        assert!(Complex::ZERO.is_zero());
        assert!(!Complex::new(0.0, 1e-300).is_zero());
    }
}
