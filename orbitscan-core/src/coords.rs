//! Pixel to complex-plane mapping.
//!
//! A view is described by three corners: top-left `(x_min, y_max)`,
//! bottom-right `(x_max, y_min)` and bottom-left `(x_3rd, y_3rd)`. When the
//! bottom-left corner sits at `(x_min, y_min)` the view is an axis-aligned
//! rectangle; anything else rotates or skews it.

use crate::Complex;
use serde::{Deserialize, Serialize};

/// Rectangle in the complex plane, with an optional rotated/skewed third corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplexRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_3rd: f64,
    pub y_3rd: f64,
}

impl ComplexRect {
    /// Axis-aligned rectangle.
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            x_3rd: x_min,
            y_3rd: y_min,
        }
    }

    /// True when the bottom-left corner has been moved off `(x_min, y_min)`.
    pub fn is_rotated(&self) -> bool {
        self.x_min != self.x_3rd || self.y_min != self.y_3rd
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl Default for ComplexRect {
    fn default() -> Self {
        Self::new(-2.5, 1.5, -1.5, 1.5)
    }
}

/// Circle inversion applied to each pixel's point before the orbit starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inversion {
    pub radius: f64,
    pub center: Complex,
}

impl Inversion {
    pub fn new(radius: f64, center: Complex) -> Self {
        Self { radius, center }
    }

    /// Invert `z` through the circle. The center has no image and is left in place.
    pub fn apply(&self, z: Complex) -> Complex {
        let offset = z - self.center;
        let r2 = offset.norm_sq();
        let factor = if r2 != 0.0 {
            self.radius / r2
        } else {
            f64::MAX
        };
        offset.scale(factor) + self.center
    }
}

/// Per-canvas mapping from pixel `(col, row)` to a complex point.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMap {
    rect: ComplexRect,
    width: i32,
    height: i32,
    del_x: f64,
    del_y: f64,
    del_x2: f64,
    del_y2: f64,
}

impl CoordinateMap {
    pub fn new(rect: &ComplexRect, width: i32, height: i32) -> Self {
        let cols = f64::from((width - 1).max(1));
        let rows = f64::from((height - 1).max(1));
        Self {
            rect: *rect,
            width,
            height,
            del_x: (rect.x_max - rect.x_3rd) / cols,
            del_y: (rect.y_max - rect.y_3rd) / rows,
            del_x2: (rect.x_3rd - rect.x_min) / rows,
            del_y2: (rect.y_3rd - rect.y_min) / cols,
        }
    }

    pub fn rect(&self) -> &ComplexRect {
        &self.rect
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Complex point for pixel `(col, row)`; row 0 is the top edge.
    #[inline]
    pub fn pixel_to_complex(&self, col: i32, row: i32) -> Complex {
        let col = f64::from(col);
        let row = f64::from(row);
        Complex::new(
            self.rect.x_min + col * self.del_x + row * self.del_x2,
            self.rect.y_max - row * self.del_y - col * self.del_y2,
        )
    }

    /// Smallest non-zero pixel step in either direction.
    pub fn min_pixel_delta(&self) -> f64 {
        let mut delta = self.del_x.abs();
        if self.del_y.abs() < delta {
            delta = self.del_y.abs();
        }
        if self.del_x2 != 0.0 && self.del_x2.abs() < delta {
            delta = self.del_x2.abs();
        }
        if self.del_y2 != 0.0 && self.del_y2.abs() < delta {
            delta = self.del_y2.abs();
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_rect_corners() {
        let rect = ComplexRect::new(-2.0, 2.0, -1.0, 1.0);
        let map = CoordinateMap::new(&rect, 101, 51);

        assert_eq!(map.pixel_to_complex(0, 0), Complex::new(-2.0, 1.0));
        assert_eq!(map.pixel_to_complex(100, 50), Complex::new(2.0, -1.0));
        assert_eq!(map.pixel_to_complex(50, 25), Complex::new(0.0, 0.0));
    }

    #[test]
    fn axis_aligned_rect_is_not_rotated() {
        assert!(!ComplexRect::new(-1.0, 1.0, -1.0, 1.0).is_rotated());

        let mut skewed = ComplexRect::new(-1.0, 1.0, -1.0, 1.0);
        skewed.x_3rd = -0.5;
        assert!(skewed.is_rotated());
    }

    #[test]
    fn min_pixel_delta_picks_finer_axis() {
        let rect = ComplexRect::new(0.0, 4.0, 0.0, 1.0);
        let map = CoordinateMap::new(&rect, 5, 5);
        assert_eq!(map.min_pixel_delta(), 0.25);
    }

    #[test]
    fn single_pixel_canvas_does_not_divide_by_zero() {
        let map = CoordinateMap::new(&ComplexRect::default(), 1, 1);
        let p = map.pixel_to_complex(0, 0);
        assert!(p.re.is_finite() && p.im.is_finite());
    }

    #[test]
    fn inversion_maps_unit_circle_to_itself() {
        let inv = Inversion::new(1.0, Complex::ZERO);
        let z = inv.apply(Complex::new(0.0, 1.0));
        assert!((z.re - 0.0).abs() < 1e-12);
        assert!((z.im - 1.0).abs() < 1e-12);

        let far = inv.apply(Complex::new(2.0, 0.0));
        assert!((far.re - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inversion_of_center_stays_put() {
        let inv = Inversion::new(1.0, Complex::new(0.5, 0.0));
        let z = inv.apply(Complex::new(0.5, 0.0));
        assert_eq!(z.re, 0.5);
    }

    #[test]
    fn rect_serialization_roundtrip() {
        let original = ComplexRect::new(-0.75, 0.25, -0.5, 0.5);
        let json = serde_json::to_string(&original).unwrap();
        let restored: ComplexRect = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
