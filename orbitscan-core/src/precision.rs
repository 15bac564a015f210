//! Precision estimate for a view.
//!
//! Decides how many mantissa bits pixel coordinates need so that adjacent
//! pixels stay distinguishable over the whole orbit.

use crate::ComplexRect;

/// Safety margin for rounding errors in arithmetic operations.
const SAFETY_BITS: u64 = 64;

/// Mantissa bits carried by f64.
pub const F64_MANTISSA_BITS: u64 = 53;

/// Bits needed to resolve one pixel of `rect` on a `width` x `height`
/// canvas, plus the error amplification of `max_iterations` steps.
pub fn required_mantissa_bits(
    rect: &ComplexRect,
    width: u32,
    height: u32,
    max_iterations: u32,
) -> u64 {
    let log2_delta_x = rect.width().abs().log2() - f64::from(width.max(1)).log2();
    let log2_delta_y = rect.height().abs().log2() - f64::from(height.max(1)).log2();
    let log2_min_delta = log2_delta_x.min(log2_delta_y);

    let magnitude = rect
        .x_min
        .abs()
        .max(rect.x_max.abs())
        .max(rect.y_min.abs())
        .max(rect.y_max.abs());
    // One extra bit for the sum of center and half extent.
    let log2_m = magnitude.log2() + 1.0;

    let log2_ratio = log2_m - log2_min_delta;
    let bits_from_ratio = if log2_ratio.is_finite() {
        log2_ratio.ceil().max(0.0) as u64
    } else {
        0
    };

    let iter_bits = if max_iterations > 1 {
        f64::from(max_iterations).log2().ceil() as u64
    } else {
        0
    };

    bits_from_ratio + iter_bits
}

/// Precision for arbitrary-precision arithmetic, rounded up to a power of 2.
pub fn calculate_precision_bits(
    rect: &ComplexRect,
    width: u32,
    height: u32,
    max_iterations: u32,
) -> usize {
    let total = required_mantissa_bits(rect, width, height, max_iterations) + SAFETY_BITS;
    (total as usize).next_power_of_two().max(64)
}

/// True when f64 arithmetic cannot resolve adjacent pixels.
pub fn needs_arbitrary_precision(
    rect: &ComplexRect,
    width: u32,
    height: u32,
    max_iterations: u32,
) -> bool {
    required_mantissa_bits(rect, width, height, max_iterations) > F64_MANTISSA_BITS
}
