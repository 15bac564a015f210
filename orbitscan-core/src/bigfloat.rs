use dashu_base::{Abs, Approximation};
use dashu_float::{DBig, FBig};

/// Arbitrary precision floating point with explicit precision enforcement
///
/// Uses f64 internally when precision_bits <= 64, FBig otherwise.
#[derive(Clone, Debug)]
pub struct BigFloat {
    value: BigFloatValue,
    precision_bits: usize,
}

#[derive(Clone, Debug)]
enum BigFloatValue {
    F64(f64),
    Arbitrary(FBig),
}

/// Exact binary conversion of a finite f64. NaN becomes zero and
/// infinities saturate to ±f64::MAX.
fn fbig_from_f64(val: f64, precision_bits: usize) -> FBig {
    let finite = if val.is_nan() {
        0.0
    } else {
        val.clamp(f64::MIN, f64::MAX)
    };
    let base = if finite == 0.0 {
        FBig::ZERO
    } else {
        FBig::try_from(finite).unwrap_or(FBig::ZERO)
    };
    base.with_precision(precision_bits).value()
}

impl BigFloat {
    /// Create BigFloat from f64 with explicit precision
    pub fn with_precision(val: f64, precision_bits: usize) -> Self {
        let value = if precision_bits <= 64 {
            BigFloatValue::F64(val)
        } else {
            BigFloatValue::Arbitrary(fbig_from_f64(val, precision_bits))
        };

        Self {
            value,
            precision_bits,
        }
    }

    pub fn zero(precision_bits: usize) -> Self {
        Self::with_precision(0.0, precision_bits)
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Convert to f64. May lose precision for values requiring > 64 bits
    pub fn to_f64(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => *v,
            BigFloatValue::Arbitrary(v) => v.to_f64().value(),
        }
    }

    /// Create BigFloat from a decimal string with explicit precision
    ///
    /// Allows values beyond f64 range and resolution (e.g. "1e-400").
    pub fn from_string(val: &str, precision_bits: usize) -> Result<Self, String> {
        if precision_bits <= 64 {
            val.parse::<f64>()
                .map(|f| Self::with_precision(f, precision_bits))
                .map_err(|e| format!("Failed to parse f64: {}", e))
        } else {
            val.parse::<DBig>()
                .map_err(|e| format!("Failed to parse DBig: {}", e))
                .map(|dbig| {
                    let binary = match dbig.with_base_and_precision::<2>(precision_bits) {
                        Approximation::Exact(v) => v,
                        Approximation::Inexact(v, _) => v,
                    };
                    Self {
                        value: BigFloatValue::Arbitrary(
                            binary.with_rounding::<dashu_float::round::mode::Zero>(),
                        ),
                        precision_bits,
                    }
                })
        }
    }

    fn combine(
        &self,
        other: &Self,
        small: impl Fn(f64, f64) -> f64,
        big: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let precision_bits = self.precision_bits.max(other.precision_bits);
        let value = match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) if precision_bits <= 64 => {
                BigFloatValue::F64(small(*a, *b))
            }
            _ => BigFloatValue::Arbitrary(big(
                &self.to_fbig(precision_bits),
                &other.to_fbig(precision_bits),
            )),
        };
        Self {
            value,
            precision_bits,
        }
    }

    /// Add two BigFloats, preserving max precision
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a + b, |a, b| a + b)
    }

    /// Subtract two BigFloats, preserving max precision
    pub fn sub(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a - b, |a, b| a - b)
    }

    /// Multiply two BigFloats, preserving max precision
    pub fn mul(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a * b, |a, b| a * b)
    }

    /// Divide two BigFloats, preserving max precision. `other` must be non-zero.
    pub fn div(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a / b, |a, b| a / b)
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    pub fn abs(&self) -> Self {
        let value = match &self.value {
            BigFloatValue::F64(v) => BigFloatValue::F64(v.abs()),
            BigFloatValue::Arbitrary(v) => BigFloatValue::Arbitrary(v.clone().abs()),
        };
        Self {
            value,
            precision_bits: self.precision_bits,
        }
    }

    fn to_fbig(&self, precision_bits: usize) -> FBig {
        match &self.value {
            BigFloatValue::F64(v) => fbig_from_f64(*v, precision_bits),
            BigFloatValue::Arbitrary(v) => v.clone(),
        }
    }
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a == b,
            _ => {
                let bits = self.precision_bits.max(other.precision_bits);
                self.to_fbig(bits) == other.to_fbig(bits)
            }
        }
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a.partial_cmp(b),
            _ => {
                let bits = self.precision_bits.max(other.precision_bits);
                self.to_fbig(bits).partial_cmp(&other.to_fbig(bits))
            }
        }
    }
}
