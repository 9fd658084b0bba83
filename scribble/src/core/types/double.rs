//! Double-double ("r64") compensated arithmetic
//!
//! A [`Double`] emulates extended precision on a target that only has 32-bit
//! floats: `hi` is the rounded value and `lo` the rounding error, maintained
//! with compensated summation (two-sum) and compensated multiplication
//! (two-product via splitting).  The shader backend emits the same
//! algorithms as GLSL helper functions (see [`glsl::r64`](crate::glsl::r64));
//! the host kernels here are the reference the shader twins are tested
//! against.

use ordered_float::OrderedFloat;

/// Split constant for 24-bit significands: 2^13 + 1
const SPLIT: f32 = 8193.0;

/// A compensated pair of 32-bit floats
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Double {
    /// Rounded value
    pub hi: f32,
    /// Rounding error of `hi`
    pub lo: f32,
}

impl Double {
    /// The exact zero
    pub const ZERO: Double = Double { hi: 0.0, lo: 0.0 };

    /// Builds a pair from raw components
    pub fn new(hi: f32, lo: f32) -> Self {
        Double { hi, lo }
    }

    /// Splits an `f64` into a compensated pair
    pub fn from_f64(v: f64) -> Self {
        let hi = v as f32;
        let lo = (v - hi as f64) as f32;
        Double { hi, lo }
    }

    /// Recombines the pair into an `f64`
    pub fn to_f64(&self) -> f64 {
        self.hi as f64 + self.lo as f64
    }

    /// Negation
    pub fn neg(self) -> Self {
        Double {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

/// Renormalizes a sum of a high word and an unnormalized tail
fn renorm(t1: f32, t2: f32) -> Double {
    let hi = t1 + t2;
    Double {
        hi,
        lo: t2 - (hi - t1),
    }
}

/// Compensated addition
///
/// The two-sum error term is exact and therefore symmetric in `a` and `b`;
/// the low words are summed before joining it so the whole kernel commutes.
pub fn add_dd(a: Double, b: Double) -> Double {
    let t1 = a.hi + b.hi;
    let e = t1 - a.hi;
    let t2 = ((b.hi - e) + (a.hi - (t1 - e))) + (a.lo + b.lo);
    renorm(t1, t2)
}

/// Compensated subtraction
pub fn sub_dd(a: Double, b: Double) -> Double {
    add_dd(a, b.neg())
}

/// Compensated multiplication, using the classic splitting two-product
pub fn mul_dd(a: Double, b: Double) -> Double {
    let cona = a.hi * SPLIT;
    let conb = b.hi * SPLIT;
    let a1 = cona - (cona - a.hi);
    let b1 = conb - (conb - b.hi);
    let a2 = a.hi - a1;
    let b2 = b.hi - b1;

    let c11 = a.hi * b.hi;
    let c21 = a2 * b2 + (a2 * b1 + (a1 * b2 + (a1 * b1 - c11)));

    let c2 = a.hi * b.lo + a.lo * b.hi;

    let t1 = c11 + c2;
    let e = t1 - c11;
    let t2 = (a.lo * b.lo + ((c2 - e) + (c11 - (t1 - e)))) + c21;
    renorm(t1, t2)
}

/// Compensated division by long division on the pair
///
/// One rounded quotient digit, then a second digit from the compensated
/// residual.
pub fn div_dd(a: Double, b: Double) -> Double {
    let t1 = a.hi / b.hi;
    let p = mul_dd(b, Double::new(t1, 0.0));
    let r = sub_dd(a, p);
    let t2 = r.hi / b.hi;
    renorm(t1, t2)
}

/// Lexicographic comparison on `(hi, lo)`
pub fn cmp_dd(a: Double, b: Double) -> std::cmp::Ordering {
    (OrderedFloat(a.hi), OrderedFloat(a.lo))
        .cmp(&(OrderedFloat(b.hi), OrderedFloat(b.lo)))
}
