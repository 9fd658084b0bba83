//! Exact-rational reals with graceful degradation to floating point
//!
//! A [`Real`] is either an exact fraction of machine integers or an
//! approximate `f64`.  The arithmetic kernels check every intermediate
//! product and sum with `i64` checked arithmetic; if anything would
//! overflow, the result falls back to floating point and is marked
//! approximate.  The approximate flag is sticky: any operation touching an
//! approximate operand yields an approximate result, which the display layer
//! uses to decide whether to show "≈".

/// A real number, exact when possible
#[derive(Copy, Clone, Debug)]
pub enum Real {
    /// An exact fraction; the denominator is always positive and the pair is
    /// reduced to lowest terms
    Exact(i64, i64),
    /// A value known only to floating precision
    Approx(f64),
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

impl Real {
    /// The exact integer zero
    pub const ZERO: Real = Real::Exact(0, 1);

    /// The exact integer one
    pub const ONE: Real = Real::Exact(1, 1);

    /// Builds an exact integer
    pub fn int(n: i64) -> Self {
        Real::Exact(n, 1)
    }

    /// Builds an exact fraction, normalizing sign and common factors
    ///
    /// A zero denominator degrades to the corresponding IEEE quotient.
    pub fn frac(n: i64, d: i64) -> Self {
        if d == 0 {
            return Real::Approx(n as f64 / 0.0);
        }
        let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };
        let g = gcd(n.unsigned_abs(), d.unsigned_abs()) as i64;
        Real::Exact(n / g, d / g)
    }

    /// Builds an approximate value
    pub fn approx(v: f64) -> Self {
        Real::Approx(v)
    }

    /// Converts to floating point, rounding exact fractions
    pub fn to_f64(&self) -> f64 {
        match *self {
            Real::Exact(n, d) => n as f64 / d as f64,
            Real::Approx(v) => v,
        }
    }

    /// Checks whether the value is exact
    pub fn is_exact(&self) -> bool {
        matches!(self, Real::Exact(..))
    }

    /// Checks whether the value is exactly zero
    pub fn is_exact_zero(&self) -> bool {
        matches!(self, Real::Exact(0, _))
    }

    /// Returns the value as an exact integer, if it is one
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Real::Exact(n, 1) => Some(n),
            _ => None,
        }
    }

    /// Absolute value
    pub fn abs(&self) -> Real {
        match *self {
            Real::Exact(n, d) => Real::Exact(n.abs(), d),
            Real::Approx(v) => Real::Approx(v.abs()),
        }
    }

    /// Negation (always representable; no fallback needed)
    pub fn neg(&self) -> Real {
        match *self {
            Real::Exact(n, d) => Real::Exact(-n, d),
            Real::Approx(v) => Real::Approx(-v),
        }
    }
}

/// Adds two reals, staying exact when every intermediate fits in an `i64`
pub fn add(a: Real, b: Real) -> Real {
    if let (Real::Exact(an, ad), Real::Exact(bn, bd)) = (a, b) {
        if let Some(r) = (|| {
            let s1 = an.checked_mul(bd)?;
            let s2 = bn.checked_mul(ad)?;
            let s3 = ad.checked_mul(bd)?;
            let s4 = s1.checked_add(s2)?;
            Some(Real::frac(s4, s3))
        })() {
            return r;
        }
    }
    Real::Approx(a.to_f64() + b.to_f64())
}

/// Subtracts two reals with the same overflow policy as [`add`]
pub fn sub(a: Real, b: Real) -> Real {
    add(a, b.neg())
}

/// Multiplies two reals, staying exact when the products fit in an `i64`
pub fn mul(a: Real, b: Real) -> Real {
    if let (Real::Exact(an, ad), Real::Exact(bn, bd)) = (a, b) {
        if let Some(r) = (|| {
            let s1 = an.checked_mul(bn)?;
            let s2 = ad.checked_mul(bd)?;
            Some(Real::frac(s1, s2))
        })() {
            return r;
        }
    }
    Real::Approx(a.to_f64() * b.to_f64())
}

/// Divides two reals
///
/// Division by an exact zero is the caller's problem (see the `÷` operator
/// rule, which raises a domain error); here it degrades to the IEEE
/// quotient.
pub fn div(a: Real, b: Real) -> Real {
    if let (Real::Exact(an, ad), Real::Exact(bn, bd)) = (a, b) {
        if bn != 0 {
            if let Some(r) = (|| {
                let s1 = an.checked_mul(bd)?;
                let s2 = ad.checked_mul(bn)?;
                Some(Real::frac(s1, s2))
            })() {
                return r;
            }
        }
    }
    Real::Approx(a.to_f64() / b.to_f64())
}

/// Raises `a` to the power `b`, staying exact for small integer exponents
pub fn pow(a: Real, b: Real) -> Real {
    if let (Real::Exact(..), Some(e)) = (a, b.as_int()) {
        if e.unsigned_abs() <= 32 {
            let mut out = Real::ONE;
            for _ in 0..e.unsigned_abs() {
                out = mul(out, a);
                if !out.is_exact() {
                    break;
                }
            }
            if out.is_exact() {
                return if e < 0 { div(Real::ONE, out) } else { out };
            }
        }
    }
    Real::Approx(a.to_f64().powf(b.to_f64()))
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            // Cross-multiplication in i128 never overflows for i64 inputs
            (Real::Exact(an, ad), Real::Exact(bn, bd)) => {
                an as i128 * bd as i128 == bn as i128 * ad as i128
            }
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (*self, *other) {
            (Real::Exact(an, ad), Real::Exact(bn, bd)) => {
                (an as i128 * bd as i128).partial_cmp(&(bn as i128 * ad as i128))
            }
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}
