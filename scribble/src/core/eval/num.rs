//! Numeric-literal parsing in an arbitrary base

use crate::types::Real;
use crate::Error;

/// Extracts a numeric base from a value produced by a `base` node
///
/// Bases must be exact integers in `2..=36`.
pub fn as_base(r: &Real) -> Result<i64, Error> {
    match r.as_int() {
        Some(b) if (2..=36).contains(&b) => Ok(b),
        _ => Err(Error::Domain(format!(
            "{} is not a valid numeric base",
            r.to_f64()
        ))),
    }
}

/// Parses a digit string (with an optional fractional part) in the given
/// base, staying exact while checked arithmetic allows
pub fn parse_real(s: &str, base: i64) -> Result<Real, Error> {
    let radix = base as u32;
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return Err(Error::BadNumeral(s.to_string()));
    }

    let digit = |c: char| -> Result<i64, Error> {
        c.to_digit(radix)
            .map(i64::from)
            .ok_or_else(|| Error::BadNumeral(s.to_string()))
    };

    // Exact path; bail to floating point on the first overflow
    let exact = (|| -> Result<Option<Real>, Error> {
        let mut num: i64 = 0;
        for c in int_part.chars() {
            let d = digit(c)?;
            num = match num.checked_mul(base).and_then(|n| n.checked_add(d)) {
                Some(n) => n,
                None => return Ok(None),
            };
        }
        let mut den: i64 = 1;
        if let Some(frac) = frac_part {
            for c in frac.chars() {
                let d = digit(c)?;
                let step = den
                    .checked_mul(base)
                    .and_then(|den| num.checked_mul(base).map(|n| (n, den)))
                    .and_then(|(n, den)| n.checked_add(d).map(|n| (n, den)));
                match step {
                    Some((n, d2)) => {
                        num = n;
                        den = d2;
                    }
                    None => return Ok(None),
                }
            }
        }
        Ok(Some(Real::frac(num, den)))
    })()?;
    if let Some(r) = exact {
        return Ok(r);
    }

    // Approximate fallback
    let mut v = 0.0f64;
    for c in int_part.chars() {
        v = v * base as f64 + digit(c)? as f64;
    }
    if let Some(frac) = frac_part {
        let mut scale = 1.0f64;
        for c in frac.chars() {
            scale /= base as f64;
            v += digit(c)? as f64 * scale;
        }
    }
    Ok(Real::approx(v))
}

/// Convenience wrapper used by both walkers: parse in the base carried by a
/// `Real` (the props default of exactly 10, or a `base` override)
pub fn parse_in(s: &str, base: &Real) -> Result<Real, Error> {
    parse_real(s, as_base(base)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_literals_are_exact() {
        assert_eq!(parse_real("42", 10).unwrap(), Real::int(42));
        let half = parse_real("0.5", 10).unwrap();
        assert!(half.is_exact());
        assert_eq!(half, Real::frac(1, 2));
        assert_eq!(parse_real("3.25", 10).unwrap(), Real::frac(13, 4));
    }

    #[test]
    fn other_bases() {
        assert_eq!(parse_real("ff", 16).unwrap(), Real::int(255));
        assert_eq!(parse_real("101", 2).unwrap(), Real::int(5));
        assert_eq!(parse_real("0.1", 2).unwrap(), Real::frac(1, 2));
        assert_eq!(parse_real("zz", 36).unwrap(), Real::int(36 * 36 - 1));
    }

    #[test]
    fn long_literals_degrade_to_approx() {
        let r = parse_real("123456789012345678901234567890", 10).unwrap();
        assert!(!r.is_exact());
        assert!((r.to_f64() - 1.2345678901234568e29).abs() < 1e15);
    }

    #[test]
    fn bad_numerals() {
        assert!(matches!(parse_real("", 10), Err(Error::BadNumeral(_))));
        assert!(matches!(parse_real(".", 10), Err(Error::BadNumeral(_))));
        assert!(matches!(parse_real("2", 2), Err(Error::BadNumeral(_))));
        assert!(matches!(parse_real("1x", 10), Err(Error::BadNumeral(_))));
    }

    #[test]
    fn base_validation() {
        assert_eq!(as_base(&Real::int(16)).unwrap(), 16);
        assert!(as_base(&Real::int(1)).is_err());
        assert!(as_base(&Real::frac(5, 2)).is_err());
        assert!(as_base(&Real::approx(10.0)).is_err());
    }
}
