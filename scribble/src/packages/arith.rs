//! Arithmetic, comparison, and logical operators
//!
//! Every numeric operator is registered for the 64-bit flavor first, so
//! exact and compensated arithmetic is preferred wherever the arguments
//! allow, with 32-bit and complex entries behind it in resolution order.

use crate::glsl::{r64, GlslContext, GlslValue};
use crate::registry::{Entry, InterpretFn, Registry};
use crate::types::{real, Point, Real, TypeName, Value};
use crate::Error;

use super::{bool_arg, complex_arg, real_arg};
use TypeName::{Bool, C32, C64, R32, R64};

const CMUL_C32: &str = "\
vec2 _helper_cmul_c32(vec2 a, vec2 b) {
  return vec2(a.x * b.x - a.y * b.y, a.x * b.y + a.y * b.x);
}
";

const CDIV_C32: &str = "\
vec2 _helper_cdiv_c32(vec2 a, vec2 b) {
  float d = dot(b, b);
  return vec2(dot(a, b), a.y * b.x - a.x * b.y) / d;
}
";

fn real2(f: fn(Real, Real) -> Real) -> InterpretFn {
    Box::new(move |args| {
        Ok(Value::real(f(real_arg(args, 0)?, real_arg(args, 1)?)))
    })
}

fn complex2(ret: TypeName, f: fn(Point, Point) -> Point) -> InterpretFn {
    Box::new(move |args| {
        let p = f(complex_arg(args, 0)?, complex_arg(args, 1)?);
        Ok(Value::Scalar(ret, crate::types::Val::Complex(p)))
    })
}

fn cadd(a: Point, b: Point) -> Point {
    Point::new(real::add(a.x, b.x), real::add(a.y, b.y))
}

fn csub(a: Point, b: Point) -> Point {
    Point::new(real::sub(a.x, b.x), real::sub(a.y, b.y))
}

fn cmul(a: Point, b: Point) -> Point {
    Point::new(
        real::sub(real::mul(a.x, b.x), real::mul(a.y, b.y)),
        real::add(real::mul(a.x, b.y), real::mul(a.y, b.x)),
    )
}

fn cdiv(a: Point, b: Point) -> Result<Point, Error> {
    let d = real::add(real::mul(b.x, b.x), real::mul(b.y, b.y));
    if d.is_exact_zero() {
        return Err(Error::Domain("division by zero".to_string()));
    }
    Ok(Point::new(
        real::div(real::add(real::mul(a.x, b.x), real::mul(a.y, b.y)), d),
        real::div(real::sub(real::mul(a.y, b.x), real::mul(a.x, b.y)), d),
    ))
}

fn cached2(
    ctx: &mut GlslContext,
    args: &[GlslValue],
) -> Result<(String, String), Error> {
    Ok((ctx.cache(&args[0])?, ctx.cache(&args[1])?))
}

/// Composes a componentwise c64 operation from an r64 emitter
fn c64_componentwise(
    ctx: &mut GlslContext,
    args: &[GlslValue],
    f: fn(&mut GlslContext, &str, &str) -> String,
) -> Result<String, Error> {
    let (a, b) = cached2(ctx, args)?;
    let re = f(ctx, &format!("{a}.xy"), &format!("{b}.xy"));
    let im = f(ctx, &format!("{a}.zw"), &format!("{b}.zw"));
    Ok(format!("vec4({re}, {im})"))
}

pub(super) fn register(reg: &mut Registry) {
    // Addition
    reg.insert(
        "+",
        Entry::exact(
            &[R64, R64],
            R64,
            real2(real::add),
            Box::new(|ctx, args| {
                Ok(r64::add(ctx, &args[0].expr, &args[1].expr))
            }),
        )
        .with_example("1/3 + 1/6 = 1/2"),
    );
    reg.insert(
        "+",
        Entry::exact(
            &[R32, R32],
            R32,
            real2(real::add),
            Box::new(|_, args| Ok(format!("({} + {})", args[0].expr, args[1].expr))),
        ),
    );
    reg.insert(
        "+",
        Entry::exact(
            &[C64, C64],
            C64,
            complex2(C64, cadd),
            Box::new(|ctx, args| c64_componentwise(ctx, args, r64::add)),
        ),
    );
    reg.insert(
        "+",
        Entry::exact(
            &[C32, C32],
            C32,
            complex2(C32, cadd),
            Box::new(|_, args| Ok(format!("({} + {})", args[0].expr, args[1].expr))),
        ),
    );

    // Subtraction, sharing the unary name
    reg.insert(
        "-",
        Entry::exact(
            &[R64, R64],
            R64,
            real2(real::sub),
            Box::new(|ctx, args| {
                Ok(r64::sub(ctx, &args[0].expr, &args[1].expr))
            }),
        ),
    );
    reg.insert(
        "-",
        Entry::exact(
            &[R32, R32],
            R32,
            real2(real::sub),
            Box::new(|_, args| Ok(format!("({} - {})", args[0].expr, args[1].expr))),
        ),
    );
    reg.insert(
        "-",
        Entry::exact(
            &[C64, C64],
            C64,
            complex2(C64, csub),
            Box::new(|ctx, args| c64_componentwise(ctx, args, r64::sub)),
        ),
    );
    reg.insert(
        "-",
        Entry::exact(
            &[C32, C32],
            C32,
            complex2(C32, csub),
            Box::new(|_, args| Ok(format!("({} - {})", args[0].expr, args[1].expr))),
        ),
    );

    // Unary negation; exact in every representation
    reg.insert(
        "-",
        Entry::exact(
            &[R64],
            R64,
            Box::new(|args| Ok(Value::real(real_arg(args, 0)?.neg()))),
            Box::new(|_, args| Ok(format!("(-{})", args[0].expr))),
        ),
    );
    reg.insert(
        "-",
        Entry::exact(
            &[C64],
            C64,
            Box::new(|args| {
                let p = complex_arg(args, 0)?;
                Ok(Value::Scalar(
                    C64,
                    crate::types::Val::Complex(Point::new(
                        p.x.neg(),
                        p.y.neg(),
                    )),
                ))
            }),
            Box::new(|_, args| Ok(format!("(-{})", args[0].expr))),
        ),
    );

    // Multiplication
    reg.insert(
        "·",
        Entry::exact(
            &[R64, R64],
            R64,
            real2(real::mul),
            Box::new(|ctx, args| {
                Ok(r64::mul(ctx, &args[0].expr, &args[1].expr))
            }),
        ),
    );
    reg.insert(
        "·",
        Entry::exact(
            &[R32, R32],
            R32,
            real2(real::mul),
            Box::new(|_, args| Ok(format!("({} * {})", args[0].expr, args[1].expr))),
        ),
    );
    reg.insert(
        "·",
        Entry::exact(
            &[C64, C64],
            C64,
            complex2(C64, cmul),
            Box::new(|ctx, args| {
                let (a, b) = cached2(ctx, args)?;
                let (are, aim) = (format!("{a}.xy"), format!("{a}.zw"));
                let (bre, bim) = (format!("{b}.xy"), format!("{b}.zw"));
                let rr = r64::mul(ctx, &are, &bre);
                let ii = r64::mul(ctx, &aim, &bim);
                let ri = r64::mul(ctx, &are, &bim);
                let ir = r64::mul(ctx, &aim, &bre);
                let re = r64::sub(ctx, &rr, &ii);
                let im = r64::add(ctx, &ri, &ir);
                Ok(format!("vec4({re}, {im})"))
            }),
        )
        .with_example("(2 + i)(3 + i) = 5 + 5i"),
    );
    reg.insert(
        "·",
        Entry::exact(
            &[C32, C32],
            C32,
            complex2(C32, cmul),
            Box::new(|ctx, args| {
                ctx.declare("cmul_c32", || CMUL_C32.to_string());
                Ok(format!(
                    "_helper_cmul_c32({}, {})",
                    args[0].expr, args[1].expr
                ))
            }),
        ),
    );

    // Division; an exactly-zero divisor is a domain error rather than an
    // IEEE infinity
    reg.insert(
        "÷",
        Entry::exact(
            &[R64, R64],
            R64,
            Box::new(|args| {
                let b = real_arg(args, 1)?;
                if b.is_exact_zero() {
                    return Err(Error::Domain("division by zero".to_string()));
                }
                Ok(Value::real(real::div(real_arg(args, 0)?, b)))
            }),
            Box::new(|ctx, args| {
                Ok(r64::div(ctx, &args[0].expr, &args[1].expr))
            }),
        ),
    );
    reg.insert(
        "÷",
        Entry::exact(
            &[R32, R32],
            R32,
            real2(real::div),
            Box::new(|_, args| Ok(format!("({} / {})", args[0].expr, args[1].expr))),
        ),
    );
    reg.insert(
        "÷",
        Entry::exact(
            &[C64, C64],
            C64,
            Box::new(|args| {
                let p = cdiv(complex_arg(args, 0)?, complex_arg(args, 1)?)?;
                Ok(Value::Scalar(C64, crate::types::Val::Complex(p)))
            }),
            Box::new(|ctx, args| {
                let (a, b) = cached2(ctx, args)?;
                let (are, aim) = (format!("{a}.xy"), format!("{a}.zw"));
                let (bre, bim) = (format!("{b}.xy"), format!("{b}.zw"));
                let bb = {
                    let rr = r64::mul(ctx, &bre, &bre);
                    let ii = r64::mul(ctx, &bim, &bim);
                    r64::add(ctx, &rr, &ii)
                };
                let d = ctx.cache(&GlslValue::scalar(R64, bb))?;
                let re = {
                    let rr = r64::mul(ctx, &are, &bre);
                    let ii = r64::mul(ctx, &aim, &bim);
                    let num = r64::add(ctx, &rr, &ii);
                    r64::div(ctx, &num, &d)
                };
                let im = {
                    let ir = r64::mul(ctx, &aim, &bre);
                    let ri = r64::mul(ctx, &are, &bim);
                    let num = r64::sub(ctx, &ir, &ri);
                    r64::div(ctx, &num, &d)
                };
                Ok(format!("vec4({re}, {im})"))
            }),
        ),
    );
    reg.insert(
        "÷",
        Entry::exact(
            &[C32, C32],
            C32,
            Box::new(|args| {
                let p = cdiv(complex_arg(args, 0)?, complex_arg(args, 1)?)?;
                Ok(Value::Scalar(C32, crate::types::Val::Complex(p)))
            }),
            Box::new(|ctx, args| {
                ctx.declare("cdiv_c32", || CDIV_C32.to_string());
                Ok(format!(
                    "_helper_cdiv_c32({}, {})",
                    args[0].expr, args[1].expr
                ))
            }),
        ),
    );

    // Exponentiation.  There is no compensated pow; the shader rendering
    // collapses to single precision.
    reg.insert(
        "^",
        Entry::exact(
            &[R64, R64],
            R64,
            real2(real::pow),
            Box::new(|ctx, args| {
                let (a, b) = cached2(ctx, args)?;
                Ok(format!(
                    "vec2(pow({a}.x + {a}.y, {b}.x + {b}.y), 0.0)"
                ))
            }),
        )
        .with_example("2^10 = 1024"),
    );
    reg.insert(
        "^",
        Entry::exact(
            &[R32, R32],
            R32,
            real2(real::pow),
            Box::new(|_, args| {
                Ok(format!("pow({}, {})", args[0].expr, args[1].expr))
            }),
        ),
    );

    comparisons(reg);

    // Logical connectives
    reg.insert(
        "and",
        Entry::exact(
            &[Bool, Bool],
            Bool,
            Box::new(|args| Ok(Value::bool(bool_arg(args, 0)? && bool_arg(args, 1)?))),
            Box::new(|_, args| Ok(format!("({} && {})", args[0].expr, args[1].expr))),
        ),
    );
    reg.insert(
        "or",
        Entry::exact(
            &[Bool, Bool],
            Bool,
            Box::new(|args| Ok(Value::bool(bool_arg(args, 0)? || bool_arg(args, 1)?))),
            Box::new(|_, args| Ok(format!("({} || {})", args[0].expr, args[1].expr))),
        ),
    );

    // Absolute value / magnitude
    reg.insert(
        "abs",
        Entry::exact(
            &[R64],
            R64,
            Box::new(|args| Ok(Value::real(real_arg(args, 0)?.abs()))),
            Box::new(|ctx, args| Ok(r64::abs(ctx, &args[0].expr))),
        ),
    );
    reg.insert(
        "abs",
        Entry::exact(
            &[C32],
            R32,
            Box::new(|args| {
                let p = complex_arg(args, 0)?;
                let sq = real::add(
                    real::mul(p.x, p.x),
                    real::mul(p.y, p.y),
                );
                Ok(Value::Scalar(
                    R32,
                    crate::types::Val::Real(Real::approx(sq.to_f64().sqrt())),
                ))
            }),
            Box::new(|_, args| Ok(format!("length({})", args[0].expr))),
        ),
    );
}

fn comparisons(reg: &mut Registry) {
    use std::cmp::Ordering;

    // NaN (the garbage sentinel) compares false under every operator, `≠`
    // included; garbage never satisfies a condition
    let ops: [(&str, fn(Option<Ordering>) -> bool); 6] = [
        ("<", |o| o == Some(Ordering::Less)),
        ("≤", |o| matches!(o, Some(Ordering::Less | Ordering::Equal))),
        (">", |o| o == Some(Ordering::Greater)),
        ("≥", |o| matches!(o, Some(Ordering::Greater | Ordering::Equal))),
        ("=", |o| o == Some(Ordering::Equal)),
        ("≠", |o| matches!(o, Some(Ordering::Less | Ordering::Greater))),
    ];
    let glsl_ops = ["<", "<=", ">", ">=", "==", "!="];

    for ((name, test), glsl_op) in ops.into_iter().zip(glsl_ops) {
        reg.insert(
            name,
            Entry::exact(
                &[R64, R64],
                Bool,
                Box::new(move |args| {
                    let a = real_arg(args, 0)?;
                    let b = real_arg(args, 1)?;
                    Ok(Value::bool(test(a.partial_cmp(&b))))
                }),
                Box::new(move |ctx, args| {
                    let c = r64::cmp(ctx, &args[0].expr, &args[1].expr);
                    Ok(format!("({c} {glsl_op} 0.0)"))
                }),
            ),
        );
        reg.insert(
            name,
            Entry::exact(
                &[R32, R32],
                Bool,
                Box::new(move |args| {
                    let a = real_arg(args, 0)?;
                    let b = real_arg(args, 1)?;
                    Ok(Value::bool(test(a.partial_cmp(&b))))
                }),
                Box::new(move |_, args| {
                    Ok(format!(
                        "({} {glsl_op} {})",
                        args[0].expr, args[1].expr
                    ))
                }),
            ),
        );
    }
}
