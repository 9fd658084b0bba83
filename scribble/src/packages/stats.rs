//! Variadic statistics over real arguments
//!
//! Sums, means, and extrema fold exactly through the rational kernels and
//! have straightforward compensated shader renderings.  Selection (median)
//! sorts an owned copy of the arguments, never the caller's data, and is
//! host-only.

use crate::glsl::{r64, GlslContext, GlslValue};
use crate::registry::{Entry, Registry};
use crate::types::{real, Real, TypeName, Value};
use crate::{Backend, Error};

use ordered_float::OrderedFloat;

use super::real_arg;
use TypeName::R64;

fn reals(args: &[Value]) -> Result<Vec<Real>, Error> {
    (0..args.len()).map(|i| real_arg(args, i)).collect()
}

fn total(vs: &[Real]) -> Real {
    vs.iter().fold(Real::ZERO, |acc, &v| real::add(acc, v))
}

fn emit_total(ctx: &mut GlslContext, args: &[GlslValue]) -> String {
    let mut acc = args[0].expr.clone();
    for a in &args[1..] {
        acc = r64::add(ctx, &acc, &a.expr);
    }
    acc
}

/// Folds a pairwise selection, keeping whichever operand wins the three-way
/// compare
fn emit_select(
    ctx: &mut GlslContext,
    args: &[GlslValue],
    op: &str,
) -> Result<String, Error> {
    let mut acc = ctx.cache(&args[0])?;
    for a in &args[1..] {
        let b = ctx.cache(a)?;
        let c = r64::cmp(ctx, &b, &acc);
        acc = ctx.cache(&GlslValue::scalar(
            R64,
            format!("({c} {op} 0.0 ? {b} : {acc})"),
        ))?;
    }
    Ok(acc)
}

pub(super) fn register(reg: &mut Registry) {
    reg.insert(
        "total",
        Entry::variadic(
            1,
            R64,
            R64,
            Box::new(|args| Ok(Value::real(total(&reals(args)?)))),
            Box::new(|ctx, args| Ok(emit_total(ctx, args))),
        ),
    );

    reg.insert(
        "mean",
        Entry::variadic(
            1,
            R64,
            R64,
            Box::new(|args| {
                let vs = reals(args)?;
                let n = Real::int(vs.len() as i64);
                Ok(Value::real(real::div(total(&vs), n)))
            }),
            Box::new(|ctx, args| {
                let sum = emit_total(ctx, args);
                let n = format!("vec2({}.0, 0.0)", args.len());
                Ok(r64::div(ctx, &sum, &n))
            }),
        )
        .with_example("mean(1, 2, 4) = 7/3"),
    );

    reg.insert(
        "min",
        Entry::variadic(
            1,
            R64,
            R64,
            Box::new(|args| {
                let vs = reals(args)?;
                let out = vs[1..].iter().fold(vs[0], |acc, &v| {
                    if v < acc {
                        v
                    } else {
                        acc
                    }
                });
                Ok(Value::real(out))
            }),
            Box::new(|ctx, args| emit_select(ctx, args, "<")),
        ),
    );
    reg.insert(
        "max",
        Entry::variadic(
            1,
            R64,
            R64,
            Box::new(|args| {
                let vs = reals(args)?;
                let out = vs[1..].iter().fold(vs[0], |acc, &v| {
                    if v > acc {
                        v
                    } else {
                        acc
                    }
                });
                Ok(Value::real(out))
            }),
            Box::new(|ctx, args| emit_select(ctx, args, ">")),
        ),
    );

    reg.insert(
        "median",
        Entry::variadic(
            1,
            R64,
            R64,
            Box::new(|args| {
                let mut vs = reals(args)?;
                vs.sort_by_key(|v| OrderedFloat(v.to_f64()));
                let n = vs.len();
                let out = if n % 2 == 1 {
                    vs[n / 2]
                } else {
                    real::div(
                        real::add(vs[n / 2 - 1], vs[n / 2]),
                        Real::int(2),
                    )
                };
                Ok(Value::real(out))
            }),
            Box::new(|_, _| {
                Err(Error::unsupported("median", Backend::Shader))
            }),
        ),
    );
}
