//! Geometric constructors and gliders
//!
//! A glider pins a point to a parent object by a single parameter in
//! `[0, 1]`: linear interpolation along a segment, or a full
//! counterclockwise turn from due east around a circle.  Segment gliding is
//! exact on the host; circle gliding is trigonometric and therefore
//! approximate.

use crate::glsl::GlslValue;
use crate::registry::{Entry, Registry};
use crate::types::{real, Real, TypeName, Val, Value};

use super::{circle_arg, point_arg, real_arg, segment_arg};
use TypeName::{Circle, Point as PointTy, Segment, R32};

/// Exact interpolation `a + (b - a) t`
fn lerp(a: Real, b: Real, t: Real) -> Real {
    real::add(a, real::mul(real::sub(b, a), t))
}

fn segment_entry() -> Entry {
    Entry::exact(
        &[PointTy, PointTy],
        Segment,
        Box::new(|args| {
            Ok(Value::Scalar(
                Segment,
                Val::Segment(point_arg(args, 0)?, point_arg(args, 1)?),
            ))
        }),
        Box::new(|_, args| {
            Ok(format!("vec4({}, {})", args[0].expr, args[1].expr))
        }),
    )
}

fn point2(f: fn(Real, Real) -> Real) -> crate::registry::InterpretFn {
    Box::new(move |args| {
        let a = point_arg(args, 0)?;
        let b = point_arg(args, 1)?;
        Ok(Value::point(f(a.x, b.x), f(a.y, b.y)))
    })
}

pub(super) fn register(reg: &mut Registry) {
    // Componentwise point arithmetic
    reg.insert(
        "+",
        Entry::exact(
            &[PointTy, PointTy],
            PointTy,
            point2(real::add),
            Box::new(|_, args| {
                Ok(format!("({} + {})", args[0].expr, args[1].expr))
            }),
        ),
    );
    reg.insert(
        "-",
        Entry::exact(
            &[PointTy, PointTy],
            PointTy,
            point2(real::sub),
            Box::new(|_, args| {
                Ok(format!("({} - {})", args[0].expr, args[1].expr))
            }),
        ),
    );
    reg.insert(
        "abs",
        Entry::exact(
            &[PointTy],
            R32,
            Box::new(|args| {
                let p = point_arg(args, 0)?;
                let d = p.x.to_f64().hypot(p.y.to_f64());
                Ok(Value::Scalar(R32, Val::Real(Real::approx(d))))
            }),
            Box::new(|_, args| Ok(format!("length({})", args[0].expr))),
        ),
    );

    reg.insert(
        "point",
        Entry::exact(
            &[R32, R32],
            PointTy,
            Box::new(|args| {
                Ok(Value::point(real_arg(args, 0)?, real_arg(args, 1)?))
            }),
            Box::new(|_, args| {
                Ok(format!("vec2({}, {})", args[0].expr, args[1].expr))
            }),
        ),
    );

    reg.insert("segment", segment_entry());
    reg.insert("line", segment_entry());

    reg.insert(
        "circle",
        Entry::exact(
            &[PointTy, R32],
            Circle,
            Box::new(|args| {
                Ok(Value::Scalar(
                    Circle,
                    Val::Circle(point_arg(args, 0)?, real_arg(args, 1)?),
                ))
            }),
            Box::new(|_, args| {
                Ok(format!("vec3({}, {})", args[0].expr, args[1].expr))
            }),
        ),
    );

    reg.insert(
        "glider",
        Entry::exact(
            &[Segment, R32],
            PointTy,
            Box::new(|args| {
                let (a, b) = segment_arg(args, 0)?;
                let t = real_arg(args, 1)?;
                Ok(Value::point(lerp(a.x, b.x, t), lerp(a.y, b.y, t)))
            }),
            Box::new(|ctx, args| {
                let s = ctx.cache(&args[0])?;
                Ok(format!("mix({s}.xy, {s}.zw, {})", args[1].expr))
            }),
        )
        .with_example("glider(line((2,3),(7,9)), 0.3) = (3.5, 4.8)"),
    );
    reg.insert(
        "glider",
        Entry::exact(
            &[Circle, R32],
            PointTy,
            Box::new(|args| {
                let (c, r) = circle_arg(args, 0)?;
                let theta = real_arg(args, 1)?.to_f64() * std::f64::consts::TAU;
                Ok(Value::point(
                    real::add(c.x, real::mul(r, Real::approx(theta.cos()))),
                    real::add(c.y, real::mul(r, Real::approx(theta.sin()))),
                ))
            }),
            Box::new(|ctx, args| {
                let c = ctx.cache(&args[0])?;
                let tau = crate::glsl::float(std::f64::consts::TAU as f32);
                let angle = ctx.cache(&GlslValue::scalar(
                    R32,
                    format!("({} * {tau})", args[1].expr),
                ))?;
                Ok(format!(
                    "({c}.xy + {c}.z * vec2(cos({angle}), sin({angle})))"
                ))
            }),
        ),
    );

    reg.insert(
        "distance",
        Entry::exact(
            &[PointTy, PointTy],
            R32,
            Box::new(|args| {
                let a = point_arg(args, 0)?;
                let b = point_arg(args, 1)?;
                let dx = real::sub(a.x, b.x).to_f64();
                let dy = real::sub(a.y, b.y).to_f64();
                Ok(Value::Scalar(
                    R32,
                    Val::Real(Real::approx(dx.hypot(dy))),
                ))
            }),
            Box::new(|_, args| {
                Ok(format!("distance({}, {})", args[0].expr, args[1].expr))
            }),
        ),
    );

    reg.insert(
        "midpoint",
        Entry::exact(
            &[Segment],
            PointTy,
            Box::new(|args| {
                let (a, b) = segment_arg(args, 0)?;
                let half = Real::frac(1, 2);
                Ok(Value::point(
                    lerp(a.x, b.x, half),
                    lerp(a.y, b.y, half),
                ))
            }),
            Box::new(|ctx, args| {
                let s = ctx.cache(&args[0])?;
                Ok(format!("mix({s}.xy, {s}.zw, 0.5)"))
            }),
        ),
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::Registry;
    use approx::assert_relative_eq;

    fn point(x: Real, y: Real) -> Value {
        Value::point(x, y)
    }

    #[test]
    fn segment_glide_is_exact() {
        let reg = Registry::with_defaults();
        let seg = reg
            .call(
                "line",
                &[
                    point(Real::int(2), Real::int(3)),
                    point(Real::int(7), Real::int(9)),
                ],
            )
            .unwrap();
        let out = reg
            .call("glider", &[seg, Value::real(Real::frac(3, 10))])
            .unwrap();
        assert_eq!(out, point(Real::frac(7, 2), Real::frac(24, 5)));
        assert!(!out.is_approx());
    }

    #[test]
    fn circle_glide() {
        let reg = Registry::with_defaults();
        let radius = 61f64.sqrt();
        let circle = reg
            .call(
                "circle",
                &[
                    point(Real::int(2), Real::int(3)),
                    Value::real(Real::approx(radius)),
                ],
            )
            .unwrap();
        let out = reg
            .call("glider", &[circle, Value::real(Real::frac(3, 10))])
            .unwrap();
        assert!(out.is_approx());
        let Value::Scalar(_, Val::Point(p)) = out else {
            panic!("wrong shape: {out:?}");
        };
        assert_relative_eq!(p.x.to_f64(), -0.41356, epsilon = 1e-4);
        assert_relative_eq!(p.y.to_f64(), 10.42797, epsilon = 1e-4);
    }

    #[test]
    fn point_arithmetic_is_componentwise() {
        let reg = Registry::with_defaults();
        let out = reg
            .call(
                "+",
                &[
                    point(Real::int(1), Real::frac(1, 2)),
                    point(Real::int(2), Real::frac(1, 2)),
                ],
            )
            .unwrap();
        assert_eq!(out, point(Real::int(3), Real::int(1)));
        assert!(!out.is_approx());
    }

    #[test]
    fn midpoint_stays_exact() {
        let reg = Registry::with_defaults();
        let seg = reg
            .call(
                "segment",
                &[
                    point(Real::int(1), Real::int(0)),
                    point(Real::int(2), Real::int(5)),
                ],
            )
            .unwrap();
        let out = reg.call("midpoint", &[seg]).unwrap();
        assert_eq!(out, point(Real::frac(3, 2), Real::frac(5, 2)));
    }
}
