//! Trigonometric and exponential functions
//!
//! These are transcendental, so every result is approximate on the host and
//! single-precision in the shader; r64 arguments resolve onto the r32
//! entries through the lattice.  The complex entries build on a small set of
//! shader helpers, declared in dependency order so that e.g. requesting
//! `tan` pulls in `sin`, `cos`, and complex division exactly once.

use crate::glsl::GlslContext;
use crate::registry::{Entry, InterpretFn, Registry};
use crate::types::{Point, Real, TypeName, Val, Value};

use super::{complex_arg, real_arg};
use TypeName::{C32, R32};

const CSIN: &str = "\
vec2 _helper_sin_c32(vec2 z) {
  return vec2(sin(z.x) * cosh(z.y), cos(z.x) * sinh(z.y));
}
";

const CCOS: &str = "\
vec2 _helper_cos_c32(vec2 z) {
  return vec2(cos(z.x) * cosh(z.y), -sin(z.x) * sinh(z.y));
}
";

const CDIV: &str = "\
vec2 _helper_cdiv_c32(vec2 a, vec2 b) {
  float d = dot(b, b);
  return vec2(dot(a, b), a.y * b.x - a.x * b.y) / d;
}
";

const CTAN: &str = "\
vec2 _helper_tan_c32(vec2 z) {
  return _helper_cdiv_c32(_helper_sin_c32(z), _helper_cos_c32(z));
}
";

const CEXP: &str = "\
vec2 _helper_exp_c32(vec2 z) {
  return exp(z.x) * vec2(cos(z.y), sin(z.y));
}
";

const CLN: &str = "\
vec2 _helper_ln_c32(vec2 z) {
  return vec2(log(length(z)), atan(z.y, z.x));
}
";

fn real1(f: fn(f64) -> f64) -> InterpretFn {
    Box::new(move |args| {
        let a = real_arg(args, 0)?;
        Ok(Value::Scalar(R32, Val::Real(Real::approx(f(a.to_f64())))))
    })
}

fn complex1(f: fn(f64, f64) -> (f64, f64)) -> InterpretFn {
    Box::new(move |args| {
        let z = complex_arg(args, 0)?;
        let (re, im) = f(z.x.to_f64(), z.y.to_f64());
        Ok(Value::Scalar(
            C32,
            Val::Complex(Point::new(Real::approx(re), Real::approx(im))),
        ))
    })
}

fn declare_ctan(ctx: &mut GlslContext) {
    ctx.declare("sin_c32", || CSIN.to_string());
    ctx.declare("cos_c32", || CCOS.to_string());
    ctx.declare("cdiv_c32", || CDIV.to_string());
    ctx.declare("tan_c32", || CTAN.to_string());
}

pub(super) fn register(reg: &mut Registry) {
    let fns: [(
        &str,
        fn(f64) -> f64,
        fn(f64, f64) -> (f64, f64),
        fn(&mut GlslContext) -> &'static str,
    ); 5] = [
        ("sin", f64::sin, |x, y| {
            (x.sin() * y.cosh(), x.cos() * y.sinh())
        }, |ctx| {
            ctx.declare("sin_c32", || CSIN.to_string());
            "_helper_sin_c32"
        }),
        ("cos", f64::cos, |x, y| {
            (x.cos() * y.cosh(), -x.sin() * y.sinh())
        }, |ctx| {
            ctx.declare("cos_c32", || CCOS.to_string());
            "_helper_cos_c32"
        }),
        ("tan", f64::tan, |x, y| {
            let (sr, si) = (x.sin() * y.cosh(), x.cos() * y.sinh());
            let (cr, ci) = (x.cos() * y.cosh(), -x.sin() * y.sinh());
            let d = cr * cr + ci * ci;
            ((sr * cr + si * ci) / d, (si * cr - sr * ci) / d)
        }, |ctx| {
            declare_ctan(ctx);
            "_helper_tan_c32"
        }),
        ("exp", f64::exp, |x, y| {
            (x.exp() * y.cos(), x.exp() * y.sin())
        }, |ctx| {
            ctx.declare("exp_c32", || CEXP.to_string());
            "_helper_exp_c32"
        }),
        ("ln", f64::ln, |x, y| {
            (x.hypot(y).ln(), y.atan2(x))
        }, |ctx| {
            ctx.declare("ln_c32", || CLN.to_string());
            "_helper_ln_c32"
        }),
    ];

    for (name, real_f, complex_f, declare) in fns {
        let glsl_name = match name {
            "ln" => "log",
            n => n,
        };
        reg.insert(
            name,
            Entry::exact(
                &[R32],
                R32,
                real1(real_f),
                Box::new(move |_, args| {
                    Ok(format!("{glsl_name}({})", args[0].expr))
                }),
            ),
        );
        reg.insert(
            name,
            Entry::exact(
                &[C32],
                C32,
                complex1(complex_f),
                Box::new(move |ctx, args| {
                    let helper = declare(ctx);
                    Ok(format!("{helper}({})", args[0].expr))
                }),
            ),
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::glsl::GlslValue;
    use crate::registry::Registry;
    use approx::assert_relative_eq;

    #[test]
    fn real_trig_goes_approximate() {
        let reg = Registry::with_defaults();
        let out = reg
            .call("sin", &[Value::real(Real::frac(1, 2))])
            .unwrap();
        assert!(out.is_approx());
        let Value::Scalar(_, Val::Real(r)) = out else {
            panic!();
        };
        assert_relative_eq!(r.to_f64(), 0.5f64.sin());
    }

    #[test]
    fn complex_sin_matches_the_analytic_extension() {
        let reg = Registry::with_defaults();
        let z = Value::Scalar(
            TypeName::C64,
            Val::Complex(Point::new(Real::int(1), Real::int(2))),
        );
        let out = reg.call("sin", &[z]).unwrap();
        let Value::Scalar(C32, Val::Complex(p)) = out else {
            panic!("wrong shape: {out:?}");
        };
        assert_relative_eq!(p.x.to_f64(), 1f64.sin() * 2f64.cosh());
        assert_relative_eq!(p.y.to_f64(), 1f64.cos() * 2f64.sinh());
    }

    #[test]
    fn tan_declares_its_dependencies_once() {
        let reg = Registry::with_defaults();
        let mut ctx = GlslContext::new();
        let z = GlslValue::scalar(C32, "z");
        reg.call_glsl("tan", &mut ctx, &[z.clone()]).unwrap();
        reg.call_glsl("tan", &mut ctx, &[z]).unwrap();
        for id in ["sin_c32", "cos_c32", "cdiv_c32", "tan_c32"] {
            assert!(ctx.is_declared(id), "missing {id}");
        }
        let out = ctx.finish(&GlslValue::scalar(C32, "z"));
        assert_eq!(out.declarations.matches("vec2 _helper_tan_c32").count(), 1);
        assert_eq!(out.declarations.matches("vec2 _helper_sin_c32").count(), 1);
    }
}
