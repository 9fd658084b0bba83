//! Builtin operators, functions, and constants
//!
//! Each package contributes its entries to the [`Registry`] through an
//! explicit registration pass; [`register_all`] runs every package once, in
//! a fixed order.  Within one operator name, registration order is
//! resolution order, so packages registering wide signatures early shadow
//! narrower ones registered later (see [`registry`](crate::registry)).

pub mod arith;
pub mod color;
pub mod geo;
pub mod linalg;
pub mod stats;
pub mod trig;

use crate::glsl::{self, GlslValue};
use crate::registry::Registry;
use crate::types::{Double, Mat, Point, Real, TypeName, Val, Value};
use crate::Error;

/// Registers every builtin package and constant
pub fn register_all(reg: &mut Registry) {
    arith::register(reg);
    trig::register(reg);
    geo::register(reg);
    linalg::register(reg);
    stats::register(reg);
    color::register(reg);
    constants(reg);
}

/// An r64 shader literal carrying the double-double rendering of `v`
pub(crate) fn r64_literal(v: f64) -> String {
    let d = Double::from_f64(v);
    format!("vec2({}, {})", glsl::float(d.hi), glsl::float(d.lo))
}

fn constants(reg: &mut Registry) {
    let real = |reg: &mut Registry, name: &str, v: f64| {
        reg.insert_const(
            name,
            Value::real(Real::approx(v)),
            GlslValue::scalar(TypeName::R64, r64_literal(v)),
        );
    };
    real(reg, "π", std::f64::consts::PI);
    real(reg, "τ", std::f64::consts::TAU);
    real(reg, "e", std::f64::consts::E);
    reg.insert_const(
        "i",
        Value::Scalar(
            TypeName::C64,
            Val::Complex(Point::new(Real::ZERO, Real::ONE)),
        ),
        GlslValue::scalar(TypeName::C64, "vec4(0.0, 0.0, 1.0, 0.0)"),
    );
}

// Argument extractors for interpreter rules.  The registry has already
// coerced every argument to the entry's declared parameter type, so a shape
// mismatch here means a mis-registered entry; it surfaces as an error rather
// than a panic.

fn shape(what: &str) -> Error {
    Error::Domain(format!("expected {what} argument"))
}

pub(crate) fn real_arg(args: &[Value], i: usize) -> Result<Real, Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Real(r))) => Ok(*r),
        _ => Err(shape("a number")),
    }
}

pub(crate) fn bool_arg(args: &[Value], i: usize) -> Result<bool, Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Bool(b))) => Ok(*b),
        _ => Err(shape("a condition")),
    }
}

pub(crate) fn complex_arg(args: &[Value], i: usize) -> Result<Point, Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Complex(p))) => Ok(*p),
        _ => Err(shape("a complex number")),
    }
}

pub(crate) fn point_arg(args: &[Value], i: usize) -> Result<Point, Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Point(p))) => Ok(*p),
        _ => Err(shape("a point")),
    }
}

pub(crate) fn segment_arg(
    args: &[Value],
    i: usize,
) -> Result<(Point, Point), Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Segment(a, b))) => Ok((*a, *b)),
        _ => Err(shape("a segment")),
    }
}

pub(crate) fn circle_arg(
    args: &[Value],
    i: usize,
) -> Result<(Point, Real), Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Circle(c, r))) => Ok((*c, *r)),
        _ => Err(shape("a circle")),
    }
}

pub(crate) fn vector_arg<'a>(
    args: &'a [Value],
    i: usize,
) -> Result<&'a [Real], Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Vector(v))) => Ok(v),
        _ => Err(shape("a vector")),
    }
}

pub(crate) fn matrix_arg<'a>(
    args: &'a [Value],
    i: usize,
) -> Result<&'a Mat, Error> {
    match args.get(i) {
        Some(Value::Scalar(_, Val::Matrix(m))) => Ok(m),
        _ => Err(shape("a matrix")),
    }
}
