//! Concrete interpreter values

use super::real::Real;
use super::{Multiplicity, Type, TypeName};
use crate::Error;

/// A pair of reals; used for both points and complex numbers, where `x` is
/// the real part and `y` the imaginary part
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// Horizontal coordinate / real part
    pub x: Real,
    /// Vertical coordinate / imaginary part
    pub y: Real,
}

impl Point {
    /// Builds a pair
    pub fn new(x: Real, y: Real) -> Self {
        Point { x, y }
    }
}

/// A row-major matrix of reals
#[derive(Clone, Debug, PartialEq)]
pub struct Mat {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Elements, row-major; always `rows * cols` long
    pub data: Vec<Real>,
}

impl Mat {
    /// Builds a matrix; panics in debug builds if the data length disagrees
    pub fn new(rows: usize, cols: usize, data: Vec<Real>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Mat { rows, cols, data }
    }
}

/// A single (non-list) payload
///
/// The payload alone does not determine the [`TypeName`]: both real flavors
/// share [`Val::Real`] and both complex flavors share [`Val::Complex`], since
/// on the host they are the same representation and only differ in how the
/// shader backend renders them.
#[derive(Clone, Debug, PartialEq)]
pub enum Val {
    /// A condition
    Bool(bool),
    /// A real (either flavor)
    Real(Real),
    /// A complex number (either flavor)
    Complex(Point),
    /// A point
    Point(Point),
    /// A segment between two points
    Segment(Point, Point),
    /// A circle with center and radius
    Circle(Point, Real),
    /// A column vector
    Vector(Vec<Real>),
    /// A matrix
    Matrix(Mat),
    /// An RGBA color with components in `[0, 1]`
    Color([Real; 4]),
    /// Text
    Text(String),
    /// An opaque image handle owned by the embedding layer
    Image(u32),
}

/// The type-appropriate sentinel ("garbage") value
pub fn garbage(ty: TypeName) -> Val {
    let nan = Real::approx(f64::NAN);
    match ty {
        TypeName::Bool => Val::Bool(false),
        TypeName::R64 | TypeName::R32 => Val::Real(nan),
        TypeName::C64 | TypeName::C32 => Val::Complex(Point::new(nan, nan)),
        TypeName::Point => Val::Point(Point::new(nan, nan)),
        TypeName::Segment => {
            Val::Segment(Point::new(nan, nan), Point::new(nan, nan))
        }
        TypeName::Circle => Val::Circle(Point::new(nan, nan), nan),
        TypeName::Vector => Val::Vector(Vec::new()),
        TypeName::Matrix => Val::Matrix(Mat::new(0, 0, Vec::new())),
        TypeName::Color => Val::Color([nan; 4]),
        TypeName::Text => Val::Text(String::new()),
        TypeName::Image => Val::Image(0),
    }
}

/// Changes the representation of a scalar payload from one type to another
///
/// `true` becomes an exact 1 and `false` the real garbage value; a real gains
/// an exact-zero imaginary part; a vector becomes a one-column matrix.  The
/// 64↔32 renames are free on the host.
pub fn coerce_val(val: &Val, from: TypeName, to: TypeName) -> Result<Val, Error> {
    use TypeName::{Bool, Matrix, Vector, C32, C64, R32, R64};
    if from == to {
        return Ok(val.clone());
    }
    match (val, from, to) {
        (Val::Bool(b), Bool, R64 | R32) => Ok(if *b {
            Val::Real(Real::ONE)
        } else {
            garbage(to)
        }),
        (Val::Bool(b), Bool, C64 | C32) => Ok(if *b {
            Val::Complex(Point::new(Real::ONE, Real::ZERO))
        } else {
            garbage(to)
        }),
        (Val::Real(r), R64, R32) => Ok(Val::Real(*r)),
        (Val::Real(r), R64 | R32, C64 | C32) => {
            Ok(Val::Complex(Point::new(*r, Real::ZERO)))
        }
        (Val::Complex(p), C64, C32) => Ok(Val::Complex(*p)),
        (Val::Vector(v), Vector, Matrix) => {
            Ok(Val::Matrix(Mat::new(v.len(), 1, v.clone())))
        }
        _ => Err(Error::Coercion(format!("{from} to {to}"))),
    }
}

/// A typed interpreter value: a scalar or a homogeneous list
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A single value of the given type
    Scalar(TypeName, Val),
    /// A list of values, all of the given type
    List(TypeName, Vec<Val>),
}

impl Value {
    /// Builds an r64 real scalar
    pub fn real(r: Real) -> Self {
        Value::Scalar(TypeName::R64, Val::Real(r))
    }

    /// Builds a boolean scalar
    pub fn bool(b: bool) -> Self {
        Value::Scalar(TypeName::Bool, Val::Bool(b))
    }

    /// Builds a point scalar
    pub fn point(x: Real, y: Real) -> Self {
        Value::Scalar(TypeName::Point, Val::Point(Point::new(x, y)))
    }

    /// Returns the value's type; lists report their runtime length
    pub fn ty(&self) -> Type {
        match self {
            Value::Scalar(n, _) => Type::scalar(*n),
            Value::List(n, items) => Type::fixed(*n, items.len()),
        }
    }

    /// Checks whether any real component is approximate
    ///
    /// The display layer uses this to decide between `=` and `≈`.
    pub fn is_approx(&self) -> bool {
        fn val(v: &Val) -> bool {
            match v {
                Val::Bool(_) | Val::Text(_) | Val::Image(_) => false,
                Val::Real(r) => !r.is_exact(),
                Val::Complex(p) | Val::Point(p) => {
                    !p.x.is_exact() || !p.y.is_exact()
                }
                Val::Segment(a, b) => {
                    !a.x.is_exact()
                        || !a.y.is_exact()
                        || !b.x.is_exact()
                        || !b.y.is_exact()
                }
                Val::Circle(c, r) => {
                    !c.x.is_exact() || !c.y.is_exact() || !r.is_exact()
                }
                Val::Vector(v) => v.iter().any(|r| !r.is_exact()),
                Val::Matrix(m) => m.data.iter().any(|r| !r.is_exact()),
                Val::Color(c) => c.iter().any(|r| !r.is_exact()),
            }
        }
        match self {
            Value::Scalar(_, v) => val(v),
            Value::List(_, items) => items.iter().any(val),
        }
    }

    /// Coerces this value to the target type
    ///
    /// A scalar broadcasts into a fixed list by repetition; a list never
    /// shrinks back to a scalar.
    pub fn coerce(&self, to: &Type) -> Result<Value, Error> {
        let from = match self {
            Value::Scalar(n, _) => *n,
            Value::List(n, _) => *n,
        };
        match (self, to.len) {
            (Value::Scalar(_, v), Multiplicity::Scalar) => Ok(Value::Scalar(
                to.name,
                coerce_val(v, from, to.name)?,
            )),
            (Value::List(..), Multiplicity::Scalar) => Err(Error::Coercion(
                "a list to a non-list".to_string(),
            )),
            (Value::Scalar(_, v), Multiplicity::Fixed(n)) => {
                let item = coerce_val(v, from, to.name)?;
                Ok(Value::List(to.name, vec![item; n]))
            }
            (Value::Scalar(_, v), Multiplicity::Dynamic) => {
                let item = coerce_val(v, from, to.name)?;
                Ok(Value::List(to.name, vec![item]))
            }
            (Value::List(_, items), Multiplicity::Fixed(n)) => {
                if items.len() != n {
                    return Err(Error::Coercion(format!(
                        "a list of {} to a list of {n}",
                        items.len()
                    )));
                }
                let items = items
                    .iter()
                    .map(|v| coerce_val(v, from, to.name))
                    .collect::<Result<_, _>>()?;
                Ok(Value::List(to.name, items))
            }
            (Value::List(_, items), Multiplicity::Dynamic) => {
                let items = items
                    .iter()
                    .map(|v| coerce_val(v, from, to.name))
                    .collect::<Result<_, _>>()?;
                Ok(Value::List(to.name, items))
            }
        }
    }
}
