//! The typed value model and its coercion lattice
//!
//! Numeric types come in 64-bit (compensated, exact-friendly) and 32-bit
//! (native shader float) flavors: `bool ⊂ r64 ⊂ r32 ⊂ c32` and
//! `r64 ⊂ c64 ⊂ c32`.  Geometric and composite types are siblings with no
//! automatic widening, except that a vector coerces to a one-column matrix.

pub mod double;
pub mod real;
mod value;

pub use double::Double;
pub use real::Real;
pub use value::{coerce_val, garbage, Mat, Point, Val, Value};

use crate::Error;

/// The name of a type, without multiplicity
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum TypeName {
    /// A condition
    Bool,
    /// A real number carried at double-double precision
    R64,
    /// A real number at native shader precision
    R32,
    /// A complex number over two r64 components
    C64,
    /// A complex number over two r32 components
    C32,
    /// A point in the plane
    Point,
    /// A line segment between two points
    Segment,
    /// A circle (center and radius)
    Circle,
    /// A column vector
    Vector,
    /// A matrix
    Matrix,
    /// An RGBA color
    Color,
    /// A piece of text
    Text,
    /// An opaque handle to an uploaded image
    Image,
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TypeName::Bool => "bool",
            TypeName::R64 => "r64",
            TypeName::R32 => "r32",
            TypeName::C64 => "c64",
            TypeName::C32 => "c32",
            TypeName::Point => "point",
            TypeName::Segment => "segment",
            TypeName::Circle => "circle",
            TypeName::Vector => "vector",
            TypeName::Matrix => "matrix",
            TypeName::Color => "color",
            TypeName::Text => "text",
            TypeName::Image => "image",
        };
        write!(f, "{s}")
    }
}

impl TypeName {
    /// Checks whether a value of this type may be coerced to `to`
    ///
    /// This is the subset relation of the lattice; it is deliberately small
    /// and closed.  Widening from 64-bit to 32-bit flavors is a *narrowing*
    /// of precision but a widening in the lattice sense: every r64 has an
    /// r32 rendering, not vice versa.
    pub fn can_coerce_to(self, to: TypeName) -> bool {
        use TypeName::*;
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Bool, R64 | R32 | C64 | C32)
                | (R64, R32 | C64 | C32)
                | (R32, C32)
                | (C64, C32)
                | (Vector, Matrix)
        )
    }

    /// Checks whether this is one of the real flavors
    pub fn is_real(self) -> bool {
        matches!(self, TypeName::R64 | TypeName::R32)
    }
}

/// Whether a typed value is a single scalar, a fixed-length list, or a
/// dynamically-sized list
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Multiplicity {
    /// A single value
    Scalar,
    /// Exactly `n` elements, known at compile time
    Fixed(usize),
    /// A runtime-known element count
    Dynamic,
}

/// A full type: name plus multiplicity
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Type {
    /// Element type
    pub name: TypeName,
    /// List-ness
    pub len: Multiplicity,
}

impl Type {
    /// Builds a scalar type
    pub fn scalar(name: TypeName) -> Self {
        Type {
            name,
            len: Multiplicity::Scalar,
        }
    }

    /// Builds a fixed-length list type
    pub fn fixed(name: TypeName, n: usize) -> Self {
        Type {
            name,
            len: Multiplicity::Fixed(n),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.len {
            Multiplicity::Scalar => write!(f, "{}", self.name),
            Multiplicity::Fixed(n) => write!(f, "a list of {n} {}", self.name),
            Multiplicity::Dynamic => write!(f, "a list of {}", self.name),
        }
    }
}

/// Formats a type list for error messages
pub(crate) fn list_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the least upper bound of a set of type names
///
/// Candidates are tried narrowest-first, so e.g. `[bool, r64]` unifies to
/// `r64` rather than jumping straight to `c32`.
pub fn unify_names(names: &[TypeName]) -> Result<TypeName, Error> {
    let Some(&first) = names.first() else {
        return Err(Error::Coercion("an empty set of types".to_string()));
    };
    if names.iter().all(|&n| n == first) {
        return Ok(first);
    }
    use TypeName::*;
    for candidate in [R64, R32, C64, C32, Matrix] {
        if names.iter().all(|n| n.can_coerce_to(candidate)) {
            return Ok(candidate);
        }
    }
    let list = names
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::Coercion(format!("{list} to a common type")))
}

/// Returns the least upper bound of the operand types of a single call
///
/// `Ok(None)` means there were zero arguments.  Multiplicity joins by
/// broadcast: scalars repeat into fixed lists, two fixed lists must agree on
/// length, and a dynamic list is contagious.
pub fn coerce_type(types: &[Type]) -> Result<Option<Type>, Error> {
    if types.is_empty() {
        return Ok(None);
    }
    let names: Vec<TypeName> = types.iter().map(|t| t.name).collect();
    let name = unify_names(&names)?;

    let mut len = Multiplicity::Scalar;
    for t in types {
        len = match (len, t.len) {
            (l, Multiplicity::Scalar) => l,
            (Multiplicity::Scalar, l) => l,
            (Multiplicity::Dynamic, _) | (_, Multiplicity::Dynamic) => {
                Multiplicity::Dynamic
            }
            (Multiplicity::Fixed(a), Multiplicity::Fixed(b)) => {
                if a == b {
                    Multiplicity::Fixed(a)
                } else {
                    return Err(Error::Coercion(format!(
                        "lists of lengths {a} and {b} to a common length"
                    )));
                }
            }
        };
    }
    Ok(Some(Type { name, len }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lattice_spot_checks() {
        let t = |n| Type::scalar(n);
        assert_eq!(
            coerce_type(&[t(TypeName::Bool), t(TypeName::R64)]).unwrap(),
            Some(t(TypeName::R64))
        );
        assert_eq!(
            coerce_type(&[t(TypeName::R64), t(TypeName::C64)]).unwrap(),
            Some(t(TypeName::C64))
        );
        assert_eq!(
            coerce_type(&[t(TypeName::R32), t(TypeName::C64)]).unwrap(),
            Some(t(TypeName::C32))
        );
        assert!(matches!(
            coerce_type(&[t(TypeName::Matrix), t(TypeName::Color)]),
            Err(Error::Coercion(_))
        ));
        assert_eq!(coerce_type(&[]).unwrap(), None);
    }

    #[test]
    fn vector_widens_to_matrix() {
        assert_eq!(
            coerce_type(&[
                Type::scalar(TypeName::Vector),
                Type::scalar(TypeName::Matrix)
            ])
            .unwrap(),
            Some(Type::scalar(TypeName::Matrix))
        );
    }

    #[test]
    fn multiplicity_joins() {
        let r = TypeName::R64;
        assert_eq!(
            coerce_type(&[Type::scalar(r), Type::fixed(r, 5)]).unwrap(),
            Some(Type::fixed(r, 5))
        );
        assert!(coerce_type(&[Type::fixed(r, 2), Type::fixed(r, 3)]).is_err());
        let dynamic = Type {
            name: r,
            len: Multiplicity::Dynamic,
        };
        assert_eq!(
            coerce_type(&[Type::fixed(r, 2), dynamic]).unwrap(),
            Some(dynamic)
        );
    }
}
