//! Module containing the Scribble universal error type
use thiserror::Error;

/// One of the two code-generation targets
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
    /// Immediate host evaluation, producing a concrete [`Value`](crate::types::Value)
    Interpreter,
    /// Fragment-shader source emission
    Shader,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Interpreter => write!(f, "interpreter"),
            Backend::Shader => write!(f, "shader"),
        }
    }
}

/// Universal error type for Scribble
///
/// Every failure is scoped to the single expression being processed; both
/// backends raise the same taxonomy, so the caller can present one consistent
/// message regardless of which backend detected the problem.
#[derive(Error, Debug)]
pub enum Error {
    /// The named operator was never registered
    #[error("the operator '{0}' is not defined")]
    UnknownOperator(String),

    /// No registered signature accepts the given argument types
    #[error("'{name}' is not defined for ({types})")]
    NoMatchingSignature {
        /// Operator or function name
        name: String,
        /// Comma-separated list of the attempted argument types
        types: String,
    },

    /// Incompatible types or multiplicities
    #[error("cannot coerce {0}")]
    Coercion(String),

    /// A variadic entry's minimum arity was unmet
    #[error("'{name}' expects at least {min} argument(s), got {found}")]
    ArityMismatch {
        /// Operator or function name
        name: String,
        /// Minimum number of arguments
        min: usize,
        /// Number of arguments supplied
        found: usize,
    },

    /// The operation is undefined for the given inputs
    #[error("{0}")]
    Domain(String),

    /// The construct is valid for the other backend but not this one
    #[error("{what} is not supported in the {backend} backend")]
    Unsupported {
        /// Human-readable description of the construct
        what: String,
        /// The backend that rejected it
        backend: Backend,
    },

    /// The expression exceeded the node-count budget
    #[error("expression is too large to process")]
    ResourceLimit,

    /// The named variable has no binding and no builtin value
    #[error("the variable '{0}' is not defined")]
    UnknownVariable(String),

    /// A numeric literal could not be parsed in the active base
    #[error("invalid numeral '{0}'")]
    BadNumeral(String),
}

impl Error {
    /// Builds an [`Error::Unsupported`] for the given backend
    pub fn unsupported(what: impl Into<String>, backend: Backend) -> Self {
        Error::Unsupported {
            what: what.into(),
            backend,
        }
    }
}
