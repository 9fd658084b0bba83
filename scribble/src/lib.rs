//! Scribble is a library for evaluating and compiling mathematical
//! expressions, built for interactive graphing tools.
//!
//! An expression arrives as an [`ast::Node`] tree from the (external)
//! parser, and leaves through one of two backends that share a single
//! operator [`registry`](registry::Registry):
//!
//! - [`eval::eval`] interprets the tree into a concrete
//!   [`Value`](types::Value), keeping results exact as long as the inputs
//!   and operations allow (`0.1 + 0.2` really is `3/10`);
//! - [`eval::compile`] emits fragment-shader source which reproduces the
//!   interpreter's results at double-double precision, one shader
//!   invocation per plotted point.
//!
//! ```
//! use scribble::{ast::{BinaryOp, Node}, eval, registry::Registry};
//! use scribble::types::{Real, Value};
//!
//! let reg = Registry::with_defaults();
//! let sum = Node::binary(BinaryOp::Add, Node::num("0.1"), Node::num("0.2"));
//!
//! // Interpretation is exact
//! let v = eval::eval(&reg, &sum, &eval::EvalProps::default())?;
//! assert_eq!(v, Value::real(Real::frac(3, 10)));
//!
//! // Compilation produces shader source for the same expression
//! let src = eval::compile(&reg, &sum, &eval::CompileProps::default())?;
//! assert!(src.declarations.contains("_helper_add_r64"));
//! # Ok::<(), scribble::Error>(())
//! ```
//!
//! Operators dispatch on argument types through a small coercion lattice
//! (see [`types`]); the builtin operator set lives in [`packages`] and is
//! registered with [`Registry::with_defaults`](registry::Registry).
#![warn(missing_docs)]

mod core;
pub use crate::core::*;

mod error;
pub use error::{Backend, Error};

pub mod packages;
