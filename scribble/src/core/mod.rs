//! Backend-independent expression machinery
pub mod ast;
pub mod eval;
pub mod glsl;
pub mod registry;
pub mod types;
