//! Shader source emission
//!
//! A [`GlslContext`] accumulates the statements of one compiled expression,
//! deduplicates helper-function declarations, and caches repeated
//! subexpressions as named temporaries.  It is created fresh per compilation
//! and discarded once the source is read out with [`GlslContext::finish`].

pub mod r64;

use crate::types::{Multiplicity, Type, TypeName};
use crate::{Backend, Error};

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// A typed fragment-shader expression
///
/// This is the shader backend's value: it never holds a runtime number, only
/// source text and its type.
#[derive(Clone, Debug, PartialEq)]
pub struct GlslValue {
    /// Type of the expression
    pub ty: Type,
    /// GLSL source for the expression
    pub expr: String,
}

impl GlslValue {
    /// Builds a scalar-typed expression
    pub fn scalar(name: TypeName, expr: impl Into<String>) -> Self {
        GlslValue {
            ty: Type::scalar(name),
            expr: expr.into(),
        }
    }
}

/// The assembled output of one compilation
///
/// The excluded rendering layer concatenates `declarations`, then a function
/// body of `statements` followed by `return result_expr;`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderSource {
    /// Helper function declarations, each emitted at most once
    pub declarations: String,
    /// Statements to run ahead of the result expression
    pub statements: String,
    /// The final expression
    pub result_expr: String,
}

/// Tables shared between a context and all of its forks
#[derive(Default)]
struct Tables {
    declared: BTreeSet<&'static str>,
    helpers: String,
    next_name: u64,
}

/// Single-compilation shader emission state
///
/// [`fork`](GlslContext::fork) produces a child sharing the declaration
/// tables and name counter but with an isolated statement list, so that a
/// conditional branch's statements are only emitted inside that branch's
/// guarded block.  The subexpression cache follows lexical scope instead:
/// a fork starts from a snapshot of its parent's entries (the parent's
/// temporaries dominate the branch block) and entries made inside the fork
/// stay local to it, so one branch never references a temporary declared
/// inside a sibling's block.  A context must never be reused across
/// independent expressions.
pub struct GlslContext {
    tables: Rc<RefCell<Tables>>,
    cache: HashMap<(Type, String), String>,
    /// Emitted statements, in order
    pub block: String,
}

impl Default for GlslContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GlslContext {
    /// Builds a fresh context
    pub fn new() -> Self {
        GlslContext {
            tables: Rc::new(RefCell::new(Tables::default())),
            cache: HashMap::new(),
            block: String::new(),
        }
    }

    /// Produces a child context with an isolated statement list and a
    /// snapshot of the parent's cache
    pub fn fork(&self) -> Self {
        GlslContext {
            tables: Rc::clone(&self.tables),
            cache: self.cache.clone(),
            block: String::new(),
        }
    }

    /// Returns a fresh temporary-variable name
    pub fn name(&mut self) -> String {
        let mut t = self.tables.borrow_mut();
        t.next_name += 1;
        format!("_v{}", t.next_name)
    }

    /// Appends a statement line to this context's block
    pub fn stmt(&mut self, line: impl AsRef<str>) {
        self.block.push_str(line.as_ref());
        self.block.push('\n');
    }

    /// Emits a helper function's source the first time `id` is requested;
    /// a no-op thereafter
    pub fn declare(
        &mut self,
        id: &'static str,
        source: impl FnOnce() -> String,
    ) {
        let mut t = self.tables.borrow_mut();
        if t.declared.insert(id) {
            let text = source();
            t.helpers.push_str(&text);
        }
    }

    /// Checks whether a helper has been declared in this compilation
    pub fn is_declared(&self, id: &str) -> bool {
        self.tables.borrow().declared.contains(id)
    }

    /// Binds a value to a temporary, or returns the name already assigned to
    /// a structurally identical fragment in this block or an enclosing one
    ///
    /// Expressions that are already bare identifiers are returned as-is
    /// rather than re-bound.
    pub fn cache(&mut self, val: &GlslValue) -> Result<String, Error> {
        if is_ident(&val.expr) {
            return Ok(val.expr.clone());
        }
        let key = (val.ty, val.expr.clone());
        if let Some(name) = self.cache.get(&key) {
            return Ok(name.clone());
        }
        let name = self.name();
        let decl = declaration(&val.ty, &name)?;
        self.stmt(format!("{decl} = {};", val.expr));
        self.cache.insert(key, name.clone());
        Ok(name)
    }

    /// Maps a fixed-length list value elementwise, returning an array
    /// constructor expression
    pub fn map_list(
        &mut self,
        val: &GlslValue,
        to: TypeName,
        mut f: impl FnMut(&mut GlslContext, &str) -> Result<String, Error>,
    ) -> Result<String, Error> {
        let Multiplicity::Fixed(n) = val.ty.len else {
            return Err(Error::unsupported(
                "dynamically sized lists",
                Backend::Shader,
            ));
        };
        let name = self.cache(val)?;
        let base = scalar_ty(to)?;
        let mut out = format!("{base}[{n}](");
        for i in 0..n {
            if i > 0 {
                out.push_str(", ");
            }
            let item = f(self, &format!("{name}[{i}]"))?;
            out.push_str(&item);
        }
        out.push(')');
        Ok(out)
    }

    /// Consumes the context, producing the final source bundle
    pub fn finish(self, result: &GlslValue) -> ShaderSource {
        let tables = self.tables.borrow();
        ShaderSource {
            declarations: tables.helpers.clone(),
            statements: self.block.clone(),
            result_expr: result.expr.clone(),
        }
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns the GLSL type keyword for a scalar of the given name
pub fn scalar_ty(name: TypeName) -> Result<&'static str, Error> {
    match name {
        TypeName::Bool => Ok("bool"),
        TypeName::R64 => Ok("vec2"),
        TypeName::R32 => Ok("float"),
        TypeName::C64 => Ok("vec4"),
        TypeName::C32 => Ok("vec2"),
        TypeName::Point => Ok("vec2"),
        TypeName::Segment => Ok("vec4"),
        TypeName::Circle => Ok("vec3"),
        TypeName::Color => Ok("vec4"),
        TypeName::Vector | TypeName::Matrix | TypeName::Text | TypeName::Image => {
            Err(Error::unsupported(
                format!("values of type {name}"),
                Backend::Shader,
            ))
        }
    }
}

/// Returns a declaration (without initializer or semicolon) for a variable
/// of the given type
pub fn declaration(ty: &Type, name: &str) -> Result<String, Error> {
    let base = scalar_ty(ty.name)?;
    match ty.len {
        Multiplicity::Scalar => Ok(format!("{base} {name}")),
        Multiplicity::Fixed(n) => Ok(format!("{base} {name}[{n}]")),
        Multiplicity::Dynamic => Err(Error::unsupported(
            "dynamically sized lists",
            Backend::Shader,
        )),
    }
}

/// Renders an `f32` as a GLSL literal
pub fn float(v: f32) -> String {
    if v.is_nan() {
        "(0.0/0.0)".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "(1.0/0.0)".to_string()
        } else {
            "(-1.0/0.0)".to_string()
        }
    } else if v == v.trunc() && v.abs() < 1e9 {
        format!("{v:.1}")
    } else {
        format!("{v:e}")
    }
}

/// The type-appropriate sentinel expression
pub fn garbage(name: TypeName) -> Result<String, Error> {
    let out = match name {
        TypeName::Bool => "false".to_string(),
        TypeName::R32 => "(0.0/0.0)".to_string(),
        other => format!("{}(0.0/0.0)", scalar_ty(other)?),
    };
    Ok(out)
}

/// The sentinel expression for a full type, including fixed lists
pub fn garbage_value(ty: &Type) -> Result<String, Error> {
    match ty.len {
        Multiplicity::Scalar => garbage(ty.name),
        Multiplicity::Fixed(n) => {
            let base = scalar_ty(ty.name)?;
            let item = garbage(ty.name)?;
            let items = vec![item; n].join(", ");
            Ok(format!("{base}[{n}]({items})"))
        }
        Multiplicity::Dynamic => Err(Error::unsupported(
            "dynamically sized lists",
            Backend::Shader,
        )),
    }
}

/// Rewrites a scalar expression from one type name to another
pub fn coerce_expr(
    expr: &str,
    from: TypeName,
    to: TypeName,
) -> Result<String, Error> {
    use TypeName::*;
    if from == to {
        return Ok(expr.to_string());
    }
    let out = match (from, to) {
        (Bool, R32) => format!("({expr} ? 1.0 : (0.0/0.0))"),
        (Bool, R64) => format!("({expr} ? vec2(1.0, 0.0) : vec2(0.0/0.0))"),
        (Bool, C32) => format!("({expr} ? vec2(1.0, 0.0) : vec2(0.0/0.0))"),
        (Bool, C64) => {
            format!("({expr} ? vec4(1.0, 0.0, 0.0, 0.0) : vec4(0.0/0.0))")
        }
        (R64, R32) => format!("{expr}.x"),
        (R64, C64) => format!("vec4({expr}, 0.0, 0.0)"),
        (R64, C32) => format!("vec2({expr}.x, 0.0)"),
        (R32, C32) => format!("vec2({expr}, 0.0)"),
        (C64, C32) => format!("{expr}.xz"),
        _ => return Err(Error::Coercion(format!("{from} to {to}"))),
    };
    Ok(out)
}

/// Coerces a shader value to the target type, possibly emitting statements
pub fn coerce_value(
    ctx: &mut GlslContext,
    val: &GlslValue,
    to: &Type,
) -> Result<String, Error> {
    match (val.ty.len, to.len) {
        (Multiplicity::Scalar, Multiplicity::Scalar) => {
            coerce_expr(&val.expr, val.ty.name, to.name)
        }
        (_, Multiplicity::Scalar) => {
            Err(Error::Coercion("a list to a non-list".to_string()))
        }
        (Multiplicity::Dynamic, _) | (_, Multiplicity::Dynamic) => Err(
            Error::unsupported("dynamically sized lists", Backend::Shader),
        ),
        (Multiplicity::Scalar, Multiplicity::Fixed(n)) => {
            // Bind once so the expression is not re-evaluated per element
            let item = coerce_expr(&val.expr, val.ty.name, to.name)?;
            let name = ctx.cache(&GlslValue::scalar(to.name, item))?;
            let base = scalar_ty(to.name)?;
            Ok(format!("{base}[{n}]({})", vec![name; n].join(", ")))
        }
        (Multiplicity::Fixed(a), Multiplicity::Fixed(b)) => {
            if a != b {
                return Err(Error::Coercion(format!(
                    "a list of {a} to a list of {b}"
                )));
            }
            let from = val.ty.name;
            ctx.map_list(val, to.name, |_, item| {
                coerce_expr(item, from, to.name)
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_deduplicates_structurally_identical_fragments() {
        let mut ctx = GlslContext::new();
        let v = GlslValue::scalar(TypeName::R32, "(a + b)");
        let n1 = ctx.cache(&v).unwrap();
        let n2 = ctx.cache(&v).unwrap();
        assert_eq!(n1, n2);
        assert_eq!(ctx.block.matches(" = (a + b);").count(), 1);
    }

    #[test]
    fn cache_skips_bare_identifiers() {
        let mut ctx = GlslContext::new();
        let v = GlslValue::scalar(TypeName::R32, "foo");
        assert_eq!(ctx.cache(&v).unwrap(), "foo");
        assert!(ctx.block.is_empty());
    }

    #[test]
    fn declare_once_per_context() {
        let mut ctx = GlslContext::new();
        let mut calls = 0;
        for _ in 0..3 {
            ctx.declare("helper", || {
                calls += 1;
                "float helper() { return 1.0; }\n".to_string()
            });
        }
        assert_eq!(calls, 1);

        // An independent compilation declares it again
        let mut other = GlslContext::new();
        other.declare("helper", || "text\n".to_string());
        assert!(other.is_declared("helper"));
    }

    #[test]
    fn cache_entries_follow_lexical_scope() {
        let mut ctx = GlslContext::new();
        let v = GlslValue::scalar(TypeName::R32, "(a + b)");

        // A temporary bound before the fork is visible inside it
        let outer = ctx.cache(&v).unwrap();
        let mut child = ctx.fork();
        assert_eq!(child.cache(&v).unwrap(), outer);
        assert!(child.block.is_empty());

        // Sibling branches never see each other's bindings
        let w = GlslValue::scalar(TypeName::R32, "(c * c)");
        let mut b1 = ctx.fork();
        let n1 = b1.cache(&w).unwrap();
        let mut b2 = ctx.fork();
        let n2 = b2.cache(&w).unwrap();
        assert_ne!(n1, n2);
        assert!(b2.block.contains(&format!("{n2} = (c * c);")));
    }

    #[test]
    fn scalar_broadcast_binds_the_expression_once() {
        let mut ctx = GlslContext::new();
        let v = GlslValue::scalar(TypeName::R32, "(a + b)");
        let out =
            coerce_value(&mut ctx, &v, &Type::fixed(TypeName::R32, 3)).unwrap();
        assert_eq!(ctx.block.matches("= (a + b);").count(), 1);
        let name = ctx.cache(&v).unwrap();
        assert_eq!(out, format!("float[3]({name}, {name}, {name})"));
    }

    #[test]
    fn fork_shares_tables_but_not_statements() {
        let mut ctx = GlslContext::new();
        let mut child = ctx.fork();
        child.declare("h", || "src\n".to_string());
        assert!(ctx.is_declared("h"));

        let v = GlslValue::scalar(TypeName::R32, "(x * x)");
        let n1 = child.cache(&v).unwrap();
        assert!(ctx.block.is_empty());
        assert!(child.block.contains(&n1));

        // Names remain unique across forks
        let n2 = ctx.name();
        assert_ne!(n1, n2);
    }

    #[test]
    fn float_literals() {
        assert_eq!(float(3.0), "3.0");
        assert_eq!(float(-2.5), "-2.5e0");
        assert_eq!(float(f32::NAN), "(0.0/0.0)");
        assert_eq!(float(f32::INFINITY), "(1.0/0.0)");
    }

    #[test]
    fn scalar_coercions() {
        assert_eq!(coerce_expr("x", TypeName::R64, TypeName::R32).unwrap(), "x.x");
        assert_eq!(
            coerce_expr("x", TypeName::R32, TypeName::C32).unwrap(),
            "vec2(x, 0.0)"
        );
        assert!(coerce_expr("x", TypeName::Point, TypeName::R32).is_err());
    }
}
