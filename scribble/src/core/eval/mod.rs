//! The dual-backend expression evaluator
//!
//! Two structurally parallel tree walks over [`Node`]: [`eval`] produces a
//! concrete [`Value`] and [`compile`] produces fragment-shader source.  Both
//! resolve operators through the [`Registry`], share the same error
//! taxonomy, and carry all per-call state (numeric base, lexical bindings,
//! shader context, node budget) explicitly — the registry is the only state
//! shared between calls.
//!
//! ```
//! use scribble::{ast::Node, eval::{eval, EvalProps}, registry::Registry};
//! use scribble::types::{Real, Value};
//!
//! let reg = Registry::with_defaults();
//! let node = Node::binary(
//!     scribble::ast::BinaryOp::Add,
//!     Node::num("1.5"),
//!     Node::num("2"),
//! );
//! let out = eval(&reg, &node, &EvalProps::default())?;
//! assert_eq!(out, Value::real(Real::frac(7, 2)));
//! assert!(!out.is_approx());
//! # Ok::<(), scribble::Error>(())
//! ```

pub mod num;

use crate::ast::{BinaryOp, Node, Piece};
use crate::glsl::{self, GlslContext, GlslValue, ShaderSource};
use crate::registry::Registry;
use crate::types::{
    garbage, unify_names, Double, Multiplicity, Real, Type, TypeName, Val,
    Value,
};
use crate::{Backend, Error};

use std::collections::HashMap;

/// Hard limit on processed nodes, guarding the call stack and wall clock
/// against pathological inputs
pub const NODE_BUDGET: usize = 100_000;

/// Per-call state for interpretation
pub struct EvalProps {
    /// Numeric base for literal parsing; exactly 10 unless overridden
    pub base: Real,
    /// Lexical bindings (function parameters, let-bindings)
    pub bindings: HashMap<String, Value>,
}

impl Default for EvalProps {
    fn default() -> Self {
        EvalProps {
            base: Real::int(10),
            bindings: HashMap::new(),
        }
    }
}

/// Per-call state for shader compilation
pub struct CompileProps {
    /// Numeric base for literal parsing
    pub base: Real,
    /// Lexical bindings; these must already be named, typed shader values
    pub bindings: HashMap<String, GlslValue>,
}

impl Default for CompileProps {
    fn default() -> Self {
        CompileProps {
            base: Real::int(10),
            bindings: HashMap::new(),
        }
    }
}

/// Evaluates an expression to a concrete value
pub fn eval(
    reg: &Registry,
    node: &Node,
    props: &EvalProps,
) -> Result<Value, Error> {
    let mut walker = Interp {
        reg,
        bindings: &props.bindings,
        budget: NODE_BUDGET,
    };
    walker.node(node, &props.base)
}

/// Compiles an expression to fragment-shader source
pub fn compile(
    reg: &Registry,
    node: &Node,
    props: &CompileProps,
) -> Result<ShaderSource, Error> {
    let mut ctx = GlslContext::new();
    let out = compile_value(reg, &mut ctx, node, props)?;
    Ok(ctx.finish(&out))
}

/// Compiles an expression into an existing context, returning the typed
/// result fragment
pub fn compile_value(
    reg: &Registry,
    ctx: &mut GlslContext,
    node: &Node,
    props: &CompileProps,
) -> Result<GlslValue, Error> {
    let mut walker = Compiler {
        reg,
        bindings: &props.bindings,
        budget: NODE_BUDGET,
    };
    walker.node(ctx, node, &props.base)
}

struct Interp<'a> {
    reg: &'a Registry,
    bindings: &'a HashMap<String, Value>,
    budget: usize,
}

impl Interp<'_> {
    fn spend(&mut self) -> Result<(), Error> {
        match self.budget.checked_sub(1) {
            Some(b) => {
                self.budget = b;
                Ok(())
            }
            None => Err(Error::ResourceLimit),
        }
    }

    fn node(&mut self, node: &Node, base: &Real) -> Result<Value, Error> {
        self.spend()?;
        match node {
            Node::Num(s) => Ok(Value::real(num::parse_in(s, base)?)),

            Node::Var { name, sup } => {
                let value = if let Some(v) = self.bindings.get(name) {
                    v.clone()
                } else if let Some(b) = self.reg.constant(name) {
                    b.value.clone()
                } else {
                    return Err(Error::UnknownVariable(name.clone()));
                };
                match sup {
                    None => Ok(value),
                    Some(e) => {
                        let exp = self.node(e, base)?;
                        self.reg.call("^", &[value, exp])
                    }
                }
            }

            Node::Unary { op, arg } => {
                let a = self.node(arg, base)?;
                self.reg.call(op.name(), &[a])
            }

            Node::Binary {
                op: BinaryOp::Base,
                lhs,
                rhs,
            } => {
                let b = self.node(rhs, &Real::int(10))?;
                let b = as_base_value(&b)?;
                self.node(lhs, &b)
            }

            Node::Binary { op, lhs, rhs } => {
                let a = self.node(lhs, base)?;
                let b = self.node(rhs, base)?;
                self.reg.call(op.name(), &[a, b])
            }

            Node::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.node(a, base))
                    .collect::<Result<Vec<_>, _>>()?;
                self.reg.call(name, &args)
            }

            Node::Juxtapose(a, b) => {
                let a = self.node(a, base)?;
                let b = self.node(b, base)?;
                self.reg.call("·", &[a, b])
            }

            Node::Paren(inner) => self.node(inner, base),

            Node::Abs(inner) => {
                let v = self.node(inner, base)?;
                self.reg.call("abs", &[v])
            }

            Node::List(items) => {
                let vals = items
                    .iter()
                    .map(|i| self.node(i, base))
                    .collect::<Result<Vec<_>, _>>()?;
                if vals.is_empty() {
                    return Ok(Value::List(TypeName::R64, Vec::new()));
                }
                let mut names = Vec::with_capacity(vals.len());
                for v in &vals {
                    match v {
                        Value::Scalar(n, _) => names.push(*n),
                        Value::List(..) => {
                            return Err(Error::Domain(
                                "cannot store a list inside another list"
                                    .to_string(),
                            ))
                        }
                    }
                }
                let ty = unify_names(&names)?;
                let items = vals
                    .iter()
                    .map(|v| {
                        v.coerce(&Type::scalar(ty)).map(|v| match v {
                            Value::Scalar(_, val) => val,
                            Value::List(..) => unreachable!(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(ty, items))
            }

            Node::Index { on, index } => {
                let on = self.node(on, base)?;
                let Value::List(ty, items) = on else {
                    return Err(Error::Domain(
                        "cannot index into a non-list".to_string(),
                    ));
                };
                let index = self.node(index, base)?;
                let Value::Scalar(n, Val::Real(idx)) = &index else {
                    return Err(Error::Domain(
                        "indexes must be numbers".to_string(),
                    ));
                };
                debug_assert!(n.is_real());
                let i = idx.to_f64();
                // 1-based; anything out of range yields the sentinel
                let item = if i.fract() == 0.0
                    && i >= 1.0
                    && i <= items.len() as f64
                {
                    items[i as usize - 1].clone()
                } else {
                    garbage(ty)
                };
                Ok(Value::Scalar(ty, item))
            }

            Node::CmpChain { items, ops } => {
                let vals = items
                    .iter()
                    .map(|i| self.node(i, base))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut out: Option<Value> = None;
                for (i, op) in ops.iter().enumerate() {
                    let pair = self
                        .reg
                        .call(op.name(), &[vals[i].clone(), vals[i + 1].clone()])?;
                    out = Some(match out {
                        None => pair,
                        Some(acc) => self.reg.call("and", &[acc, pair])?,
                    });
                }
                out.ok_or_else(|| {
                    Error::Domain("empty comparison chain".to_string())
                })
            }

            Node::Piecewise(pieces) => self.piecewise(pieces, base),
        }
    }

    /// Conditions run in order; only the taken branch's value is evaluated.
    /// With no otherwise branch and no true condition, the result is the
    /// real sentinel.
    fn piecewise(
        &mut self,
        pieces: &[Piece],
        base: &Real,
    ) -> Result<Value, Error> {
        for (i, piece) in pieces.iter().enumerate() {
            match &piece.condition {
                None => {
                    if i + 1 != pieces.len() {
                        return Err(Error::Domain(
                            "an 'otherwise' branch must come last".to_string(),
                        ));
                    }
                    return self.node(&piece.value, base);
                }
                Some(cond) => {
                    let c = self.node(cond, base)?;
                    let Value::Scalar(TypeName::Bool, Val::Bool(b)) = c else {
                        return Err(Error::Domain(
                            "a piecewise condition must be a condition like \
                             x < 2"
                                .to_string(),
                        ));
                    };
                    if b {
                        return self.node(&piece.value, base);
                    }
                }
            }
        }
        Ok(Value::real(Real::approx(f64::NAN)))
    }
}

fn as_base_value(v: &Value) -> Result<Real, Error> {
    match v {
        Value::Scalar(n, Val::Real(r)) if n.is_real() => {
            num::as_base(r)?;
            Ok(*r)
        }
        _ => Err(Error::Domain(format!(
            "{} cannot be used as a numeric base",
            v.ty()
        ))),
    }
}

struct Compiler<'a> {
    reg: &'a Registry,
    bindings: &'a HashMap<String, GlslValue>,
    budget: usize,
}

impl Compiler<'_> {
    fn spend(&mut self) -> Result<(), Error> {
        match self.budget.checked_sub(1) {
            Some(b) => {
                self.budget = b;
                Ok(())
            }
            None => Err(Error::ResourceLimit),
        }
    }

    /// Evaluates a subexpression on the host, for constructs the shader
    /// needs resolved at compile time (bases, indices)
    fn host(&self, node: &Node, base: &Real) -> Result<Value, Error> {
        eval(
            self.reg,
            node,
            &EvalProps {
                base: *base,
                bindings: HashMap::new(),
            },
        )
    }

    fn node(
        &mut self,
        ctx: &mut GlslContext,
        node: &Node,
        base: &Real,
    ) -> Result<GlslValue, Error> {
        self.spend()?;
        match node {
            Node::Num(s) => {
                let r = num::parse_in(s, base)?;
                let d = Double::from_f64(r.to_f64());
                Ok(GlslValue::scalar(
                    TypeName::R64,
                    format!(
                        "vec2({}, {})",
                        glsl::float(d.hi),
                        glsl::float(d.lo)
                    ),
                ))
            }

            Node::Var { name, sup } => {
                let value = if let Some(v) = self.bindings.get(name) {
                    v.clone()
                } else if let Some(b) = self.reg.constant(name) {
                    b.glsl.clone()
                } else {
                    return Err(Error::UnknownVariable(name.clone()));
                };
                match sup {
                    None => Ok(value),
                    Some(e) => {
                        let exp = self.node(ctx, e, base)?;
                        self.reg.call_glsl("^", ctx, &[value, exp])
                    }
                }
            }

            Node::Unary { op, arg } => {
                let a = self.node(ctx, arg, base)?;
                self.reg.call_glsl(op.name(), ctx, &[a])
            }

            Node::Binary {
                op: BinaryOp::Base,
                lhs,
                rhs,
            } => {
                let b = self.host(rhs, &Real::int(10))?;
                let b = as_base_value(&b)?;
                self.node(ctx, lhs, &b)
            }

            Node::Binary { op, lhs, rhs } => {
                let a = self.node(ctx, lhs, base)?;
                let b = self.node(ctx, rhs, base)?;
                self.reg.call_glsl(op.name(), ctx, &[a, b])
            }

            Node::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.node(ctx, a, base))
                    .collect::<Result<Vec<_>, _>>()?;
                self.reg.call_glsl(name, ctx, &args)
            }

            Node::Juxtapose(a, b) => {
                let a = self.node(ctx, a, base)?;
                let b = self.node(ctx, b, base)?;
                self.reg.call_glsl("·", ctx, &[a, b])
            }

            Node::Paren(inner) => self.node(ctx, inner, base),

            Node::Abs(inner) => {
                let v = self.node(ctx, inner, base)?;
                self.reg.call_glsl("abs", ctx, &[v])
            }

            Node::List(items) => {
                if items.is_empty() {
                    return Err(Error::unsupported(
                        "empty lists",
                        Backend::Shader,
                    ));
                }
                let vals = items
                    .iter()
                    .map(|i| self.node(ctx, i, base))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut names = Vec::with_capacity(vals.len());
                for v in &vals {
                    match v.ty.len {
                        Multiplicity::Scalar => names.push(v.ty.name),
                        _ => {
                            return Err(Error::Domain(
                                "cannot store a list inside another list"
                                    .to_string(),
                            ))
                        }
                    }
                }
                let ty = unify_names(&names)?;
                let base_ty = glsl::scalar_ty(ty)?;
                let mut expr = format!("{base_ty}[{}](", vals.len());
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        expr.push_str(", ");
                    }
                    expr.push_str(&glsl::coerce_expr(
                        &v.expr, v.ty.name, ty,
                    )?);
                }
                expr.push(')');
                Ok(GlslValue {
                    ty: Type::fixed(ty, vals.len()),
                    expr,
                })
            }

            Node::Index { on, index } => {
                let on = self.node(ctx, on, base)?;
                let n = match on.ty.len {
                    Multiplicity::Fixed(n) => n,
                    Multiplicity::Dynamic => {
                        return Err(Error::unsupported(
                            "indexing a dynamically sized list",
                            Backend::Shader,
                        ))
                    }
                    Multiplicity::Scalar => {
                        return Err(Error::Domain(
                            "cannot index into a non-list".to_string(),
                        ))
                    }
                };
                // Shader arrays have static bounds, so the index must be
                // resolvable (and in range) at compile time
                let idx = self.host(index, base)?;
                let Value::Scalar(t, Val::Real(idx)) = &idx else {
                    return Err(Error::Domain(
                        "indexes must be numbers".to_string(),
                    ));
                };
                debug_assert!(t.is_real());
                let i = idx.to_f64();
                if i.fract() != 0.0 || i < 1.0 || i > n as f64 {
                    return Err(Error::Domain(format!(
                        "index {i} is out of bounds for a list of length {n}"
                    )));
                }
                let name = ctx.cache(&on)?;
                Ok(GlslValue::scalar(
                    on.ty.name,
                    format!("{name}[{}]", i as usize - 1),
                ))
            }

            Node::CmpChain { items, ops } => {
                let vals = items
                    .iter()
                    .map(|i| self.node(ctx, i, base))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut out: Option<GlslValue> = None;
                for (i, op) in ops.iter().enumerate() {
                    let pair = self.reg.call_glsl(
                        op.name(),
                        ctx,
                        &[vals[i].clone(), vals[i + 1].clone()],
                    )?;
                    out = Some(match out {
                        None => pair,
                        Some(acc) => {
                            self.reg.call_glsl("and", ctx, &[acc, pair])?
                        }
                    });
                }
                out.ok_or_else(|| {
                    Error::Domain("empty comparison chain".to_string())
                })
            }

            Node::Piecewise(pieces) => self.piecewise(ctx, pieces, base),
        }
    }

    /// Compiles a piecewise expression with definite assignment
    ///
    /// Each branch's condition and value get forked contexts so their
    /// statements land inside the right guarded block; the emitted source
    /// assigns the result variable on every control path, falling back to
    /// the typed sentinel only when no otherwise branch exists.
    fn piecewise(
        &mut self,
        ctx: &mut GlslContext,
        pieces: &[Piece],
        base: &Real,
    ) -> Result<GlslValue, Error> {
        struct Branch {
            cond: Option<(GlslContext, String)>,
            value_ctx: GlslContext,
            value: GlslValue,
        }

        if pieces.is_empty() {
            return Err(Error::Domain("empty piecewise expression".to_string()));
        }

        let mut branches = Vec::with_capacity(pieces.len());
        for (i, piece) in pieces.iter().enumerate() {
            let cond = match &piece.condition {
                None => {
                    if i + 1 != pieces.len() {
                        return Err(Error::Domain(
                            "an 'otherwise' branch must come last".to_string(),
                        ));
                    }
                    None
                }
                Some(c) => {
                    let mut cond_ctx = ctx.fork();
                    let cond = self.node(&mut cond_ctx, c, base)?;
                    if cond.ty.len != Multiplicity::Scalar {
                        return Err(Error::Domain(
                            "lists cannot be used as a piecewise condition"
                                .to_string(),
                        ));
                    }
                    if cond.ty.name != TypeName::Bool {
                        return Err(Error::Domain(
                            "a piecewise condition must be a condition like \
                             x < 2"
                                .to_string(),
                        ));
                    }
                    Some((cond_ctx, cond.expr))
                }
            };
            let mut value_ctx = ctx.fork();
            let value = self.node(&mut value_ctx, &piece.value, base)?;
            branches.push(Branch {
                cond,
                value_ctx,
                value,
            });
        }

        let tys: Vec<Type> = branches.iter().map(|b| b.value.ty).collect();
        let ret = match crate::types::coerce_type(&tys)? {
            Some(t) => t,
            None => {
                return Err(Error::Domain(
                    "empty piecewise expression".to_string(),
                ))
            }
        };

        let name = ctx.name();
        ctx.stmt(format!("{};", glsl::declaration(&ret, &name)?));

        let mut closers = 0;
        let mut assigned = false;
        for mut branch in branches {
            let expr =
                glsl::coerce_value(&mut branch.value_ctx, &branch.value, &ret)?;
            match branch.cond {
                None => {
                    ctx.block.push_str(&branch.value_ctx.block);
                    ctx.stmt(format!("{name} = {expr};"));
                    assigned = true;
                }
                Some((cond_ctx, cond)) => {
                    ctx.block.push_str(&cond_ctx.block);
                    ctx.stmt(format!("if ({cond}) {{"));
                    ctx.block.push_str(&branch.value_ctx.block);
                    ctx.stmt(format!("{name} = {expr};"));
                    ctx.stmt("} else {");
                    closers += 1;
                }
            }
        }
        if !assigned {
            ctx.stmt(format!("{name} = {};", glsl::garbage_value(&ret)?));
        }
        for _ in 0..closers {
            ctx.stmt("}");
        }

        Ok(GlslValue {
            ty: ret,
            expr: name,
        })
    }
}
