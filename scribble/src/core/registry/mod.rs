//! The multiple-dispatch operator and function registry
//!
//! Each named operator owns an ordered list of entries; resolution scans the
//! list **in registration order** and returns the first entry whose declared
//! parameter types each accept the corresponding argument type through the
//! coercion lattice.  Ties go to the first match, not the most specific
//! entry — call sites may depend on registration order, so do not "improve"
//! this to specificity-based resolution.
//!
//! The registry is populated by an explicit registration pass at start-up
//! (see [`packages`](crate::packages)) and treated as read-only afterwards;
//! it is passed by reference into every evaluation, never stored globally.

use crate::glsl::{self, GlslContext, GlslValue};
use crate::types::{
    coerce_val, list_types, Multiplicity, Type, TypeName, Value,
};
use crate::{Backend, Error};

use std::collections::HashMap;

/// Interpreter rule: receives arguments already coerced to the declared
/// parameter types
pub type InterpretFn =
    Box<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// Shader rule: returns the expression text for the entry's return type
pub type EmitFn = Box<
    dyn Fn(&mut GlslContext, &[GlslValue]) -> Result<String, Error>
        + Send
        + Sync,
>;

/// Declared parameter shape of an entry
pub enum Params {
    /// A fixed list of scalar parameter types
    Exact(Vec<TypeName>),
    /// Any number of arguments (at least `min`), each coerced independently
    /// to the element type
    Variadic {
        /// Minimum accepted arity
        min: usize,
        /// Homogeneous element type
        elem: TypeName,
    },
}

/// One `(signature → {interpret, emit})` rule for a named operator
pub struct Entry {
    /// Parameter shape
    pub params: Params,
    /// Scalar return type; list arguments broadcast around it
    pub ret: TypeName,
    interpret: InterpretFn,
    emit: EmitFn,
    /// Documentation only; never evaluated
    pub example: Option<&'static str>,
}

impl Entry {
    /// Builds an entry with an exact signature
    pub fn exact(
        params: &[TypeName],
        ret: TypeName,
        interpret: InterpretFn,
        emit: EmitFn,
    ) -> Self {
        Entry {
            params: Params::Exact(params.to_vec()),
            ret,
            interpret,
            emit,
            example: None,
        }
    }

    /// Builds a variadic entry
    pub fn variadic(
        min: usize,
        elem: TypeName,
        ret: TypeName,
        interpret: InterpretFn,
        emit: EmitFn,
    ) -> Self {
        Entry {
            params: Params::Variadic { min, elem },
            ret,
            interpret,
            emit,
            example: None,
        }
    }

    /// Attaches example text for documentation
    pub fn with_example(mut self, example: &'static str) -> Self {
        self.example = Some(example);
        self
    }

    /// The declared parameter type for argument position `i`
    fn param(&self, i: usize) -> TypeName {
        match &self.params {
            Params::Exact(ps) => ps[i],
            Params::Variadic { elem, .. } => *elem,
        }
    }

    /// Checks whether the entry's types accept the given argument types,
    /// ignoring arity limits
    fn accepts_types(&self, args: &[Type]) -> bool {
        match &self.params {
            Params::Exact(ps) => {
                ps.len() == args.len()
                    && args
                        .iter()
                        .zip(ps)
                        .all(|(a, p)| a.name.can_coerce_to(*p))
            }
            Params::Variadic { elem, .. } => {
                args.iter().all(|a| a.name.can_coerce_to(*elem))
            }
        }
    }
}

/// A builtin constant, carried in both backends' representations
pub struct Builtin {
    /// Interpreter value
    pub value: Value,
    /// Shader expression
    pub glsl: GlslValue,
}

/// The process-wide operator table
///
/// Populated once during initialization by every math-function package, read
/// thereafter.
#[derive(Default)]
pub struct Registry {
    ops: HashMap<String, Vec<Entry>>,
    consts: HashMap<String, Builtin>,
}

impl Registry {
    /// Builds an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry with every builtin package registered
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        crate::packages::register_all(&mut reg);
        reg
    }

    /// Appends an entry to the named operator's list
    pub fn insert(&mut self, name: &str, entry: Entry) {
        self.ops.entry(name.to_string()).or_default().push(entry);
    }

    /// Registers a builtin constant
    pub fn insert_const(&mut self, name: &str, value: Value, glsl: GlslValue) {
        self.consts
            .insert(name.to_string(), Builtin { value, glsl });
    }

    /// Looks up a builtin constant
    pub fn constant(&self, name: &str) -> Option<&Builtin> {
        self.consts.get(name)
    }

    /// Returns the first entry accepting the given argument types, in
    /// registration order
    pub fn resolve(
        &self,
        name: &str,
        args: &[Type],
    ) -> Result<&Entry, Error> {
        let entries = self
            .ops
            .get(name)
            .ok_or_else(|| Error::UnknownOperator(name.to_string()))?;
        let mut arity = None;
        for e in entries {
            if !e.accepts_types(args) {
                continue;
            }
            match e.params {
                Params::Variadic { min, .. } if args.len() < min => {
                    arity.get_or_insert(min);
                }
                _ => return Ok(e),
            }
        }
        if let Some(min) = arity {
            Err(Error::ArityMismatch {
                name: name.to_string(),
                min,
                found: args.len(),
            })
        } else {
            Err(Error::NoMatchingSignature {
                name: name.to_string(),
                types: list_types(args),
            })
        }
    }

    /// Resolves, coerces every argument, and invokes the interpreter rule
    ///
    /// List arguments broadcast elementwise around the entry's scalar
    /// signature: scalars repeat, equal-length lists zip, and mismatched
    /// lengths are a coercion error.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let tys: Vec<Type> = args.iter().map(Value::ty).collect();
        let entry = self.resolve(name, &tys)?;

        let mut len = None;
        for v in args {
            if let Value::List(_, items) = v {
                match len {
                    None => len = Some(items.len()),
                    Some(n) if n == items.len() => (),
                    Some(n) => {
                        return Err(Error::Coercion(format!(
                            "lists of lengths {n} and {} to a common length",
                            items.len()
                        )))
                    }
                }
            }
        }

        match len {
            None => {
                let coerced = args
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        v.coerce(&Type::scalar(entry.param(i)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (entry.interpret)(&coerced)
            }
            Some(n) => {
                let mut out = Vec::with_capacity(n);
                for i in 0..n {
                    let coerced = args
                        .iter()
                        .enumerate()
                        .map(|(j, v)| {
                            let item = match v {
                                Value::Scalar(ty, val) => {
                                    coerce_val(val, *ty, entry.param(j))?
                                }
                                Value::List(ty, items) => {
                                    coerce_val(&items[i], *ty, entry.param(j))?
                                }
                            };
                            Ok(Value::Scalar(entry.param(j), item))
                        })
                        .collect::<Result<Vec<_>, Error>>()?;
                    match (entry.interpret)(&coerced)? {
                        Value::Scalar(_, val) => out.push(val),
                        Value::List(..) => {
                            return Err(Error::Domain(format!(
                                "'{name}' returned a nested list"
                            )))
                        }
                    }
                }
                Ok(Value::List(entry.ret, out))
            }
        }
    }

    /// Resolves, coerces, and invokes the shader rule
    ///
    /// The same broadcast applies over GLSL arrays; dynamically sized lists
    /// have no shader representation.
    pub fn call_glsl(
        &self,
        name: &str,
        ctx: &mut GlslContext,
        args: &[GlslValue],
    ) -> Result<GlslValue, Error> {
        let tys: Vec<Type> = args.iter().map(|a| a.ty).collect();
        let entry = self.resolve(name, &tys)?;

        let mut len = None;
        for a in args {
            match a.ty.len {
                Multiplicity::Scalar => (),
                Multiplicity::Dynamic => {
                    return Err(Error::unsupported(
                        "dynamically sized lists",
                        Backend::Shader,
                    ))
                }
                Multiplicity::Fixed(n) => match len {
                    None => len = Some(n),
                    Some(m) if m == n => (),
                    Some(m) => {
                        return Err(Error::Coercion(format!(
                            "lists of lengths {m} and {n} to a common length"
                        )))
                    }
                },
            }
        }

        match len {
            None => {
                let coerced = args
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        let p = entry.param(i);
                        Ok(GlslValue::scalar(
                            p,
                            glsl::coerce_expr(&a.expr, a.ty.name, p)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                let expr = (entry.emit)(ctx, &coerced)?;
                Ok(GlslValue::scalar(entry.ret, expr))
            }
            Some(n) => {
                // Bind each list argument so elements can be indexed
                let cached = args
                    .iter()
                    .map(|a| match a.ty.len {
                        Multiplicity::Fixed(_) => ctx.cache(a),
                        _ => Ok(a.expr.clone()),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let base = glsl::scalar_ty(entry.ret)?;
                let mut out = format!("{base}[{n}](");
                for i in 0..n {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let coerced = args
                        .iter()
                        .zip(&cached)
                        .enumerate()
                        .map(|(j, (a, name))| {
                            let p = entry.param(j);
                            let expr = match a.ty.len {
                                Multiplicity::Fixed(_) => {
                                    format!("{name}[{i}]")
                                }
                                _ => a.expr.clone(),
                            };
                            Ok(GlslValue::scalar(
                                p,
                                glsl::coerce_expr(&expr, a.ty.name, p)?,
                            ))
                        })
                        .collect::<Result<Vec<_>, Error>>()?;
                    out.push_str(&(entry.emit)(ctx, &coerced)?);
                }
                out.push(')');
                Ok(GlslValue {
                    ty: Type::fixed(entry.ret, n),
                    expr: out,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Real, Val};

    fn stub(ret: &'static str) -> (InterpretFn, EmitFn) {
        (
            Box::new(|_| Ok(Value::real(Real::ZERO))),
            Box::new(move |_, _| Ok(ret.to_string())),
        )
    }

    #[test]
    fn first_match_wins_over_specificity() {
        let mut reg = Registry::new();
        // A wide entry registered first shadows a narrower one, by policy
        let (i, e) = stub("wide");
        reg.insert("f", Entry::exact(&[TypeName::R32], TypeName::R32, i, e));
        let (i, e) = stub("narrow");
        reg.insert("f", Entry::exact(&[TypeName::R64], TypeName::R64, i, e));

        let entry = reg
            .resolve("f", &[Type::scalar(TypeName::R64)])
            .unwrap();
        assert_eq!(entry.ret, TypeName::R32);
    }

    #[test]
    fn resolution_is_deterministic() {
        let reg = Registry::with_defaults();
        let args = [Type::scalar(TypeName::R64), Type::scalar(TypeName::R64)];
        let a = reg.resolve("+", &args).unwrap() as *const Entry;
        let b = reg.resolve("+", &args).unwrap() as *const Entry;
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_operator() {
        let reg = Registry::new();
        assert!(matches!(
            reg.resolve("nope", &[]),
            Err(Error::UnknownOperator(_))
        ));
    }

    #[test]
    fn no_matching_signature_names_the_types() {
        let mut reg = Registry::new();
        let (i, e) = stub("x");
        reg.insert(
            "+",
            Entry::exact(&[TypeName::R64, TypeName::R64], TypeName::R64, i, e),
        );
        let Err(err) = reg.resolve(
            "+",
            &[
                Type::scalar(TypeName::Matrix),
                Type::scalar(TypeName::Color),
            ],
        ) else {
            panic!("resolution should have failed");
        };
        let msg = err.to_string();
        assert!(msg.contains("matrix") && msg.contains("color"), "{msg}");
    }

    #[test]
    fn variadic_arity_mismatch() {
        let mut reg = Registry::new();
        let (i, e) = stub("x");
        reg.insert("f", Entry::variadic(2, TypeName::R64, TypeName::R64, i, e));
        assert!(matches!(
            reg.resolve("f", &[Type::scalar(TypeName::R64)]),
            Err(Error::ArityMismatch { min: 2, found: 1, .. })
        ));
    }

    #[test]
    fn list_broadcast_zips_equal_lengths() {
        let reg = Registry::with_defaults();
        let a = Value::List(
            TypeName::R64,
            vec![Val::Real(Real::int(1)), Val::Real(Real::int(2))],
        );
        let b = Value::real(Real::int(10));
        let out = reg.call("+", &[a, b]).unwrap();
        assert_eq!(
            out,
            Value::List(
                TypeName::R64,
                vec![Val::Real(Real::int(11)), Val::Real(Real::int(12))]
            )
        );
    }

    #[test]
    fn list_broadcast_rejects_mismatched_lengths() {
        let reg = Registry::with_defaults();
        let a = Value::List(TypeName::R64, vec![Val::Real(Real::int(1))]);
        let b = Value::List(
            TypeName::R64,
            vec![Val::Real(Real::int(1)), Val::Real(Real::int(2))],
        );
        assert!(matches!(
            reg.call("+", &[a, b]),
            Err(Error::Coercion(_))
        ));
    }
}
