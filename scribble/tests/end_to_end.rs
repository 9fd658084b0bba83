//! Whole-pipeline scenarios driving both backends through the public API

use scribble::ast::{BinaryOp, CmpOp, Node, Piece};
use scribble::eval::{compile, eval, CompileProps, EvalProps, NODE_BUDGET};
use scribble::glsl::GlslValue;
use scribble::registry::Registry;
use scribble::types::{Real, Type, TypeName, Val, Value};
use scribble::Error;

use approx::assert_relative_eq;
use std::collections::HashMap;

fn interp(node: &Node) -> Result<Value, Error> {
    let reg = Registry::with_defaults();
    eval(&reg, node, &EvalProps::default())
}

fn shader(node: &Node) -> Result<scribble::glsl::ShaderSource, Error> {
    let reg = Registry::with_defaults();
    compile(&reg, node, &CompileProps::default())
}

fn shader_with(
    node: &Node,
    bindings: &[(&str, TypeName)],
) -> Result<scribble::glsl::ShaderSource, Error> {
    let reg = Registry::with_defaults();
    let props = CompileProps {
        base: Real::int(10),
        bindings: bindings
            .iter()
            .map(|(n, t)| (n.to_string(), GlslValue::scalar(*t, *n)))
            .collect(),
    };
    compile(&reg, node, &props)
}

fn point(x: Node, y: Node) -> Node {
    Node::call("point", vec![x, y])
}

#[test]
fn segment_glide_lands_exactly() {
    let node = Node::call(
        "glider",
        vec![
            Node::call(
                "line",
                vec![
                    point(Node::num("2"), Node::num("3")),
                    point(Node::num("7"), Node::num("9")),
                ],
            ),
            Node::num("0.3"),
        ],
    );
    let out = interp(&node).unwrap();
    assert_eq!(
        out,
        Value::point(Real::frac(7, 2), Real::frac(24, 5))
    );
    assert!(!out.is_approx());
}

#[test]
fn circle_glide_is_approximate() {
    // Radius √61, the distance from (2,3) to (7,9)
    let node = Node::call(
        "glider",
        vec![
            Node::call(
                "circle",
                vec![
                    point(Node::num("2"), Node::num("3")),
                    Node::call(
                        "distance",
                        vec![
                            point(Node::num("2"), Node::num("3")),
                            point(Node::num("7"), Node::num("9")),
                        ],
                    ),
                ],
            ),
            Node::num("0.3"),
        ],
    );
    let out = interp(&node).unwrap();
    assert!(out.is_approx());
    let Value::Scalar(TypeName::Point, Val::Point(p)) = out else {
        panic!("wrong shape: {out:?}");
    };
    assert_relative_eq!(p.x.to_f64(), -0.4135, epsilon = 1e-4);
    assert_relative_eq!(p.y.to_f64(), 10.4280, epsilon = 1e-4);
}

#[test]
fn plus_resolves_for_vectors_but_not_matrix_color()  {
    let reg = Registry::with_defaults();
    let vec2 = Type::scalar(TypeName::Vector);
    assert!(reg.resolve("+", &[vec2, vec2]).is_ok());
    assert!(matches!(
        reg.resolve(
            "+",
            &[
                Type::scalar(TypeName::Matrix),
                Type::scalar(TypeName::Color)
            ]
        ),
        Err(Error::NoMatchingSignature { .. })
    ));
}

#[test]
fn repeated_subexpression_is_assigned_once() {
    // (2 + 3i)·(2 + 3i): the complex product binds each operand to a
    // temporary, and both operands share one
    let z = Node::Paren(Box::new(Node::binary(
        BinaryOp::Add,
        Node::num("2"),
        Node::Juxtapose(Box::new(Node::num("3")), Box::new(Node::var("i"))),
    )));
    let node = Node::binary(BinaryOp::Mul, z.clone(), z);
    let src = shader(&node).unwrap();

    // Every temporary is bound exactly once; the second occurrence of the
    // operand reuses the first binding instead of re-emitting it
    let lines: Vec<&str> = src.statements.lines().collect();
    let mut unique = lines.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(lines.len(), unique.len(), "{}", src.statements);

    // Both operands of the product are the same temporary
    let name_end = src
        .result_expr
        .find("_v")
        .map(|s| {
            let tail = &src.result_expr[s..];
            let len = tail
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
                .map_or(tail.len(), |(i, _)| i);
            &tail[..len]
        })
        .unwrap();
    assert!(
        src.result_expr.matches(name_end).count() >= 4,
        "{}",
        src.result_expr
    );
}

#[test]
fn shared_helpers_are_declared_once_per_program() {
    let node = Node::binary(
        BinaryOp::Add,
        Node::binary(BinaryOp::Div, Node::num("1"), Node::var("x")),
        Node::binary(BinaryOp::Div, Node::var("y"), Node::num("2")),
    );
    let src =
        shader_with(&node, &[("x", TypeName::R64), ("y", TypeName::R64)])
            .unwrap();
    assert_eq!(
        src.declarations.matches("vec2 _helper_div_r64").count(),
        1
    );
    assert_eq!(
        src.declarations.matches("vec2 _helper_add_r64").count(),
        1
    );

    // An independent compilation re-declares from scratch
    let other = shader_with(
        &Node::binary(BinaryOp::Div, Node::var("x"), Node::num("3")),
        &[("x", TypeName::R64)],
    )
    .unwrap();
    assert_eq!(
        other.declarations.matches("vec2 _helper_div_r64").count(),
        1
    );
}

fn lt(lhs: Node, rhs: Node) -> Node {
    Node::CmpChain {
        items: vec![lhs, rhs],
        ops: vec![CmpOp::Lt],
    }
}

#[test]
fn piecewise_without_otherwise_assigns_on_every_path() {
    let node = Node::Piecewise(vec![
        Piece {
            value: Node::num("1"),
            condition: Some(lt(Node::var("x"), Node::num("2"))),
        },
        Piece {
            value: Node::num("5"),
            condition: Some(lt(Node::var("x"), Node::num("4"))),
        },
    ]);
    let src = shader_with(&node, &[("x", TypeName::R64)]).unwrap();
    let result = &src.result_expr;

    // Two guarded assignments plus the sentinel on the fall-through path
    let assignments = src
        .statements
        .matches(&format!("{result} = "))
        .count();
    assert_eq!(assignments, 3, "{}", src.statements);
    assert!(src.statements.contains("} else {"));
    assert_eq!(
        src.statements.matches('{').count(),
        src.statements.matches('}').count()
    );
}

#[test]
fn piecewise_with_otherwise_needs_no_sentinel() {
    let node = Node::Piecewise(vec![
        Piece {
            value: Node::num("1"),
            condition: Some(lt(Node::var("x"), Node::num("2"))),
        },
        Piece {
            value: Node::num("5"),
            condition: None,
        },
    ]);
    let src = shader_with(&node, &[("x", TypeName::R64)]).unwrap();
    let result = &src.result_expr;
    assert_eq!(
        src.statements.matches(&format!("{result} = ")).count(),
        2
    );
    assert!(!src.statements.contains("0.0/0.0"), "{}", src.statements);
}

#[test]
fn piecewise_interpretation_is_lazy_and_falls_through_to_nan() {
    let taken = Node::Piecewise(vec![
        Piece {
            value: Node::num("1"),
            condition: Some(lt(Node::num("1"), Node::num("2"))),
        },
        // Would be a domain error if evaluated
        Piece {
            value: Node::binary(BinaryOp::Div, Node::num("1"), Node::num("0")),
            condition: None,
        },
    ]);
    assert_eq!(interp(&taken).unwrap(), Value::real(Real::int(1)));

    let fallthrough = Node::Piecewise(vec![Piece {
        value: Node::num("1"),
        condition: Some(lt(Node::num("2"), Node::num("1"))),
    }]);
    let out = interp(&fallthrough).unwrap();
    let Value::Scalar(_, Val::Real(r)) = out else {
        panic!();
    };
    assert!(r.to_f64().is_nan());
}

/// Walks a statement block line by line, tracking which temporaries are
/// declared in which brace scope, and fails if any temporary is read after
/// its declaring block has closed
fn assert_reads_are_in_scope(statements: &str) {
    let glsl_tys = ["bool", "float", "vec2", "vec3", "vec4"];
    let mut scopes: Vec<Vec<String>> = vec![Vec::new()];
    for line in statements.lines() {
        let line = line.trim();
        if line.starts_with('}') {
            scopes.pop();
        }
        let mut words = line.split_whitespace();
        let declared = match (words.next(), words.next()) {
            (Some(ty), Some(name))
                if glsl_tys.iter().any(|t| ty.starts_with(t))
                    && name.starts_with("_v") =>
            {
                name.trim_end_matches(';').split('[').next().map(String::from)
            }
            _ => None,
        };
        let mut rest = line;
        while let Some(at) = rest.find("_v") {
            let boundary = at == 0
                || !rest[..at]
                    .ends_with(|c: char| c.is_ascii_alphanumeric() || c == '_');
            let tail = &rest[at..];
            let end = tail
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
                .map_or(tail.len(), |(i, _)| i);
            let name = &tail[..end];
            if boundary
                && declared.as_deref() != Some(name)
                && !scopes.iter().any(|s| s.iter().any(|n| n == name))
            {
                panic!("{name} is read out of scope in:\n{statements}");
            }
            rest = &tail[end..];
        }
        if let Some(name) = declared {
            scopes.last_mut().unwrap().push(name);
        }
        if line.ends_with('{') {
            scopes.push(Vec::new());
        }
    }
}

#[test]
fn piecewise_branches_rebind_shared_subexpressions() {
    // The same complex product appears in both branches; each guarded block
    // must bind its own temporaries rather than reading a binding made
    // inside a sibling block
    let z = Node::Paren(Box::new(Node::binary(
        BinaryOp::Add,
        Node::num("2"),
        Node::Juxtapose(Box::new(Node::num("3")), Box::new(Node::var("i"))),
    )));
    let product = Node::binary(BinaryOp::Mul, z.clone(), z);
    let node = Node::Piecewise(vec![
        Piece {
            value: product.clone(),
            condition: Some(lt(Node::var("x"), Node::num("2"))),
        },
        Piece {
            value: product,
            condition: Some(lt(Node::var("x"), Node::num("4"))),
        },
    ]);
    let src = shader_with(&node, &[("x", TypeName::R64)]).unwrap();
    assert_reads_are_in_scope(&src.statements);
    // Both branches still reach the shared multiply helper
    assert!(src.declarations.contains("_helper_mul_r64"));
}

#[test]
fn node_budget_is_enforced() {
    let node = Node::call("total", vec![Node::num("1"); NODE_BUDGET + 1]);
    assert!(matches!(interp(&node), Err(Error::ResourceLimit)));
}

#[test]
fn base_override_applies_to_literals_only() {
    let node = Node::binary(BinaryOp::Base, Node::num("ff"), Node::num("16"));
    assert_eq!(interp(&node).unwrap(), Value::real(Real::int(255)));

    // The base expression itself is always read in base ten
    let nested = Node::binary(
        BinaryOp::Base,
        Node::num("11"),
        Node::binary(BinaryOp::Add, Node::num("8"), Node::num("8")),
    );
    assert_eq!(interp(&nested).unwrap(), Value::real(Real::int(17)));

    // Shader literals resolve the base at compile time
    let src = shader(&node).unwrap();
    assert!(src.result_expr.starts_with("vec2(255."), "{}", src.result_expr);
}

#[test]
fn indexing_is_one_based_with_garbage_out_of_range() {
    let list = Node::List(vec![
        Node::num("10"),
        Node::num("20"),
        Node::num("30"),
    ]);
    let hit = Node::index(list.clone(), Node::num("2"));
    assert_eq!(interp(&hit).unwrap(), Value::real(Real::int(20)));

    let miss = Node::index(list.clone(), Node::num("7"));
    let Value::Scalar(_, Val::Real(r)) = interp(&miss).unwrap() else {
        panic!();
    };
    assert!(r.to_f64().is_nan());

    // The shader backend needs the bound statically and rejects a miss
    let src = shader(&hit).unwrap();
    assert!(src.result_expr.ends_with("[1]"), "{}", src.result_expr);
    assert!(matches!(shader(&miss), Err(Error::Domain(_))));
}

#[test]
fn comparison_chains_conjoin() {
    let chain = Node::CmpChain {
        items: vec![Node::num("1"), Node::num("2"), Node::num("2")],
        ops: vec![CmpOp::Lt, CmpOp::Le],
    };
    assert_eq!(interp(&chain).unwrap(), Value::bool(true));

    let broken = Node::CmpChain {
        items: vec![Node::num("1"), Node::num("2"), Node::num("1")],
        ops: vec![CmpOp::Lt, CmpOp::Le],
    };
    assert_eq!(interp(&broken).unwrap(), Value::bool(false));
}

#[test]
fn variables_resolve_through_bindings_then_constants() {
    let reg = Registry::with_defaults();
    let props = EvalProps {
        base: Real::int(10),
        bindings: HashMap::from([(
            "x".to_string(),
            Value::real(Real::int(4)),
        )]),
    };
    let node = Node::binary(BinaryOp::Add, Node::var("x"), Node::num("1"));
    assert_eq!(
        eval(&reg, &node, &props).unwrap(),
        Value::real(Real::int(5))
    );

    let tau = eval(&reg, &Node::var("τ"), &props).unwrap();
    let Value::Scalar(_, Val::Real(r)) = tau else {
        panic!();
    };
    assert_relative_eq!(r.to_f64(), std::f64::consts::TAU);

    assert!(matches!(
        eval(&reg, &Node::var("nope"), &props),
        Err(Error::UnknownVariable(_))
    ));
}

#[test]
fn superscripted_variables_dispatch_through_pow() {
    let reg = Registry::with_defaults();
    let props = EvalProps {
        base: Real::int(10),
        bindings: HashMap::from([(
            "x".to_string(),
            Value::real(Real::int(3)),
        )]),
    };
    let node = Node::Var {
        name: "x".to_string(),
        sup: Some(Box::new(Node::num("2"))),
    };
    assert_eq!(
        eval(&reg, &node, &props).unwrap(),
        Value::real(Real::int(9))
    );
}

#[test]
fn list_literals_unify_and_broadcast() {
    // A bool among reals unifies the list to r64
    let list = Node::List(vec![
        Node::num("1"),
        Node::CmpChain {
            items: vec![Node::num("1"), Node::num("2")],
            ops: vec![CmpOp::Lt],
        },
    ]);
    let out = interp(&list).unwrap();
    assert_eq!(
        out,
        Value::List(
            TypeName::R64,
            vec![Val::Real(Real::int(1)), Val::Real(Real::ONE)]
        )
    );

    // Elementwise broadcast through a scalar operator
    let sum = Node::binary(
        BinaryOp::Add,
        Node::List(vec![Node::num("1"), Node::num("2")]),
        Node::num("10"),
    );
    assert_eq!(
        interp(&sum).unwrap(),
        Value::List(
            TypeName::R64,
            vec![Val::Real(Real::int(11)), Val::Real(Real::int(12))]
        )
    );
}

#[test]
fn lists_broadcast_through_scalar_rules_in_the_shader() {
    let sum = Node::binary(
        BinaryOp::Add,
        Node::List(vec![Node::num("1"), Node::num("2")]),
        Node::num("10"),
    );
    let src = shader(&sum).unwrap();
    // An element-wise array constructor with one helper call per element
    assert!(src.result_expr.starts_with("vec2[2]("), "{}", src.result_expr);
    assert_eq!(src.result_expr.matches("_helper_add_r64").count(), 2);
}

#[test]
fn empty_list_interprets_but_does_not_compile() {
    let node = Node::List(Vec::new());
    assert_eq!(
        interp(&node).unwrap(),
        Value::List(TypeName::R64, Vec::new())
    );
    assert!(matches!(shader(&node), Err(Error::Unsupported { .. })));
}

#[test]
fn abs_grouping_dispatches_by_type() {
    let real = Node::Abs(Box::new(Node::neg(Node::num("3"))));
    assert_eq!(interp(&real).unwrap(), Value::real(Real::int(3)));

    // |3 + 4i| = 5
    let complex = Node::Abs(Box::new(Node::binary(
        BinaryOp::Add,
        Node::num("3"),
        Node::Juxtapose(Box::new(Node::num("4")), Box::new(Node::var("i"))),
    )));
    let Value::Scalar(_, Val::Real(r)) = interp(&complex).unwrap() else {
        panic!();
    };
    assert_relative_eq!(r.to_f64(), 5.0);
}
