//! The expression tree handed over by the (external) parser
//!
//! The parser guarantees a *well-formed* tree, not a well-typed one; type
//! errors are the evaluator's responsibility.  Nodes are immutable and are
//! consumed read-only by one evaluator invocation.

/// A one-argument operator
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
}

impl UnaryOp {
    /// The registry name this operator dispatches through
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }
}

/// A two-argument operator
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication (explicit `·`)
    Mul,
    /// Division
    Div,
    /// Exponentiation
    Pow,
    /// Logical conjunction
    And,
    /// Logical disjunction
    Or,
    /// Numeric-base override: evaluates the left operand with the base given
    /// by the right operand
    Base,
}

impl BinaryOp {
    /// The registry name this operator dispatches through
    ///
    /// `Base` is handled structurally by the evaluator and never resolved.
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "·",
            BinaryOp::Div => "÷",
            BinaryOp::Pow => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Base => "base",
        }
    }
}

/// A comparison operator, as used in comparison chains
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `≤`
    Le,
    /// `>`
    Gt,
    /// `≥`
    Ge,
    /// `=`
    Eq,
    /// `≠`
    Ne,
}

impl CmpOp {
    /// The registry name this comparison dispatches through
    pub fn name(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "≤",
            CmpOp::Gt => ">",
            CmpOp::Ge => "≥",
            CmpOp::Eq => "=",
            CmpOp::Ne => "≠",
        }
    }
}

/// One branch of a piecewise expression
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    /// The branch value
    pub value: Node,
    /// The guarding condition; `None` marks an "otherwise" branch
    pub condition: Option<Node>,
}

/// A node in the expression tree
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A numeric literal, uninterpreted digits (parsed in the active base)
    Num(String),
    /// A variable reference with an optional exponent suffix
    Var {
        /// Variable name
        name: String,
        /// Pending exponent, applied through the `^` operator
        sup: Option<Box<Node>>,
    },
    /// A unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        arg: Box<Node>,
    },
    /// A binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Node>,
        /// Right operand
        rhs: Box<Node>,
    },
    /// A named function call
    Call {
        /// Function name
        name: String,
        /// Arguments, in order
        args: Vec<Node>,
    },
    /// Implicit multiplication
    Juxtapose(Box<Node>, Box<Node>),
    /// Parenthesized grouping; passes through
    Paren(Box<Node>),
    /// Absolute-value grouping `|x|`
    Abs(Box<Node>),
    /// A list literal `[a, b, c]`
    List(Vec<Node>),
    /// 1-based indexing into a list
    Index {
        /// The list expression
        on: Box<Node>,
        /// The index expression
        index: Box<Node>,
    },
    /// A chained comparison `a < b ≤ c`; `ops.len() + 1 == items.len()`
    CmpChain {
        /// Compared elements
        items: Vec<Node>,
        /// Operators between adjacent elements
        ops: Vec<CmpOp>,
    },
    /// A piecewise expression
    Piecewise(Vec<Piece>),
}

impl Node {
    /// Builds a numeric literal
    pub fn num(s: &str) -> Node {
        Node::Num(s.to_string())
    }

    /// Builds a bare variable reference
    pub fn var(name: &str) -> Node {
        Node::Var {
            name: name.to_string(),
            sup: None,
        }
    }

    /// Builds a binary operation
    pub fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Builds a unary negation
    pub fn neg(arg: Node) -> Node {
        Node::Unary {
            op: UnaryOp::Neg,
            arg: Box::new(arg),
        }
    }

    /// Builds a function call
    pub fn call(name: &str, args: Vec<Node>) -> Node {
        Node::Call {
            name: name.to_string(),
            args,
        }
    }

    /// Builds an index expression
    pub fn index(on: Node, index: Node) -> Node {
        Node::Index {
            on: Box::new(on),
            index: Box::new(index),
        }
    }
}
