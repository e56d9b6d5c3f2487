/**
Abstract Syntax Tree definitions for Quill

This module defines the core AST types representing an already-parsed Quill
program. The checker consumes these values directly; it never touches raw
source text.
*/
pub mod types;

use types::Type;

/// A complete Quill program: extension declarations plus declarations
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Extension names as written in the source, with or without a leading `#`
    pub extensions: Vec<String>,
    pub decls: Vec<Decl>,
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// Function definition; the grammar allows exactly one parameter,
    /// and the checker re-validates that rather than trusting the input
    Fun {
        name: String,
        params: Vec<ParamDecl>,
        ret: Option<Type>,
        body: Expr,
    },

    /// The single global exception payload type
    ExceptionType { ty: Type },

    /// Generic function definition (recognized, unsupported)
    GenericFun {
        name: String,
        type_params: Vec<String>,
        params: Vec<ParamDecl>,
        ret: Option<Type>,
        body: Expr,
    },

    /// Type alias (recognized; accepted as a no-op)
    TypeAlias { name: String, ty: Type },

    /// Open exception variant declaration (recognized; accepted as a no-op)
    ExceptionVariant { label: String, ty: Type },
}

/// A single typed parameter declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: Type,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        ParamDecl {
            name: name.into(),
            ty,
        }
    }
}

/// Expression forms
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Boolean literal
    Bool(bool),

    /// Natural number literal
    Nat(u64),

    /// Unit literal
    Unit,

    /// Bare memory address literal, e.g. `<0x1000>`
    Memory(String),

    /// Variable reference
    Var(String),

    /// Anonymous function; the grammar allows exactly one parameter
    Lambda { params: Vec<ParamDecl>, body: Box<Expr> },

    /// Function application
    Application { callee: Box<Expr>, args: Vec<Expr> },

    /// Conditional
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Expression sequencing; the first expression must have type Unit
    Sequence { first: Box<Expr>, second: Box<Expr> },

    /// Let binding over single-variable patterns
    Let {
        bindings: Vec<PatternBinding>,
        body: Box<Expr>,
    },

    /// Record literal
    Record { bindings: Vec<Binding> },

    /// Record field projection
    FieldAccess { record: Box<Expr>, field: String },

    /// Tuple literal with at least two components
    Tuple { components: Vec<Expr> },

    /// 1-based positional tuple projection
    TupleIndex { tuple: Box<Expr>, index: usize },

    /// List literal
    List { elements: Vec<Expr> },

    /// List cons cell
    ConsList { head: Box<Expr>, tail: Box<Expr> },

    /// Head of a list
    Head(Box<Expr>),

    /// Tail of a list
    Tail(Box<Expr>),

    /// Emptiness test of a list
    IsEmpty(Box<Expr>),

    /// Successor of a natural
    Succ(Box<Expr>),

    /// Predecessor of a natural
    Pred(Box<Expr>),

    /// Zero test of a natural
    IsZero(Box<Expr>),

    /// Structural recursion over naturals: count, base case, step function
    NatRec {
        count: Box<Expr>,
        base: Box<Expr>,
        step: Box<Expr>,
    },

    /// Left injection into a sum type
    Inl(Box<Expr>),

    /// Right injection into a sum type
    Inr(Box<Expr>),

    /// Variant construction with an optional payload
    Variant {
        label: String,
        payload: Option<Box<Expr>>,
    },

    /// Pattern match
    Match {
        scrutinee: Box<Expr>,
        cases: Vec<MatchCase>,
    },

    /// Reference creation
    NewRef(Box<Expr>),

    /// Reference dereference
    Deref(Box<Expr>),

    /// Reference assignment, yielding Unit
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// Throw the exception payload
    Throw(Box<Expr>),

    /// try-catch: the catch pattern binds the exception payload
    TryCatch {
        body: Box<Expr>,
        pattern: Pattern,
        handler: Box<Expr>,
    },

    /// try-with: evaluate the body, fall back to the second expression
    TryWith { body: Box<Expr>, fallback: Box<Expr> },

    /// Fixpoint combinator
    Fix(Box<Expr>),

    /// Abort the program; inhabits any expected type
    Panic,

    /// Type ascription
    Ascribe { expr: Box<Expr>, ty: Type },

    /// Type cast
    Cast { expr: Box<Expr>, ty: Type },
}

/// A named field binding in a record literal
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub expr: Expr,
}

impl Binding {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Binding {
            name: name.into(),
            expr,
        }
    }
}

/// A pattern bound to a value in a let expression
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBinding {
    pub pattern: Pattern,
    pub value: Expr,
}

/// A single case in a match expression
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Expr,
}

/// Pattern forms; patterns never carry types, the matching context
/// supplies them
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Bind the matched value to a name
    Var(String),

    /// Literal `true`
    True,

    /// Literal `false`
    False,

    /// Literal `unit`
    Unit,

    /// Literal natural
    Int(u64),

    /// Successor pattern over a natural
    Succ(Box<Pattern>),

    /// Left injection pattern
    Inl(Box<Pattern>),

    /// Right injection pattern
    Inr(Box<Pattern>),

    /// Fixed-length list pattern; an empty one matches nil
    List(Vec<Pattern>),

    /// Cons pattern
    Cons { head: Box<Pattern>, tail: Box<Pattern> },

    /// Variant label pattern with an optional payload pattern
    Variant {
        label: String,
        payload: Option<Box<Pattern>>,
    },
}
