/**
Type system definitions for Quill

This module defines the representation of types in the Quill type system.
Types are immutable values compared structurally; the derived `PartialEq`
is syntactic only, semantic equality lives in `typechecker::compare`.
*/
use std::fmt;

/// A type in the Quill type system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Boolean type
    Bool,

    /// Natural number type
    Nat,

    /// Unit type
    Unit,

    /// Supertype of every type under structural subtyping
    Top,

    /// Subtype of every type under structural subtyping
    Bot,

    /// Inference placeholder written as `auto` (recognized, unsupported)
    Auto,

    /// Mutable reference
    Ref(Box<Type>),

    /// Function type; the grammar allows exactly one parameter
    Fun { params: Vec<Type>, ret: Box<Type> },

    /// Tuple type with at least two components
    Tuple(Vec<Type>),

    /// Record type; labels are unique, declaration order carries no meaning
    Record(Vec<RecordFieldType>),

    /// Binary sum type with unnamed alternatives
    Sum(Box<Type>, Box<Type>),

    /// Tagged variant type with labeled, optionally payload-carrying alternatives
    Variant(Vec<VariantFieldType>),

    /// Homogeneous list
    List(Box<Type>),

    /// Universal type (recognized, unsupported)
    ForAll { vars: Vec<String>, body: Box<Type> },

    /// Recursive type (recognized, unsupported)
    Rec { var: String, body: Box<Type> },

    /// Type variable (recognized, unsupported)
    Var(String),
}

/// A single labeled field of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFieldType {
    pub label: String,
    pub ty: Type,
}

/// A single labeled alternative of a variant type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFieldType {
    pub label: String,
    pub ty: Option<Type>,
}

impl Type {
    /// Build a single-parameter function type
    pub fn fun(param: Type, ret: Type) -> Type {
        Type::Fun {
            params: vec![param],
            ret: Box::new(ret),
        }
    }

    /// The sole parameter type of a function type, if this is one
    pub fn fun_param(&self) -> Option<&Type> {
        match self {
            Type::Fun { params, .. } => params.first(),
            _ => None,
        }
    }

    /// The result type of a function type, if this is one
    pub fn fun_ret(&self) -> Option<&Type> {
        match self {
            Type::Fun { ret, .. } => Some(ret),
            _ => None,
        }
    }
}

impl RecordFieldType {
    pub fn new(label: impl Into<String>, ty: Type) -> Self {
        RecordFieldType {
            label: label.into(),
            ty,
        }
    }
}

impl VariantFieldType {
    pub fn new(label: impl Into<String>, ty: Option<Type>) -> Self {
        VariantFieldType {
            label: label.into(),
            ty,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "Bool"),
            Type::Nat => write!(f, "Nat"),
            Type::Unit => write!(f, "Unit"),
            Type::Top => write!(f, "Top"),
            Type::Bot => write!(f, "Bot"),
            Type::Auto => write!(f, "auto"),
            Type::Ref(inner) => write!(f, "&{}", inner),
            Type::Fun { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Tuple(components) => {
                write!(f, "{{")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "}}")
            }
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} : {}", field.label, field.ty)?;
                }
                write!(f, "}}")
            }
            Type::Sum(left, right) => write!(f, "{} + {}", left, right),
            Type::Variant(fields) => {
                write!(f, "<|")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &field.ty {
                        Some(ty) => write!(f, "{} : {}", field.label, ty)?,
                        None => write!(f, "{}", field.label)?,
                    }
                }
                write!(f, "|>")
            }
            Type::List(elem) => write!(f, "[{}]", elem),
            Type::ForAll { vars, body } => {
                write!(f, "forall ")?;
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ". {}", body)
            }
            Type::Rec { var, body } => write!(f, "rec {}. {}", var, body),
            Type::Var(name) => write!(f, "{}", name),
        }
    }
}
