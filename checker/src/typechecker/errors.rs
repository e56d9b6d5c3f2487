/**
Type checking errors for Quill

Every violation is one kind from a closed enumeration plus an optional
human-readable detail string. Nothing here aborts the process; callers
decide how to report a failure.
*/
use crate::ast::types::Type;
use std::fmt;
use thiserror::Error;

// Box the error type to reduce stack size (clippy::result_large_err)
pub type TypeResult<T> = Result<T, Box<TypeError>>;

/// The closed set of violation kinds, each with a fixed base message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    // Program shape
    #[error("a program is missing a main function")]
    MissingMain,
    #[error("unexpected parameter or return shape for a function")]
    UnexpectedTypeForParameter,

    // General mismatches
    #[error("type of an expression does not match the expected type")]
    UnexpectedTypeForExpression,
    #[error("undefined variable in an expression")]
    UndefinedVariable,
    #[error("unexpected expression where a function is expected")]
    NotAFunction,

    // Sum types
    #[error("cannot typecheck a sum-type expression because the other half of the type is unknown")]
    AmbiguousSumType,
    #[error("unexpected injection into a sum type")]
    UnexpectedInjection,
    #[error("match-expression does not cover all cases of the matched type")]
    NonExhaustiveMatchPatterns,
    #[error("match-expression does not have any patterns")]
    IllegalEmptyMatching,
    #[error("pattern in a match-expression does not fit the matched type")]
    UnexpectedPatternForType,

    // Lists
    #[error("cannot typecheck a list expression because the type of its elements is unknown")]
    AmbiguousListType,
    #[error("unexpected expression where a list is expected")]
    NotAList,
    #[error("unexpected list where a non-list type is expected")]
    UnexpectedList,

    // Memory and references
    #[error("bare memory address found without an expected type")]
    AmbiguousReferenceType,
    #[error("panic expression found without an expected type")]
    AmbiguousPanicType,
    #[error("attempted to assign to or dereference a non-reference")]
    NotAReference,
    #[error("unexpected memory address literal")]
    UnexpectedMemoryAddress,

    // Records
    #[error("record is missing one or more required fields")]
    MissingRecordFields,
    #[error("unexpected record where a non-record type is expected")]
    UnexpectedRecord,
    #[error("unexpected expression where a record is expected")]
    NotARecord,
    #[error("attempted to access a field that is not present in the record")]
    UnexpectedFieldAccess,

    // Exceptions
    #[error("exception mechanism used without a globally declared exception type")]
    ExceptionTypeNotDeclared,
    #[error("cannot infer the type of a throw expression")]
    AmbiguousThrowType,

    // Tuples
    #[error("unexpected tuple where a non-tuple type is expected")]
    UnexpectedTuple,
    #[error("tuple index is out of bounds")]
    TupleIndexOutOfBounds,
    #[error("unexpected expression where a tuple is expected")]
    NotATuple,

    // Subtyping and variants
    #[error("unexpected subtype during structural subtype checking")]
    UnexpectedSubtype,
    #[error("cannot infer the type of a variant without an expected type")]
    AmbiguousVariantType,
    #[error("variant label does not match any label of the expected variant type")]
    UnexpectedVariantLabel,
    #[error("unexpected variant where a non-variant type is expected")]
    UnexpectedVariant,

    // Dialect gating and unimplemented forms
    #[error("construct requires a language extension that is not enabled")]
    ExtensionNotEnabled,
    #[error("construct is recognized but not supported by this checker")]
    UnsupportedConstruct,
}

/// A single typed failure: the kind plus an optional detail string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    kind: ErrorKind,
    detail: Option<String>,
}

impl TypeError {
    pub fn new(kind: ErrorKind) -> Box<TypeError> {
        Box::new(TypeError { kind, detail: None })
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Box<TypeError> {
        Box::new(TypeError {
            kind,
            detail: Some(detail.into()),
        })
    }

    /// Mismatch between an expected and an actual type under strict equality
    pub fn mismatch(expected: &Type, actual: &Type) -> Box<TypeError> {
        TypeError::with_detail(
            ErrorKind::UnexpectedTypeForExpression,
            format!("expected {}, but got {}", expected, actual),
        )
    }

    /// Mismatch between an expected and an actual type under subtyping
    pub fn subtype_mismatch(expected: &Type, actual: &Type) -> Box<TypeError> {
        TypeError::with_detail(
            ErrorKind::UnexpectedSubtype,
            format!("{} is not a subtype of {}", actual, expected),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.kind, detail),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for TypeError {}
