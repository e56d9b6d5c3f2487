/// Quillc - the type checker for Quill
///
/// This crate implements static checking for Quill, a small extensible
/// statically-typed functional language, including:
/// - Abstract syntax tree (AST) representation
/// - Bidirectional type checking with extension gating
/// - Structural equality and structural subtyping
/// - Pattern matching exhaustiveness checking
pub mod ast;
pub mod typechecker;

pub use ast::types::{RecordFieldType, Type, VariantFieldType};
pub use ast::{Decl, Expr, MatchCase, ParamDecl, Pattern, Program};
pub use typechecker::{ErrorKind, TypeChecker, TypeError, TypeResult, typecheck_program};
