pub mod checker;
/**
Type checker for Quill

This module implements bidirectional type checking with:
- Extension-gated typing rules
- Structural equality and structural subtyping
- Exception type tracking
- Pattern matching exhaustiveness
*/
pub mod compare;
pub mod context;
pub mod errors;
mod patterns;

#[cfg(test)]
mod tests;

pub use checker::TypeChecker;
pub use context::{Context, Extension};
pub use errors::{ErrorKind, TypeError, TypeResult};

/// Check a complete program, reporting the first violation found
pub fn typecheck_program(program: &crate::ast::Program) -> TypeResult<()> {
    TypeChecker::new().check_program(program)
}
