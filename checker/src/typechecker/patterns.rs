/**
Pattern binding and match coverage for Quill

Mutually recursive with the expression rules: case bodies go back through
the expression checker while patterns bind variables into a fresh scope.
Coverage is tracked per scrutinee shape and verified after all cases have
been checked, so a type error in any arm wins over a non-exhaustiveness
report.
*/
use std::collections::HashSet;

use crate::ast::types::Type;
use crate::ast::{Expr, MatchCase, Pattern};
use crate::typechecker::checker::TypeChecker;
use crate::typechecker::compare::variant_field;
use crate::typechecker::context::Extension;
use crate::typechecker::errors::{ErrorKind, TypeError, TypeResult};

impl TypeChecker {
    /// Infer the type of a match expression and verify case coverage
    pub(crate) fn infer_match(&mut self, scrutinee: &Expr, cases: &[MatchCase]) -> TypeResult<Type> {
        if !self.match_extension_enabled() {
            return Err(TypeError::with_detail(
                ErrorKind::ExtensionNotEnabled,
                "match expressions need the sum-types, lists, or variants extension",
            ));
        }
        if cases.is_empty() {
            return Err(TypeError::new(ErrorKind::IllegalEmptyMatching));
        }

        let matched = self.infer(scrutinee)?;
        let mut coverage = Coverage::default();
        let mut result: Option<Type> = None;

        for case in cases {
            let case_ty = self.check_case(case, &matched, &mut coverage)?;
            result = Some(match result {
                None => case_ty,
                Some(current) => self.join_types(current, case_ty)?,
            });
        }

        coverage.ensure_exhaustive(&matched)?;

        result.ok_or_else(|| TypeError::new(ErrorKind::IllegalEmptyMatching))
    }

    /// Check one case: validate the pattern against the scrutinee type,
    /// record what it covers, and infer the body with the pattern's
    /// variables in scope
    fn check_case(
        &mut self,
        case: &MatchCase,
        matched: &Type,
        coverage: &mut Coverage,
    ) -> TypeResult<Type> {
        match &case.pattern {
            Pattern::Var(name) => {
                coverage.wildcard = true;
                self.in_scope(|tc| {
                    tc.env.add_variable(name.clone(), matched.clone());
                    tc.infer(&case.body)
                })
            }

            Pattern::True | Pattern::False => {
                if !matches!(matched, Type::Bool) {
                    return Err(pattern_error(matched));
                }
                if matches!(case.pattern, Pattern::True) {
                    coverage.true_lit = true;
                } else {
                    coverage.false_lit = true;
                }
                self.infer(&case.body)
            }

            Pattern::Inl(inner) => {
                let Type::Sum(left, _) = matched else {
                    return Err(pattern_error(matched));
                };
                coverage.inl = true;
                self.in_scope(|tc| {
                    tc.bind_pattern(inner, left)?;
                    tc.infer(&case.body)
                })
            }

            Pattern::Inr(inner) => {
                let Type::Sum(_, right) = matched else {
                    return Err(pattern_error(matched));
                };
                coverage.inr = true;
                self.in_scope(|tc| {
                    tc.bind_pattern(inner, right)?;
                    tc.infer(&case.body)
                })
            }

            Pattern::List(elements) => {
                let Type::List(elem) = matched else {
                    return Err(pattern_error(matched));
                };
                if elements.is_empty() {
                    coverage.nil = true;
                }
                self.in_scope(|tc| {
                    for pattern in elements {
                        tc.bind_pattern(pattern, elem)?;
                    }
                    tc.infer(&case.body)
                })
            }

            Pattern::Cons { head, tail } => {
                let Type::List(elem) = matched else {
                    return Err(pattern_error(matched));
                };
                coverage.cons = true;
                self.in_scope(|tc| {
                    tc.bind_pattern(head, elem)?;
                    tc.bind_pattern(tail, matched)?;
                    tc.infer(&case.body)
                })
            }

            Pattern::Variant { label, payload } => {
                let Type::Variant(fields) = matched else {
                    return Err(pattern_error(matched));
                };
                let declared = variant_field(fields, label).ok_or_else(|| {
                    TypeError::with_detail(
                        ErrorKind::UnexpectedVariantLabel,
                        format!("label '{}' is not part of {}", label, matched),
                    )
                })?;
                coverage.labels.insert(label.clone());
                let declared = declared.clone();
                self.in_scope(|tc| {
                    match (payload, &declared) {
                        (Some(inner), Some(payload_ty)) => tc.bind_pattern(inner, payload_ty)?,
                        (Some(_), None) => {
                            return Err(TypeError::with_detail(
                                ErrorKind::UnexpectedPatternForType,
                                format!("variant label '{}' does not carry a payload", label),
                            ));
                        }
                        _ => {}
                    }
                    tc.infer(&case.body)
                })
            }

            Pattern::Int(_) | Pattern::Unit | Pattern::Succ(_) => Err(TypeError::with_detail(
                ErrorKind::UnexpectedPatternForType,
                "literal patterns are not allowed as match cases",
            )),
        }
    }

    /// Bind a pattern's variables against the type it is matched with,
    /// into the current scope. Recurses through nested patterns.
    pub(crate) fn bind_pattern(&mut self, pattern: &Pattern, ty: &Type) -> TypeResult<()> {
        match pattern {
            Pattern::Var(name) => {
                self.env.add_variable(name.clone(), ty.clone());
                Ok(())
            }

            Pattern::True | Pattern::False => {
                if matches!(ty, Type::Bool) {
                    Ok(())
                } else {
                    Err(pattern_error(ty))
                }
            }

            Pattern::Unit => {
                if matches!(ty, Type::Unit) {
                    Ok(())
                } else {
                    Err(pattern_error(ty))
                }
            }

            Pattern::Int(_) => {
                if matches!(ty, Type::Nat) {
                    Ok(())
                } else {
                    Err(pattern_error(ty))
                }
            }

            Pattern::Succ(inner) => {
                if !matches!(ty, Type::Nat) {
                    return Err(pattern_error(ty));
                }
                self.bind_pattern(inner, &Type::Nat)
            }

            Pattern::Inl(inner) => {
                let Type::Sum(left, _) = ty else {
                    return Err(pattern_error(ty));
                };
                self.bind_pattern(inner, left)
            }

            Pattern::Inr(inner) => {
                let Type::Sum(_, right) = ty else {
                    return Err(pattern_error(ty));
                };
                self.bind_pattern(inner, right)
            }

            Pattern::List(elements) => {
                let Type::List(elem) = ty else {
                    return Err(pattern_error(ty));
                };
                for pattern in elements {
                    self.bind_pattern(pattern, elem)?;
                }
                Ok(())
            }

            Pattern::Cons { head, tail } => {
                let Type::List(elem) = ty else {
                    return Err(pattern_error(ty));
                };
                self.bind_pattern(head, elem)?;
                self.bind_pattern(tail, ty)
            }

            Pattern::Variant { label, payload } => {
                let Type::Variant(fields) = ty else {
                    return Err(pattern_error(ty));
                };
                let declared = variant_field(fields, label).ok_or_else(|| {
                    TypeError::with_detail(
                        ErrorKind::UnexpectedVariantLabel,
                        format!("label '{}' is not part of {}", label, ty),
                    )
                })?;
                match (payload, declared) {
                    (Some(inner), Some(payload_ty)) => self.bind_pattern(inner, payload_ty),
                    (Some(_), None) => Err(TypeError::with_detail(
                        ErrorKind::UnexpectedPatternForType,
                        format!("variant label '{}' does not carry a payload", label),
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    fn match_extension_enabled(&self) -> bool {
        self.env.has_extension(Extension::SumTypes)
            || self.env.has_extension(Extension::Lists)
            || self.env.has_extension(Extension::Variants)
    }
}

fn pattern_error(matched: &Type) -> Box<TypeError> {
    TypeError::with_detail(
        ErrorKind::UnexpectedPatternForType,
        format!("pattern does not fit {}", matched),
    )
}

/// Which alternatives of the scrutinee the cases have covered so far. A
/// variable pattern covers everything regardless of shape.
#[derive(Default)]
struct Coverage {
    wildcard: bool,
    true_lit: bool,
    false_lit: bool,
    inl: bool,
    inr: bool,
    nil: bool,
    cons: bool,
    labels: HashSet<String>,
}

impl Coverage {
    fn ensure_exhaustive(&self, matched: &Type) -> TypeResult<()> {
        if self.wildcard {
            return Ok(());
        }

        let missing: Vec<String> = match matched {
            Type::Sum(..) => pick_missing(&[("inl", self.inl), ("inr", self.inr)]),
            Type::List(_) => pick_missing(&[("[]", self.nil), ("cons", self.cons)]),
            Type::Bool => pick_missing(&[("true", self.true_lit), ("false", self.false_lit)]),
            Type::Variant(fields) => fields
                .iter()
                .filter(|f| !self.labels.contains(&f.label))
                .map(|f| f.label.clone())
                .collect(),
            // Other scrutinee shapes only admit catch-all patterns
            _ => vec!["_".to_string()],
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TypeError::with_detail(
                ErrorKind::NonExhaustiveMatchPatterns,
                format!("missing cases: {}", missing.join(", ")),
            ))
        }
    }
}

fn pick_missing(flags: &[(&str, bool)]) -> Vec<String> {
    flags
        .iter()
        .filter(|(_, seen)| !*seen)
        .map(|(name, _)| name.to_string())
        .collect()
}
