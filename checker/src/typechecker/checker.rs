/**
Core type checker for Quill

Implements the bidirectional dispatch: `infer` computes a type with no
outside hint and fails on inherently ambiguous expressions, `check`
verifies an expression against an expected type and can elaborate
expressions that are ambiguous on their own. Every gated rule consults
the enabled-extension set before applying.
*/
use crate::ast::types::{RecordFieldType, Type, VariantFieldType};
use crate::ast::{Decl, Expr, ParamDecl, Pattern, Program};
use crate::typechecker::compare::{is_subtype, missing_record_fields, record_field, types_equal, variant_field};
use crate::typechecker::context::{Context, Extension};
use crate::typechecker::errors::{ErrorKind, TypeError, TypeResult};

/// The main type checker; one instance checks one program
pub struct TypeChecker {
    pub(crate) env: Context,
}

impl TypeChecker {
    /// Create a new type checker with an empty context
    pub fn new() -> Self {
        TypeChecker {
            env: Context::new(),
        }
    }

    /// Type check a complete program
    ///
    /// Either completes silently or fails with the first violation found:
    /// extensions are registered, then signatures and the exception type
    /// (so forward references resolve), then `main` is required to exist,
    /// then every body is checked against its declared return type.
    pub fn check_program(&mut self, program: &Program) -> TypeResult<()> {
        for name in &program.extensions {
            self.env.enable_extension_by_name(name);
        }

        // Pre-pass: register every signature before any body is checked
        for decl in &program.decls {
            match decl {
                Decl::Fun {
                    name, params, ret, ..
                } => {
                    let sig = Self::function_signature(name, params, ret.as_ref())?;
                    self.env.add_function(name.clone(), sig);
                }
                Decl::ExceptionType { ty } => {
                    ensure_supported(ty)?;
                    self.env.set_exception_type(ty.clone());
                }
                _ => {}
            }
        }

        if !self.env.has_main() {
            return Err(TypeError::new(ErrorKind::MissingMain));
        }

        for decl in &program.decls {
            self.check_decl(decl)?;
        }

        Ok(())
    }

    /// Build the registered signature of a function declaration. A
    /// declaration without exactly one parameter or without an explicit
    /// return type is a shape error, not a type mismatch.
    fn function_signature(
        name: &str,
        params: &[ParamDecl],
        ret: Option<&Type>,
    ) -> TypeResult<Type> {
        if params.len() != 1 {
            return Err(TypeError::with_detail(
                ErrorKind::UnexpectedTypeForParameter,
                format!("function '{}' must declare exactly one parameter", name),
            ));
        }
        let ret = ret.ok_or_else(|| {
            TypeError::with_detail(
                ErrorKind::UnexpectedTypeForParameter,
                format!("function '{}' must declare a return type", name),
            )
        })?;
        ensure_supported(&params[0].ty)?;
        ensure_supported(ret)?;
        Ok(Type::fun(params[0].ty.clone(), ret.clone()))
    }

    /// Type check a single declaration
    fn check_decl(&mut self, decl: &Decl) -> TypeResult<()> {
        match decl {
            Decl::Fun {
                name, params, body, ..
            } => {
                let sig = self.env.lookup_function(name).cloned().ok_or_else(|| {
                    TypeError::with_detail(ErrorKind::UndefinedVariable, format!("'{}'", name))
                })?;
                let (param_ty, ret_ty) = match &sig {
                    Type::Fun { params: ps, ret } if ps.len() == 1 => {
                        (ps[0].clone(), (**ret).clone())
                    }
                    _ => {
                        return Err(TypeError::with_detail(
                            ErrorKind::NotAFunction,
                            format!("'{}'", name),
                        ));
                    }
                };
                let param = params.first().ok_or_else(|| {
                    TypeError::with_detail(
                        ErrorKind::UnexpectedTypeForParameter,
                        format!("function '{}' must declare exactly one parameter", name),
                    )
                })?;

                self.in_scope(|tc| {
                    tc.env.add_variable(param.name.clone(), param_ty);
                    let actual = tc.check(body, &ret_ty)?;
                    tc.expect_compatible(&actual, &ret_ty)
                })
            }

            Decl::ExceptionType { .. } => self.require_extension(
                Extension::ExceptionTypeDeclaration,
                ErrorKind::ExtensionNotEnabled,
            ),

            // No body obligations, accepted as no-ops
            Decl::TypeAlias { .. } | Decl::ExceptionVariant { .. } => Ok(()),

            Decl::GenericFun { name, .. } => Err(TypeError::with_detail(
                ErrorKind::UnsupportedConstruct,
                format!("generic function '{}'", name),
            )),
        }
    }

    /// Infer the type of an expression with no contextual expectation
    pub fn infer(&mut self, expr: &Expr) -> TypeResult<Type> {
        match expr {
            Expr::Bool(_) => Ok(Type::Bool),
            Expr::Nat(_) => Ok(Type::Nat),
            Expr::Unit => Ok(Type::Unit),

            Expr::Memory(_) => Err(TypeError::new(ErrorKind::AmbiguousReferenceType)),

            Expr::Var(name) => self.infer_var(name),

            Expr::Lambda { params, body } => self.infer_lambda(params, body),

            Expr::Application { callee, args } => self.infer_application(callee, args),

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => self.infer_if(cond, then_branch, else_branch),

            Expr::Sequence { first, second } => {
                self.require_extension(Extension::Sequencing, ErrorKind::ExtensionNotEnabled)?;
                let first_ty = self.infer(first)?;
                if !matches!(first_ty, Type::Unit) {
                    return Err(TypeError::mismatch(&Type::Unit, &first_ty));
                }
                self.infer(second)
            }

            Expr::Let { bindings, body } => {
                self.require_extension(Extension::LetBindings, ErrorKind::ExtensionNotEnabled)?;
                self.in_scope(|tc| {
                    for binding in bindings {
                        let Pattern::Var(name) = &binding.pattern else {
                            return Err(TypeError::with_detail(
                                ErrorKind::UnexpectedPatternForType,
                                "let bindings only support single-variable patterns",
                            ));
                        };
                        let ty = tc.infer(&binding.value)?;
                        tc.env.add_variable(name.clone(), ty);
                    }
                    tc.infer(body)
                })
            }

            Expr::Record { bindings } => {
                self.require_extension(Extension::Records, ErrorKind::UnexpectedRecord)?;
                let mut fields: Vec<RecordFieldType> = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    if fields.iter().any(|f| f.label == binding.name) {
                        return Err(TypeError::with_detail(
                            ErrorKind::UnexpectedRecord,
                            format!("duplicate field '{}'", binding.name),
                        ));
                    }
                    let ty = self.infer(&binding.expr)?;
                    fields.push(RecordFieldType::new(binding.name.clone(), ty));
                }
                Ok(Type::Record(fields))
            }

            Expr::FieldAccess { record, field } => {
                self.require_extension(Extension::Records, ErrorKind::NotARecord)?;
                let ty = self.infer(record)?;
                let Type::Record(fields) = &ty else {
                    return Err(TypeError::with_detail(
                        ErrorKind::NotARecord,
                        format!("expected a record, but got {}", ty),
                    ));
                };
                record_field(fields, field).cloned().ok_or_else(|| {
                    TypeError::with_detail(
                        ErrorKind::UnexpectedFieldAccess,
                        format!("no field '{}' in {}", field, ty),
                    )
                })
            }

            Expr::Tuple { components } => {
                self.require_extension(Extension::Tuples, ErrorKind::UnexpectedTuple)?;
                if components.len() < 2 {
                    return Err(TypeError::with_detail(
                        ErrorKind::UnexpectedTuple,
                        "a tuple needs at least two components",
                    ));
                }
                let mut tys = Vec::with_capacity(components.len());
                for component in components {
                    tys.push(self.infer(component)?);
                }
                Ok(Type::Tuple(tys))
            }

            Expr::TupleIndex { tuple, index } => {
                self.require_extension(Extension::Tuples, ErrorKind::NotATuple)?;
                let ty = self.infer(tuple)?;
                let Type::Tuple(components) = &ty else {
                    return Err(TypeError::with_detail(
                        ErrorKind::NotATuple,
                        format!("expected a tuple, but got {}", ty),
                    ));
                };
                // Projection indices are 1-based
                if *index == 0 || *index > components.len() {
                    return Err(TypeError::with_detail(
                        ErrorKind::TupleIndexOutOfBounds,
                        format!(
                            "index {} into a tuple of {} components",
                            index,
                            components.len()
                        ),
                    ));
                }
                Ok(components[*index - 1].clone())
            }

            Expr::List { elements } => {
                self.require_extension(Extension::Lists, ErrorKind::UnexpectedList)?;
                let mut iter = elements.iter();
                let Some(first) = iter.next() else {
                    return Err(TypeError::new(ErrorKind::AmbiguousListType));
                };
                let mut elem_ty = self.infer(first)?;
                for element in iter {
                    let next = self.infer(element)?;
                    elem_ty = self.join_types(elem_ty, next)?;
                }
                Ok(Type::List(Box::new(elem_ty)))
            }

            Expr::ConsList { head, tail } => {
                self.require_extension(Extension::Lists, ErrorKind::UnexpectedList)?;
                let head_ty = self.infer(head)?;
                let tail_ty = self.infer(tail)?;
                let Type::List(elem) = &tail_ty else {
                    return Err(TypeError::with_detail(
                        ErrorKind::NotAList,
                        format!("cons tail must be a list, but got {}", tail_ty),
                    ));
                };
                self.expect_compatible(&head_ty, elem)?;
                Ok(tail_ty.clone())
            }

            Expr::Head(list) => {
                let (_, elem) = self.check_list_operand(list)?;
                Ok(elem)
            }
            Expr::Tail(list) => {
                let (list_ty, _) = self.check_list_operand(list)?;
                Ok(list_ty)
            }
            Expr::IsEmpty(list) => {
                self.check_list_operand(list)?;
                Ok(Type::Bool)
            }

            Expr::Succ(arg) | Expr::Pred(arg) => {
                let ty = self.infer(arg)?;
                if !matches!(ty, Type::Nat) {
                    return Err(TypeError::mismatch(&Type::Nat, &ty));
                }
                Ok(Type::Nat)
            }

            Expr::IsZero(arg) => {
                let ty = self.infer(arg)?;
                if !matches!(ty, Type::Nat) {
                    return Err(TypeError::mismatch(&Type::Nat, &ty));
                }
                Ok(Type::Bool)
            }

            Expr::NatRec { count, base, step } => self.infer_nat_rec(count, base, step),

            Expr::Inl(_) | Expr::Inr(_) => {
                self.require_extension(Extension::SumTypes, ErrorKind::UnexpectedInjection)?;
                Err(TypeError::new(ErrorKind::AmbiguousSumType))
            }

            Expr::Variant { .. } => {
                self.require_extension(Extension::Variants, ErrorKind::UnexpectedVariant)?;
                Err(TypeError::new(ErrorKind::AmbiguousVariantType))
            }

            Expr::Match { scrutinee, cases } => self.infer_match(scrutinee, cases),

            Expr::NewRef(inner) => {
                self.require_extension(Extension::References, ErrorKind::ExtensionNotEnabled)?;
                let ty = self.infer(inner)?;
                Ok(Type::Ref(Box::new(ty)))
            }

            Expr::Deref(inner) => {
                self.require_extension(Extension::References, ErrorKind::NotAReference)?;
                let ty = self.infer(inner)?;
                match ty {
                    Type::Ref(pointee) => Ok(*pointee),
                    other => Err(TypeError::with_detail(
                        ErrorKind::NotAReference,
                        format!("cannot dereference {}", other),
                    )),
                }
            }

            Expr::Assign { target, value } => {
                self.require_extension(Extension::References, ErrorKind::NotAReference)?;
                let target_ty = self.infer(target)?;
                let Type::Ref(pointee) = &target_ty else {
                    return Err(TypeError::with_detail(
                        ErrorKind::NotAReference,
                        format!("cannot assign into {}", target_ty),
                    ));
                };
                let value_ty = self.infer(value)?;
                self.expect_compatible(&value_ty, pointee)?;
                Ok(Type::Unit)
            }

            Expr::Throw(payload) => {
                self.check_throw(payload)?;
                // A well-formed throw still has no type of its own
                Err(TypeError::new(ErrorKind::AmbiguousThrowType))
            }

            Expr::TryCatch {
                body,
                pattern,
                handler,
            } => {
                self.require_extension(Extension::Exceptions, ErrorKind::ExceptionTypeNotDeclared)?;
                let exception_ty = self.exception_type_or_err()?;
                let body_ty = self.infer(body)?;
                let handler_ty = self.in_scope(|tc| {
                    tc.bind_pattern(pattern, &exception_ty)?;
                    tc.infer(handler)
                })?;
                self.join_types(body_ty, handler_ty)
            }

            Expr::TryWith { body, fallback } => {
                self.require_extension(Extension::Exceptions, ErrorKind::ExceptionTypeNotDeclared)?;
                self.exception_type_or_err()?;
                let body_ty = self.infer(body)?;
                let fallback_ty = self.infer(fallback)?;
                self.join_types(body_ty, fallback_ty)
            }

            Expr::Fix(inner) => {
                self.require_extension(
                    Extension::FixpointCombinator,
                    ErrorKind::ExtensionNotEnabled,
                )?;
                let ty = self.infer(inner)?;
                let (param, ret) = match &ty {
                    Type::Fun { params, ret } if params.len() == 1 => (&params[0], ret.as_ref()),
                    _ => {
                        return Err(TypeError::with_detail(
                            ErrorKind::NotAFunction,
                            format!("fix expects a function, but got {}", ty),
                        ));
                    }
                };
                if self.subtyping() {
                    if !is_subtype(param, ret) && !is_subtype(ret, param) {
                        return Err(TypeError::subtype_mismatch(param, ret));
                    }
                } else if !types_equal(param, ret) {
                    return Err(TypeError::mismatch(param, ret));
                }
                Ok(param.clone())
            }

            Expr::Panic => {
                self.require_extension(Extension::Panic, ErrorKind::ExtensionNotEnabled)?;
                Err(TypeError::new(ErrorKind::AmbiguousPanicType))
            }

            Expr::Ascribe { expr, ty } => {
                self.require_extension(Extension::TypeAscriptions, ErrorKind::ExtensionNotEnabled)?;
                ensure_supported(ty)?;
                let actual = self.check(expr, ty)?;
                self.expect_compatible(&actual, ty)?;
                Ok(ty.clone())
            }

            Expr::Cast { expr, ty } => {
                self.require_extension(Extension::TypeCast, ErrorKind::ExtensionNotEnabled)?;
                ensure_supported(ty)?;
                let actual = self.infer(expr)?;
                // Casts are one-directional overrides; under subtyping the
                // two types must at least be related in some direction
                if self.subtyping() && !is_subtype(&actual, ty) && !is_subtype(ty, &actual) {
                    return Err(TypeError::with_detail(
                        ErrorKind::UnexpectedTypeForExpression,
                        format!("cannot cast {} to {}", actual, ty),
                    ));
                }
                Ok(ty.clone())
            }
        }
    }

    /// Check an expression against an expected type, elaborating
    /// expressions whose type is ambiguous without context
    pub fn check(&mut self, expr: &Expr, expected: &Type) -> TypeResult<Type> {
        match (expr, expected) {
            (Expr::Inl(inner), Type::Sum(left, _)) => {
                self.require_extension(Extension::SumTypes, ErrorKind::UnexpectedInjection)?;
                let actual = self.check(inner, left)?;
                self.expect_compatible(&actual, left)?;
                Ok(expected.clone())
            }

            (Expr::Inr(inner), Type::Sum(_, right)) => {
                self.require_extension(Extension::SumTypes, ErrorKind::UnexpectedInjection)?;
                let actual = self.check(inner, right)?;
                self.expect_compatible(&actual, right)?;
                Ok(expected.clone())
            }

            (Expr::List { elements }, Type::List(elem_ty)) => {
                self.require_extension(Extension::Lists, ErrorKind::UnexpectedList)?;
                for element in elements {
                    let actual = self.check(element, elem_ty)?;
                    self.expect_compatible(&actual, elem_ty)?;
                }
                Ok(expected.clone())
            }

            (Expr::Record { bindings }, Type::Record(expected_fields)) => {
                self.require_extension(Extension::Records, ErrorKind::UnexpectedRecord)?;
                let mut fields: Vec<RecordFieldType> = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    if fields.iter().any(|f| f.label == binding.name) {
                        return Err(TypeError::with_detail(
                            ErrorKind::UnexpectedRecord,
                            format!("duplicate field '{}'", binding.name),
                        ));
                    }
                    // a declared field supplies a per-field hint, extra
                    // fields are inferred on their own
                    let ty = match record_field(expected_fields, &binding.name) {
                        Some(hint) => {
                            let actual = self.check(&binding.expr, hint)?;
                            self.expect_compatible(&actual, hint)?;
                            actual
                        }
                        None => self.infer(&binding.expr)?,
                    };
                    fields.push(RecordFieldType::new(binding.name.clone(), ty));
                }
                let elaborated = Type::Record(fields);
                self.expect_compatible(&elaborated, expected)?;
                Ok(elaborated)
            }

            (Expr::Variant { label, payload }, Type::Variant(fields)) => {
                self.check_variant(label, payload.as_deref(), fields, expected)
            }

            (Expr::Memory(_), Type::Ref(_)) => {
                self.require_extension(Extension::References, ErrorKind::ExtensionNotEnabled)?;
                Ok(expected.clone())
            }
            (Expr::Memory(_), _) => Err(TypeError::with_detail(
                ErrorKind::UnexpectedMemoryAddress,
                format!("a memory address cannot have type {}", expected),
            )),

            (
                Expr::If {
                    cond,
                    then_branch,
                    else_branch,
                },
                _,
            ) => self.check_if(cond, then_branch, else_branch, expected),

            (Expr::Lambda { params, body }, Type::Fun { .. }) => {
                self.check_lambda(params, body, expected)
            }

            (Expr::Panic, _) => {
                self.require_extension(Extension::Panic, ErrorKind::ExtensionNotEnabled)?;
                Ok(expected.clone())
            }

            (Expr::TryWith { body, fallback }, _) => {
                self.require_extension(Extension::Exceptions, ErrorKind::ExceptionTypeNotDeclared)?;
                self.exception_type_or_err()?;
                self.check(body, expected)?;
                self.check(fallback, expected)?;
                Ok(expected.clone())
            }

            (Expr::Throw(payload), _) => {
                self.check_throw(payload)?;
                Ok(expected.clone())
            }

            _ => {
                let actual = self.infer(expr)?;
                self.expect_compatible(&actual, expected)?;
                Ok(actual)
            }
        }
    }

    /// Resolve a variable: built-ins first, then scopes, then globals
    fn infer_var(&mut self, name: &str) -> TypeResult<Type> {
        match name {
            "Nat::iszero" => return Ok(Type::fun(Type::Nat, Type::Bool)),
            // The remaining built-ins are polymorphic and only resolve at
            // application sites; a bare occurrence has no single type.
            "Nat::rec" | "List::head" | "List::tail" | "List::isempty" => {
                return Err(TypeError::with_detail(
                    ErrorKind::UndefinedVariable,
                    format!("built-in '{}' cannot be used as a bare value", name),
                ));
            }
            _ => {}
        }

        self.env
            .lookup_variable(name)
            .or_else(|| self.env.lookup_function(name))
            .cloned()
            .ok_or_else(|| {
                TypeError::with_detail(ErrorKind::UndefinedVariable, format!("'{}'", name))
            })
    }

    fn infer_lambda(&mut self, params: &[ParamDecl], body: &Expr) -> TypeResult<Type> {
        let param = Self::single_param(params)?;
        ensure_supported(&param.ty)?;
        let param_ty = param.ty.clone();
        let body_ty = self.in_scope(|tc| {
            tc.env.add_variable(param.name.clone(), param.ty.clone());
            tc.infer(body)
        })?;
        Ok(Type::fun(param_ty, body_ty))
    }

    /// Check a lambda against an expected function type: the declared
    /// parameter is bound and the body is checked against the expected
    /// result, returning the refined function type
    fn check_lambda(
        &mut self,
        params: &[ParamDecl],
        body: &Expr,
        expected: &Type,
    ) -> TypeResult<Type> {
        let param = Self::single_param(params)?;
        ensure_supported(&param.ty)?;
        let Type::Fun {
            ret: expected_ret, ..
        } = expected
        else {
            return Err(TypeError::with_detail(
                ErrorKind::NotAFunction,
                format!("unexpected lambda where {} is expected", expected),
            ));
        };
        let param_ty = param.ty.clone();
        let body_ty = self.in_scope(|tc| {
            tc.env.add_variable(param.name.clone(), param.ty.clone());
            tc.check(body, expected_ret)
        })?;
        Ok(Type::fun(param_ty, body_ty))
    }

    /// Generic and built-in application; the built-ins have fixed arities
    /// checked before the generic one-argument rule applies
    fn infer_application(&mut self, callee: &Expr, args: &[Expr]) -> TypeResult<Type> {
        if let Expr::Var(name) = callee {
            match name.as_str() {
                "List::head" => {
                    let arg = Self::single_arg(name, args)?;
                    let (_, elem) = self.check_list_operand(arg)?;
                    return Ok(elem);
                }
                "List::tail" => {
                    let arg = Self::single_arg(name, args)?;
                    let (list_ty, _) = self.check_list_operand(arg)?;
                    return Ok(list_ty);
                }
                "List::isempty" => {
                    let arg = Self::single_arg(name, args)?;
                    self.check_list_operand(arg)?;
                    return Ok(Type::Bool);
                }
                "Nat::iszero" => {
                    let arg = Self::single_arg(name, args)?;
                    let ty = self.infer(arg)?;
                    if !matches!(ty, Type::Nat) {
                        return Err(TypeError::mismatch(&Type::Nat, &ty));
                    }
                    return Ok(Type::Bool);
                }
                "Nat::rec" => {
                    let [count, base, step] = args else {
                        return Err(TypeError::with_detail(
                            ErrorKind::UnexpectedTypeForExpression,
                            "Nat::rec takes exactly three arguments",
                        ));
                    };
                    return self.infer_nat_rec(count, base, step);
                }
                _ => {}
            }
        }

        let fun_ty = self.infer(callee)?;
        let Type::Fun { params, ret } = &fun_ty else {
            return Err(TypeError::with_detail(
                ErrorKind::NotAFunction,
                format!("cannot apply {}", fun_ty),
            ));
        };
        let [expected_arg] = params.as_slice() else {
            return Err(TypeError::with_detail(
                ErrorKind::UnexpectedTypeForParameter,
                "functions take exactly one parameter",
            ));
        };
        let [arg] = args else {
            return Err(TypeError::with_detail(
                ErrorKind::UnexpectedTypeForExpression,
                "applications take exactly one argument",
            ));
        };

        let arg_ty = self.check(arg, expected_arg)?;
        self.expect_compatible(&arg_ty, expected_arg)?;
        Ok((**ret).clone())
    }

    fn infer_if(
        &mut self,
        cond: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> TypeResult<Type> {
        let cond_ty = self.infer(cond)?;
        if !matches!(cond_ty, Type::Bool) {
            return Err(TypeError::mismatch(&Type::Bool, &cond_ty));
        }

        // panic inhabits any type, so a single panic branch takes the
        // other branch's inferred type
        let then_is_panic = matches!(then_branch, Expr::Panic);
        let else_is_panic = matches!(else_branch, Expr::Panic);
        if then_is_panic && !else_is_panic {
            let ty = self.infer(else_branch)?;
            self.check(then_branch, &ty)?;
            return Ok(ty);
        }
        if else_is_panic && !then_is_panic {
            let ty = self.infer(then_branch)?;
            self.check(else_branch, &ty)?;
            return Ok(ty);
        }

        let then_ty = self.infer(then_branch)?;
        let else_ty = self.infer(else_branch)?;
        self.join_types(then_ty, else_ty)
    }

    fn check_if(
        &mut self,
        cond: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
        expected: &Type,
    ) -> TypeResult<Type> {
        let cond_ty = self.infer(cond)?;
        if !matches!(cond_ty, Type::Bool) {
            return Err(TypeError::mismatch(&Type::Bool, &cond_ty));
        }
        let then_ty = self.check(then_branch, expected)?;
        let else_ty = self.check(else_branch, expected)?;
        self.expect_compatible(&then_ty, expected)?;
        self.expect_compatible(&else_ty, expected)?;
        Ok(expected.clone())
    }

    fn check_variant(
        &mut self,
        label: &str,
        payload: Option<&Expr>,
        fields: &[VariantFieldType],
        expected: &Type,
    ) -> TypeResult<Type> {
        self.require_extension(Extension::Variants, ErrorKind::UnexpectedVariant)?;
        let declared = variant_field(fields, label).ok_or_else(|| {
            TypeError::with_detail(
                ErrorKind::UnexpectedVariantLabel,
                format!("label '{}' is not part of {}", label, expected),
            )
        })?;

        match (payload, declared) {
            (Some(expr), Some(payload_ty)) => {
                let actual = self.check(expr, payload_ty)?;
                self.expect_compatible(&actual, payload_ty)?;
            }
            (Some(_), None) => {
                return Err(TypeError::with_detail(
                    ErrorKind::UnexpectedTypeForExpression,
                    format!("variant label '{}' does not carry a payload", label),
                ));
            }
            (None, Some(payload_ty)) => {
                return Err(TypeError::with_detail(
                    ErrorKind::UnexpectedTypeForExpression,
                    format!(
                        "variant label '{}' requires a payload of type {}",
                        label, payload_ty
                    ),
                ));
            }
            (None, None) => {}
        }

        Ok(expected.clone())
    }

    /// Structural recursion: count must be Nat, the step must have type
    /// fn(Nat) -> fn(Z) -> Z, and Z must agree with the base case
    fn infer_nat_rec(&mut self, count: &Expr, base: &Expr, step: &Expr) -> TypeResult<Type> {
        let count_ty = self.infer(count)?;
        if !matches!(count_ty, Type::Nat) {
            return Err(TypeError::mismatch(&Type::Nat, &count_ty));
        }

        let base_ty = self.infer(base)?;
        let step_ty = self.infer(step)?;

        let (step_param, step_ret) = match &step_ty {
            Type::Fun { params, ret } if params.len() == 1 => (&params[0], ret.as_ref()),
            _ => {
                return Err(TypeError::with_detail(
                    ErrorKind::NotAFunction,
                    format!("Nat::rec step must be a function, but got {}", step_ty),
                ));
            }
        };
        if !matches!(step_param, Type::Nat) {
            return Err(TypeError::mismatch(&Type::Nat, step_param));
        }

        let (inner_param, inner_ret) = match step_ret {
            Type::Fun { params, ret } if params.len() == 1 => (&params[0], ret.as_ref()),
            _ => {
                return Err(TypeError::with_detail(
                    ErrorKind::NotAFunction,
                    format!("Nat::rec step must return a function, but got {}", step_ret),
                ));
            }
        };

        if self.subtyping() {
            if !is_subtype(&base_ty, inner_param) || !is_subtype(inner_ret, &base_ty) {
                return Err(TypeError::subtype_mismatch(inner_param, &base_ty));
            }
        } else if !types_equal(&base_ty, inner_param) || !types_equal(&base_ty, inner_ret) {
            return Err(TypeError::mismatch(inner_param, &base_ty));
        }

        Ok(base_ty)
    }

    /// Gate and shape-check a throw's payload against the declared
    /// exception type
    fn check_throw(&mut self, payload: &Expr) -> TypeResult<()> {
        self.require_extension(Extension::Exceptions, ErrorKind::ExceptionTypeNotDeclared)?;
        let exception_ty = self.exception_type_or_err()?;
        let thrown = self.infer(payload)?;
        self.expect_compatible(&thrown, &exception_ty)
    }

    /// Gate and infer a list operand, returning the list type and its
    /// element type
    fn check_list_operand(&mut self, expr: &Expr) -> TypeResult<(Type, Type)> {
        self.require_extension(Extension::Lists, ErrorKind::NotAList)?;
        let ty = self.infer(expr)?;
        match ty {
            Type::List(ref elem) => {
                let elem = (**elem).clone();
                Ok((ty, elem))
            }
            other => Err(TypeError::with_detail(
                ErrorKind::NotAList,
                format!("expected a list, but got {}", other),
            )),
        }
    }

    /// Verify that an actual type satisfies an expected one, under
    /// whichever comparison family the run uses. Failing record shapes
    /// get the more actionable missing-fields diagnostic.
    pub(crate) fn expect_compatible(&self, actual: &Type, expected: &Type) -> TypeResult<()> {
        if self.subtyping() {
            if is_subtype(actual, expected) {
                return Ok(());
            }
            if let Some(missing) = record_subtype_gap(actual, expected) {
                return Err(TypeError::with_detail(
                    ErrorKind::MissingRecordFields,
                    format!("missing required fields: {}", missing.join(", ")),
                ));
            }
            Err(TypeError::subtype_mismatch(expected, actual))
        } else if types_equal(actual, expected) {
            Ok(())
        } else {
            Err(TypeError::mismatch(expected, actual))
        }
    }

    /// Combine the types of two alternative branches, taking the looser
    /// common type under subtyping
    pub(crate) fn join_types(&self, a: Type, b: Type) -> TypeResult<Type> {
        if self.subtyping() {
            if is_subtype(&a, &b) {
                Ok(b)
            } else if is_subtype(&b, &a) {
                Ok(a)
            } else {
                Err(TypeError::subtype_mismatch(&a, &b))
            }
        } else if types_equal(&a, &b) {
            Ok(a)
        } else {
            Err(TypeError::mismatch(&a, &b))
        }
    }

    /// Run a sub-check inside a fresh scope; the scope is popped on every
    /// exit path, including failures
    pub(crate) fn in_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> TypeResult<T>,
    ) -> TypeResult<T> {
        self.env.push_scope();
        let result = f(self);
        self.env.pop_scope();
        result
    }

    pub(crate) fn require_extension(&self, ext: Extension, kind: ErrorKind) -> TypeResult<()> {
        if self.env.has_extension(ext) {
            Ok(())
        } else {
            Err(TypeError::with_detail(
                kind,
                format!("the '{}' extension is not enabled", ext),
            ))
        }
    }

    pub(crate) fn subtyping(&self) -> bool {
        self.env.has_extension(Extension::StructuralSubtyping)
    }

    fn exception_type_or_err(&self) -> TypeResult<Type> {
        self.env
            .exception_type()
            .cloned()
            .ok_or_else(|| TypeError::new(ErrorKind::ExceptionTypeNotDeclared))
    }

    fn single_param(params: &[ParamDecl]) -> TypeResult<&ParamDecl> {
        match params {
            [param] => Ok(param),
            _ => Err(TypeError::with_detail(
                ErrorKind::UnexpectedTypeForParameter,
                format!("expected exactly one parameter, but got {}", params.len()),
            )),
        }
    }

    fn single_arg<'a>(name: &str, args: &'a [Expr]) -> TypeResult<&'a Expr> {
        match args {
            [arg] => Ok(arg),
            _ => Err(TypeError::with_detail(
                ErrorKind::UnexpectedTypeForExpression,
                format!("{} takes exactly one argument", name),
            )),
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject declared types carrying recognized-but-unsupported forms, so
/// "not yet supported" stays distinguishable from "ill-typed"
pub(crate) fn ensure_supported(ty: &Type) -> TypeResult<()> {
    match ty {
        Type::Bool | Type::Nat | Type::Unit | Type::Top | Type::Bot => Ok(()),
        Type::Auto => Err(TypeError::with_detail(
            ErrorKind::UnsupportedConstruct,
            "the auto type placeholder is not supported",
        )),
        Type::Ref(inner) | Type::List(inner) => ensure_supported(inner),
        Type::Fun { params, ret } => {
            for param in params {
                ensure_supported(param)?;
            }
            ensure_supported(ret)
        }
        Type::Tuple(components) => components.iter().try_for_each(ensure_supported),
        Type::Record(fields) => fields.iter().try_for_each(|f| ensure_supported(&f.ty)),
        Type::Sum(left, right) => {
            ensure_supported(left)?;
            ensure_supported(right)
        }
        Type::Variant(fields) => fields
            .iter()
            .filter_map(|f| f.ty.as_ref())
            .try_for_each(ensure_supported),
        Type::ForAll { .. } => Err(TypeError::with_detail(
            ErrorKind::UnsupportedConstruct,
            "universal types are not supported",
        )),
        Type::Rec { .. } => Err(TypeError::with_detail(
            ErrorKind::UnsupportedConstruct,
            "recursive types are not supported",
        )),
        Type::Var(name) => Err(TypeError::with_detail(
            ErrorKind::UnsupportedConstruct,
            format!("type variable '{}' is not supported", name),
        )),
    }
}

/// When two record shapes (directly, or as the single parameters of two
/// function types) fail to relate, report the labels the actual shape is
/// missing instead of a bare subtype error
fn record_subtype_gap(actual: &Type, expected: &Type) -> Option<Vec<String>> {
    let (actual, expected) = match (actual, expected) {
        (Type::Record(_), Type::Record(_)) => (actual, expected),
        (Type::Fun { params: ap, .. }, Type::Fun { params: ep, .. }) => {
            // Parameters are contravariant: the expected function's
            // parameter record must supply what the actual one requires
            match (ap.first(), ep.first()) {
                (Some(a @ Type::Record(_)), Some(e @ Type::Record(_))) => (e, a),
                _ => return None,
            }
        }
        _ => return None,
    };
    match (actual, expected) {
        (Type::Record(actual_fields), Type::Record(expected_fields)) => {
            let missing = missing_record_fields(actual_fields, expected_fields);
            if missing.is_empty() { None } else { Some(missing) }
        }
        _ => None,
    }
}
