/// Integration tests for the type checker
use super::*;
use crate::ast::types::{RecordFieldType, Type, VariantFieldType};
use crate::ast::{Binding, Decl, Expr, MatchCase, ParamDecl, Pattern, PatternBinding, Program};

fn program(extensions: &[&str], decls: Vec<Decl>) -> Program {
    Program {
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        decls,
    }
}

fn fun(name: &str, param: &str, param_ty: Type, ret: Type, body: Expr) -> Decl {
    Decl::Fun {
        name: name.to_string(),
        params: vec![ParamDecl::new(param, param_ty)],
        ret: Some(ret),
        body,
    }
}

/// Single-function program: `fn main(n : Nat) -> ret { body }`
fn main_program(extensions: &[&str], ret: Type, body: Expr) -> Program {
    program(extensions, vec![fun("main", "n", Type::Nat, ret, body)])
}

fn var(name: &str) -> Expr {
    Expr::Var(name.to_string())
}

fn apply(callee: Expr, arg: Expr) -> Expr {
    Expr::Application {
        callee: Box::new(callee),
        args: vec![arg],
    }
}

fn lambda(param: &str, param_ty: Type, body: Expr) -> Expr {
    Expr::Lambda {
        params: vec![ParamDecl::new(param, param_ty)],
        body: Box::new(body),
    }
}

fn case(pattern: Pattern, body: Expr) -> MatchCase {
    MatchCase { pattern, body }
}

fn match_expr(scrutinee: Expr, cases: Vec<MatchCase>) -> Expr {
    Expr::Match {
        scrutinee: Box::new(scrutinee),
        cases,
    }
}

fn record(fields: Vec<(&str, Expr)>) -> Expr {
    Expr::Record {
        bindings: fields
            .into_iter()
            .map(|(name, expr)| Binding::new(name, expr))
            .collect(),
    }
}

fn record_ty(fields: Vec<(&str, Type)>) -> Type {
    Type::Record(
        fields
            .into_iter()
            .map(|(label, ty)| RecordFieldType::new(label, ty))
            .collect(),
    )
}

fn check(program: &Program) -> TypeResult<()> {
    typecheck_program(program)
}

fn check_err(program: &Program) -> ErrorKind {
    check(program).unwrap_err().kind()
}

#[test]
fn test_minimal_program() {
    let prog = main_program(&[], Type::Nat, Expr::Succ(Box::new(var("n"))));
    assert!(check(&prog).is_ok());
}

#[test]
fn test_missing_main() {
    let prog = program(&[], vec![fun("helper", "n", Type::Nat, Type::Nat, var("n"))]);
    assert_eq!(check_err(&prog), ErrorKind::MissingMain);
}

#[test]
fn test_unknown_extension_names_are_ignored() {
    let prog = main_program(&["#frobnicate"], Type::Nat, var("n"));
    assert!(check(&prog).is_ok());
}

#[test]
fn test_undefined_variable_in_body() {
    let prog = main_program(&[], Type::Nat, var("unknown"));
    assert_eq!(check_err(&prog), ErrorKind::UndefinedVariable);
}

#[test]
fn test_return_type_mismatch() {
    let prog = main_program(&[], Type::Bool, Expr::Succ(Box::new(var("n"))));
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_functions_resolve_regardless_of_order() {
    // main calls a function declared after it
    let prog = program(
        &[],
        vec![
            fun("main", "n", Type::Nat, Type::Bool, apply(var("zero"), var("n"))),
            fun("zero", "n", Type::Nat, Type::Bool, Expr::IsZero(Box::new(var("n")))),
        ],
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_application_of_non_function() {
    let prog = main_program(&[], Type::Nat, apply(Expr::Nat(1), var("n")));
    assert_eq!(check_err(&prog), ErrorKind::NotAFunction);
}

#[test]
fn test_argument_type_mismatch() {
    let prog = program(
        &[],
        vec![
            fun("negate", "b", Type::Bool, Type::Bool, var("b")),
            fun("main", "n", Type::Nat, Type::Bool, apply(var("negate"), var("n"))),
        ],
    );
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_lambda_checked_against_return_type() {
    let prog = main_program(
        &[],
        Type::fun(Type::Nat, Type::Nat),
        lambda("x", Type::Nat, Expr::Succ(Box::new(var("x")))),
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_if_branches_must_agree() {
    let body = Expr::If {
        cond: Box::new(Expr::IsZero(Box::new(var("n")))),
        then_branch: Box::new(Expr::Nat(0)),
        else_branch: Box::new(Expr::Bool(true)),
    };
    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_if_condition_must_be_bool() {
    let body = Expr::If {
        cond: Box::new(var("n")),
        then_branch: Box::new(Expr::Nat(0)),
        else_branch: Box::new(Expr::Nat(1)),
    };
    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_nat_rec() {
    // doubling via structural recursion
    let step = lambda(
        "i",
        Type::Nat,
        lambda(
            "acc",
            Type::Nat,
            Expr::Succ(Box::new(Expr::Succ(Box::new(var("acc"))))),
        ),
    );
    let body = Expr::NatRec {
        count: Box::new(var("n")),
        base: Box::new(Expr::Nat(0)),
        step: Box::new(step),
    };
    let prog = main_program(&[], Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_nat_rec_step_shape() {
    let body = Expr::NatRec {
        count: Box::new(var("n")),
        base: Box::new(Expr::Nat(0)),
        step: Box::new(Expr::Nat(1)),
    };
    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotAFunction);
}

// --- extension gating ---

#[test]
fn test_record_literal_requires_extension() {
    let body = record(vec![("a", var("n"))]);
    let prog = main_program(&[], record_ty(vec![("a", Type::Nat)]), body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedRecord);
}

#[test]
fn test_let_requires_extension() {
    let body = Expr::Let {
        bindings: vec![PatternBinding {
            pattern: Pattern::Var("x".to_string()),
            value: var("n"),
        }],
        body: Box::new(var("x")),
    };
    let prog = main_program(&[], Type::Nat, body.clone());
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);

    let prog = main_program(&["#let-bindings"], Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_sequencing() {
    let body = Expr::Sequence {
        first: Box::new(Expr::Unit),
        second: Box::new(var("n")),
    };
    let prog = main_program(&["#sequencing"], Type::Nat, body.clone());
    assert!(check(&prog).is_ok());

    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);

    // the first expression of a sequence must be Unit
    let body = Expr::Sequence {
        first: Box::new(Expr::Nat(0)),
        second: Box::new(var("n")),
    };
    let prog = main_program(&["#sequencing"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

// --- records ---

#[test]
fn test_record_field_access() {
    let body = Expr::FieldAccess {
        record: Box::new(record(vec![("a", var("n")), ("b", Expr::Bool(true))])),
        field: "a".to_string(),
    };
    let prog = main_program(&["#records"], Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_record_unknown_field() {
    let body = Expr::FieldAccess {
        record: Box::new(record(vec![("a", var("n"))])),
        field: "b".to_string(),
    };
    let prog = main_program(&["#records"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedFieldAccess);
}

#[test]
fn test_field_access_on_non_record() {
    let body = Expr::FieldAccess {
        record: Box::new(var("n")),
        field: "a".to_string(),
    };
    let prog = main_program(&["#records"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotARecord);
}

#[test]
fn test_record_duplicate_field() {
    let body = record(vec![("a", var("n")), ("a", Expr::Nat(0))]);
    let prog = main_program(&["#records"], record_ty(vec![("a", Type::Nat)]), body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedRecord);
}

// --- tuples ---

#[test]
fn test_tuple_projection() {
    let body = Expr::TupleIndex {
        tuple: Box::new(Expr::Tuple {
            components: vec![var("n"), Expr::Bool(true)],
        }),
        index: 1,
    };
    let prog = main_program(&["#tuples"], Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_pairs_alias_enables_tuples() {
    let body = Expr::TupleIndex {
        tuple: Box::new(Expr::Tuple {
            components: vec![var("n"), Expr::Bool(true)],
        }),
        index: 2,
    };
    let prog = main_program(&["#pairs"], Type::Bool, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_tuple_index_out_of_bounds() {
    let tuple = Expr::Tuple {
        components: vec![var("n"), Expr::Bool(true)],
    };
    for index in [0, 3] {
        let body = Expr::TupleIndex {
            tuple: Box::new(tuple.clone()),
            index,
        };
        let prog = main_program(&["#tuples"], Type::Nat, body);
        assert_eq!(check_err(&prog), ErrorKind::TupleIndexOutOfBounds);
    }
}

// --- lists ---

#[test]
fn test_empty_list_is_ambiguous() {
    let body = Expr::List { elements: vec![] };
    let prog = main_program(&["#lists"], Type::List(Box::new(Type::Nat)), body);
    // flows through the checking rule against [Nat], so it elaborates
    assert!(check(&prog).is_ok());

    // but with no expected element type there is nothing to elaborate from
    let body = Expr::Head(Box::new(Expr::List { elements: vec![] }));
    let prog = main_program(&["#lists"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::AmbiguousListType);
}

#[test]
fn test_heterogeneous_list() {
    let body = Expr::List {
        elements: vec![var("n"), Expr::Bool(true)],
    };
    let prog = main_program(&["#lists"], Type::List(Box::new(Type::Nat)), body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_list_builtins() {
    let list = Expr::ConsList {
        head: Box::new(var("n")),
        tail: Box::new(Expr::List {
            elements: vec![Expr::Nat(0)],
        }),
    };
    let head = apply(var("List::head"), list.clone());
    let prog = main_program(&["#lists"], Type::Nat, head);
    assert!(check(&prog).is_ok());

    let empty = apply(var("List::isempty"), list.clone());
    let prog = main_program(&["#lists"], Type::Bool, empty);
    assert!(check(&prog).is_ok());

    let tail = apply(var("List::tail"), list);
    let prog = main_program(&["#lists"], Type::List(Box::new(Type::Nat)), tail);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_head_of_non_list() {
    let body = Expr::Head(Box::new(var("n")));
    let prog = main_program(&["#lists"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotAList);
}

// --- sums and match ---

fn sum_nat_bool() -> Type {
    Type::Sum(Box::new(Type::Nat), Box::new(Type::Bool))
}

#[test]
fn test_injection_needs_expected_type() {
    let body = Expr::Inl(Box::new(var("n")));
    let prog = main_program(&["#sum-types"], sum_nat_bool(), body.clone());
    assert!(check(&prog).is_ok());

    // inferring the same injection has no second summand to pick
    let body = Expr::Head(Box::new(Expr::List {
        elements: vec![body],
    }));
    let prog = main_program(&["#sum-types", "#lists"], sum_nat_bool(), body);
    assert_eq!(check_err(&prog), ErrorKind::AmbiguousSumType);
}

#[test]
fn test_match_on_sum() {
    let body = match_expr(
        var("s"),
        vec![
            case(
                Pattern::Inl(Box::new(Pattern::Var("x".to_string()))),
                var("x"),
            ),
            case(Pattern::Inr(Box::new(Pattern::Var("b".to_string()))), Expr::Nat(0)),
        ],
    );
    let prog = program(
        &["#sum-types"],
        vec![fun("main", "s", sum_nat_bool(), Type::Nat, body)],
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_match_missing_inr() {
    let body = match_expr(
        var("s"),
        vec![case(
            Pattern::Inl(Box::new(Pattern::Var("x".to_string()))),
            var("x"),
        )],
    );
    let prog = program(
        &["#sum-types"],
        vec![fun("main", "s", sum_nat_bool(), Type::Nat, body)],
    );
    assert_eq!(check_err(&prog), ErrorKind::NonExhaustiveMatchPatterns);
}

#[test]
fn test_empty_match() {
    let body = match_expr(var("s"), vec![]);
    let prog = program(
        &["#sum-types"],
        vec![fun("main", "s", sum_nat_bool(), Type::Nat, body)],
    );
    assert_eq!(check_err(&prog), ErrorKind::IllegalEmptyMatching);
}

#[test]
fn test_match_catch_all_is_exhaustive() {
    let body = match_expr(
        var("s"),
        vec![case(Pattern::Var("whole".to_string()), Expr::Nat(0))],
    );
    let prog = program(
        &["#sum-types"],
        vec![fun("main", "s", sum_nat_bool(), Type::Nat, body)],
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_match_on_bool_literals() {
    let body = match_expr(
        Expr::IsZero(Box::new(var("n"))),
        vec![
            case(Pattern::True, Expr::Nat(1)),
            case(Pattern::False, Expr::Nat(0)),
        ],
    );
    let prog = main_program(&["#sum-types"], Type::Nat, body.clone());
    assert!(check(&prog).is_ok());

    let body = match_expr(
        Expr::IsZero(Box::new(var("n"))),
        vec![case(Pattern::True, Expr::Nat(1))],
    );
    let prog = main_program(&["#sum-types"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NonExhaustiveMatchPatterns);
}

#[test]
fn test_match_on_list_shapes() {
    let scrutinee = Expr::List {
        elements: vec![var("n")],
    };
    let exhaustive = match_expr(
        scrutinee.clone(),
        vec![
            case(Pattern::List(vec![]), Expr::Nat(0)),
            case(
                Pattern::Cons {
                    head: Box::new(Pattern::Var("h".to_string())),
                    tail: Box::new(Pattern::Var("t".to_string())),
                },
                var("h"),
            ),
        ],
    );
    let prog = main_program(&["#lists"], Type::Nat, exhaustive);
    assert!(check(&prog).is_ok());

    let partial = match_expr(scrutinee, vec![case(Pattern::List(vec![]), Expr::Nat(0))]);
    let prog = main_program(&["#lists"], Type::Nat, partial);
    assert_eq!(check_err(&prog), ErrorKind::NonExhaustiveMatchPatterns);
}

#[test]
fn test_match_pattern_shape_mismatch() {
    let body = match_expr(
        var("n"),
        vec![case(
            Pattern::Inl(Box::new(Pattern::Var("x".to_string()))),
            Expr::Nat(0),
        )],
    );
    let prog = main_program(&["#sum-types"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedPatternForType);
}

#[test]
fn test_match_requires_extension() {
    let body = match_expr(
        Expr::IsZero(Box::new(var("n"))),
        vec![case(Pattern::Var("b".to_string()), Expr::Nat(0))],
    );
    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);
}

// --- variants ---

fn option_nat() -> Type {
    Type::Variant(vec![
        VariantFieldType::new("some", Some(Type::Nat)),
        VariantFieldType::new("none", None),
    ])
}

fn variant(label: &str, payload: Option<Expr>) -> Expr {
    Expr::Variant {
        label: label.to_string(),
        payload: payload.map(Box::new),
    }
}

#[test]
fn test_variant_construction() {
    let prog = main_program(&["#variants"], option_nat(), variant("some", Some(var("n"))));
    assert!(check(&prog).is_ok());

    let prog = main_program(&["#variants"], option_nat(), variant("none", None));
    assert!(check(&prog).is_ok());
}

#[test]
fn test_variant_unknown_label() {
    let prog = main_program(&["#variants"], option_nat(), variant("other", None));
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedVariantLabel);
}

#[test]
fn test_variant_payload_arity() {
    // payload where none is declared
    let prog = main_program(
        &["#variants"],
        option_nat(),
        variant("none", Some(var("n"))),
    );
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);

    // missing declared payload
    let prog = main_program(&["#variants"], option_nat(), variant("some", None));
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_match_on_variant_labels() {
    let exhaustive = match_expr(
        var("o"),
        vec![
            case(
                Pattern::Variant {
                    label: "some".to_string(),
                    payload: Some(Box::new(Pattern::Var("x".to_string()))),
                },
                var("x"),
            ),
            case(
                Pattern::Variant {
                    label: "none".to_string(),
                    payload: None,
                },
                Expr::Nat(0),
            ),
        ],
    );
    let prog = program(
        &["#variants"],
        vec![fun("main", "o", option_nat(), Type::Nat, exhaustive)],
    );
    assert!(check(&prog).is_ok());

    let partial = match_expr(
        var("o"),
        vec![case(
            Pattern::Variant {
                label: "some".to_string(),
                payload: Some(Box::new(Pattern::Var("x".to_string()))),
            },
            var("x"),
        )],
    );
    let prog = program(
        &["#variants"],
        vec![fun("main", "o", option_nat(), Type::Nat, partial)],
    );
    assert_eq!(check_err(&prog), ErrorKind::NonExhaustiveMatchPatterns);
}

// --- references ---

#[test]
fn test_reference_round_trip() {
    let body = Expr::Deref(Box::new(Expr::NewRef(Box::new(var("n")))));
    let prog = main_program(&["#references"], Type::Nat, body.clone());
    assert!(check(&prog).is_ok());

    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotAReference);
}

#[test]
fn test_assignment_type() {
    let assign = |value| Expr::Assign {
        target: Box::new(Expr::NewRef(Box::new(var("n")))),
        value: Box::new(value),
    };
    let body = Expr::Sequence {
        first: Box::new(assign(Expr::Nat(0))),
        second: Box::new(var("n")),
    };
    let prog = main_program(&["#references", "#sequencing"], Type::Nat, body);
    assert!(check(&prog).is_ok());

    let body = Expr::Sequence {
        first: Box::new(assign(Expr::Bool(true))),
        second: Box::new(var("n")),
    };
    let prog = main_program(&["#references", "#sequencing"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_deref_non_reference() {
    let body = Expr::Deref(Box::new(var("n")));
    let prog = main_program(&["#references"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotAReference);
}

#[test]
fn test_bare_memory_address() {
    let addr = Expr::Memory("0x1000".to_string());
    let prog = main_program(
        &["#references"],
        Type::Ref(Box::new(Type::Nat)),
        addr.clone(),
    );
    assert!(check(&prog).is_ok());

    // against a non-reference expectation the address is meaningless
    let prog = main_program(&["#references"], Type::Nat, addr);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedMemoryAddress);
}

// --- exceptions ---

fn with_exception_type(extensions: &[&str], exc: Type, ret: Type, body: Expr) -> Program {
    program(
        extensions,
        vec![
            Decl::ExceptionType { ty: exc },
            fun("main", "n", Type::Nat, ret, body),
        ],
    )
}

const EXC_EXTS: &[&str] = &["#exceptions", "#exception-type-declaration"];

#[test]
fn test_throw_against_expected_type() {
    let prog = with_exception_type(
        EXC_EXTS,
        Type::Nat,
        Type::Bool,
        Expr::Throw(Box::new(var("n"))),
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_throw_payload_mismatch() {
    let prog = with_exception_type(
        EXC_EXTS,
        Type::Nat,
        Type::Bool,
        Expr::Throw(Box::new(Expr::Bool(true))),
    );
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_throw_without_declared_exception_type() {
    let prog = main_program(&["#exceptions"], Type::Nat, Expr::Throw(Box::new(var("n"))));
    assert_eq!(check_err(&prog), ErrorKind::ExceptionTypeNotDeclared);
}

#[test]
fn test_exception_declaration_requires_extension() {
    let prog = with_exception_type(&["#exceptions"], Type::Nat, Type::Nat, var("n"));
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);
}

#[test]
fn test_try_catch_binds_payload() {
    let body = Expr::TryCatch {
        body: Box::new(var("n")),
        pattern: Pattern::Var("e".to_string()),
        handler: Box::new(var("e")),
    };
    let prog = with_exception_type(EXC_EXTS, Type::Nat, Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_try_with_joins_both_arms() {
    let body = Expr::TryWith {
        body: Box::new(var("n")),
        fallback: Box::new(Expr::Nat(0)),
    };
    let prog = with_exception_type(EXC_EXTS, Type::Nat, Type::Nat, body.clone());
    assert!(check(&prog).is_ok());

    let prog = with_exception_type(EXC_EXTS, Type::Nat, Type::Bool, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

// --- panic and fix ---

#[test]
fn test_panic_takes_expected_type() {
    let prog = main_program(&["#panic"], Type::Nat, Expr::Panic);
    assert!(check(&prog).is_ok());

    let prog = main_program(&[], Type::Nat, Expr::Panic);
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);
}

#[test]
fn test_if_with_panic_branch() {
    let body = Expr::Succ(Box::new(Expr::If {
        cond: Box::new(Expr::IsZero(Box::new(var("n")))),
        then_branch: Box::new(Expr::Nat(1)),
        else_branch: Box::new(Expr::Panic),
    }));
    let prog = main_program(&["#panic"], Type::Nat, body);
    assert!(check(&prog).is_ok());
}

#[test]
fn test_fixpoint() {
    let body = Expr::Fix(Box::new(lambda("x", Type::Nat, var("x"))));
    let prog = main_program(&["#fixpoint-combinator"], Type::Nat, body.clone());
    assert!(check(&prog).is_ok());

    let prog = main_program(&[], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::ExtensionNotEnabled);

    let body = Expr::Fix(Box::new(var("n")));
    let prog = main_program(&["#fixpoint-combinator"], Type::Nat, body);
    assert_eq!(check_err(&prog), ErrorKind::NotAFunction);
}

// --- ascription and cast ---

#[test]
fn test_ascription() {
    let body = Expr::Ascribe {
        expr: Box::new(Expr::Inl(Box::new(var("n")))),
        ty: sum_nat_bool(),
    };
    let prog = main_program(&["#type-ascriptions", "#sum-types"], sum_nat_bool(), body);
    assert!(check(&prog).is_ok());

    let body = Expr::Ascribe {
        expr: Box::new(var("n")),
        ty: Type::Bool,
    };
    let prog = main_program(&["#type-ascriptions"], Type::Bool, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_cast() {
    let body = Expr::Cast {
        expr: Box::new(var("n")),
        ty: Type::Bool,
    };
    // without subtyping a cast is an unchecked coercion
    let prog = main_program(&["#type-cast"], Type::Bool, body.clone());
    assert!(check(&prog).is_ok());

    // under subtyping the two types must be related in some direction
    let prog = main_program(&["#type-cast", "#structural-subtyping"], Type::Bool, body);
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);

    let body = Expr::Cast {
        expr: Box::new(var("n")),
        ty: Type::Top,
    };
    let prog = main_program(&["#type-cast", "#structural-subtyping"], Type::Top, body);
    assert!(check(&prog).is_ok());
}

// --- structural subtyping ---

#[test]
fn test_record_width_subtyping() {
    let wide = record(vec![("a", var("n")), ("b", Expr::Bool(true))]);
    let prog = program(
        &["#records", "#structural-subtyping"],
        vec![
            fun(
                "first",
                "r",
                record_ty(vec![("a", Type::Nat)]),
                Type::Nat,
                Expr::FieldAccess {
                    record: Box::new(var("r")),
                    field: "a".to_string(),
                },
            ),
            fun("main", "n", Type::Nat, Type::Nat, apply(var("first"), wide.clone())),
        ],
    );
    assert!(check(&prog).is_ok());

    // without subtyping the same call is a plain mismatch
    let prog = program(
        &["#records"],
        vec![
            fun(
                "first",
                "r",
                record_ty(vec![("a", Type::Nat)]),
                Type::Nat,
                Expr::FieldAccess {
                    record: Box::new(var("r")),
                    field: "a".to_string(),
                },
            ),
            fun("main", "n", Type::Nat, Type::Nat, apply(var("first"), wide)),
        ],
    );
    assert_eq!(check_err(&prog), ErrorKind::UnexpectedTypeForExpression);
}

#[test]
fn test_missing_record_fields_diagnostic() {
    let narrow = record(vec![("b", Expr::Bool(true))]);
    let prog = program(
        &["#records", "#structural-subtyping"],
        vec![
            fun(
                "first",
                "r",
                record_ty(vec![("a", Type::Nat)]),
                Type::Nat,
                Expr::FieldAccess {
                    record: Box::new(var("r")),
                    field: "a".to_string(),
                },
            ),
            fun("main", "n", Type::Nat, Type::Nat, apply(var("first"), narrow)),
        ],
    );
    let err = check(&prog).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRecordFields);
    assert!(err.detail().is_some_and(|d| d.contains('a')));
}

#[test]
fn test_top_accepts_anything() {
    let prog = program(
        &["#structural-subtyping"],
        vec![
            fun("discard", "x", Type::Top, Type::Nat, Expr::Nat(0)),
            fun("main", "n", Type::Nat, Type::Nat, apply(var("discard"), var("n"))),
        ],
    );
    assert!(check(&prog).is_ok());
}

#[test]
fn test_function_parameter_contravariance() {
    // a consumer of {a} works wherever a consumer of {a, b} is expected
    let wide_param = record_ty(vec![("a", Type::Nat), ("b", Type::Bool)]);
    let narrow_param = record_ty(vec![("a", Type::Nat)]);
    let body = Expr::Ascribe {
        expr: Box::new(lambda(
            "r",
            narrow_param,
            Expr::FieldAccess {
                record: Box::new(var("r")),
                field: "a".to_string(),
            },
        )),
        ty: Type::fun(wide_param.clone(), Type::Nat),
    };
    let prog = main_program(
        &["#records", "#structural-subtyping", "#type-ascriptions"],
        Type::fun(wide_param, Type::Nat),
        body,
    );
    assert!(check(&prog).is_ok());
}

// --- determinism ---

#[test]
fn test_repeated_runs_agree() {
    let prog = main_program(&["#references"], Type::Nat, Expr::Deref(Box::new(Expr::NewRef(Box::new(var("n"))))));
    assert!(check(&prog).is_ok());
    assert!(check(&prog).is_ok());

    let bad = main_program(&[], Type::Nat, var("missing"));
    assert_eq!(check_err(&bad), check_err(&bad));
}
