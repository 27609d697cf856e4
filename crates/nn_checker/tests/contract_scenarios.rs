// End-to-end null-contract scenarios over hand-built syntax and models.
use nn_ast::{
    Argument, BinaryOp, ConstructorDecl, ConstructorInitializer, Expression, InitializerKind,
    Literal, MemberDecl, MethodBody, MethodDecl, Modifiers, Program, RefKind, Span, Statement,
    TypeDecl,
};
use nn_checker::{Diagnostic, DiagnosticKind, NullContractChecker};
use nn_semantics::{MethodSymbol, ParameterSymbol, SemanticModel, SemanticModelBuilder};

fn sp(line: usize, from: usize, to: usize) -> Span {
    Span::new(line, from, line, to)
}

fn ident(name: &str, span: Span) -> Expression {
    Expression::Identifier(name.into(), span)
}

fn null_at(span: Span) -> Expression {
    Expression::Literal(Literal::Null, span)
}

fn method_member(name: &str, body: MethodBody, span: Span) -> MemberDecl {
    MemberDecl::Method(MethodDecl {
        name: name.into(),
        parameters: Vec::new(),
        return_ty: None,
        body: Some(body),
        modifiers: Modifiers::default(),
        span,
    })
}

fn program_of(member: MemberDecl) -> Program {
    let span = member.span().clone();
    Program {
        declarations: vec![TypeDecl {
            name: "Sample".into(),
            members: vec![member],
            modifiers: Modifiers::default(),
            span: span.clone(),
        }],
        span,
    }
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

/// `[NotNull] string f() { return null; }`
#[test]
fn returning_null_from_an_annotated_method_is_a_null_assignment() {
    let decl_span = sp(1, 0, 60);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("f").with_attributes(["NotNull"]));
    builder.bind_declaration(decl_span.clone(), method);
    let model = builder.build();

    let body = MethodBody::Block(vec![Statement::Return {
        value: Some(null_at(sp(2, 11, 15))),
        span: sp(2, 4, 16),
    }]);
    let program = program_of(method_member("f", body, decl_span));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::NullAssignment]);
    assert_eq!(diagnostics[0].span, sp(2, 11, 15));
}

/// `void g([NotNull] string s) { if (s != null) Use(s); }`
fn guarded_annotated_parameter_program(name: &str) -> (SemanticModel, Program, Span) {
    let decl_span = sp(1, 0, 60);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("g"));
    let parameter =
        builder.add_parameter(ParameterSymbol::new(name).with_attributes(["NotNull"]));
    builder.set_parameters(method, vec![parameter]);
    builder.bind_declaration(decl_span.clone(), method);
    builder.bind_symbol(sp(2, 8, 9), parameter);
    builder.bind_symbol(sp(3, 8, 9), parameter);
    let model = builder.build();

    let check_span = sp(2, 8, 17);
    let condition = Expression::Binary {
        left: Box::new(ident(name, sp(2, 8, 9))),
        op: BinaryOp::NotEqual,
        right: Box::new(null_at(sp(2, 13, 17))),
        span: check_span.clone(),
    };
    let use_call = Statement::Expression {
        expr: Expression::Invocation {
            callee: Box::new(ident("Use", sp(3, 4, 7))),
            args: vec![Argument::positional(ident(name, sp(3, 8, 9)))],
            span: sp(3, 4, 10),
        },
        span: sp(3, 4, 11),
    };
    let body = MethodBody::Block(vec![Statement::If {
        condition,
        then_branch: Box::new(use_call),
        else_branch: None,
        span: sp(2, 4, 40),
    }]);
    let program = program_of(method_member("g", body, decl_span));
    (model, program, check_span)
}

#[test]
fn null_checking_an_annotated_parameter_is_unneeded() {
    let (model, program, check_span) = guarded_annotated_parameter_program("s");
    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnneededNullCheck]);
    assert_eq!(diagnostics[0].span, check_span);
}

/// `void h(string s) { Constraint.NotNull(s); s = MaybeNullGetter(); }`
#[test]
fn reassignment_after_a_constraint_is_reported() {
    let decl_span = sp(1, 0, 70);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("h"));
    let parameter = builder.add_parameter(ParameterSymbol::new("s"));
    builder.set_parameters(method, vec![parameter]);
    builder.bind_declaration(decl_span.clone(), method);
    builder.bind_symbol(sp(2, 23, 24), parameter);
    builder.bind_symbol(sp(3, 4, 5), parameter);
    let model = builder.build();

    let constraint = Statement::Expression {
        expr: Expression::Invocation {
            callee: Box::new(Expression::MemberAccess {
                receiver: Box::new(ident("Constraint", sp(2, 4, 14))),
                name: "NotNull".into(),
                span: sp(2, 4, 22),
            }),
            args: vec![Argument::positional(ident("s", sp(2, 23, 24)))],
            span: sp(2, 4, 25),
        },
        span: sp(2, 4, 26),
    };
    let reassign_span = sp(3, 4, 26);
    let reassign = Statement::Expression {
        expr: Expression::Assignment {
            target: Box::new(ident("s", sp(3, 4, 5))),
            value: Box::new(Expression::Invocation {
                callee: Box::new(ident("MaybeNullGetter", sp(3, 8, 23))),
                args: Vec::new(),
                span: sp(3, 8, 25),
            }),
            span: sp(3, 4, 25),
        },
        span: reassign_span.clone(),
    };
    let body = MethodBody::Block(vec![constraint, reassign]);
    let program = program_of(method_member("h", body, decl_span));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::AssignmentAfterConstraint]
    );
    assert_eq!(diagnostics[0].span, reassign_span);
}

/// `void i([NotNull] string s) { Constraint.NotNull(s); }`
#[test]
fn constraining_an_annotated_parameter_is_unneeded() {
    let decl_span = sp(1, 0, 60);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("i"));
    let parameter =
        builder.add_parameter(ParameterSymbol::new("s").with_attributes(["NotNull"]));
    builder.set_parameters(method, vec![parameter]);
    builder.bind_declaration(decl_span.clone(), method);
    builder.bind_symbol(sp(2, 23, 24), parameter);
    let model = builder.build();

    let constraint = Statement::Expression {
        expr: Expression::Invocation {
            callee: Box::new(Expression::MemberAccess {
                receiver: Box::new(ident("Constraint", sp(2, 4, 14))),
                name: "NotNull".into(),
                span: sp(2, 4, 22),
            }),
            args: vec![Argument::positional(ident("s", sp(2, 23, 24)))],
            span: sp(2, 4, 25),
        },
        span: sp(2, 4, 26),
    };
    let program = program_of(method_member(
        "i",
        MethodBody::Block(vec![constraint]),
        decl_span,
    ));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnneededConstraint]);
    assert_eq!(diagnostics[0].span, sp(2, 23, 24));
}

/// `string j([NotNull] string s) => s?.ToString();`
#[test]
fn conditional_access_on_an_annotated_parameter_is_unneeded() {
    let decl_span = sp(1, 0, 48);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("j"));
    let parameter =
        builder.add_parameter(ParameterSymbol::new("s").with_attributes(["NotNull"]));
    builder.set_parameters(method, vec![parameter]);
    builder.bind_declaration(decl_span.clone(), method);
    let receiver_span = sp(1, 33, 34);
    builder.bind_symbol(receiver_span.clone(), parameter);
    let model = builder.build();

    let body = MethodBody::Expression(Expression::ConditionalAccess {
        receiver: Box::new(ident("s", receiver_span.clone())),
        when_not_null: Box::new(Expression::Invocation {
            callee: Box::new(Expression::MemberBinding {
                name: "ToString".into(),
                span: sp(1, 36, 44),
            }),
            args: Vec::new(),
            span: sp(1, 36, 46),
        }),
        span: sp(1, 33, 46),
    });
    let program = program_of(method_member("j", body, decl_span));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnneededNullCheck]);
    assert_eq!(diagnostics[0].span, receiver_span);
}

/// `void k(ref string x) { Pass(ref x); }` where `Pass` takes `[NotNull] ref`.
#[test]
fn passing_an_annotated_symbol_by_ref_is_reported() {
    let decl_span = sp(1, 0, 40);
    let mut builder = SemanticModelBuilder::new();
    let pass = builder.add_method(MethodSymbol::new("Pass"));
    let pass_param = builder.add_parameter(
        ParameterSymbol::new("value")
            .by_ref(RefKind::Ref)
            .with_attributes(["NotNull"]),
    );
    builder.set_parameters(pass, vec![pass_param]);

    let method = builder.add_method(MethodSymbol::new("k"));
    let x = builder.add_parameter(
        ParameterSymbol::new("x")
            .by_ref(RefKind::Ref)
            .with_attributes(["NotNull"]),
    );
    builder.set_parameters(method, vec![x]);
    builder.bind_declaration(decl_span.clone(), method);

    let call_span = sp(2, 4, 16);
    let arg_span = sp(2, 13, 14);
    builder.bind_symbol(call_span.clone(), pass);
    builder.bind_symbol(arg_span.clone(), x);
    let model = builder.build();

    let call = Statement::Expression {
        expr: Expression::Invocation {
            callee: Box::new(ident("Pass", sp(2, 4, 8))),
            args: vec![Argument::by_ref(RefKind::Ref, ident("x", arg_span.clone()))],
            span: call_span,
        },
        span: sp(2, 4, 17),
    };
    let program = program_of(method_member(
        "k",
        MethodBody::Block(vec![call]),
        decl_span,
    ));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::NotNullAsRefParameter]
    );
    assert_eq!(diagnostics[0].span, arg_span);
}

#[test]
fn constructor_chain_calls_report_only_unassigned_values() {
    let ctor_span = sp(1, 0, 50);
    let init_span = sp(1, 20, 30);
    let mut builder = SemanticModelBuilder::new();

    let target_ctor = builder.add_method(MethodSymbol::new(".ctor"));
    let target_param =
        builder.add_parameter(ParameterSymbol::new("name").with_attributes(["NotNull"]));
    builder.set_parameters(target_ctor, vec![target_param]);

    let ctor = builder.add_method(MethodSymbol::new(".ctor"));
    let a = builder.add_parameter(ParameterSymbol::new("a"));
    builder.set_parameters(ctor, vec![a]);
    builder.bind_declaration(ctor_span.clone(), ctor);
    builder.bind_symbol(init_span.clone(), target_ctor);
    let arg_span = sp(1, 26, 27);
    builder.bind_symbol(arg_span.clone(), a);
    let model = builder.build();

    let member = MemberDecl::Constructor(ConstructorDecl {
        parameters: Vec::new(),
        initializer: Some(ConstructorInitializer {
            kind: InitializerKind::This,
            args: vec![Argument::positional(ident("a", arg_span.clone()))],
            span: init_span,
        }),
        body: Vec::new(),
        modifiers: Modifiers::default(),
        span: ctor_span,
    });
    let program = program_of(member);

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::PropagateNotNullInCtors]
    );
    assert_eq!(diagnostics[0].span, arg_span);
}

#[test]
fn empty_method_bodies_produce_no_diagnostics() {
    let decl_span = sp(1, 0, 20);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("noop"));
    builder.bind_declaration(decl_span.clone(), method);
    let model = builder.build();

    let program = program_of(method_member(
        "noop",
        MethodBody::Block(Vec::new()),
        decl_span,
    ));
    let checker = NullContractChecker::new(&model);
    assert!(checker.check_program(&program).unwrap().is_empty());
}

#[test]
fn params_parameter_terminates_argument_checking() {
    let decl_span = sp(1, 0, 40);
    let mut builder = SemanticModelBuilder::new();
    let sink = builder.add_method(MethodSymbol::new("Write"));
    let first = builder.add_parameter(ParameterSymbol::new("head").with_attributes(["NotNull"]));
    let rest = builder.add_parameter(
        ParameterSymbol::new("rest")
            .variadic()
            .with_attributes(["NotNull"]),
    );
    builder.set_parameters(sink, vec![first, rest]);

    let method = builder.add_method(MethodSymbol::new("caller"));
    builder.bind_declaration(decl_span.clone(), method);
    let call_span = sp(2, 4, 30);
    builder.bind_symbol(call_span.clone(), sink);
    let model = builder.build();

    // The variadic tail receives nulls, but checking stops at `params`.
    let call = Statement::Expression {
        expr: Expression::Invocation {
            callee: Box::new(ident("Write", sp(2, 4, 9))),
            args: vec![
                Argument::positional(Expression::Literal(
                    Literal::String("head".into()),
                    sp(2, 10, 16),
                )),
                Argument::positional(null_at(sp(2, 18, 22))),
                Argument::positional(null_at(sp(2, 24, 28))),
            ],
            span: call_span,
        },
        span: sp(2, 4, 31),
    };
    let program = program_of(method_member(
        "caller",
        MethodBody::Block(vec![call]),
        decl_span,
    ));

    let checker = NullContractChecker::new(&model);
    assert!(checker.check_program(&program).unwrap().is_empty());
}

#[test]
fn emitting_twice_yields_the_same_diagnostics() {
    let (model, program, _) = guarded_annotated_parameter_program("s");
    let checker = NullContractChecker::new(&model);
    let first = checker.check_program(&program).unwrap();
    let second = checker.check_program(&program).unwrap();
    assert_eq!(first, second);
}

#[test]
fn renaming_locals_preserves_diagnostic_kinds() {
    let (model_a, program_a, _) = guarded_annotated_parameter_program("s");
    let (model_b, program_b, _) = guarded_annotated_parameter_program("fancyName");

    let first = NullContractChecker::new(&model_a)
        .check_program(&program_a)
        .unwrap();
    let second = NullContractChecker::new(&model_b)
        .check_program(&program_b)
        .unwrap();
    assert_eq!(kinds(&first), kinds(&second));
}

#[test]
fn cancelled_token_aborts_the_program_check() {
    let (model, program, _) = guarded_annotated_parameter_program("s");
    let token = nn_support::CancellationToken::new();
    token.cancel();
    let checker = NullContractChecker::with_token(&model, token);
    assert!(checker.check_program(&program).is_err());
}

#[test]
fn assigning_maybe_null_to_an_annotated_field_is_reported() {
    let decl_span = sp(1, 0, 40);
    let mut builder = SemanticModelBuilder::new();
    let method = builder.add_method(MethodSymbol::new("store"));
    let field = builder.add_field(
        nn_semantics::FieldSymbol::new("cache").with_attributes(["CheckNull"]),
    );
    builder.bind_declaration(decl_span.clone(), method);
    let target_span = sp(2, 4, 14);
    builder.bind_symbol(target_span.clone(), field);
    let model = builder.build();

    let value_span = sp(2, 17, 24);
    let assignment = Statement::Expression {
        expr: Expression::Assignment {
            target: Box::new(Expression::MemberAccess {
                receiver: Box::new(Expression::This(sp(2, 4, 8))),
                name: "cache".into(),
                span: target_span,
            }),
            value: Box::new(Expression::Invocation {
                callee: Box::new(ident("Fetch", sp(2, 17, 22))),
                args: Vec::new(),
                span: value_span.clone(),
            }),
            span: sp(2, 4, 24),
        },
        span: sp(2, 4, 25),
    };
    let program = program_of(method_member(
        "store",
        MethodBody::Block(vec![assignment]),
        decl_span,
    ));

    let checker = NullContractChecker::new(&model);
    let diagnostics = checker.check_program(&program).unwrap();
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::NullAssignment]);
    assert_eq!(diagnostics[0].span, value_span);
}
