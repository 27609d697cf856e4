use super::*;

fn span() -> Span {
    Span::new(1, 0, 1, 12)
}

#[test]
fn expression_round_trips_through_json() {
    let expr = Expression::ConditionalAccess {
        receiver: Box::new(Expression::Identifier("order".into(), span())),
        when_not_null: Box::new(Expression::MemberBinding {
            name: "Customer".into(),
            span: span(),
        }),
        span: span(),
    };

    let encoded = serde_json::to_string(&expr).expect("serialize");
    let decoded: Expression = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(expr, decoded);
}

#[test]
fn coalesce_binary_round_trips_through_json() {
    let expr = Expression::Binary {
        left: Box::new(Expression::Identifier("name".into(), span())),
        op: BinaryOp::Coalesce,
        right: Box::new(Expression::Literal(Literal::String("anon".into()), span())),
        span: span(),
    };

    let encoded = serde_json::to_string(&expr).expect("serialize");
    let decoded: Expression = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(expr, decoded);
}

#[test]
fn member_decl_span_picks_inner_declaration() {
    let method = MethodDecl {
        name: "Lookup".into(),
        parameters: Vec::new(),
        return_ty: Some(TypeAnnotation::Simple("String".into())),
        body: Some(MethodBody::Block(Vec::new())),
        modifiers: Modifiers::default(),
        span: Span::new(4, 0, 9, 1),
    };
    let member = MemberDecl::Method(method);
    assert_eq!(member.span(), &Span::new(4, 0, 9, 1));
}

#[test]
fn argument_constructors_set_ref_kind() {
    let plain = Argument::positional(Expression::Identifier("x".into(), span()));
    assert!(plain.ref_kind.is_none());

    let by_ref = Argument::by_ref(RefKind::Out, Expression::Identifier("x".into(), span()));
    assert_eq!(by_ref.ref_kind, Some(RefKind::Out));
}
