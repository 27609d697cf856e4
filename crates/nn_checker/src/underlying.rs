// nn_checker/underlying - Peeling syntactic wrappers off guard targets
use nn_ast::{BinaryOp, Expression};

use crate::diagnostics::ShapeError;

/// Strips the syntactic wrappers around an expression to reach the node
/// whose symbol a guard or assignment actually targets.
///
/// Ternaries are returned as-is; the caller must split the branches. Any
/// shape outside the known strip and terminal sets is a [`ShapeError`] so
/// analyzer gaps surface as parse-failure diagnostics instead of silently
/// weakening answers.
pub fn underlying_member(expr: &Expression) -> Result<&Expression, ShapeError> {
    match expr {
        Expression::ConditionalAccess { when_not_null, .. } => underlying_member(when_not_null),
        Expression::Parenthesized { expr: inner, .. } => underlying_member(inner),
        Expression::Assignment { value, .. } => underlying_member(value),
        Expression::Await { expr: inner, .. } => underlying_member(inner),
        Expression::Cast { expr: inner, .. } => underlying_member(inner),
        Expression::Unary { operand, .. } => underlying_member(operand),
        Expression::Binary {
            op: BinaryOp::As,
            left,
            ..
        } => underlying_member(left),
        Expression::Binary {
            op: BinaryOp::Coalesce,
            right,
            ..
        } => underlying_member(right),

        // Callers split ternary branches themselves.
        Expression::Ternary { .. } => Ok(expr),

        Expression::Identifier(..)
        | Expression::Literal(..)
        | Expression::MemberAccess { .. }
        | Expression::MemberBinding { .. }
        | Expression::Invocation { .. }
        | Expression::This(..)
        | Expression::Base(..)
        | Expression::ElementAccess { .. }
        | Expression::ElementBinding { .. }
        | Expression::ObjectCreation { .. }
        | Expression::ArrayCreation { .. }
        | Expression::InterpolatedString { .. }
        | Expression::NameOf { .. }
        | Expression::Throw { .. }
        | Expression::Tuple { .. } => Ok(expr),

        Expression::Binary { .. }
        | Expression::Lambda { .. }
        | Expression::Block { .. } => Err(ShapeError::of(expr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn_ast::{Literal, Span};

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.into(), Span::dummy())
    }

    #[test]
    fn strips_nested_wrappers_down_to_the_identifier() {
        let expr = Expression::Parenthesized {
            expr: Box::new(Expression::Await {
                expr: Box::new(Expression::Cast {
                    ty: nn_ast::TypeAnnotation::Simple("String".into()),
                    expr: Box::new(ident("value")),
                    span: Span::dummy(),
                }),
                span: Span::dummy(),
            }),
            span: Span::dummy(),
        };

        let underlying = underlying_member(&expr).expect("known shape");
        assert_eq!(underlying, &ident("value"));
    }

    #[test]
    fn coalesce_resolves_to_the_right_operand() {
        let expr = Expression::Binary {
            left: Box::new(ident("maybe")),
            op: BinaryOp::Coalesce,
            right: Box::new(ident("fallback")),
            span: Span::dummy(),
        };
        assert_eq!(underlying_member(&expr).unwrap(), &ident("fallback"));
    }

    #[test]
    fn ternary_is_returned_to_the_caller_unsplit() {
        let ternary = Expression::Ternary {
            condition: Box::new(ident("flag")),
            when_true: Box::new(ident("a")),
            when_false: Box::new(ident("b")),
            span: Span::dummy(),
        };
        assert_eq!(underlying_member(&ternary).unwrap(), &ternary);
    }

    #[test]
    fn unknown_shapes_surface_as_shape_errors() {
        let add = Expression::Binary {
            left: Box::new(ident("a")),
            op: BinaryOp::Add,
            right: Box::new(Expression::Literal(Literal::Number("1".into()), Span::dummy())),
            span: Span::new(7, 2, 7, 9),
        };
        let error = underlying_member(&add).unwrap_err();
        assert_eq!(error.kind, "binary");
        assert_eq!(error.span, Span::new(7, 2, 7, 9));
    }
}
