// nn_ast/statement - Statement nodes
use crate::expression::Expression;
use crate::types::{Span, TypeAnnotation};
use serde::{Deserialize, Serialize};

/// Statement nodes appearing inside method and accessor bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    LocalDeclaration {
        name: String,
        ty: Option<TypeAnnotation>,
        initializer: Option<Expression>,
        span: Span,
    },
    Expression {
        expr: Expression,
        span: Span,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
        span: Span,
    },
    Foreach {
        binding: String,
        iterable: Expression,
        body: Box<Statement>,
        span: Span,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
    Throw {
        expr: Option<Expression>,
        span: Span,
    },
    Block {
        statements: Vec<Statement>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::LocalDeclaration { span, .. }
            | Statement::Expression { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::Foreach { span, .. }
            | Statement::Return { span, .. }
            | Statement::Throw { span, .. }
            | Statement::Block { span, .. } => span,
        }
    }
}
