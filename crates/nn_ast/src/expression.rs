// nn_ast/expression - Expression nodes and related constructs
use crate::annotation::Attribute;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// AST node covering every expression shape the analyzer understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Literals
    Literal(Literal, Span),

    // Identifiers
    Identifier(String, Span),

    // Interpolated strings: $"a {expr} b"
    InterpolatedString {
        parts: Vec<StringPart>,
        span: Span,
    },

    // nameof(expr)
    NameOf {
        argument: Box<Expression>,
        span: Span,
    },

    // Binary operations, including `??`, `as`, and `is`
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },

    // Unary operations
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },

    // Simple assignment used in expression position: target = value
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },

    // Ternary conditional: condition ? when_true : when_false
    Ternary {
        condition: Box<Expression>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
        span: Span,
    },

    // Invocations: callee(args)
    Invocation {
        callee: Box<Expression>,
        args: Vec<Argument>,
        span: Span,
    },

    // Member access: receiver.name
    MemberAccess {
        receiver: Box<Expression>,
        name: String,
        span: Span,
    },

    // Conditional access: receiver?.when_not_null
    ConditionalAccess {
        receiver: Box<Expression>,
        when_not_null: Box<Expression>,
        span: Span,
    },

    // The `.name` continuation inside a conditional access
    MemberBinding {
        name: String,
        span: Span,
    },

    // Element access: receiver[index]
    ElementAccess {
        receiver: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },

    // The `[index]` continuation inside a conditional access
    ElementBinding {
        index: Box<Expression>,
        span: Span,
    },

    // Object creation: new T(args)
    ObjectCreation {
        ty: TypeAnnotation,
        args: Vec<Argument>,
        span: Span,
    },

    // Array creation: new T[] { ... } / implicit new[] { ... }
    ArrayCreation {
        element_ty: Option<TypeAnnotation>,
        elements: Vec<Expression>,
        span: Span,
    },

    // Explicit cast: (T)expr
    Cast {
        ty: TypeAnnotation,
        expr: Box<Expression>,
        span: Span,
    },

    // Parenthesized expression
    Parenthesized {
        expr: Box<Expression>,
        span: Span,
    },

    // Await expression
    Await {
        expr: Box<Expression>,
        span: Span,
    },

    // Throw expression
    Throw {
        expr: Option<Box<Expression>>,
        span: Span,
    },

    // Lambda: (params) => body
    Lambda {
        parameters: Vec<Parameter>,
        body: Box<Expression>,
        span: Span,
    },

    // Block expression, used as a lambda body
    Block {
        statements: Vec<crate::Statement>,
        span: Span,
    },

    // Tuple: (a, b)
    Tuple {
        elements: Vec<Expression>,
        span: Span,
    },

    // This/base references
    This(Span),
    Base(Span),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal(_, span)
            | Expression::Identifier(_, span)
            | Expression::This(span)
            | Expression::Base(span) => span,
            Expression::InterpolatedString { span, .. }
            | Expression::NameOf { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Assignment { span, .. }
            | Expression::Ternary { span, .. }
            | Expression::Invocation { span, .. }
            | Expression::MemberAccess { span, .. }
            | Expression::ConditionalAccess { span, .. }
            | Expression::MemberBinding { span, .. }
            | Expression::ElementAccess { span, .. }
            | Expression::ElementBinding { span, .. }
            | Expression::ObjectCreation { span, .. }
            | Expression::ArrayCreation { span, .. }
            | Expression::Cast { span, .. }
            | Expression::Parenthesized { span, .. }
            | Expression::Await { span, .. }
            | Expression::Throw { span, .. }
            | Expression::Lambda { span, .. }
            | Expression::Block { span, .. }
            | Expression::Tuple { span, .. } => span,
        }
    }

    /// Short label for the node's syntactic kind, used by parse-failure
    /// diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Literal(..) => "literal",
            Expression::Identifier(..) => "identifier",
            Expression::InterpolatedString { .. } => "interpolated-string",
            Expression::NameOf { .. } => "nameof",
            Expression::Binary { .. } => "binary",
            Expression::Unary { .. } => "unary",
            Expression::Assignment { .. } => "assignment",
            Expression::Ternary { .. } => "ternary",
            Expression::Invocation { .. } => "invocation",
            Expression::MemberAccess { .. } => "member-access",
            Expression::ConditionalAccess { .. } => "conditional-access",
            Expression::MemberBinding { .. } => "member-binding",
            Expression::ElementAccess { .. } => "element-access",
            Expression::ElementBinding { .. } => "element-binding",
            Expression::ObjectCreation { .. } => "object-creation",
            Expression::ArrayCreation { .. } => "array-creation",
            Expression::Cast { .. } => "cast",
            Expression::Parenthesized { .. } => "parenthesized",
            Expression::Await { .. } => "await",
            Expression::Throw { .. } => "throw",
            Expression::Lambda { .. } => "lambda",
            Expression::Block { .. } => "block",
            Expression::Tuple { .. } => "tuple",
            Expression::This(..) => "this",
            Expression::Base(..) => "base",
        }
    }
}

/// Pieces of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringPart {
    Text(String),
    Expression(Box<Expression>),
}

/// By-reference passing modes for arguments and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    Ref,
    Out,
}

/// A call-site argument, optionally passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub value: Expression,
    #[serde(default)]
    pub ref_kind: Option<RefKind>,
}

impl Argument {
    pub fn positional(value: Expression) -> Self {
        Self {
            value,
            ref_kind: None,
        }
    }

    pub fn by_ref(kind: RefKind, value: Expression) -> Self {
        Self {
            value,
            ref_kind: Some(kind),
        }
    }
}

/// Modifier set for a declared parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterModifiers {
    #[serde(default)]
    pub ref_kind: Option<RefKind>,
    #[serde(default)]
    pub is_params: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Declared parameter of a method, constructor, accessor, or lambda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    #[serde(default)]
    pub modifiers: ParameterModifiers,
    pub span: Span,
}
