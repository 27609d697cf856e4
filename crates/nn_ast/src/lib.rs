// nn_ast - Syntax tree for the null-contract analyzer's source language
pub mod annotation;
pub mod declaration;
pub mod expression;
pub mod statement;
pub mod types;

pub use annotation::{Attribute, AttributeName, Modifiers, Visibility};
pub use declaration::{
    Accessor, AccessorKind, ConstructorDecl, ConstructorInitializer, FieldDecl, InitializerKind,
    MemberDecl, MethodBody, MethodDecl, Program, PropertyDecl, TypeDecl,
};
pub use expression::{
    Argument, Expression, Parameter, ParameterModifiers, RefKind, StringPart,
};
pub use statement::Statement;
pub use types::{BinaryOp, Literal, Span, TypeAnnotation, UnaryOp};

#[cfg(test)]
mod tests;
