// nn_ast/declaration - Type and member declarations
use crate::annotation::Modifiers;
use crate::expression::{Argument, Expression, Parameter};
use crate::statement::Statement;
use crate::types::{Span, TypeAnnotation};
use serde::{Deserialize, Serialize};

/// A whole compilation unit handed to the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub declarations: Vec<TypeDecl>,
    pub span: Span,
}

/// A class-like type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub members: Vec<MemberDecl>,
    pub modifiers: Modifiers,
    pub span: Span,
}

/// Members of a type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberDecl {
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Property(PropertyDecl),
    Field(FieldDecl),
}

impl MemberDecl {
    pub fn span(&self) -> &Span {
        match self {
            MemberDecl::Method(decl) => &decl.span,
            MemberDecl::Constructor(decl) => &decl.span,
            MemberDecl::Property(decl) => &decl.span,
            MemberDecl::Field(decl) => &decl.span,
        }
    }
}

/// Body of a method or accessor: block form or expression form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MethodBody {
    Block(Vec<Statement>),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_ty: Option<TypeAnnotation>,
    pub body: Option<MethodBody>,
    pub modifiers: Modifiers,
    pub span: Span,
}

/// Constructor chain call: `: this(...)` or `: base(...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorInitializer {
    pub kind: InitializerKind,
    pub args: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializerKind {
    This,
    Base,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub parameters: Vec<Parameter>,
    pub initializer: Option<ConstructorInitializer>,
    pub body: Vec<Statement>,
    pub modifiers: Modifiers,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub modifiers: Modifiers,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessor {
    pub kind: AccessorKind,
    pub body: Option<MethodBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub initializer: Option<Expression>,
    pub modifiers: Modifiers,
    pub span: Span,
}
