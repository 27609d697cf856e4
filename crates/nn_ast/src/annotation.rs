// nn_ast/annotation - Attribute annotations applied to declarations
use crate::types::Span;
use serde::{Deserialize, Serialize};

/// An attribute applied to a declaration, e.g. `[NotNull]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: AttributeName,
    pub span: Span,
}

impl Attribute {
    pub fn qualified_name(&self) -> String {
        self.name.qualified_name()
    }
}

/// Qualified attribute name broken into namespace segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeName {
    pub segments: Vec<String>,
    pub span: Span,
}

impl AttributeName {
    pub fn new(segments: Vec<String>, span: Span) -> Self {
        Self { segments, span }
    }

    pub fn simple_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn qualified_name(&self) -> String {
        self.segments.join(".")
    }
}

/// Declaration visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Internal,
    Protected,
    Private,
}

/// Modifier set attached to member declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            visibility: Visibility::Private,
            is_static: false,
            is_async: false,
            attributes: Vec::new(),
        }
    }
}
