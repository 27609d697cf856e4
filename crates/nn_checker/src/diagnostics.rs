// nn_checker/diagnostics - Diagnostic catalog and reporting surface
use std::fmt;

use nn_ast::{Expression, Span};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed catalog of conditions the analyzer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticKind {
    NullAssignment,
    AssignmentAfterCondition,
    AssignmentAfterConstraint,
    UnneededNullCheck,
    UnneededConstraint,
    InvalidConstraint,
    PropagateNotNullInCtors,
    NotNullAsRefParameter,
    ParseFailure,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::NullAssignment => "NN1001",
            DiagnosticKind::AssignmentAfterCondition => "NN1002",
            DiagnosticKind::AssignmentAfterConstraint => "NN1003",
            DiagnosticKind::UnneededNullCheck => "NN1004",
            DiagnosticKind::UnneededConstraint => "NN1005",
            DiagnosticKind::InvalidConstraint => "NN1006",
            DiagnosticKind::PropagateNotNullInCtors => "NN1007",
            DiagnosticKind::NotNullAsRefParameter => "NN1008",
            DiagnosticKind::ParseFailure => "NN1009",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DiagnosticKind::NullAssignment => "a possibly-null value flows into a non-null sink",
            DiagnosticKind::AssignmentAfterCondition => {
                "a value proved non-null by a condition is reassigned afterwards"
            }
            DiagnosticKind::AssignmentAfterConstraint => {
                "a constrained value is reassigned after the constraint"
            }
            DiagnosticKind::UnneededNullCheck => "null check applied to a provably non-null value",
            DiagnosticKind::UnneededConstraint => "constraint applied to an already-annotated value",
            DiagnosticKind::InvalidConstraint => "constraint argument shape is not recognized",
            DiagnosticKind::PropagateNotNullInCtors => {
                "a constructor chain call passes a possibly-null value to a non-null parameter"
            }
            DiagnosticKind::NotNullAsRefParameter => {
                "a non-null annotated value is passed by reference"
            }
            DiagnosticKind::ParseFailure => "the analyzer could not classify an expression shape",
        }
    }
}

/// A reported analysis finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub context: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, context: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            context: context.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.kind.code(),
            self.kind.description(),
            self.context
        )
    }
}

/// Receives diagnostics as they are produced; traversal continues after each
/// report.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Raised when the underlying-member resolver or classifier meets an
/// expression shape it does not understand. Converted to a [`ParseFailure`]
/// diagnostic at emitter boundaries rather than silently weakening the
/// answer.
///
/// [`ParseFailure`]: DiagnosticKind::ParseFailure
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unrecognized {kind} expression at {span:?}")]
pub struct ShapeError {
    pub kind: &'static str,
    pub span: Span,
}

impl ShapeError {
    pub fn of(expr: &Expression) -> Self {
        Self {
            kind: expr.kind_name(),
            span: expr.span().clone(),
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::ParseFailure, self.span, self.kind)
    }
}
