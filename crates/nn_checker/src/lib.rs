// nn_checker - Flow-sensitive null-contract analysis
pub mod annotations;
pub mod classify;
pub mod diagnostics;
pub mod emitter;
pub mod flow;
pub mod known;
pub mod session;
pub mod underlying;

pub use classify::{Classifier, ClassifyContext, Nullness};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, ShapeError};
pub use emitter::BlockAnalyzer;
pub use flow::{ExpressionStatus, MethodFlowAnalysis, TargetKey};
pub use known::KnownSymbols;
pub use session::AnalyzerSession;

use nn_ast::{MemberDecl, Program};
use nn_semantics::SemanticModel;
use nn_support::{CancellationToken, Cancelled, TimingReport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("analysis cancelled before completion")]
    Cancelled(#[from] Cancelled),
}

/// Entry point for hosts: analyzes code blocks against their declared null
/// contracts, caching per-method work for the lifetime of the checker.
pub struct NullContractChecker<'m> {
    session: AnalyzerSession<'m>,
}

impl<'m> NullContractChecker<'m> {
    pub fn new(model: &'m SemanticModel) -> Self {
        Self::with_token(model, CancellationToken::new())
    }

    pub fn with_token(model: &'m SemanticModel, token: CancellationToken) -> Self {
        Self {
            session: AnalyzerSession::new(model, token),
        }
    }

    pub fn session(&self) -> &AnalyzerSession<'m> {
        &self.session
    }

    /// Analyzes every member of every type declaration and returns the
    /// collected diagnostics. Cancellation discards partial output.
    pub fn check_program(&self, program: &Program) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for declaration in &program.declarations {
            for member in &declaration.members {
                self.check_member(member, &mut diagnostics)?;
            }
        }
        Ok(diagnostics)
    }

    pub fn check_member(
        &self,
        member: &MemberDecl,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), CheckError> {
        BlockAnalyzer::new(&self.session)
            .check_member(member, sink)
            .map_err(CheckError::from)
    }

    pub fn timings(&self) -> TimingReport {
        self.session.timings()
    }
}
