// nn_checker/session - Per-semantic-model caches and timing
use std::sync::{Arc, OnceLock};

use nn_ast::Statement;
use nn_semantics::{SemanticModel, SymbolId};
use nn_support::{CancellationToken, Cancelled, TimingReport, TimingSet};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::flow::MethodFlowAnalysis;
use crate::known::KnownSymbols;

/// Shared state for one semantic-model invocation: the resolved knowledge
/// base, memoized per-method flow analyses, and coarse operation timers.
///
/// Reads are safe from parallel block analyses sharing the model. The
/// knowledge base is populated exactly once; method memoization is
/// compute-if-absent, and when two threads race for the same method the
/// first stored result wins (results are immutable and structurally
/// equivalent).
pub struct AnalyzerSession<'m> {
    model: &'m SemanticModel,
    known: OnceLock<KnownSymbols>,
    methods: Mutex<FxHashMap<SymbolId, Arc<MethodFlowAnalysis>>>,
    timings: TimingSet,
    token: CancellationToken,
}

impl<'m> AnalyzerSession<'m> {
    pub fn new(model: &'m SemanticModel, token: CancellationToken) -> Self {
        Self {
            model,
            known: OnceLock::new(),
            methods: Mutex::new(FxHashMap::default()),
            timings: TimingSet::new(),
            token,
        }
    }

    pub fn model(&self) -> &'m SemanticModel {
        self.model
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn known(&self) -> &KnownSymbols {
        self.known.get_or_init(|| {
            let _timer = self.timings.time("known_symbols");
            KnownSymbols::resolve(self.model.compilation())
        })
    }

    /// Lazily builds and memoizes the flow analysis for `method`. Bodies
    /// without a declared symbol are analyzed without being cached.
    pub fn method_analysis(
        &self,
        method: Option<SymbolId>,
        body: &[Statement],
    ) -> Result<Arc<MethodFlowAnalysis>, Cancelled> {
        if let Some(id) = method {
            if let Some(found) = self.methods.lock().get(&id) {
                return Ok(Arc::clone(found));
            }
        }

        let analysis = {
            let _timer = self.timings.time("method_analysis");
            Arc::new(MethodFlowAnalysis::build(
                method,
                body,
                self.model,
                self.known(),
                &self.token,
            )?)
        };

        if let Some(id) = method {
            debug!(method = id.0, "memoized method flow analysis");
            let mut methods = self.methods.lock();
            return Ok(Arc::clone(methods.entry(id).or_insert(analysis)));
        }

        Ok(analysis)
    }

    pub fn timings(&self) -> TimingReport {
        self.timings.report()
    }

    pub fn timing_set(&self) -> &TimingSet {
        &self.timings
    }
}
