// nn_checker/flow - Method-local flow analysis
mod events;
mod graph;

pub use events::{
    condition_facts, constraint_call, constraint_target, target_key, ConditionFacts,
    ConstraintTarget, FlowEvent, TargetKey,
};
pub use graph::{FlowEdgeKind, FlowGraph, FlowNodeId, FlowNodeKind, FlowState, NodeFact};

use std::collections::VecDeque;

use nn_ast::{Expression, Span, Statement};
use nn_semantics::{SemanticModel, SymbolId};
use nn_support::{CancellationToken, Cancelled};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::classify::{Classifier, ClassifyContext, Nullness};
use crate::diagnostics::ShapeError;
use crate::known::KnownSymbols;
use crate::underlying::underlying_member;

/// Answer to "is this expression safely assigned non-null at this point?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionStatus {
    Assigned,
    NotAssigned,
    ReassignedAfterCondition,
    AssignedWithUnneededConstraint,
}

/// Immutable per-method analysis: the flow graph, its solved entry states,
/// and the ordered event list derived from one walk of the body.
#[derive(Debug)]
pub struct MethodFlowAnalysis {
    method: Option<SymbolId>,
    graph: FlowGraph,
    in_states: FxHashMap<FlowNodeId, FlowState>,
    /// Entry states from a second solve that ignores null/maybe-null
    /// assignments. A key that is `NotNull` here but not in `in_states` lost
    /// its guarantee to a reassignment rather than to a merge where a guard
    /// never held.
    unclobbered_states: FxHashMap<FlowNodeId, FlowState>,
    events: Vec<FlowEvent>,
    has_constraints: bool,
    shape_failures: Vec<ShapeError>,
}

impl MethodFlowAnalysis {
    pub fn build(
        method: Option<SymbolId>,
        body: &[Statement],
        model: &SemanticModel,
        known: &KnownSymbols,
        token: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let body_span = body_span(body);
        let mut builder = FlowBuilder {
            graph: FlowGraph::new(body_span),
            model,
            known,
            token,
            events: Vec::new(),
            has_constraints: false,
            failures: Vec::new(),
        };

        let mut current = builder.graph.entry();
        for statement in body {
            current = builder.handle_statement(current, statement)?;
        }
        let exit = builder.graph.exit();
        builder.graph.add_edge(current, exit, FlowEdgeKind::Normal);

        let in_states = solve(&builder.graph, false);
        let unclobbered_states = solve(&builder.graph, true);
        trace!(
            nodes = builder.graph.node_count(),
            events = builder.events.len(),
            "flow analysis solved"
        );

        Ok(Self {
            method,
            graph: builder.graph,
            in_states,
            unclobbered_states,
            events: builder.events,
            has_constraints: builder.has_constraints,
            shape_failures: builder.failures,
        })
    }

    pub fn method(&self) -> Option<SymbolId> {
        self.method
    }

    pub fn has_constraints(&self) -> bool {
        self.has_constraints
    }

    /// Ordered assignment/guard/constraint events in walk order.
    pub fn events(&self) -> &[FlowEvent] {
        &self.events
    }

    /// Shapes the walk could not interpret; surfaced as parse failures.
    pub fn shape_failures(&self) -> &[ShapeError] {
        &self.shape_failures
    }

    /// Implements the status decision ladder for one use site.
    pub fn is_always_assigned(
        &self,
        expr: &Expression,
        at: &Span,
        classifier: &Classifier<'_>,
        ctx: &mut ClassifyContext,
    ) -> Result<ExpressionStatus, ShapeError> {
        let nullness = classifier.classify(expr, ctx)?;
        let key = target_key(underlying_member(expr)?);
        let point = self.graph.node_at(at);
        let position = point.unwrap_or(0);

        if nullness.is_not_null() {
            if let Some(key) = &key {
                if self.live_constraint_before(key, position) {
                    return Ok(ExpressionStatus::AssignedWithUnneededConstraint);
                }
            }
            return Ok(ExpressionStatus::Assigned);
        }

        let Some(key) = key else {
            return Ok(ExpressionStatus::NotAssigned);
        };

        let current = point
            .and_then(|node| self.in_states.get(&node))
            .and_then(|state| state.get(&key));
        if current == Some(Nullness::NotNull) {
            return Ok(ExpressionStatus::Assigned);
        }

        if self.guard_invalidated_before(&key, point) {
            return Ok(ExpressionStatus::ReassignedAfterCondition);
        }

        Ok(ExpressionStatus::NotAssigned)
    }

    /// Assignments whose target has an earlier constraint and whose value is
    /// not provably non-null; deduplicated by site.
    pub fn assignments_after_constraints(&self) -> Vec<(TargetKey, Span)> {
        let mut seen: FxHashSet<Span> = FxHashSet::default();
        let mut violations = Vec::new();

        for constraint in &self.events {
            let FlowEvent::Constraint { key, position, .. } = constraint else {
                continue;
            };
            for event in &self.events {
                let FlowEvent::Assignment {
                    key: assigned,
                    state,
                    position: assigned_at,
                    span,
                } = event
                else {
                    continue;
                };
                if assigned == key
                    && assigned_at > position
                    && !state.is_not_null()
                    && seen.insert(span.clone())
                {
                    violations.push((assigned.clone(), span.clone()));
                }
            }
        }

        violations
    }

    fn live_constraint_before(&self, key: &TargetKey, position: usize) -> bool {
        let mut live = false;
        for event in &self.events {
            if event.position() >= position || event.key() != key {
                continue;
            }
            match event {
                FlowEvent::Constraint { .. } => live = true,
                FlowEvent::Assignment { state, .. } if !state.is_not_null() => live = false,
                _ => {}
            }
        }
        live
    }

    /// True when the guarantee held on every path to `point` and only a weak
    /// reassignment broke it. Decided from the path-sensitive solves: the
    /// key must be `NotNull` at `point` once null/maybe-null assignments are
    /// ignored, and at least one such assignment must actually precede the
    /// point. A guard that never survived a merge (e.g. one arm of an
    /// else-less `if`) is `NotNull` in neither solve and stays `NotAssigned`.
    fn guard_invalidated_before(&self, key: &TargetKey, point: Option<FlowNodeId>) -> bool {
        let Some(node) = point else {
            return false;
        };
        let held_before_reassignment = self
            .unclobbered_states
            .get(&node)
            .and_then(|state| state.get(key))
            == Some(Nullness::NotNull);
        if !held_before_reassignment {
            return false;
        }

        self.events.iter().any(|event| {
            matches!(
                event,
                FlowEvent::Assignment { key: assigned, state, position, .. }
                    if assigned == key && *position < node && !state.is_not_null()
            )
        })
    }
}

fn body_span(body: &[Statement]) -> Span {
    match (body.first(), body.last()) {
        (Some(first), Some(last)) => {
            let start = first.span();
            let end = last.span();
            Span::new(
                start.start_line,
                start.start_column,
                end.end_line,
                end.end_column,
            )
        }
        _ => Span::dummy(),
    }
}

/// True when every path through the statement leaves the enclosing block.
fn terminates(statement: &Statement) -> bool {
    match statement {
        Statement::Return { .. } | Statement::Throw { .. } => true,
        Statement::Block { statements, .. } => statements.last().map(terminates).unwrap_or(false),
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => match else_branch {
            Some(else_branch) => terminates(then_branch) && terminates(else_branch),
            None => false,
        },
        _ => false,
    }
}

struct FlowBuilder<'a> {
    graph: FlowGraph,
    model: &'a SemanticModel,
    known: &'a KnownSymbols,
    token: &'a CancellationToken,
    events: Vec<FlowEvent>,
    has_constraints: bool,
    failures: Vec<ShapeError>,
}

impl<'a> FlowBuilder<'a> {
    fn handle_statement(
        &mut self,
        current: FlowNodeId,
        statement: &Statement,
    ) -> Result<FlowNodeId, Cancelled> {
        self.token.ensure_active()?;

        match statement {
            Statement::LocalDeclaration {
                name,
                initializer,
                span,
                ..
            } => {
                let state = initializer
                    .as_ref()
                    .map(|expr| self.classify_quietly(expr))
                    .unwrap_or(Nullness::MaybeNull);
                let key = TargetKey::from_path(name.clone());
                Ok(self.emit_assignment(current, key, state, span))
            }
            Statement::Expression { expr, span } => self.handle_expression(current, expr, span),
            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.build_if(current, condition, then_branch, else_branch.as_deref()),
            Statement::While {
                condition, body, ..
            } => self.build_while(current, condition, body),
            Statement::Foreach {
                binding,
                iterable,
                body,
                span,
            } => self.build_foreach(current, binding, iterable, body, span),
            Statement::Return { span, .. } | Statement::Throw { span, .. } => {
                let node = self.passthrough(current, FlowNodeKind::Statement, Some(span.clone()));
                let exit = self.graph.exit();
                self.graph.add_edge(node, exit, FlowEdgeKind::Normal);
                // Anything after this point in the block is unreachable.
                Ok(self.graph.add_node(FlowNodeKind::Statement, None))
            }
            Statement::Block { statements, .. } => {
                let mut cursor = current;
                for statement in statements {
                    cursor = self.handle_statement(cursor, statement)?;
                }
                Ok(cursor)
            }
        }
    }

    fn handle_expression(
        &mut self,
        current: FlowNodeId,
        expr: &Expression,
        span: &Span,
    ) -> Result<FlowNodeId, Cancelled> {
        match expr {
            Expression::Assignment { target, value, .. } => {
                match target_key(target) {
                    Some(key) => {
                        let state = self.classify_quietly(value);
                        Ok(self.emit_assignment(current, key, state, span))
                    }
                    None => Ok(self.passthrough(
                        current,
                        FlowNodeKind::Statement,
                        Some(span.clone()),
                    )),
                }
            }
            Expression::Invocation { .. } => {
                if let Some(args) = constraint_call(expr, self.model) {
                    if let ConstraintTarget::Key(key, target_span) =
                        constraint_target(args, expr.span())
                    {
                        let node = self
                            .graph
                            .add_node(FlowNodeKind::Statement, Some(span.clone()));
                        self.graph.add_edge(current, node, FlowEdgeKind::Normal);
                        self.graph.node_mut(node).push_fact(NodeFact::Assert {
                            key: key.clone(),
                        });
                        self.events.push(FlowEvent::Constraint {
                            key,
                            position: node,
                            span: target_span,
                        });
                        self.has_constraints = true;
                        return Ok(node);
                    }
                    // Unrecognized constraint shapes are reported by the
                    // emitter; they contribute no flow facts.
                }
                Ok(self.passthrough(current, FlowNodeKind::Statement, Some(span.clone())))
            }
            Expression::Ternary {
                condition,
                when_true,
                when_false,
                ..
            } => {
                let facts = self.guard_facts(condition);
                let condition_node = self
                    .graph
                    .add_node(FlowNodeKind::Expression, Some(condition.span().clone()));
                self.graph
                    .add_edge(current, condition_node, FlowEdgeKind::Normal);

                let true_node = self.branch_head(
                    condition_node,
                    when_true.span(),
                    FlowEdgeKind::TrueBranch {
                        assertions: facts.when_true.clone(),
                    },
                );
                let false_node = self.branch_head(
                    condition_node,
                    when_false.span(),
                    FlowEdgeKind::FalseBranch {
                        assertions: facts.when_false.clone(),
                    },
                );

                let join = self.graph.add_node(FlowNodeKind::Merge, Some(span.clone()));
                self.graph.add_edge(true_node, join, FlowEdgeKind::Normal);
                self.graph.add_edge(false_node, join, FlowEdgeKind::Normal);
                Ok(join)
            }
            _ => Ok(self.passthrough(current, FlowNodeKind::Statement, Some(span.clone()))),
        }
    }

    fn build_if(
        &mut self,
        current: FlowNodeId,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
    ) -> Result<FlowNodeId, Cancelled> {
        let facts = self.guard_facts(condition);
        let condition_node = self
            .graph
            .add_node(FlowNodeKind::Expression, Some(condition.span().clone()));
        self.graph
            .add_edge(current, condition_node, FlowEdgeKind::Normal);

        let join = self.graph.add_node(FlowNodeKind::Merge, None);

        let then_head = self.branch_head(
            condition_node,
            then_branch.span(),
            FlowEdgeKind::TrueBranch {
                assertions: facts.when_true.clone(),
            },
        );
        let then_end = self.handle_statement(then_head, then_branch)?;
        if !terminates(then_branch) {
            self.graph.add_edge(then_end, join, FlowEdgeKind::Normal);
        }

        match else_branch {
            Some(else_branch) => {
                let else_head = self.branch_head(
                    condition_node,
                    else_branch.span(),
                    FlowEdgeKind::FalseBranch {
                        assertions: facts.when_false.clone(),
                    },
                );
                let else_end = self.handle_statement(else_head, else_branch)?;
                if !terminates(else_branch) {
                    self.graph.add_edge(else_end, join, FlowEdgeKind::Normal);
                }
            }
            None => {
                self.graph.add_edge(
                    condition_node,
                    join,
                    FlowEdgeKind::FalseBranch {
                        assertions: facts.when_false.clone(),
                    },
                );
            }
        }

        Ok(join)
    }

    fn build_while(
        &mut self,
        current: FlowNodeId,
        condition: &Expression,
        body: &Statement,
    ) -> Result<FlowNodeId, Cancelled> {
        let facts = self.guard_facts(condition);
        let condition_node = self
            .graph
            .add_node(FlowNodeKind::Expression, Some(condition.span().clone()));
        self.graph
            .add_edge(current, condition_node, FlowEdgeKind::Normal);

        let body_head = self.branch_head(
            condition_node,
            body.span(),
            FlowEdgeKind::TrueBranch {
                assertions: facts.when_true.clone(),
            },
        );
        let body_end = self.handle_statement(body_head, body)?;
        if !terminates(body) {
            self.graph
                .add_edge(body_end, condition_node, FlowEdgeKind::LoopBack);
        }

        let after = self.graph.add_node(FlowNodeKind::Merge, None);
        self.graph.add_edge(
            condition_node,
            after,
            FlowEdgeKind::FalseBranch {
                assertions: facts.when_false,
            },
        );
        Ok(after)
    }

    fn build_foreach(
        &mut self,
        current: FlowNodeId,
        binding: &str,
        iterable: &Expression,
        body: &Statement,
        span: &Span,
    ) -> Result<FlowNodeId, Cancelled> {
        let iterable_node =
            self.passthrough(current, FlowNodeKind::Expression, Some(iterable.span().clone()));

        // The loop binding is freshly assigned a non-null element each turn.
        let key = TargetKey::from_path(binding.to_string());
        let bind_node = self.emit_assignment(iterable_node, key, Nullness::NotNull, span);

        let body_end = self.handle_statement(bind_node, body)?;
        if !terminates(body) {
            self.graph
                .add_edge(body_end, iterable_node, FlowEdgeKind::LoopBack);
        }

        let after = self.graph.add_node(FlowNodeKind::Merge, None);
        self.graph
            .add_edge(iterable_node, after, FlowEdgeKind::Normal);
        Ok(after)
    }

    fn branch_head(
        &mut self,
        condition_node: FlowNodeId,
        span: &Span,
        edge: FlowEdgeKind,
    ) -> FlowNodeId {
        let head = self
            .graph
            .add_node(FlowNodeKind::Expression, Some(span.clone()));
        self.graph.add_edge(condition_node, head, edge);
        head
    }

    fn guard_facts(&mut self, condition: &Expression) -> ConditionFacts {
        let facts = condition_facts(condition, self.model, self.known, &mut self.failures);
        let position = self.graph.node_count();
        for key in facts.when_true.iter().chain(facts.when_false.iter()) {
            self.events.push(FlowEvent::GuardAssert {
                key: key.clone(),
                position,
                span: condition.span().clone(),
            });
        }
        facts
    }

    fn emit_assignment(
        &mut self,
        current: FlowNodeId,
        key: TargetKey,
        state: Nullness,
        span: &Span,
    ) -> FlowNodeId {
        let node = self
            .graph
            .add_node(FlowNodeKind::Statement, Some(span.clone()));
        self.graph.add_edge(current, node, FlowEdgeKind::Normal);
        self.graph.node_mut(node).push_fact(NodeFact::Assign {
            key: key.clone(),
            state,
        });
        self.events.push(FlowEvent::Assignment {
            key,
            state,
            position: node,
            span: span.clone(),
        });
        node
    }

    fn passthrough(
        &mut self,
        current: FlowNodeId,
        kind: FlowNodeKind,
        span: Option<Span>,
    ) -> FlowNodeId {
        let node = self.graph.add_node(kind, span);
        self.graph.add_edge(current, node, FlowEdgeKind::Normal);
        node
    }

    fn classify_quietly(&mut self, expr: &Expression) -> Nullness {
        let classifier = Classifier::new(self.model, self.known);
        let mut ctx = ClassifyContext::new();
        match classifier.classify(expr, &mut ctx) {
            Ok(nullness) => nullness,
            Err(error) => {
                self.failures.push(error);
                Nullness::MaybeNull
            }
        }
    }
}

/// Forward worklist solve producing the state entering each node. With
/// `ignore_weak_assignments`, null/maybe-null assignment facts are skipped so
/// the result shows where a guarantee would have held but for reassignments.
fn solve(graph: &FlowGraph, ignore_weak_assignments: bool) -> FxHashMap<FlowNodeId, FlowState> {
    let mut in_states: FxHashMap<FlowNodeId, FlowState> = FxHashMap::default();
    let mut out_states: FxHashMap<FlowNodeId, FlowState> = FxHashMap::default();
    let mut visited: FxHashSet<FlowNodeId> = FxHashSet::default();
    let mut worklist = VecDeque::new();

    in_states.insert(graph.entry(), FlowState::new());
    worklist.push_back(graph.entry());

    while let Some(node_id) = worklist.pop_front() {
        visited.insert(node_id);

        let state_in = in_states.get(&node_id).cloned().unwrap_or_default();
        let mut state_out = state_in;
        for fact in graph.node(node_id).facts() {
            match fact {
                NodeFact::Assign { key, state } => {
                    if ignore_weak_assignments && !state.is_not_null() {
                        continue;
                    }
                    state_out.assign(key.clone(), *state);
                }
                NodeFact::Assert { key } => state_out.assert_not_null(key.clone()),
            }
        }

        // The out state is a function of the in state; recompute and compare.
        let changed = out_states
            .insert(node_id, state_out.clone())
            .map_or(true, |previous| previous != state_out);

        for edge in graph.adjacency(node_id) {
            let mut next = state_out.clone();
            edge.kind.apply(&mut next);
            let merged = match in_states.get_mut(&edge.to) {
                Some(entry) => entry.merge_with(&next),
                None => {
                    // First path to reach the node seeds its state.
                    in_states.insert(edge.to, next);
                    true
                }
            };
            if merged || changed || !visited.contains(&edge.to) {
                worklist.push_back(edge.to);
            }
        }
    }

    in_states
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn_ast::{BinaryOp, Literal};
    use nn_semantics::SemanticModelBuilder;

    fn span(line: usize) -> Span {
        Span::new(line, 0, line, 40)
    }

    fn narrow(line: usize, from: usize, to: usize) -> Span {
        Span::new(line, from, line, to)
    }

    fn ident(name: &str, at: Span) -> Expression {
        Expression::Identifier(name.into(), at)
    }

    fn guard_not_null(name: &str, line: usize) -> Expression {
        Expression::Binary {
            left: Box::new(ident(name, narrow(line, 4, 4 + name.len()))),
            op: BinaryOp::NotEqual,
            right: Box::new(Expression::Literal(Literal::Null, narrow(line, 20, 24))),
            span: narrow(line, 4, 24),
        }
    }

    fn use_statement(name: &str, line: usize) -> Statement {
        Statement::Expression {
            expr: Expression::Invocation {
                callee: Box::new(ident("Use", narrow(line, 0, 3))),
                args: vec![nn_ast::Argument::positional(ident(
                    name,
                    narrow(line, 4, 4 + name.len()),
                ))],
                span: narrow(line, 0, 30),
            },
            span: span(line),
        }
    }

    fn empty_env() -> (nn_semantics::SemanticModel, CancellationToken) {
        (SemanticModelBuilder::new().build(), CancellationToken::new())
    }

    #[test]
    fn guard_proves_non_null_inside_the_true_branch() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        let body = vec![Statement::If {
            condition: guard_not_null("s", 2),
            then_branch: Box::new(use_statement("s", 3)),
            else_branch: None,
            span: Span::new(2, 0, 4, 1),
        }];

        let analysis = MethodFlowAnalysis::build(None, &body, &model, &known, &token).unwrap();
        let classifier = Classifier::new(&model, &known);
        let mut ctx = ClassifyContext::new();

        let use_site = ident("s", narrow(3, 4, 5));
        let status = analysis
            .is_always_assigned(&use_site, use_site.span(), &classifier, &mut ctx)
            .unwrap();
        assert_eq!(status, ExpressionStatus::Assigned);
    }

    #[test]
    fn use_outside_the_guard_is_not_assigned() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        let body = vec![
            Statement::If {
                condition: guard_not_null("s", 2),
                then_branch: Box::new(Statement::Block {
                    statements: Vec::new(),
                    span: span(3),
                }),
                else_branch: None,
                span: Span::new(2, 0, 4, 1),
            },
            use_statement("s", 5),
        ];

        let analysis = MethodFlowAnalysis::build(None, &body, &model, &known, &token).unwrap();
        let classifier = Classifier::new(&model, &known);
        let mut ctx = ClassifyContext::new();

        let use_site = ident("s", narrow(5, 4, 5));
        let status = analysis
            .is_always_assigned(&use_site, use_site.span(), &classifier, &mut ctx)
            .unwrap();
        assert_eq!(status, ExpressionStatus::NotAssigned);
    }

    #[test]
    fn early_return_guard_proves_the_remainder() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        // if (s == null) return; Use(s);
        let condition = Expression::Binary {
            left: Box::new(ident("s", narrow(2, 4, 5))),
            op: BinaryOp::Equal,
            right: Box::new(Expression::Literal(Literal::Null, narrow(2, 9, 13))),
            span: narrow(2, 4, 13),
        };
        let body = vec![
            Statement::If {
                condition,
                then_branch: Box::new(Statement::Return {
                    value: None,
                    span: span(3),
                }),
                else_branch: None,
                span: Span::new(2, 0, 4, 1),
            },
            use_statement("s", 5),
        ];

        let analysis = MethodFlowAnalysis::build(None, &body, &model, &known, &token).unwrap();
        let classifier = Classifier::new(&model, &known);
        let mut ctx = ClassifyContext::new();

        let use_site = ident("s", narrow(5, 4, 5));
        let status = analysis
            .is_always_assigned(&use_site, use_site.span(), &classifier, &mut ctx)
            .unwrap();
        assert_eq!(status, ExpressionStatus::Assigned);
    }

    #[test]
    fn weak_reassignment_after_guard_reports_reassigned() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        // if (s != null) { s = Fetch(); Use(s); }
        let reassign = Statement::Expression {
            expr: Expression::Assignment {
                target: Box::new(ident("s", narrow(3, 0, 1))),
                value: Box::new(Expression::Invocation {
                    callee: Box::new(ident("Fetch", narrow(3, 4, 9))),
                    args: Vec::new(),
                    span: narrow(3, 4, 11),
                }),
                span: narrow(3, 0, 11),
            },
            span: span(3),
        };
        let body = vec![Statement::If {
            condition: guard_not_null("s", 2),
            then_branch: Box::new(Statement::Block {
                statements: vec![reassign, use_statement("s", 4)],
                span: Span::new(3, 0, 4, 40),
            }),
            else_branch: None,
            span: Span::new(2, 0, 5, 1),
        }];

        let analysis = MethodFlowAnalysis::build(None, &body, &model, &known, &token).unwrap();
        let classifier = Classifier::new(&model, &known);
        let mut ctx = ClassifyContext::new();

        let use_site = ident("s", narrow(4, 4, 5));
        let status = analysis
            .is_always_assigned(&use_site, use_site.span(), &classifier, &mut ctx)
            .unwrap();
        assert_eq!(status, ExpressionStatus::ReassignedAfterCondition);
    }

    #[test]
    fn unrelated_branch_reassignment_is_not_reported_as_reassigned() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        // if (s != null) { Use(s); }
        // if (flag) { s = MaybeNullGetter(); }
        // Sink(s);
        // The first guard never survives its join, so the later unrelated
        // reassignment must not upgrade NotAssigned to reassigned-after.
        let reassign = Statement::Expression {
            expr: Expression::Assignment {
                target: Box::new(ident("s", narrow(5, 4, 5))),
                value: Box::new(Expression::Invocation {
                    callee: Box::new(ident("MaybeNullGetter", narrow(5, 8, 23))),
                    args: Vec::new(),
                    span: narrow(5, 8, 25),
                }),
                span: narrow(5, 4, 25),
            },
            span: span(5),
        };
        let body = vec![
            Statement::If {
                condition: guard_not_null("s", 2),
                then_branch: Box::new(use_statement("s", 3)),
                else_branch: None,
                span: Span::new(2, 0, 4, 1),
            },
            Statement::If {
                condition: ident("flag", narrow(5, 0, 4)),
                then_branch: Box::new(reassign),
                else_branch: None,
                span: Span::new(5, 0, 6, 1),
            },
            use_statement("s", 7),
        ];

        let analysis = MethodFlowAnalysis::build(None, &body, &model, &known, &token).unwrap();
        let classifier = Classifier::new(&model, &known);
        let mut ctx = ClassifyContext::new();

        let use_site = ident("s", narrow(7, 4, 5));
        let status = analysis
            .is_always_assigned(&use_site, use_site.span(), &classifier, &mut ctx)
            .unwrap();
        assert_eq!(status, ExpressionStatus::NotAssigned);
    }

    #[test]
    fn constraint_followed_by_weak_assignment_is_a_violation() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        let constraint = Statement::Expression {
            expr: Expression::Invocation {
                callee: Box::new(Expression::MemberAccess {
                    receiver: Box::new(ident("Constraint", narrow(2, 0, 10))),
                    name: "NotNull".into(),
                    span: narrow(2, 0, 18),
                }),
                args: vec![nn_ast::Argument::positional(ident("s", narrow(2, 19, 20)))],
                span: narrow(2, 0, 21),
            },
            span: span(2),
        };
        let reassign = Statement::Expression {
            expr: Expression::Assignment {
                target: Box::new(ident("s", narrow(3, 0, 1))),
                value: Box::new(Expression::Invocation {
                    callee: Box::new(ident("Fetch", narrow(3, 4, 9))),
                    args: Vec::new(),
                    span: narrow(3, 4, 11),
                }),
                span: narrow(3, 0, 11),
            },
            span: span(3),
        };

        let analysis = MethodFlowAnalysis::build(
            None,
            &[constraint, reassign],
            &model,
            &known,
            &token,
        )
        .unwrap();

        assert!(analysis.has_constraints());
        let violations = analysis.assignments_after_constraints();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].0.as_str(), "s");
    }

    #[test]
    fn non_null_reassignment_after_constraint_is_allowed() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());

        let constraint = Statement::Expression {
            expr: Expression::Invocation {
                callee: Box::new(Expression::MemberAccess {
                    receiver: Box::new(ident("Constraint", narrow(2, 0, 10))),
                    name: "NotNull".into(),
                    span: narrow(2, 0, 18),
                }),
                args: vec![nn_ast::Argument::positional(ident("s", narrow(2, 19, 20)))],
                span: narrow(2, 0, 21),
            },
            span: span(2),
        };
        let reassign = Statement::Expression {
            expr: Expression::Assignment {
                target: Box::new(ident("s", narrow(3, 0, 1))),
                value: Box::new(Expression::Literal(
                    Literal::String("fresh".into()),
                    narrow(3, 4, 11),
                )),
                span: narrow(3, 0, 11),
            },
            span: span(3),
        };

        let analysis = MethodFlowAnalysis::build(
            None,
            &[constraint, reassign],
            &model,
            &known,
            &token,
        )
        .unwrap();
        assert!(analysis.assignments_after_constraints().is_empty());
    }

    #[test]
    fn empty_body_produces_an_empty_analysis() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());
        let analysis = MethodFlowAnalysis::build(None, &[], &model, &known, &token).unwrap();
        assert!(!analysis.has_constraints());
        assert!(analysis.shape_failures().is_empty());
        assert!(analysis.assignments_after_constraints().is_empty());
    }

    #[test]
    fn cancellation_stops_the_walk() {
        let (model, token) = empty_env();
        let known = KnownSymbols::resolve(model.compilation());
        token.cancel();

        let body = vec![use_statement("s", 1)];
        let result = MethodFlowAnalysis::build(None, &body, &model, &known, &token);
        assert!(result.is_err());
    }
}
