// nn_checker/flow/graph - Control-flow graph over one method body
use nn_ast::Span;
use rustc_hash::FxHashMap;

use crate::classify::Nullness;
use crate::flow::events::TargetKey;

pub type FlowNodeId = usize;

/// Vec-backed flow graph with dedicated entry and exit nodes. Node ids double
/// as depth-first positions because nodes are created in walk order.
#[derive(Debug)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    adjacency: Vec<Vec<FlowEdge>>,
    entry: FlowNodeId,
    exit: FlowNodeId,
}

impl FlowGraph {
    pub fn new(entry_span: Span) -> Self {
        let entry_node = FlowNode::new(FlowNodeKind::Entry, Some(entry_span.clone()));
        let exit_node = FlowNode::new(FlowNodeKind::Exit, Some(entry_span));

        Self {
            nodes: vec![entry_node, exit_node],
            adjacency: vec![Vec::new(), Vec::new()],
            entry: 0,
            exit: 1,
        }
    }

    pub fn entry(&self) -> FlowNodeId {
        self.entry
    }

    pub fn exit(&self) -> FlowNodeId {
        self.exit
    }

    pub fn node(&self, id: FlowNodeId) -> &FlowNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: FlowNodeId) -> &mut FlowNode {
        &mut self.nodes[id]
    }

    pub fn adjacency(&self, id: FlowNodeId) -> &[FlowEdge] {
        &self.adjacency[id]
    }

    pub fn add_node(&mut self, kind: FlowNodeKind, span: Option<Span>) -> FlowNodeId {
        let id = self.nodes.len();
        self.nodes.push(FlowNode::new(kind, span));
        self.adjacency.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, from: FlowNodeId, to: FlowNodeId, kind: FlowEdgeKind) {
        self.adjacency[from].push(FlowEdge { to, kind });
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Narrowest node whose span contains `at`; later nodes win ties so a
    /// query lands on the statement actually enclosing the point.
    pub fn node_at(&self, at: &Span) -> Option<FlowNodeId> {
        let mut best: Option<(FlowNodeId, usize)> = None;
        for (id, node) in self.nodes.iter().enumerate() {
            let Some(span) = node.span() else { continue };
            if !span.contains(at) {
                continue;
            }
            let extent = span
                .end_line
                .saturating_sub(span.start_line)
                .saturating_mul(10_000)
                + span.end_column.saturating_sub(span.start_column);
            match best {
                Some((_, smallest)) if extent > smallest => {}
                _ => best = Some((id, extent)),
            }
        }
        best.map(|(id, _)| id)
    }
}

#[derive(Debug)]
pub struct FlowNode {
    kind: FlowNodeKind,
    span: Option<Span>,
    facts: Vec<NodeFact>,
}

impl FlowNode {
    pub fn new(kind: FlowNodeKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            facts: Vec::new(),
        }
    }

    pub fn kind(&self) -> &FlowNodeKind {
        &self.kind
    }

    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn facts(&self) -> &[NodeFact] {
        &self.facts
    }

    pub fn push_fact(&mut self, fact: NodeFact) {
        self.facts.push(fact);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowNodeKind {
    Entry,
    Exit,
    Statement,
    Expression,
    Merge,
}

/// State transformers attached to a node, applied in order.
#[derive(Debug, Clone)]
pub enum NodeFact {
    Assign { key: TargetKey, state: Nullness },
    Assert { key: TargetKey },
}

#[derive(Debug, Clone)]
pub struct FlowEdge {
    pub to: FlowNodeId,
    pub kind: FlowEdgeKind,
}

#[derive(Debug, Clone)]
pub enum FlowEdgeKind {
    Normal,
    TrueBranch { assertions: Vec<TargetKey> },
    FalseBranch { assertions: Vec<TargetKey> },
    LoopBack,
}

impl FlowEdgeKind {
    pub fn apply(&self, state: &mut FlowState) {
        match self {
            FlowEdgeKind::Normal | FlowEdgeKind::LoopBack => {}
            FlowEdgeKind::TrueBranch { assertions } | FlowEdgeKind::FalseBranch { assertions } => {
                for key in assertions {
                    state.assert_not_null(key.clone());
                }
            }
        }
    }
}

/// Per-point nullness of every tracked target key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowState {
    states: FxHashMap<TargetKey, Nullness>,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, key: TargetKey, state: Nullness) {
        self.states.insert(key, state);
    }

    pub fn assert_not_null(&mut self, key: TargetKey) {
        self.states.insert(key, Nullness::NotNull);
    }

    pub fn get(&self, key: &TargetKey) -> Option<Nullness> {
        self.states.get(key).copied()
    }

    /// Joins the state arriving over another path into `self`; true when
    /// anything changed. A key one side knows nothing about weakens to
    /// `MaybeNull`, so a guarantee survives a merge only when every path
    /// carries it.
    pub fn merge_with(&mut self, other: &FlowState) -> bool {
        let mut changed = false;
        for (key, current) in self.states.iter_mut() {
            let joined = match other.states.get(key) {
                Some(other_state) => current.join(*other_state),
                None => Nullness::MaybeNull,
            };
            if joined != *current {
                *current = joined;
                changed = true;
            }
        }
        for key in other.states.keys() {
            if !self.states.contains_key(key) {
                self.states.insert(key.clone(), Nullness::MaybeNull);
                changed = true;
            }
        }
        changed
    }
}
