// nn_checker/flow/events - Flow events, target keys, and guard recognition
use std::fmt;

use nn_ast::{Argument, BinaryOp, Expression, Literal, Span, UnaryOp};
use nn_semantics::{SemanticModel, SymbolInfo};

use crate::annotations::{has_mark, Mark};
use crate::classify::Nullness;
use crate::diagnostics::ShapeError;
use crate::known::KnownSymbols;
use crate::underlying::underlying_member;

/// Normalized identity for a tracked expression: the dotted identifier path
/// from the outermost receiver, with an enclosing-instance `this.` collapsed.
/// Element accesses, calls, and casts have no stable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey(String);

impl TargetKey {
    pub fn from_path(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dotted-path key of an expression, or `None` when the shape breaks key
/// identity.
pub fn target_key(expr: &Expression) -> Option<TargetKey> {
    path_of(expr).map(TargetKey::from_path)
}

fn path_of(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Identifier(name, _) => Some(name.clone()),
        Expression::This(_) => Some("this".to_string()),
        Expression::MemberBinding { name, .. } => Some(name.clone()),
        Expression::MemberAccess { receiver, name, .. } => match receiver.as_ref() {
            Expression::This(_) => Some(name.clone()),
            other => Some(format!("{}.{}", path_of(other)?, name)),
        },
        Expression::Parenthesized { expr: inner, .. } => path_of(inner),
        _ => None,
    }
}

/// One entry in the ordered per-method event list. Positions are the flow
/// node ids assigned in walk order.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    Assignment {
        key: TargetKey,
        state: Nullness,
        position: usize,
        span: Span,
    },
    GuardAssert {
        key: TargetKey,
        position: usize,
        span: Span,
    },
    Constraint {
        key: TargetKey,
        position: usize,
        span: Span,
    },
}

impl FlowEvent {
    pub fn key(&self) -> &TargetKey {
        match self {
            FlowEvent::Assignment { key, .. }
            | FlowEvent::GuardAssert { key, .. }
            | FlowEvent::Constraint { key, .. } => key,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            FlowEvent::Assignment { position, .. }
            | FlowEvent::GuardAssert { position, .. }
            | FlowEvent::Constraint { position, .. } => *position,
        }
    }
}

/// Keys proved non-null on each branch of a condition.
#[derive(Debug, Clone, Default)]
pub struct ConditionFacts {
    pub when_true: Vec<TargetKey>,
    pub when_false: Vec<TargetKey>,
}

impl ConditionFacts {
    fn swapped(self) -> Self {
        Self {
            when_true: self.when_false,
            when_false: self.when_true,
        }
    }

    fn merged(mut self, other: Self) -> Self {
        self.when_true.extend(other.when_true);
        self.when_false.extend(other.when_false);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.when_true.is_empty() && self.when_false.is_empty()
    }
}

/// Extracts the null-related facts a condition proves. Operand shapes the
/// resolver rejects are recorded in `failures` and contribute no facts.
pub fn condition_facts(
    expr: &Expression,
    model: &SemanticModel,
    known: &KnownSymbols,
    failures: &mut Vec<ShapeError>,
) -> ConditionFacts {
    match expr {
        Expression::Parenthesized { expr: inner, .. } => {
            condition_facts(inner, model, known, failures)
        }
        Expression::Unary {
            op: UnaryOp::Not,
            operand,
            ..
        } => condition_facts(operand, model, known, failures).swapped(),
        Expression::Binary {
            op: BinaryOp::And,
            left,
            right,
            ..
        } => {
            // Both conjuncts hold on the true branch; the false branch
            // proves nothing.
            let mut facts = condition_facts(left, model, known, failures)
                .merged(condition_facts(right, model, known, failures));
            facts.when_false.clear();
            facts
        }
        Expression::Binary {
            op: BinaryOp::Or,
            left,
            right,
            ..
        } => {
            let mut facts = condition_facts(left, model, known, failures)
                .merged(condition_facts(right, model, known, failures));
            facts.when_true.clear();
            facts
        }
        Expression::Binary {
            op: op @ (BinaryOp::Equal | BinaryOp::NotEqual),
            left,
            right,
            ..
        } => {
            let target = match (left.as_ref(), right.as_ref()) {
                (Expression::Literal(Literal::Null, _), other)
                | (other, Expression::Literal(Literal::Null, _)) => Some(other),
                _ => None,
            };
            let Some(target) = target else {
                return ConditionFacts::default();
            };
            let Some(key) = keyed(target, failures) else {
                return ConditionFacts::default();
            };
            let mut facts = ConditionFacts::default();
            match op {
                BinaryOp::NotEqual => facts.when_true.push(key),
                _ => facts.when_false.push(key),
            }
            facts
        }
        Expression::Invocation { callee, args, .. } => {
            invocation_facts(expr, callee, args, model, known, failures)
        }
        _ => ConditionFacts::default(),
    }
}

fn invocation_facts(
    expr: &Expression,
    callee: &Expression,
    args: &[Argument],
    model: &SemanticModel,
    known: &KnownSymbols,
    failures: &mut Vec<ShapeError>,
) -> ConditionFacts {
    let Some(symbol) = model.symbol_of(expr) else {
        return ConditionFacts::default();
    };
    let compilation = model.compilation();
    let mut facts = ConditionFacts::default();

    // Uri.TryCreate's out parameter asserts nothing.
    if known.is_uri_try_create(compilation, symbol) {
        return facts;
    }

    if known.is_string_null_probe(compilation, symbol) {
        // IsNullOrEmpty(x) false means x is non-null.
        if let Some(first) = args.first() {
            if let Some(key) = keyed(&first.value, failures) {
                facts.when_false.push(key);
            }
        }
        return facts;
    }

    if has_mark(compilation, symbol, &[Mark::IsNullCheck]) {
        // target.Probe() truthy asserts the receiver.
        if let Expression::MemberAccess { receiver, .. } = callee {
            if let Some(key) = keyed(receiver, failures) {
                facts.when_true.push(key);
            }
        }
    }

    facts
}

fn keyed(expr: &Expression, failures: &mut Vec<ShapeError>) -> Option<TargetKey> {
    match underlying_member(expr) {
        Ok(resolved) => target_key(resolved),
        Err(error) => {
            failures.push(error);
            None
        }
    }
}

/// Returns the arguments of `expr` when it invokes `Constraint.NotNull`.
/// Resolution prefers the bound symbol's containing type; a syntactic match
/// on `Constraint.NotNull(...)` covers unresolved calls.
pub fn constraint_call<'e>(
    expr: &'e Expression,
    model: &SemanticModel,
) -> Option<&'e [Argument]> {
    let Expression::Invocation { callee, args, .. } = expr else {
        return None;
    };

    if let Some(symbol) = model.symbol_of(expr) {
        if let SymbolInfo::Method(method) = model.compilation().symbol(symbol) {
            let in_constraint_type = method
                .containing_type
                .map(|ty| model.compilation().type_symbol(ty).name == "Constraint")
                .unwrap_or(false);
            if in_constraint_type && method.name == "NotNull" {
                return Some(args);
            }
        }
    }

    match callee.as_ref() {
        Expression::MemberAccess { receiver, name, .. } if name == "NotNull" => {
            match receiver.as_ref() {
                Expression::Identifier(target, _) if target == "Constraint" => Some(args),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Outcome of reading a constraint call's first argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintTarget {
    /// A direct member/identifier, or a lambda returning one.
    Key(TargetKey, Span),
    /// Anything else; reported as an invalid constraint.
    Invalid(Span),
}

pub fn constraint_target(args: &[Argument], call_span: &Span) -> ConstraintTarget {
    let Some(first) = args.first() else {
        return ConstraintTarget::Invalid(call_span.clone());
    };

    let candidate = match &first.value {
        Expression::Lambda { body, .. } => body.as_ref(),
        other => other,
    };

    match candidate {
        Expression::Identifier(..)
        | Expression::MemberAccess { .. }
        | Expression::MemberBinding { .. } => match target_key(candidate) {
            Some(key) => ConstraintTarget::Key(key, candidate.span().clone()),
            None => ConstraintTarget::Invalid(call_span.clone()),
        },
        _ => ConstraintTarget::Invalid(call_span.clone()),
    }
}
