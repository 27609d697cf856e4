// nn_checker/classify - Value nullness classification
use nn_ast::{BinaryOp, Expression, Literal};
use nn_semantics::{ParameterScope, SemanticModel, SymbolId, SymbolInfo};

use crate::annotations::{has_mark, CONTRACT_MARKS};
use crate::diagnostics::ShapeError;
use crate::known::{unwrap_task_type, KnownSymbols};
use crate::underlying::underlying_member;

/// Three-valued nullness assigned to every expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullness {
    NotNull,
    Null,
    MaybeNull,
}

impl Nullness {
    /// Least upper bound used when flow states merge: equal operands keep
    /// their value, anything else weakens to `MaybeNull`.
    pub fn join(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Nullness::MaybeNull
        }
    }

    pub fn is_not_null(self) -> bool {
        matches!(self, Nullness::NotNull)
    }
}

/// Side-channel facts collected while classifying.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext {
    /// Set when the answer rests on a `NotNull` annotation or a known
    /// framework member rather than the expression's own shape.
    pub has_not_null_attribute: bool,
    /// Set by the caller when the classified expression is an argument of an
    /// `Enumerable.ToList` invocation.
    pub within_to_list: bool,
}

impl ClassifyContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Recursive-descent classifier over expression shapes.
pub struct Classifier<'a> {
    model: &'a SemanticModel,
    known: &'a KnownSymbols,
}

impl<'a> Classifier<'a> {
    pub fn new(model: &'a SemanticModel, known: &'a KnownSymbols) -> Self {
        Self { model, known }
    }

    pub fn classify(
        &self,
        expr: &Expression,
        ctx: &mut ClassifyContext,
    ) -> Result<Nullness, ShapeError> {
        match expr {
            Expression::Literal(Literal::Null, _) => Ok(Nullness::Null),
            Expression::Literal(Literal::String(_), _)
            | Expression::InterpolatedString { .. }
            | Expression::NameOf { .. } => Ok(Nullness::NotNull),

            Expression::ObjectCreation { .. }
            | Expression::ArrayCreation { .. }
            | Expression::This(_)
            | Expression::Lambda { .. } => Ok(Nullness::NotNull),

            // The value of a throw-expression is unreachable; conservatively
            // non-null.
            Expression::Throw { .. } => Ok(Nullness::NotNull),

            Expression::Identifier(..) | Expression::MemberBinding { .. } => {
                Ok(self.classify_symbol(expr, ctx))
            }

            Expression::Invocation { .. } => self.classify_invocation(expr, ctx),

            Expression::Assignment { value, .. } => self.classify(value, ctx),

            // Member access classifies the member's name.
            Expression::MemberAccess { .. } => Ok(self.classify_symbol(expr, ctx)),

            Expression::Binary {
                op: BinaryOp::Coalesce,
                right,
                ..
            } => {
                // The right operand is the value on the non-null branch.
                let resolved = underlying_member(right)?;
                self.classify(resolved, ctx)
            }

            Expression::ConditionalAccess { when_not_null, .. } => {
                self.classify(when_not_null, ctx)
            }

            Expression::Ternary {
                when_true,
                when_false,
                ..
            } => {
                let first = self.classify(when_true, ctx)?;
                let second = self.classify(when_false, ctx)?;
                if first.is_not_null() && second.is_not_null() {
                    Ok(Nullness::NotNull)
                } else {
                    Ok(Nullness::MaybeNull)
                }
            }

            Expression::Cast { expr: inner, .. } | Expression::Parenthesized { expr: inner, .. } => {
                self.classify(inner, ctx)
            }

            Expression::Binary {
                op: BinaryOp::As,
                left,
                ..
            } => self.classify(left, ctx),

            Expression::Await { expr: inner, .. } => self.classify_await(inner, ctx),

            Expression::Binary {
                op: BinaryOp::Add, ..
            } => Ok(self.classify_add(expr, ctx)),

            _ => Ok(Nullness::MaybeNull),
        }
    }

    fn classify_symbol(&self, expr: &Expression, ctx: &mut ClassifyContext) -> Nullness {
        let Some(symbol) = self.model.symbol_of(expr) else {
            return Nullness::MaybeNull;
        };
        let compilation = self.model.compilation();

        match compilation.symbol(symbol) {
            SymbolInfo::Local(local) => {
                if local.is_foreach {
                    Nullness::NotNull
                } else {
                    Nullness::MaybeNull
                }
            }
            SymbolInfo::Parameter(parameter) => {
                if parameter.is_setter_value {
                    if let Some(setter) = parameter.owner {
                        if has_mark(compilation, setter, CONTRACT_MARKS) {
                            ctx.has_not_null_attribute = true;
                            return Nullness::NotNull;
                        }
                    }
                    return Nullness::MaybeNull;
                }

                match &parameter.scope {
                    ParameterScope::Lambda { in_enumerable, .. } if *in_enumerable => {
                        // Enumerable combinators never hand lambdas a null
                        // element.
                        Nullness::NotNull
                    }
                    ParameterScope::Lambda {
                        delegate_parameter, ..
                    } => match delegate_parameter {
                        Some(delegate) if has_mark(compilation, *delegate, CONTRACT_MARKS) => {
                            Nullness::NotNull
                        }
                        _ => Nullness::Null,
                    },
                    ParameterScope::Member => self.classify_plain_symbol(symbol),
                }
            }
            SymbolInfo::Property(_) => {
                if self
                    .known
                    .is_known_non_null_property(compilation, symbol)
                {
                    return Nullness::NotNull;
                }
                self.classify_plain_symbol(symbol)
            }
            SymbolInfo::Method(_) => {
                if self.known.is_known_non_null_method(compilation, symbol) {
                    return Nullness::NotNull;
                }
                self.classify_plain_symbol(symbol)
            }
            SymbolInfo::Field(_) => self.classify_plain_symbol(symbol),
        }
    }

    fn classify_plain_symbol(&self, symbol: SymbolId) -> Nullness {
        if has_mark(self.model.compilation(), symbol, CONTRACT_MARKS) {
            Nullness::NotNull
        } else {
            Nullness::MaybeNull
        }
    }

    fn classify_invocation(
        &self,
        expr: &Expression,
        ctx: &mut ClassifyContext,
    ) -> Result<Nullness, ShapeError> {
        let Some(symbol) = self.model.symbol_of(expr) else {
            return Ok(Nullness::MaybeNull);
        };
        let compilation = self.model.compilation();

        if has_mark(compilation, symbol, CONTRACT_MARKS)
            || self.known.is_known_non_null_method(compilation, symbol)
        {
            ctx.has_not_null_attribute = true;
            return Ok(Nullness::NotNull);
        }

        if let SymbolInfo::Method(method) = compilation.symbol(symbol) {
            if let Some(return_type) = method.return_type {
                let unwrapped = unwrap_task_type(compilation, return_type);
                if compilation.type_symbol(unwrapped).is_value_type {
                    return Ok(Nullness::NotNull);
                }
            }
        }

        Ok(Nullness::MaybeNull)
    }

    fn classify_await(
        &self,
        awaited: &Expression,
        ctx: &mut ClassifyContext,
    ) -> Result<Nullness, ShapeError> {
        if let Expression::Invocation { callee, .. } = awaited {
            let is_configure_await = self
                .model
                .symbol_of(awaited)
                .map(|symbol| {
                    self.known
                        .is_configure_await(self.model.compilation(), symbol)
                })
                .unwrap_or(false);
            if is_configure_await {
                if let Expression::MemberAccess { receiver, .. } = callee.as_ref() {
                    return self.classify(receiver, ctx);
                }
            }
        }

        self.classify(awaited, ctx)
    }

    fn classify_add(&self, expr: &Expression, ctx: &ClassifyContext) -> Nullness {
        if ctx.within_to_list {
            return Nullness::NotNull;
        }
        let converted = self.model.type_of(expr);
        let is_value_type = converted
            .map(|ty| self.model.compilation().type_symbol(ty).is_value_type)
            .unwrap_or(false);
        if is_value_type || (converted.is_some() && converted == self.known.string_type()) {
            Nullness::NotNull
        } else {
            Nullness::MaybeNull
        }
    }
}
