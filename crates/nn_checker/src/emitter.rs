// nn_checker/emitter - Block traversal and diagnostic emission
use std::borrow::Cow;

use nn_ast::{
    Argument, BinaryOp, Expression, Literal, MemberDecl, MethodBody, Span, Statement, StringPart,
};
use nn_semantics::{SemanticModel, SymbolId};
use nn_support::{CancellationToken, Cancelled};
use rustc_hash::FxHashSet;

use crate::annotations::{has_mark, CONTRACT_MARKS};
use crate::classify::{Classifier, ClassifyContext};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, ShapeError};
use crate::flow::{
    constraint_call, constraint_target, target_key, ConstraintTarget, ExpressionStatus,
    MethodFlowAnalysis,
};
use crate::known::KnownSymbols;
use crate::session::AnalyzerSession;
use crate::underlying::underlying_member;

/// Drives the analysis of one member's code block and reports the catalog
/// diagnostics into the host's sink.
pub struct BlockAnalyzer<'s, 'm> {
    session: &'s AnalyzerSession<'m>,
}

impl<'s, 'm> BlockAnalyzer<'s, 'm> {
    pub fn new(session: &'s AnalyzerSession<'m>) -> Self {
        Self { session }
    }

    pub fn check_member(
        &self,
        member: &MemberDecl,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), Cancelled> {
        let model = self.session.model();
        match member {
            MemberDecl::Method(decl) => {
                let Some(body) = &decl.body else {
                    return Ok(());
                };
                let symbol = model.declared_symbol_of(&decl.span);
                let statements = normalized_body(body);
                self.run_block(symbol, statements.as_ref(), None, sink)
            }
            MemberDecl::Constructor(decl) => {
                let symbol = model.declared_symbol_of(&decl.span);
                self.run_block(symbol, &decl.body, decl.initializer.as_ref(), sink)
            }
            MemberDecl::Property(decl) => {
                for accessor in [decl.getter.as_ref(), decl.setter.as_ref()]
                    .into_iter()
                    .flatten()
                {
                    let Some(body) = &accessor.body else {
                        continue;
                    };
                    let symbol = model.declared_symbol_of(&accessor.span);
                    let statements = normalized_body(body);
                    self.run_block(symbol, statements.as_ref(), None, sink)?;
                }
                Ok(())
            }
            MemberDecl::Field(_) => Ok(()),
        }
    }

    fn run_block(
        &self,
        method: Option<SymbolId>,
        body: &[Statement],
        initializer: Option<&nn_ast::ConstructorInitializer>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), Cancelled> {
        let analysis = self.session.method_analysis(method, body)?;
        let model = self.session.model();
        let known = self.session.known();

        let mut walker = BlockWalker {
            model,
            known,
            classifier: Classifier::new(model, known),
            analysis: analysis.as_ref(),
            method,
            token: self.session.token(),
            sink,
            reported_shapes: FxHashSet::default(),
            lambda_depth: 0,
        };

        if let Some(initializer) = initializer {
            walker.check_initializer(initializer)?;
        }
        walker.check_statements(body)?;

        for failure in analysis.shape_failures() {
            walker.report_shape(failure.clone());
        }
        for (key, span) in analysis.assignments_after_constraints() {
            walker.sink.report(Diagnostic::new(
                DiagnosticKind::AssignmentAfterConstraint,
                span,
                key.as_str(),
            ));
        }

        Ok(())
    }
}

fn normalized_body(body: &MethodBody) -> Cow<'_, [Statement]> {
    match body {
        MethodBody::Block(statements) => Cow::Borrowed(statements.as_slice()),
        // An expression body is an implicit return.
        MethodBody::Expression(expr) => Cow::Owned(vec![Statement::Return {
            value: Some(expr.clone()),
            span: expr.span().clone(),
        }]),
    }
}

struct BlockWalker<'a, 'm> {
    model: &'m SemanticModel,
    known: &'a KnownSymbols,
    classifier: Classifier<'a>,
    analysis: &'a MethodFlowAnalysis,
    method: Option<SymbolId>,
    token: &'a CancellationToken,
    sink: &'a mut dyn DiagnosticSink,
    reported_shapes: FxHashSet<Span>,
    lambda_depth: usize,
}

impl<'a, 'm: 'a> BlockWalker<'a, 'm> {
    fn check_statements(&mut self, statements: &[Statement]) -> Result<(), Cancelled> {
        for statement in statements {
            self.token.ensure_active()?;
            self.check_statement(statement)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<(), Cancelled> {
        match statement {
            Statement::LocalDeclaration { initializer, .. } => {
                if let Some(initializer) = initializer {
                    self.visit_expression(initializer)?;
                }
            }
            Statement::Expression { expr, .. } => self.visit_expression(expr)?,
            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit_expression(condition)?;
                self.check_statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch)?;
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                self.visit_expression(condition)?;
                self.check_statement(body)?;
            }
            Statement::Foreach {
                iterable, body, ..
            } => {
                self.visit_expression(iterable)?;
                self.check_statement(body)?;
            }
            Statement::Return { value, .. } => {
                if let Some(value) = value {
                    self.visit_expression(value)?;
                    self.check_return(value);
                }
            }
            Statement::Throw { expr, .. } => {
                if let Some(expr) = expr {
                    self.visit_expression(expr)?;
                }
            }
            Statement::Block { statements, .. } => self.check_statements(statements)?,
        }
        Ok(())
    }

    fn visit_expression(&mut self, expr: &Expression) -> Result<(), Cancelled> {
        match expr {
            Expression::Binary {
                op: BinaryOp::Equal | BinaryOp::NotEqual,
                left,
                right,
                span,
            } => {
                if let Some(target) = null_check_target(left, right) {
                    if self.provably_non_null(target) {
                        let context = describe(target);
                        self.sink.report(Diagnostic::new(
                            DiagnosticKind::UnneededNullCheck,
                            span.clone(),
                            context,
                        ));
                    }
                }
            }
            Expression::Binary {
                op: BinaryOp::Coalesce,
                left,
                ..
            } => {
                if self.provably_non_null(left) {
                    let context = describe(left);
                    self.sink.report(Diagnostic::new(
                        DiagnosticKind::UnneededNullCheck,
                        left.span().clone(),
                        context,
                    ));
                }
            }
            Expression::ConditionalAccess { receiver, .. } => {
                if self.provably_non_null(receiver) {
                    let context = describe(receiver);
                    self.sink.report(Diagnostic::new(
                        DiagnosticKind::UnneededNullCheck,
                        receiver.span().clone(),
                        context,
                    ));
                }
            }
            Expression::Invocation { args, .. } => {
                if let Some(constraint_args) = constraint_call(expr, self.model) {
                    self.check_constraint(expr, constraint_args);
                    for argument in constraint_args {
                        self.visit_expression(&argument.value)?;
                    }
                    return Ok(());
                }
                let target = self.model.symbol_of(expr);
                self.check_argument_list(target, args, false);
            }
            Expression::ObjectCreation { args, .. } => {
                let target = self.model.symbol_of(expr);
                self.check_argument_list(target, args, false);
            }
            Expression::Assignment { target, value, .. } => {
                self.check_assignment(target, value);
            }
            _ => {}
        }

        self.visit_children(expr)
    }

    fn visit_children(&mut self, expr: &Expression) -> Result<(), Cancelled> {
        match expr {
            Expression::Literal(..)
            | Expression::Identifier(..)
            | Expression::MemberBinding { .. }
            | Expression::This(..)
            | Expression::Base(..)
            | Expression::NameOf { .. } => Ok(()),
            Expression::InterpolatedString { parts, .. } => {
                for part in parts {
                    if let StringPart::Expression(inner) = part {
                        self.visit_expression(inner)?;
                    }
                }
                Ok(())
            }
            Expression::Binary { left, right, .. } => {
                self.visit_expression(left)?;
                self.visit_expression(right)
            }
            Expression::Unary { operand, .. } => self.visit_expression(operand),
            Expression::Assignment { target, value, .. } => {
                self.visit_expression(target)?;
                self.visit_expression(value)
            }
            Expression::Ternary {
                condition,
                when_true,
                when_false,
                ..
            } => {
                self.visit_expression(condition)?;
                self.visit_expression(when_true)?;
                self.visit_expression(when_false)
            }
            Expression::Invocation { callee, args, .. } => {
                self.visit_expression(callee)?;
                for argument in args {
                    self.visit_expression(&argument.value)?;
                }
                Ok(())
            }
            Expression::MemberAccess { receiver, .. } => self.visit_expression(receiver),
            Expression::ConditionalAccess {
                receiver,
                when_not_null,
                ..
            } => {
                self.visit_expression(receiver)?;
                self.visit_expression(when_not_null)
            }
            Expression::ElementAccess {
                receiver, index, ..
            } => {
                self.visit_expression(receiver)?;
                self.visit_expression(index)
            }
            Expression::ElementBinding { index, .. } => self.visit_expression(index),
            Expression::ObjectCreation { args, .. } => {
                for argument in args {
                    self.visit_expression(&argument.value)?;
                }
                Ok(())
            }
            Expression::ArrayCreation { elements, .. } => {
                for element in elements {
                    self.visit_expression(element)?;
                }
                Ok(())
            }
            Expression::Cast { expr: inner, .. }
            | Expression::Parenthesized { expr: inner, .. }
            | Expression::Await { expr: inner, .. } => self.visit_expression(inner),
            Expression::Throw { expr: inner, .. } => match inner {
                Some(inner) => self.visit_expression(inner),
                None => Ok(()),
            },
            Expression::Lambda { body, .. } => {
                self.lambda_depth += 1;
                let outcome = self.visit_expression(body);
                self.lambda_depth -= 1;
                outcome
            }
            Expression::Block { statements, .. } => self.check_statements(statements),
            Expression::Tuple { elements, .. } => {
                for element in elements {
                    self.visit_expression(element)?;
                }
                Ok(())
            }
        }
    }

    /// Argument-position checks against the callee's declared parameters.
    /// A `params` parameter terminates checking; `ref`/`out` passing of an
    /// annotated symbol is its own diagnostic.
    fn check_argument_list(
        &mut self,
        target: Option<SymbolId>,
        args: &[Argument],
        in_ctor_initializer: bool,
    ) {
        let model = self.model;
        let compilation = model.compilation();
        let Some(symbol) = target else { return };
        let Some(method) = compilation.symbol(symbol).as_method() else {
            return;
        };
        let within_to_list = self.known.is_enumerable_to_list(compilation, symbol);
        let parameters = method.parameters.clone();

        for (argument, parameter_id) in args.iter().zip(parameters) {
            let Some(parameter) = compilation.symbol(parameter_id).as_parameter() else {
                continue;
            };
            if parameter.is_params {
                break;
            }

            if argument.ref_kind.is_some() || parameter.ref_kind.is_some() {
                match underlying_member(&argument.value) {
                    Ok(node) => {
                        if let Some(argument_symbol) = model.symbol_of(node) {
                            if has_mark(compilation, argument_symbol, CONTRACT_MARKS) {
                                let context = describe(&argument.value);
                                self.sink.report(Diagnostic::new(
                                    DiagnosticKind::NotNullAsRefParameter,
                                    argument.value.span().clone(),
                                    context,
                                ));
                            }
                        }
                    }
                    Err(error) => self.report_shape(error),
                }
                continue;
            }

            if !has_mark(compilation, parameter_id, CONTRACT_MARKS) {
                continue;
            }

            let mut ctx = ClassifyContext::new();
            ctx.within_to_list = within_to_list;
            match self.analysis.is_always_assigned(
                &argument.value,
                argument.value.span(),
                &self.classifier,
                &mut ctx,
            ) {
                Ok(status) => self.report_status(
                    status,
                    argument.value.span().clone(),
                    in_ctor_initializer,
                    describe(&argument.value),
                ),
                Err(error) => self.report_shape(error),
            }
        }
    }

    fn check_assignment(&mut self, target: &Expression, value: &Expression) {
        let model = self.model;
        let compilation = model.compilation();
        let resolved = match underlying_member(target) {
            Ok(node) => node,
            Err(error) => {
                self.report_shape(error);
                return;
            }
        };
        let Some(symbol) = model.symbol_of(resolved) else {
            return;
        };
        if !has_mark(compilation, symbol, CONTRACT_MARKS) {
            return;
        }

        let mut ctx = ClassifyContext::new();
        match self
            .analysis
            .is_always_assigned(value, value.span(), &self.classifier, &mut ctx)
        {
            Ok(status) => {
                self.report_status(status, value.span().clone(), false, describe(target))
            }
            Err(error) => self.report_shape(error),
        }
    }

    /// A `NotNull` method's return value is a sink like any annotated target.
    fn check_return(&mut self, value: &Expression) {
        if self.lambda_depth > 0 {
            return;
        }
        let Some(method) = self.method else { return };
        if !has_mark(self.model.compilation(), method, CONTRACT_MARKS) {
            return;
        }

        let mut ctx = ClassifyContext::new();
        match self
            .analysis
            .is_always_assigned(value, value.span(), &self.classifier, &mut ctx)
        {
            Ok(status) => {
                self.report_status(status, value.span().clone(), false, describe(value))
            }
            Err(error) => self.report_shape(error),
        }
    }

    fn check_constraint(&mut self, call: &Expression, args: &[Argument]) {
        match constraint_target(args, call.span()) {
            ConstraintTarget::Invalid(span) => {
                self.sink.report(Diagnostic::new(
                    DiagnosticKind::InvalidConstraint,
                    span,
                    "constraint argument must be a member access or a lambda returning one",
                ));
            }
            ConstraintTarget::Key(key, span) => {
                let candidate = match args.first().map(|argument| &argument.value) {
                    Some(Expression::Lambda { body, .. }) => body.as_ref(),
                    Some(other) => other,
                    None => return,
                };
                let resolved = match underlying_member(candidate) {
                    Ok(node) => node,
                    Err(error) => {
                        self.report_shape(error);
                        return;
                    }
                };
                if let Some(symbol) = self.model.symbol_of(resolved) {
                    if has_mark(self.model.compilation(), symbol, CONTRACT_MARKS) {
                        self.sink.report(Diagnostic::new(
                            DiagnosticKind::UnneededConstraint,
                            span,
                            key.as_str(),
                        ));
                    }
                }
            }
        }
    }

    fn check_initializer(
        &mut self,
        initializer: &nn_ast::ConstructorInitializer,
    ) -> Result<(), Cancelled> {
        let target = self.model.symbol_at(&initializer.span);
        self.check_argument_list(target, &initializer.args, true);
        for argument in &initializer.args {
            self.visit_expression(&argument.value)?;
        }
        Ok(())
    }

    fn report_status(
        &mut self,
        status: ExpressionStatus,
        span: Span,
        in_ctor_initializer: bool,
        context: String,
    ) {
        let kind = if in_ctor_initializer {
            // Initializers run before the body's guards; only the hard case
            // is reportable.
            match status {
                ExpressionStatus::NotAssigned => Some(DiagnosticKind::PropagateNotNullInCtors),
                _ => None,
            }
        } else {
            match status {
                ExpressionStatus::Assigned => None,
                ExpressionStatus::NotAssigned => Some(DiagnosticKind::NullAssignment),
                ExpressionStatus::ReassignedAfterCondition => {
                    Some(DiagnosticKind::AssignmentAfterCondition)
                }
                ExpressionStatus::AssignedWithUnneededConstraint => {
                    Some(DiagnosticKind::UnneededConstraint)
                }
            }
        };

        if let Some(kind) = kind {
            self.sink.report(Diagnostic::new(kind, span, context));
        }
    }

    fn provably_non_null(&mut self, expr: &Expression) -> bool {
        let model = self.model;
        let resolved = match underlying_member(expr) {
            Ok(node) => node,
            Err(error) => {
                self.report_shape(error);
                return false;
            }
        };
        if let Some(symbol) = model.symbol_of(resolved) {
            if has_mark(model.compilation(), symbol, CONTRACT_MARKS) {
                return true;
            }
        }

        let mut ctx = ClassifyContext::new();
        match self.classifier.classify(expr, &mut ctx) {
            Ok(nullness) => nullness.is_not_null(),
            Err(error) => {
                self.report_shape(error);
                false
            }
        }
    }

    fn report_shape(&mut self, error: ShapeError) {
        if self.reported_shapes.insert(error.span.clone()) {
            self.sink.report(error.into_diagnostic());
        }
    }
}

fn null_check_target<'e>(left: &'e Expression, right: &'e Expression) -> Option<&'e Expression> {
    match (left, right) {
        (Expression::Literal(Literal::Null, _), other)
        | (other, Expression::Literal(Literal::Null, _)) => Some(other),
        _ => None,
    }
}

fn describe(expr: &Expression) -> String {
    target_key(expr)
        .map(|key| key.to_string())
        .unwrap_or_else(|| expr.kind_name().to_string())
}
