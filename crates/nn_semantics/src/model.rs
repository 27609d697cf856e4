// nn_semantics/model - Compilation and semantic model lookups
use nn_ast::{Expression, Span};
use rustc_hash::FxHashMap;

use crate::symbols::{SymbolId, SymbolInfo, TypeId, TypeSymbol};

/// The closed set of symbols and types the host resolved for one program.
#[derive(Debug, Default)]
pub struct Compilation {
    pub(crate) types: Vec<TypeSymbol>,
    pub(crate) symbols: Vec<SymbolInfo>,
    pub(crate) by_metadata_name: FxHashMap<String, TypeId>,
}

impl Compilation {
    pub fn get_type_by_metadata_name(&self, full_name: &str) -> Option<TypeId> {
        self.by_metadata_name.get(full_name).copied()
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.0 as usize]
    }

    /// First member of `ty` with the given name, if any.
    pub fn member_named(&self, ty: TypeId, name: &str) -> Option<SymbolId> {
        self.type_symbol(ty)
            .members
            .iter()
            .copied()
            .find(|id| self.symbol(*id).name() == name)
    }

    /// Follows `original_definition` links until the unreduced, ungenericized
    /// definition is reached.
    pub fn original_definition(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        loop {
            let next = match self.symbol(current) {
                SymbolInfo::Method(m) => m.original_definition,
                SymbolInfo::Property(p) => p.original_definition,
                _ => None,
            };
            match next {
                Some(parent) if parent != current => current = parent,
                _ => return current,
            }
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

/// Span-keyed symbol and type resolution for one syntax tree, as produced by
/// the host front-end.
#[derive(Debug, Default)]
pub struct SemanticModel {
    compilation: Compilation,
    symbols_by_span: FxHashMap<Span, SymbolId>,
    types_by_span: FxHashMap<Span, TypeId>,
    declarations_by_span: FxHashMap<Span, SymbolId>,
}

impl SemanticModel {
    pub(crate) fn new(
        compilation: Compilation,
        symbols_by_span: FxHashMap<Span, SymbolId>,
        types_by_span: FxHashMap<Span, TypeId>,
        declarations_by_span: FxHashMap<Span, SymbolId>,
    ) -> Self {
        Self {
            compilation,
            symbols_by_span,
            types_by_span,
            declarations_by_span,
        }
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    /// The symbol an expression node resolves to, if the host bound one.
    pub fn symbol_of(&self, expr: &Expression) -> Option<SymbolId> {
        self.symbol_at(expr.span())
    }

    /// Span-keyed variant of [`Self::symbol_of`] for syntax that is not an
    /// expression, such as constructor initializers.
    pub fn symbol_at(&self, span: &Span) -> Option<SymbolId> {
        self.symbols_by_span.get(span).copied()
    }

    /// The converted type of an expression node, if the host bound one.
    pub fn type_of(&self, expr: &Expression) -> Option<TypeId> {
        self.types_by_span.get(expr.span()).copied()
    }

    /// The symbol introduced by a declaration node, keyed by the
    /// declaration's span.
    pub fn declared_symbol_of(&self, decl_span: &Span) -> Option<SymbolId> {
        self.declarations_by_span.get(decl_span).copied()
    }
}
