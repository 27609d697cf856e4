// nn_semantics/builder - Incremental construction of semantic models
use nn_ast::{AccessorKind, Span};
use rustc_hash::FxHashMap;

use crate::model::{Compilation, SemanticModel};
use crate::symbols::{
    FieldSymbol, LocalSymbol, MethodSymbol, ParameterSymbol, PropertySymbol, SymbolId, SymbolInfo,
    TypeId, TypeSymbol,
};

/// Builds a [`SemanticModel`] the way host binders and tests assemble one:
/// register types and symbols, wire their cross-links, then bind syntax spans
/// to the resolved entities.
#[derive(Debug, Default)]
pub struct SemanticModelBuilder {
    types: Vec<TypeSymbol>,
    symbols: Vec<SymbolInfo>,
    by_metadata_name: FxHashMap<String, TypeId>,
    symbols_by_span: FxHashMap<Span, SymbolId>,
    types_by_span: FxHashMap<Span, TypeId>,
    declarations_by_span: FxHashMap<Span, SymbolId>,
}

impl SemanticModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, ty: TypeSymbol) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.by_metadata_name.insert(ty.metadata_name.clone(), id);
        self.types.push(ty);
        id
    }

    pub fn add_method(&mut self, method: MethodSymbol) -> SymbolId {
        self.push_symbol(SymbolInfo::Method(method))
    }

    pub fn add_property(&mut self, property: PropertySymbol) -> SymbolId {
        self.push_symbol(SymbolInfo::Property(property))
    }

    pub fn add_field(&mut self, field: FieldSymbol) -> SymbolId {
        self.push_symbol(SymbolInfo::Field(field))
    }

    pub fn add_local(&mut self, local: LocalSymbol) -> SymbolId {
        self.push_symbol(SymbolInfo::Local(local))
    }

    pub fn add_parameter(&mut self, parameter: ParameterSymbol) -> SymbolId {
        self.push_symbol(SymbolInfo::Parameter(parameter))
    }

    fn push_symbol(&mut self, info: SymbolInfo) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        if let Some(ty) = info.containing_type() {
            self.types[ty.0 as usize].members.push(id);
        }
        self.symbols.push(info);
        id
    }

    /// Records `parameters` as the ordered parameter list of `method` and
    /// points each parameter back at its owner.
    pub fn set_parameters(&mut self, method: SymbolId, parameters: Vec<SymbolId>) {
        for parameter in &parameters {
            if let SymbolInfo::Parameter(param) = &mut self.symbols[parameter.0 as usize] {
                param.owner = Some(method);
            }
        }
        if let SymbolInfo::Method(m) = &mut self.symbols[method.0 as usize] {
            m.parameters = parameters;
        }
    }

    /// Wires a property and one of its accessor methods together.
    pub fn link_accessor(&mut self, property: SymbolId, kind: AccessorKind, accessor: SymbolId) {
        if let SymbolInfo::Method(m) = &mut self.symbols[accessor.0 as usize] {
            m.associated_property = Some(property);
            m.accessor_kind = Some(kind);
        }
        if let SymbolInfo::Property(p) = &mut self.symbols[property.0 as usize] {
            match kind {
                AccessorKind::Get => p.getter = Some(accessor),
                AccessorKind::Set => p.setter = Some(accessor),
            }
        }
    }

    /// Marks `reduced` as a reduced or constructed form of `original`.
    pub fn set_original_definition(&mut self, reduced: SymbolId, original: SymbolId) {
        match &mut self.symbols[reduced.0 as usize] {
            SymbolInfo::Method(m) => m.original_definition = Some(original),
            SymbolInfo::Property(p) => p.original_definition = Some(original),
            _ => {}
        }
    }

    pub fn bind_symbol(&mut self, span: Span, symbol: SymbolId) {
        self.symbols_by_span.insert(span, symbol);
    }

    pub fn bind_type(&mut self, span: Span, ty: TypeId) {
        self.types_by_span.insert(span, ty);
    }

    pub fn bind_declaration(&mut self, span: Span, symbol: SymbolId) {
        self.declarations_by_span.insert(span, symbol);
    }

    pub fn build(self) -> SemanticModel {
        let compilation = Compilation {
            types: self.types,
            symbols: self.symbols,
            by_metadata_name: self.by_metadata_name,
        };
        SemanticModel::new(
            compilation,
            self.symbols_by_span,
            self.types_by_span,
            self.declarations_by_span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn_ast::Expression;

    #[test]
    fn binds_symbols_and_types_by_span() {
        let mut builder = SemanticModelBuilder::new();
        let string_ty = builder.add_type(TypeSymbol::new("String", "System.String"));
        let local = builder.add_local(LocalSymbol::new("name"));

        let span = Span::new(3, 4, 3, 8);
        builder.bind_symbol(span.clone(), local);
        builder.bind_type(span.clone(), string_ty);

        let model = builder.build();
        let expr = Expression::Identifier("name".into(), span);
        assert_eq!(model.symbol_of(&expr), Some(local));
        assert_eq!(model.type_of(&expr), Some(string_ty));
        assert_eq!(
            model.compilation().get_type_by_metadata_name("System.String"),
            Some(string_ty)
        );
    }

    #[test]
    fn original_definition_follows_reduction_chain() {
        let mut builder = SemanticModelBuilder::new();
        let original = builder.add_method(MethodSymbol::new("Where"));
        let reduced = builder.add_method(MethodSymbol::new("Where"));
        builder.set_original_definition(reduced, original);

        let model = builder.build();
        assert_eq!(
            model.compilation().original_definition(reduced),
            original
        );
        assert_eq!(
            model.compilation().original_definition(original),
            original
        );
    }

    #[test]
    fn accessor_linkage_is_bidirectional() {
        let mut builder = SemanticModelBuilder::new();
        let property = builder.add_property(PropertySymbol::new("Name"));
        let getter = builder.add_method(MethodSymbol::new("get_Name"));
        builder.link_accessor(property, AccessorKind::Get, getter);

        let model = builder.build();
        let getter_info = model.compilation().symbol(getter).as_method().unwrap();
        assert_eq!(getter_info.associated_property, Some(property));
        let property_info = model.compilation().symbol(property).as_property().unwrap();
        assert_eq!(property_info.getter, Some(getter));
    }

    #[test]
    fn members_are_attached_to_their_containing_type() {
        let mut builder = SemanticModelBuilder::new();
        let uri_ty = builder.add_type(TypeSymbol::new("Uri", "System.Uri"));
        let try_create = builder.add_method(MethodSymbol::new("TryCreate").in_type(uri_ty));

        let model = builder.build();
        assert_eq!(
            model.compilation().member_named(uri_ty, "TryCreate"),
            Some(try_create)
        );
        assert_eq!(model.compilation().member_named(uri_ty, "Missing"), None);
    }
}
