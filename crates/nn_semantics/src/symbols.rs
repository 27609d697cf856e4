// nn_semantics/symbols - Resolved symbol and type records
use nn_ast::{AccessorKind, RefKind};
use serde::{Deserialize, Serialize};

/// Identity of a resolved symbol within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Identity of a resolved type within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// A named type known to the compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub name: String,
    /// Fully qualified metadata name, e.g. `System.Collections.Generic.Dictionary`2`.
    pub metadata_name: String,
    pub is_value_type: bool,
    pub type_arguments: Vec<TypeId>,
    pub members: Vec<SymbolId>,
    /// For constructed generics, the open definition this type instantiates.
    pub original_definition: Option<TypeId>,
}

impl TypeSymbol {
    pub fn new(name: impl Into<String>, metadata_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata_name: metadata_name.into(),
            is_value_type: false,
            type_arguments: Vec::new(),
            members: Vec::new(),
            original_definition: None,
        }
    }

    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }

    pub fn with_type_arguments(mut self, args: Vec<TypeId>) -> Self {
        self.type_arguments = args;
        self
    }

    pub fn with_original_definition(mut self, definition: TypeId) -> Self {
        self.original_definition = Some(definition);
        self
    }
}

/// Resolved symbol payloads, one variant per symbol kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolInfo {
    Method(MethodSymbol),
    Property(PropertySymbol),
    Field(FieldSymbol),
    Local(LocalSymbol),
    Parameter(ParameterSymbol),
}

impl SymbolInfo {
    pub fn name(&self) -> &str {
        match self {
            SymbolInfo::Method(m) => &m.name,
            SymbolInfo::Property(p) => &p.name,
            SymbolInfo::Field(f) => &f.name,
            SymbolInfo::Local(l) => &l.name,
            SymbolInfo::Parameter(p) => &p.name,
        }
    }

    /// Attribute type names attached to the declaration, if the kind carries
    /// any.
    pub fn attributes(&self) -> &[String] {
        match self {
            SymbolInfo::Method(m) => &m.attributes,
            SymbolInfo::Property(p) => &p.attributes,
            SymbolInfo::Field(f) => &f.attributes,
            SymbolInfo::Parameter(p) => &p.attributes,
            SymbolInfo::Local(_) => &[],
        }
    }

    pub fn containing_type(&self) -> Option<TypeId> {
        match self {
            SymbolInfo::Method(m) => m.containing_type,
            SymbolInfo::Property(p) => p.containing_type,
            SymbolInfo::Field(f) => f.containing_type,
            SymbolInfo::Local(_) | SymbolInfo::Parameter(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match self {
            SymbolInfo::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertySymbol> {
        match self {
            SymbolInfo::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterSymbol> {
        match self {
            SymbolInfo::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<&LocalSymbol> {
        match self {
            SymbolInfo::Local(l) => Some(l),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub name: String,
    pub containing_type: Option<TypeId>,
    pub attributes: Vec<String>,
    pub return_type: Option<TypeId>,
    pub parameters: Vec<SymbolId>,
    /// Reduced extension invocations and constructed generics point back to
    /// the original static definition.
    pub original_definition: Option<SymbolId>,
    /// Accessor methods link to the property they implement.
    pub associated_property: Option<SymbolId>,
    pub accessor_kind: Option<AccessorKind>,
    pub is_extension: bool,
}

impl MethodSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            containing_type: None,
            attributes: Vec::new(),
            return_type: None,
            parameters: Vec::new(),
            original_definition: None,
            associated_property: None,
            accessor_kind: None,
            is_extension: false,
        }
    }

    pub fn in_type(mut self, ty: TypeId) -> Self {
        self.containing_type = Some(ty);
        self
    }

    pub fn returning(mut self, ty: TypeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySymbol {
    pub name: String,
    pub containing_type: Option<TypeId>,
    pub attributes: Vec<String>,
    pub property_type: Option<TypeId>,
    pub getter: Option<SymbolId>,
    pub setter: Option<SymbolId>,
    pub original_definition: Option<SymbolId>,
}

impl PropertySymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            containing_type: None,
            attributes: Vec::new(),
            property_type: None,
            getter: None,
            setter: None,
            original_definition: None,
        }
    }

    pub fn in_type(mut self, ty: TypeId) -> Self {
        self.containing_type = Some(ty);
        self
    }

    pub fn typed(mut self, ty: TypeId) -> Self {
        self.property_type = Some(ty);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSymbol {
    pub name: String,
    pub containing_type: Option<TypeId>,
    pub attributes: Vec<String>,
    pub field_type: Option<TypeId>,
}

impl FieldSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            containing_type: None,
            attributes: Vec::new(),
            field_type: None,
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSymbol {
    pub name: String,
    pub declared_type: Option<TypeId>,
    /// True when the local was introduced by a foreach binding. The host
    /// front-end reports this directly.
    pub is_foreach: bool,
}

impl LocalSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            is_foreach: false,
        }
    }

    pub fn from_foreach(mut self) -> Self {
        self.is_foreach = true;
        self
    }
}

/// Where a parameter is declared. Lambda parameters carry the facts the
/// host's binder resolved about the conversion site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterScope {
    Member,
    Lambda {
        /// True when the lambda is an argument to an enumerable combinator
        /// invocation.
        in_enumerable: bool,
        /// The delegate parameter the lambda parameter converts to, when the
        /// binder could locate the enclosing invocation.
        delegate_parameter: Option<SymbolId>,
    },
}

impl Default for ParameterScope {
    fn default() -> Self {
        ParameterScope::Member
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSymbol {
    pub name: String,
    pub declared_type: Option<TypeId>,
    pub attributes: Vec<String>,
    pub ref_kind: Option<RefKind>,
    pub is_params: bool,
    /// The method or lambda the parameter belongs to.
    pub owner: Option<SymbolId>,
    /// True for the implicit `value` parameter of a property setter.
    pub is_setter_value: bool,
    pub scope: ParameterScope,
}

impl ParameterSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            attributes: Vec::new(),
            ref_kind: None,
            is_params: false,
            owner: None,
            is_setter_value: false,
            scope: ParameterScope::Member,
        }
    }

    pub fn typed(mut self, ty: TypeId) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn owned_by(mut self, owner: SymbolId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn by_ref(mut self, kind: RefKind) -> Self {
        self.ref_kind = Some(kind);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_params = true;
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}
