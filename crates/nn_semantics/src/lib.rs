// nn_semantics - Symbol and type model surface consumed by the analyzer
pub mod builder;
pub mod model;
pub mod symbols;

pub use builder::SemanticModelBuilder;
pub use model::{Compilation, SemanticModel};
pub use symbols::{
    FieldSymbol, LocalSymbol, MethodSymbol, ParameterScope, ParameterSymbol, PropertySymbol,
    SymbolId, SymbolInfo, TypeId, TypeSymbol,
};
