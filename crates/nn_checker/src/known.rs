// nn_checker/known - Well-known framework members
use rustc_hash::FxHashSet;
use tracing::debug;

use nn_semantics::{Compilation, SymbolId, SymbolInfo, TypeId};

const STRING: &str = "System.String";
const URI: &str = "System.Uri";
const DICTIONARY: &str = "System.Collections.Generic.Dictionary`2";
const ENUMERABLE: &str = "System.Linq.Enumerable";
const GUID: &str = "System.Guid";
const PATH: &str = "System.IO.Path";
const MARSHAL: &str = "System.Runtime.InteropServices.Marshal";
const TASK: &str = "System.Threading.Tasks.Task";
const TASK_OF: &str = "System.Threading.Tasks.Task`1";

/// Framework members resolved once per compilation. Every resolution is
/// defensive: a member missing from the target profile is simply not
/// registered and the corresponding queries answer "unknown".
#[derive(Debug, Default)]
pub struct KnownSymbols {
    not_null_methods: FxHashSet<SymbolId>,
    not_null_properties: FxHashSet<SymbolId>,
    string_type: Option<TypeId>,
    is_null_or_empty: Option<SymbolId>,
    is_null_or_white_space: Option<SymbolId>,
    uri_try_create: Option<SymbolId>,
    configure_await: Option<SymbolId>,
    enumerable_to_list: Option<SymbolId>,
}

impl KnownSymbols {
    pub fn resolve(compilation: &Compilation) -> Self {
        let mut known = Self::default();

        known.string_type = compilation.get_type_by_metadata_name(STRING);
        known.is_null_or_empty = member(compilation, STRING, "IsNullOrEmpty");
        known.is_null_or_white_space = member(compilation, STRING, "IsNullOrWhiteSpace");
        known.uri_try_create = member(compilation, URI, "TryCreate");
        known.configure_await = member(compilation, TASK_OF, "ConfigureAwait");
        known.enumerable_to_list = member(compilation, ENUMERABLE, "ToList");

        for (ty, name) in [
            (STRING, "Substring"),
            (URI, "ToString"),
            (ENUMERABLE, "ToList"),
            (ENUMERABLE, "ToArray"),
            (ENUMERABLE, "Where"),
            (ENUMERABLE, "Select"),
            (GUID, "ToString"),
            (PATH, "GetTempPath"),
            (MARSHAL, "GetDelegateForFunctionPointer"),
            (TASK, "FromResult"),
        ] {
            if let Some(method) = member(compilation, ty, name) {
                known.not_null_methods.insert(method);
            }
        }

        for name in ["Keys", "Values"] {
            if let Some(property) = member(compilation, DICTIONARY, name) {
                known.not_null_properties.insert(property);
            }
        }

        debug!(
            methods = known.not_null_methods.len(),
            properties = known.not_null_properties.len(),
            "resolved known framework symbols"
        );
        known
    }

    /// True when the method's original (unreduced, ungenericized) definition
    /// is known never to return null.
    pub fn is_known_non_null_method(&self, compilation: &Compilation, method: SymbolId) -> bool {
        self.not_null_methods
            .contains(&compilation.original_definition(method))
    }

    /// True when the property's original definition is the dictionary `Keys`
    /// or `Values` property.
    pub fn is_known_non_null_property(
        &self,
        compilation: &Compilation,
        property: SymbolId,
    ) -> bool {
        self.not_null_properties
            .contains(&compilation.original_definition(property))
    }

    /// True for `String.IsNullOrEmpty` / `String.IsNullOrWhiteSpace`, whose
    /// falsy result proves the argument non-null.
    pub fn is_string_null_probe(&self, compilation: &Compilation, method: SymbolId) -> bool {
        let original = compilation.original_definition(method);
        self.is_null_or_empty == Some(original) || self.is_null_or_white_space == Some(original)
    }

    /// `Uri.TryCreate` is recognized so guard analysis can deliberately
    /// ignore it.
    pub fn is_uri_try_create(&self, compilation: &Compilation, method: SymbolId) -> bool {
        self.uri_try_create == Some(compilation.original_definition(method))
    }

    pub fn is_configure_await(&self, compilation: &Compilation, method: SymbolId) -> bool {
        self.configure_await == Some(compilation.original_definition(method))
    }

    pub fn is_enumerable_to_list(&self, compilation: &Compilation, method: SymbolId) -> bool {
        self.enumerable_to_list == Some(compilation.original_definition(method))
    }

    pub fn string_type(&self) -> Option<TypeId> {
        self.string_type
    }
}

fn member(compilation: &Compilation, metadata_name: &str, member_name: &str) -> Option<SymbolId> {
    let ty = compilation.get_type_by_metadata_name(metadata_name)?;
    compilation.member_named(ty, member_name)
}

/// Unwraps `Task<T>` to `T`: when the type exposes a `Result` property and a
/// `GetAwaiter()` method whose return's first type argument equals the
/// `Result` type, the unwrapped type is that type. Anything else is returned
/// unchanged.
pub fn unwrap_task_type(compilation: &Compilation, ty: TypeId) -> TypeId {
    let result_type = compilation
        .member_named(ty, "Result")
        .and_then(|id| match compilation.symbol(id) {
            SymbolInfo::Property(property) => property.property_type,
            _ => None,
        });
    let awaiter_type = compilation
        .member_named(ty, "GetAwaiter")
        .and_then(|id| match compilation.symbol(id) {
            SymbolInfo::Method(method) => method.return_type,
            _ => None,
        });

    match (result_type, awaiter_type) {
        (Some(result), Some(awaiter)) => {
            let first_argument = compilation
                .type_symbol(awaiter)
                .type_arguments
                .first()
                .copied();
            if first_argument == Some(result) {
                result
            } else {
                ty
            }
        }
        _ => ty,
    }
}
