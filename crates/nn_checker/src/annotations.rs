// nn_checker/annotations - Contract annotation lookup
use nn_semantics::{Compilation, SymbolId, SymbolInfo};

/// Contract markers recognized on declarations. Matching is by attribute
/// type name only, so any library defining attributes with these names
/// participates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    NotNull,
    CheckNull,
    IsNullCheck,
}

impl Mark {
    pub fn type_name(self) -> &'static str {
        match self {
            Mark::NotNull => "NotNull",
            Mark::CheckNull => "CheckNull",
            Mark::IsNullCheck => "IsNullCheck",
        }
    }
}

/// `NotNull` and `CheckNull` are accepted interchangeably in every check
/// (union semantics).
pub const CONTRACT_MARKS: &[Mark] = &[Mark::NotNull, Mark::CheckNull];

fn attribute_matches(attribute: &str, mark: Mark) -> bool {
    let short = attribute.rsplit('.').next().unwrap_or(attribute);
    let short = short.strip_suffix("Attribute").unwrap_or(short);
    short == mark.type_name()
}

fn decorated(attributes: &[String], marks: &[Mark]) -> bool {
    attributes
        .iter()
        .any(|attribute| marks.iter().any(|mark| attribute_matches(attribute, *mark)))
}

/// True when any of `marks` decorates the symbol. A property accessor also
/// exposes its associated property's marks; no other transitive inheritance
/// is performed.
pub fn has_mark(compilation: &Compilation, symbol: SymbolId, marks: &[Mark]) -> bool {
    let info = compilation.symbol(symbol);
    if decorated(info.attributes(), marks) {
        return true;
    }

    if let SymbolInfo::Method(method) = info {
        if let Some(property) = method.associated_property {
            return decorated(compilation.symbol(property).attributes(), marks);
        }
    }

    false
}
