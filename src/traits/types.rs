//! Structural classification of type names.

use crate::error::{GenError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Primary category of a type name. Exactly one applies to any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Handle,
    Pointer,
    Descriptor,
    Properties,
    Flags,
    Counters,
    StateVariant,
    Capabilities,
    Unclassified,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeCategory::Handle => "handle",
            TypeCategory::Pointer => "pointer",
            TypeCategory::Descriptor => "descriptor",
            TypeCategory::Properties => "properties",
            TypeCategory::Flags => "flags",
            TypeCategory::Counters => "counters",
            TypeCategory::StateVariant => "state",
            TypeCategory::Capabilities => "capabilities",
            TypeCategory::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

// Suffix table, matched against the base type (no const, no pointers).
static SUFFIXES: LazyLock<Vec<(TypeCategory, Regex)>> = LazyLock::new(|| {
    [
        (TypeCategory::Handle, r"^[\w$]*handle_t$"),
        (TypeCategory::Descriptor, r"^[\w$]*desc_t$"),
        (TypeCategory::Properties, r"^[\w$]*properties(_exp)?_t$"),
        (TypeCategory::Flags, r"^[\w$]*flags_t$"),
        (TypeCategory::Counters, r"^[\w$]*counters_t$"),
        (TypeCategory::StateVariant, r"^[\w$]*_state_t$"),
        (TypeCategory::Capabilities, r"^[\w$]*capabilities_t$"),
    ]
    .into_iter()
    .map(|(c, p)| (c, Regex::new(p).unwrap()))
    .collect()
});

static RE_IPC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w$]*ipc\w*handle_t$").unwrap());
static RE_CONFIG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w$]*_config_t$").unwrap());

/// Strip `const` qualifiers and every pointer level.
pub fn base_name(ty: &str) -> String {
    let last = ty.split_whitespace().last().unwrap_or("");
    last.replace('*', "")
}

pub fn is_pointer(ty: &str) -> bool {
    ty.contains('*')
}

/// Classify a type name. Fails only if two suffix rules match at once.
pub fn classify(ty: &str) -> Result<TypeCategory> {
    let base = base_name(ty);
    let matched: Vec<TypeCategory> = SUFFIXES
        .iter()
        .filter(|(_, re)| re.is_match(&base))
        .map(|(c, _)| *c)
        .collect();
    match matched.as_slice() {
        [] if is_pointer(ty) => Ok(TypeCategory::Pointer),
        [] => Ok(TypeCategory::Unclassified),
        [one] => Ok(*one),
        _ => Err(GenError::ambiguous(
            ty,
            matched.iter().map(ToString::to_string).collect(),
        )),
    }
}

pub fn is_handle(ty: &str) -> bool {
    SUFFIXES[0].1.is_match(&base_name(ty))
}

pub fn is_ipc_handle(ty: &str) -> bool {
    RE_IPC.is_match(&base_name(ty))
}

pub fn is_flags(ty: &str) -> bool {
    matches!(classify(ty), Ok(TypeCategory::Flags))
}

/// Record types passed by pointer whose `pNext` chain the layers walk:
/// descriptors, properties, counters, state and capability records, and
/// the sysman `*_config_t` records (which have no primary category).
pub fn is_extension_record(ty: &str) -> bool {
    match classify(ty) {
        Ok(TypeCategory::Descriptor)
        | Ok(TypeCategory::Properties)
        | Ok(TypeCategory::Counters)
        | Ok(TypeCategory::StateVariant)
        | Ok(TypeCategory::Capabilities) => true,
        Ok(_) => RE_CONFIG.is_match(&base_name(ty)),
        Err(_) => false,
    }
}
