//! Object-level traits.

use crate::model::Function;
use std::collections::BTreeMap;

/// Reserved suffix marking experimental functions and tables.
pub const EXPERIMENTAL_SUFFIX: &str = "Exp";

pub fn is_experimental(name: &str) -> bool {
    name.ends_with(EXPERIMENTAL_SUFFIX)
}

/// A class is global when its name is a bare tag key such as `$x`.
pub fn is_global_class(class: &str, tags: &BTreeMap<String, String>) -> bool {
    tags.contains_key(class)
}

/// A function is global when it has no class or its class is a tag key.
pub fn is_global(f: &Function, tags: &BTreeMap<String, String>) -> bool {
    f.class.as_deref().map_or(true, |c| is_global_class(c, tags))
}

/// Functions that have no receiver in the C++ wrapper.
pub fn is_free(f: &Function, tags: &BTreeMap<String, String>) -> bool {
    f.is_static() || is_global(f, tags)
}
