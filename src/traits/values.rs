//! Classification of value expressions (enumerator values, initializers,
//! array lengths).

use regex::Regex;
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$X_MAKE_VERSION\(\s*(\d+)\s*,\s*(\d+)\s*\)$").unwrap()
});
static RE_BIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\$X_)?BIT\(\s*(\d+)\s*\)$").unwrap());
static RE_SHIFT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1u?\s*<<\s*(\d+)$").unwrap());
static RE_HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").unwrap());
static RE_MACRO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\$\w+)\(.*\)$").unwrap());
static RE_ARRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)\[(.*)\]$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// `$X_MAKE_VERSION( major, minor )`
    Version { major: u32, minor: u32 },
    /// `$X_BIT( n )` or `1 << n`
    Bit(u32),
    /// `$NAME( ... )`
    MacroCall { name: String },
    /// `name[LEN]`
    Array { name: String, len: String },
    Hex,
    Plain,
}

/// Classify a value; the first matching rule wins, in declaration order of
/// [`ValueKind`].
pub fn classify(value: &str) -> ValueKind {
    let v = value.trim();
    if let Some(c) = RE_VERSION.captures(v) {
        return ValueKind::Version {
            major: c[1].parse().unwrap_or(0),
            minor: c[2].parse().unwrap_or(0),
        };
    }
    if let Some(c) = RE_BIT.captures(v).or_else(|| RE_SHIFT.captures(v)) {
        return ValueKind::Bit(c[1].parse().unwrap_or(0));
    }
    if let Some(c) = RE_MACRO.captures(v) {
        return ValueKind::MacroCall {
            name: c[1].to_string(),
        };
    }
    if let Some(c) = RE_ARRAY.captures(v) {
        return ValueKind::Array {
            name: c[1].to_string(),
            len: c[2].to_string(),
        };
    }
    if RE_HEX.is_match(v) {
        return ValueKind::Hex;
    }
    ValueKind::Plain
}

pub fn is_bit(value: &str) -> bool {
    matches!(classify(value), ValueKind::Bit(_))
}

/// `name[len]` → `name`; anything else unchanged.
pub fn array_name(value: &str) -> &str {
    RE_ARRAY
        .captures(value)
        .and_then(|c| c.get(1))
        .map_or(value, |m| m.as_str())
}

/// `name[len]` → `len`; anything else unchanged.
pub fn array_length(value: &str) -> &str {
    RE_ARRAY
        .captures(value)
        .and_then(|c| c.get(2))
        .map_or(value, |m| m.as_str())
}

/// `$NAME(args)` → `$NAME`; anything else unchanged.
pub fn macro_name(value: &str) -> &str {
    RE_MACRO
        .captures(value)
        .and_then(|c| c.get(1))
        .map_or(value, |m| m.as_str())
}

/// The identifier to look up in the macro table: the macro name of a call,
/// or the length of an array.
pub fn macro_key(value: &str) -> &str {
    array_length(macro_name(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_take_precedence() {
        assert_eq!(
            classify("$X_MAKE_VERSION( 1, 2 )"),
            ValueKind::Version { major: 1, minor: 2 }
        );
    }

    #[test]
    fn bits_and_shifts() {
        assert_eq!(classify("$X_BIT(3)"), ValueKind::Bit(3));
        assert_eq!(classify("1 << 4"), ValueKind::Bit(4));
        assert!(is_bit("$X_BIT( 0 )"));
        assert!(!is_bit("0x10"));
    }

    #[test]
    fn macros_arrays_and_hex() {
        assert_eq!(
            classify("$X_MAX_NAME(2)"),
            ValueKind::MacroCall {
                name: "$X_MAX_NAME".into()
            }
        );
        assert_eq!(
            classify("name[$X_MAX_DEVICE_NAME]"),
            ValueKind::Array {
                name: "name".into(),
                len: "$X_MAX_DEVICE_NAME".into()
            }
        );
        assert_eq!(classify("0x7fffffff"), ValueKind::Hex);
        assert_eq!(classify("42"), ValueKind::Plain);
    }

    #[test]
    fn extractors_fall_back_to_input() {
        assert_eq!(array_name("uuid[16]"), "uuid");
        assert_eq!(array_length("uuid[16]"), "16");
        assert_eq!(array_name("uuid"), "uuid");
        assert_eq!(macro_name("$X_FOO(1)"), "$X_FOO");
        assert_eq!(macro_key("name[$X_MAX]"), "$X_MAX");
    }
}
