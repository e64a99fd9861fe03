//! Parser for the bracketed tag grammar at the head of a parameter
//! description, e.g. `[out][optional][range(0, *pCount)] array of handles`.

use crate::error::{GenError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[((?:[^\[\]]|\[[^\]]*\])*)\]").unwrap());
static RE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^range\(\s*([^,]+?)\s*,\s*(.+?)\s*\)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: String,
    pub end: String,
}

/// Tags parsed from a parameter description. Modifiers compose freely; the
/// direction is exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub direction: Option<Direction>,
    pub optional: bool,
    pub release: bool,
    pub mbz: bool,
    pub range: Option<Range>,
    /// A `range` tag whose bounds could not be parsed.
    pub malformed_range: Option<String>,
    /// Description text following the tags.
    pub text: String,
}

impl ParamDescriptor {
    pub fn is_input(&self) -> bool {
        self.direction == Some(Direction::In)
    }

    pub fn is_output(&self) -> bool {
        self.direction == Some(Direction::Out)
    }

    pub fn is_inoutput(&self) -> bool {
        self.direction == Some(Direction::InOut)
    }

    /// Bounds of the range, or an error naming the tag if it was malformed.
    pub fn require_range(&self, subject: &str) -> Result<Option<&Range>> {
        match (&self.range, &self.malformed_range) {
            (_, Some(bad)) => Err(GenError::unresolved("range", bad.clone(), subject, "desc")),
            (r, None) => Ok(r.as_ref()),
        }
    }
}

/// Parse the leading tags of `desc`. Unknown tags are ignored.
pub fn parse_descriptor(desc: &str) -> Result<ParamDescriptor> {
    let mut out = ParamDescriptor::default();
    let mut rest = desc;
    let mut seen: Vec<&str> = Vec::new();

    while let Some(c) = RE_TAG.captures(rest) {
        let whole = c.get(0).map_or(0, |m| m.end());
        let tag = c.get(1).map_or("", |m| m.as_str()).trim();
        let dir = match tag.replace(' ', "").as_str() {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            "in,out" => Some(Direction::InOut),
            _ => None,
        };
        if let Some(d) = dir {
            if out.direction.is_some_and(|prev| prev != d) {
                seen.push(tag);
                return Err(GenError::ambiguous(
                    desc,
                    seen.iter().map(|s| s.to_string()).collect(),
                ));
            }
            out.direction = Some(d);
            seen.push(tag);
        } else if tag == "optional" {
            out.optional = true;
        } else if tag == "release" {
            out.release = true;
        } else if tag == "mbz" {
            out.mbz = true;
        } else if tag.starts_with("range") {
            match RE_RANGE.captures(tag) {
                Some(r) => {
                    out.range = Some(Range {
                        start: r[1].to_string(),
                        end: r[2].to_string(),
                    })
                }
                None => out.malformed_range = Some(tag.to_string()),
            }
        }
        rest = &rest[whole..];
    }

    out.text = rest.trim().to_string();
    Ok(out)
}
