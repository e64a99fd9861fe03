//! Namespace placeholder substitution.
//!
//! Every tag key and its upper-case form are matched by one alternation, so
//! a string is rewritten in a single left-to-right pass and a replacement is
//! never rescanned.

use crate::error::{GenError, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Target spelling of a substituted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Every tag becomes its concrete prefix.
    C,
    /// Own-namespace tags are dropped, foreign tags become `value::`.
    Cpp,
    /// Every tag is dropped.
    CppUnqualified,
    /// Like C, with a leading `::` for doxygen cross references.
    Comment,
}

/// Tag key rendered bare in comments.
const BARE_COMMENT_KEY: &str = "$OneApi";

#[derive(Debug, Clone)]
struct Tag {
    key: String,
    value: String,
    upper: bool,
}

#[derive(Debug, Clone)]
pub struct Substitutor {
    namespace: String,
    tags: BTreeMap<String, String>,
    lookup: Vec<(String, Tag)>,
    pattern: Option<Regex>,
}

impl Substitutor {
    pub fn new(namespace: &str, tags: &BTreeMap<String, String>) -> Result<Self> {
        let mut lookup: Vec<(String, Tag)> = Vec::new();
        for (key, value) in tags {
            lookup.push((
                key.clone(),
                Tag {
                    key: key.clone(),
                    value: value.clone(),
                    upper: false,
                },
            ));
            let upper = key.to_uppercase();
            if upper != *key && !tags.contains_key(&upper) {
                lookup.push((
                    upper,
                    Tag {
                        key: key.clone(),
                        value: value.clone(),
                        upper: true,
                    },
                ));
            }
        }
        // Longest first so `$OneApi` wins over a `$O` prefix.
        lookup.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let pattern = if lookup.is_empty() {
            None
        } else {
            let alts: Vec<String> = lookup.iter().map(|(k, _)| regex::escape(k)).collect();
            let re = format!(r"(?P<dash>-)?(?P<tag>{})(?P<us>_)?", alts.join("|"));
            Some(Regex::new(&re).map_err(|e| GenError::Parse(format!("tag pattern: {}", e)))?)
        };

        Ok(Substitutor {
            namespace: namespace.to_string(),
            tags: tags.clone(),
            lookup,
            pattern,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// A substitutor over the same keys with values rewritten by `f(key, value)`.
    pub fn retag(&self, f: impl Fn(&str, &str) -> String) -> Result<Self> {
        let tags: BTreeMap<String, String> = self
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), f(k, v)))
            .collect();
        Self::new(&self.namespace, &tags)
    }

    fn is_own(&self, tag: &Tag) -> bool {
        tag.value == self.namespace
    }

    pub fn apply(&self, text: &str, dialect: Dialect) -> String {
        let Some(re) = &self.pattern else {
            return text.to_string();
        };
        re.replace_all(text, |c: &Captures| self.replace(c, dialect))
            .into_owned()
    }

    pub fn c(&self, text: &str) -> String {
        self.apply(text, Dialect::C)
    }

    pub fn cpp(&self, text: &str) -> String {
        self.apply(text, Dialect::Cpp)
    }

    pub fn comment(&self, text: &str) -> String {
        self.apply(text, Dialect::Comment)
    }

    fn replace(&self, c: &Captures, dialect: Dialect) -> String {
        let matched = c.name("tag").map_or("", |m| m.as_str());
        let dash = c.name("dash").map_or("", |m| m.as_str());
        let us = c.name("us").map_or("", |m| m.as_str());
        let Some((_, tag)) = self.lookup.iter().find(|(k, _)| k == matched) else {
            return c[0].to_string();
        };
        let case = |s: &str| {
            if tag.upper {
                s.to_uppercase()
            } else {
                s.to_string()
            }
        };

        match dialect {
            Dialect::C => format!("{}{}{}", dash, case(&tag.value), us),
            Dialect::Comment => {
                // `-$x` appears in compiler options and must stay a plain word.
                if !dash.is_empty() || tag.key == BARE_COMMENT_KEY {
                    format!("{}{}{}", dash, case(&tag.value), us)
                } else {
                    format!("::{}{}", case(&tag.value), us)
                }
            }
            Dialect::Cpp if self.is_own(tag) => dash.to_string(),
            Dialect::Cpp => format!("{}{}::", dash, case(&tag.value)),
            Dialect::CppUnqualified => dash.to_string(),
        }
    }
}
