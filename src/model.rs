//! Data model for a parsed API specification document.
//!
//! The document is read once and never mutated during a run. Names keep
//! their namespace placeholders (`$x`, `$X`); substitution happens later,
//! per target dialect.

use crate::error::{GenError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Complete specification document.
#[derive(Debug, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub results: ResultCodes,
    pub sections: Vec<Section>,
}

/// Result type and well-known result codes referenced by generated code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultCodes {
    #[serde(rename = "type")]
    pub ty: String,
    pub success: String,
    pub uninitialized: String,
    pub invalid_null_pointer: String,
    pub invalid_null_handle: String,
    pub unsupported_version: String,
    pub unsupported_feature: String,
    pub out_of_host_memory: String,
    pub invalid_enumeration: String,
    pub api_version: String,
}

impl Default for ResultCodes {
    fn default() -> Self {
        Self {
            ty: "$x_result_t".into(),
            success: "$X_RESULT_SUCCESS".into(),
            uninitialized: "$X_RESULT_ERROR_UNINITIALIZED".into(),
            invalid_null_pointer: "$X_RESULT_ERROR_INVALID_NULL_POINTER".into(),
            invalid_null_handle: "$X_RESULT_ERROR_INVALID_NULL_HANDLE".into(),
            unsupported_version: "$X_RESULT_ERROR_UNSUPPORTED_VERSION".into(),
            unsupported_feature: "$X_RESULT_ERROR_UNSUPPORTED_FEATURE".into(),
            out_of_host_memory: "$X_RESULT_ERROR_OUT_OF_HOST_MEMORY".into(),
            invalid_enumeration: "$X_RESULT_ERROR_INVALID_ENUMERATION".into(),
            api_version: "$x_api_version_t".into(),
        }
    }
}

/// One section of the API (e.g. "core", "tools", "sysman").
#[derive(Debug, Deserialize)]
pub struct Section {
    pub name: String,
    /// Placeholder naming this section's namespace.
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Placeholder → concrete prefix.
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub tracing: Option<bool>,
    #[serde(default)]
    pub objects: Vec<Object>,
}

fn default_tag() -> String {
    "$x".to_string()
}

impl Section {
    /// Concrete namespace prefix of this section (`tags[tag]`).
    pub fn namespace(&self) -> Result<&str> {
        self.tags
            .get(&self.tag)
            .map(String::as_str)
            .ok_or_else(|| GenError::unresolved("tag", &self.tag, &self.name, "tag"))
    }

    pub fn tracing_enabled(&self) -> bool {
        self.tracing.unwrap_or(self.name == "core")
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.objects.iter().filter_map(|o| match o {
            Object::Function(f) => Some(f),
            _ => None,
        })
    }
}

/// A specification object, tagged by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Object {
    Function(Function),
    Class(Class),
    Enum(Enum),
    Struct(Struct),
    Macro(Macro),
    Handle(Handle),
    Typedef(Typedef),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub decl: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub returns: Vec<ReturnCode>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub version: Version,
    #[serde(default = "default_ordinal", deserialize_with = "lenient_u32")]
    pub ordinal: u32,
}

fn default_ordinal() -> u32 {
    100
}

impl Function {
    pub fn is_static(&self) -> bool {
        self.decl.as_deref().is_some_and(|d| d.starts_with("static"))
    }

    /// Identity used in diagnostics, e.g. `$xDevice::GetProperties`.
    pub fn identity(&self) -> String {
        match &self.class {
            Some(c) => format!("{}::{}", c, self.name),
            None => self.name.clone(),
        }
    }
}

/// Parameter of a function or member of a class/struct.
#[derive(Debug, Clone, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub init: Option<String>,
}

pub type Member = Param;

/// A declared result code, optionally with the conditions that produce it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawReturn")]
pub struct ReturnCode {
    pub code: String,
    pub conditions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReturn {
    Bare(String),
    Conditioned(BTreeMap<String, Vec<String>>),
}

impl TryFrom<RawReturn> for ReturnCode {
    type Error = String;

    fn try_from(raw: RawReturn) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawReturn::Bare(code) => Ok(ReturnCode {
                code,
                conditions: Vec::new(),
            }),
            RawReturn::Conditioned(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "return entry must have exactly one code, found {}",
                        map.len()
                    ));
                }
                let (code, conditions) = map.into_iter().next().ok_or("empty return entry")?;
                Ok(ReturnCode { code, conditions })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default, deserialize_with = "opt_lenient_u32")]
    pub ordinal: Option<u32>,
}

impl Class {
    pub fn is_singleton(&self) -> bool {
        self.attribute.as_deref() == Some("singleton")
    }
}

#[derive(Debug, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub etors: Vec<Etor>,
}

#[derive(Debug, Deserialize)]
pub struct Etor {
    pub name: String,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
pub struct Macro {
    pub name: String,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Deserialize)]
pub struct Handle {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub version: Version,
}

#[derive(Debug, Deserialize)]
pub struct Typedef {
    pub name: String,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub value: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub desc: String,
}

// -- Version ------------------------------------------------------------------

/// `major.minor` API version; ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Default for Version {
    fn default() -> Self {
        Version { major: 1, minor: 0 }
    }
}

impl FromStr for Version {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let parse = |p: &str| p.trim().parse::<u32>().map_err(|_| GenError::Version(s.to_string()));
        Ok(Version {
            major: parse(major)?,
            minor: parse(minor)?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = lenient_string(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// -- Lenient scalars ----------------------------------------------------------

// YAML specs write versions, ordinals and values both quoted and bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => {
                let s = f.to_string();
                if s.contains('.') {
                    s
                } else {
                    format!("{}.0", s)
                }
            }
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Scalar::deserialize(d)?.into_string())
}

fn opt_lenient_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    let raw = lenient_string(d)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

fn opt_lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        Some(s) => s
            .into_string()
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// -- Loading ------------------------------------------------------------------

impl Document {
    /// Parse a document, choosing JSON or YAML from the content.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim_start().starts_with('{') {
            Self::from_json(text)
        } else {
            Self::from_yaml(text)
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GenError::Parse(e.to_string()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| GenError::Parse(e.to_string()))
    }

    /// Read a document from disk; `.json` files are always parsed as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::parse(&text),
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}
