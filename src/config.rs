//! Options of a generation run.

use crate::model::Version;
use std::path::PathBuf;

/// What happens when one object cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Abort the whole run.
    #[default]
    Strict,
    /// Log the object and continue without it.
    BestEffort,
}

/// Artifact families, emitted in this order per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Lib,
    Loader,
    Layers,
    Drivers,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::Lib => "lib",
            Family::Loader => "loader",
            Family::Layers => "layers",
            Family::Drivers => "drivers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Families {
    pub lib: bool,
    pub loader: bool,
    pub layers: bool,
    pub drivers: bool,
}

impl Default for Families {
    fn default() -> Self {
        Families {
            lib: true,
            loader: true,
            layers: true,
            drivers: true,
        }
    }
}

impl Families {
    pub fn enabled(&self, family: Family) -> bool {
        match family {
            Family::Lib => self.lib,
            Family::Loader => self.loader,
            Family::Layers => self.layers,
            Family::Drivers => self.drivers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Root of the generated tree; sources go to `source/`, headers to `include/`.
    pub out_dir: PathBuf,
    /// Objects newer than this version are skipped.
    pub version: Version,
    /// Only these sections, when given.
    pub sections: Option<Vec<String>>,
    pub families: Families,
    pub mode: Mode,
    /// Write `generated.json`, the list of emitted paths.
    pub debug: bool,
}

impl GenerateOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        GenerateOptions {
            out_dir: out_dir.into(),
            version: Version::default(),
            sections: None,
            families: Families::default(),
            mode: Mode::default(),
            debug: false,
        }
    }

    pub fn wants_section(&self, name: &str) -> bool {
        self.sections
            .as_ref()
            .map_or(true, |list| list.iter().any(|s| s == name))
    }
}
