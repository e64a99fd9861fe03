//! Template rendering and emission.
//!
//! Templates are embedded at build time and registered in strict mode, so a
//! context missing a field the template reads is a render error rather than
//! an empty string. Every file is written whole through a temporary file in
//! the target directory; a failed artifact never leaves a partial file.

use crate::error::{GenError, Result};
use crate::generate::Artifact;
use handlebars::Handlebars;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{error, info};

const TEMPLATES: &[(&str, &str)] = &[
    ("ddi.h", include_str!("../templates/ddi.h.hbs")),
    ("libapi.cpp", include_str!("../templates/libapi.cpp.hbs")),
    ("libddi.cpp", include_str!("../templates/libddi.cpp.hbs")),
    ("wprapi.cpp", include_str!("../templates/wprapi.cpp.hbs")),
    ("ldrddi.h", include_str!("../templates/ldrddi.h.hbs")),
    ("ldrddi.cpp", include_str!("../templates/ldrddi.cpp.hbs")),
    ("loader_internal.h", include_str!("../templates/loader_internal.h.hbs")),
    ("valddi.cpp", include_str!("../templates/valddi.cpp.hbs")),
    ("entry_points.h", include_str!("../templates/entry_points.h.hbs")),
    ("param.h", include_str!("../templates/param.h.hbs")),
    ("param.cpp", include_str!("../templates/param.cpp.hbs")),
    ("handle_lifetime.h", include_str!("../templates/handle_lifetime.h.hbs")),
    ("handle_lifetime.cpp", include_str!("../templates/handle_lifetime.cpp.hbs")),
    ("trcddi.cpp", include_str!("../templates/trcddi.cpp.hbs")),
    ("trc_setters.cpp", include_str!("../templates/trc_setters.cpp.hbs")),
    ("trc_setters.h", include_str!("../templates/trc_setters.h.hbs")),
    ("trc_cb_struct.h", include_str!("../templates/trc_cb_struct.h.hbs")),
    (
        "trc_register_cb_libapi.cpp",
        include_str!("../templates/trc_register_cb_libapi.cpp.hbs"),
    ),
    ("nullddi.cpp", include_str!("../templates/nullddi.cpp.hbs")),
];

pub struct Emitter {
    registry: Handlebars<'static>,
}

impl Emitter {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        for (name, source) in TEMPLATES {
            registry
                .register_template_string(name, source)
                .map_err(|e| GenError::TemplateRender {
                    template: name.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Emitter { registry })
    }

    /// Render `template` with `context`, normalized to `\n` line endings.
    pub fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.registry
            .render(template, context)
            .map(|text| normalize(&text))
            .map_err(|e| GenError::TemplateRender {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// An artifact that could not be rendered or written.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: GenError,
}

/// State of one generation run: what was written, how much, and what failed.
#[derive(Debug)]
pub struct RunContext {
    out_dir: PathBuf,
    /// Paths written, relative to the output directory, in emission order.
    pub written: Vec<PathBuf>,
    pub lines: usize,
    pub failures: Vec<Failure>,
}

impl RunContext {
    pub fn new(out_dir: &Path) -> Self {
        RunContext {
            out_dir: out_dir.to_path_buf(),
            written: Vec::new(),
            lines: 0,
            failures: Vec::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render an artifact, recording a failure instead of returning it.
    pub fn render(&mut self, emitter: &Emitter, artifact: &Artifact) -> Option<String> {
        match emitter.render(artifact.template, &artifact.context) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(path = %artifact.path.display(), error = %e, "render failed");
                self.failures.push(Failure {
                    path: artifact.path.clone(),
                    error: e,
                });
                None
            }
        }
    }

    /// Render and write an artifact; returns the text when both succeed.
    pub fn emit(&mut self, emitter: &Emitter, artifact: &Artifact) -> Option<String> {
        let text = self.render(emitter, artifact)?;
        self.write(&artifact.path, &text).then_some(text)
    }

    /// Write `text` to `rel` under the output directory.
    pub fn write(&mut self, rel: &Path, text: &str) -> bool {
        let path = self.out_dir.join(rel);
        match write_atomic(&path, text) {
            Ok(()) => {
                let lines = text.lines().count();
                info!(path = %path.display(), lines, "generated");
                self.lines += lines;
                self.written.push(rel.to_path_buf());
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "write failed");
                self.failures.push(Failure {
                    path: rel.to_path_buf(),
                    error: e,
                });
                false
            }
        }
    }

    /// Write the JSON list of written paths to `rel`.
    pub fn write_manifest(&self, rel: &Path) -> Result<()> {
        let paths: Vec<String> = self
            .written
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        let json = serde_json::to_string_pretty(&paths).map_err(|e| GenError::Parse(e.to_string()))?;
        write_atomic(&self.out_dir.join(rel), &format!("{}\n", json))
    }
}

fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| GenError::io(parent, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| GenError::io(path, e))?;
    tmp.persist(path).map_err(|e| GenError::io(path, e.error))?;
    Ok(())
}
