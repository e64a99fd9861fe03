//! Error taxonomy for a generation run.
//!
//! Classification and resolution errors are raised where they are detected;
//! the driver in [`crate::generate`] decides whether a failing object aborts
//! the run (strict mode) or is skipped (best-effort mode).

use std::path::PathBuf;

pub type Result<T, E = GenError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// A referenced type, class or handle is not in the metadata index.
    #[error("unresolved {kind} `{name}` in {object} (field `{field}`)")]
    SpecResolution {
        kind: &'static str,
        name: String,
        object: String,
        field: String,
    },

    /// A type name or descriptor matched more than one exclusive category.
    #[error("`{subject}` is ambiguous: matches {}", matches.join(", "))]
    ClassificationAmbiguity {
        subject: String,
        matches: Vec<String>,
    },

    /// The template could not be rendered with the computed context.
    #[error("failed to render template `{template}`: {reason}")]
    TemplateRender { template: String, reason: String },

    /// A begin/end region marker pair is missing from a merge input.
    #[error("region `{region}` not found in {document}")]
    MergeMarker { document: String, region: String },

    #[error("invalid version `{0}`")]
    Version(String),

    #[error("failed to parse specification: {0}")]
    Parse(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    pub fn unresolved(
        kind: &'static str,
        name: impl Into<String>,
        object: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        GenError::SpecResolution {
            kind,
            name: name.into(),
            object: object.into(),
            field: field.into(),
        }
    }

    pub fn ambiguous(subject: impl Into<String>, matches: Vec<String>) -> Self {
        GenError::ClassificationAmbiguity {
            subject: subject.into(),
            matches,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that concern a single specification object rather than the run.
    pub fn is_object_error(&self) -> bool {
        matches!(
            self,
            GenError::SpecResolution { .. } | GenError::ClassificationAmbiguity { .. }
        )
    }
}
