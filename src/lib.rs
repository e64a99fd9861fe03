//! ddigen: generate C/C++ dispatch sources from a declarative, versioned C
//! API specification.
//!
//! A run parses a [`Document`], indexes its metadata, resolves every
//! function of every requested section, and renders the lib, loader, layer
//! and null driver families through embedded templates.

pub mod config;
pub mod error;
pub mod generate;
pub mod merge;
pub mod meta;
pub mod model;
pub mod names;
pub mod render;
pub mod resolve;
pub mod subst;
pub mod text;
pub mod traits;

pub use config::{Families, GenerateOptions, Mode};
pub use error::{GenError, Result};
pub use generate::run;
pub use model::{Document, Version};
pub use render::RunContext;
