//! Type and parameter resolver.
//!
//! For a parameter or member seen from a given scope this computes its C and
//! C++ spellings, how a C++ wrapper marshals it across the C call, and the
//! aggregate return shape of the function.

pub mod loader;
pub mod marshal;
pub mod returns;
pub mod types;

pub use loader::{LoaderConversion, LoaderRange};
pub use marshal::{CastKind, Ctor, Local, Marshal, Strategy};
pub use returns::{ReturnShape, ReturnValue};

use crate::error::{GenError, Result};
use crate::meta::MetaIndex;
use crate::model::{Function, Param};
use crate::subst::Substitutor;
use crate::traits::{objects, params, ParamDescriptor};

/// The object a type is being spelled from.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Owning class of the function, or the class itself.
    pub class: Option<&'a str>,
    /// The scope is a class declaration rather than one of its functions.
    pub is_class: bool,
}

impl<'a> Scope<'a> {
    pub fn function(f: &'a Function) -> Self {
        Scope {
            class: f.class.as_deref(),
            is_class: false,
        }
    }

    pub fn class(name: &'a str) -> Self {
        Scope {
            class: Some(name),
            is_class: true,
        }
    }
}

/// Resolver over one section's substitution rules and the document index.
pub struct Resolver<'a> {
    pub subst: &'a Substitutor,
    pub index: &'a MetaIndex,
}

/// A parameter with its parsed descriptor.
pub struct ParamInfo<'f> {
    pub param: &'f Param,
    pub desc: ParamDescriptor,
}

impl<'a> Resolver<'a> {
    pub fn new(subst: &'a Substitutor, index: &'a MetaIndex) -> Self {
        Resolver { subst, index }
    }

    /// Parse every descriptor and check every type of `f` against the index.
    pub fn params<'f>(&self, f: &'f Function) -> Result<Vec<ParamInfo<'f>>> {
        f.params
            .iter()
            .map(|p| {
                let desc = params::parse_descriptor(&p.desc).map_err(|e| match e {
                    GenError::ClassificationAmbiguity { matches, .. } => GenError::ambiguous(
                        format!("{} (param `{}`)", f.identity(), p.name),
                        matches,
                    ),
                    other => other,
                })?;
                self.index.resolve_param_type(&p.ty, &f.identity(), &p.name)?;
                Ok(ParamInfo { param: p, desc })
            })
            .collect()
    }

    /// Functions with no receiver in the C++ wrapper.
    pub fn is_free(&self, f: &Function) -> bool {
        objects::is_free(f, self.subst.tags())
    }
}
