//! Handle conversions performed by the loader shim around each call.

use super::{ParamInfo, Resolver};
use crate::meta::MetaIndex;
use crate::names;
use crate::traits::{types, Range};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderRange {
    pub start: String,
    pub end: String,
}

impl From<&Range> for LoaderRange {
    fn from(r: &Range) -> Self {
        LoaderRange {
            start: r.start.clone(),
            end: r.end.clone(),
        }
    }
}

/// One class-handle parameter converted between loader objects and driver
/// handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderConversion {
    /// C parameter name.
    pub name: String,
    /// C handle type, e.g. `ze_device_handle_t`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Loader object type, e.g. `ze_device_object_t`.
    pub obj: String,
    /// Loader factory, e.g. `ze_device_factory`.
    pub factory: String,
    pub range: Option<LoaderRange>,
    pub optional: bool,
    pub release: bool,
    /// The first converted input; its object's dispatch table routes the call.
    pub receiver: bool,
}

impl Resolver<'_> {
    fn conversion(&self, p: &ParamInfo<'_>, range: Option<LoaderRange>) -> LoaderConversion {
        let ty = names::remove_const_ptr(&self.subst.c(&p.param.ty));
        let (obj, factory) = MetaIndex::loader_names(&ty);
        LoaderConversion {
            name: self.subst.c(&p.param.name),
            ty,
            obj,
            factory,
            range,
            optional: p.desc.optional,
            release: p.desc.release,
            receiver: false,
        }
    }

    /// Input class handles unwrapped from loader objects before the call.
    /// Pointers to handles are converted element-wise over their range.
    pub fn loader_prologue(&self, params: &[ParamInfo<'_>]) -> Vec<LoaderConversion> {
        let mut out: Vec<LoaderConversion> = params
            .iter()
            .filter(|p| p.desc.is_input() && !p.desc.mbz)
            .filter(|p| self.index.is_class_handle(&p.param.ty))
            .map(|p| {
                let range = if types::is_pointer(&p.param.ty) {
                    p.desc.range.as_ref().map(LoaderRange::from)
                } else {
                    None
                };
                self.conversion(p, range)
            })
            .collect();
        if let Some(first) = out.iter_mut().find(|c| c.range.is_none()) {
            first.receiver = true;
        }
        out
    }

    /// Output, in/out and released class handles wrapped into (or removed
    /// from) loader objects after the call.
    pub fn loader_epilogue(&self, params: &[ParamInfo<'_>]) -> Vec<LoaderConversion> {
        params
            .iter()
            .filter(|p| !p.desc.mbz)
            .filter(|p| p.desc.release || p.desc.is_output() || p.desc.is_inoutput())
            .filter(|p| self.index.is_class_handle(&p.param.ty))
            .map(|p| self.conversion(p, p.desc.range.as_ref().map(LoaderRange::from)))
            .collect()
    }
}
