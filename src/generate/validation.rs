//! Validation layer sources.

use super::{Artifact, SectionContext};
use crate::error::Result;

// template, directory under the validation layer, file suffix
const FILES: &[(&str, &str, &str)] = &[
    ("valddi.cpp", "", "valddi.cpp"),
    ("entry_points.h", "common/", "entry_points.h"),
    ("param.cpp", "parameter_validation/", "parameter_validation.cpp"),
    ("param.h", "parameter_validation/", "parameter_validation.h"),
    ("handle_lifetime.h", "handle_lifetime_tracking/", "handle_lifetime.h"),
    ("handle_lifetime.cpp", "handle_lifetime_tracking/", "handle_lifetime.cpp"),
];

pub fn artifacts(ctx: &SectionContext) -> Result<Vec<Artifact>> {
    FILES
        .iter()
        .map(|&(template, dir, suffix)| {
            Artifact::new(
                format!("source/layers/validation/{}{}_{}", dir, ctx.ns, suffix),
                template,
                ctx,
            )
        })
        .collect()
}
