//! Tracing layer sources, the tracer registration library entry points and
//! the public registration header.

use super::{Artifact, SectionContext};
use crate::error::Result;

pub fn artifacts(ctx: &SectionContext) -> Result<Vec<Artifact>> {
    let ns = &ctx.ns;
    Ok(vec![
        Artifact::new(format!("source/layers/tracing/{}_trcddi.cpp", ns), "trcddi.cpp", ctx)?,
        Artifact::new(
            format!("source/layers/tracing/{}_tracing_register_cb.cpp", ns),
            "trc_setters.cpp",
            ctx,
        )?,
        Artifact::new(
            format!("source/layers/tracing/{}_tracing_cb_structs.h", ns),
            "trc_cb_struct.h",
            ctx,
        )?,
        Artifact::new(
            format!("source/lib/{}_tracing_register_cb_libapi.cpp", ns),
            "trc_register_cb_libapi.cpp",
            ctx,
        )?,
        Artifact::new(
            format!("include/layers/{}l_tracing_register_cb.h", ns),
            "trc_setters.h",
            ctx,
        )?,
    ])
}
