//! Layers family: validation for every section, tracing for sections that
//! enable it.

use super::{tracer, validation, Artifact, Generator, SectionContext};
use crate::config::Family;
use crate::error::Result;

pub struct LayersGenerator;

impl Generator for LayersGenerator {
    fn family(&self) -> Family {
        Family::Layers
    }

    fn artifacts(&self, ctx: &SectionContext) -> Result<Vec<Artifact>> {
        let mut out = validation::artifacts(ctx)?;
        if ctx.tracing {
            out.extend(tracer::artifacts(ctx)?);
        }
        Ok(out)
    }
}
