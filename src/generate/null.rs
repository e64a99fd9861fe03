//! Null driver: one stub per function behind the driver's dispatch tables.

use super::{Artifact, Generator, SectionContext};
use crate::config::Family;
use crate::error::Result;

pub struct NullDriverGenerator;

impl Generator for NullDriverGenerator {
    fn family(&self) -> Family {
        Family::Drivers
    }

    fn artifacts(&self, ctx: &SectionContext) -> Result<Vec<Artifact>> {
        Ok(vec![Artifact::new(
            format!("source/drivers/null/{}_nullddi.cpp", ctx.ns),
            "nullddi.cpp",
            ctx,
        )?])
    }
}
