//! Library family: the DDI header, the forwarding C library and the C++
//! wrapper.

use super::{Artifact, Generator, SectionContext};
use crate::config::Family;
use crate::error::Result;

pub struct LibraryGenerator;

impl Generator for LibraryGenerator {
    fn family(&self) -> Family {
        Family::Lib
    }

    fn artifacts(&self, ctx: &SectionContext) -> Result<Vec<Artifact>> {
        let ns = &ctx.ns;
        Ok(vec![
            Artifact::new(format!("include/{}_ddi.h", ns), "ddi.h", ctx)?,
            Artifact::new(format!("source/lib/{}_libapi.cpp", ns), "libapi.cpp", ctx)?,
            Artifact::new(format!("source/lib/{}_libddi.cpp", ns), "libddi.cpp", ctx)?,
            Artifact::new(format!("source/wrapper/{}_wprapi.cpp", ns), "wprapi.cpp", ctx)?,
        ])
    }
}
