//! Loader family: per-section loader shim, plus the internal header that
//! collects every section's factories once all sections are generated.

use super::{Artifact, Generator, SectionContext};
use crate::config::Family;
use crate::error::Result;
use serde::Serialize;

/// Region of `<ns>_ldrddi.h` merged into the loader's internal header.
pub const FACTORIES_REGION: &str = "factories";

pub struct LoaderGenerator;

impl Generator for LoaderGenerator {
    fn family(&self) -> Family {
        Family::Loader
    }

    fn artifacts(&self, ctx: &SectionContext) -> Result<Vec<Artifact>> {
        let ns = &ctx.ns;
        Ok(vec![
            Artifact::new(format!("source/loader/{}_ldrddi.h", ns), "ldrddi.h", ctx)?
                .with_region(FACTORIES_REGION),
            Artifact::new(format!("source/loader/{}_ldrddi.cpp", ns), "ldrddi.cpp", ctx)?,
        ])
    }
}

#[derive(Serialize)]
struct InternalContext<'a> {
    ns: &'a str,
    ns_upper: String,
    namespaces: &'a [String],
}

/// `source/loader/<first ns>_loader_internal.h`, rendered with an empty
/// factories region.
pub fn internal_header(namespaces: &[String]) -> Result<Artifact> {
    let ns = namespaces.first().map(String::as_str).unwrap_or_default();
    Artifact::new(
        format!("source/loader/{}_loader_internal.h", ns),
        "loader_internal.h",
        &InternalContext {
            ns,
            ns_upper: ns.to_uppercase(),
            namespaces,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_header_is_named_after_the_first_namespace() {
        let a = internal_header(&["ze".to_string(), "zet".to_string()]).unwrap();
        assert_eq!(a.path.to_str(), Some("source/loader/ze_loader_internal.h"));
        assert_eq!(a.context["namespaces"][1], "zet");
        assert!(a.region.is_none());
    }
}
