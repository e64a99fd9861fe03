//! Artifact generators with trait-based family dispatch.
//!
//! A run builds one [`SectionContext`] per requested section and hands it
//! to each enabled [`Generator`] in family order (lib → loader → layers →
//! drivers). Generators only choose templates and paths; every name and
//! spelling comes from the context.

mod layers;
mod library;
mod loader;
mod null;
mod tracer;
mod validation;

pub mod tables;
pub mod views;
pub mod wrapper;

use crate::config::{Families, Family, GenerateOptions, Mode};
use crate::error::{GenError, Result};
use crate::merge;
use crate::meta::MetaIndex;
use crate::model::{Document, Function, Section};
use crate::render::{Emitter, RunContext};
use crate::resolve::Resolver;
use crate::subst::Substitutor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tables::{CallbackTableView, TableView};
use tracing::{debug, error, info, warn};
use views::{FunctionView, Naming};

/// One file to render: template name, output path relative to the output
/// directory, and the context it is rendered with.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub template: &'static str,
    pub context: serde_json::Value,
    /// Region of this artifact merged into the loader's internal header.
    pub region: Option<&'static str>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, template: &'static str, ctx: &impl Serialize) -> Result<Self> {
        let context = serde_json::to_value(ctx).map_err(|e| GenError::TemplateRender {
            template: template.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Artifact {
            path: path.into(),
            template,
            context,
            region: None,
        })
    }

    pub fn with_region(mut self, region: &'static str) -> Self {
        self.region = Some(region);
        self
    }
}

/// Trait for producing the artifacts of one family for a section.
pub trait Generator {
    fn family(&self) -> Family;
    fn artifacts(&self, ctx: &SectionContext) -> Result<Vec<Artifact>>;
}

/// Generators of the enabled families, in emission order.
pub fn create_generators(families: &Families) -> Vec<Box<dyn Generator>> {
    let all: [Box<dyn Generator>; 4] = [
        Box::new(library::LibraryGenerator),
        Box::new(loader::LoaderGenerator),
        Box::new(layers::LayersGenerator),
        Box::new(null::NullDriverGenerator),
    ];
    all.into_iter()
        .filter(|g| families.enabled(g.family()))
        .collect()
}

/// Result codes in C spelling.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    #[serde(rename = "type")]
    pub ty: String,
    pub success: String,
    pub uninitialized: String,
    pub invalid_null_pointer: String,
    pub invalid_null_handle: String,
    pub unsupported_version: String,
    pub unsupported_feature: String,
    pub out_of_host_memory: String,
    pub invalid_enumeration: String,
    pub api_version: String,
}

/// A class handle as the loader sees it.
#[derive(Debug, Clone, Serialize)]
pub struct HandleView {
    #[serde(rename = "type")]
    pub ty: String,
    pub obj: String,
    pub factory: String,
    pub factory_type: String,
}

/// Everything the templates of one section render from.
#[derive(Debug, Serialize)]
pub struct SectionContext {
    pub section: String,
    pub ns: String,
    pub ns_upper: String,
    pub version: String,
    pub tracing: bool,
    pub results: ResultView,
    /// Functions in table order: class ordinal, then (version, ordinal).
    pub functions: Vec<FunctionView>,
    pub tables: Vec<TableView>,
    pub callback_tables: Vec<CallbackTableView>,
    pub handles: Vec<HandleView>,
}

impl SectionContext {
    pub fn build(doc: &Document, section: &Section, index: &MetaIndex, opts: &GenerateOptions) -> Result<Self> {
        let ns = section.namespace()?;
        let subst = Substitutor::new(ns, &section.tags)?;
        let naming = Naming::new(&subst, &section.tag)?;
        let resolver = Resolver::new(&subst, index);

        let mut grouped: Vec<(String, Vec<&Function>)> = Vec::new();
        for f in section.functions() {
            if f.version > opts.version {
                debug!(section = %section.name, function = %f.identity(), version = %f.version, "skipping newer function");
                continue;
            }
            let class = naming.class_of(f);
            match grouped.iter_mut().find(|(c, _)| c == class) {
                Some((_, fns)) => fns.push(f),
                None => grouped.push((class.to_string(), vec![f])),
            }
        }
        let position = |class: &str| {
            index
                .classes()
                .iter()
                .position(|c| c.name == class)
                .unwrap_or(usize::MAX)
        };
        grouped.sort_by_key(|(class, _)| position(class));

        let mut classes: Vec<(String, Vec<FunctionView>)> = Vec::new();
        for (class, mut fns) in grouped {
            fns.sort_by_key(|f| (f.version, f.ordinal));
            let mut views = Vec::with_capacity(fns.len());
            for f in fns {
                match FunctionView::build(&naming, &resolver, &doc.results, f) {
                    Ok(view) => views.push(view),
                    Err(e) => {
                        error!(section = %section.name, class = %class, function = %f.name, error = %e, "failed to resolve function");
                        if opts.mode == Mode::BestEffort && e.is_object_error() {
                            continue;
                        }
                        return Err(e);
                    }
                }
            }
            classes.push((class, views));
        }

        let r = &doc.results;
        let results = ResultView {
            ty: subst.c(&r.ty),
            success: subst.c(&r.success),
            uninitialized: subst.c(&r.uninitialized),
            invalid_null_pointer: subst.c(&r.invalid_null_pointer),
            invalid_null_handle: subst.c(&r.invalid_null_handle),
            unsupported_version: subst.c(&r.unsupported_version),
            unsupported_feature: subst.c(&r.unsupported_feature),
            out_of_host_memory: subst.c(&r.out_of_host_memory),
            invalid_enumeration: subst.c(&r.invalid_enumeration),
            api_version: subst.c(&r.api_version),
        };

        let handles = index
            .class_handles_in(&section.name, opts.version)
            .map(|h| {
                let ty = subst.c(h);
                let (obj, factory) = MetaIndex::loader_names(&ty);
                HandleView {
                    factory_type: format!("{}_t", factory),
                    ty,
                    obj,
                    factory,
                }
            })
            .collect();

        Ok(SectionContext {
            section: section.name.clone(),
            ns: ns.to_string(),
            ns_upper: ns.to_uppercase(),
            version: opts.version.to_string(),
            tracing: section.tracing_enabled(),
            tables: tables::dispatch_tables(&subst, &results.api_version, &classes),
            callback_tables: tables::callback_tables(&subst, &classes),
            functions: classes.into_iter().flat_map(|(_, views)| views).collect(),
            results,
            handles,
        })
    }
}

/// Generate every requested section into `opts.out_dir`.
///
/// Object errors abort in strict mode and are skipped in best-effort mode.
/// Render and write failures never abort the run; they are collected in
/// the returned [`RunContext`].
pub fn run(doc: &Document, opts: &GenerateOptions) -> Result<RunContext> {
    let index = MetaIndex::build(doc)?;
    let emitter = Emitter::new()?;
    let generators = create_generators(&opts.families);
    let mut run = RunContext::new(&opts.out_dir);
    let mut namespaces: Vec<String> = Vec::new();
    let mut regions: Vec<(String, String)> = Vec::new();

    for section in doc.sections.iter().filter(|s| opts.wants_section(&s.name)) {
        let ctx = SectionContext::build(doc, section, &index, opts)?;
        info!(section = %ctx.section, namespace = %ctx.ns, functions = ctx.functions.len(), "generating section");
        namespaces.push(ctx.ns.clone());
        for generator in &generators {
            debug!(section = %ctx.section, family = generator.family().name(), "rendering family");
            for artifact in generator.artifacts(&ctx)? {
                let text = run.emit(&emitter, &artifact);
                if let (Some(_), Some(text)) = (artifact.region, text) {
                    regions.push((artifact.path.display().to_string(), text));
                }
            }
        }
    }

    if opts.families.loader && !namespaces.is_empty() {
        let artifact = loader::internal_header(&namespaces)?;
        if let Some(base) = run.render(&emitter, &artifact) {
            let merged = merge::merge_region(&base, &regions, loader::FACTORIES_REGION);
            for warning in &merged.warnings {
                warn!("{}", warning);
            }
            run.write(&artifact.path, &merged.text);
        }
    }

    if opts.debug {
        run.write_manifest(Path::new(MANIFEST))?;
    }
    info!(files = run.written.len(), lines = run.lines, "generation complete");
    Ok(run)
}

/// Manifest of written paths, relative to the output directory.
pub const MANIFEST: &str = "generated.json";

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = r#"
sections:
  - name: core
    tags: { "$x": "core" }
    objects:
      - { type: class, name: $xDevice }
      - { type: handle, name: $x_device_handle_t, class: $xDevice }
      - { type: struct, name: $x_device_properties_t, class: $xDevice }
      - type: function
        name: GetProperties
        class: $xDevice
        desc: Retrieves properties of the device.
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle of the device" }
          - { name: pProperties, type: $x_device_properties_t*, desc: "[out] query result for device properties" }
        returns:
          - $X_RESULT_ERROR_INVALID_NULL_HANDLE:
              - "`nullptr == hDevice`"
          - $X_RESULT_ERROR_INVALID_NULL_POINTER:
              - "`nullptr == pProperties`"
      - type: function
        name: GetPropertiesExp
        class: $xDevice
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle of the device" }
      - type: function
        name: Later
        class: $xDevice
        version: "1.2"
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle of the device" }
      - type: function
        name: Broken
        class: $xDevice
        params:
          - { name: pMissing, type: $x_missing_t*, desc: "[out] unresolved" }
"#;

    fn context(mode: Mode) -> Result<SectionContext> {
        let doc = Document::parse(CORE).unwrap();
        let index = MetaIndex::build(&doc).unwrap();
        let mut opts = GenerateOptions::new("out");
        opts.mode = mode;
        SectionContext::build(&doc, &doc.sections[0], &index, &opts)
    }

    #[test]
    fn strict_mode_aborts_on_unresolved_types() {
        let err = context(Mode::Strict).unwrap_err();
        assert!(matches!(err, GenError::SpecResolution { .. }));
    }

    #[test]
    fn best_effort_skips_failing_functions() {
        let ctx = context(Mode::BestEffort).unwrap();
        let names: Vec<&str> = ctx.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["coreDeviceGetProperties", "coreDeviceGetPropertiesExp"]);
    }

    #[test]
    fn single_forwarding_entry_returns_the_properties() {
        let ctx = context(Mode::BestEffort).unwrap();
        let f = &ctx.functions[0];
        assert_eq!(f.cpp.arity, 1);
        assert_eq!(f.cpp.decl_type, "properties_t");
        assert_eq!(f.pfn_type, "core_pfnDeviceGetProperties_t");
        assert_eq!(f.params_type, "core_device_get_properties_params_t");
        assert_eq!(f.tracer, "corelTracerDeviceGetPropertiesRegisterCallback");
        assert_eq!(f.checks.len(), 2);
        assert_eq!(f.checks[0].conditions, vec!["nullptr == hDevice"]);
    }

    #[test]
    fn dispatch_and_callback_tables_agree_on_names() {
        let ctx = context(Mode::BestEffort).unwrap();
        let names: Vec<&str> = ctx.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Device", "DeviceExp"]);
        assert_eq!(ctx.callback_tables.len(), 1);
        assert_eq!(ctx.callback_tables[0].name, ctx.tables[0].name);
        for f in &ctx.functions {
            assert_eq!(f.callback_table, ctx.callback_tables[0].name);
            assert!(f.table.starts_with(&f.callback_table));
        }
        assert_eq!(ctx.tables[1].ty, "core_device_exp_dditable_t");
    }

    #[test]
    fn handles_carry_loader_names() {
        let ctx = context(Mode::BestEffort).unwrap();
        assert_eq!(ctx.handles.len(), 1);
        assert_eq!(ctx.handles[0].obj, "core_device_object_t");
        assert_eq!(ctx.handles[0].factory_type, "core_device_factory_t");
    }

    #[test]
    fn families_filter_generators() {
        let mut families = Families::default();
        families.layers = false;
        let order: Vec<Family> = create_generators(&families).iter().map(|g| g.family()).collect();
        assert_eq!(order, vec![Family::Lib, Family::Loader, Family::Drivers]);
    }
}
