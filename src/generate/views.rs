//! Render-ready view of one function: every C, C++, loader and layer
//! spelling the templates need, computed once per section.

use super::tables;
use super::wrapper;
use crate::error::Result;
use crate::model::{Function, ResultCodes};
use crate::names;
use crate::resolve::{LoaderConversion, Resolver, Scope};
use crate::subst::Substitutor;
use crate::text;
use crate::traits::{objects, types, values};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::trace;

static RE_CHECK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^`(.*)`$").unwrap());

/// Section-wide naming rules for function symbols.
pub struct Naming<'a> {
    pub subst: &'a Substitutor,
    /// Own-namespace tags spelled `pfn`.
    pfn: Substitutor,
    /// Own-namespace tags dropped.
    bare: Substitutor,
    tag: &'a str,
}

impl<'a> Naming<'a> {
    pub fn new(subst: &'a Substitutor, tag: &'a str) -> Result<Self> {
        let ns = subst.namespace().to_string();
        let pfn = subst.retag(|_, v| if v == ns { "pfn".to_string() } else { v.to_string() })?;
        let bare = subst.retag(|_, v| if v == ns { String::new() } else { v.to_string() })?;
        Ok(Naming {
            subst,
            pfn,
            bare,
            tag,
        })
    }

    pub fn namespace(&self) -> &str {
        self.subst.namespace()
    }

    /// Owning class; class-less functions belong to the section tag.
    pub fn class_of<'f>(&self, f: &'f Function) -> &'f str
    where
        'a: 'f,
    {
        f.class.as_deref().unwrap_or(self.tag)
    }

    fn full_name(&self, f: &Function) -> String {
        format!("{}{}", self.class_of(f), f.name)
    }

    /// `zeDeviceGetProperties`
    pub fn c_name(&self, f: &Function) -> String {
        self.subst.c(&self.full_name(f))
    }

    /// `ze_pfnDeviceGetProperties_t`, or `..Cb_t` with `epilogue = "Cb"`.
    pub fn pfn_type(&self, f: &Function, epilogue: &str) -> String {
        format!(
            "{}_{}{}_t",
            self.namespace(),
            self.pfn.c(&self.full_name(f)),
            epilogue
        )
    }

    /// `zelTracerDeviceGetPropertiesRegisterCallback`
    pub fn tracer(&self, f: &Function) -> String {
        format!(
            "{}lTracer{}RegisterCallback",
            self.namespace(),
            self.bare.c(&self.full_name(f))
        )
    }

    /// `ze_device_get_properties_params_t`
    pub fn params_type(&self, f: &Function) -> String {
        format!("{}_params_t", names::camel_to_snake(&self.c_name(f)))
    }
}

/// A C parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamView {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Member of the tracer params struct pointing at this parameter.
    pub ptr: String,
}

/// Result code returned when any of its backtick conditions holds.
#[derive(Debug, Clone, Serialize)]
pub struct CheckView {
    pub code: String,
    pub conditions: Vec<String>,
}

/// Out-of-range test for an enum parameter.
#[derive(Debug, Clone, Serialize)]
pub struct EnumCheck {
    pub name: String,
    pub condition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CppView {
    /// Class part of the out-of-class definition, empty for globals.
    pub class: String,
    pub name: String,
    pub qualified_name: String,
    pub decl_type: String,
    pub def_type: String,
    pub ret_expr: String,
    pub arity: usize,
    pub free: bool,
    pub params: Vec<String>,
    pub locals: Vec<String>,
    pub conversions: Vec<String>,
    pub args: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaderView {
    pub receiver: Option<LoaderConversion>,
    /// Non-range input handles unwrapped in place.
    pub inputs: Vec<LoaderConversion>,
    /// Input handle arrays copied into `<name>Local` buffers.
    pub ranges: Vec<LoaderConversion>,
    pub prologue: Vec<LoaderConversion>,
    pub epilogue: Vec<LoaderConversion>,
    /// Some epilogue entry wraps an output.
    pub wraps: bool,
    /// Arguments of the driver call.
    pub args: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionView {
    pub name: String,
    pub class: String,
    pub table: String,
    pub callback_table: String,
    pub pfn: String,
    pub pfn_type: String,
    pub pfncb: String,
    pub pfncb_type: String,
    pub params_type: String,
    pub tracer: String,
    pub brief: Vec<String>,
    pub returns_doc: Vec<String>,
    pub return_type: String,
    pub param_lines: Vec<String>,
    pub params: Vec<ParamView>,
    pub args: String,
    pub checks: Vec<CheckView>,
    pub enum_checks: Vec<EnumCheck>,
    pub extension_params: Vec<String>,
    pub experimental: bool,
    pub version: String,
    pub cpp: CppView,
    pub loader: LoaderView,
}

impl FunctionView {
    pub fn build(naming: &Naming<'_>, r: &Resolver<'_>, results: &ResultCodes, f: &Function) -> Result<Self> {
        let subst = naming.subst;
        let class = naming.class_of(f);
        let infos = r.params(f)?;
        let plan = r.marshal(f, &infos)?;
        for m in &plan {
            trace!(function = %f.identity(), param = %m.name, strategy = m.strategy.label(), "marshal");
        }
        let shape = r.return_shape(f, &infos, &plan);
        let name = naming.c_name(f);

        let params: Vec<ParamView> = infos
            .iter()
            .map(|p| {
                let name = r.c_param_name(p);
                ParamView {
                    ptr: format!("p{}", name),
                    name,
                    ty: r.c_type(&p.param.ty),
                }
            })
            .collect();

        let mut param_lines = Vec::new();
        for (i, (p, view)) in infos.iter().zip(&params).enumerate() {
            let mut prologue = format!("{} {}", view.ty, view.name);
            if i + 1 < params.len() {
                prologue.push(',');
            }
            param_lines.extend(text::commented(&prologue, &subst.comment(&p.param.desc)));
        }
        if param_lines.is_empty() {
            param_lines.push("void".to_string());
        }

        let mut checks = Vec::new();
        let mut returns_doc = vec!["@returns".to_string()];
        for rc in &f.returns {
            returns_doc.push(format!("    - {}", subst.comment(&rc.code)));
            for cond in &rc.conditions {
                returns_doc.push(format!("        + {}", subst.comment(cond)));
            }
            let conditions: Vec<String> = rc
                .conditions
                .iter()
                .filter_map(|c| RE_CHECK.captures(c.trim()).map(|m| subst.c(&m[1])))
                .collect();
            if !conditions.is_empty() {
                checks.push(CheckView {
                    code: subst.c(&rc.code),
                    conditions,
                });
            }
        }

        let enum_checks = infos
            .iter()
            .filter(|p| p.desc.is_input() && !types::is_pointer(&p.param.ty))
            .filter(|p| r.index.is_enum(&p.param.ty))
            .filter_map(|p| {
                let bound = enum_bound(r, &p.param.ty)?;
                let name = r.c_param_name(p);
                Some(EnumCheck {
                    condition: format!("{} < {}", bound, name),
                    name,
                })
            })
            .collect();

        let extension_params = infos
            .iter()
            .filter(|p| types::is_pointer(&p.param.ty) && types::is_extension_record(&p.param.ty))
            .map(|p| r.c_param_name(p))
            .collect();

        let free = r.is_free(f);
        let class_cpp = subst.cpp(class);
        let cpp_name = subst.cpp(&f.name);
        let scope = Scope::function(f);
        let receiver_skipped = if free { &infos[..] } else { infos.get(1..).unwrap_or(&[]) };
        let mut ordered: Vec<_> = receiver_skipped
            .iter()
            .filter(|p| p.desc.is_input() || p.desc.is_inoutput())
            .collect();
        ordered.extend(
            receiver_skipped
                .iter()
                .filter(|p| p.desc.is_output() && p.desc.optional),
        );
        let cpp_params = ordered
            .iter()
            .map(|p| format!("{} {}", r.cpp_type(&scope, &p.param.ty, true), r.cpp_param_name(p)))
            .collect();

        let cpp = CppView {
            qualified_name: if class_cpp.is_empty() {
                cpp_name.clone()
            } else {
                format!("{}::{}", class_cpp, cpp_name)
            },
            class: class_cpp,
            name: cpp_name,
            decl_type: shape.decl_type(),
            def_type: shape.def_type(),
            ret_expr: shape.expr(),
            arity: shape.arity(),
            free,
            params: cpp_params,
            locals: wrapper::locals(&plan),
            conversions: wrapper::conversions(&plan),
            args: wrapper::args(&plan),
        };

        let prologue = r.loader_prologue(&infos);
        let epilogue = r.loader_epilogue(&infos);
        let ranges: Vec<LoaderConversion> = prologue.iter().filter(|c| c.range.is_some()).cloned().collect();
        let loader_args = params
            .iter()
            .map(|p| {
                if ranges.iter().any(|c| c.name == p.name) {
                    format!("{}Local", p.name)
                } else {
                    p.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let loader = LoaderView {
            receiver: prologue.iter().find(|c| c.receiver).cloned(),
            inputs: prologue.iter().filter(|c| c.range.is_none()).cloned().collect(),
            wraps: epilogue.iter().any(|c| !c.release),
            ranges,
            prologue,
            epilogue,
            args: loader_args,
        };

        let brief = brief_lines(&subst.comment(&f.desc));

        Ok(FunctionView {
            table: tables::dispatch_table_name(subst, class, objects::is_experimental(&f.name)),
            callback_table: tables::table_base_name(subst, class),
            class: subst.c(class),
            pfn: format!("pfn{}", subst.c(&f.name)),
            pfn_type: naming.pfn_type(f, ""),
            pfncb: format!("pfn{}Cb", subst.c(&f.name)),
            pfncb_type: naming.pfn_type(f, "Cb"),
            params_type: naming.params_type(f),
            tracer: naming.tracer(f),
            brief,
            returns_doc,
            return_type: subst.c(f.return_type.as_deref().unwrap_or(&results.ty)),
            param_lines,
            args: params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", "),
            params,
            checks,
            enum_checks,
            extension_params,
            experimental: objects::is_experimental(&f.name),
            version: f.version.to_string(),
            cpp,
            loader,
            name,
        })
    }
}

/// Doc lines of a function description, the first one tagged `@brief`.
fn brief_lines(desc: &str) -> Vec<String> {
    text::split_line(desc.trim(), 70)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let line = if i == 0 {
                format!("@brief {}", line)
            } else {
                format!("       {}", line)
            };
            line.trim_end().to_string()
        })
        .collect()
}

/// Largest valid value of an enum: a mask of every declared bit for
/// bitfields, the last enumerator otherwise.
fn enum_bound(r: &Resolver<'_>, ty: &str) -> Option<String> {
    let etors = r.index.etors(ty);
    if r.index.is_bitfield(ty) {
        let mask = etors
            .iter()
            .filter_map(|e| match values::classify(e.value.as_deref()?) {
                values::ValueKind::Bit(n) if n < 64 => Some(1u64 << n),
                _ => None,
            })
            .fold(0u64, |acc, bit| acc | bit);
        return Some(format!("{:#x}", mask));
    }
    etors.last().map(|e| r.subst.c(&e.name))
}
