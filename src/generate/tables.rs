//! Dispatch and callback tables.
//!
//! Both kinds derive their names from [`table_base_name`], so every
//! artifact of a run spells a class's tables identically.

use super::views::FunctionView;
use crate::names;
use crate::subst::{Dialect, Substitutor};
use crate::text;
use crate::traits::objects::EXPERIMENTAL_SUFFIX;
use serde::Serialize;

/// Table name used when a class spells to nothing, e.g. the bare `$x`.
pub const GLOBAL_TABLE: &str = "Global";

/// Class name with every tag dropped: `$xDevice` → `Device`, `$x` → `Global`.
pub fn table_base_name(subst: &Substitutor, class: &str) -> String {
    let name = subst.apply(class, Dialect::CppUnqualified);
    if name.is_empty() {
        GLOBAL_TABLE.to_string()
    } else {
        name
    }
}

pub fn dispatch_table_name(subst: &Substitutor, class: &str, experimental: bool) -> String {
    let base = table_base_name(subst, class);
    if experimental {
        format!("{}{}", base, EXPERIMENTAL_SUFFIX)
    } else {
        base
    }
}

/// `zeGetDeviceProcAddrTable` and its typedef.
#[derive(Debug, Clone, Serialize)]
pub struct ExportView {
    pub name: String,
    pub pfn: String,
    pub param_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub export: ExportView,
    pub experimental: bool,
    pub functions: Vec<FunctionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackTableView {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub functions: Vec<FunctionView>,
}

fn table(ns: &str, api_version: &str, name: String, experimental: bool, functions: Vec<FunctionView>) -> TableView {
    let ty = format!("{}_{}_dditable_t", ns, names::camel_to_snake(&name));
    let mut param_lines = text::commented(&format!("{} version,", api_version), "[in] API version requested");
    param_lines.extend(text::commented(
        &format!("{}* pDdiTable", ty),
        "[in,out] pointer to table of DDI function pointers",
    ));
    TableView {
        export: ExportView {
            name: format!("{}Get{}ProcAddrTable", ns, name),
            pfn: format!("{}_pfnGet{}ProcAddrTable_t", ns, name),
            param_lines,
        },
        ty,
        name,
        experimental,
        functions,
    }
}

/// Dispatch tables of each class in order: the stable table, then the
/// experimental one. Classes without functions get no table.
pub fn dispatch_tables(
    subst: &Substitutor,
    api_version: &str,
    classes: &[(String, Vec<FunctionView>)],
) -> Vec<TableView> {
    let ns = subst.namespace();
    let mut out = Vec::new();
    for (class, functions) in classes {
        let (exp, stable): (Vec<FunctionView>, Vec<FunctionView>) =
            functions.iter().cloned().partition(|f| f.experimental);
        if !stable.is_empty() {
            out.push(table(ns, api_version, dispatch_table_name(subst, class, false), false, stable));
        }
        if !exp.is_empty() {
            out.push(table(ns, api_version, dispatch_table_name(subst, class, true), true, exp));
        }
    }
    out
}

/// Tracing callback tables, one per class with functions, covering stable
/// and experimental functions alike.
pub fn callback_tables(subst: &Substitutor, classes: &[(String, Vec<FunctionView>)]) -> Vec<CallbackTableView> {
    let ns = subst.namespace();
    classes
        .iter()
        .filter(|(_, functions)| !functions.is_empty())
        .map(|(class, functions)| {
            let name = table_base_name(subst, class);
            CallbackTableView {
                ty: format!("{}_{}_callbacks_t", ns, names::camel_to_snake(&name)),
                name,
                functions: functions.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn subst() -> Substitutor {
        let tags: BTreeMap<String, String> =
            [("$x".to_string(), "ze".to_string()), ("$t".to_string(), "zet".to_string())].into();
        Substitutor::new("ze", &tags).unwrap()
    }

    #[test]
    fn base_names() {
        let s = subst();
        assert_eq!(table_base_name(&s, "$xDevice"), "Device");
        assert_eq!(table_base_name(&s, "$x"), "Global");
        assert_eq!(table_base_name(&s, "$tDebug"), "Debug");
        assert_eq!(dispatch_table_name(&s, "$xDevice", true), "DeviceExp");
        assert_eq!(dispatch_table_name(&s, "$x", true), "GlobalExp");
    }

    #[test]
    fn export_spellings() {
        let t = table("ze", "ze_api_version_t", "CommandList".into(), false, Vec::new());
        assert_eq!(t.ty, "ze_command_list_dditable_t");
        assert_eq!(t.export.name, "zeGetCommandListProcAddrTable");
        assert_eq!(t.export.pfn, "ze_pfnGetCommandListProcAddrTable_t");
        assert!(t.export.param_lines[0].starts_with("ze_api_version_t version,"));
    }
}
