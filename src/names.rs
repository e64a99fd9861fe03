//! Small name transformations shared by the resolver and the generators.

use regex::Regex;
use std::sync::LazyLock;

static RE_CAMEL_1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static RE_CAMEL_2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static RE_H_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bh([A-Z]\w*)").unwrap());
static RE_PH_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bph([A-Z]\w*)").unwrap());
static RE_PP_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bp(p[A-Z]\w*)").unwrap());
static RE_LOCAL_P: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^p([hpA-Z]\w*)$").unwrap());

/// `DeviceGetProperties` → `device_get_properties`
pub fn camel_to_snake(name: &str) -> String {
    let s = RE_CAMEL_1.replace_all(name, "${1}_${2}");
    RE_CAMEL_2.replace_all(&s, "${1}_${2}").to_lowercase()
}

/// Drop leading qualifiers: `const foo_t*` → `foo_t*`
pub fn remove_const(ty: &str) -> &str {
    ty.rsplit(' ').next().unwrap_or(ty)
}

/// Drop the last pointer level.
pub fn remove_ptr(ty: &str) -> &str {
    ty.strip_suffix('*').unwrap_or(ty)
}

pub fn remove_all_ptr(ty: &str) -> String {
    ty.replace('*', "")
}

pub fn remove_const_ptr(ty: &str) -> String {
    remove_ptr(remove_const(ty)).to_string()
}

/// `const type*` → `const cls::type*`
pub fn add_class(ty: &str, class: &str) -> String {
    match ty.rsplit_once(' ') {
        Some((head, last)) => format!("{} {}::{}", head, class, last),
        None => format!("{}::{}", class, ty),
    }
}

/// Remove the snake-cased class part of a type or etor name:
/// `device_mem_alloc_desc_t` in class `Device` → `mem_alloc_desc_t`.
pub fn remove_class(name: &str, class: &str, upper: bool) -> String {
    if class.is_empty() {
        return name.to_string();
    }
    let mut cls = camel_to_snake(class);
    if upper {
        cls = cls.to_uppercase();
    }
    let pattern = format!(r"^(.*)({}_)(\w+)", regex::escape(&cls));
    match Regex::new(&pattern) {
        Ok(re) => re.replace(name, "${1}${3}").into_owned(),
        Err(_) => name.to_string(),
    }
}

/// C++ spelling of a handle parameter name: `hDevice` → `pDevice`,
/// `phDevice` → `ppDevice`, collapsed to `pDevice` for required outputs.
pub fn cpp_handle_param(name: &str, required_output: bool) -> String {
    let n = RE_H_PARAM.replace_all(name, "p${1}");
    let n = RE_PH_PARAM.replace_all(&n, "pp${1}");
    if required_output {
        RE_PP_PARAM.replace_all(&n, "${1}").into_owned()
    } else {
        n.into_owned()
    }
}

/// Local variable name for a parameter: drop one `p` and lower the first
/// letter. `pCount` → `count`, `phDevice` → `hDevice`, `ppName` → `pName`.
pub fn local_name(name: &str) -> String {
    let stripped = RE_LOCAL_P.replace(name, "${1}");
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case() {
        assert_eq!(camel_to_snake("DeviceGetProperties"), "device_get_properties");
        assert_eq!(camel_to_snake("zeDeviceGet"), "ze_device_get");
        assert_eq!(camel_to_snake("Global"), "global");
        assert_eq!(camel_to_snake("MetricGroupExp"), "metric_group_exp");
        assert_eq!(camel_to_snake("PCIState"), "pci_state");
    }

    #[test]
    fn const_and_pointer_stripping() {
        assert_eq!(remove_const("const char*"), "char*");
        assert_eq!(remove_ptr("char**"), "char*");
        assert_eq!(remove_all_ptr("char**"), "char");
        assert_eq!(remove_const_ptr("const desc_t*"), "desc_t");
    }

    #[test]
    fn class_qualification() {
        assert_eq!(add_class("const desc_t*", "Device"), "const Device::desc_t*");
        assert_eq!(add_class("desc_t", "Device"), "Device::desc_t");
        assert_eq!(remove_class("device_mem_alloc_desc_t", "Device", false), "mem_alloc_desc_t");
        assert_eq!(remove_class("DEVICE_FLAG_X", "Device", true), "FLAG_X");
        assert_eq!(remove_class("event_desc_t", "", false), "event_desc_t");
        assert_eq!(remove_class("event_desc_t", "Device", false), "event_desc_t");
    }

    #[test]
    fn handle_param_names() {
        assert_eq!(cpp_handle_param("hDevice", false), "pDevice");
        assert_eq!(cpp_handle_param("phDevice", false), "ppDevice");
        assert_eq!(cpp_handle_param("phDevice", true), "pDevice");
    }

    #[test]
    fn local_names() {
        assert_eq!(local_name("pCount"), "count");
        assert_eq!(local_name("phDevice"), "hDevice");
        assert_eq!(local_name("ppName"), "pName");
        assert_eq!(local_name("Version"), "version");
        assert_eq!(local_name("hDevice"), "hDevice");
    }
}
