//! C and C++ spellings of types, parameter names, enumerators and values.

use super::{ParamInfo, Resolver, Scope};
use crate::names;
use crate::subst::Dialect;
use crate::traits::{types, values};
use regex::Regex;
use std::sync::LazyLock;

static RE_HANDLE_TO_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(const\s*)?(\w*:?:?\w+)(\**)").unwrap());
static RE_TYPE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+)_t$").unwrap());
static RE_LEADING_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+\w*)").unwrap());

impl Resolver<'_> {
    pub fn c_type(&self, ty: &str) -> String {
        self.subst.c(ty)
    }

    /// C++ spelling of `ty` seen from `scope`.
    ///
    /// Types of another class are qualified `Cls::type`; handles become
    /// pointers to their class when `handle_to_class` is set and the scope
    /// is not a class declaration. The verbose class part of a non-handle
    /// type name is dropped.
    pub fn cpp_type(&self, scope: &Scope<'_>, ty: &str, handle_to_class: bool) -> String {
        let mut name = self.subst.cpp(ty);
        let Some(cname) = self.index.find_class_name(ty) else {
            return name;
        };
        let tags = self.subst.tags();
        let is_global = tags.contains_key(cname);
        let is_namespace = tags.get(cname).is_some_and(|v| v == self.subst.namespace());
        let is_handle = types::is_handle(ty);
        let is_inscope = if scope.is_class || !is_global {
            scope.class == Some(cname)
        } else {
            false
        };

        let cname_bare = self.subst.apply(cname, Dialect::CppUnqualified);
        let cname_cpp = self.subst.cpp(cname);

        if !(is_global || is_namespace || is_handle || is_inscope) {
            name = self.subst.apply(ty, Dialect::CppUnqualified);
            name = names::remove_class(&name, &cname_bare, false);
            name = names::add_class(&name, &cname_cpp);
        } else if handle_to_class && is_handle && !scope.is_class {
            let repl = format!("${{1}}{}*${{3}}", cname_cpp);
            name = RE_HANDLE_TO_CLASS.replace_all(&name, repl.as_str()).into_owned();
        }

        if !is_handle {
            name = names::remove_class(&name, &cname_cpp, false);
        }
        name
    }

    /// C spelling of a parameter name.
    pub fn c_param_name(&self, p: &ParamInfo<'_>) -> String {
        self.subst.c(&p.param.name)
    }

    /// C++ spelling of a parameter name; handle parameters are renamed to
    /// the class pointers they become.
    pub fn cpp_param_name(&self, p: &ParamInfo<'_>) -> String {
        let name = self.subst.cpp(&p.param.name);
        if types::is_handle(&p.param.ty) {
            names::cpp_handle_param(&name, p.desc.is_output() && !p.desc.optional)
        } else {
            name
        }
    }

    /// Spelling of an enumerator. In C++ the verbose enum prefix is dropped
    /// (flags keep theirs minus the class part) and names that would start
    /// with a digit get a leading `_`.
    pub fn etor_name(&self, enum_name: &str, etor: &str, cpp: bool) -> String {
        if !cpp {
            return self.subst.c(etor);
        }
        let name = self.subst.cpp(etor);
        if types::is_flags(enum_name) {
            let cname = self
                .index
                .find_class_name(enum_name)
                .map(|c| self.subst.cpp(c))
                .unwrap_or_default();
            return names::remove_class(&name, &cname, true);
        }
        let enum_cpp = self.subst.cpp(enum_name);
        let prefix = RE_TYPE_SUFFIX
            .replace(&enum_cpp, "${1}")
            .to_uppercase();
        let stripped = match name.strip_prefix(&format!("{}_", prefix)) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => name,
        };
        RE_LEADING_DIGIT.replace(&stripped, "_${1}").into_owned()
    }

    /// Spelling of a value expression: macros are C-substituted, known
    /// enumerators are enum-qualified in C++ (cast to `int` for array
    /// lengths), anything else follows the dialect.
    pub fn value_name(&self, value: &str, cpp: bool, is_array_size: bool, cbase: Option<&str>) -> String {
        if !cpp {
            return self.subst.c(value);
        }
        if self.index.is_macro(value) {
            return self.subst.c(value);
        }
        let Some(enum_name) = self.index.enum_of_etor(value) else {
            return self.subst.cpp(value);
        };

        let mut qualified = self.subst.cpp(enum_name);
        let cname = self
            .index
            .find_class_name(enum_name)
            .map(|c| self.subst.cpp(c))
            .unwrap_or_default();
        qualified = names::remove_class(&qualified, &cname, false);
        if !cname.is_empty() {
            if let Some(base) = cbase {
                if self.subst.cpp(base) != cname {
                    qualified = format!("{}::{}", cname, qualified);
                }
            }
        }
        let etor = self.etor_name(enum_name, value, true);
        if is_array_size {
            format!("static_cast<int>({}::{})", qualified, etor)
        } else {
            format!("{}::{}", qualified, etor)
        }
    }

    /// C++ spelling of an array member name, `name[LEN]` with the length
    /// spelled as a value.
    pub fn cpp_member_name(&self, name: &str, cbase: Option<&str>) -> String {
        if self.index.is_macro(name) {
            return self.subst.c(name);
        }
        match values::classify(name) {
            values::ValueKind::Array { name: base, len } => format!(
                "{}[{}]",
                self.subst.c(&base),
                self.value_name(&len, true, true, cbase)
            ),
            _ => self.subst.cpp(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaIndex;
    use crate::model::Document;
    use crate::subst::Substitutor;

    const SPEC: &str = r#"
sections:
  - name: core
    tags: { "$x": "ze", "$t": "zet" }
    objects:
      - { type: class, name: $xDevice }
      - { type: class, name: $xDriver }
      - { type: handle, name: $x_device_handle_t, class: $xDevice }
      - { type: struct, name: $x_device_properties_t, class: $xDevice }
      - { type: struct, name: $x_event_desc_t }
      - type: enum
        name: $x_device_type_t
        class: $xDevice
        etors:
          - { name: $X_DEVICE_TYPE_GPU, value: "1" }
          - { name: $X_DEVICE_TYPE_3D, value: "2" }
      - type: enum
        name: $x_device_mem_flags_t
        class: $xDevice
        etors:
          - { name: $X_DEVICE_MEM_FLAG_BIAS, value: "$X_BIT(0)" }
      - { type: macro, name: $X_MAX_NAME, value: "256" }
"#;

    fn with_resolver(check: impl FnOnce(&Resolver<'_>)) {
        let doc = Document::parse(SPEC).unwrap();
        let index = MetaIndex::build(&doc).unwrap();
        let subst = Substitutor::new("ze", &doc.sections[0].tags).unwrap();
        check(&Resolver::new(&subst, &index));
    }

    #[test]
    fn handles_become_class_pointers() {
        with_resolver(|r| {
            let scope = Scope { class: Some("$xDriver"), is_class: false };
            assert_eq!(r.cpp_type(&scope, "$x_device_handle_t", true), "Device*");
            assert_eq!(r.cpp_type(&scope, "$x_device_handle_t*", true), "Device**");
            assert_eq!(r.cpp_type(&scope, "$x_device_handle_t", false), "device_handle_t");
            assert_eq!(r.c_type("$x_device_handle_t*"), "ze_device_handle_t*");
        });
    }

    #[test]
    fn foreign_class_types_are_qualified() {
        with_resolver(|r| {
            let driver = Scope { class: Some("$xDriver"), is_class: false };
            assert_eq!(
                r.cpp_type(&driver, "$x_device_properties_t*", true),
                "Device::properties_t*"
            );
            let device = Scope { class: Some("$xDevice"), is_class: false };
            assert_eq!(r.cpp_type(&device, "$x_device_properties_t*", true), "properties_t*");
            assert_eq!(r.cpp_type(&device, "const $x_event_desc_t*", true), "const event_desc_t*");
            assert_eq!(r.cpp_type(&device, "uint32_t*", true), "uint32_t*");
        });
    }

    #[test]
    fn class_scopes_keep_handles() {
        with_resolver(|r| {
            let scope = Scope::class("$xDevice");
            assert_eq!(r.cpp_type(&scope, "$x_device_handle_t", true), "device_handle_t");
        });
    }

    #[test]
    fn etor_spellings() {
        with_resolver(|r| {
            assert_eq!(r.etor_name("$x_device_type_t", "$X_DEVICE_TYPE_GPU", false), "ZE_DEVICE_TYPE_GPU");
            assert_eq!(r.etor_name("$x_device_type_t", "$X_DEVICE_TYPE_GPU", true), "GPU");
            assert_eq!(r.etor_name("$x_device_type_t", "$X_DEVICE_TYPE_3D", true), "_3D");
            assert_eq!(
                r.etor_name("$x_device_mem_flags_t", "$X_DEVICE_MEM_FLAG_BIAS", true),
                "MEM_FLAG_BIAS"
            );
        });
    }

    #[test]
    fn values_are_enum_qualified() {
        with_resolver(|r| {
            assert_eq!(r.value_name("$X_DEVICE_TYPE_GPU", true, false, Some("$xDevice")), "type_t::GPU");
            assert_eq!(
                r.value_name("$X_DEVICE_TYPE_GPU", true, false, Some("$xDriver")),
                "Device::type_t::GPU"
            );
            assert_eq!(r.value_name("$X_MAX_NAME", true, false, None), "ZE_MAX_NAME");
            assert_eq!(r.value_name("$X_DEVICE_TYPE_GPU", false, false, None), "ZE_DEVICE_TYPE_GPU");
            assert_eq!(r.cpp_member_name("name[$X_MAX_NAME]", None), "name[ZE_MAX_NAME]");
            assert_eq!(
                r.cpp_member_name("ids[$X_DEVICE_TYPE_3D]", Some("$xDevice")),
                "ids[static_cast<int>(type_t::_3D)]"
            );
        });
    }
}
