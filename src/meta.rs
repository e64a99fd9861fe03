//! Metadata index: type → owning class and version, class → children and
//! factory, built once from every section of a document.

use crate::error::{GenError, Result};
use crate::model::{Document, Object, Version};
use crate::names;
use crate::traits::{params, types, values};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Types that are never looked up in the index.
pub const PRIMITIVES: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "unsigned", "float", "double", "size_t",
    "intptr_t", "uintptr_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
    "uint32_t", "uint64_t",
];

const DEFAULT_ORDINAL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Handle,
    Enum { bitfield: bool },
    Struct,
    Typedef,
}

impl TypeKind {
    fn label(&self) -> &'static str {
        match self {
            TypeKind::Handle => "handle",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Typedef => "typedef",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub kind: TypeKind,
    pub class: Option<String>,
    pub section: String,
    /// Version that introduced the type.
    pub version: Version,
}

#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub name: String,
    pub children: Vec<String>,
    pub base: Option<String>,
    pub singleton: bool,
    pub ordinal: u32,
    /// Member names taken by the C++ constructor (`[in]` members).
    pub ctor_params: Vec<String>,
    /// Class whose factory creates this class's wrappers, if any.
    pub factory: Option<String>,
    /// Factory to use when a wrapper of this class is created from a
    /// function of the given child class.
    pub child_factories: BTreeMap<String, Option<String>>,
    declared: bool,
}

impl ClassEntry {
    fn new(name: &str, ordinal: u32) -> Self {
        ClassEntry {
            name: name.to_string(),
            children: Vec::new(),
            base: None,
            singleton: false,
            ordinal,
            ctor_params: Vec::new(),
            factory: None,
            child_factories: BTreeMap::new(),
            declared: false,
        }
    }
}

/// Resolution of a parameter type against the index.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    Primitive,
    Known(&'a TypeEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EtorEntry {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Default)]
pub struct MetaIndex {
    classes: Vec<ClassEntry>,
    class_pos: HashMap<String, usize>,
    types: HashMap<String, TypeEntry>,
    type_order: Vec<String>,
    macros: HashSet<String>,
    etors: HashMap<String, String>,
    enums: HashMap<String, Vec<EtorEntry>>,
}

impl MetaIndex {
    pub fn build(doc: &Document) -> Result<Self> {
        let mut idx = MetaIndex::default();
        let all_tags: HashSet<&str> = doc
            .sections
            .iter()
            .flat_map(|s| s.tags.keys().map(String::as_str))
            .collect();

        for section in &doc.sections {
            for obj in &section.objects {
                match obj {
                    Object::Class(c) => {
                        let ctor_params = c
                            .members
                            .iter()
                            .filter(|m| {
                                params::parse_descriptor(&m.desc).is_ok_and(|d| d.is_input())
                            })
                            .map(|m| m.name.clone())
                            .collect();
                        let entry = idx.class_mut(&c.name, DEFAULT_ORDINAL);
                        if !entry.declared {
                            entry.declared = true;
                            entry.base = c.base.clone();
                            entry.singleton = c.is_singleton();
                            entry.ordinal = c.ordinal.unwrap_or(DEFAULT_ORDINAL);
                            entry.ctor_params = ctor_params;
                            for child in &c.children {
                                if !entry.children.contains(child) {
                                    entry.children.push(child.clone());
                                }
                            }
                        }
                    }
                    Object::Handle(h) => {
                        idx.add_type(&h.name, TypeKind::Handle, h.class.clone(), &section.name, h.version)?;
                        if let Some(cls) = &h.class {
                            idx.class_mut(cls, DEFAULT_ORDINAL);
                        }
                    }
                    Object::Enum(e) => {
                        let bitfield = e
                            .etors
                            .iter()
                            .any(|t| t.value.as_deref().is_some_and(values::is_bit));
                        idx.add_type(&e.name, TypeKind::Enum { bitfield }, e.class.clone(), &section.name, e.version)?;
                        for etor in &e.etors {
                            idx.etors.entry(etor.name.clone()).or_insert_with(|| e.name.clone());
                        }
                        idx.enums.entry(e.name.clone()).or_insert_with(|| {
                            e.etors
                                .iter()
                                .map(|t| EtorEntry {
                                    name: t.name.clone(),
                                    value: t.value.clone(),
                                })
                                .collect()
                        });
                    }
                    Object::Struct(s) => {
                        idx.add_type(&s.name, TypeKind::Struct, s.class.clone(), &section.name, s.version)?;
                    }
                    Object::Typedef(t) => {
                        idx.add_type(&t.name, TypeKind::Typedef, t.class.clone(), &section.name, Version::default())?;
                    }
                    Object::Macro(m) => {
                        idx.macros.insert(values::macro_name(&m.name).to_string());
                        idx.macros.insert(m.name.clone());
                    }
                    Object::Function(f) => {
                        // Class-less functions belong to the section's tag class.
                        let cls = f.class.as_deref().unwrap_or(&section.tag);
                        let ordinal = if all_tags.contains(cls) {
                            0
                        } else {
                            DEFAULT_ORDINAL
                        };
                        idx.class_mut(cls, ordinal);
                    }
                    Object::Other => {}
                }
            }
        }

        idx.link_bases();
        idx.precompute_factories();
        // Stable: ties keep first appearance.
        idx.classes.sort_by_key(|c| c.ordinal);
        idx.class_pos = idx
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(idx)
    }

    fn class_mut(&mut self, name: &str, ordinal: u32) -> &mut ClassEntry {
        let pos = match self.class_pos.get(name) {
            Some(&p) => p,
            None => {
                self.classes.push(ClassEntry::new(name, ordinal));
                let p = self.classes.len() - 1;
                self.class_pos.insert(name.to_string(), p);
                p
            }
        };
        &mut self.classes[pos]
    }

    fn add_type(
        &mut self,
        name: &str,
        kind: TypeKind,
        class: Option<String>,
        section: &str,
        version: Version,
    ) -> Result<()> {
        if let Some(existing) = self.types.get(name) {
            if std::mem::discriminant(&existing.kind) != std::mem::discriminant(&kind) {
                return Err(GenError::ambiguous(
                    name,
                    vec![existing.kind.label().to_string(), kind.label().to_string()],
                ));
            }
            return Ok(());
        }
        self.type_order.push(name.to_string());
        self.types.insert(
            name.to_string(),
            TypeEntry {
                kind,
                class,
                section: section.to_string(),
                version,
            },
        );
        Ok(())
    }

    // Every class naming a base is a child of that base.
    fn link_bases(&mut self) {
        let links: Vec<(String, String)> = self
            .classes
            .iter()
            .filter_map(|c| c.base.clone().map(|b| (b, c.name.clone())))
            .collect();
        for (base, child) in links {
            if let Some(&p) = self.class_pos.get(&base) {
                let entry = &mut self.classes[p];
                if !entry.children.contains(&child) {
                    entry.children.push(child);
                }
            }
        }
    }

    fn precompute_factories(&mut self) {
        let singletons: HashSet<String> = self
            .classes
            .iter()
            .filter(|c| c.singleton)
            .map(|c| c.name.clone())
            .collect();
        for entry in &mut self.classes {
            entry.factory = entry.singleton.then(|| entry.name.clone());
            entry.child_factories = entry
                .children
                .iter()
                .map(|child| (child.clone(), singletons.contains(child).then(|| child.clone())))
                .collect();
        }
    }

    // -- Queries --------------------------------------------------------------

    /// Classes in table order (ordinal, then first appearance).
    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.class_pos.get(name).map(|&p| &self.classes[p])
    }

    pub fn type_entry(&self, ty: &str) -> Option<&TypeEntry> {
        self.types.get(&types::base_name(ty))
    }

    /// Owning class of a type, ignoring `const` and pointers.
    pub fn find_class_name(&self, ty: &str) -> Option<&str> {
        self.type_entry(ty).and_then(|e| e.class.as_deref())
    }

    /// A handle type owned by a class.
    pub fn is_class_handle(&self, ty: &str) -> bool {
        types::is_handle(ty)
            && self
                .type_entry(ty)
                .is_some_and(|e| e.kind == TypeKind::Handle && e.class.is_some())
    }

    pub fn is_enum(&self, ty: &str) -> bool {
        self.type_entry(ty)
            .is_some_and(|e| matches!(e.kind, TypeKind::Enum { .. }))
    }

    pub fn is_struct(&self, ty: &str) -> bool {
        self.type_entry(ty).is_some_and(|e| e.kind == TypeKind::Struct)
    }

    pub fn is_macro(&self, value: &str) -> bool {
        self.macros.contains(values::macro_key(value))
    }

    pub fn etors(&self, enum_name: &str) -> &[EtorEntry] {
        self.enums
            .get(&types::base_name(enum_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_bitfield(&self, ty: &str) -> bool {
        self.type_entry(ty)
            .is_some_and(|e| e.kind == TypeKind::Enum { bitfield: true })
    }

    /// Class handles declared in `section` no later than `max`, in
    /// declaration order.
    pub fn class_handles_in<'s>(
        &'s self,
        section: &'s str,
        max: Version,
    ) -> impl Iterator<Item = &'s str> + 's {
        self.type_order.iter().map(String::as_str).filter(move |name| {
            self.types.get(*name).is_some_and(|e| {
                e.kind == TypeKind::Handle
                    && e.class.is_some()
                    && e.section == section
                    && e.version <= max
            })
        })
    }

    /// Enum declaring the given enumerator (array suffixes are ignored).
    pub fn enum_of_etor(&self, value: &str) -> Option<&str> {
        self.etors.get(values::array_name(value)).map(String::as_str)
    }

    /// Resolve a parameter type; anything neither primitive nor indexed is an error.
    pub fn resolve_param_type(&self, ty: &str, object: &str, field: &str) -> Result<Resolved<'_>> {
        let base = types::base_name(ty);
        if PRIMITIVES.contains(&base.as_str()) {
            return Ok(Resolved::Primitive);
        }
        self.types
            .get(&base)
            .map(Resolved::Known)
            .ok_or_else(|| GenError::unresolved("type", base, object, field))
    }

    /// Class whose singleton factory must construct wrappers of
    /// `handle_class` created inside a function of `scope_class`.
    pub fn factory_for(&self, handle_class: &str, scope_class: Option<&str>) -> Option<&str> {
        let entry = self.class(handle_class)?;
        match scope_class.and_then(|s| entry.child_factories.get(s)) {
            Some(child) => child.as_deref(),
            None => entry.factory.as_deref(),
        }
    }

    /// Constructor parameter names of a class.
    pub fn ctor_params(&self, class: &str) -> &[String] {
        self.class(class)
            .map(|c| c.ctor_params.as_slice())
            .unwrap_or_default()
    }

    /// Loader object and factory spellings for a handle type:
    /// `ze_device_handle_t` → (`ze_device_object_t`, `ze_device_factory`).
    pub fn loader_names(c_handle: &str) -> (String, String) {
        let base = names::remove_const_ptr(c_handle);
        let stem = base.strip_suffix("_handle_t").unwrap_or(&base);
        (format!("{}_object_t", stem), format!("{}_factory", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
sections:
  - name: core
    tags: { "$x": "ze" }
    objects:
      - type: class
        name: $xDriver
        attribute: singleton
        ordinal: "1"
        members:
          - { name: handle, type: $x_driver_handle_t, desc: "[in] handle of driver object" }
      - type: class
        name: $xDevice
        ordinal: "2"
        members:
          - { name: handle, type: $x_device_handle_t, desc: "[in] handle of device object" }
          - { name: pDriver, type: $xDriver*, desc: "[in] pointer to owner object" }
          - { name: cache, type: uint32_t, desc: "[out] not a ctor param" }
      - type: class
        name: $xSubDevice
        base: $xDevice
        attribute: singleton
      - type: handle
        name: $x_driver_handle_t
        class: $xDriver
      - type: handle
        name: $x_device_handle_t
        class: $xDevice
      - type: enum
        name: $x_init_flags_t
        etors:
          - { name: $X_INIT_FLAG_GPU_ONLY, value: "$X_BIT(0)" }
      - type: struct
        name: $x_device_properties_t
        class: $xDevice
      - type: macro
        name: $X_MAX_DEVICE_NAME
        value: "256"
      - type: function
        name: Init
        class: $x
"#;

    fn index() -> MetaIndex {
        MetaIndex::build(&Document::parse(SPEC).unwrap()).unwrap()
    }

    #[test]
    fn classes_are_ordered_by_ordinal() {
        let idx = index();
        let order: Vec<&str> = idx.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["$x", "$xDriver", "$xDevice", "$xSubDevice"]);
    }

    #[test]
    fn types_resolve_to_classes() {
        let idx = index();
        assert_eq!(idx.find_class_name("$x_device_handle_t*"), Some("$xDevice"));
        assert_eq!(idx.find_class_name("$x_device_properties_t*"), Some("$xDevice"));
        assert!(idx.is_class_handle("$x_driver_handle_t"));
        assert!(!idx.is_class_handle("$x_device_properties_t"));
        assert!(idx.is_enum("$x_init_flags_t"));
        assert_eq!(idx.enum_of_etor("$X_INIT_FLAG_GPU_ONLY"), Some("$x_init_flags_t"));
        assert!(idx.is_macro("name[$X_MAX_DEVICE_NAME]"));
    }

    #[test]
    fn unresolved_types_are_errors() {
        let idx = index();
        assert_eq!(idx.resolve_param_type("uint32_t*", "f", "p").unwrap(), Resolved::Primitive);
        let err = idx.resolve_param_type("$x_missing_t*", "$xDeviceGet", "pMissing").unwrap_err();
        assert!(err.to_string().contains("pMissing"));
    }

    #[test]
    fn ctor_params_are_input_members() {
        let idx = index();
        assert_eq!(idx.ctor_params("$xDevice"), ["handle", "pDriver"]);
        assert!(idx.ctor_params("$xUnknown").is_empty());
    }

    #[test]
    fn factory_resolution() {
        let idx = index();
        assert_eq!(idx.factory_for("$xDriver", None), Some("$xDriver"));
        assert_eq!(idx.factory_for("$xDevice", Some("$xDriver")), None);
        // Created from a child class: the child's factory wins.
        assert_eq!(idx.factory_for("$xDevice", Some("$xSubDevice")), Some("$xSubDevice"));
    }

    #[test]
    fn conflicting_kinds_are_ambiguous() {
        let spec = r#"
sections:
  - name: core
    tags: { "$x": "ze" }
    objects:
      - { type: struct, name: $x_foo_t }
      - { type: enum, name: $x_foo_t, etors: [] }
"#;
        let err = MetaIndex::build(&Document::parse(spec).unwrap()).unwrap_err();
        assert!(matches!(err, GenError::ClassificationAmbiguity { .. }));
    }

    #[test]
    fn enums_keep_their_etors() {
        let idx = index();
        assert!(idx.is_bitfield("$x_init_flags_t"));
        assert_eq!(idx.etors("$x_init_flags_t")[0].name, "$X_INIT_FLAG_GPU_ONLY");
        assert!(idx.etors("$x_missing_t").is_empty());
        let handles: Vec<&str> = idx.class_handles_in("core", Version::default()).collect();
        assert_eq!(handles, vec!["$x_driver_handle_t", "$x_device_handle_t"]);
    }

    #[test]
    fn newer_handles_are_left_out() {
        let spec = r#"
sections:
  - name: core
    tags: { "$x": "ze" }
    objects:
      - { type: handle, name: $x_device_handle_t, class: $xDevice }
      - { type: handle, name: $x_queue_handle_t, class: $xQueue, version: "1.2" }
"#;
        let idx = MetaIndex::build(&Document::parse(spec).unwrap()).unwrap();
        let at = |v: &str| -> Vec<&str> { idx.class_handles_in("core", v.parse().unwrap()).collect() };
        assert_eq!(at("1.0"), vec!["$x_device_handle_t"]);
        assert_eq!(at("1.2"), vec!["$x_device_handle_t", "$x_queue_handle_t"]);
    }

    #[test]
    fn loader_object_names() {
        let (obj, fty) = MetaIndex::loader_names("ze_device_handle_t*");
        assert_eq!(obj, "ze_device_object_t");
        assert_eq!(fty, "ze_device_factory");
    }
}
