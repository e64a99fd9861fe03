//! Aggregate return shape of a C++ wrapper function.

use super::{Marshal, ParamInfo, Resolver, Scope, Strategy};
use crate::model::Function;
use crate::names;
use crate::traits::types;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnValue {
    /// C++ parameter the value comes from.
    pub name: String,
    /// Type as declared inside the class.
    pub ty: String,
    /// Type as spelled in an out-of-class definition.
    pub qualified_ty: String,
    pub expr: String,
}

/// Required outputs, in declaration order. Optional outputs are never part
/// of the aggregate; callers retrieve them through their out-parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnShape {
    None,
    Single(ReturnValue),
    Tuple(Vec<ReturnValue>),
}

impl ReturnShape {
    pub fn from_values(mut values: Vec<ReturnValue>) -> Self {
        match values.len() {
            0 => ReturnShape::None,
            1 => ReturnShape::Single(values.remove(0)),
            _ => ReturnShape::Tuple(values),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            ReturnShape::None => 0,
            ReturnShape::Single(_) => 1,
            ReturnShape::Tuple(v) => v.len(),
        }
    }

    pub fn values(&self) -> &[ReturnValue] {
        match self {
            ReturnShape::None => &[],
            ReturnShape::Single(v) => std::slice::from_ref(v),
            ReturnShape::Tuple(v) => v,
        }
    }

    fn spell(&self, pick: impl Fn(&ReturnValue) -> &str) -> String {
        match self {
            ReturnShape::None => "void".to_string(),
            ReturnShape::Single(v) => pick(v).to_string(),
            ReturnShape::Tuple(vs) => format!(
                "std::tuple<{}>",
                vs.iter().map(&pick).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// Return type inside the class declaration.
    pub fn decl_type(&self) -> String {
        self.spell(|v| v.ty.as_str())
    }

    /// Return type of the out-of-class definition.
    pub fn def_type(&self) -> String {
        self.spell(|v| v.qualified_ty.as_str())
    }

    /// Expression returned by the wrapper body; empty for `void`.
    pub fn expr(&self) -> String {
        match self {
            ReturnShape::None => String::new(),
            ReturnShape::Single(v) => v.expr.clone(),
            ReturnShape::Tuple(vs) => format!(
                "std::make_tuple( {} )",
                vs.iter().map(|v| v.expr.as_str()).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

impl Resolver<'_> {
    /// Return shape of `f` from its marshalling plan.
    pub fn return_shape(&self, f: &Function, params: &[ParamInfo<'_>], plan: &[Marshal]) -> ReturnShape {
        let scope = Scope::function(f);
        let values = params
            .iter()
            .zip(plan)
            .filter(|(p, _)| p.desc.is_output() && !p.desc.optional)
            .filter_map(|(p, m)| {
                let expr = m.ret_expr.clone()?;
                let ty = &p.param.ty;
                let mut elem = names::remove_const_ptr(&self.cpp_type(&scope, ty, true));
                let mut qualified = elem.clone();
                if let Some(cname) = self.index.find_class_name(ty) {
                    if !types::is_handle(ty) && !elem.contains("::") {
                        qualified = names::add_class(&elem, &self.subst.cpp(cname));
                    }
                }
                let ranged = m.range.is_some() || matches!(m.strategy, Strategy::HandleRange { .. });
                if ranged {
                    elem = format!("std::vector<{}>", elem);
                    qualified = format!("std::vector<{}>", qualified);
                }
                Some(ReturnValue {
                    name: m.name.clone(),
                    ty: elem,
                    qualified_ty: qualified,
                    expr,
                })
            })
            .collect();
        ReturnShape::from_values(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaIndex;
    use crate::model::{Document, Object};
    use crate::subst::Substitutor;

    const SPEC: &str = r#"
sections:
  - name: core
    tags: { "$x": "ze" }
    objects:
      - { type: class, name: $xDevice }
      - { type: handle, name: $x_device_handle_t, class: $xDevice }
      - { type: struct, name: $x_device_properties_t, class: $xDevice }
      - type: function
        name: Zero
        class: $xDevice
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle" }
          - { name: pOptional, type: uint32_t*, desc: "[out][optional] ignored" }
      - type: function
        name: One
        class: $xDevice
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle" }
          - { name: pProperties, type: $x_device_properties_t*, desc: "[out] properties" }
      - type: function
        name: Two
        class: $xDevice
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle" }
          - { name: pCount, type: uint32_t*, desc: "[out] count" }
          - { name: pSkipped, type: uint32_t*, desc: "[out][optional] skipped" }
          - { name: pSize, type: size_t*, desc: "[out] size" }
      - type: function
        name: Three
        class: $xDevice
        params:
          - { name: hDevice, type: $x_device_handle_t, desc: "[in] handle" }
          - { name: pA, type: uint32_t*, desc: "[out] a" }
          - { name: pB, type: uint64_t*, desc: "[out] b" }
          - { name: phSub, type: $x_device_handle_t*, desc: "[out] sub-device" }
"#;

    fn shape(name: &str) -> ReturnShape {
        let doc = Document::parse(SPEC).unwrap();
        let index = MetaIndex::build(&doc).unwrap();
        let subst = Substitutor::new("ze", &doc.sections[0].tags).unwrap();
        let r = Resolver::new(&subst, &index);
        let f = doc.sections[0]
            .objects
            .iter()
            .find_map(|o| match o {
                Object::Function(f) if f.name == name => Some(f),
                _ => None,
            })
            .unwrap();
        let params = r.params(f).unwrap();
        let plan = r.marshal(f, &params).unwrap();
        r.return_shape(f, &params, &plan)
    }

    #[test]
    fn arity_matches_required_outputs() {
        for (name, k) in [("Zero", 0), ("One", 1), ("Two", 2), ("Three", 3)] {
            assert_eq!(shape(name).arity(), k, "{}", name);
        }
    }

    #[test]
    fn none_is_void() {
        let s = shape("Zero");
        assert_eq!(s, ReturnShape::None);
        assert_eq!(s.decl_type(), "void");
        assert_eq!(s.expr(), "");
    }

    #[test]
    fn single_is_the_value() {
        let s = shape("One");
        assert_eq!(s.decl_type(), "properties_t");
        assert_eq!(s.def_type(), "Device::properties_t");
        assert_eq!(s.expr(), "*reinterpret_cast<properties_t*>( &properties )");
    }

    #[test]
    fn tuples_keep_declaration_order() {
        let s = shape("Two");
        assert_eq!(s.decl_type(), "std::tuple<uint32_t, size_t>");
        assert_eq!(s.expr(), "std::make_tuple( count, size )");

        let s = shape("Three");
        assert_eq!(s.decl_type(), "std::tuple<uint32_t, uint64_t, Device*>");
        let names: Vec<&str> = s.values().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["pA", "pB", "pSub"]);
    }
}
