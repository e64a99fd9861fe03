//! Marshalling of C++ wrapper arguments into the C call.

use super::{ParamInfo, Resolver, Scope};
use crate::error::Result;
use crate::model::Function;
use crate::names;
use crate::traits::{types, Range};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    /// `reinterpret_cast<T>( x )`
    Reinterpret,
    /// `*reinterpret_cast<T*>( &x )`, for records and IPC handles.
    ReinterpretDeref,
    /// `static_cast<T>( x )`, for enums and flags.
    Static,
}

/// Wrapper construction for a handle returned by the C call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ctor {
    pub params: Vec<String>,
    /// Singleton factory consulted instead of `new`, e.g. `g_DriverFactory`.
    pub factory: Option<String>,
}

/// Local variable receiving an output before it is converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Local {
    pub name: String,
    pub ctype: String,
    pub cpptype: String,
}

/// How one parameter crosses from the C++ wrapper into the C call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Input class handle, read through `getHandle()`; `self_ref` uses the
    /// receiver's own handle.
    UnwrapHandle { self_ref: bool },
    /// Output class handle; a wrapper is constructed after the call.
    WrapHandle { ctor: Ctor },
    /// Range of class handles staged in a vector; converted on the way in
    /// (`input`), on the way out (`output`), or both for `[in,out]`.
    HandleRange {
        range: Range,
        input: bool,
        output: Option<Ctor>,
    },
    /// The C and C++ spellings differ and the value is cast.
    Cast { cast: CastKind },
    PassThrough,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::UnwrapHandle { .. } => "unwrap_handle",
            Strategy::WrapHandle { .. } => "wrap_handle",
            Strategy::HandleRange { .. } => "handle_range",
            Strategy::Cast { .. } => "cast",
            Strategy::PassThrough => "pass_through",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marshal {
    /// C++ parameter name.
    pub name: String,
    /// Expression passed to the C function.
    pub arg: String,
    pub local: Option<Local>,
    /// Range of a staged non-handle output.
    pub range: Option<Range>,
    pub optional: bool,
    pub release: bool,
    /// C++ class of a wrapped or released handle.
    pub class: Option<String>,
    pub strategy: Strategy,
    /// Value contributed to the aggregate return, for outputs.
    pub ret_expr: Option<String>,
}

impl Marshal {
    fn pass(name: String, arg: String, strategy: Strategy) -> Self {
        Marshal {
            name,
            arg,
            local: None,
            range: None,
            optional: false,
            release: false,
            class: None,
            strategy,
            ret_expr: None,
        }
    }
}

impl Resolver<'_> {
    /// Marshalling plan for every parameter of `f`, in declaration order.
    pub fn marshal(&self, f: &Function, params: &[ParamInfo<'_>]) -> Result<Vec<Marshal>> {
        let scope = Scope::function(f);
        let free = self.is_free(f);
        let cpp_names: Vec<String> = params.iter().map(|p| self.cpp_param_name(p)).collect();
        let mut self_refs = 0;
        let mut out = Vec::with_capacity(params.len());

        for (p, cpp_name) in params.iter().zip(&cpp_names) {
            let ty = &p.param.ty;
            let c_t = self.c_type(ty);
            let cpp_t = self.cpp_type(&scope, ty, false);
            let cpp_c = self.cpp_type(&scope, ty, true);
            let local_name = names::local_name(&self.c_param_name(p));
            let local = || Local {
                name: local_name.clone(),
                ctype: names::remove_const_ptr(&c_t),
                cpptype: names::remove_const_ptr(&cpp_t),
            };
            let class_handle = self.index.is_class_handle(ty);
            let d = &p.desc;

            if class_handle && (d.is_output() || d.is_inoutput()) {
                d.require_range(&format!("{} (param `{}`)", f.identity(), p.param.name))?;
            }

            let m = if let Some(range) = d.range.clone() {
                if class_handle {
                    let output = if d.is_output() || d.is_inoutput() {
                        Some(self.ctor(f, p, &cpp_names, free)?)
                    } else {
                        None
                    };
                    let input = !d.is_output();
                    let returned = d.is_output() && !d.optional;
                    Marshal {
                        name: cpp_name.clone(),
                        arg: format!("{}.data()", local_name),
                        local: Some(local()),
                        range: None,
                        optional: d.optional,
                        release: false,
                        class: output.as_ref().map(|_| names::remove_all_ptr(&cpp_c)),
                        strategy: Strategy::HandleRange { range, input, output },
                        ret_expr: returned.then(|| cpp_name.clone()),
                    }
                } else if d.is_output() {
                    Marshal {
                        name: cpp_name.clone(),
                        arg: format!("{}.data()", local_name),
                        local: Some(local()),
                        range: Some(range),
                        optional: d.optional,
                        release: false,
                        class: None,
                        strategy: Strategy::PassThrough,
                        ret_expr: (!d.optional).then(|| local_name.clone()),
                    }
                } else if c_t != cpp_t {
                    Marshal::pass(
                        cpp_name.clone(),
                        format!("reinterpret_cast<{}>( {} )", c_t, cpp_name),
                        Strategy::Cast { cast: CastKind::Reinterpret },
                    )
                } else {
                    Marshal::pass(cpp_name.clone(), cpp_name.clone(), Strategy::PassThrough)
                }
            } else if class_handle {
                let is_this = self.index.find_class_name(ty) == f.class.as_deref();
                if d.is_output() {
                    let ctor = self.ctor(f, p, &cpp_names, free)?;
                    let arg = if d.optional {
                        format!("( {} ) ? &{} : nullptr", cpp_name, local_name)
                    } else {
                        format!("&{}", local_name)
                    };
                    Marshal {
                        name: cpp_name.clone(),
                        arg,
                        local: Some(local()),
                        range: None,
                        optional: d.optional,
                        release: false,
                        class: Some(names::remove_all_ptr(&cpp_c)),
                        strategy: Strategy::WrapHandle { ctor },
                        ret_expr: (!d.optional).then(|| cpp_name.clone()),
                    }
                } else if d.optional {
                    let mut m = Marshal::pass(
                        cpp_name.clone(),
                        format!(
                            "( {n} ) ? reinterpret_cast<{t}>( {n}->getHandle() ) : nullptr",
                            n = cpp_name,
                            t = c_t
                        ),
                        Strategy::UnwrapHandle { self_ref: false },
                    );
                    m.optional = true;
                    m
                } else if !free && is_this && self_refs == 0 {
                    self_refs += 1;
                    Marshal::pass(
                        cpp_name.clone(),
                        format!("reinterpret_cast<{}>( getHandle() )", c_t),
                        Strategy::UnwrapHandle { self_ref: true },
                    )
                } else {
                    if !free && is_this {
                        self_refs += 1;
                    }
                    let mut m = Marshal::pass(
                        cpp_name.clone(),
                        format!("reinterpret_cast<{}>( {}->getHandle() )", c_t, cpp_name),
                        Strategy::UnwrapHandle { self_ref: false },
                    );
                    if d.release {
                        m.release = true;
                        m.class = Some(names::remove_all_ptr(&cpp_c));
                    }
                    m
                }
            } else if d.is_output() {
                let cpp_rcp = names::remove_const_ptr(&cpp_t);
                let (strategy, ret) = if c_t != cpp_t {
                    let pointer_like = types::is_pointer(names::remove_ptr(ty))
                        || (types::is_handle(ty) && !types::is_ipc_handle(ty));
                    if pointer_like {
                        (
                            CastKind::Reinterpret,
                            format!("reinterpret_cast<{}>( {} )", cpp_rcp, local_name),
                        )
                    } else {
                        (
                            CastKind::ReinterpretDeref,
                            format!("*reinterpret_cast<{}*>( &{} )", cpp_rcp, local_name),
                        )
                    }
                } else {
                    (CastKind::Reinterpret, local_name.clone())
                };
                Marshal {
                    name: cpp_name.clone(),
                    arg: format!("&{}", local_name),
                    local: Some(local()),
                    range: None,
                    optional: d.optional,
                    release: false,
                    class: None,
                    strategy: if c_t != cpp_t {
                        Strategy::Cast { cast: strategy }
                    } else {
                        Strategy::PassThrough
                    },
                    ret_expr: (!d.optional).then_some(ret),
                }
            } else if c_t != cpp_t {
                let cast = if types::is_ipc_handle(ty) || (self.index.is_struct(ty) && !types::is_pointer(ty)) {
                    CastKind::ReinterpretDeref
                } else if types::is_pointer(ty) || types::is_handle(ty) {
                    CastKind::Reinterpret
                } else {
                    CastKind::Static
                };
                let arg = match cast {
                    CastKind::ReinterpretDeref => format!("*reinterpret_cast<{}*>( &{} )", c_t, cpp_name),
                    CastKind::Reinterpret => format!("reinterpret_cast<{}>( {} )", c_t, cpp_name),
                    CastKind::Static => format!("static_cast<{}>( {} )", c_t, cpp_name),
                };
                Marshal::pass(cpp_name.clone(), arg, Strategy::Cast { cast })
            } else {
                Marshal::pass(cpp_name.clone(), cpp_name.clone(), Strategy::PassThrough)
            };
            out.push(m);
        }
        Ok(out)
    }

    /// Constructor call for the wrapper of an output handle parameter.
    fn ctor(&self, f: &Function, p: &ParamInfo<'_>, cpp_names: &[String], free: bool) -> Result<Ctor> {
        let ty = &p.param.ty;
        let Some(class) = self.index.find_class_name(ty) else {
            return Ok(Ctor {
                params: Vec::new(),
                factory: None,
            });
        };
        let scope = Scope::function(f);
        let local = names::local_name(&self.c_param_name(p));
        let raw = names::remove_const_ptr(&self.cpp_type(&scope, ty, false));

        let params = self
            .index
            .ctor_params(class)
            .iter()
            .map(|name| {
                if name == "handle" {
                    if p.desc.range.is_some() {
                        format!("reinterpret_cast<{}>( {}[ i ] )", raw, local)
                    } else {
                        format!("reinterpret_cast<{}>( {} )", raw, local)
                    }
                } else if let Some(pos) = cpp_names.iter().position(|n| n == name) {
                    if !free && pos == 0 {
                        "this".to_string()
                    } else {
                        name.clone()
                    }
                } else if !free {
                    format!("m_{}", name)
                } else {
                    "nullptr".to_string()
                }
            })
            .collect();

        let factory = self
            .index
            .factory_for(class, f.class.as_deref())
            .map(|c| format!("g_{}Factory", self.subst.cpp(c)));

        Ok(Ctor { params, factory })
    }
}
