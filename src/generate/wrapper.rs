//! C++ wrapper body lines rendered from a marshalling plan: local staging
//! before the C call and wrapper construction after it.

use crate::resolve::{Ctor, Marshal, Strategy};

fn construct(class: &str, ctor: &Ctor) -> String {
    let args = ctor.params.join(", ");
    match &ctor.factory {
        Some(factory) => format!("{}.getInstance( {} )", factory, args),
        None => format!("new {}( {} )", class, args),
    }
}

/// Declarations of the locals the C call writes to or reads from.
pub fn locals(plan: &[Marshal]) -> Vec<String> {
    let mut lines = Vec::new();
    for m in plan {
        let Some(local) = &m.local else { continue };
        match &m.strategy {
            Strategy::HandleRange { range, input, .. } => {
                lines.push(format!("std::vector<{}> {};", local.ctype, local.name));
                if *input {
                    lines.push(format!("{}.reserve( {} );", local.name, range.end));
                    lines.push(format!(
                        "for( size_t i = {}; ( nullptr != {} ) && ( i < {} ); ++i )",
                        range.start, m.name, range.end
                    ));
                    lines.push(format!(
                        "    {}.emplace_back( reinterpret_cast<{}>( {}[ i ]->getHandle() ) );",
                        local.name, local.ctype, m.name
                    ));
                } else {
                    lines.push(format!("{}.resize( {} );", local.name, range.end));
                }
            }
            _ => match &m.range {
                Some(range) => lines.push(format!(
                    "std::vector<{}> {}( {} );",
                    local.ctype, local.name, range.end
                )),
                None => lines.push(format!("{} {};", local.ctype, local.name)),
            },
        }
    }
    lines
}

/// Wrapper construction and release after a successful call.
///
/// Optional outputs are constructed only inside their null-pointer guard,
/// so a singleton factory is never consulted for a null output.
pub fn conversions(plan: &[Marshal]) -> Vec<String> {
    let mut lines = Vec::new();
    for m in plan {
        let class = m.class.as_deref().unwrap_or_default();
        match &m.strategy {
            Strategy::WrapHandle { ctor } => {
                let make = construct(class, ctor);
                if m.optional {
                    lines.push(format!("if( {} )", m.name));
                    lines.push(format!("    *{} = {};", m.name, make));
                } else {
                    lines.push(format!("auto {} = {};", m.name, make));
                }
            }
            Strategy::HandleRange {
                range,
                output: Some(ctor),
                ..
            } => {
                let make = construct(class, ctor);
                if m.ret_expr.is_some() {
                    lines.push(format!("std::vector<{}*> {};", class, m.name));
                    lines.push(format!("{}.reserve( {} );", m.name, range.end));
                    lines.push(format!(
                        "for( size_t i = {}; i < {}; ++i )",
                        range.start, range.end
                    ));
                    lines.push(format!("    {}.emplace_back( {} );", m.name, make));
                } else {
                    lines.push(format!(
                        "for( size_t i = {}; ( nullptr != {} ) && ( i < {} ); ++i )",
                        range.start, m.name, range.end
                    ));
                    lines.push(format!("    {}[ i ] = {};", m.name, make));
                }
            }
            _ if m.release => lines.push(format!("delete {};", m.name)),
            _ => {}
        }
    }
    lines
}

/// Arguments of the C call, in declaration order.
pub fn args(plan: &[Marshal]) -> String {
    plan.iter().map(|m| m.arg.as_str()).collect::<Vec<_>>().join(", ")
}
