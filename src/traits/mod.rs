//! Trait classifiers: pure pattern matches over type names, value
//! expressions, parameter descriptors and objects.
//!
//! A classifier that does not match answers "no"; whether that is fatal is
//! up to the caller.

pub mod objects;
pub mod params;
pub mod types;
pub mod values;

pub use params::{Direction, ParamDescriptor, Range};
pub use types::TypeCategory;
pub use values::ValueKind;
