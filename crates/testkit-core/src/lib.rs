//! Core types for dialect test comparisons
//!
//! This crate provides the value model the comparator walks: a tagged
//! [`Value`] tree produced from arbitrary Rust values through the
//! [`ToValue`] trait, the [`ValuePath`] used to locate a node inside that
//! tree, and driver-style nullable wrappers that expose their storage value
//! through [`Valuer`].

mod nullable;
mod path;
mod to_value;
mod value;

pub use nullable::{NullBool, NullFloat64, NullInt64, NullString, NullTime, Valuer};
pub use path::{Segment, ValuePath};
pub use to_value::{short_type_name, Bytes, ToValue};
pub use value::{Field, Record, Sequence, Shape, Stored, Value};

/// Rendering used for an absent value
pub const NIL: &str = "<nil>";

/// Rendering used for a nullable wrapper that holds no value
pub const NULL: &str = "<null>";
