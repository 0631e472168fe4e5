//! Filter model and its wire encoder.
//!
//! Callers build [`Filter`], [`UpdateFields`] and [`ReadFields`] values; the `encode_*`
//! functions turn them into the canonical JSON strings sent with each request.

mod encode;
mod parse;
mod types;
mod value;

pub use encode::{
    encode_filter, encode_logical_filter, encode_read_fields, encode_selector,
    encode_update_fields,
};
pub(crate) use encode::flatten;
pub use parse::{filter_from_value, parse_filter_json, parse_read_fields_json, parse_update_json};
pub use types::{
    Filter, LogicalChildren, LogicalFilter, LogicalOp, ReadFields, Selector, SelectorOp,
    UpdateFields,
};
pub use value::{BigInteger, FieldMap, FieldValue};
