//! Canonical wire encoding for filters, projections and updates.
//!
//! Output is built by hand rather than through a `serde_json::Value` so that key order
//! follows the caller's field maps and integers never pass through `f64`.

use super::types::{
    Filter, LogicalChildren, LogicalFilter, MAX_LOGICAL_DEPTH, MAX_PATH_DEPTH, ReadFields,
    Selector, UpdateFields,
};
use super::value::{FieldMap, FieldValue};
use crate::errors::DbError;
use chrono::SecondsFormat;
use std::collections::HashSet;
use std::fmt::Write as _;

/// # Errors
/// Fails when the selector or any nested logical filter is empty, nests too deep, or holds
/// a value with no wire form.
pub fn encode_filter(filter: &Filter) -> Result<String, DbError> {
    match filter {
        Filter::Selector(s) => encode_selector(s),
        Filter::Logical(l) => encode_logical_filter(l),
    }
}

/// Encodes `{"k1":v1,...}` in field-map order, flattening nested objects into dotted paths.
///
/// # Errors
/// `FilterEncoding` for an empty selector, an empty nested object or a repeated path;
/// `ValueEncoding` for non-finite floats and array values.
pub fn encode_selector(selector: &Selector) -> Result<String, DbError> {
    if selector.fields.is_empty() {
        return Err(DbError::FilterEncoding("selector has no fields".into()));
    }
    let leaves = flatten(&selector.fields)?;
    let mut out = String::with_capacity(16 * leaves.len());
    out.push('{');
    for (i, (path, value)) in leaves.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_key(&mut out, path)?;
        match selector.op.keyword() {
            None => push_value(&mut out, path, value, Mode::Selector, 0)?,
            Some(kw) => {
                out.push('{');
                push_key(&mut out, kw)?;
                push_value(&mut out, path, value, Mode::Selector, 0)?;
                out.push('}');
            }
        }
    }
    out.push('}');
    Ok(out)
}

/// Encodes `{"$and":[...]}` / `{"$or":[...]}`, recursing through nested logical filters.
///
/// # Errors
/// `FilterEncoding` when any level has no children or nesting exceeds the depth limit.
pub fn encode_logical_filter(filter: &LogicalFilter) -> Result<String, DbError> {
    let mut out = String::new();
    push_logical(&mut out, filter, 1)?;
    Ok(out)
}

fn push_logical(out: &mut String, filter: &LogicalFilter, depth: usize) -> Result<(), DbError> {
    if depth > MAX_LOGICAL_DEPTH {
        return Err(DbError::FilterEncoding(format!(
            "logical filters nest deeper than {MAX_LOGICAL_DEPTH} levels"
        )));
    }
    let kw = filter.op.keyword();
    if filter.children.is_empty() {
        return Err(DbError::FilterEncoding(format!("{kw} filter has no children")));
    }
    out.push('{');
    push_key(out, kw)?;
    out.push('[');
    match &filter.children {
        LogicalChildren::Selectors(selectors) => {
            for (i, s) in selectors.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_selector(s)?);
            }
        }
        LogicalChildren::Logical(children) => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_logical(out, child, depth + 1)?;
            }
        }
    }
    out.push_str("]}");
    Ok(())
}

/// Encodes `{"$set":{...},"$unset":[...],"$increment":{...},...}` with only the
/// non-empty groups present.
///
/// # Errors
/// `FilterEncoding` when every group is empty; `ValueEncoding` when an arithmetic group
/// holds a non-numeric value.
pub fn encode_update_fields(update: &UpdateFields) -> Result<String, DbError> {
    if update.is_empty() {
        return Err(DbError::FilterEncoding("update has no fields".into()));
    }
    let mut out = String::from("{");
    let mut first = true;
    if !update.set.is_empty() {
        open_group(&mut out, &mut first, "$set")?;
        push_update_map(&mut out, "$set", &update.set, false)?;
    }
    if !update.unset.is_empty() {
        open_group(&mut out, &mut first, "$unset")?;
        out.push('[');
        for (i, path) in update.unset.iter().enumerate() {
            if path.is_empty() {
                return Err(DbError::FilterEncoding("$unset names an empty field".into()));
            }
            if i > 0 {
                out.push(',');
            }
            push_json_string(&mut out, path)?;
        }
        out.push(']');
    }
    let arithmetic = [
        ("$increment", &update.increment),
        ("$decrement", &update.decrement),
        ("$multiply", &update.multiply),
        ("$divide", &update.divide),
    ];
    for (kw, map) in arithmetic {
        if !map.is_empty() {
            open_group(&mut out, &mut first, kw)?;
            push_update_map(&mut out, kw, map, true)?;
        }
    }
    out.push('}');
    Ok(out)
}

/// Encodes a projection as `{"a":true,...}` (include) or `{"a":false,...}` (exclude).
///
/// # Errors
/// `FilterEncoding` for empty lists, mixed include/exclude lists and empty names.
pub fn encode_read_fields(fields: &ReadFields) -> Result<String, DbError> {
    let (names, flag) = match (fields.include.is_empty(), fields.exclude.is_empty()) {
        (false, true) => (&fields.include, "true"),
        (true, false) => (&fields.exclude, "false"),
        (false, false) => {
            return Err(DbError::FilterEncoding(
                "read fields mix include and exclude lists".into(),
            ));
        }
        (true, true) => return Err(DbError::FilterEncoding("read fields list is empty".into())),
    };
    let mut seen = HashSet::with_capacity(names.len());
    let mut out = String::from("{");
    for name in names {
        if name.is_empty() {
            return Err(DbError::FilterEncoding("read fields name an empty field".into()));
        }
        if !seen.insert(name.as_str()) {
            continue;
        }
        if seen.len() > 1 {
            out.push(',');
        }
        push_key(&mut out, name)?;
        out.push_str(flag);
    }
    out.push('}');
    Ok(out)
}

impl Filter {
    /// Dotted field paths this filter puts on the wire, in encounter order.
    ///
    /// # Errors
    /// Same structural failures as flattening during encoding.
    pub fn field_paths(&self) -> Result<Vec<String>, DbError> {
        let mut out = Vec::new();
        match self {
            Self::Selector(s) => selector_paths(s, &mut out)?,
            Self::Logical(l) => logical_paths(l, &mut out, 1)?,
        }
        Ok(out)
    }
}

impl UpdateFields {
    /// Dotted field paths touched by this update, grouped by operator.
    ///
    /// # Errors
    /// Same structural failures as flattening during encoding.
    pub fn field_paths(&self) -> Result<Vec<String>, DbError> {
        let mut out = Vec::new();
        for map in [&self.set, &self.increment, &self.decrement, &self.multiply, &self.divide] {
            out.extend(flatten(map)?.into_iter().map(|(p, _)| p));
        }
        out.extend(self.unset.iter().cloned());
        Ok(out)
    }
}

fn selector_paths(s: &Selector, out: &mut Vec<String>) -> Result<(), DbError> {
    out.extend(flatten(&s.fields)?.into_iter().map(|(p, _)| p));
    Ok(())
}

fn logical_paths(l: &LogicalFilter, out: &mut Vec<String>, depth: usize) -> Result<(), DbError> {
    if depth > MAX_LOGICAL_DEPTH {
        return Err(DbError::FilterEncoding(format!(
            "logical filters nest deeper than {MAX_LOGICAL_DEPTH} levels"
        )));
    }
    match &l.children {
        LogicalChildren::Selectors(selectors) => {
            for s in selectors {
                selector_paths(s, out)?;
            }
        }
        LogicalChildren::Logical(children) => {
            for c in children {
                logical_paths(c, out, depth + 1)?;
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Selector,
    Update,
}

/// Leaf `(dotted path, value)` pairs of a field map, depth-first in declaration order.
pub(crate) fn flatten(fields: &FieldMap) -> Result<Vec<(String, &FieldValue)>, DbError> {
    let mut out = Vec::with_capacity(fields.len());
    let mut seen = HashSet::new();
    flatten_into(None, fields, 1, &mut out, &mut seen)?;
    Ok(out)
}

fn flatten_into<'a>(
    prefix: Option<&str>,
    fields: &'a FieldMap,
    depth: usize,
    out: &mut Vec<(String, &'a FieldValue)>,
    seen: &mut HashSet<String>,
) -> Result<(), DbError> {
    if depth > MAX_PATH_DEPTH {
        return Err(DbError::FilterEncoding(format!(
            "field `{}` nests deeper than {MAX_PATH_DEPTH} levels",
            prefix.unwrap_or_default()
        )));
    }
    for (key, value) in fields.iter() {
        if key.is_empty() {
            return Err(DbError::FilterEncoding("empty field name".into()));
        }
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.to_string(),
        };
        match value {
            FieldValue::Object(inner) if inner.is_empty() => {
                return Err(DbError::FilterEncoding(format!("field `{path}` is an empty object")));
            }
            FieldValue::Object(inner) => flatten_into(Some(&path), inner, depth + 1, out, seen)?,
            leaf => {
                if !seen.insert(path.clone()) {
                    return Err(DbError::FilterEncoding(format!(
                        "field `{path}` appears more than once"
                    )));
                }
                out.push((path, leaf));
            }
        }
    }
    Ok(())
}

fn open_group(out: &mut String, first: &mut bool, kw: &str) -> Result<(), DbError> {
    if !*first {
        out.push(',');
    }
    *first = false;
    push_key(out, kw)
}

fn push_update_map(
    out: &mut String,
    kw: &str,
    map: &FieldMap,
    numeric_only: bool,
) -> Result<(), DbError> {
    out.push('{');
    for (i, (path, value)) in flatten(map)?.iter().enumerate() {
        if numeric_only && !value.is_numeric() {
            return Err(DbError::ValueEncoding(format!(
                "field `{path}`: {kw} requires a number, got {}",
                value.kind()
            )));
        }
        if i > 0 {
            out.push(',');
        }
        push_key(out, path)?;
        push_value(out, path, value, Mode::Update, 0)?;
    }
    out.push('}');
    Ok(())
}

fn push_key(out: &mut String, key: &str) -> Result<(), DbError> {
    push_json_string(out, key)?;
    out.push(':');
    Ok(())
}

fn push_json_string(out: &mut String, s: &str) -> Result<(), DbError> {
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

fn push_value(
    out: &mut String,
    path: &str,
    value: &FieldValue,
    mode: Mode,
    depth: usize,
) -> Result<(), DbError> {
    if depth > MAX_PATH_DEPTH {
        return Err(DbError::FilterEncoding(format!(
            "value of `{path}` nests deeper than {MAX_PATH_DEPTH} levels"
        )));
    }
    match value {
        FieldValue::Null => out.push_str("null"),
        FieldValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        FieldValue::Int(i) => {
            let _ = write!(out, "{i}");
        }
        FieldValue::UInt(u) => {
            let _ = write!(out, "{u}");
        }
        FieldValue::BigInt(b) => out.push_str(b.as_str()),
        FieldValue::Float(f) => {
            let n = serde_json::Number::from_f64(*f).ok_or_else(|| {
                DbError::ValueEncoding(format!("field `{path}`: {f} has no JSON form"))
            })?;
            let _ = write!(out, "{n}");
        }
        FieldValue::String(s) => push_json_string(out, s)?,
        FieldValue::DateTime(dt) => {
            push_json_string(out, &dt.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        }
        FieldValue::Uuid(u) => push_json_string(out, &u.hyphenated().to_string())?,
        FieldValue::Array(_) if mode == Mode::Selector => {
            return Err(DbError::ValueEncoding(format!(
                "field `{path}`: array values are not supported in selectors"
            )));
        }
        FieldValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_value(out, path, item, mode, depth + 1)?;
            }
            out.push(']');
        }
        // Only reachable inside arrays; mapped fields are flattened before this point.
        FieldValue::Object(map) => {
            out.push('{');
            for (i, (key, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_key(out, key)?;
                push_value(out, path, v, mode, depth + 1)?;
            }
            out.push('}');
        }
    }
    Ok(())
}
