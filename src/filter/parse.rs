use crate::errors::DbError;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{
    Filter, LogicalChildren, LogicalFilter, LogicalOp, ReadFields, Selector, SelectorOp,
    UpdateFields,
};
use super::value::FieldMap;

// JSON front end: the one place where filter shapes are probed rather than matched.

/// Parses the JSON form of a filter.
///
/// Accepted shapes: `{"op":"eq","fields":{...}}` (op optional, any comparison op) and
/// `{"op":"and"|"or","selectorFilters":[...]}` or `{"op":..,"logicalFilters":[...]}`.
///
/// # Errors
/// `Json` for malformed JSON, `UnsupportedFilter` for unknown shapes or operators,
/// `FilterEncoding` for a logical filter carrying both child lists.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    let v: Value = serde_json::from_str(json)?;
    filter_from_value(v)
}

/// # Errors
/// See [`parse_filter_json`].
pub fn filter_from_value(v: Value) -> Result<Filter, DbError> {
    let mut obj = match v {
        Value::Object(obj) => obj,
        other => {
            return Err(DbError::UnsupportedFilter(format!(
                "expected an object, got {}",
                json_kind(&other)
            )));
        }
    };
    let has_children = obj.contains_key("selectorFilters") || obj.contains_key("logicalFilters");
    match (obj.contains_key("fields"), has_children) {
        (true, false) => Ok(Filter::Selector(selector_from_object(obj)?)),
        (false, true) => Ok(Filter::Logical(logical_from_object(&mut obj, 1)?)),
        (true, true) => Err(DbError::UnsupportedFilter(
            "object carries both `fields` and child filters".into(),
        )),
        (false, false) => Err(DbError::UnsupportedFilter(format!(
            "no `fields`, `selectorFilters` or `logicalFilters` among keys [{}]",
            obj.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
        ))),
    }
}

fn selector_from_object(mut obj: Map<String, Value>) -> Result<Selector, DbError> {
    let op = match obj.remove("op") {
        None => SelectorOp::Eq,
        Some(Value::String(s)) => selector_op(&s)?,
        Some(other) => {
            return Err(DbError::UnsupportedFilter(format!(
                "selector op must be a string, got {}",
                json_kind(&other)
            )));
        }
    };
    let fields = match obj.remove("fields") {
        Some(Value::Object(f)) => FieldMap::try_from(f)?,
        Some(other) => {
            return Err(DbError::UnsupportedFilter(format!(
                "selector fields must be an object, got {}",
                json_kind(&other)
            )));
        }
        None => FieldMap::new(),
    };
    reject_extra_keys(&obj, "selector")?;
    Ok(Selector { op, fields })
}

fn logical_from_object(
    obj: &mut Map<String, Value>,
    depth: usize,
) -> Result<LogicalFilter, DbError> {
    if depth > super::types::MAX_LOGICAL_DEPTH {
        return Err(DbError::FilterEncoding("logical filters nest too deep".into()));
    }
    let op = match obj.remove("op") {
        Some(Value::String(s)) => logical_op(&s)?,
        Some(other) => {
            return Err(DbError::UnsupportedFilter(format!(
                "logical op must be a string, got {}",
                json_kind(&other)
            )));
        }
        None => return Err(DbError::UnsupportedFilter("logical filter has no `op`".into())),
    };
    let selectors = take_array(obj, "selectorFilters")?.unwrap_or_default();
    let logical = take_array(obj, "logicalFilters")?.unwrap_or_default();
    reject_extra_keys(obj, "logical filter")?;
    let children = match (selectors.is_empty(), logical.is_empty()) {
        (false, false) => {
            return Err(DbError::FilterEncoding(
                "logical filter mixes selectorFilters and logicalFilters".into(),
            ));
        }
        (true, false) => {
            let mut out = Vec::with_capacity(logical.len());
            for item in logical {
                match item {
                    Value::Object(mut o) => out.push(logical_from_object(&mut o, depth + 1)?),
                    other => {
                        return Err(DbError::UnsupportedFilter(format!(
                            "logicalFilters entries must be objects, got {}",
                            json_kind(&other)
                        )));
                    }
                }
            }
            LogicalChildren::Logical(out)
        }
        // An empty child list parses; the encoder rejects it.
        (false, true) | (true, true) => {
            let mut out = Vec::with_capacity(selectors.len());
            for item in selectors {
                match item {
                    Value::Object(o) => out.push(selector_from_object(o)?),
                    other => {
                        return Err(DbError::UnsupportedFilter(format!(
                            "selectorFilters entries must be objects, got {}",
                            json_kind(&other)
                        )));
                    }
                }
            }
            LogicalChildren::Selectors(out)
        }
    };
    Ok(LogicalFilter { op, children })
}

fn take_array(obj: &mut Map<String, Value>, key: &str) -> Result<Option<Vec<Value>>, DbError> {
    match obj.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(DbError::UnsupportedFilter(format!(
            "`{key}` must be an array, got {}",
            json_kind(&other)
        ))),
    }
}

fn reject_extra_keys(obj: &Map<String, Value>, what: &str) -> Result<(), DbError> {
    match obj.keys().next() {
        Some(k) => Err(DbError::UnsupportedFilter(format!("unknown {what} key `{k}`"))),
        None => Ok(()),
    }
}

fn selector_op(s: &str) -> Result<SelectorOp, DbError> {
    Ok(match s.trim_start_matches('$').to_ascii_lowercase().as_str() {
        "eq" => SelectorOp::Eq,
        "gt" => SelectorOp::Gt,
        "gte" => SelectorOp::Gte,
        "lt" => SelectorOp::Lt,
        "lte" => SelectorOp::Lte,
        _ => return Err(DbError::UnsupportedFilter(format!("unknown selector op `{s}`"))),
    })
}

fn logical_op(s: &str) -> Result<LogicalOp, DbError> {
    Ok(match s.trim_start_matches('$').to_ascii_lowercase().as_str() {
        "and" => LogicalOp::And,
        "or" => LogicalOp::Or,
        _ => return Err(DbError::UnsupportedFilter(format!("unknown logical op `{s}`"))),
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses `{"$set":{...},"$unset":[...],"$increment":{...},...}`.
///
/// # Errors
/// `Json` for malformed JSON, `UnsupportedFilter` for unknown operators or shapes.
pub fn parse_update_json(json: &str) -> Result<UpdateFields, DbError> {
    let v: Value = serde_json::from_str(json)?;
    let Value::Object(obj) = v else {
        return Err(DbError::UnsupportedFilter("update must be an object".into()));
    };
    let mut out = UpdateFields::default();
    for (k, v) in obj {
        if k == "$unset" {
            let Value::Array(items) = v else {
                return Err(DbError::UnsupportedFilter(
                    "$unset takes an array of field names".into(),
                ));
            };
            for item in items {
                match item {
                    Value::String(s) => out.unset.push(s),
                    other => {
                        return Err(DbError::UnsupportedFilter(format!(
                            "$unset entries must be strings, got {}",
                            json_kind(&other)
                        )));
                    }
                }
            }
            continue;
        }
        let Value::Object(fields) = v else {
            return Err(DbError::UnsupportedFilter(format!("`{k}` takes an object of fields")));
        };
        let fields = FieldMap::try_from(fields)?;
        let target = match k.as_str() {
            "$set" => &mut out.set,
            "$increment" => &mut out.increment,
            "$decrement" => &mut out.decrement,
            "$multiply" => &mut out.multiply,
            "$divide" => &mut out.divide,
            _ => return Err(DbError::UnsupportedFilter(format!("unknown update operator `{k}`"))),
        };
        for (path, value) in fields {
            target.insert(path, value);
        }
    }
    Ok(out)
}

/// Parses `{"include":[...]}` or `{"exclude":[...]}`.
///
/// # Errors
/// `Json` for malformed JSON, `UnsupportedFilter` when the document has another shape.
pub fn parse_read_fields_json(json: &str) -> Result<ReadFields, DbError> {
    let v: Value = serde_json::from_str(json)?;
    ReadFields::deserialize(v).map_err(|e| DbError::UnsupportedFilter(format!("read fields: {e}")))
}

impl TryFrom<Value> for Filter {
    type Error = DbError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        filter_from_value(v)
    }
}
