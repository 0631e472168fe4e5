//! Typed documents: schema declaration, byte codec and generated-key merging.

use crate::errors::DbError;
use crate::filter::{FieldMap, FieldValue, flatten};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A document type stored in one collection.
///
/// `schema_fields` lists the declared dotted field paths. When it is non-empty, collection
/// operations reject filters, updates and projections that name anything else.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    #[must_use]
    fn schema_fields() -> &'static [&'static str] {
        &[]
    }

    #[must_use]
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

/// # Errors
/// Returns an error if the document cannot be serialized to JSON.
pub fn encode_document<T: Serialize>(doc: &T) -> Result<Vec<u8>, DbError> {
    Ok(serde_json::to_vec(doc)?)
}

/// # Errors
/// Returns an error if the bytes are not a JSON encoding of `T`.
pub fn decode_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DbError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a generated-key payload (a JSON object) into a field map.
///
/// # Errors
/// `Json` for malformed bytes, `ValueEncoding` when the payload is not an object.
pub fn generated_keys_from_bytes(bytes: &[u8]) -> Result<FieldMap, DbError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(obj) => FieldMap::try_from(obj),
        _ => Err(DbError::ValueEncoding("generated keys must be a JSON object".into())),
    }
}

/// Returns a copy of `doc` with each key in `keys` written at its (dotted) path.
///
/// Missing intermediate objects are created; a non-object on the way is an error.
///
/// # Errors
/// `ValueEncoding` when a key cannot be placed or the merged value no longer fits `T`.
pub fn apply_generated_keys<T>(doc: &T, keys: &FieldMap) -> Result<T, DbError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(doc)?;
    let Value::Object(root) = &mut value else {
        return Err(DbError::ValueEncoding("document must serialize to a JSON object".into()));
    };
    for (path, key) in flatten(keys)? {
        set_path(root, &path, field_to_json(key)?)?;
    }
    Ok(serde_json::from_value(value)?)
}

/// Checks field paths against `T::schema_fields()`.
///
/// A path is known when it equals a declared path, lies under one, or is the parent of one.
///
/// # Errors
/// `FilterEncoding` naming the first unknown path.
pub fn validate_paths<T: Document>(paths: &[String]) -> Result<(), DbError> {
    let declared = T::schema_fields();
    if declared.is_empty() {
        return Ok(());
    }
    for p in paths {
        let known = declared.iter().any(|d| is_same_or_nested(p, d) || is_same_or_nested(d, p));
        if !known {
            return Err(DbError::FilterEncoding(format!(
                "unknown field `{p}` for collection `{}`",
                T::COLLECTION
            )));
        }
    }
    Ok(())
}

fn is_same_or_nested(path: &str, base: &str) -> bool {
    path.strip_prefix(base).is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), DbError> {
    let mut segments = path.split('.').peekable();
    let mut cur = root;
    while let Some(seg) = segments.next() {
        if segments.peek().is_none() {
            cur.insert(seg.to_string(), value);
            return Ok(());
        }
        let slot = cur.entry(seg.to_string()).or_insert_with(|| Value::Object(Map::new()));
        cur = match slot {
            Value::Object(inner) => inner,
            _ => {
                return Err(DbError::ValueEncoding(format!(
                    "cannot place generated key `{path}`: `{seg}` is not an object"
                )));
            }
        };
    }
    Ok(())
}

fn field_to_json(v: &FieldValue) -> Result<Value, DbError> {
    Ok(match v {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::UInt(u) => Value::from(*u),
        FieldValue::Float(f) => Value::Number(
            serde_json::Number::from_f64(*f)
                .ok_or_else(|| DbError::ValueEncoding(format!("{f} has no JSON form")))?,
        ),
        FieldValue::BigInt(b) => serde_json::from_str(b.as_str())?,
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::DateTime(dt) => {
            Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        }
        FieldValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
        FieldValue::Array(items) => {
            Value::Array(items.iter().map(field_to_json).collect::<Result<_, _>>()?)
        }
        FieldValue::Object(map) => {
            let mut obj = Map::new();
            for (k, v) in map.iter() {
                obj.insert(k.to_string(), field_to_json(v)?);
            }
            Value::Object(obj)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        #[serde(default)]
        id: u64,
        item: String,
        #[serde(default)]
        meta: Meta,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Meta {
        #[serde(default)]
        seq: u64,
    }

    impl Document for Order {
        const COLLECTION: &'static str = "orders";
        fn schema_fields() -> &'static [&'static str] {
            &["id", "item", "meta.seq"]
        }
    }

    #[test]
    fn merges_top_level_and_nested_keys() {
        let o = Order { id: 0, item: "pen".into(), meta: Meta::default() };
        let merged =
            apply_generated_keys(&o, &fields! { "id" => 7u64, "meta" => fields! { "seq" => 3 } })
                .unwrap();
        assert_eq!(merged.id, 7);
        assert_eq!(merged.meta.seq, 3);
        assert_eq!(o.id, 0);
    }

    #[test]
    fn scalar_in_path_is_rejected() {
        let o = Order { id: 0, item: "pen".into(), meta: Meta::default() };
        let err = apply_generated_keys(&o, &fields! { "item.code" => 1 }).unwrap_err();
        assert!(matches!(err, DbError::ValueEncoding(_)));
    }

    #[test]
    fn schema_paths() {
        assert!(validate_paths::<Order>(&["meta.seq".to_string(), "meta".to_string()]).is_ok());
        assert!(validate_paths::<Order>(&["metadata".to_string()]).is_err());
    }
}
