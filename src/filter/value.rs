use crate::errors::DbError;
use bson::Bson;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Integer of arbitrary width, kept as canonical decimal text so it reaches the wire
/// without passing through a float.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInteger(String);

impl BigInteger {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.starts_with('-')
    }
}

impl FromStr for BigInteger {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DbError::ValueEncoding(format!("invalid integer literal `{s}`")));
        }
        let trimmed = digits.trim_start_matches('0');
        Ok(if trimmed.is_empty() {
            Self("0".into())
        } else if negative {
            Self(format!("-{trimmed}"))
        } else {
            Self(trimmed.to_string())
        })
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i128> for BigInteger {
    fn from(v: i128) -> Self {
        Self(v.to_string())
    }
}

impl From<u128> for BigInteger {
    fn from(v: u128) -> Self {
        Self(v.to_string())
    }
}

impl From<i64> for BigInteger {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<u64> for BigInteger {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

/// A value a document field can hold in a filter, projection or update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    BigInt(BigInteger),
    String(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Array(Vec<FieldValue>),
    Object(FieldMap),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) | Self::BigInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::UInt(_) | Self::Float(_) | Self::BigInt(_))
    }
}

/// Ordered field-name to value mapping. Keys are unique; insertion order is wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field. An existing key keeps its position and gets the new value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for FieldMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Builds a [`FieldMap`](crate::filter::FieldMap) in declaration order.
///
/// ```
/// use nexusrpc::fields;
/// let f = fields! { "name" => "alice", "address" => fields! { "city" => "SF" } };
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::filter::FieldMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::filter::FieldMap::new();
        $( map.insert($key, $value); )+
        map
    }};
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<i128> for FieldValue {
    fn from(v: i128) -> Self {
        i64::try_from(v).map_or_else(|_| Self::BigInt(BigInteger::from(v)), Self::Int)
    }
}

impl From<u128> for FieldValue {
    fn from(v: u128) -> Self {
        u64::try_from(v).map_or_else(|_| Self::BigInt(BigInteger::from(v)), Self::UInt)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<BigInteger> for FieldValue {
    fn from(v: BigInteger) -> Self {
        Self::BigInt(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(v: FieldMap) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = DbError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        Ok(match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => number_to_field(&n)?,
            Value::String(s) => Self::String(s),
            Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            Value::Object(obj) => Self::Object(FieldMap::try_from(obj)?),
        })
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for FieldMap {
    type Error = DbError;

    fn try_from(obj: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut map = Self::new();
        for (k, v) in obj {
            map.insert(k, FieldValue::try_from(v)?);
        }
        Ok(map)
    }
}

fn number_to_field(n: &serde_json::Number) -> Result<FieldValue, DbError> {
    if let Some(i) = n.as_i64() {
        return Ok(FieldValue::Int(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(FieldValue::UInt(u));
    }
    let text = n.to_string();
    if text.bytes().enumerate().all(|(i, b)| b.is_ascii_digit() || (i == 0 && b == b'-')) {
        return Ok(FieldValue::BigInt(text.parse()?));
    }
    n.as_f64()
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
        .ok_or_else(|| DbError::ValueEncoding(format!("number `{text}` is out of range")))
}

impl TryFrom<Bson> for FieldValue {
    type Error = DbError;

    fn try_from(b: Bson) -> Result<Self, Self::Error> {
        Ok(match b {
            Bson::Null => Self::Null,
            Bson::Boolean(v) => Self::Bool(v),
            Bson::Int32(v) => Self::Int(i64::from(v)),
            Bson::Int64(v) => Self::Int(v),
            Bson::Double(v) => Self::Float(v),
            Bson::String(v) => Self::String(v),
            Bson::DateTime(dt) => {
                let millis = dt.timestamp_millis();
                Self::DateTime(DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    DbError::ValueEncoding(format!("datetime {millis}ms is out of range"))
                })?)
            }
            Bson::Array(items) => {
                Self::Array(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            Bson::Document(doc) => {
                let mut map = FieldMap::new();
                for (k, v) in doc {
                    map.insert(k, Self::try_from(v)?);
                }
                Self::Object(map)
            }
            other => {
                return Err(DbError::ValueEncoding(format!(
                    "BSON {:?} values have no wire representation",
                    other.element_type()
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_integer_canonicalizes() {
        assert_eq!("000123".parse::<BigInteger>().unwrap().as_str(), "123");
        assert_eq!("-0".parse::<BigInteger>().unwrap().as_str(), "0");
        assert_eq!("-007".parse::<BigInteger>().unwrap().as_str(), "-7");
        assert!("-007".parse::<BigInteger>().unwrap().is_negative());
        assert!(!"-0".parse::<BigInteger>().unwrap().is_negative());
        assert!("12a".parse::<BigInteger>().is_err());
        assert!("-".parse::<BigInteger>().is_err());
        assert!("".parse::<BigInteger>().is_err());
    }

    #[test]
    fn wide_integers_pick_the_narrowest_variant() {
        assert_eq!(FieldValue::from(5i128), FieldValue::Int(5));
        assert_eq!(FieldValue::from(u128::from(u64::MAX)), FieldValue::UInt(u64::MAX));
        let wide = FieldValue::from(i128::MAX);
        assert_eq!(wide, FieldValue::BigInt(BigInteger::from(i128::MAX)));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut m = fields! { "a" => 1, "b" => 2 };
        assert_eq!(m.insert("a", 3), Some(FieldValue::Int(1)));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn json_numbers_keep_precision() {
        let v: serde_json::Value =
            serde_json::from_str("123456789012345678901234567890").unwrap();
        let f = FieldValue::try_from(v).unwrap();
        assert_eq!(f, FieldValue::BigInt("123456789012345678901234567890".parse().unwrap()));
    }

    #[test]
    fn bson_binary_is_rejected() {
        let b = Bson::Binary(bson::Binary {
            subtype: bson::spec::BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        });
        assert!(matches!(FieldValue::try_from(b), Err(DbError::ValueEncoding(_))));
    }
}
