use nexusrpc::document::{
    Document, apply_generated_keys, decode_document, encode_document, generated_keys_from_bytes,
    validate_paths,
};
use nexusrpc::errors::DbError;
use nexusrpc::filter::{FieldValue, Selector, encode_selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    #[serde(default)]
    key: Key,
    title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Key {
    #[serde(default)]
    shard: u32,
    #[serde(default)]
    seq: u64,
}

impl Document for Ticket {
    const COLLECTION: &'static str = "tickets";

    fn schema_fields() -> &'static [&'static str] {
        &["key.shard", "key.seq", "title"]
    }

    fn primary_key() -> &'static [&'static str] {
        &["key.shard", "key.seq"]
    }
}

#[test]
fn codec_round_trip_keeps_field_order() {
    let t = Ticket { key: Key { shard: 2, seq: 40 }, title: "disk full".into() };
    let bytes = encode_document(&t).unwrap();
    assert_eq!(bytes, br#"{"key":{"shard":2,"seq":40},"title":"disk full"}"#.to_vec());
    assert_eq!(decode_document::<Ticket>(&bytes).unwrap(), t);
}

#[test]
fn nested_generated_keys_are_merged() {
    let t = Ticket { key: Key::default(), title: "disk full".into() };
    let keys = generated_keys_from_bytes(br#"{"key":{"shard":3,"seq":99}}"#).unwrap();
    let merged = apply_generated_keys(&t, &keys).unwrap();
    assert_eq!(merged.key, Key { shard: 3, seq: 99 });
    assert_eq!(merged.title, "disk full");
}

#[test]
fn dotted_generated_keys_are_merged() {
    let t = Ticket { key: Key::default(), title: "x".into() };
    let keys = generated_keys_from_bytes(br#"{"key.seq":7}"#).unwrap();
    assert_eq!(apply_generated_keys(&t, &keys).unwrap().key.seq, 7);
}

#[test]
fn generated_keys_must_be_an_object() {
    assert!(matches!(generated_keys_from_bytes(b"[1]"), Err(DbError::ValueEncoding(_))));
    assert!(matches!(generated_keys_from_bytes(b"{"), Err(DbError::Json(_))));
}

#[test]
fn mistyped_generated_key_fails_the_merge() {
    let t = Ticket { key: Key::default(), title: "x".into() };
    let keys = generated_keys_from_bytes(br#"{"key":{"seq":"abc"}}"#).unwrap();
    assert!(apply_generated_keys(&t, &keys).is_err());
}

#[test]
fn schema_accepts_parents_and_leaves() {
    assert!(validate_paths::<Ticket>(&["key".into(), "key.seq".into(), "title".into()]).is_ok());
    assert!(matches!(
        validate_paths::<Ticket>(&["key.region".into()]),
        Err(DbError::FilterEncoding(_))
    ));
}

#[test]
fn bson_values_convert_for_filters() {
    let doc = bson::doc! { "shard": 1_i32, "open": true, "title": "x" };
    let FieldValue::Object(map) = FieldValue::try_from(bson::Bson::Document(doc)).unwrap() else {
        panic!("expected object")
    };
    assert_eq!(
        encode_selector(&Selector::new(map)).unwrap(),
        r#"{"shard":1,"open":true,"title":"x"}"#
    );
    let oid = bson::Bson::ObjectId(bson::oid::ObjectId::new());
    assert!(matches!(FieldValue::try_from(oid), Err(DbError::ValueEncoding(_))));
}
