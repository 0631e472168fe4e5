use nexusrpc::errors::DbError;
use nexusrpc::fields;
use nexusrpc::filter::{
    BigInteger, FieldValue, Filter, LogicalChildren, LogicalFilter, LogicalOp, Selector,
    SelectorOp, encode_filter, encode_logical_filter, encode_selector,
};

#[test]
fn selector_big_integer_id() {
    let id: BigInteger = "123".parse().unwrap();
    let s = Selector::new(fields! { "id" => id });
    assert_eq!(encode_selector(&s).unwrap(), r#"{"id":123}"#);
}

#[test]
fn selector_string_and_decimal() {
    let s = Selector::new(fields! { "name" => "alice", "balance" => 12.34 });
    assert_eq!(encode_selector(&s).unwrap(), r#"{"name":"alice","balance":12.34}"#);
}

#[test]
fn selector_flattens_nested_object() {
    let s = Selector::new(fields! {
        "name" => "alice",
        "address" => fields! { "city" => "San Francisco" },
    });
    assert_eq!(
        encode_selector(&s).unwrap(),
        r#"{"name":"alice","address.city":"San Francisco"}"#
    );
}

#[test]
fn selector_flattens_doubly_nested_object_in_order() {
    let s = Selector::new(fields! {
        "address" => fields! {
            "geo" => fields! { "lat" => 1.5, "lng" => -2 },
            "zip" => "94107",
        },
        "active" => true,
    });
    assert_eq!(
        encode_selector(&s).unwrap(),
        r#"{"address.geo.lat":1.5,"address.geo.lng":-2,"address.zip":"94107","active":true}"#
    );
}

#[test]
fn selector_keeps_declaration_order() {
    let s = Selector::new(fields! { "z" => 1, "a" => 2, "m" => 3 });
    assert_eq!(encode_selector(&s).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn selector_scalars() {
    let ts = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05.678Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let id = uuid::Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    let s = Selector::new(fields! {
        "deleted" => FieldValue::Null,
        "created" => ts,
        "owner" => id,
        "quote" => "say \"hi\"",
        "max" => u64::MAX,
    });
    assert_eq!(
        encode_selector(&s).unwrap(),
        concat!(
            r#"{"deleted":null,"created":"2024-01-02T03:04:05.678Z","#,
            r#""owner":"67e55044-10b1-426f-9247-bb680e5fe0c8","quote":"say \"hi\"","#,
            r#""max":18446744073709551615}"#
        )
    );
}

#[test]
fn selector_wide_integer_keeps_every_digit() {
    let s = Selector::new(fields! { "n" => i128::MAX });
    assert_eq!(
        encode_selector(&s).unwrap(),
        r#"{"n":170141183460469231731687303715884105727}"#
    );
}

#[test]
fn selector_comparison_operator() {
    let s = Selector::with_op(SelectorOp::Lt, fields! { "rank" => 10 });
    assert_eq!(encode_selector(&s).unwrap(), r#"{"rank":{"$lt":10}}"#);
}

#[test]
fn or_of_two_selectors() {
    let f = LogicalFilter::or(vec![
        Selector::new(fields! { "name" => "alice" }),
        Selector::new(fields! { "name" => "emma" }),
    ]);
    assert_eq!(encode_logical_filter(&f).unwrap(), r#"{"$or":[{"name":"alice"},{"name":"emma"}]}"#);
}

#[test]
fn and_of_two_selectors() {
    let f = LogicalFilter::and(vec![
        Selector::new(fields! { "name" => "alice" }),
        Selector::new(fields! { "rank" => 1 }),
    ]);
    assert_eq!(encode_logical_filter(&f).unwrap(), r#"{"$and":[{"name":"alice"},{"rank":1}]}"#);
}

#[test]
fn or_of_ands() {
    let f = LogicalFilter::nested(
        LogicalOp::Or,
        vec![
            LogicalFilter::and(vec![
                Selector::new(fields! { "name" => "alice" }),
                Selector::new(fields! { "rank" => 1 }),
            ]),
            LogicalFilter::and(vec![
                Selector::new(fields! { "name" => "emma" }),
                Selector::new(fields! { "rank" => 2 }),
            ]),
        ],
    );
    assert_eq!(
        encode_logical_filter(&f).unwrap(),
        r#"{"$or":[{"$and":[{"name":"alice"},{"rank":1}]},{"$and":[{"name":"emma"},{"rank":2}]}]}"#
    );
}

#[test]
fn and_of_ors() {
    let f = LogicalFilter::nested(
        LogicalOp::And,
        vec![
            LogicalFilter::or(vec![
                Selector::new(fields! { "name" => "alice" }),
                Selector::new(fields! { "name" => "emma" }),
            ]),
            LogicalFilter::or(vec![
                Selector::new(fields! { "rank" => 1 }),
                Selector::new(fields! { "rank" => 2 }),
            ]),
        ],
    );
    assert_eq!(
        encode_logical_filter(&f).unwrap(),
        r#"{"$and":[{"$or":[{"name":"alice"},{"name":"emma"}]},{"$or":[{"rank":1},{"rank":2}]}]}"#
    );
}

#[test]
fn encode_filter_dispatches_on_variant() {
    let sel: Filter = Selector::new(fields! { "a" => 1 }).into();
    let log: Filter = LogicalFilter::or(vec![Selector::new(fields! { "a" => 1 })]).into();
    assert_eq!(encode_filter(&sel).unwrap(), r#"{"a":1}"#);
    assert_eq!(encode_filter(&log).unwrap(), r#"{"$or":[{"a":1}]}"#);
}

#[test]
fn empty_selector_is_an_error() {
    let s = Selector::new(fields! {});
    assert!(matches!(encode_selector(&s), Err(DbError::FilterEncoding(_))));
    assert!(matches!(encode_filter(&Filter::Selector(s)), Err(DbError::FilterEncoding(_))));
}

#[test]
fn empty_logical_filter_is_an_error() {
    let f = LogicalFilter { op: LogicalOp::And, children: LogicalChildren::Selectors(vec![]) };
    assert!(matches!(encode_logical_filter(&f), Err(DbError::FilterEncoding(_))));
    let f = LogicalFilter { op: LogicalOp::Or, children: LogicalChildren::Logical(vec![]) };
    assert!(matches!(encode_logical_filter(&f), Err(DbError::FilterEncoding(_))));
}

#[test]
fn empty_child_selector_fails_the_whole_filter() {
    let f = LogicalFilter::or(vec![
        Selector::new(fields! { "a" => 1 }),
        Selector::new(fields! {}),
    ]);
    assert!(matches!(encode_logical_filter(&f), Err(DbError::FilterEncoding(_))));
}

#[test]
fn empty_nested_object_is_an_error() {
    let s = Selector::new(fields! { "address" => fields! {} });
    assert!(matches!(encode_selector(&s), Err(DbError::FilterEncoding(_))));
}

#[test]
fn array_selector_value_is_a_value_error() {
    let s = Selector::new(fields! { "tags" => vec!["a", "b"] });
    let err = encode_selector(&s).unwrap_err();
    assert!(matches!(err, DbError::ValueEncoding(_)));
    assert!(err.is_encoding());
}

#[test]
fn infinite_float_is_a_value_error() {
    let s = Selector::new(fields! { "x" => f64::INFINITY });
    assert!(matches!(encode_selector(&s), Err(DbError::ValueEncoding(_))));
}

#[test]
fn runaway_logical_nesting_is_rejected() {
    let mut f = LogicalFilter::or(vec![Selector::new(fields! { "a" => 1 })]);
    for _ in 0..100 {
        f = LogicalFilter::nested(LogicalOp::And, vec![f]);
    }
    assert!(matches!(encode_logical_filter(&f), Err(DbError::FilterEncoding(_))));
}

#[test]
fn encoding_is_idempotent() {
    let f: Filter = LogicalFilter::and(vec![
        Selector::new(fields! { "name" => "alice", "address" => fields! { "city" => "SF" } }),
        Selector::new(fields! { "balance" => 0.1 }),
    ])
    .into();
    let again = f.clone();
    assert_eq!(encode_filter(&f).unwrap(), encode_filter(&again).unwrap());
    assert_eq!(encode_filter(&f).unwrap(), encode_filter(&f).unwrap());
}

#[test]
fn field_paths_are_flattened() {
    let f: Filter = LogicalFilter::or(vec![
        Selector::new(fields! { "name" => "alice" }),
        Selector::new(fields! { "address" => fields! { "city" => "SF" } }),
    ])
    .into();
    assert_eq!(f.field_paths().unwrap(), vec!["name".to_string(), "address.city".to_string()]);
}
