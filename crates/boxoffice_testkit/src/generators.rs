//! Property-based test generators using proptest.

use boxoffice_document::Fields;
use proptest::prelude::*;
use serde_json::Value;

/// Any JSON scalar: null, bool, integer, finite float, or short string.
pub fn arb_json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::from),
    ]
}

/// An arbitrary raw document: random field names mapped to scalars.
pub fn arb_raw_fields() -> impl Strategy<Value = Fields> {
    proptest::collection::btree_map("[a-zA-Z_]{1,12}", arb_json_scalar(), 0..12)
        .prop_map(|map| map.into_iter().collect())
}

/// A document shaped like an event, with each field possibly missing or
/// carrying a value of the wrong type. Exercises sanitizer fallbacks.
pub fn arb_lossy_event() -> impl Strategy<Value = Fields> {
    let name = proptest::option::of(prop_oneof![
        "[a-zA-Z ]{1,20}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
    ]);
    let price = proptest::option::of(prop_oneof![
        (0.0..500.0f64).prop_map(Value::from),
        Just(Value::from("free")),
    ]);
    let quantity = proptest::option::of(prop_oneof![
        (0i64..10_000).prop_map(Value::from),
        Just(Value::Bool(true)),
    ]);
    let start_time = proptest::option::of(prop_oneof![
        (1i64..4_102_444_800_000).prop_map(Value::from),
        Just(Value::from(-1)),
        Just(Value::from("tomorrow")),
    ]);

    (name, price, quantity, start_time).prop_map(|(name, price, quantity, start_time)| {
        let mut fields = Fields::new();
        if let Some(value) = name {
            fields.insert("name".into(), value);
        }
        if let Some(value) = price {
            fields.insert("price".into(), value);
        }
        if let Some(value) = quantity {
            fields.insert("quantity".into(), value);
        }
        if let Some(value) = start_time {
            fields.insert("startTime".into(), value);
        }
        fields
    })
}
