//! Record schemas and sanitization of loosely-typed remote documents.
//!
//! Remote documents arrive as schemaless maps that may be missing fields
//! or carry values of the wrong type. A [`RecordSchema`] lists the fields
//! a screen relies on, together with the default substituted when the
//! remote value is unusable. Sanitization never fails: every input,
//! including an absent document, yields a complete record.

use crate::fields::{now_millis, Fields};
use serde_json::{json, Value};

/// Expected type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// Signed integer.
    Integer,
    /// Integer or floating-point number.
    Number,
    /// Boolean.
    Bool,
    /// Epoch-milliseconds timestamp (a positive integer).
    Timestamp,
}

impl FieldKind {
    /// Returns true if `value` is usable as this kind.
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Timestamp => value.as_i64().is_some_and(|millis| millis > 0),
        }
    }
}

/// Default substituted when a field is missing or of the wrong type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// A fixed JSON value.
    Fixed(Value),
    /// The sanitization-time wall clock, as epoch milliseconds.
    Now,
}

impl FieldDefault {
    fn materialize(&self) -> Value {
        match self {
            FieldDefault::Fixed(value) => value.clone(),
            FieldDefault::Now => json!(now_millis()),
        }
    }
}

/// One required field of a record schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name as stored in the remote document.
    pub name: &'static str,
    /// Expected type.
    pub kind: FieldKind,
    /// Default used when the remote value is missing or mistyped.
    pub default: FieldDefault,
}

impl FieldSpec {
    /// Creates a field spec.
    pub fn new(name: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self {
            name,
            kind,
            default,
        }
    }
}

/// The set of fields a record must carry, with typed defaults.
///
/// Fields outside the schema are passed through unchanged so remote-side
/// additions survive a round trip through the client.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: &'static str,
    specs: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Creates a schema from field specs.
    pub fn new(name: &'static str, specs: Vec<FieldSpec>) -> Self {
        Self { name, specs }
    }

    /// Returns the schema name, used in log context.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the required field specs.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Schema for storefront event documents.
    pub fn event() -> Self {
        Self::new(
            "event",
            vec![
                FieldSpec::new(
                    "id",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("unknown-event")),
                ),
                FieldSpec::new(
                    "name",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("Untitled Event")),
                ),
                FieldSpec::new("description", FieldKind::Text, FieldDefault::Fixed(json!(""))),
                FieldSpec::new(
                    "location",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("Location TBA")),
                ),
                FieldSpec::new("price", FieldKind::Number, FieldDefault::Fixed(json!(0))),
                FieldSpec::new("quantity", FieldKind::Integer, FieldDefault::Fixed(json!(0))),
                FieldSpec::new("startTime", FieldKind::Timestamp, FieldDefault::Now),
                FieldSpec::new(
                    "imageUrl",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("https://placehold.co/600x400")),
                ),
            ],
        )
    }

    /// Schema for ticket purchase documents.
    pub fn purchase() -> Self {
        Self::new(
            "purchase",
            vec![
                FieldSpec::new(
                    "id",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("unknown-purchase")),
                ),
                FieldSpec::new("eventId", FieldKind::Text, FieldDefault::Fixed(json!(""))),
                FieldSpec::new("quantity", FieldKind::Integer, FieldDefault::Fixed(json!(0))),
                FieldSpec::new("totalPrice", FieldKind::Number, FieldDefault::Fixed(json!(0))),
                FieldSpec::new(
                    "status",
                    FieldKind::Text,
                    FieldDefault::Fixed(json!("pending")),
                ),
                FieldSpec::new("purchasedAt", FieldKind::Timestamp, FieldDefault::Now),
            ],
        )
    }

    /// Coerces a possibly-incomplete remote document into a complete record.
    ///
    /// For each required field the raw value is kept iff it is present and
    /// of the expected kind; otherwise the documented default is
    /// substituted. An absent document yields a fully-defaulted placeholder.
    /// Unknown fields are copied through unchanged.
    pub fn sanitize(&self, raw: Option<&Fields>) -> Fields {
        let mut record = raw.cloned().unwrap_or_default();

        for spec in &self.specs {
            let usable = record.get(spec.name).is_some_and(|value| spec.kind.accepts(value));
            if !usable {
                record.insert(spec.name.to_string(), spec.default.materialize());
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absent_document_yields_placeholder() {
        let record = RecordSchema::event().sanitize(None);

        assert_eq!(record["id"], json!("unknown-event"));
        assert_eq!(record["name"], json!("Untitled Event"));
        assert_eq!(record["location"], json!("Location TBA"));
        assert_eq!(record["price"], json!(0));
        assert_eq!(record["quantity"], json!(0));
        assert_eq!(record["imageUrl"], json!("https://placehold.co/600x400"));
        assert!(record["startTime"].as_i64().unwrap() > 0);
    }

    #[test]
    fn valid_fields_are_kept() {
        let mut raw = Fields::new();
        raw.insert("id".into(), json!("evt-42"));
        raw.insert("name".into(), json!("Summer Gala"));
        raw.insert("price".into(), json!(79.99));
        raw.insert("quantity".into(), json!(200));
        raw.insert("startTime".into(), json!(1_700_000_000_000_i64));

        let record = RecordSchema::event().sanitize(Some(&raw));

        assert_eq!(record["id"], json!("evt-42"));
        assert_eq!(record["name"], json!("Summer Gala"));
        assert_eq!(record["price"], json!(79.99));
        assert_eq!(record["quantity"], json!(200));
        assert_eq!(record["startTime"], json!(1_700_000_000_000_i64));
        // Missing fields still get defaults.
        assert_eq!(record["location"], json!("Location TBA"));
    }

    #[test]
    fn mistyped_fields_are_replaced() {
        let mut raw = Fields::new();
        raw.insert("name".into(), json!(17));
        raw.insert("price".into(), json!("free"));
        raw.insert("quantity".into(), json!(3.5));
        raw.insert("startTime".into(), json!(-4));

        let record = RecordSchema::event().sanitize(Some(&raw));

        assert_eq!(record["name"], json!("Untitled Event"));
        assert_eq!(record["price"], json!(0));
        assert_eq!(record["quantity"], json!(0));
        assert!(record["startTime"].as_i64().unwrap() > 0);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let mut raw = Fields::new();
        raw.insert("organizerNote".into(), json!("door opens 19:00"));
        raw.insert("tags".into(), json!(["music", "live"]));

        let record = RecordSchema::event().sanitize(Some(&raw));

        assert_eq!(record["organizerNote"], json!("door opens 19:00"));
        assert_eq!(record["tags"], json!(["music", "live"]));
    }

    #[test]
    fn purchase_defaults() {
        let record = RecordSchema::purchase().sanitize(None);

        assert_eq!(record["id"], json!("unknown-purchase"));
        assert_eq!(record["eventId"], json!(""));
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["totalPrice"], json!(0));
        assert!(record["purchasedAt"].as_i64().unwrap() > 0);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut raw = Fields::new();
        raw.insert("name".into(), json!(17));
        raw.insert("extra".into(), json!({"nested": true}));

        let schema = RecordSchema::event();
        let once = schema.sanitize(Some(&raw));
        let twice = schema.sanitize(Some(&once));

        assert_eq!(once, twice);
    }

    fn arb_value() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 ]{0,24}".prop_map(serde_json::Value::from),
        ]
    }

    fn arb_fields() -> impl Strategy<Value = Fields> {
        proptest::collection::btree_map("[a-zA-Z_]{1,12}", arb_value(), 0..12)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        // Totality: every input yields a record carrying every required
        // field with a usable value.
        #[test]
        fn sanitize_is_total(raw in proptest::option::of(arb_fields())) {
            let schema = RecordSchema::event();
            let record = schema.sanitize(raw.as_ref());

            for spec in schema.specs() {
                let value = record.get(spec.name).expect("required field present");
                prop_assert!(matches_kind(spec.kind, value));
            }
        }

        // Idempotence over the required-field subset.
        #[test]
        fn sanitize_twice_is_stable(raw in arb_fields()) {
            let schema = RecordSchema::event();
            let once = schema.sanitize(Some(&raw));
            let twice = schema.sanitize(Some(&once));
            prop_assert_eq!(once, twice);
        }
    }

    fn matches_kind(kind: FieldKind, value: &serde_json::Value) -> bool {
        match kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Timestamp => value.as_i64().is_some_and(|millis| millis > 0),
        }
    }
}
