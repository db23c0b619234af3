//! Schemaless document fields and typed accessors.

use serde_json::{Map, Value};

/// Field carrying the logical last-update timestamp, as epoch milliseconds.
///
/// Every terminal write stamps this field so concurrent writers have a
/// monotonic marker to compare against.
pub const LAST_UPDATED: &str = "_lastUpdated";

/// A schemaless document body: field name to JSON value.
pub type Fields = Map<String, Value>;

/// Returns the current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reads a text field, if present and a string.
pub fn get_str<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Reads an integer field, if present and integral.
pub fn get_i64(fields: &Fields, name: &str) -> Option<i64> {
    fields.get(name).and_then(Value::as_i64)
}

/// Reads a numeric field as `f64`, if present and a number.
pub fn get_f64(fields: &Fields, name: &str) -> Option<f64> {
    fields.get(name).and_then(Value::as_f64)
}

/// Reads a boolean field, if present and a boolean.
pub fn get_bool(fields: &Fields, name: &str) -> Option<bool> {
    fields.get(name).and_then(Value::as_bool)
}

/// Reads the logical [`LAST_UPDATED`] stamp, if present.
pub fn last_updated(fields: &Fields) -> Option<i64> {
    get_i64(fields, LAST_UPDATED)
}

/// Stamps [`LAST_UPDATED`] with the current time and returns the stamp.
pub fn stamp_last_updated(fields: &mut Fields) -> i64 {
    let now = now_millis();
    fields.insert(LAST_UPDATED.to_string(), Value::from(now));
    now
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Warehouse Rave"));
        fields.insert("price".into(), json!(25.5));
        fields.insert("quantity".into(), json!(120));
        fields.insert("soldOut".into(), json!(false));
        fields
    }

    #[test]
    fn typed_accessors() {
        let fields = sample();
        assert_eq!(get_str(&fields, "name"), Some("Warehouse Rave"));
        assert_eq!(get_f64(&fields, "price"), Some(25.5));
        assert_eq!(get_i64(&fields, "quantity"), Some(120));
        assert_eq!(get_bool(&fields, "soldOut"), Some(false));
    }

    #[test]
    fn accessors_reject_wrong_types() {
        let fields = sample();
        assert_eq!(get_i64(&fields, "name"), None);
        assert_eq!(get_str(&fields, "quantity"), None);
        assert_eq!(get_bool(&fields, "price"), None);
        assert_eq!(get_str(&fields, "missing"), None);
    }

    #[test]
    fn stamp_sets_last_updated() {
        let mut fields = sample();
        assert_eq!(last_updated(&fields), None);

        let stamp = stamp_last_updated(&mut fields);
        assert_eq!(last_updated(&fields), Some(stamp));
        assert!(stamp > 0);
    }
}
