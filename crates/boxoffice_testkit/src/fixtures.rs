//! Document fixtures and pre-seeded stores.

use boxoffice_document::Fields;
use boxoffice_store::MemoryStore;
use serde_json::json;
use std::sync::Once;

/// Start time of the first fixture event, epoch millis.
const FIXTURE_EPOCH: i64 = 1_750_000_000_000;

/// Builds a complete event document.
pub fn event_fields(id: &str, name: &str, price: f64, quantity: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".into(), json!(id));
    fields.insert("name".into(), json!(name));
    fields.insert("description".into(), json!(format!("{name} at the boxoffice")));
    fields.insert("location".into(), json!("Main Hall"));
    fields.insert("price".into(), json!(price));
    fields.insert("quantity".into(), json!(quantity));
    fields.insert("startTime".into(), json!(FIXTURE_EPOCH));
    fields.insert("imageUrl".into(), json!(format!("https://img.example.com/{id}.jpg")));
    fields
}

/// Builds a complete purchase document.
pub fn purchase_fields(id: &str, event_id: &str, quantity: i64, total_price: f64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".into(), json!(id));
    fields.insert("eventId".into(), json!(event_id));
    fields.insert("quantity".into(), json!(quantity));
    fields.insert("totalPrice".into(), json!(total_price));
    fields.insert("status".into(), json!("confirmed"));
    fields.insert("purchasedAt".into(), json!(FIXTURE_EPOCH));
    fields
}

/// Creates a store seeded with `count` events in the `events` collection.
///
/// Ids are zero-padded (`evt-001`, `evt-002`, ...) and start times are
/// staggered one hour apart, so id order and `startTime` order agree.
pub fn seeded_store(count: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 1..=count {
        let id = format!("evt-{i:03}");
        let mut fields = event_fields(&id, &format!("Event {i}"), 10.0 + i as f64, 100);
        fields.insert(
            "startTime".into(),
            json!(FIXTURE_EPOCH + (i as i64) * 3_600_000),
        );
        store.seed("events", &id, fields);
    }
    store
}

static TRACING: Once = Once::new();

/// Initializes a tracing subscriber for test output, once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_has_ordered_ids() {
        let store = seeded_store(12);
        assert_eq!(store.collection_len("events"), 12);
    }

    #[test]
    fn event_fixture_is_complete() {
        let fields = event_fields("evt-1", "Gala", 25.0, 50);
        for name in ["id", "name", "description", "location", "price", "quantity", "startTime", "imageUrl"] {
            assert!(fields.contains_key(name), "missing {name}");
        }
    }

    #[test]
    fn purchase_fixture_is_complete() {
        let fields = purchase_fields("pur-1", "evt-1", 2, 50.0);
        for name in ["id", "eventId", "quantity", "totalPrice", "status", "purchasedAt"] {
            assert!(fields.contains_key(name), "missing {name}");
        }
    }
}
