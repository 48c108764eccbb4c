use boxoffice_model::Record;
use boxoffice_types::{EntityKey, Identity};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_record(data: serde_json::Value) -> Record {
    Record {
        entity_type: "venue".into(),
        id: Identity::Int(1),
        data,
        created_at: 1000,
        modified_at: 2000,
    }
}

// ── Construction & fields ────────────────────────────────────────

#[test]
fn new_stamps_both_timestamps() {
    let r = Record::new("venue", 3, json!({"name": "Hall"}));
    assert_eq!(r.id, Identity::Int(3));
    assert_eq!(r.created_at, r.modified_at);
    assert!(r.created_at > 0);
}

#[test]
fn key_pairs_type_and_identity() {
    let r = make_record(json!({}));
    assert_eq!(r.key(), EntityKey::new("venue", 1));
}

#[test]
fn with_id_replaces_identity_only() {
    let r = make_record(json!({"name": "Hall"})).with_id(7);
    assert_eq!(r.id, Identity::Int(7));
    assert_eq!(r.get_str("/name"), Some("Hall"));
    assert_eq!(r.created_at, 1000);
}

#[test]
fn touch_moves_modified_at_forward() {
    let mut r = make_record(json!({}));
    r.touch();
    assert!(r.modified_at > 2000);
    assert_eq!(r.created_at, 1000);
}

// ── Business-field equality ──────────────────────────────────────

#[test]
fn same_business_fields_ignores_timestamps() {
    let a = make_record(json!({"name": "Hall"}));
    let mut b = a.clone();
    b.created_at = 5;
    b.modified_at = 6;
    assert!(a.same_business_fields(&b));
}

#[test]
fn same_business_fields_detects_data_change() {
    let a = make_record(json!({"name": "Hall"}));
    let b = make_record(json!({"name": "Arena"}));
    assert!(!a.same_business_fields(&b));
}

#[test]
fn same_business_fields_detects_identity_change() {
    let a = make_record(json!({"name": "Hall"}));
    let b = a.clone().with_id(2);
    assert!(!a.same_business_fields(&b));
}

// ── JSON pointer helpers ─────────────────────────────────────────

#[test]
fn scalar_getters() {
    let r = make_record(json!({"name": "Hall", "capacity": 300, "open": true}));
    assert_eq!(r.get_str("/name"), Some("Hall"));
    assert_eq!(r.get_i64("/capacity"), Some(300));
    assert_eq!(r.get_bool("/open"), Some(true));
    assert_eq!(r.get_str("/capacity"), None);
    assert_eq!(r.get_i64("/missing"), None);
}

#[test]
fn reference_resolves_int_and_text() {
    let r = make_record(json!({"manager_id": 4, "user_id": "alice"}));
    assert_eq!(r.reference("/manager_id"), Some(Identity::Int(4)));
    assert_eq!(r.reference("/user_id"), Some(Identity::Text("alice".into())));
}

#[test]
fn reference_ignores_null_and_blank() {
    let r = make_record(json!({"manager_id": null, "user_id": ""}));
    assert_eq!(r.reference("/manager_id"), None);
    assert_eq!(r.reference("/user_id"), None);
    assert_eq!(r.reference("/missing"), None);
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn deserialize_from_known_json() {
    let json_str = r#"{
        "entity_type": "booking",
        "id": 12,
        "data": {"seats": 2},
        "created_at": 100,
        "modified_at": 200
    }"#;
    let r: Record = serde_json::from_str(json_str).unwrap();
    assert_eq!(r.entity_type.as_str(), "booking");
    assert_eq!(r.id, Identity::Int(12));
    assert_eq!(r.get_i64("/seats"), Some(2));
}
