use boxoffice_model::{EntitySchema, IdStrategy, Record};
use boxoffice_storage::{
    BackendKind, FlatFileBackend, MemoryBackend, RelationalBackend, StorageError, StoreBackend,
    UpsertOutcome,
};
use boxoffice_types::{EntityType, Identity};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn venue_schema() -> EntitySchema {
    EntitySchema::new("venue", IdStrategy::Sequence)
}

fn user_schema() -> EntitySchema {
    EntitySchema::new("user", IdStrategy::Uuid)
}

fn prepared(backend: &dyn StoreBackend) {
    backend.ensure_type(&venue_schema()).unwrap();
    backend.ensure_type(&user_schema()).unwrap();
}

fn draft(name: &str) -> Record {
    Record::new("venue", 0, json!({ "name": name, "capacity": 100 }))
}

/// Behaviour every backend shares.
fn conformance(backend: &dyn StoreBackend) {
    prepared(backend);
    let venue = EntityType::new("venue");

    // Generated sequence identities.
    let a = backend.insert_generated(&venue_schema(), draft("A")).unwrap();
    let b = backend.insert_generated(&venue_schema(), draft("B")).unwrap();
    assert_eq!(a.id, Identity::Int(1));
    assert_eq!(b.id, Identity::Int(2));

    // Generated uuid identities.
    let user = backend
        .insert_generated(&user_schema(), Record::new("user", "", json!({"email": "a@b.c"})))
        .unwrap();
    assert!(matches!(user.id, Identity::Text(ref s) if !s.is_empty()));
    assert_eq!(
        backend.fetch(&EntityType::new("user"), &user.id).unwrap().unwrap().data,
        json!({"email": "a@b.c"})
    );

    // Explicit identity insert, then replace in place.
    let explicit = Record::new("venue", 7, json!({ "name": "Seven", "capacity": 7 }));
    assert_eq!(backend.upsert(&explicit).unwrap(), UpsertOutcome::Inserted);
    let changed = Record::new("venue", 7, json!({ "name": "Seven v2", "capacity": 7 }));
    assert_eq!(backend.upsert(&changed).unwrap(), UpsertOutcome::Updated);
    assert_eq!(backend.count(&venue).unwrap(), 3);
    assert_eq!(
        backend.fetch(&venue, &Identity::Int(7)).unwrap().unwrap().get_str("/name"),
        Some("Seven v2")
    );

    // Generated identities never collide with an explicit one.
    let c = backend.insert_generated(&venue_schema(), draft("C")).unwrap();
    assert_eq!(c.id, Identity::Int(8));

    // Queries.
    let all = backend.fetch_all(&venue).unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![Identity::Int(1), Identity::Int(2), Identity::Int(7), Identity::Int(8)]);
    let found = backend.fetch_where(&venue, "/name", &json!("B")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Identity::Int(2));
    assert_eq!(backend.fetch_where(&venue, "/capacity", &json!(100)).unwrap().len(), 3);
    assert!(backend.fetch_where(&venue, "/name", &json!("nope")).unwrap().is_empty());

    // Update keeps created_at.
    let mut edited = a.clone();
    edited.data = json!({ "name": "A2", "capacity": 100 });
    edited.modified_at = a.modified_at + 10;
    assert!(backend.update(&edited).unwrap());
    let stored = backend.fetch(&venue, &a.id).unwrap().unwrap();
    assert_eq!(stored.get_str("/name"), Some("A2"));
    assert_eq!(stored.created_at, a.created_at);
    assert_eq!(stored.modified_at, a.modified_at + 10);
    assert!(!backend.update(&draft("ghost").with_id(99)).unwrap());

    // Delete is idempotent.
    assert!(backend.delete(&venue, &b.id).unwrap());
    assert!(!backend.delete(&venue, &b.id).unwrap());
    assert!(backend.fetch(&venue, &b.id).unwrap().is_none());

    // Clear.
    assert_eq!(backend.clear(&venue).unwrap(), 3);
    assert_eq!(backend.count(&venue).unwrap(), 0);
    assert_eq!(backend.count(&EntityType::new("user")).unwrap(), 1);
}

// ── Per-backend runs ─────────────────────────────────────────────

#[test]
fn relational_conformance() {
    let backend = RelationalBackend::open_in_memory().unwrap();
    assert_eq!(backend.kind(), BackendKind::Relational);
    conformance(&backend);
}

#[test]
fn flat_file_conformance() {
    let dir = TempDir::new().unwrap();
    let backend = FlatFileBackend::open(dir.path().join("store")).unwrap();
    assert_eq!(backend.kind(), BackendKind::FlatFile);
    conformance(&backend);
}

#[test]
fn memory_conformance() {
    let backend = MemoryBackend::new();
    assert_eq!(backend.kind(), BackendKind::Memory);
    conformance(&backend);
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn relational_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("box.db");
    {
        let backend = RelationalBackend::open(&path).unwrap();
        prepared(&backend);
        backend.upsert(&Record::new("venue", 7, json!({"name": "Seven"}))).unwrap();
    }
    let backend = RelationalBackend::open(&path).unwrap();
    prepared(&backend);
    let found = backend.fetch(&EntityType::new("venue"), &Identity::Int(7)).unwrap();
    assert_eq!(found.unwrap().get_str("/name"), Some("Seven"));
}

#[test]
fn flat_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let backend = FlatFileBackend::open(dir.path()).unwrap();
        prepared(&backend);
        backend
            .upsert(&Record::new("user", "u-1", json!({"email": "x@y.z", "tags": ["a", "b"]})))
            .unwrap();
        backend.upsert(&Record::new("venue", 3, json!({"name": "a, \"quoted\" name"}))).unwrap();
    }
    assert!(dir.path().join("venue.csv").exists());

    let backend = FlatFileBackend::open(dir.path()).unwrap();
    let user = backend
        .fetch(&EntityType::new("user"), &Identity::from("u-1"))
        .unwrap()
        .unwrap();
    assert_eq!(user.data, json!({"email": "x@y.z", "tags": ["a", "b"]}));
    let venue = backend.fetch(&EntityType::new("venue"), &Identity::Int(3)).unwrap().unwrap();
    assert_eq!(venue.get_str("/name"), Some("a, \"quoted\" name"));
}

#[test]
fn numeric_looking_text_identity_stays_text() {
    let dir = TempDir::new().unwrap();
    let backend = FlatFileBackend::open(dir.path()).unwrap();
    prepared(&backend);
    let id = Identity::Text("42".into());
    backend.upsert(&Record::new("user", id.clone(), json!({}))).unwrap();
    let all = backend.fetch_all(&EntityType::new("user")).unwrap();
    assert_eq!(all[0].id, id);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn rejects_unsafe_type_names() {
    let backend = RelationalBackend::open_in_memory().unwrap();
    let err = backend
        .ensure_type(&EntitySchema::new("venue; DROP TABLE x", IdStrategy::Sequence))
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));

    let dir = TempDir::new().unwrap();
    let flat = FlatFileBackend::open(dir.path()).unwrap();
    let err = flat
        .fetch_all(&EntityType::new("../escape"))
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
}

#[test]
fn backend_kind_parses_aliases() {
    assert_eq!("relational".parse::<BackendKind>().unwrap(), BackendKind::Relational);
    assert_eq!("sqlite".parse::<BackendKind>().unwrap(), BackendKind::Relational);
    assert_eq!("flat-file".parse::<BackendKind>().unwrap(), BackendKind::FlatFile);
    assert_eq!("csv".parse::<BackendKind>().unwrap(), BackendKind::FlatFile);
    assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
    assert!("postgres".parse::<BackendKind>().is_err());
    assert_eq!(BackendKind::FlatFile.to_string(), BackendKind::FlatFile.as_str());
}

// ── Sequence exhaustion ──────────────────────────────────────────

fn exhaust(backend: &dyn StoreBackend) -> StorageError {
    prepared(backend);
    backend
        .upsert(&Record::new("venue", i64::MAX, json!({"name": "Last"})))
        .unwrap();
    backend
        .insert_generated(&venue_schema(), draft("Overflow"))
        .unwrap_err()
}

#[test]
fn flat_file_sequence_exhaustion_is_an_error() {
    let dir = TempDir::new().unwrap();
    let backend = FlatFileBackend::open(dir.path()).unwrap();
    assert!(matches!(exhaust(&backend), StorageError::InvalidData(_)));
    assert_eq!(backend.count(&EntityType::new("venue")).unwrap(), 1);
}

#[test]
fn memory_sequence_exhaustion_is_an_error() {
    let backend = MemoryBackend::new();
    assert!(matches!(exhaust(&backend), StorageError::InvalidData(_)));
    assert_eq!(backend.count(&EntityType::new("venue")).unwrap(), 1);
}

#[test]
fn relational_sequence_exhaustion_is_an_error() {
    let backend = RelationalBackend::open_in_memory().unwrap();
    assert!(matches!(exhaust(&backend), StorageError::Database(_)));
    assert_eq!(backend.count(&EntityType::new("venue")).unwrap(), 1);
}
