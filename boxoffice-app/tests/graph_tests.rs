use boxoffice_app::VenueGraph;
use boxoffice_model::Catalog;
use boxoffice_model::types::{USER, VENUE, VENUE_MANAGER};
use boxoffice_storage::{DataStore, GlobalCache, LoadingContext, StorageError};
use boxoffice_types::Identity;
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    graph: VenueGraph,
    loading: Arc<LoadingContext>,
    store: Arc<DataStore>,
}

fn fixture() -> Fixture {
    let cache = Arc::new(GlobalCache::new());
    let store = Arc::new(DataStore::open_relational_in_memory(&Catalog::booking(), cache).unwrap());
    let loading = Arc::new(LoadingContext::new());
    Fixture {
        graph: VenueGraph::new(store.clone(), loading.clone()),
        loading,
        store,
    }
}

/// One manager running `count` venues. Returns the manager id and venue ids.
fn managed_venues(store: &DataStore, count: usize) -> (Identity, Vec<Identity>) {
    let user = store.require(USER).unwrap().insert(json!({"email": "m@x.io"})).unwrap();
    let manager = store
        .require(VENUE_MANAGER)
        .unwrap()
        .insert(json!({"user_id": user.id.to_string()}))
        .unwrap();
    let venues = (0..count)
        .map(|i| {
            store
                .require(VENUE)
                .unwrap()
                .insert(json!({"name": format!("Hall {i}"), "manager_id": manager.id.as_int()}))
                .unwrap()
                .id
        })
        .collect();
    (manager.id, venues)
}

#[test]
fn venue_with_manager_terminates() {
    let f = fixture();
    let (manager_id, venue_ids) = managed_venues(&f.store, 1);

    let venue = f.graph.load_venue(&venue_ids[0]).unwrap();
    assert!(!venue.partial);
    assert_eq!(venue.name, "Hall 0");

    let manager = venue.manager.as_ref().unwrap();
    assert_eq!(manager.id, manager_id);
    assert!(!manager.partial);
    assert_eq!(manager.venues.len(), 1);

    // The cycle partner comes back without its relations.
    let back = &manager.venues[0];
    assert_eq!(back.id, venue.id);
    assert!(back.partial);
    assert!(back.manager.is_none());
    assert_eq!(f.loading.depth(), 0);
}

#[test]
fn manager_with_several_venues() {
    let f = fixture();
    let (manager_id, venue_ids) = managed_venues(&f.store, 3);

    let manager = f.graph.load_manager(&manager_id).unwrap();
    assert!(!manager.partial);
    assert!(manager.user_id.is_some());
    let ids: Vec<_> = manager.venues.iter().map(|v| v.id.clone()).collect();
    assert_eq!(ids, venue_ids);

    // Each venue resolves its manager, which is the partial cycle partner.
    for venue in &manager.venues {
        assert!(!venue.partial);
        let partner = venue.manager.as_ref().unwrap();
        assert_eq!(partner.id, manager_id);
        assert!(partner.partial);
        assert!(partner.venues.is_empty());
    }
}

#[test]
fn venue_without_manager() {
    let f = fixture();
    let venue = f.store.require(VENUE).unwrap().insert(json!({"name": "Solo"})).unwrap();
    let loaded = f.graph.load_venue(&venue.id).unwrap();
    assert!(loaded.manager.is_none());
    assert!(!loaded.partial);
}

#[test]
fn missing_manager_is_a_hydration_error() {
    let f = fixture();
    let venue = f
        .store
        .require(VENUE)
        .unwrap()
        .insert(json!({"name": "Orphan", "manager_id": 404}))
        .unwrap();

    let err = f.graph.load_venue(&venue.id).unwrap_err();
    assert!(matches!(err, StorageError::Hydration(_)));
    assert_eq!(f.loading.depth(), 0);
}

#[test]
fn missing_venue_is_not_found() {
    let f = fixture();
    let err = f.graph.load_venue(&Identity::Int(1)).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn repeated_loads_give_the_same_graph() {
    let f = fixture();
    let (_, venue_ids) = managed_venues(&f.store, 2);
    let first = f.graph.load_venue(&venue_ids[1]).unwrap();
    let second = f.graph.load_venue(&venue_ids[1]).unwrap();
    assert_eq!(first, second);
}
