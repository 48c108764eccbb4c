use boxoffice_model::Record;
use boxoffice_storage::{MutationObserver, ObserverRegistry, ObserverResult, RecordEvent};
use boxoffice_types::{MutationEvent, MutationOp};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(MutationOp, String)>>,
}

impl MutationObserver for Recorder {
    fn on_mutation(&self, event: &RecordEvent) -> ObserverResult {
        self.seen.lock().unwrap().push((event.op, event.id.to_string()));
        Ok(())
    }
}

struct Failing;

impl MutationObserver for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_mutation(&self, _event: &RecordEvent) -> ObserverResult {
        Err("target store is offline".into())
    }
}

struct Panicking;

impl MutationObserver for Panicking {
    fn on_mutation(&self, _event: &RecordEvent) -> ObserverResult {
        panic!("observer bug");
    }
}

/// Registers another observer on the registry it is delivered from.
struct SelfExtending {
    registry: Arc<ObserverRegistry>,
    added: Arc<Recorder>,
    calls: AtomicUsize,
}

impl MutationObserver for SelfExtending {
    fn on_mutation(&self, _event: &RecordEvent) -> ObserverResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.registry.add(self.added.clone());
        Ok(())
    }
}

fn event() -> RecordEvent {
    MutationEvent::insert("venue", 1, Record::new("venue", 1, json!({"name": "Hall"})))
}

#[test]
fn add_ignores_duplicates() {
    let registry = ObserverRegistry::new();
    let observer: Arc<dyn MutationObserver> = Arc::new(Recorder::default());
    assert!(registry.add(observer.clone()));
    assert!(!registry.add(observer.clone()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn remove_is_idempotent() {
    let registry = ObserverRegistry::new();
    let observer: Arc<dyn MutationObserver> = Arc::new(Recorder::default());
    registry.add(observer.clone());
    assert!(registry.remove(&observer));
    assert!(!registry.remove(&observer));
    assert!(registry.is_empty());
}

#[test]
fn notify_reaches_every_observer() {
    let registry = ObserverRegistry::new();
    let a = Arc::new(Recorder::default());
    let b = Arc::new(Recorder::default());
    registry.add(a.clone());
    registry.add(b.clone());

    let delivery = registry.notify(&event());
    assert_eq!(delivery.delivered, 2);
    assert_eq!(delivery.failed, 0);
    assert_eq!(a.seen.lock().unwrap().len(), 1);
    assert_eq!(b.seen.lock().unwrap()[0], (MutationOp::Insert, "1".to_string()));
}

#[test]
fn failing_observer_does_not_block_others() {
    let registry = ObserverRegistry::new();
    let after = Arc::new(Recorder::default());
    registry.add(Arc::new(Failing));
    registry.add(after.clone());

    let delivery = registry.notify(&event());
    assert_eq!(delivery.failed, 1);
    assert_eq!(delivery.delivered, 1);
    assert_eq!(after.seen.lock().unwrap().len(), 1);
}

#[test]
fn panicking_observer_does_not_block_others() {
    let registry = ObserverRegistry::new();
    let after = Arc::new(Recorder::default());
    registry.add(Arc::new(Panicking));
    registry.add(after.clone());

    let delivery = registry.notify(&event());
    assert_eq!(delivery.failed, 1);
    assert_eq!(after.seen.lock().unwrap().len(), 1);
}

#[test]
fn registration_during_delivery_applies_to_next_event() {
    let registry = Arc::new(ObserverRegistry::new());
    let added = Arc::new(Recorder::default());
    let extender = Arc::new(SelfExtending {
        registry: registry.clone(),
        added: added.clone(),
        calls: AtomicUsize::new(0),
    });
    registry.add(extender.clone());

    let first = registry.notify(&event());
    assert_eq!(first.delivered, 1);
    assert!(added.seen.lock().unwrap().is_empty());
    assert_eq!(registry.len(), 2);

    let second = registry.notify(&event());
    assert_eq!(second.delivered, 2);
    assert_eq!(added.seen.lock().unwrap().len(), 1);
    assert_eq!(extender.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn notify_with_no_observers() {
    let registry = ObserverRegistry::new();
    assert_eq!(registry.notify(&event()).delivered, 0);
}
