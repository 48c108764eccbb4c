use boxoffice_storage::LoadingContext;
use boxoffice_types::EntityKey;
use std::sync::{mpsc, Arc};
use std::thread;

#[test]
fn start_and_finish() {
    let ctx = LoadingContext::new();
    let key = EntityKey::new("venue", 1);

    assert!(!ctx.is_loading(&key));
    assert!(ctx.start_loading(&key));
    assert!(ctx.is_loading(&key));
    ctx.finish_loading(&key);
    assert!(!ctx.is_loading(&key));
}

#[test]
fn start_twice_reports_reentry() {
    let ctx = LoadingContext::new();
    let key = EntityKey::new("venue", 1);
    assert!(ctx.start_loading(&key));
    assert!(!ctx.start_loading(&key));
    ctx.finish_loading(&key);
    assert!(!ctx.is_loading(&key));
}

#[test]
fn finish_without_start_is_noop() {
    let ctx = LoadingContext::new();
    ctx.finish_loading(&EntityKey::new("venue", 1));
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn keys_are_independent() {
    let ctx = LoadingContext::new();
    let a = EntityKey::new("venue", 1);
    let b = EntityKey::new("venue_manager", 1);
    ctx.start_loading(&a);
    assert!(!ctx.is_loading(&b));
    ctx.start_loading(&b);
    assert_eq!(ctx.depth(), 2);
    ctx.finish_loading(&a);
    assert!(ctx.is_loading(&b));
}

#[test]
fn guard_clears_on_drop() {
    let ctx = LoadingContext::new();
    let key = EntityKey::new("venue", 1);
    {
        let guard = ctx.enter(&key).unwrap();
        assert_eq!(guard.key(), &key);
        assert!(ctx.is_loading(&key));
        assert!(ctx.enter(&key).is_none());
    }
    assert!(!ctx.is_loading(&key));
}

#[test]
fn guard_clears_on_panic() {
    let ctx = LoadingContext::new();
    let key = EntityKey::new("venue", 1);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = ctx.enter(&key).unwrap();
        panic!("hydration blew up");
    }));

    assert!(result.is_err());
    assert!(!ctx.is_loading(&key));
}

#[test]
fn other_threads_do_not_see_the_guard() {
    let ctx = Arc::new(LoadingContext::new());
    let key = EntityKey::new("venue", 1);
    let _guard = ctx.enter(&key).unwrap();

    let (tx, rx) = mpsc::channel();
    let remote = ctx.clone();
    let remote_key = key.clone();
    thread::spawn(move || {
        let seen = remote.is_loading(&remote_key);
        let entered = remote.enter(&remote_key).is_some();
        tx.send((seen, entered)).unwrap();
    })
    .join()
    .unwrap();

    let (seen, entered) = rx.recv().unwrap();
    assert!(!seen);
    assert!(entered);
    assert!(ctx.is_loading(&key));
}
