use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;

fn recording_listener(log: Arc<Mutex<Vec<usize>>>, id: usize) -> Listener {
    Arc::new(move |_args| log.lock().unwrap().push(id))
}

#[test]
fn test_dispatch_runs_listeners_in_registration_order() {
    let emitter = MemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    emitter.subscribe("on", "event", recording_listener(log.clone(), 1), &[]);
    emitter.subscribe("on", "event", recording_listener(log.clone(), 2), &[]);

    assert_eq!(emitter.dispatch("emit", "event", &[json!("payload")]), 2);
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_unsubscribe_removes_by_identity_only() {
    let emitter = MemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let keep = recording_listener(log.clone(), 1);
    let gone = recording_listener(log.clone(), 2);

    emitter.subscribe("on", "event", keep, &[]);
    emitter.subscribe("on", "event", gone.clone(), &[]);
    emitter.unsubscribe("off", "event", &gone, &[]);

    assert_eq!(emitter.listener_count("event"), 1);
    emitter.dispatch("emit", "event", &[]);
    assert_eq!(*log.lock().unwrap(), vec![1]);
}

#[test]
fn test_unsubscribe_of_unknown_listener_is_a_noop() {
    let emitter = MemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let registered = recording_listener(log.clone(), 1);
    let stranger = recording_listener(log, 2);

    emitter.subscribe("on", "event", registered, &[]);
    emitter.unsubscribe("off", "event", &stranger, &[]);
    assert_eq!(emitter.listener_count("event"), 1);

    // Also fine on a name that was never subscribed at all.
    emitter.unsubscribe("off", "ghost", &stranger, &[]);
    assert_eq!(emitter.listener_count("ghost"), 0);
}

#[test]
fn test_emptied_event_name_is_dropped() {
    let emitter = MemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let listener = recording_listener(log, 1);

    emitter.subscribe("on", "event", listener.clone(), &[]);
    assert_eq!(emitter.event_names(), vec!["event".to_string()]);

    emitter.unsubscribe("off", "event", &listener, &[]);
    assert!(emitter.event_names().is_empty());
}

#[test]
fn test_listener_may_unsubscribe_during_dispatch() {
    let emitter = Arc::new(MemoryEmitter::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let victim = recording_listener(log.clone(), 2);

    let remover: Listener = {
        let emitter = emitter.clone();
        let victim = victim.clone();
        let log = log.clone();
        Arc::new(move |_args| {
            log.lock().unwrap().push(1);
            emitter.unsubscribe("off", "event", &victim, &[]);
        })
    };

    emitter.subscribe("on", "event", remover, &[]);
    emitter.subscribe("on", "event", victim, &[]);

    // The snapshot taken before delivery still includes the victim.
    assert_eq!(emitter.dispatch("emit", "event", &[]), 2);
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);

    // Gone on the next round.
    assert_eq!(emitter.dispatch("emit", "event", &[]), 1);
}

#[test]
fn test_answers_to_configured_method_names() {
    let emitter = MemoryEmitter::new();
    assert!(emitter.has_method("on"));
    assert!(emitter.has_method("addListener"));
    assert!(emitter.has_method("off"));
    assert!(emitter.has_method("removeListener"));
    assert!(emitter.has_method("emit"));
    assert!(!emitter.has_method("subscribe"));

    let custom = MemoryEmitter::with_method_names(&["attach"], &["detach"], &["fire"]);
    assert!(custom.has_method("attach"));
    assert!(custom.has_method("fire"));
    assert!(!custom.has_method("on"));
}
