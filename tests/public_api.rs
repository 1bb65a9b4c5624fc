//! Integration tests driving the bridge through its public surface only,
//! the way an embedding application would: resolve a source, await
//! connection-style events, and compose races and barriers.

use std::sync::Arc;

use serde_json::json;

use event_bridge::{
    race_once, BridgeOptions, CancelOptions, EventBridge, EventSource, MemoryEmitter,
};

#[tokio::test]
async fn test_connect_flow_resolves_before_error() {
    let source = Arc::new(MemoryEmitter::new());
    let bridge = EventBridge::new(source.clone()).unwrap();

    let connected = bridge.race(&["connect", "reconnect"], &["error", "close"]);
    bridge.dispatch("connect", &[json!({"session": "abc"})]);

    assert_eq!(connected.await, Ok(vec![json!({"session": "abc"})]));

    // No listener from the race survives, success or failure side.
    assert!(source.event_names().is_empty());
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_startup_barrier_then_shutdown_race() {
    let source = Arc::new(MemoryEmitter::new());
    let bridge = EventBridge::new(source.clone()).unwrap();

    let ready = bridge.all(&["db", "cache", "listener"]);
    bridge.dispatch("db", &[json!("postgres")]);
    bridge.dispatch("cache", &[json!("redis")]);
    bridge.dispatch("listener", &[json!(8080)]);

    assert_eq!(
        ready.await,
        Ok(vec![
            vec![json!("postgres")],
            vec![json!("redis")],
            vec![json!(8080)],
        ])
    );

    let done = bridge.race(&["shutdown"], &["panic"]);
    bridge.dispatch("shutdown", &[]);
    assert_eq!(done.await, Ok(vec![]));
}

#[tokio::test]
async fn test_unconventional_source_via_overrides() {
    // A source whose vocabulary matches none of the default subscribe
    // candidates until the fallback names, plus an explicit dispatch name.
    let source = Arc::new(MemoryEmitter::with_method_names(
        &["addEventListener"],
        &["removeEventListener"],
        &["trigger", "emit"],
    ));
    let options = BridgeOptions {
        dispatch: Some("trigger".to_string()),
        ..BridgeOptions::default()
    };
    let bridge = EventBridge::with_options(source.clone(), options).unwrap();

    let wait = bridge.wait_once("tick", &[]);
    assert_eq!(bridge.dispatch("tick", &[json!(1)]), 1);
    assert_eq!(wait.await, Ok(vec![json!(1)]));
}

#[tokio::test]
async fn test_fire_and_forget_subscription() {
    let source = Arc::new(MemoryEmitter::new());
    let outcome = race_once(
        source.clone(),
        &["done"],
        &["failed"],
        BridgeOptions::default(),
    )
    .unwrap();

    // Only the race future keeps the throwaway bridge alive.
    source.dispatch("emit", "failed", &[json!("disk full")]);
    let rejection = outcome.await.unwrap_err();
    assert_eq!(rejection.event, "failed");
    assert_eq!(rejection.args, vec![json!("disk full")]);
    assert!(source.event_names().is_empty());
}

#[tokio::test]
async fn test_caller_driven_timeout_layered_on_race() {
    // The bridge has no built-in timeouts; callers layer one with a plain
    // select against a timer, then cancel the abandoned wait themselves.
    let source = Arc::new(MemoryEmitter::new());
    let bridge = EventBridge::new(source.clone()).unwrap();

    let wait = bridge.wait_once("reply", &[]);
    let outcome = tokio::select! {
        outcome = wait => Some(outcome),
        () = tokio::time::sleep(std::time::Duration::from_millis(10)) => None,
    };

    assert!(outcome.is_none());
    assert!(bridge.cancel("reply", CancelOptions::default()));
    assert_eq!(source.listener_count("reply"), 0);
}
