//! In-memory event source shaped like a classic callback emitter.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use super::{EventSource, Listener};

/// In-process event source for tests, doctests, and local wiring.
///
/// Keeps one listener list per event name in registration order. The
/// method-name aliases it answers to are configurable per role, so adapter
/// resolution can be exercised against sources with unconventional
/// spellings.
pub struct MemoryEmitter {
    subscribe_names: Vec<String>,
    unsubscribe_names: Vec<String>,
    dispatch_names: Vec<String>,
    listeners: DashMap<String, Vec<Listener>>,
}

impl MemoryEmitter {
    /// Emitter answering to the conventional names: `on`/`addListener`,
    /// `off`/`removeListener`, and `emit`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_method_names(&["on", "addListener"], &["off", "removeListener"], &["emit"])
    }

    /// Emitter answering only to the given method names per role.
    #[must_use]
    pub fn with_method_names(subscribe: &[&str], unsubscribe: &[&str], dispatch: &[&str]) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| (*n).to_string()).collect();
        Self {
            subscribe_names: owned(subscribe),
            unsubscribe_names: owned(unsubscribe),
            dispatch_names: owned(dispatch),
            listeners: DashMap::new(),
        }
    }

    /// Number of listeners currently registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |entry| entry.len())
    }

    /// Names of events that currently have at least one listener.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.listeners.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for MemoryEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for MemoryEmitter {
    fn has_method(&self, method: &str) -> bool {
        self.subscribe_names
            .iter()
            .chain(&self.unsubscribe_names)
            .chain(&self.dispatch_names)
            .any(|name| name == method)
    }

    fn subscribe(&self, _method: &str, event: &str, listener: Listener, _extra: &[Value]) {
        self.listeners.entry(event.to_string()).or_default().push(listener);
    }

    fn unsubscribe(&self, _method: &str, event: &str, listener: &Listener, _extra: &[Value]) {
        // Removing an unknown listener is a no-op, matching the contract.
        if let Some(mut entry) = self.listeners.get_mut(event) {
            if let Some(pos) = entry.iter().position(|l| Arc::ptr_eq(l, listener)) {
                entry.remove(pos);
            }
        }
        // Drop emptied names so event_names() reflects live listeners only.
        self.listeners.remove_if(event, |_, list| list.is_empty());
    }

    fn dispatch(&self, _method: &str, event: &str, args: &[Value]) -> usize {
        // Snapshot before invoking so a listener may unsubscribe (itself or
        // another listener) mid-delivery without deadlocking on the map.
        let snapshot: Vec<Listener> = match self.listeners.get(event) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(args);
        }
        snapshot.len()
    }
}
