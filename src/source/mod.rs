//! The consumed interface of an underlying callback-style event source,
//! plus an in-memory implementation for tests and local wiring.

use std::sync::Arc;

use serde_json::Value;

pub mod memory;

pub use memory::MemoryEmitter;

/// Ordered argument sequence delivered with an event.
pub type EventArgs = Vec<Value>;

/// Listener installed on an event source.
///
/// Identity matters: [`EventSource::unsubscribe`] removes by `Arc` pointer
/// equality, never by value.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Duck-typed capability set of an underlying emitter.
///
/// The bridge never assumes fixed method names. Construction probes
/// [`has_method`](EventSource::has_method) with candidate names per role,
/// and every later call carries the resolved name, so a source that answers
/// to several spellings can honor whichever one was chosen.
///
/// These methods have no error channel: a panicking implementation
/// propagates synchronously to whichever bridge method made the call. The
/// bridge does not catch, swallow, or retry.
pub trait EventSource: Send + Sync {
    /// Whether the source answers to `method`.
    fn has_method(&self, method: &str) -> bool;

    /// Register `listener` for `event`. The `extra` args are forwarded
    /// verbatim from the bridge caller (listener options and the like).
    fn subscribe(&self, method: &str, event: &str, listener: Listener, extra: &[Value]);

    /// Remove a previously registered `listener` from `event`. Must be a
    /// no-op, not an error, when the listener was never registered or was
    /// already removed.
    fn unsubscribe(&self, method: &str, event: &str, listener: &Listener, extra: &[Value]);

    /// Deliver `event` with `args` to every registered listener, in
    /// registration order. Returns the number of listeners invoked.
    fn dispatch(&self, method: &str, event: &str, args: &[Value]) -> usize;
}

#[cfg(test)]
mod tests;
