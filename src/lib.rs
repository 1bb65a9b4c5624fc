//! event-bridge: await callback-style events as futures.
//!
//! Adapts an event source exposing `on`/`off`/`emit`-like methods (under
//! possibly varying names) into a future-based subscription API: await the
//! next occurrence of one or more named events, classify names as success
//! or failure, and tear a pending subscription down before it fires.
//!
//! The core is the bridging bookkeeping:
//! - exactly one underlying listener per pending event name;
//! - idempotent registration: duplicate waits share one listener and one
//!   shared future;
//! - guaranteed listener teardown on settlement or cancellation;
//! - composition of single waits into a success/fail race and a
//!   wait-for-all barrier.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use event_bridge::{EventBridge, MemoryEmitter};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), event_bridge::AdapterError> {
//! let bridge = EventBridge::new(Arc::new(MemoryEmitter::new()))?;
//!
//! let ready = bridge.wait_once("ready", &[]);
//! bridge.dispatch("ready", &[json!(42)]);
//! assert_eq!(ready.await, Ok(vec![json!(42)]));
//! # Ok(())
//! # }
//! ```
//!
//! Method names are resolved once, at construction: each role (subscribe,
//! unsubscribe, dispatch) probes an ordered candidate list on the source,
//! or takes an explicit per-role override. Construction fails with
//! [`AdapterError`] when a role has no usable name.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod bridge;
pub mod error;
pub mod source;

pub use adapter::{Adapter, BridgeOptions, MethodCandidates, Role};
pub use bridge::{race_once, CancelOptions, EventBridge, WaitFuture, WaitOutcome};
pub use error::{AdapterError, Rejection};
pub use source::{EventArgs, EventSource, Listener, MemoryEmitter};
