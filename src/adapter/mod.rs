//! Role resolution: mapping the subscribe/unsubscribe/dispatch roles onto
//! the method names an event source actually answers to.
//!
//! Resolution happens exactly once, at bridge construction, and fails
//! loudly when a role has no usable name; there is no silent fallback to
//! an unintended method. The resolved [`Adapter`] is immutable for the life
//! of the bridge that owns it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::AdapterError;
use crate::source::{EventSource, Listener};

/// The three roles the bridge needs from an event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// Register a listener for an event name.
    Subscribe,
    /// Remove a previously registered listener.
    Unsubscribe,
    /// Deliver an event to registered listeners.
    Dispatch,
}

impl Role {
    /// Role word used in candidate tables and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Subscribe => "subscribe",
            Role::Unsubscribe => "unsubscribe",
            Role::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered candidate method names per role, probed at construction for
/// roles without an explicit override. Earlier names win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCandidates {
    /// Names meaning "register a listener", in priority order.
    pub subscribe: Vec<String>,
    /// Names meaning "remove a listener", in priority order.
    pub unsubscribe: Vec<String>,
    /// Names meaning "deliver an event", in priority order.
    pub dispatch: Vec<String>,
}

impl Default for MethodCandidates {
    fn default() -> Self {
        Self {
            subscribe: owned(&["on", "addListener", "addEventListener", "subscribe"]),
            unsubscribe: owned(&["off", "removeListener", "removeEventListener", "unsubscribe"]),
            dispatch: owned(&["emit", "dispatchEvent", "trigger", "publish"]),
        }
    }
}

impl MethodCandidates {
    /// Candidate list for one role.
    #[must_use]
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Subscribe => &self.subscribe,
            Role::Unsubscribe => &self.unsubscribe,
            Role::Dispatch => &self.dispatch,
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// Construction-time configuration: per-role method-name overrides plus the
/// candidate table used for roles without an override.
#[derive(Debug, Clone, Default)]
pub struct BridgeOptions {
    /// Use exactly this method name for the subscribe role.
    pub subscribe: Option<String>,
    /// Use exactly this method name for the unsubscribe role.
    pub unsubscribe: Option<String>,
    /// Use exactly this method name for the dispatch role.
    pub dispatch: Option<String>,
    /// Probed in priority order for roles without an override.
    pub candidates: MethodCandidates,
}

impl BridgeOptions {
    fn override_for(&self, role: Role) -> Option<&str> {
        match role {
            Role::Subscribe => self.subscribe.as_deref(),
            Role::Unsubscribe => self.unsubscribe.as_deref(),
            Role::Dispatch => self.dispatch.as_deref(),
        }
    }
}

/// The resolved triple: an event source plus one chosen method name per
/// role, bound together for the life of a bridge.
pub struct Adapter {
    source: Arc<dyn EventSource>,
    subscribe_name: String,
    unsubscribe_name: String,
    dispatch_name: String,
}

impl Adapter {
    /// Resolve all three roles against `source`.
    ///
    /// Overrides are validated against the source, not trusted: an override
    /// naming a method the source does not answer to fails the same way a
    /// fully missing role does.
    pub fn resolve(
        source: Arc<dyn EventSource>,
        options: &BridgeOptions,
    ) -> Result<Self, AdapterError> {
        let subscribe_name = resolve_role(source.as_ref(), Role::Subscribe, options)?;
        let unsubscribe_name = resolve_role(source.as_ref(), Role::Unsubscribe, options)?;
        let dispatch_name = resolve_role(source.as_ref(), Role::Dispatch, options)?;
        debug!(
            subscribe = %subscribe_name,
            unsubscribe = %unsubscribe_name,
            dispatch = %dispatch_name,
            "resolved event source adapter"
        );
        Ok(Self {
            source,
            subscribe_name,
            unsubscribe_name,
            dispatch_name,
        })
    }

    /// The method name resolved for `role`.
    #[must_use]
    pub fn method_name(&self, role: Role) -> &str {
        match role {
            Role::Subscribe => &self.subscribe_name,
            Role::Unsubscribe => &self.unsubscribe_name,
            Role::Dispatch => &self.dispatch_name,
        }
    }

    pub(crate) fn subscribe(&self, event: &str, listener: Listener, extra: &[Value]) {
        self.source.subscribe(&self.subscribe_name, event, listener, extra);
    }

    pub(crate) fn unsubscribe(&self, event: &str, listener: &Listener, extra: &[Value]) {
        self.source.unsubscribe(&self.unsubscribe_name, event, listener, extra);
    }

    pub(crate) fn dispatch(&self, event: &str, args: &[Value]) -> usize {
        self.source.dispatch(&self.dispatch_name, event, args)
    }
}

// Manual impl: the trait object behind `source` has no Debug, and the
// resolved names are the part worth printing anyway.
impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("subscribe", &self.subscribe_name)
            .field("unsubscribe", &self.unsubscribe_name)
            .field("dispatch", &self.dispatch_name)
            .finish_non_exhaustive()
    }
}

fn resolve_role(
    source: &dyn EventSource,
    role: Role,
    options: &BridgeOptions,
) -> Result<String, AdapterError> {
    if let Some(name) = options.override_for(role) {
        if source.has_method(name) {
            return Ok(name.to_string());
        }
        return Err(AdapterError::MissingMethod {
            role,
            tried: vec![name.to_string()],
        });
    }
    let candidates = options.candidates.for_role(role);
    candidates
        .iter()
        .find(|name| source.has_method(name))
        .cloned()
        .ok_or_else(|| AdapterError::MissingMethod {
            role,
            tried: candidates.to_vec(),
        })
}
