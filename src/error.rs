//! Error and rejection types for the event bridge.
//!
//! Two different kinds of "failure" flow through this crate and they are
//! deliberately distinct types: [`AdapterError`] is a real fault (the bridge
//! could not be constructed), while [`Rejection`] is a signal value carried
//! on the rejected side of a wait outcome. A second wait on an
//! already-pending event name is neither: it is resolved by sharing the
//! existing future, never surfaced as an error.

use serde::Serialize;
use thiserror::Error;

use crate::adapter::Role;
use crate::source::EventArgs;

/// Construction-time failure of adapter resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// No usable method name was found on the event source for a required
    /// role. Resolution fails loudly rather than falling back to an
    /// unintended method.
    #[error("no {role} method on event source (tried: {tried:?})")]
    MissingMethod {
        /// The role that could not be resolved.
        role: Role,
        /// Every method name probed, in priority order.
        tried: Vec<String>,
    },
}

/// Payload carried on the rejected side of a [`WaitOutcome`].
///
/// Produced when a fail-group event wins a race, or when a pending wait is
/// cancelled with an explicit rejection. The arguments are whatever the
/// event delivered (or the cancelling caller supplied) — a signal, not a
/// diagnostic.
///
/// [`WaitOutcome`]: crate::bridge::WaitOutcome
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("event '{event}' signalled failure")]
pub struct Rejection {
    /// The event name that produced the rejection.
    pub event: String,
    /// Delivered (or caller-supplied) arguments.
    pub args: EventArgs,
}
