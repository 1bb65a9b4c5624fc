//! Bridging callback-style event delivery into awaitable futures.
//!
//! [`EventBridge`] owns a map from event name to one pending subscription.
//! Per name the lifecycle is `UNSUBSCRIBED -> PENDING -> (SETTLED |
//! CANCELLED) -> UNSUBSCRIBED`, and `PENDING` is the only state with a live
//! listener on the underlying source. The whole correctness contract is:
//! install at most one tracked listener per name, always remove it on settle
//! or cancel.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::adapter::{Adapter, BridgeOptions};
use crate::error::{AdapterError, Rejection};
use crate::source::{EventArgs, EventSource, Listener};


/// Settlement of a single wait: the delivered arguments, or a rejection.
pub type WaitOutcome = Result<EventArgs, Rejection>;

/// Shared future returned by [`EventBridge::wait_once`].
///
/// Duplicate waits on a pending event name hand back clones of the same
/// future (`Shared::ptr_eq`-identical); every clone observes the one
/// settlement.
pub type WaitFuture = Shared<BoxFuture<'static, WaitOutcome>>;

/// How a cancellation behaves.
#[derive(Debug, Clone, Default)]
pub struct CancelOptions {
    /// Extra args forwarded verbatim to the underlying unsubscribe call.
    pub to_source: EventArgs,
    /// When set, the pending wait rejects with these args. When `None`, the
    /// wait is left to never settle.
    pub rejection: Option<EventArgs>,
}

impl CancelOptions {
    /// Cancellation that rejects the pending wait with `args`.
    #[must_use]
    pub fn rejecting(args: EventArgs) -> Self {
        Self {
            to_source: Vec::new(),
            rejection: Some(args),
        }
    }
}

/// Which group a raced name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Success,
    Fail,
}

/// Bookkeeping for one in-flight listener. At most one exists per event
/// name per bridge.
struct PendingWait {
    listener: Listener,
    settle: oneshot::Sender<WaitOutcome>,
    /// Settlement order stamp, written just before the sender fires.
    /// Zero while the wait is still pending.
    stamp: Arc<AtomicU64>,
    future: WaitFuture,
}

struct Inner {
    adapter: Adapter,
    pending: DashMap<String, PendingWait>,
    /// Monotonic settlement counter; stamps start at 1 so 0 means unsettled.
    settle_seq: AtomicU64,
}

impl Inner {
    fn next_stamp(&self) -> u64 {
        self.settle_seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Bridge from a callback-style event source to awaitable one-shot waits.
///
/// Cheap to clone; clones share the pending-subscription map. The
/// underlying source is borrowed, never owned: every settlement or
/// cancellation removes the bridge's listener, so the source is left with
/// no dangling registrations.
#[derive(Clone)]
pub struct EventBridge {
    inner: Arc<Inner>,
}

impl EventBridge {
    /// Bridge `source` using the default candidate method names.
    ///
    /// No listeners are installed yet; they appear on the first wait per
    /// event name.
    pub fn new(source: Arc<dyn EventSource>) -> Result<Self, AdapterError> {
        Self::with_options(source, BridgeOptions::default())
    }

    /// Bridge `source` with per-role name overrides and/or a custom
    /// candidate table. Fails when any role cannot be resolved.
    pub fn with_options(
        source: Arc<dyn EventSource>,
        options: BridgeOptions,
    ) -> Result<Self, AdapterError> {
        let adapter = Adapter::resolve(source, &options)?;
        Ok(Self {
            inner: Arc::new(Inner {
                adapter,
                pending: DashMap::new(),
                settle_seq: AtomicU64::new(0),
            }),
        })
    }

    /// Await the next delivery of `event`.
    ///
    /// The first call for a name installs exactly one one-shot listener,
    /// forwarding `extra` verbatim to the underlying subscribe. On first
    /// invocation the listener removes the bookkeeping entry, unsubscribes
    /// itself from the source, and resolves the shared future with the
    /// delivered arguments; repeat deliveries from the source never
    /// re-settle it. Further calls while the wait is pending return the
    /// same shared future and install nothing.
    ///
    /// Registration is eager: it happens during this call, not at first
    /// poll of the returned future.
    pub fn wait_once(&self, event: &str, extra: &[Value]) -> WaitFuture {
        self.wait_once_tracked(event, extra).0
    }

    /// `wait_once` plus the wait's settlement stamp cell, so compositions
    /// can order settlements by when they actually happened rather than by
    /// poll order.
    fn wait_once_tracked(&self, event: &str, extra: &[Value]) -> (WaitFuture, Arc<AtomicU64>) {
        let (future, stamp, installed) = match self.inner.pending.entry(event.to_string()) {
            Entry::Occupied(entry) => {
                (entry.get().future.clone(), entry.get().stamp.clone(), None)
            }
            Entry::Vacant(slot) => {
                let (settle, rx) = oneshot::channel::<WaitOutcome>();
                let future: WaitFuture = async move {
                    match rx.await {
                        Ok(outcome) => outcome,
                        // Cancelled without a verdict: stay pending forever.
                        Err(_) => future::pending().await,
                    }
                }
                .boxed()
                .shared();
                let stamp = Arc::new(AtomicU64::new(0));
                let listener = one_shot_listener(Arc::downgrade(&self.inner), event.to_string());
                slot.insert(PendingWait {
                    listener: listener.clone(),
                    settle,
                    stamp: stamp.clone(),
                    future: future.clone(),
                });
                (future, stamp, Some(listener))
            }
        };
        if let Some(listener) = installed {
            debug!(event, "installing one-shot listener");
            self.inner.adapter.subscribe(event, listener, extra);
        }
        (future, stamp)
    }

    /// Remove the pending subscription for `event`, if any.
    ///
    /// The underlying unsubscribe is forwarded either way: with the tracked
    /// listener when one exists, or with a fresh no-op listener when none
    /// does, so the source always sees the removal attempt. Returns whether
    /// a pending subscription was actually torn down.
    ///
    /// Cancellation is synchronous: the listener is gone from the source
    /// before this returns.
    pub fn cancel(&self, event: &str, options: CancelOptions) -> bool {
        match self.inner.pending.remove(event) {
            Some((_, wait)) => {
                debug!(
                    event,
                    rejecting = options.rejection.is_some(),
                    "cancelling pending wait"
                );
                self.inner.adapter.unsubscribe(event, &wait.listener, &options.to_source);
                if let Some(args) = options.rejection {
                    wait.stamp.store(self.inner.next_stamp(), Ordering::SeqCst);
                    let _ = wait.settle.send(Err(Rejection {
                        event: event.to_string(),
                        args,
                    }));
                }
                true
            }
            None => {
                let noop: Listener = Arc::new(|_| {});
                self.inner.adapter.unsubscribe(event, &noop, &options.to_source);
                false
            }
        }
    }

    /// Forward a dispatch through the adapter.
    ///
    /// Bridge state is untouched; bridge-installed listeners react through
    /// the source's own delivery. Returns the source's listener count for
    /// the dispatch.
    pub fn dispatch(&self, event: &str, args: &[Value]) -> usize {
        self.inner.adapter.dispatch(event, args)
    }

    /// Race the `success` names against the `fail` names.
    ///
    /// Every name is waited on immediately, before the returned future is
    /// first polled. Whichever name fires first decides the outcome: a
    /// success name resolves with its arguments, a fail name rejects with
    /// them. Settlement order is what counts, not poll order; events that
    /// fire before the race future is first polled are still ranked by
    /// their settlement stamps. The losing names are then cancelled so no
    /// orphan listeners remain on the source. An empty combined set never
    /// settles.
    pub fn race(
        &self,
        success: &[&str],
        fail: &[&str],
    ) -> impl Future<Output = WaitOutcome> + Send + 'static {
        let entries: Vec<(String, Group)> = success
            .iter()
            .map(|name| ((*name).to_string(), Group::Success))
            .chain(fail.iter().map(|name| ((*name).to_string(), Group::Fail)))
            .collect();
        let waits: Vec<BoxFuture<'static, (u64, String, Group, WaitOutcome)>> = entries
            .iter()
            .map(|(name, group)| {
                let (wait, stamp) = self.wait_once_tracked(name, &[]);
                let name = name.clone();
                let group = *group;
                async move {
                    let outcome = wait.await;
                    // The stamp is written before the settlement is sent, so
                    // it is final by the time the shared future is ready.
                    (stamp.load(Ordering::SeqCst), name, group, outcome)
                }
                .boxed()
            })
            .collect();
        let bridge = self.clone();
        async move {
            if waits.is_empty() {
                return future::pending().await;
            }
            let (first, _, rest) = future::select_all(waits).await;
            // Several waits may already be settled by the time we are first
            // polled; the earliest settlement wins, not the first polled.
            let mut best = first;
            for wait in rest {
                if let Some(settled) = wait.now_or_never() {
                    if settled.0 < best.0 {
                        best = settled;
                    }
                }
            }
            let (_, winner, group, outcome) = best;
            trace!(winner = %winner, "race settled, cancelling remaining waits");
            for (name, _) in &entries {
                if *name != winner {
                    bridge.cancel(name, CancelOptions::default());
                }
            }
            match (group, outcome) {
                (Group::Success, outcome) => outcome,
                (Group::Fail, Ok(args)) => Err(Rejection {
                    event: winner,
                    args,
                }),
                (Group::Fail, Err(rejection)) => Err(rejection),
            }
        }
    }

    /// Wait for every name to fire at least once.
    ///
    /// Resolves with each event's arguments in `names` order. The first
    /// rejection rejects the aggregate immediately and deliberately leaves
    /// the remaining waits installed — unlike [`race`](Self::race), there is
    /// no implicit cleanup, so the caller can still inspect or cancel them.
    pub fn all(
        &self,
        names: &[&str],
    ) -> impl Future<Output = Result<Vec<EventArgs>, Rejection>> + Send + 'static {
        let waits: Vec<WaitFuture> = names.iter().map(|name| self.wait_once(name, &[])).collect();
        future::try_join_all(waits)
    }

    /// Whether `event` currently has a pending subscription.
    #[must_use]
    pub fn is_pending(&self, event: &str) -> bool {
        self.inner.pending.contains_key(event)
    }

    /// Number of event names with a pending subscription.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }
}

/// Build the listener installed for one wait. One-shot: the first delivery
/// tears the bookkeeping down before settling, so the source is already
/// clean when the waiter resumes. A delivery arriving after settle or
/// cancel finds no entry and does nothing.
fn one_shot_listener(inner: Weak<Inner>, event: String) -> Listener {
    Arc::new(move |args: &[Value]| {
        let Some(inner) = inner.upgrade() else { return };
        let Some((_, wait)) = inner.pending.remove(&event) else { return };
        inner.adapter.unsubscribe(&event, &wait.listener, &[]);
        trace!(event = %event, args = args.len(), "settling wait with delivered arguments");
        wait.stamp.store(inner.next_stamp(), Ordering::SeqCst);
        let _ = wait.settle.send(Ok(args.to_vec()));
    })
}

/// One-shot convenience: build a bridge over `source` and immediately race
/// `success` against `fail`.
///
/// The bridge lives inside the returned future, so this suits
/// fire-and-forget subscriptions where no bridge handle is kept around.
pub fn race_once(
    source: Arc<dyn EventSource>,
    success: &[&str],
    fail: &[&str],
    options: BridgeOptions,
) -> Result<impl Future<Output = WaitOutcome> + Send + 'static, AdapterError> {
    let bridge = EventBridge::with_options(source, options)?;
    Ok(bridge.race(success, fail))
}
