//! Concurrency policy: one supervised task per event.
//!
//! `dispatch` only spawns and returns. Waiting for an ordering lane or an
//! in-flight permit happens inside the spawned task, so a slow handler never
//! holds up classification of the next update.

use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    courier_common::types::{ConversationId, Event},
    courier_config::{DispatchConfig, OrderingMode},
    futures::FutureExt,
    tokio::{
        sync::{
            Semaphore,
            oneshot::{self, error::TryRecvError},
        },
        task::JoinHandle,
    },
    tokio_util::task::TaskTracker,
    tracing::{debug, error, info, warn},
};

use crate::{error::DispatchError, handlers::HandlerSet, route::Route, transport::Outbound};

/// Lanes are first pruned once this many conversations are tracked.
const LANE_PRUNE_THRESHOLD: usize = 1024;

/// Result of one handling unit: number of actions delivered.
pub type UnitOutcome = Result<usize, DispatchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Deadline for handler plus delivery. `None` lets a stuck unit live forever.
    pub handler_timeout: Option<Duration>,
    /// Cap on units running at once. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    pub ordering: OrderingMode,
}

impl DispatchPolicy {
    /// No deadline, no cap, no ordering.
    pub fn unbounded() -> Self {
        Self {
            handler_timeout: None,
            max_in_flight: None,
            ordering: OrderingMode::Unordered,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = Some(max);
        self
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

/// Zero values are rejected by `courier_config::validate`. A config that skips
/// validation gets no deadline or cap for them rather than one that fails
/// every unit.
impl From<&DispatchConfig> for DispatchPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            handler_timeout: (config.handler_timeout_secs > 0)
                .then(|| Duration::from_secs(config.handler_timeout_secs)),
            max_in_flight: config.max_in_flight.filter(|max| *max > 0),
            ordering: config.ordering,
        }
    }
}

/// Cheap to clone; clones share the same task group and lanes.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    handlers: HandlerSet,
    outbound: Arc<dyn Outbound>,
    policy: DispatchPolicy,
    limiter: Option<Arc<Semaphore>>,
    lanes: Mutex<Lanes>,
    tracker: TaskTracker,
}

/// Per-conversation completion signal of the most recently dispatched unit.
///
/// Finished lanes are swept when the map reaches `prune_at`, which then
/// doubles the surviving size so a busy map is not rescanned on every insert.
struct Lanes {
    tails: HashMap<ConversationId, oneshot::Receiver<()>>,
    prune_at: usize,
}

impl Lanes {
    fn new() -> Self {
        Self {
            tails: HashMap::new(),
            prune_at: LANE_PRUNE_THRESHOLD,
        }
    }

    /// Make `signal` the tail of `source`'s lane, returning the previous tail.
    fn enqueue(
        &mut self,
        source: ConversationId,
        signal: oneshot::Receiver<()>,
    ) -> Option<oneshot::Receiver<()>> {
        if self.tails.len() >= self.prune_at {
            self.tails
                .retain(|_, rx| matches!(rx.try_recv(), Err(TryRecvError::Empty)));
            self.prune_at = (self.tails.len() * 2).max(LANE_PRUNE_THRESHOLD);
        }
        self.tails.insert(source, signal)
    }
}

/// Position in a conversation lane: wait for `previous`, drop `done` when finished.
struct Turn {
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
}

impl Dispatcher {
    pub fn new(handlers: HandlerSet, outbound: Arc<dyn Outbound>, policy: DispatchPolicy) -> Self {
        let missing = handlers.missing_routes();
        if !missing.is_empty() {
            warn!(?missing, "handler set is incomplete, events on these routes will fail");
        }
        let limiter = policy
            .max_in_flight
            .map(|max| Arc::new(Semaphore::new(max)));
        Self {
            inner: Arc::new(Inner {
                handlers,
                outbound,
                policy,
                limiter,
                lanes: Mutex::new(Lanes::new()),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Units spawned and not yet finished, including those still queued.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Start one handling unit for `event` and return immediately.
    ///
    /// The handle may be dropped; the unit keeps running and reports its own
    /// failures.
    pub fn dispatch(&self, event: Event) -> JoinHandle<UnitOutcome> {
        let route = Route::resolve(&event);
        let turn = self.take_turn(&event);
        let inner = Arc::clone(&self.inner);

        self.inner.tracker.spawn(async move {
            let _done = match turn {
                Some(Turn { previous, done }) => {
                    if let Some(previous) = previous {
                        // Err only means the previous unit ended without signalling.
                        let _ = previous.await;
                    }
                    Some(done)
                },
                None => None,
            };
            let _permit = match &inner.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };

            let outcome = inner.run_guarded(&event, route).await;
            report(&event, route, &outcome);
            outcome
        })
    }

    /// Stop accepting the idea of new work and wait up to `grace` for
    /// in-flight units. Returns `false` if some were still running.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let tracker = &self.inner.tracker;
        tracker.close();
        let pending = tracker.len();
        if pending > 0 {
            info!(pending, "waiting for in-flight handlers");
        }
        match tokio::time::timeout(grace, tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    abandoned = tracker.len(),
                    ?grace,
                    "shutdown grace expired with handlers still running"
                );
                false
            },
        }
    }

    fn take_turn(&self, event: &Event) -> Option<Turn> {
        if self.inner.policy.ordering != OrderingMode::PerConversation {
            return None;
        }
        let source = event.source?;
        let (done, signal) = oneshot::channel();
        let previous = self
            .inner
            .lanes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .enqueue(source, signal);
        Some(Turn { previous, done })
    }
}

impl Inner {
    /// Run the unit with panic isolation and the configured deadline.
    async fn run_guarded(&self, event: &Event, route: Option<Route>) -> UnitOutcome {
        let unit = AssertUnwindSafe(self.run_unit(event, route))
            .catch_unwind()
            .map(|result| {
                result.unwrap_or_else(|panic| {
                    Err(DispatchError::Panicked {
                        message: panic_message(panic.as_ref()),
                    })
                })
            });

        match self.policy.handler_timeout {
            Some(limit) => tokio::time::timeout(limit, unit)
                .await
                .unwrap_or(Err(DispatchError::Timeout { after: limit })),
            None => unit.await,
        }
    }

    async fn run_unit(&self, event: &Event, route: Option<Route>) -> UnitOutcome {
        let Some(route) = route else {
            debug!(event_id = %event.id, kind = event.kind.label(), "no conversation to answer, dropping event");
            return Ok(0);
        };
        let handler = self
            .handlers
            .get(route)
            .ok_or(DispatchError::NoHandler { route })?;

        let actions = handler
            .handle(event)
            .await
            .map_err(|source| DispatchError::Handler { route, source })?;
        if actions.is_empty() {
            return Err(DispatchError::EmptyReply { route });
        }

        let total = actions.len();
        for (index, action) in actions.iter().enumerate() {
            self.outbound
                .deliver(action)
                .await
                .map_err(|source| DispatchError::Delivery {
                    action: action.kind.label(),
                    index,
                    total,
                    source,
                })?;
        }
        Ok(total)
    }
}

fn report(event: &Event, route: Option<Route>, outcome: &UnitOutcome) {
    let source = event.source.map(|s| s.0);
    let kind = event.kind.label();
    let route = route.map_or("none", Route::as_str);
    match outcome {
        Ok(delivered) => debug!(
            event_id = %event.id,
            kind,
            ?source,
            route,
            delivered,
            "event handled"
        ),
        Err(error @ DispatchError::Delivery { .. }) => warn!(
            event_id = %event.id,
            kind,
            ?source,
            route,
            %error,
            "action delivery failed"
        ),
        Err(error) => error!(
            event_id = %event.id,
            kind,
            ?source,
            route,
            %error,
            "event handling failed"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_config() {
        let config = DispatchConfig {
            handler_timeout_secs: 5,
            max_in_flight: Some(16),
            ordering: OrderingMode::PerConversation,
            shutdown_grace_secs: 1,
        };
        assert_eq!(
            DispatchPolicy::from(&config),
            DispatchPolicy::unbounded()
                .with_timeout(Duration::from_secs(5))
                .with_max_in_flight(16)
                .with_ordering(OrderingMode::PerConversation)
        );
    }

    #[test]
    fn unvalidated_zero_values_disable_the_limit() {
        let config = DispatchConfig {
            handler_timeout_secs: 0,
            max_in_flight: Some(0),
            ..Default::default()
        };
        assert_eq!(DispatchPolicy::from(&config), DispatchPolicy::unbounded());
    }

    #[test]
    fn default_policy_has_a_deadline() {
        assert_eq!(
            DispatchPolicy::default().handler_timeout,
            Some(Duration::from_secs(30))
        );
    }

    fn lane(lanes: &mut Lanes, id: i64) -> oneshot::Sender<()> {
        let (done, signal) = oneshot::channel();
        lanes.enqueue(ConversationId(id), signal);
        done
    }

    #[test]
    fn lane_pruning_is_amortized() {
        let mut lanes = Lanes::new();
        let live: Vec<_> = (0..1024).map(|id| lane(&mut lanes, id)).collect();

        // Every lane still running: the sweep keeps them all and backs off.
        let _extra = lane(&mut lanes, 1024);
        assert_eq!(lanes.tails.len(), 1025);
        assert_eq!(lanes.prune_at, 2048);

        // Below the new mark nothing is swept, even with finished lanes.
        drop(live);
        for id in 2000..3023 {
            drop(lane(&mut lanes, id));
        }
        assert_eq!(lanes.tails.len(), 2048);

        // Only the still-open lane 1024 survives besides the new entry.
        let _next = lane(&mut lanes, 5000);
        assert_eq!(lanes.tails.len(), 2);
        assert_eq!(lanes.prune_at, LANE_PRUNE_THRESHOLD);
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
