use ahash::AHashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::debug;

use super::guard::SlotGuard;
use crate::cache::GLOBAL_RESOURCE;
use crate::config::ConcurrencyConfig;
use crate::sync::lock_or_recover;
use crate::telemetry::Metrics;

/// Slot accounting for one resource id
#[derive(Default)]
struct QueueState {
    active: usize,
    /// Oldest waiter first
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.active == 0 && self.waiters.is_empty()
    }
}

pub(super) struct Inner {
    max_concurrent: usize,
    queues: Mutex<AHashMap<String, QueueState>>,
    metrics: Option<Arc<Metrics>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, AHashMap<String, QueueState>> {
        lock_or_recover(&self.queues, "concurrency_limiter")
    }

    /// Give a slot of `resource` back: hand it to the oldest live waiter, or
    /// decrement the active count when nobody is waiting.
    pub(super) fn release(&self, resource: &str) {
        let mut queues = self.lock();
        let Some(state) = queues.get_mut(resource) else {
            tracing::warn!(resource, "released a slot for an untracked resource");
            return;
        };

        while let Some(waiter) = state.waiters.pop_front() {
            // A failed send means the waiter stopped waiting; try the next one.
            if waiter.send(()).is_ok() {
                debug!(resource, queued = state.waiters.len(), "slot handed to queued caller");
                return;
            }
        }

        state.active = state.active.saturating_sub(1);
        if let Some(m) = &self.metrics {
            m.limiter_slots_active.add(-1, &[]);
        }
    }

    /// Drop waiters of `resource` whose receiving side is gone.
    fn forget_closed_waiters(&self, resource: &str) {
        if let Some(state) = self.lock().get_mut(resource) {
            state.waiters.retain(|waiter| !waiter.is_closed());
        }
    }
}

/// A caller parked in the queue. Dropping it before the slot is taken
/// either leaves the queue or passes on a slot that was already handed over.
struct PendingSlot {
    rx: Option<oneshot::Receiver<()>>,
    inner: Arc<Inner>,
    resource: String,
}

impl PendingSlot {
    async fn wait(mut self) -> Option<SlotGuard> {
        let rx = self.rx.as_mut()?;
        let granted = rx.await.is_ok();
        self.rx = None;
        granted.then(|| SlotGuard::new(self.inner.clone(), self.resource.clone()))
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        rx.close();
        if rx.try_recv().is_ok() {
            self.inner.release(&self.resource);
        } else {
            self.inner.forget_closed_waiters(&self.resource);
        }
    }
}

/// Bounds the number of concurrently executing tasks per resource id.
///
/// Cloning is cheap and clones share the same queues.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    inner: Arc<Inner>,
}

impl ConcurrencyLimiter {
    /// Create a limiter allowing `max_concurrent` tasks per resource.
    ///
    /// A limit of 0 would park every caller forever and is raised to 1.
    pub fn new(max_concurrent: usize, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_concurrent: max_concurrent.max(1),
                queues: Mutex::new(AHashMap::new()),
                metrics,
            }),
        }
    }

    pub fn from_config(config: &ConcurrencyConfig, metrics: Option<Arc<Metrics>>) -> Self {
        Self::new(config.max_concurrent, metrics)
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// Wait for a slot of `resource_id` (`None` shares the global group).
    ///
    /// Callers are served strictly in arrival order. There is no timeout.
    pub async fn acquire(&self, resource_id: Option<&str>) -> SlotGuard {
        let resource = resource_id.unwrap_or(GLOBAL_RESOURCE);

        loop {
            let rx = {
                let mut queues = self.inner.lock();
                let state = queues.entry(resource.to_string()).or_default();

                if state.active < self.inner.max_concurrent {
                    state.active = state.active.saturating_add(1);
                    if let Some(m) = &self.inner.metrics {
                        m.limiter_slots_active.add(1, &[]);
                    }
                    return SlotGuard::new(self.inner.clone(), resource.to_string());
                }

                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                debug!(
                    resource,
                    active = state.active,
                    queued = state.waiters.len(),
                    "concurrency limit reached, queuing caller"
                );
                if let Some(m) = &self.inner.metrics {
                    m.limiter_queued_total.add(1, &[]);
                }
                rx
            };

            let pending = PendingSlot {
                rx: Some(rx),
                inner: self.inner.clone(),
                resource: resource.to_string(),
            };
            if let Some(slot) = pending.wait().await {
                return slot;
            }
        }
    }

    /// Run `task` while holding a slot of `resource_id`.
    ///
    /// The task's output, including any error, is returned untouched. The
    /// slot is released however the task ends.
    pub async fn with_limit<F, Fut, T>(&self, resource_id: Option<&str>, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _slot = self.acquire(resource_id).await;
        task().await
    }

    /// Slots currently held for `resource_id`.
    pub fn active(&self, resource_id: Option<&str>) -> usize {
        let resource = resource_id.unwrap_or(GLOBAL_RESOURCE);
        self.inner.lock().get(resource).map_or(0, |state| state.active)
    }

    /// Callers currently waiting for a slot of `resource_id`.
    pub fn queued(&self, resource_id: Option<&str>) -> usize {
        let resource = resource_id.unwrap_or(GLOBAL_RESOURCE);
        self.inner.lock().get(resource).map_or(0, |state| state.waiters.len())
    }

    /// Number of resource ids with queue state.
    pub fn tracked_resources(&self) -> usize {
        self.inner.lock().len()
    }

    /// Remove the state of resources with no held slot and no waiter.
    ///
    /// Never called implicitly; owners of long-running processes that see
    /// many distinct resource ids decide when to run it.
    pub fn prune_idle(&self) -> usize {
        let mut queues = self.inner.lock();
        let before = queues.len();
        queues.retain(|_, state| !state.is_idle());
        before.saturating_sub(queues.len())
    }
}
