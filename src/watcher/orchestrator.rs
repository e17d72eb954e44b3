//! Watch lifecycle: one active watch per resource, settle deadlines, retries.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::backend::WatchBackend;
use super::error::WatcherError;
use super::resource::{RawEvent, Resource, WatchId, WatchSpec};
use super::scheduler::DeadlineScheduler;

struct ActiveWatch<H> {
    id: WatchId,
    spec: WatchSpec,
    handle: H,
}

/// Owns every watch and turns raw notifications into settled resources.
///
/// Per resource the lifecycle is absent, install, active, teardown, absent.
/// Installing over an active resource tears the old watch down first.
pub struct WatcherOrchestrator<B: WatchBackend> {
    backend: B,
    tx: mpsc::UnboundedSender<RawEvent>,
    rx: mpsc::UnboundedReceiver<RawEvent>,
    active: HashMap<Resource, ActiveWatch<B::Handle>>,
    failed: HashMap<Resource, WatchSpec>,
    scheduler: DeadlineScheduler<Resource>,
    next_id: u64,
}

impl<B: WatchBackend> WatcherOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            tx,
            rx,
            active: HashMap::new(),
            failed: HashMap::new(),
            scheduler: DeadlineScheduler::new(),
            next_id: 0,
        }
    }

    /// Install `spec`, replacing any watch under the same resource.
    ///
    /// On failure the spec is remembered and retried by [`Self::retry_failed`].
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the watch cannot be attached.
    pub fn install_watch(&mut self, spec: WatchSpec) -> Result<WatchId, WatcherError> {
        let resource = spec.resource;
        self.teardown(resource);

        self.next_id += 1;
        let id = WatchId(self.next_id);

        match self.backend.watch(id, &spec, self.tx.clone()) {
            Ok(handle) => {
                tracing::info!(
                    resource = %resource,
                    path = %spec.target.path().display(),
                    watch_id = id.0,
                    "Watch installed"
                );
                self.active.insert(resource, ActiveWatch { id, spec, handle });
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(
                    resource = %resource,
                    path = %spec.target.path().display(),
                    error = %e,
                    "Watch install failed, resource unmonitored"
                );
                self.failed.insert(resource, spec);
                Err(e)
            }
        }
    }

    /// Tear down the watch for `resource`. Returns whether one was active.
    pub fn teardown(&mut self, resource: Resource) -> bool {
        self.failed.remove(&resource);
        self.scheduler.cancel(resource);
        let Some(watch) = self.active.remove(&resource) else {
            return false;
        };
        tracing::info!(
            resource = %resource,
            path = %watch.spec.target.path().display(),
            watch_id = watch.id.0,
            "Watch torn down"
        );
        self.backend.unwatch(watch.id, watch.handle);
        true
    }

    /// Close every watch.
    pub fn teardown_all(&mut self) {
        let resources: Vec<Resource> = self.active.keys().copied().collect();
        for resource in resources {
            self.teardown(resource);
        }
        self.failed.clear();
        tracing::debug!("All watches torn down");
    }

    /// Retry every failed install. Returns how many succeeded.
    pub fn retry_failed(&mut self) -> usize {
        let pending: Vec<WatchSpec> = self.failed.drain().map(|(_, spec)| spec).collect();
        pending
            .into_iter()
            .filter(|spec| self.install_watch(spec.clone()).is_ok())
            .count()
    }

    /// Record a raw notification.
    ///
    /// Events from a superseded or torn-down watch are dropped. Returns
    /// whether the event reset the resource's deadline.
    pub fn accept(&mut self, event: &RawEvent, now: Instant) -> bool {
        match self.active.get(&event.resource) {
            Some(watch) if watch.id == event.watch_id => {
                self.scheduler
                    .touch(event.resource, watch.spec.debounce.quiet_period, now);
                true
            }
            _ => {
                tracing::trace!(
                    resource = %event.resource,
                    watch_id = event.watch_id.0,
                    "Dropping event from stale watch"
                );
                false
            }
        }
    }

    /// Wait for the next raw notification.
    pub async fn recv(&mut self) -> Option<RawEvent> {
        self.rx.recv().await
    }

    /// Sender that backends post into.
    #[must_use]
    pub fn sender(&self) -> mpsc::UnboundedSender<RawEvent> {
        self.tx.clone()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Resources that have settled by `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<Resource> {
        self.scheduler.take_due(now)
    }

    #[must_use]
    pub fn watch_id(&self, resource: Resource) -> Option<WatchId> {
        self.active.get(&resource).map(|w| w.id)
    }

    /// Target of the active watch for `resource`.
    #[must_use]
    pub fn watched_path(&self, resource: Resource) -> Option<&Path> {
        self.active.get(&resource).map(|w| w.spec.target.path())
    }

    #[must_use]
    pub fn is_active(&self, resource: Resource) -> bool {
        self.active.contains_key(&resource)
    }

    #[must_use]
    pub fn is_failed(&self, resource: Resource) -> bool {
        self.failed.contains_key(&resource)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
