//! Drives collection, caching and emission in one-shot and watch mode.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::session::Recency;
use crate::snapshot::{OutputEmitter, Slot, SlotValue, SnapshotCache};
use crate::sources::{SessionKind, SlotCollector};
use crate::watcher::{Resource, WatchBackend, WatchSpec, WatcherOrchestrator};

/// Error type for viewer runs.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// The primary output stream could not be written.
    #[error("Failed to write snapshot: {0}")]
    Output(#[from] std::io::Error),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Normal completion, disabled short-circuit or signal shutdown.
    Completed,
    /// A recompute failed outside its own error handling.
    Failed,
}

impl RunStatus {
    /// Process exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Failed => 1,
        }
    }
}

/// What one turn of the watch loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStep {
    /// A raw notification arrived; `accepted` is false for stale watches.
    Event { resource: Resource, accepted: bool },
    /// Resources settled and were handled.
    Fired {
        resources: Vec<Resource>,
        recomputed: Vec<Slot>,
    },
    /// Shutdown was requested.
    Shutdown,
}

/// Owns the snapshot cache and the output stream for the process lifetime.
pub struct Viewer<W: Write> {
    collector: Arc<dyn SlotCollector>,
    cache: SnapshotCache,
    emitter: OutputEmitter<W>,
    enabled: bool,
}

impl<W: Write> Viewer<W> {
    pub fn new(collector: Arc<dyn SlotCollector>, out: W) -> Self {
        Self {
            collector,
            cache: SnapshotCache::new(),
            emitter: OutputEmitter::new(out),
            enabled: true,
        }
    }

    /// Disable all computation; every emission carries the disabled marker.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    #[must_use]
    pub fn emitter(&self) -> &OutputEmitter<W> {
        &self.emitter
    }

    pub fn into_output(self) -> W {
        self.emitter.into_inner()
    }

    /// Recompute `slots` concurrently and merge each result.
    ///
    /// A panicking recompute leaves an error value in its slot. Returns the
    /// first such failure.
    async fn recompute(&mut self, slots: &[Slot]) -> Option<String> {
        let tasks: Vec<_> = slots
            .iter()
            .map(|&slot| {
                let collector = Arc::clone(&self.collector);
                (slot, tokio::spawn(async move { collector.collect(slot).await }))
            })
            .collect();

        let mut failure = None;
        for (slot, task) in tasks {
            let value = match task.await {
                Ok(value) => value,
                Err(e) => {
                    let message = format!("{slot} recompute failed: {e}");
                    tracing::error!(slot = %slot, error = %e, "Recompute failed");
                    failure.get_or_insert_with(|| message.clone());
                    SlotValue::Error(message)
                }
            };
            self.cache.merge(slot, value);
        }
        failure
    }

    fn emit(&mut self) -> Result<(), ViewerError> {
        self.emitter.emit(&self.cache)?;
        Ok(())
    }

    /// Compute every slot once, emit, and report how the process should exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub async fn run_once(&mut self) -> Result<RunStatus, ViewerError> {
        if !self.enabled {
            tracing::info!("Viewer disabled, skipping collection");
            self.emitter.emit_disabled()?;
            return Ok(RunStatus::Completed);
        }

        if let Some(message) = self.recompute(&Slot::ALL).await {
            self.emitter.emit_failure(&message)?;
            return Ok(RunStatus::Failed);
        }
        self.emit()?;
        Ok(RunStatus::Completed)
    }

    /// Stay resident, re-emitting whenever a watched resource settles,
    /// until `cancel` fires. Every watch is torn down before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub async fn run_watch<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
        plan: Vec<WatchSpec>,
        cancel: &CancellationToken,
    ) -> Result<RunStatus, ViewerError> {
        if !self.enabled {
            tracing::info!("Viewer disabled, not entering watch mode");
            self.emitter.emit_disabled()?;
            return Ok(RunStatus::Completed);
        }

        let result = self.watch_loop(orchestrator, plan, cancel).await;
        orchestrator.teardown_all();
        result
    }

    async fn watch_loop<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
        plan: Vec<WatchSpec>,
        cancel: &CancellationToken,
    ) -> Result<RunStatus, ViewerError> {
        self.start_watch(orchestrator, plan).await?;
        loop {
            if self.step(orchestrator, cancel).await? == WatchStep::Shutdown {
                tracing::info!("Shutdown requested");
                return Ok(RunStatus::Completed);
            }
        }
    }

    /// Static watches, the first session targets, then the initial emission.
    ///
    /// Watches go in before collection so a change landing mid-collection
    /// is queued rather than lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub async fn start_watch<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
        plan: Vec<WatchSpec>,
    ) -> Result<(), ViewerError> {
        for spec in plan {
            let _ = orchestrator.install_watch(spec);
        }
        self.retarget(orchestrator).await;

        if let Some(message) = self.recompute(&Slot::ALL).await {
            tracing::warn!(error = %message, "Initial collection incomplete, continuing");
        }
        self.emit()?;
        tracing::info!(watches = orchestrator.active_count(), "Watch mode started");
        Ok(())
    }

    /// Process one event, one batch of settled resources, or shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub async fn step<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
        cancel: &CancellationToken,
    ) -> Result<WatchStep, ViewerError> {
        let deadline = orchestrator.next_deadline();
        let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            biased;

            () = cancel.cancelled() => Ok(WatchStep::Shutdown),
            event = orchestrator.recv() => {
                let Some(event) = event else {
                    return Ok(WatchStep::Shutdown);
                };
                let accepted = orchestrator.accept(&event, Instant::now());
                Ok(WatchStep::Event { resource: event.resource, accepted })
            }
            () = sleep_until(wake), if deadline.is_some() => {
                let resources = orchestrator.take_due(Instant::now());
                let recomputed = self.handle_settled(orchestrator, &resources).await;
                if !recomputed.is_empty() {
                    self.emit()?;
                }
                Ok(WatchStep::Fired { resources, recomputed })
            }
        }
    }

    async fn handle_settled<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
        resources: &[Resource],
    ) -> Vec<Slot> {
        let mut slots = BTreeSet::new();
        for &resource in resources {
            tracing::debug!(resource = %resource, "Resource settled");
            if resource == Resource::UserData {
                for kind in self.retarget(orchestrator).await {
                    slots.extend(Resource::session(kind).slots());
                }
            } else {
                slots.extend(resource.slots());
            }
        }

        let retried = orchestrator.retry_failed();
        if retried > 0 {
            tracing::info!(count = retried, "Recovered failed watches");
        }

        let slots: Vec<Slot> = slots.into_iter().collect();
        if !slots.is_empty() {
            self.recompute(&slots).await;
        }
        slots
    }

    /// Point each session watch at the most recent history of its kind.
    ///
    /// Returns the kinds whose active session changed.
    async fn retarget<B: WatchBackend>(
        &mut self,
        orchestrator: &mut WatcherOrchestrator<B>,
    ) -> Vec<SessionKind> {
        let mut changed = Vec::new();
        for kind in SessionKind::ALL {
            let resource = Resource::session(kind);
            let recency = self.collector.locate_session(kind).await;
            let current = orchestrator.watched_path(resource).map(Path::to_path_buf);

            if let Some(pointer) = recency.pointer() {
                if current.as_deref() == Some(pointer.file_path.as_path()) {
                    continue;
                }
                tracing::info!(
                    kind = %kind,
                    path = %pointer.file_path.display(),
                    "Active session changed"
                );
                let _ = orchestrator.install_watch(WatchSpec::session(kind, pointer.file_path.clone()));
                changed.push(kind);
            } else if matches!(recency, Recency::None) && current.is_some() {
                tracing::info!(kind = %kind, "Active session gone");
                orchestrator.teardown(resource);
                changed.push(kind);
            }
        }
        changed
    }
}
