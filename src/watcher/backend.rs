//! Filesystem watch backends.

use std::path::Path;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use tokio::sync::mpsc;

use super::error::WatcherError;
use super::resource::{RawEvent, WatchId, WatchSpec, WatchTarget};

/// Coalescing window of the notify debouncer.
///
/// Kept well below every resource's quiet period; the settle deadlines
/// themselves are enforced by the orchestrator's scheduler.
pub const NOTIFY_TICK: Duration = Duration::from_millis(50);

/// Something that can attach watches to the filesystem.
///
/// A watch stays active for as long as its handle is alive.
pub trait WatchBackend {
    type Handle;

    /// Start watching `spec`, posting [`RawEvent`]s stamped with `id` into `tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be watched.
    fn watch(
        &mut self,
        id: WatchId,
        spec: &WatchSpec,
        tx: mpsc::UnboundedSender<RawEvent>,
    ) -> Result<Self::Handle, WatcherError>;

    /// Stop a watch.
    fn unwatch(&mut self, id: WatchId, handle: Self::Handle) {
        let _ = id;
        drop(handle);
    }
}

/// Backend built on `notify-debouncer-full`.
#[derive(Debug, Default)]
pub struct NotifyBackend;

impl NotifyBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Directory actually registered with notify, and how.
fn attach_point(target: &WatchTarget) -> (&Path, RecursiveMode) {
    match target {
        WatchTarget::File(path) => (
            path.parent().unwrap_or(path),
            RecursiveMode::NonRecursive,
        ),
        WatchTarget::Tree(path) => (path, RecursiveMode::Recursive),
    }
}

impl WatchBackend for NotifyBackend {
    type Handle = Debouncer<RecommendedWatcher, RecommendedCache>;

    fn watch(
        &mut self,
        id: WatchId,
        spec: &WatchSpec,
        tx: mpsc::UnboundedSender<RawEvent>,
    ) -> Result<Self::Handle, WatcherError> {
        let (dir, mode) = attach_point(&spec.target);
        if !dir.is_dir() {
            return Err(WatcherError::MissingTarget(dir.to_path_buf()));
        }

        let resource = spec.resource;
        let target = spec.target.clone();

        let mut debouncer = new_debouncer(NOTIFY_TICK, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    // Our own reads show up as access events.
                    let paths: Vec<_> = events
                        .iter()
                        .filter(|event| !matches!(event.kind, EventKind::Access(_)))
                        .flat_map(|event| event.paths.iter())
                        .filter(|path| target.covers(path))
                        .cloned()
                        .collect();
                    if paths.is_empty() {
                        return;
                    }
                    tracing::trace!(resource = %resource, count = paths.len(), "Raw change");
                    let _ = tx.send(RawEvent {
                        resource,
                        watch_id: id,
                        paths,
                    });
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(resource = %resource, error = %error, "Watcher error");
                    }
                }
            }
        })?;

        debouncer.watch(dir, mode)?;
        tracing::debug!(
            resource = %resource,
            path = %spec.target.path().display(),
            "Watch attached"
        );
        Ok(debouncer)
    }
}
