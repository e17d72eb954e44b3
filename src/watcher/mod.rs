//! Debounced filesystem watching.
//!
//! Backends post raw notifications into a channel; the orchestrator keeps one
//! watch per resource and turns notifications into settled resources once
//! each resource's quiet period has elapsed.

mod backend;
mod error;
mod orchestrator;
mod resource;
mod scheduler;

pub use backend::{NotifyBackend, WatchBackend, NOTIFY_TICK};
pub use error::WatcherError;
pub use orchestrator::WatcherOrchestrator;
pub use resource::{DebounceParams, RawEvent, Resource, WatchId, WatchSpec, WatchTarget};
pub use scheduler::DeadlineScheduler;
