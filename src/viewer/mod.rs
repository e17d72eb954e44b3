//! Process lifecycle: one-shot and watch mode.

mod runner;
mod shutdown;

pub use runner::{RunStatus, Viewer, ViewerError, WatchStep};
pub use shutdown::spawn_signal_listener;
