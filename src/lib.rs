//! ChatRoom viewer - live chat client state for plugin template substitution.

pub mod clock;
pub mod config;
pub mod paths;
pub mod session;
pub mod snapshot;
pub mod sources;
pub mod viewer;
pub mod watcher;
