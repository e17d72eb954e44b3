//! Location of the chat client's data on disk.

mod locator;

pub use locator::{AppPaths, DirectoryLocator, INSTALL_DEPTH};
