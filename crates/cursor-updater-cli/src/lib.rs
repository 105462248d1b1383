//! CLI library components for the Cursor updater.

#![warn(missing_docs)]

pub mod logging;
pub mod progress;
pub mod summary;
