//! Individual steps of the update process.
//!
//! Each step is a separate module with functions called by the
//! [`Installer`](crate::installer::Installer).

pub mod download;
pub mod install;
