//! Core types shared by every pipeline stage
//!
//! - [`Architecture`] - the closed set of target architectures tracked in recipes
//! - [`UpdaterError`] - typed failures returned by pipeline steps
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal-facing error reporting

pub mod arch;
pub mod error;

pub use arch::Architecture;
pub use error::{ErrorContext, UpdaterError, user_friendly_error};
