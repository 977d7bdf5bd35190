//! Shared utilities
//!
//! - [`fs`] - directory creation, atomic writes, mode-preserving temp files, and tolerant removal

pub mod fs;

pub use fs::{atomic_write, ensure_dir, remove_if_exists, sibling_temp_file};
