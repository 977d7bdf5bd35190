//! Error handling for the updater
//!
//! This module provides the typed error taxonomy used across the library and
//! the user-friendly error reporting used by the CLI. It follows two rules:
//! 1. **Strongly-typed errors** ([`UpdaterError`]) for pipeline steps, so the
//!    orchestrator can decide what a failure means for a package
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!    when an error reaches the terminal
//!
//! # Error Categories
//!
//! - **Network**: [`UpdaterError::FetchFailed`], [`UpdaterError::HttpStatus`]
//! - **Extraction**: [`UpdaterError::ParseFailed`]
//! - **File System**: [`UpdaterError::FileNotFound`], [`UpdaterError::PersistFailed`],
//!   [`UpdaterError::IoError`]
//! - **Integrity**: [`UpdaterError::UnsupportedAlgorithm`], [`UpdaterError::HashMismatch`]
//! - **Configuration**: [`UpdaterError::ConfigError`], [`UpdaterError::UnknownPackage`],
//!   [`UpdaterError::YamlError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use aur_updater::core::{UpdaterError, user_friendly_error};
//!
//! let error = UpdaterError::UnknownPackage { name: "linuxqq".to_string() };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for updater operations
///
/// Pipeline components return these instead of panicking or printing, and
/// never raise across component boundaries. The
/// [`PackageUpdater`](crate::updater::PackageUpdater) is the only place that
/// decides whether an error is fatal for a package.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// A request could not be completed (connection, timeout, body read)
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed {
        /// The requested URL
        url: String,
        /// Transport-level reason
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The returned status code
        status: u16,
    },

    /// A version or download URL could not be extracted from upstream data
    #[error("Failed to parse {what}")]
    ParseFailed {
        /// What was being extracted
        what: String,
    },

    /// A recipe or artifact file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// The missing path
        path: String,
    },

    /// The requested digest algorithm is not one of sha256/sha512
    #[error("Unsupported hash algorithm '{name}' (supported: sha256, sha512)")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name
        name: String,
    },

    /// A file's digest does not match the expected value
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        /// The verified file
        path: String,
        /// Expected digest (hex)
        expected: String,
        /// Computed digest (hex)
        actual: String,
    },

    /// Writing a recipe or artifact to disk failed
    #[error("Failed to write {path}: {reason}")]
    PersistFailed {
        /// The destination path
        path: String,
        /// Underlying I/O reason
        reason: String,
    },

    /// Configuration is missing or invalid
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// A package name was requested that is not in the configuration
    #[error("Package '{name}' is not configured")]
    UnknownPackage {
        /// The requested package name
        name: String,
    },

    /// IO error from [`std::io::Error`]
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error from [`serde_yaml::Error`]
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Error wrapper with a suggestion and details for terminal display
///
/// # Examples
///
/// ```rust,no_run
/// use aur_updater::core::{ErrorContext, UpdaterError};
///
/// let context = ErrorContext::new(UpdaterError::FileNotFound { path: "PKGBUILD".into() })
///     .with_suggestion("Check the 'pkgbuild' path in packages.yaml")
///     .with_details("Relative paths resolve against the recipe root");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdaterError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: red error, yellow details, green suggestion.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Typed [`UpdaterError`]s anywhere in the chain get specific advice; I/O and
/// YAML errors are recognized next; everything else is wrapped with its full
/// cause chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(updater_error) = error.chain().find_map(|e| e.downcast_ref::<UpdaterError>()) {
        let described = create_error_context(updater_error);
        if described.details.is_none() && error.chain().count() > 1 {
            return described.with_details(chain_details(&error));
        }
        return described;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdaterError::FileNotFound {
                    path: "unknown".to_string(),
                })
                .with_details(format!("{error:#}"))
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdaterError::ConfigError {
                    message: io_error.to_string(),
                })
                .with_details(format!("{error:#}"))
                .with_suggestion("Check ownership and permissions of the PKGBUILD and download directory");
            }
            _ => {}
        }
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(UpdaterError::ConfigError {
            message: yaml_error.to_string(),
        })
        .with_suggestion("Check the YAML syntax of your packages file");
    }

    ErrorContext::new(UpdaterError::ConfigError {
        message: error.to_string(),
    })
    .with_details(chain_details(&error))
}

fn chain_details(error: &anyhow::Error) -> String {
    error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join(": ")
}

fn create_error_context(error: &UpdaterError) -> ErrorContext {
    let suggestion = match error {
        UpdaterError::FetchFailed { .. } | UpdaterError::HttpStatus { .. } => {
            Some("Check your network connection and the package's fetch_url; try --timeout for slow mirrors")
        }
        UpdaterError::ParseFailed { .. } => {
            Some("The upstream page layout may have changed; the package's parser needs updating")
        }
        UpdaterError::FileNotFound { .. } => {
            Some("Check the 'pkgbuild' path in your packages file or pass --root")
        }
        UpdaterError::UnknownPackage { .. } => {
            Some("Run with --list to see the configured package names")
        }
        UpdaterError::ConfigError { .. } | UpdaterError::YamlError(_) => {
            Some("Check the packages file against the documented format")
        }
        UpdaterError::PersistFailed { .. } => {
            Some("Check that the PKGBUILD directory is writable")
        }
        UpdaterError::UnsupportedAlgorithm { .. }
        | UpdaterError::HashMismatch { .. }
        | UpdaterError::IoError(_) => None,
    };

    let context = ErrorContext::new(clone_error(error));
    match suggestion {
        Some(suggestion) => context.with_suggestion(suggestion),
        None => context,
    }
}

// `io::Error` and `serde_yaml::Error` are not `Clone`; both are rebuilt from
// their message.
fn clone_error(error: &UpdaterError) -> UpdaterError {
    match error {
        UpdaterError::FetchFailed { url, reason } => UpdaterError::FetchFailed {
            url: url.clone(),
            reason: reason.clone(),
        },
        UpdaterError::HttpStatus { url, status } => UpdaterError::HttpStatus {
            url: url.clone(),
            status: *status,
        },
        UpdaterError::ParseFailed { what } => UpdaterError::ParseFailed { what: what.clone() },
        UpdaterError::FileNotFound { path } => UpdaterError::FileNotFound { path: path.clone() },
        UpdaterError::UnsupportedAlgorithm { name } => {
            UpdaterError::UnsupportedAlgorithm { name: name.clone() }
        }
        UpdaterError::HashMismatch {
            path,
            expected,
            actual,
        } => UpdaterError::HashMismatch {
            path: path.clone(),
            expected: expected.clone(),
            actual: actual.clone(),
        },
        UpdaterError::PersistFailed { path, reason } => UpdaterError::PersistFailed {
            path: path.clone(),
            reason: reason.clone(),
        },
        UpdaterError::ConfigError { message } => UpdaterError::ConfigError {
            message: message.clone(),
        },
        UpdaterError::UnknownPackage { name } => UpdaterError::UnknownPackage { name: name.clone() },
        UpdaterError::IoError(e) => {
            UpdaterError::IoError(std::io::Error::new(e.kind(), e.to_string()))
        }
        UpdaterError::YamlError(e) => UpdaterError::ConfigError { message: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_messages() {
        let error = UpdaterError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 404,
        };
        assert_eq!(error.to_string(), "HTTP 404 from https://example.com");

        let error = UpdaterError::UnsupportedAlgorithm { name: "md5".to_string() };
        assert!(error.to_string().contains("md5"));
    }

    #[test]
    fn test_user_friendly_error_finds_typed_error_in_chain() {
        let result: Result<(), UpdaterError> =
            Err(UpdaterError::UnknownPackage { name: "foo".to_string() });
        let error = result.context("Failed to select package").unwrap_err();

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, UpdaterError::UnknownPackage { .. }));
        assert!(ctx.suggestion.unwrap().contains("--list"));
    }

    #[test]
    fn test_user_friendly_error_for_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let ctx = user_friendly_error(anyhow::Error::from(io));
        assert!(matches!(ctx.error, UpdaterError::FileNotFound { .. }));
        assert_eq!(ctx.details.as_deref(), Some("gone"));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(UpdaterError::ParseFailed { what: "version".to_string() })
            .with_details("no match")
            .with_suggestion("fix the parser");
        let rendered = ctx.to_string();
        assert!(rendered.contains("Failed to parse version"));
        assert!(rendered.contains("Details: no match"));
        assert!(rendered.contains("Suggestion: fix the parser"));
    }
}
