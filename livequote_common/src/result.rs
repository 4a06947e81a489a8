//! Result type alias shared across the workspace.
//!
//! Functions can simply return `Result<T>` and get `QuoteError` as the error.
use crate::error::QuoteError;

/// Workspace-wide `Result` alias with `QuoteError` as the default error.
pub type Result<T, E = QuoteError> = std::result::Result<T, E>;
