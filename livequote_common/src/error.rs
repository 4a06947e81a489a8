//! Error types shared by the store, the client and the feed.
//!
//! `QuoteError` covers the few places that can actually fail: I/O, JSON
//! encoding, channel plumbing and favorites persistence. Data-shape problems in
//! streamed patches are never errors; they are absorbed field by field.
use std::io;
use std::net::AddrParseError;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type for the workspace.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Malformed socket address in configuration or a command.
    #[error("Invalid address: {0}")]
    AddrParse(#[from] AddrParseError),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Error indicating a poisoned lock was encountered.
    #[error("Lock poisoned: {0}")]
    MutexLock(String),

    /// Favorites could not be written to their storage. The in-memory set already changed.
    #[error("Favorites persistence failed: {0}")]
    Persistence(String),

    /// The push channel is not connected, so nothing was delivered.
    #[error("Push channel disconnected")]
    Disconnected,
}

impl<T> From<PoisonError<T>> for QuoteError {
    fn from(err: PoisonError<T>) -> Self {
        QuoteError::MutexLock(err.to_string())
    }
}
