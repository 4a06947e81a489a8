//! Common types shared by the quote store, the terminal client and the feed.
//!
//! This crate aggregates:
//! - `error`: unified error type `QuoteError` used across the workspace.
//! - `result`: handy `Result<T, QuoteError>` alias.
//! - `instrument`: the `InstrumentId` key.
//! - `patch`: partial quote records (`QuotePatch`) and their permissive decoder.
//! - `definition`: catalog metadata (`InstrumentDefinition`, `FieldMeta`).
//! - `protocol`: JSON messages carried by the push channel.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod definition;
pub mod error;
pub mod instrument;
pub mod net;
pub mod patch;
pub mod protocol;
pub mod result;

pub use definition::{CatalogPayload, FieldMeta, InstrumentDefinition};
pub use error::QuoteError;
pub use instrument::InstrumentId;
pub use patch::{QuoteFields, QuotePatch};
pub use protocol::ChannelMessage;
pub use result::Result;
