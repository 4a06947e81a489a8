//! Push channel messages exchanged between client and feed.
//!
//! Every datagram is one JSON object tagged by `event`, with the payload (if
//! any) under `data`:
//!
//! ```text
//! {"event":"triggerCurrencyData","data":["USD1","EUR1"]}   client -> feed
//! {"event":"currencyData","data":[{"_i":"USD1","l":32.1}]}  feed -> client
//! {"event":"ping"} / {"event":"pong"}                       keep-alive
//! {"event":"connect"} / {"event":"disconnect"}              lifecycle
//! ```
//!
//! `currencyData` keeps its elements untyped so the receiver can decode them
//! one by one (see [`crate::patch::decode_batch`]).
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuoteError;
use crate::instrument::InstrumentId;
use crate::patch::QuotePatch;

/// One message on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ChannelMessage {
    /// Replaces the sender's interest set on the feed.
    #[serde(rename = "triggerCurrencyData")]
    Subscribe(Vec<InstrumentId>),
    /// A batch of partial quote records, in the order they should be applied.
    #[serde(rename = "currencyData")]
    QuoteData(Vec<Value>),
    /// Client keep-alive.
    #[serde(rename = "ping")]
    Ping,
    /// Feed answer to a keep-alive.
    #[serde(rename = "pong")]
    Pong,
    /// Sent by the feed the first time it hears from a client.
    #[serde(rename = "connect")]
    Connect,
    /// Sent by a client that is going away.
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl ChannelMessage {
    /// Wraps typed patches into a `currencyData` message.
    pub fn quote_data(patches: &[QuotePatch]) -> Result<Self, QuoteError> {
        let values = patches
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChannelMessage::QuoteData(values))
    }

    /// Encode the message to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, QuoteError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a message from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, QuoteError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Short name used in logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChannelMessage::Subscribe(_) => "triggerCurrencyData",
            ChannelMessage::QuoteData(_) => "currencyData",
            ChannelMessage::Ping => "ping",
            ChannelMessage::Pong => "pong",
            ChannelMessage::Connect => "connect",
            ChannelMessage::Disconnect => "disconnect",
        }
    }
}
