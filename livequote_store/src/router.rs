//! Subscription router.
//!
//! Turns "which instruments does the visible UI need" into subscribe calls on
//! the push channel. The feed treats every subscribe as a replacement of the
//! client's interest set, so the router always sends the full set.
//!
//! The router remembers two things:
//! - the current interest (last requested set), which a reconnect replays;
//! - the last set the channel actually accepted, used to skip identical
//!   consecutive calls.
//!
//! Nothing is queued or retried while the channel is down.

use livequote_common::{InstrumentId, Result};
use log::{debug, info, warn};

/// Outbound side of the push channel.
pub trait PushChannel {
    /// Replaces the server-side interest set for this client.
    fn subscribe(&mut self, keys: &[InstrumentId]) -> Result<()>;

    /// `true` while the channel can deliver messages.
    fn is_connected(&self) -> bool;
}

/// What a sync attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// One subscribe call went out.
    Sent,
    /// The set equals the one last delivered; nothing was sent.
    Unchanged,
    /// The channel is down or rejected the call; the interest is kept for replay.
    NotDelivered,
}

/// Tracks the active interest set and keeps the channel in step with it.
pub struct SubscriptionRouter<C> {
    channel: C,
    interest: Option<Vec<InstrumentId>>,
    delivered: Option<Vec<InstrumentId>>,
}

impl<C: PushChannel> SubscriptionRouter<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            interest: None,
            delivered: None,
        }
    }

    /// Makes `keys` the current interest and issues one subscribe call for it,
    /// unless exactly this set is already what the channel holds.
    pub fn sync_interest(&mut self, keys: Vec<InstrumentId>) -> SyncOutcome {
        self.interest = Some(keys.clone());
        if self.delivered.as_ref() == Some(&keys) {
            debug!("Interest unchanged ({} keys), skipping subscribe", keys.len());
            return SyncOutcome::Unchanged;
        }
        self.deliver(keys)
    }

    /// Last requested interest set, delivered or not.
    pub fn current_interest(&self) -> Option<&[InstrumentId]> {
        self.interest.as_deref()
    }

    /// Replays the current interest after the channel (re)connects.
    pub fn on_connect(&mut self) -> SyncOutcome {
        self.delivered = None;
        match self.interest.clone() {
            Some(keys) => {
                info!("Channel connected, replaying interest ({} keys)", keys.len());
                self.deliver(keys)
            }
            None => SyncOutcome::Unchanged,
        }
    }

    /// Forgets what the server held; the next sync is sent even if unchanged.
    pub fn on_disconnect(&mut self) {
        self.delivered = None;
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    fn deliver(&mut self, keys: Vec<InstrumentId>) -> SyncOutcome {
        if !self.channel.is_connected() {
            debug!("Channel disconnected, interest ({} keys) not delivered", keys.len());
            return SyncOutcome::NotDelivered;
        }
        match self.channel.subscribe(&keys) {
            Ok(()) => {
                debug!("Subscribed to {:?}", keys);
                self.delivered = Some(keys);
                SyncOutcome::Sent
            }
            Err(e) => {
                warn!("Subscribe failed: {}", e);
                SyncOutcome::NotDelivered
            }
        }
    }
}
