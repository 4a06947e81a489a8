//! UDP push channel to the feed.
//!
//! UDP has no connection, so liveness is inferred: the channel counts as
//! connected from the first datagram the feed sends us, and as disconnected
//! once the feed has been silent for [`LIVENESS_TIMEOUT`]. The keep-alive
//! pings from `sender` make the feed answer with `pong`, so an idle but
//! healthy feed never trips the timeout.
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use livequote_common::net::MAX_DATAGRAM;
use livequote_common::patch::decode_batch;
use livequote_common::{ChannelMessage, InstrumentId, QuoteError, Result};
use livequote_store::{ChannelEvent, PushChannel};
use log::{debug, error, info, warn};

/// Silence after which the feed is considered gone.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(6);

/// Outbound half: subscribe calls sent as `triggerCurrencyData` datagrams.
pub struct UdpPushChannel {
    socket: Arc<UdpSocket>,
    server: SocketAddr,
    connected: Arc<AtomicBool>,
}

impl UdpPushChannel {
    pub fn new(socket: Arc<UdpSocket>, server: SocketAddr, connected: Arc<AtomicBool>) -> Self {
        Self {
            socket,
            server,
            connected,
        }
    }

    /// Tells the feed we are leaving. Best effort.
    pub fn say_goodbye(&self) {
        match ChannelMessage::Disconnect.to_json_bytes() {
            Ok(bytes) => {
                if let Err(e) = self.socket.send_to(&bytes, self.server) {
                    debug!("Failed to send disconnect to {}: {}", self.server, e);
                }
            }
            Err(e) => debug!("Failed to encode disconnect: {}", e),
        }
    }
}

impl PushChannel for UdpPushChannel {
    fn subscribe(&mut self, keys: &[InstrumentId]) -> Result<()> {
        if !self.is_connected() {
            return Err(QuoteError::Disconnected);
        }
        let bytes = ChannelMessage::Subscribe(keys.to_vec()).to_json_bytes()?;
        self.socket.send_to(&bytes, self.server)?;
        info!("Subscribed to {} instruments", keys.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Inbound half: reads datagrams from the feed and turns them into
/// [`ChannelEvent`]s for the session's event loop.
pub struct ChannelReceiver {
    socket: Arc<UdpSocket>,
    server: SocketAddr,
    connected: Arc<AtomicBool>,
    last_seen: Option<Instant>,
}

impl ChannelReceiver {
    pub fn new(socket: Arc<UdpSocket>, server: SocketAddr, connected: Arc<AtomicBool>) -> Self {
        Self {
            socket,
            server,
            connected,
            last_seen: None,
        }
    }

    /// Blocking loop; returns when `shutdown` is set or the event loop is gone.
    ///
    /// The socket must have a read timeout so the liveness check and the
    /// shutdown flag are looked at regularly.
    pub fn run(mut self, events: Sender<ChannelEvent>, shutdown: Arc<AtomicBool>) -> Result<()> {
        info!("Channel receiver running on: {}", self.socket.local_addr()?);
        let mut buf = vec![0u8; MAX_DATAGRAM];

        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((size, from)) => {
                    if from != self.server {
                        debug!("Ignoring datagram from {}", from);
                        continue;
                    }
                    match ChannelMessage::from_json_slice(&buf[..size]) {
                        Ok(message) => self.on_message(message, &events)?,
                        Err(e) => warn!("Undecodable datagram from feed: {}", e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    self.check_liveness(&events)?;
                }
                Err(e) => {
                    error!("Receive data error: {}", e);
                    return Err(QuoteError::Io(e));
                }
            }
        }
        info!("Receiver loop stopping...");
        Ok(())
    }

    fn on_message(&mut self, message: ChannelMessage, events: &Sender<ChannelEvent>) -> Result<()> {
        if let ChannelMessage::Disconnect = message {
            self.mark_down(events)?;
            return Ok(());
        }
        self.last_seen = Some(Instant::now());
        let was_connected = self.connected.swap(true, Ordering::SeqCst);
        // A `connect` while we think we are connected means the feed forgot us
        // and holds no interest set, so the router must replay it.
        if !was_connected || message == ChannelMessage::Connect {
            info!("Feed {} is reachable", self.server);
            send(events, ChannelEvent::Connected)?;
        }
        match message {
            ChannelMessage::QuoteData(values) => {
                let batch = decode_batch(&values);
                if batch.rejected > 0 {
                    warn!("Dropped {} malformed records from a batch", batch.rejected);
                }
                if !batch.patches.is_empty() {
                    send(events, ChannelEvent::QuoteData(batch.patches))?;
                }
            }
            ChannelMessage::Connect | ChannelMessage::Pong => {}
            other => debug!("Unexpected {} from feed", other.event_name()),
        }
        Ok(())
    }

    fn check_liveness(&mut self, events: &Sender<ChannelEvent>) -> Result<()> {
        let silent = self
            .last_seen
            .is_some_and(|seen| seen.elapsed() > LIVENESS_TIMEOUT);
        if silent && self.connected.load(Ordering::SeqCst) {
            warn!("No data from feed for {:?}", LIVENESS_TIMEOUT);
            self.mark_down(events)?;
        }
        Ok(())
    }

    fn mark_down(&mut self, events: &Sender<ChannelEvent>) -> Result<()> {
        self.last_seen = None;
        if self.connected.swap(false, Ordering::SeqCst) {
            send(events, ChannelEvent::Disconnected)?;
        }
        Ok(())
    }
}

fn send(events: &Sender<ChannelEvent>, event: ChannelEvent) -> Result<()> {
    events
        .send(event)
        .map_err(|e| QuoteError::ChannelSend(e.to_string()))
}
