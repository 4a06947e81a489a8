use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use crossbeam_channel::Sender;
use livequote_common::net::MAX_DATAGRAM;
use livequote_common::{ChannelMessage, QuoteError, Result};
use log::{debug, info, warn};

use crate::model::ping_monitor::PingMonitor;

/// UDP receiver for client messages.
///
/// Every datagram refreshes the sender in the `PingMonitor`. Decoded messages
/// are forwarded with the sender's address; a datagram that does not decode is
/// logged and skipped so one bad client cannot stop the feed.
pub struct FeedReceiver {
    socket: Arc<UdpSocket>,
    ping_monitor: Arc<Mutex<PingMonitor>>,
}

impl FeedReceiver {
    pub fn new(socket: Arc<UdpSocket>, ping_monitor: Arc<Mutex<PingMonitor>>) -> Self {
        Self { socket, ping_monitor }
    }

    /// Blocking loop; returns when `shutdown` is set or the main loop is gone.
    /// The socket needs a read timeout for the shutdown flag to be noticed.
    pub fn receive_loop_with_channel(
        self,
        tx: Sender<(ChannelMessage, SocketAddr)>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        info!("Feed receiver is started on {}", self.socket.local_addr()?);
        let mut buf = vec![0u8; MAX_DATAGRAM];

        while !shutdown.load(Ordering::Relaxed) {
            let (size, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
                // Windows reports an ICMP port-unreachable from a gone client here.
                Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(QuoteError::Io(e)),
            };
            self.ping_monitor.lock()?.update_ping(from);

            match ChannelMessage::from_json_slice(&buf[..size]) {
                Ok(message) => {
                    debug!("{} from {}", message.event_name(), from);
                    tx.send((message, from))
                        .map_err(|e| QuoteError::ChannelSend(e.to_string()))?;
                }
                Err(e) => warn!("Undecodable datagram from {}: {}", from, e),
            }
        }
        info!("Feed receiver stopping...");
        Ok(())
    }
}
