//! Keep-alive pings to the feed.
//!
//! The feed forgets clients that stop pinging, and only answers clients it
//! knows about, so the first ping is also what establishes the channel.
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use livequote_common::{ChannelMessage, Result};
use log::{debug, error, info};

/// PING interval in milliseconds used by the background thread.
const INTERVAL_MS: u64 = 2000;

/// Helper type for the background keep-alive.
pub struct PingSender;

impl PingSender {
    /// Spawns the ping thread. It pings immediately, then every `INTERVAL_MS`,
    /// until `shutdown` is set.
    pub fn start(socket: Arc<UdpSocket>, target_addr: SocketAddr, shutdown: Arc<AtomicBool>) -> Result<()> {
        let ping = ChannelMessage::Ping.to_json_bytes()?;
        info!("Ping thread started. Target: {}", target_addr);
        thread::spawn(move || {
            let interval = Duration::from_millis(INTERVAL_MS);
            while !shutdown.load(Ordering::Relaxed) {
                match socket.send_to(&ping, target_addr) {
                    Ok(_) => debug!("PING sent to {}", target_addr),
                    Err(ref e) if e.kind() == ErrorKind::ConnectionReset => {}
                    Err(e) => error!("Failed to send PING: {}", e),
                }
                thread::sleep(interval);
            }
            info!("Ping thread stopping...");
        });
        Ok(())
    }
}
