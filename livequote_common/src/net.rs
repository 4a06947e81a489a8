//! Shared networking constants and helpers used by client and feed.

/// UDP port the feed listens on for subscriptions and pings, and streams from.
pub const FEED_PORT: u16 = 8081;

/// Largest datagram either side expects to receive.
pub const MAX_DATAGRAM: usize = 64 * 1024;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
