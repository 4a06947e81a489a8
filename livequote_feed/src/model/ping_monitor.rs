//! Keep-alive tracker for feed clients.
//!
//! Any datagram from a client counts as a ping. `check_timeouts` drops the
//! clients that have been silent for longer than the timeout and returns their
//! addresses, so each timeout is reported exactly once.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Tracks the last time each client was heard from.
pub struct PingMonitor {
    last_ping: HashMap<SocketAddr, Instant>,
    timeout: Duration,
}

impl PingMonitor {
    /// Creates a monitor that forgets clients after `timeout_secs` of silence.
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            last_ping: HashMap::new(),
            timeout,
        }
    }

    /// Records traffic from `addr`.
    pub fn update_ping(&mut self, addr: SocketAddr) {
        self.last_ping.insert(addr, Instant::now());
    }

    /// Stops tracking `addr`, e.g. after it said goodbye.
    pub fn forget(&mut self, addr: &SocketAddr) {
        self.last_ping.remove(addr);
    }

    /// Removes and returns every client silent for longer than the timeout.
    pub fn check_timeouts(&mut self) -> Vec<SocketAddr> {
        let now = Instant::now();
        let timeout = self.timeout;
        let mut timed_out = Vec::new();

        self.last_ping.retain(|addr, last| {
            if now.duration_since(*last) > timeout {
                timed_out.push(*addr);
                false
            } else {
                true
            }
        });
        timed_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn client(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn silent_clients_time_out_once() {
        let mut monitor = PingMonitor::with_timeout(Duration::from_millis(20));
        monitor.update_ping(client(4000));
        assert!(monitor.check_timeouts().is_empty());

        thread::sleep(Duration::from_millis(40));
        monitor.update_ping(client(4001));
        assert_eq!(monitor.check_timeouts(), vec![client(4000)]);
        assert!(monitor.check_timeouts().is_empty());

        monitor.update_ping(client(4000));
        thread::sleep(Duration::from_millis(40));
        let mut expired = monitor.check_timeouts();
        expired.sort();
        assert_eq!(expired, vec![client(4000), client(4001)]);
    }

    #[test]
    fn forgotten_clients_never_time_out() {
        let mut monitor = PingMonitor::with_timeout(Duration::ZERO);
        monitor.update_ping(client(4000));
        monitor.forget(&client(4000));
        thread::sleep(Duration::from_millis(5));
        assert!(monitor.check_timeouts().is_empty());
    }
}
