//! Known clients and what each of them is subscribed to.
//!
//! A `triggerCurrencyData` message replaces the sender's whole interest set,
//! mirroring how the client side treats every subscribe as last-wins.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use livequote_common::{InstrumentId, QuotePatch};

/// Per-client interest sets keyed by the client's UDP address.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, HashSet<InstrumentId>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` if unknown. Returns `true` on first contact.
    pub fn touch(&mut self, addr: SocketAddr) -> bool {
        if self.clients.contains_key(&addr) {
            return false;
        }
        self.clients.insert(addr, HashSet::new());
        true
    }

    /// Replaces the interest set of `addr`, registering it if needed.
    /// Returns the keys the client was not subscribed to before, in request
    /// order.
    pub fn set_interest(&mut self, addr: SocketAddr, keys: Vec<InstrumentId>) -> Vec<InstrumentId> {
        let previous = self.clients.remove(&addr).unwrap_or_default();
        let mut interest = HashSet::with_capacity(keys.len());
        let mut added = Vec::new();
        for key in keys {
            if !previous.contains(&key) && !interest.contains(&key) {
                added.push(key.clone());
            }
            interest.insert(key);
        }
        self.clients.insert(addr, interest);
        added
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> bool {
        self.clients.remove(addr).is_some()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &SocketAddr> {
        self.clients.keys()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Splits a batch per client, keeping the batch order. Clients with no
    /// matching patch are left out.
    pub fn route(&self, batch: &[QuotePatch]) -> Vec<(SocketAddr, Vec<QuotePatch>)> {
        self.clients
            .iter()
            .filter_map(|(addr, interest)| {
                let wanted: Vec<QuotePatch> = batch
                    .iter()
                    .filter(|patch| interest.contains(&patch.id))
                    .cloned()
                    .collect();
                (!wanted.is_empty()).then_some((*addr, wanted))
            })
            .collect()
    }
}
