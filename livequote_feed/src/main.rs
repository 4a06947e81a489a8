//! Live quote feed simulator.
//!
//! Listens on UDP `FEED_PORT` and streams synthetic partial quote records to
//! every client that pings it, filtered by the client's current interest set.
//! Internally it wires together:
//!
//! - `PatchGenerator`: random-walk batches broadcast as `FeedEvent`s.
//! - `FeedReceiver`: decodes client datagrams into `ChannelMessage`s and
//!   refreshes the `PingMonitor`.
//! - `ClientRegistry`: per-client last-wins interest sets; routes each batch.
//! - `SnapshotCache`: merged view of everything streamed so far.
//! - ping monitor thread: reports clients that stopped pinging.
//!
//! Protocol per client:
//! - first datagram → feed answers `connect`;
//! - `triggerCurrencyData` → replaces the client's interest set and answers
//!   one `currencyData` with full records for the newly added instruments;
//! - `ping` → `pong`; `disconnect` → client forgotten;
//! - every batch → one `currencyData` datagram with the client's patches.
//!
//! On Ctrl+C every known client receives `disconnect`.
#![warn(missing_docs)]
use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Sender, select, unbounded};
use livequote_common::net::{FEED_PORT, addr};
use livequote_common::{CatalogPayload, ChannelMessage, QuoteError, QuotePatch, Result};
use log::{debug, error, info, warn};

use crate::args::Args;
use crate::model::patch_generator::{FeedEvent, PatchGenerator};
use crate::model::ping_monitor::PingMonitor;
use crate::model::registry::ClientRegistry;
use crate::model::snapshot::SnapshotCache;
use crate::receiver::FeedReceiver;

mod args;
pub mod model;
mod receiver;

/// Socket read timeout; bounds how late the receiver notices shutdown.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down feed...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| QuoteError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let generator = match &args.catalog {
        Some(path) => {
            let catalog = CatalogPayload::from_json_slice(&fs::read(path)?)?;
            PatchGenerator::for_ids(catalog.definitions.into_iter().map(|d| d.id), &mut rand::rng())
        }
        None => PatchGenerator::with_defaults(),
    };
    if generator.is_empty() {
        return Err(QuoteError::Format("catalog has no instruments".to_string()));
    }

    let socket = Arc::new(UdpSocket::bind(addr(&args.bind, FEED_PORT))?);
    socket.set_read_timeout(Some(READ_TIMEOUT))?;
    info!("UDP socket created on: {}", socket.local_addr()?);

    let ping_monitor = Arc::new(Mutex::new(PingMonitor::new(args.timeout_secs)));
    let (stop_tx, stop_rx) = unbounded::<SocketAddr>();
    start_ping_monitor(Arc::clone(&ping_monitor), stop_tx, shutdown.clone());

    let (msg_tx, msg_rx) = unbounded::<(ChannelMessage, SocketAddr)>();
    {
        let receiver = FeedReceiver::new(Arc::clone(&socket), Arc::clone(&ping_monitor));
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            if let Err(e) = receiver.receive_loop_with_channel(msg_tx, shutdown) {
                error!("Receiver loop failed: {:?}", e);
            }
        });
    }

    let mut cache = SnapshotCache::seeded(&generator.snapshot(generator.ids()));
    info!("Snapshot cache seeded with {} instruments", cache.len());
    let subscription_tx = generator.start(Duration::from_millis(args.interval_ms), shutdown.clone());
    let (batch_tx, batch_rx) = unbounded::<FeedEvent>();
    subscription_tx
        .send(batch_tx)
        .map_err(|e| QuoteError::ChannelSend(e.to_string()))?;

    let mut registry = ClientRegistry::new();
    loop {
        select! {
            recv(msg_rx) -> msg => match msg {
                Ok((message, from)) => handle_message(&socket, &mut registry, &cache, &ping_monitor, message, from),
                Err(_) => {
                    warn!("Receiver stopped");
                    break;
                }
            },
            recv(batch_rx) -> event => match event {
                Ok(FeedEvent::Batch(batch)) => {
                    cache.absorb(&batch);
                    stream_batch(&socket, &registry, &batch);
                }
                Ok(FeedEvent::Shutdown) | Err(_) => break,
            },
            recv(stop_rx) -> timed_out => if let Ok(client_addr) = timed_out {
                if registry.remove(&client_addr) {
                    info!("Client {} dropped: ping timeout", client_addr);
                }
            },
        }
    }

    for client_addr in registry.addresses() {
        send_message(&socket, &ChannelMessage::Disconnect, *client_addr);
    }
    info!("Feed stopped, {} clients notified", registry.len());
    Ok(())
}

/// Applies one client message to the registry and answers it.
fn handle_message(
    socket: &UdpSocket,
    registry: &mut ClientRegistry,
    cache: &SnapshotCache,
    ping_monitor: &Mutex<PingMonitor>,
    message: ChannelMessage,
    from: SocketAddr,
) {
    if message == ChannelMessage::Disconnect {
        registry.remove(&from);
        match ping_monitor.lock() {
            Ok(mut monitor) => monitor.forget(&from),
            Err(e) => error!("Ping monitor unavailable: {}", e),
        }
        info!("Client {} disconnected", from);
        return;
    }
    if registry.touch(from) {
        info!("New client {} ({} connected)", from, registry.len());
        send_message(socket, &ChannelMessage::Connect, from);
    }

    match message {
        ChannelMessage::Subscribe(keys) => {
            info!("Client {} subscribed to {} instruments", from, keys.len());
            let added = registry.set_interest(from, keys);
            let snapshot = cache.snapshot(&added);
            if !snapshot.is_empty() {
                match ChannelMessage::quote_data(&snapshot) {
                    Ok(message) => send_message(socket, &message, from),
                    Err(e) => error!("Failed to encode snapshot for {}: {}", from, e),
                }
            }
        }
        ChannelMessage::Ping => send_message(socket, &ChannelMessage::Pong, from),
        other => debug!("Ignoring {} from {}", other.event_name(), from),
    }
}

/// Sends each client the part of `batch` it is subscribed to.
fn stream_batch(socket: &UdpSocket, registry: &ClientRegistry, batch: &[QuotePatch]) {
    for (client_addr, patches) in registry.route(batch) {
        match ChannelMessage::quote_data(&patches) {
            Ok(message) => send_message(socket, &message, client_addr),
            Err(e) => error!("Failed to encode batch for {}: {}", client_addr, e),
        }
    }
}

fn send_message(socket: &UdpSocket, message: &ChannelMessage, target: SocketAddr) {
    let sent = message
        .to_json_bytes()
        .and_then(|bytes| Ok(socket.send_to(&bytes, target)?));
    if let Err(e) = sent {
        error!("Failed to send {} to {}: {}", message.event_name(), target, e);
    }
}

fn start_ping_monitor(ping_monitor: Arc<Mutex<PingMonitor>>, stop_tx: Sender<SocketAddr>, shutdown: Arc<AtomicBool>) {
    thread::spawn(move || {
        let check_interval = Duration::from_secs(1);

        while !shutdown.load(Ordering::Relaxed) {
            thread::sleep(check_interval);
            let timed_out_clients = match ping_monitor.lock() {
                Ok(mut monitor) => monitor.check_timeouts(),
                Err(e) => {
                    error!("Ping monitor poisoned: {}", e);
                    break;
                }
            };
            for client_addr in timed_out_clients {
                if stop_tx.send(client_addr).is_err() {
                    return;
                }
            }
        }
    });
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
