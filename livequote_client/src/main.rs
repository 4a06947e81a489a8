//! Live quote client: subscribes to a quote feed over UDP, reconciles the
//! streamed partial records in a `livequote_store` session and redraws the
//! active table whenever the store changes.
//!
//! Usage example (CLI):
//! ```bash
//! livequote_client --server-ip 127.0.0.1 --catalog ./demos/catalog.json --tab gold
//! ```
//!
//! While running, commands are read from stdin (`tab gold`, `fav USD1`,
//! `show XAU1`, `close`, `quit`). See `commands` for the full list.
//!
//! Threads:
//! - ping thread: keeps the feed aware of us (`sender`).
//! - receiver thread: decodes datagrams into channel events (`channel`).
//! - stdin thread: parses user commands (`commands`).
//! - main thread: the single event loop that owns the session.
//!
//! The catalog file is read again once the loaded snapshot's `expire` time has
//! passed, so a refreshed file replaces stale definitions without a restart.
#![warn(missing_docs)]
mod args;
mod channel;
mod commands;
mod render;
mod sender;

use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use crate::args::Args;
use crate::channel::{ChannelReceiver, UdpPushChannel};
use crate::commands::{HELP, UserCommand};
use crate::sender::PingSender;
use clap::Parser;
use chrono::Utc;
use crossbeam_channel::{Receiver, never, select, tick, unbounded};
use livequote_common::net::{FEED_PORT, addr};
use livequote_common::{CatalogPayload, QuoteError, Result};
use livequote_store::{
    ChannelEvent, FavoritesLedger, JsonFileStorage, LiveSession, PushChannel, StoreEvent, StoreHandle, TabKeys,
    TitleBook,
};
use log::{error, info, warn};

/// Socket read timeout; bounds how late shutdown and liveness checks run.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<(), QuoteError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| QuoteError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let catalog_path = normalize_path(&args.catalog);
    let catalog = load_catalog(&catalog_path)?;
    let tabs = match &args.tabs {
        Some(path) => TabKeys::from_json_slice(&fs::read(path)?)?,
        None => TabKeys::default(),
    };
    let titles: TitleBook = match &args.titles {
        Some(path) => serde_json::from_slice(&fs::read(path)?)?,
        None => TitleBook::new(),
    };

    let server_ip = args.server_ip.trim().replace('"', "");
    let server_addr: SocketAddr = addr(&server_ip, FEED_PORT).parse()?;
    let socket = Arc::new(UdpSocket::bind(addr("0.0.0.0", args.listen_port))?);
    socket.set_read_timeout(Some(READ_TIMEOUT))?;
    info!("UDP client listening on: {}", socket.local_addr()?);

    let connected = Arc::new(AtomicBool::new(false));
    let channel = UdpPushChannel::new(Arc::clone(&socket), server_addr, Arc::clone(&connected));

    let store = StoreHandle::create_with_titles(titles);
    let updates = store.subscribe()?;
    let favorites = FavoritesLedger::open(JsonFileStorage::new(&args.favorites));
    let mut session = LiveSession::new(store, favorites, channel, tabs, args.tab);
    session.handle_event(ChannelEvent::Catalog(catalog))?;

    let (event_tx, event_rx) = unbounded::<ChannelEvent>();
    {
        let receiver = ChannelReceiver::new(Arc::clone(&socket), server_addr, connected);
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            if let Err(e) = receiver.run(event_tx, shutdown) {
                error!("Receiver loop failed: {:?}", e);
            }
        });
    }
    PingSender::start(Arc::clone(&socket), server_addr, shutdown.clone())?;

    let (cmd_tx, cmd_rx) = unbounded::<UserCommand>();
    commands::spawn_stdin_reader(cmd_tx);

    session.resync();
    info!("Client is running against {}. {}", server_addr, HELP);
    run_event_loop(
        &mut session,
        event_rx,
        cmd_rx,
        updates,
        &shutdown,
        Duration::from_millis(args.render_ms),
        &catalog_path,
    );

    session.router().channel().say_goodbye();
    session.teardown()?;
    Ok(())
}

/// The single event loop: channel events, user commands and redraw ticks are
/// handled one at a time, each to completion. Catalog expiry is checked on
/// the redraw tick.
fn run_event_loop(
    session: &mut LiveSession<UdpPushChannel>,
    events: Receiver<ChannelEvent>,
    commands: Receiver<UserCommand>,
    updates: Receiver<StoreEvent>,
    shutdown: &AtomicBool,
    render_every: Duration,
    catalog_path: &Path,
) {
    let redraw = tick(render_every);
    let no_commands = never::<UserCommand>();
    let mut stdin_open = true;
    let mut dirty = true;
    let mut reloaded_expiry = None;

    while !shutdown.load(Ordering::Relaxed) {
        let command_source = if stdin_open { &commands } else { &no_commands };
        select! {
            recv(events) -> msg => match msg {
                Ok(event) => {
                    if let Err(e) = session.handle_event(event) {
                        error!("Failed to handle channel event: {}", e);
                    }
                }
                Err(_) => {
                    warn!("Channel receiver stopped");
                    break;
                }
            },
            recv(command_source) -> msg => match msg {
                Ok(UserCommand::Quit) => break,
                Ok(command) => {
                    apply_command(session, command);
                    dirty = true;
                }
                Err(_) => stdin_open = false,
            },
            recv(updates) -> msg => match msg {
                Ok(StoreEvent::Shutdown) | Err(_) => break,
                Ok(_) => dirty = true,
            },
            recv(redraw) -> _ => {
                let now_ms = Utc::now().timestamp_millis();
                match refresh_expired_catalog(session, catalog_path, now_ms, &mut reloaded_expiry) {
                    Ok(true) => dirty = true,
                    Ok(false) => {}
                    Err(e) => warn!("Catalog reload failed: {}", e),
                }
                if dirty {
                    draw(session);
                    dirty = false;
                }
            },
        }
    }
    info!("Event loop stopping...");
}

fn apply_command(session: &mut LiveSession<UdpPushChannel>, command: UserCommand) {
    match command {
        UserCommand::Tab(tab) => {
            session.select_tab(tab);
        }
        UserCommand::Favorite(id) => match session.toggle_favorite(&id) {
            Ok(true) => info!("{} added to favorites", id),
            Ok(false) => info!("{} removed from favorites", id),
            Err(e) => warn!("Favorites not saved: {}", e),
        },
        UserCommand::Show(id) => {
            session.open_detail(id);
        }
        UserCommand::Close => {
            session.close_detail();
        }
        UserCommand::Help => println!("{}", HELP),
        UserCommand::List | UserCommand::Quit => {}
    }
}

fn draw(session: &LiveSession<UdpPushChannel>) {
    let frame = (|| -> Result<String> {
        let ticker = session.ticker_quotes()?;
        let rows = session.visible_quotes()?;
        let mut frame = render::ticker_line(&ticker);
        frame.push('\n');
        frame.push_str(&render::table(session.active_tab(), &rows, |q| session.is_favorite(q.id())));
        if let Some(quote) = session.detail_quote()? {
            frame.push_str(&render::detail(&quote));
        }
        Ok(frame)
    })();
    match frame {
        Ok(frame) => println!("{}", frame),
        Err(e) => error!("Failed to render: {}", e),
    }
}

/// Reloads the catalog file when the loaded snapshot has expired at `now_ms`.
///
/// Each expiry value triggers one reload attempt; a file that still carries
/// the same `expire` is not re-read on every tick. Returns `true` when a
/// catalog was applied.
fn refresh_expired_catalog<C: PushChannel>(
    session: &mut LiveSession<C>,
    path: &Path,
    now_ms: i64,
    reloaded_expiry: &mut Option<i64>,
) -> Result<bool> {
    let expire = match session.store().read()?.catalog() {
        Some(catalog) if catalog.is_expired(now_ms) => catalog.expire(),
        _ => return Ok(false),
    };
    if *reloaded_expiry == expire {
        return Ok(false);
    }
    *reloaded_expiry = expire;
    info!("Catalog expired, reloading {}", path.display());
    let catalog = load_catalog(path)?;
    session.handle_event(ChannelEvent::Catalog(catalog))?;
    Ok(true)
}

fn load_catalog(path: &Path) -> Result<CatalogPayload> {
    let bytes = fs::read(path).map_err(|e| QuoteError::Format(format!("Cannot read catalog {}: {}", path.display(), e)))?;
    let catalog = CatalogPayload::from_json_slice(&bytes)?;
    info!("Catalog loaded: {} definitions, {} fields", catalog.definitions.len(), catalog.fields.len());
    Ok(catalog)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livequote_common::InstrumentId;
    use livequote_store::{MemoryStorage, ViewTab};

    struct OfflineChannel;

    impl PushChannel for OfflineChannel {
        fn subscribe(&mut self, _keys: &[InstrumentId]) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            false
        }
    }

    fn offline_session() -> LiveSession<OfflineChannel> {
        let favorites = FavoritesLedger::open(MemoryStorage::default());
        LiveSession::new(StoreHandle::create(), favorites, OfflineChannel, TabKeys::default(), ViewTab::Currency)
    }

    fn catalog_json(title: &str, expire: i64) -> String {
        format!(r#"{{"definitions":[{{"_id":"USD1","title":"{}"}}],"expire":{}}}"#, title, expire)
    }

    fn usd_title(session: &LiveSession<OfflineChannel>) -> Option<String> {
        let store = session.store().read().unwrap();
        store.definition(&"USD1".into()).and_then(|d| d.title.clone())
    }

    #[test]
    fn expired_catalog_is_reloaded_once_per_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, catalog_json("Dollar", 1_000)).unwrap();

        let mut session = offline_session();
        session.handle_event(ChannelEvent::Catalog(load_catalog(&path).unwrap())).unwrap();
        let mut reloaded = None;

        assert!(!refresh_expired_catalog(&mut session, &path, 999, &mut reloaded).unwrap());

        fs::write(&path, catalog_json("US Dollar", 5_000)).unwrap();
        assert!(refresh_expired_catalog(&mut session, &path, 1_000, &mut reloaded).unwrap());
        assert_eq!(usd_title(&session).as_deref(), Some("US Dollar"));
        assert!(!refresh_expired_catalog(&mut session, &path, 2_000, &mut reloaded).unwrap());

        // The file was not refreshed in time: one attempt, then wait for a new expiry.
        assert!(refresh_expired_catalog(&mut session, &path, 6_000, &mut reloaded).unwrap());
        assert!(!refresh_expired_catalog(&mut session, &path, 7_000, &mut reloaded).unwrap());
    }

    #[test]
    fn unreadable_catalog_keeps_the_loaded_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, catalog_json("Dollar", 1_000)).unwrap();
        let mut session = offline_session();
        session.handle_event(ChannelEvent::Catalog(load_catalog(&path).unwrap())).unwrap();

        fs::write(&path, "{broken").unwrap();
        let mut reloaded = None;
        assert!(refresh_expired_catalog(&mut session, &path, 1_000, &mut reloaded).is_err());
        assert_eq!(usd_title(&session).as_deref(), Some("Dollar"));
        assert!(!refresh_expired_catalog(&mut session, &path, 1_500, &mut reloaded).unwrap());
    }

    #[test]
    fn normalize_strips_matching_quotes() {
        assert_eq!(normalize_path("  \"C:\\data\\catalog.json\" "), PathBuf::from("C:\\data\\catalog.json"));
        assert_eq!(normalize_path("\"half"), PathBuf::from("\"half"));
    }
}
