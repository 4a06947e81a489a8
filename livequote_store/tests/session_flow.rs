//! End-to-end flow through `LiveSession` with a recording push channel.

use std::cell::RefCell;
use std::rc::Rc;

use livequote_common::{CatalogPayload, InstrumentDefinition, InstrumentId, QuotePatch, Result};
use livequote_store::{
    ChannelEvent, FavoritesLedger, LiveSession, MemoryStorage, PushChannel, StoreEvent, StoreHandle,
    SyncOutcome, TabKeys, ViewTab,
};

#[derive(Clone, Default)]
struct FakeChannel {
    connected: Rc<RefCell<bool>>,
    sent: Rc<RefCell<Vec<Vec<String>>>>,
}

impl FakeChannel {
    fn set_connected(&self, connected: bool) {
        *self.connected.borrow_mut() = connected;
    }

    fn sent(&self) -> Vec<Vec<String>> {
        self.sent.borrow().clone()
    }
}

impl PushChannel for FakeChannel {
    fn subscribe(&mut self, keys: &[InstrumentId]) -> Result<()> {
        self.sent
            .borrow_mut()
            .push(keys.iter().map(|k| k.to_string()).collect());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}

fn tabs() -> TabKeys {
    TabKeys {
        currency: vec!["USD1".into(), "EUR1".into()],
        gold: vec!["XAU1".into()],
        ticker: vec!["USD1".into()],
    }
}

fn patch(id: &str, last: f64) -> QuotePatch {
    let mut p = QuotePatch::new(id);
    p.fields.last = Some(last);
    p
}

fn session(storage: MemoryStorage) -> (LiveSession<FakeChannel>, FakeChannel) {
    let channel = FakeChannel::default();
    let session = LiveSession::new(
        StoreHandle::create(),
        FavoritesLedger::open(storage),
        channel.clone(),
        tabs(),
        ViewTab::Currency,
    );
    (session, channel)
}

#[test]
fn connect_subscribes_for_mounted_views() {
    let (mut session, channel) = session(MemoryStorage::default());
    session.handle_event(ChannelEvent::Connected).unwrap();
    channel.set_connected(true);
    session.handle_event(ChannelEvent::Connected).unwrap();
    assert_eq!(channel.sent(), vec![vec!["EUR1", "USD1"]]);
}

#[test]
fn tab_switch_replaces_interest_and_selection() {
    let (mut session, channel) = session(MemoryStorage::default());
    channel.set_connected(true);
    session.handle_event(ChannelEvent::Connected).unwrap();
    session
        .handle_event(ChannelEvent::QuoteData(vec![patch("USD1", 32.0), patch("XAU1", 2400.0)]))
        .unwrap();

    assert_eq!(session.select_tab(ViewTab::Gold), SyncOutcome::Sent);
    assert_eq!(channel.sent().last().unwrap(), &vec!["USD1", "XAU1"]);
    let rows = session.visible_quotes().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id().as_str(), "XAU1");

    assert_eq!(session.select_tab(ViewTab::Gold), SyncOutcome::Unchanged);
}

#[test]
fn favorites_tab_tracks_toggles() {
    let storage = MemoryStorage::default();
    let (mut session, channel) = session(storage.clone());
    channel.set_connected(true);
    session.select_tab(ViewTab::Favorites);
    session
        .handle_event(ChannelEvent::QuoteData(vec![patch("USD1", 32.0), patch("EUR1", 35.0)]))
        .unwrap();
    assert!(session.visible_quotes().unwrap().is_empty());

    assert!(session.toggle_favorite(&"EUR1".into()).unwrap());
    assert_eq!(channel.sent().last().unwrap(), &vec!["EUR1", "USD1"]);
    let rows = session.visible_quotes().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id().as_str(), "EUR1");
    assert_eq!(storage.contents().as_deref(), Some(r#"["EUR1"]"#));
}

#[test]
fn failed_favorite_write_still_updates_view() {
    let storage = MemoryStorage::default();
    let (mut session, channel) = session(storage.clone());
    channel.set_connected(true);
    storage.set_read_only(true);

    assert!(session.toggle_favorite(&"XAU1".into()).is_err());
    assert!(session.is_favorite(&"XAU1".into()));
    assert_eq!(storage.contents(), None);
}

#[test]
fn reconnect_replays_last_interest() {
    let (mut session, channel) = session(MemoryStorage::default());
    session.open_detail("GBP1".into());
    assert!(channel.sent().is_empty());

    channel.set_connected(true);
    session.handle_event(ChannelEvent::Connected).unwrap();
    session.handle_event(ChannelEvent::Disconnected).unwrap();
    channel.set_connected(false);
    session.close_detail();
    channel.set_connected(true);
    session.handle_event(ChannelEvent::Connected).unwrap();

    assert_eq!(
        channel.sent(),
        vec![vec!["EUR1", "GBP1", "USD1"], vec!["EUR1", "USD1"]]
    );
}

#[test]
fn catalog_event_joins_titles_and_notifies() {
    let (mut session, _channel) = session(MemoryStorage::default());
    let events = session.store().subscribe().unwrap();
    session
        .handle_event(ChannelEvent::QuoteData(vec![patch("USD1", 32.0)]))
        .unwrap();
    session
        .handle_event(ChannelEvent::Catalog(CatalogPayload {
            definitions: vec![InstrumentDefinition::titled("USD1", "US Dollar")],
            ..Default::default()
        }))
        .unwrap();

    assert_eq!(events.try_recv().unwrap(), StoreEvent::Updated(vec!["USD1".into()]));
    assert_eq!(events.try_recv().unwrap(), StoreEvent::CatalogReplaced);
    let ticker = session.ticker_quotes().unwrap();
    assert_eq!(ticker[0].title(), Some("US Dollar"));

    session.open_detail("USD1".into());
    assert_eq!(session.detail_quote().unwrap().unwrap().fields().last, Some(32.0));

    session.teardown().unwrap();
    assert_eq!(events.try_recv().unwrap(), StoreEvent::Shutdown);
}
