//! Wiring between the push channel, the store, the favorites and the views.
//!
//! `LiveSession` is driven from one event loop: channel events and user
//! intents are handled one at a time, each to completion. Any intent that can
//! change the set of instruments on screen re-runs the router.

use livequote_common::{CatalogPayload, InstrumentId, QuotePatch, Result};
use log::{debug, info};

use crate::favorites::FavoritesLedger;
use crate::quote::Quote;
use crate::router::{PushChannel, SubscriptionRouter, SyncOutcome};
use crate::store::StoreHandle;
use crate::views::{TabKeys, ViewTab};

/// Inbound event from the push channel or the catalog loader.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The channel (re)connected.
    Connected,
    /// The channel went away.
    Disconnected,
    /// A decoded `currencyData` batch.
    QuoteData(Vec<QuotePatch>),
    /// A catalog loader response.
    Catalog(CatalogPayload),
}

/// One user's live view of the market.
pub struct LiveSession<C> {
    store: StoreHandle,
    favorites: FavoritesLedger,
    router: SubscriptionRouter<C>,
    tabs: TabKeys,
    active_tab: ViewTab,
    detail: Option<InstrumentId>,
}

impl<C: PushChannel> LiveSession<C> {
    pub fn new(store: StoreHandle, favorites: FavoritesLedger, channel: C, tabs: TabKeys, tab: ViewTab) -> Self {
        Self {
            store,
            favorites,
            router: SubscriptionRouter::new(channel),
            tabs,
            active_tab: tab,
            detail: None,
        }
    }

    /// Applies one channel event.
    pub fn handle_event(&mut self, event: ChannelEvent) -> Result<()> {
        match event {
            ChannelEvent::Connected => {
                if self.router.current_interest().is_none() {
                    self.resync();
                } else {
                    self.router.on_connect();
                }
            }
            ChannelEvent::Disconnected => {
                info!("Push channel disconnected");
                self.router.on_disconnect();
            }
            ChannelEvent::QuoteData(patches) => self.store.apply_patch_batch(&patches)?,
            ChannelEvent::Catalog(payload) => self.store.load_catalog(payload)?,
        }
        Ok(())
    }

    pub fn select_tab(&mut self, tab: ViewTab) -> SyncOutcome {
        debug!("Switching to tab {}", tab);
        self.active_tab = tab;
        self.resync()
    }

    /// Shows a single instrument next to the table.
    pub fn open_detail(&mut self, id: InstrumentId) -> SyncOutcome {
        self.detail = Some(id);
        self.resync()
    }

    pub fn close_detail(&mut self) -> SyncOutcome {
        self.detail = None;
        self.resync()
    }

    /// Toggles a favorite and refreshes interest, which depends on favorites.
    ///
    /// The interest is refreshed even when persisting the favorites failed.
    pub fn toggle_favorite(&mut self, id: &InstrumentId) -> Result<bool> {
        let toggled = self.favorites.toggle(id);
        self.resync();
        toggled
    }

    pub fn is_favorite(&self, id: &InstrumentId) -> bool {
        self.favorites.contains(id)
    }

    /// Rows of the active tab's table.
    pub fn visible_quotes(&self) -> Result<Vec<Quote>> {
        self.store
            .query_selection(self.tabs.selection_keys(self.active_tab), &self.favorites)
    }

    /// Quotes shown in the ticker strip.
    pub fn ticker_quotes(&self) -> Result<Vec<Quote>> {
        Ok(self.store.read()?.query_by_keys(&self.tabs.ticker))
    }

    /// Quote of the open detail page, if one is open and has data.
    pub fn detail_quote(&self) -> Result<Option<Quote>> {
        match &self.detail {
            Some(id) => self.store.get(id),
            None => Ok(None),
        }
    }

    /// Recomputes the interest set from the mounted views and hands it to the router.
    pub fn resync(&mut self) -> SyncOutcome {
        let keys = self
            .tabs
            .interest_keys(self.active_tab, &self.favorites, self.detail.as_ref());
        self.router.sync_interest(keys)
    }

    pub fn active_tab(&self) -> ViewTab {
        self.active_tab
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn favorites(&self) -> &FavoritesLedger {
        &self.favorites
    }

    pub fn router(&self) -> &SubscriptionRouter<C> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut SubscriptionRouter<C> {
        &mut self.router
    }

    /// Tears the store down and hands back the channel.
    pub fn teardown(self) -> Result<C> {
        self.store.teardown()?;
        Ok(self.router.into_channel())
    }
}
