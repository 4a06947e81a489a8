//! Quote reconciliation store.
//!
//! The store receives batches of partial quote records and merges them into
//! one quote per instrument id, joined against the definition catalog.
//! Quotes live in a `BTreeMap`, so the collection is unique by id and always
//! iterates in ascending id order; every read is a consistent snapshot.
//!
//! Lifecycle:
//! - [`StorePhase::Uninitialized`] until the first definitions load. Patches
//!   are still accepted, they just stay unjoined.
//! - [`StorePhase::Ready`] afterwards. A reload swaps the catalog `Arc` in one
//!   assignment and re-joins every stored quote.
//!
//! Change notifications are broadcast over `crossbeam_channel`; a subscriber
//! whose receiver was dropped is removed on the next broadcast.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam_channel::{Receiver, Sender, unbounded};
use livequote_common::{CatalogPayload, FieldMeta, InstrumentDefinition, InstrumentId, QuotePatch, Result};
use log::{debug, info};

use crate::catalog::{DefinitionCatalog, TitleBook};
use crate::favorites::FavoritesLedger;
use crate::quote::Quote;

/// Whether a catalog has been loaded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// No definitions loaded; quotes carry no definition-derived fields.
    Uninitialized,
    /// Definitions loaded at least once.
    Ready,
}

/// Message sent by the store to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Quotes for these ids (ascending, de-duplicated) changed.
    Updated(Vec<InstrumentId>),
    /// Definitions or field metadata were replaced.
    CatalogReplaced,
    /// The store was torn down; consumers should stop.
    Shutdown,
}

/// Single authoritative collection of reconciled quotes.
#[derive(Default)]
pub struct QuoteStore {
    quotes: BTreeMap<InstrumentId, Quote>,
    catalog: Option<Arc<DefinitionCatalog>>,
    fields: Arc<Vec<FieldMeta>>,
    titles: TitleBook,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl QuoteStore {
    /// Empty, uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store whose titles are taken from `titles` first.
    pub fn with_titles(titles: TitleBook) -> Self {
        Self {
            titles,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> StorePhase {
        if self.catalog.is_some() {
            StorePhase::Ready
        } else {
            StorePhase::Uninitialized
        }
    }

    /// Merges a batch of patches, in slice order.
    ///
    /// A patch for an unseen id creates a quote holding exactly its fields; a
    /// patch for a known id overwrites only the fields it carries. Each touched
    /// quote is re-joined against the current catalog. Never fails.
    pub fn apply_patch_batch(&mut self, patches: &[QuotePatch]) {
        if patches.is_empty() {
            return;
        }
        let catalog = self.catalog.as_deref();
        let mut touched: BTreeSet<&InstrumentId> = BTreeSet::new();
        for patch in patches {
            if let Some(quote) = self.quotes.get_mut(&patch.id) {
                quote.merge(patch);
                quote.join(catalog, &self.titles);
            } else {
                let mut quote = Quote::from_patch(patch);
                quote.join(catalog, &self.titles);
                self.quotes.insert(patch.id.clone(), quote);
            }
            touched.insert(&patch.id);
        }
        debug!("Merged {} patches into {} quotes", patches.len(), touched.len());
        let touched = touched.into_iter().cloned().collect();
        self.broadcast(StoreEvent::Updated(touched));
    }

    /// Quotes whose id is in `keys`, ascending by id. Ids without a quote are
    /// skipped and repeated keys yield one quote.
    pub fn query_by_keys<'a, I>(&self, keys: I) -> Vec<Quote>
    where
        I: IntoIterator<Item = &'a InstrumentId>,
    {
        let wanted: BTreeSet<&InstrumentId> = keys.into_iter().collect();
        wanted
            .into_iter()
            .filter_map(|id| self.quotes.get(id))
            .cloned()
            .collect()
    }

    /// Quotes for every favorite id that has data, ascending by id.
    pub fn query_favorites(&self, favorites: &FavoritesLedger) -> Vec<Quote> {
        self.query_by_keys(favorites.ids())
    }

    /// Selection used by table views.
    ///
    /// An empty `keys` slice means "favorites view" as long as there are
    /// favorites; with no favorites it yields nothing. Prefer
    /// [`QuoteStore::query_by_keys`] or [`QuoteStore::query_favorites`] when
    /// the intent is known.
    pub fn query_selection(&self, keys: &[InstrumentId], favorites: &FavoritesLedger) -> Vec<Quote> {
        if keys.is_empty() && !favorites.is_empty() {
            return self.query_favorites(favorites);
        }
        self.query_by_keys(keys)
    }

    /// Quote for a single instrument.
    pub fn get(&self, id: &InstrumentId) -> Option<&Quote> {
        self.quotes.get(id)
    }

    /// Every stored quote, ascending by id.
    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.values()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Replaces the definition catalog wholesale and re-joins stored quotes.
    pub fn set_definitions(&mut self, definitions: Vec<InstrumentDefinition>) {
        self.replace_catalog(DefinitionCatalog::new(definitions));
    }

    /// Replaces the field metadata wholesale.
    pub fn set_definition_fields(&mut self, fields: Vec<FieldMeta>) {
        self.fields = Arc::new(fields);
        self.broadcast(StoreEvent::CatalogReplaced);
    }

    /// Applies a full loader response: definitions (with expiry) and fields.
    pub fn load_catalog(&mut self, payload: CatalogPayload) {
        self.fields = Arc::new(payload.fields);
        self.replace_catalog(DefinitionCatalog::with_expiry(payload.definitions, payload.expire));
    }

    pub fn catalog(&self) -> Option<&Arc<DefinitionCatalog>> {
        self.catalog.as_ref()
    }

    pub fn definition(&self, id: &InstrumentId) -> Option<&InstrumentDefinition> {
        self.catalog.as_ref()?.lookup(id).map(Arc::as_ref)
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Registers a subscriber for change notifications.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn replace_catalog(&mut self, catalog: DefinitionCatalog) {
        let catalog = Arc::new(catalog);
        for quote in self.quotes.values_mut() {
            quote.join(Some(catalog.as_ref()), &self.titles);
        }
        info!("Catalog replaced: {} definitions", catalog.len());
        self.catalog = Some(catalog);
        self.broadcast(StoreEvent::CatalogReplaced);
    }

    fn broadcast(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn shutdown(&mut self) {
        self.broadcast(StoreEvent::Shutdown);
        self.subscribers.clear();
        self.quotes.clear();
        self.catalog = None;
    }
}

/// Shared handle to a [`QuoteStore`].
///
/// Clones refer to the same store. Writers take the write lock for a whole
/// batch, so readers only ever see fully merged state.
#[derive(Clone, Default)]
pub struct StoreHandle {
    inner: Arc<RwLock<QuoteStore>>,
}

impl StoreHandle {
    /// Creates a fresh, uninitialized store.
    pub fn create() -> Self {
        Self::default()
    }

    /// Creates a store with a fixed title table.
    pub fn create_with_titles(titles: TitleBook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(QuoteStore::with_titles(titles))),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, QuoteStore>> {
        Ok(self.inner.read()?)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, QuoteStore>> {
        Ok(self.inner.write()?)
    }

    pub fn apply_patch_batch(&self, patches: &[QuotePatch]) -> Result<()> {
        self.write()?.apply_patch_batch(patches);
        Ok(())
    }

    pub fn query_selection(&self, keys: &[InstrumentId], favorites: &FavoritesLedger) -> Result<Vec<Quote>> {
        Ok(self.read()?.query_selection(keys, favorites))
    }

    pub fn get(&self, id: &InstrumentId) -> Result<Option<Quote>> {
        Ok(self.read()?.get(id).cloned())
    }

    pub fn load_catalog(&self, payload: CatalogPayload) -> Result<()> {
        self.write()?.load_catalog(payload);
        Ok(())
    }

    pub fn subscribe(&self) -> Result<Receiver<StoreEvent>> {
        Ok(self.write()?.subscribe())
    }

    /// Notifies subscribers with [`StoreEvent::Shutdown`] and clears the store.
    /// Other clones of the handle observe an empty, uninitialized store.
    pub fn teardown(self) -> Result<()> {
        self.write()?.shutdown();
        Ok(())
    }
}
