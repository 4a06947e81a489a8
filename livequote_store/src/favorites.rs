//! Persisted set of favorite instrument ids.
//!
//! The ledger keeps its ids in stored order: a new favorite is appended and a
//! removed one is taken out in place. Re-adding the id removed by the previous
//! toggle puts it back at its old position, so two toggles of the same id
//! restore the exact original array whatever order it was stored in.
//! Every `toggle` rewrites the whole array before returning. A failed write
//! keeps the in-memory change and reports the error to the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use livequote_common::{InstrumentId, QuoteError, Result};
use log::{debug, warn};

/// Key/value style slot holding the JSON-encoded favorites array.
pub trait FavoritesStorage: Send {
    /// Reads the stored JSON, `None` if nothing was ever written.
    fn load(&self) -> Result<Option<String>>;
    /// Replaces the stored JSON.
    fn save(&self, json: &str) -> Result<()>;
}

/// Favorites kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuoteError::Io(e)),
        }
    }

    fn save(&self, json: &str) -> Result<()> {
        fs::write(&self.path, json)
            .map_err(|e| QuoteError::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}

/// In-process storage slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Storage pre-filled with `json`.
    pub fn with_contents(json: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut slot) = storage.slot.lock() {
            *slot = Some(json.into());
        }
        storage
    }

    /// Current stored JSON.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// While read-only, every `save` fails as a full or locked store would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl FavoritesStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock()?.clone())
    }

    fn save(&self, json: &str) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(QuoteError::Persistence("storage is read-only".to_string()));
        }
        *self.slot.lock()? = Some(json.to_string());
        Ok(())
    }
}

/// Favorite instrument ids, mirrored to a [`FavoritesStorage`].
pub struct FavoritesLedger {
    ids: Vec<InstrumentId>,
    /// Id removed by the previous toggle and the index it had.
    last_removed: Option<(InstrumentId, usize)>,
    storage: Box<dyn FavoritesStorage>,
}

impl FavoritesLedger {
    /// Reads the persisted set. Missing, unreadable or malformed storage
    /// starts an empty ledger. Repeated ids keep their first position.
    pub fn open(storage: impl FavoritesStorage + 'static) -> Self {
        let ids = match storage.load() {
            Ok(Some(json)) => match serde_json::from_str::<Vec<InstrumentId>>(&json) {
                Ok(stored) => {
                    let mut ids: Vec<InstrumentId> = Vec::with_capacity(stored.len());
                    for id in stored {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    ids
                }
                Err(e) => {
                    warn!("Ignoring malformed favorites: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read favorites: {}", e);
                Vec::new()
            }
        };
        debug!("Favorites loaded: {} ids", ids.len());
        Self {
            ids,
            last_removed: None,
            storage: Box::new(storage),
        }
    }

    /// Adds `id` if absent, removes it if present, then persists the set.
    ///
    /// Returns whether `id` is a favorite afterwards. On a persistence error
    /// the in-memory set keeps the new state.
    pub fn toggle(&mut self, id: &InstrumentId) -> Result<bool> {
        let now_favorite = match self.ids.iter().position(|known| known == id) {
            Some(index) => {
                let removed = self.ids.remove(index);
                self.last_removed = Some((removed, index));
                false
            }
            None => {
                match self.last_removed.take() {
                    Some((removed, index)) if removed == *id => {
                        self.ids.insert(index.min(self.ids.len()), removed);
                    }
                    _ => self.ids.push(id.clone()),
                }
                true
            }
        };
        self.persist()?;
        Ok(now_favorite)
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.ids.contains(id)
    }

    /// Ids in the order they were added.
    pub fn ids(&self) -> impl Iterator<Item = &InstrumentId> {
        self.ids.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The JSON array as it is written to storage.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.ids)?)
    }

    fn persist(&self) -> Result<()> {
        let json = self.to_json()?;
        self.storage.save(&json)
    }
}
