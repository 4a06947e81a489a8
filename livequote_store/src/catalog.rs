//! Definition catalog and display-title lookup.
//!
//! The catalog is built once from a loader response and never mutated; a
//! reload produces a fresh `DefinitionCatalog` that replaces the old one in a
//! single assignment.

use std::collections::HashMap;
use std::sync::Arc;

use livequote_common::{InstrumentDefinition, InstrumentId};
use log::debug;
use serde::{Deserialize, Serialize};

/// Immutable index of instrument definitions keyed by id.
#[derive(Debug, Default)]
pub struct DefinitionCatalog {
    definitions: HashMap<InstrumentId, Arc<InstrumentDefinition>>,
    expire: Option<i64>,
}

impl DefinitionCatalog {
    /// Index `definitions` by id. A repeated id keeps the later definition.
    pub fn new(definitions: Vec<InstrumentDefinition>) -> Self {
        let mut index = HashMap::with_capacity(definitions.len());
        for def in definitions {
            if let Some(previous) = index.insert(def.id.clone(), Arc::new(def)) {
                debug!("Duplicate definition for {}, keeping the later one", previous.id);
            }
        }
        Self {
            definitions: index,
            expire: None,
        }
    }

    /// Same as [`DefinitionCatalog::new`], remembering the snapshot expiry.
    pub fn with_expiry(definitions: Vec<InstrumentDefinition>, expire: Option<i64>) -> Self {
        Self {
            expire,
            ..Self::new(definitions)
        }
    }

    /// Definition for `id`, if the catalog knows it.
    pub fn lookup(&self, id: &InstrumentId) -> Option<&Arc<InstrumentDefinition>> {
        self.definitions.get(id)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// `true` when the loader returned no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Expiry of the snapshot in milliseconds since the Unix epoch, if the loader sent one.
    pub fn expire(&self) -> Option<i64> {
        self.expire
    }

    /// `true` if the snapshot carries an expiry at or before `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expire.is_some_and(|expire| expire <= now_ms)
    }
}

/// Fixed id → title table that takes precedence over catalog titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleBook(HashMap<InstrumentId, String>);

impl TitleBook {
    /// Empty table; titles then come from the catalog only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Title registered for `id`.
    pub fn get(&self, id: &InstrumentId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Display title for an instrument: the table entry, else the definition's
    /// `title`, else its English security description.
    pub fn derive(&self, id: &InstrumentId, definition: Option<&InstrumentDefinition>) -> Option<String> {
        if let Some(title) = self.get(id) {
            return Some(title.to_string());
        }
        let def = definition?;
        def.title.clone().or_else(|| def.security_desc_en.clone())
    }
}

impl<K: Into<InstrumentId>, V: Into<String>> FromIterator<(K, V)> for TitleBook {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        TitleBook(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
