//! Tabs and the instrument keys each one needs.
//!
//! Tables query with [`TabKeys::selection_keys`]; the favorites tab uses the
//! empty-keys sentinel. The router is fed [`TabKeys::interest_keys`], which
//! folds every mounted view (the active tab, the ticker strip and an open
//! detail page) into one set, because each subscribe replaces the previous one.

use std::collections::BTreeSet;

use clap::ValueEnum;
use livequote_common::{InstrumentId, Result};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::favorites::FavoritesLedger;

/// Table tab shown by the client.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
)]
#[clap(rename_all = "lower")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ViewTab {
    /// Foreign currencies.
    #[default]
    Currency,
    /// Gold and other precious metals.
    Gold,
    /// The user's favorites.
    Favorites,
}

/// Instrument keys per tab, plus the always-visible ticker strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabKeys {
    pub currency: Vec<InstrumentId>,
    pub gold: Vec<InstrumentId>,
    pub ticker: Vec<InstrumentId>,
}

impl Default for TabKeys {
    fn default() -> Self {
        let ids = |raw: &[&str]| -> Vec<InstrumentId> { raw.iter().map(|s| InstrumentId::from(*s)).collect() };
        Self {
            currency: ids(&["USD1", "EUR1", "GBP1", "CHF1", "JPY1", "EURUSD1"]),
            gold: ids(&["XAU1", "XAG1", "GAU1", "CEYREK1"]),
            ticker: ids(&["USD1", "EUR1", "XAU1", "GAU1"]),
        }
    }
}

impl TabKeys {
    /// Reads a tab layout from JSON; missing tabs keep their defaults.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Keys a tab's table queries with. Favorites answer the empty sentinel.
    pub fn selection_keys(&self, tab: ViewTab) -> &[InstrumentId] {
        match tab {
            ViewTab::Currency => &self.currency,
            ViewTab::Gold => &self.gold,
            ViewTab::Favorites => &[],
        }
    }

    /// Everything the mounted views need live data for, ascending and
    /// de-duplicated.
    ///
    /// The favorites tab contributes the favorite ids when there are any. The
    /// ticker strip and an open detail page are always included.
    pub fn interest_keys(
        &self,
        tab: ViewTab,
        favorites: &FavoritesLedger,
        detail: Option<&InstrumentId>,
    ) -> Vec<InstrumentId> {
        let mut keys: BTreeSet<&InstrumentId> = BTreeSet::new();
        if tab == ViewTab::Favorites && !favorites.is_empty() {
            keys.extend(favorites.ids());
        } else {
            keys.extend(self.selection_keys(tab));
        }
        keys.extend(&self.ticker);
        keys.extend(detail);
        keys.into_iter().cloned().collect()
    }
}
