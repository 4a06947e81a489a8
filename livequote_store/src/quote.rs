//! The reconciled, definition-joined quote served to views.

use std::sync::Arc;

use livequote_common::{InstrumentDefinition, InstrumentId, QuoteFields, QuotePatch};

use crate::catalog::{DefinitionCatalog, TitleBook};

/// Decimals used when the catalog does not specify a precision.
pub const DEFAULT_PRECISION: u32 = 2;

/// Upper bound on display decimals; larger catalog values are clamped.
pub const MAX_PRECISION: u32 = 10;

/// Latest known state of one instrument.
///
/// Fields hold the most recent value ever streamed for them; a field that no
/// patch has supplied yet is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    id: InstrumentId,
    fields: QuoteFields,
    definition: Option<Arc<InstrumentDefinition>>,
    title: Option<String>,
}

impl Quote {
    /// New quote holding exactly the fields present in `patch`, not yet joined.
    pub(crate) fn from_patch(patch: &QuotePatch) -> Self {
        Self {
            id: patch.id.clone(),
            fields: patch.fields.clone(),
            definition: None,
            title: None,
        }
    }

    pub(crate) fn merge(&mut self, patch: &QuotePatch) {
        debug_assert_eq!(self.id, patch.id);
        self.fields.merge(&patch.fields);
    }

    /// Recomputes the joined definition and title from the current catalog.
    pub(crate) fn join(&mut self, catalog: Option<&DefinitionCatalog>, titles: &TitleBook) {
        self.definition = catalog.and_then(|c| c.lookup(&self.id)).cloned();
        self.title = titles.derive(&self.id, self.definition.as_deref());
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn fields(&self) -> &QuoteFields {
        &self.fields
    }

    /// Catalog entry for this instrument, absent on a join miss.
    pub fn definition(&self) -> Option<&InstrumentDefinition> {
        self.definition.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Instrument code from the catalog (used for icons and history lookups).
    pub fn code(&self) -> Option<&str> {
        self.definition()?.code.as_deref()
    }

    pub fn legacy_code(&self) -> Option<&str> {
        self.definition()?.legacy_code.as_deref()
    }

    /// Display precision from the catalog, or [`DEFAULT_PRECISION`], never
    /// above [`MAX_PRECISION`].
    pub fn precision(&self) -> u32 {
        self.definition()
            .and_then(|d| d.precision)
            .unwrap_or(DEFAULT_PRECISION)
            .min(MAX_PRECISION)
    }

    /// Change relative to the last price (`c / l`).
    pub fn change_ratio(&self) -> Option<f64> {
        let last = self.fields.last?;
        let change = self.fields.change?;
        if last == 0.0 {
            return None;
        }
        Some(change / last)
    }

    /// `Some(true)` when the change is positive.
    pub fn is_rising(&self) -> Option<bool> {
        self.fields.change.map(|c| c > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(id: &str, last: Option<f64>, change: Option<f64>) -> QuotePatch {
        let mut p = QuotePatch::new(id);
        p.fields.last = last;
        p.fields.change = change;
        p
    }

    #[test]
    fn change_ratio_needs_both_fields() {
        let mut quote = Quote::from_patch(&patch("USD1", Some(200.0), None));
        assert_eq!(quote.change_ratio(), None);
        quote.merge(&patch("USD1", None, Some(5.0)));
        assert_eq!(quote.change_ratio(), Some(0.025));
        assert_eq!(quote.is_rising(), Some(true));

        let zero = Quote::from_patch(&patch("Z", Some(0.0), Some(1.0)));
        assert_eq!(zero.change_ratio(), None);
    }

    #[test]
    fn join_miss_leaves_definition_fields_absent() {
        let catalog = DefinitionCatalog::new(vec![InstrumentDefinition::titled("USD1", "US Dollar")]);
        let mut quote = Quote::from_patch(&patch("ZZZ9", Some(1.0), None));
        quote.join(Some(&catalog), &TitleBook::new());
        assert!(quote.definition().is_none());
        assert_eq!(quote.title(), None);
        assert_eq!(quote.precision(), DEFAULT_PRECISION);
    }

    #[test]
    fn join_picks_up_precision_and_codes() {
        let mut def = InstrumentDefinition::titled("EUR1", "Euro");
        def.precision = Some(4);
        def.code = Some("EUR".into());
        def.legacy_code = Some("EUR/TRY".into());
        let catalog = DefinitionCatalog::new(vec![def]);
        let mut quote = Quote::from_patch(&patch("EUR1", Some(35.0), None));
        quote.join(Some(&catalog), &TitleBook::new());
        assert_eq!(quote.precision(), 4);
        assert_eq!(quote.code(), Some("EUR"));
        assert_eq!(quote.legacy_code(), Some("EUR/TRY"));
        assert_eq!(quote.title(), Some("Euro"));
    }

    #[test]
    fn oversized_precision_is_clamped() {
        let mut def = InstrumentDefinition::titled("XAU1", "Gold");
        def.precision = Some(4_000_000_000);
        let catalog = DefinitionCatalog::new(vec![def]);
        let mut quote = Quote::from_patch(&patch("XAU1", Some(2650.0), None));
        quote.join(Some(&catalog), &TitleBook::new());
        assert_eq!(quote.precision(), MAX_PRECISION);
    }
}
