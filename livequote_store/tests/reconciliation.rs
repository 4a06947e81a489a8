//! Merge, uniqueness and ordering properties of the quote store.

use std::collections::{BTreeSet, HashMap};

use livequote_common::{InstrumentDefinition, InstrumentId, QuoteFields, QuotePatch};
use livequote_store::{FavoritesLedger, MemoryStorage, QuoteStore};
use proptest::prelude::*;

const IDS: [&str; 5] = ["EUR1", "GAU1", "USD1", "XAU1", "ZZZ9"];

fn price() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(-1_000.0f64..1_000.0)
}

fn patch_strategy() -> impl Strategy<Value = QuotePatch> {
    (prop::sample::select(IDS.to_vec()), price(), price(), price(), price(), price()).prop_map(
        |(id, last, change, bid, ask, year_high)| QuotePatch {
            id: InstrumentId::from(id),
            fields: QuoteFields {
                last,
                change,
                bid,
                ask,
                year_high,
                ..Default::default()
            },
        },
    )
}

fn batches() -> impl Strategy<Value = Vec<Vec<QuotePatch>>> {
    prop::collection::vec(prop::collection::vec(patch_strategy(), 0..6), 0..8)
}

fn catalog() -> Vec<InstrumentDefinition> {
    vec![
        InstrumentDefinition::titled("USD1", "US Dollar"),
        InstrumentDefinition::titled("EUR1", "Euro"),
        InstrumentDefinition::titled("XAU1", "Gold Ounce"),
    ]
}

proptest! {
    #[test]
    fn later_patch_without_field_keeps_earlier_value(first in patch_strategy(), mut second in patch_strategy()) {
        second.id = first.id.clone();
        let mut store = QuoteStore::new();
        store.apply_patch_batch(&[first.clone()]);
        store.apply_patch_batch(&[second.clone()]);

        let merged = store.get(&first.id).unwrap().fields();
        prop_assert_eq!(merged.last, second.fields.last.or(first.fields.last));
        prop_assert_eq!(merged.change, second.fields.change.or(first.fields.change));
        prop_assert_eq!(merged.bid, second.fields.bid.or(first.fields.bid));
        prop_assert_eq!(merged.ask, second.fields.ask.or(first.fields.ask));
        prop_assert_eq!(merged.year_high, second.fields.year_high.or(first.fields.year_high));
        prop_assert_eq!(merged.day_low, None);
    }

    #[test]
    fn applying_a_patch_twice_equals_once(history in batches(), patch in patch_strategy()) {
        let mut once = QuoteStore::new();
        let mut twice = QuoteStore::new();
        for store in [&mut once, &mut twice] {
            store.set_definitions(catalog());
            for batch in &history {
                store.apply_patch_batch(batch);
            }
        }
        once.apply_patch_batch(&[patch.clone()]);
        twice.apply_patch_batch(&[patch.clone()]);
        twice.apply_patch_batch(&[patch]);

        let a: Vec<_> = once.quotes().cloned().collect();
        let b: Vec<_> = twice.quotes().cloned().collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn one_quote_per_id_in_ascending_order(history in batches()) {
        let mut store = QuoteStore::new();
        let mut seen = BTreeSet::new();
        for batch in &history {
            store.apply_patch_batch(batch);
            seen.extend(batch.iter().map(|p| p.id.clone()));
        }
        let ids: Vec<InstrumentId> = store.quotes().map(|q| q.id().clone()).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(ids, seen.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn fields_match_last_writer_per_id(history in batches()) {
        let mut store = QuoteStore::new();
        let mut expected: HashMap<InstrumentId, QuoteFields> = HashMap::new();
        for batch in &history {
            store.apply_patch_batch(batch);
            for patch in batch {
                expected.entry(patch.id.clone()).or_default().merge(&patch.fields);
            }
        }
        for (id, fields) in &expected {
            prop_assert_eq!(store.get(id).unwrap().fields(), fields);
        }
    }

    #[test]
    fn selection_is_sorted_regardless_of_arrival(history in batches(), keys in prop::collection::vec(prop::sample::select(IDS.to_vec()), 0..8)) {
        let mut store = QuoteStore::new();
        for batch in &history {
            store.apply_patch_batch(batch);
        }
        let keys: Vec<InstrumentId> = keys.into_iter().map(InstrumentId::from).collect();
        let favorites = FavoritesLedger::open(MemoryStorage::default());
        let selected = store.query_selection(&keys, &favorites);
        let ids: Vec<&InstrumentId> = selected.iter().map(|q| q.id()).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(ids.iter().all(|id| keys.contains(id)));
        let expected = keys.iter().filter(|k| store.get(k).is_some()).collect::<BTreeSet<_>>().len();
        prop_assert_eq!(ids.len(), expected);
    }
}

#[test]
fn two_batches_reconcile_against_catalog() {
    let mut store = QuoteStore::new();
    store.set_definitions(catalog());

    let mut first = QuotePatch::new("USD1");
    first.fields.last = Some(100.0);
    first.fields.change = Some(1.0);
    let mut second = QuotePatch::new("USD1");
    second.fields.change = Some(2.0);
    store.apply_patch_batch(&[first]);
    store.apply_patch_batch(&[second]);

    let favorites = FavoritesLedger::open(MemoryStorage::default());
    let result = store.query_selection(&["USD1".into()], &favorites);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].fields().last, Some(100.0));
    assert_eq!(result[0].fields().change, Some(2.0));
    assert_eq!(result[0].title(), Some("US Dollar"));
}

#[test]
fn favorites_view_shows_only_favorites() {
    let mut store = QuoteStore::new();
    store.set_definitions(catalog());
    store.apply_patch_batch(&[QuotePatch::new("USD1"), QuotePatch::new("EUR1")]);

    let mut favorites = FavoritesLedger::open(MemoryStorage::with_contents(r#"["USD1"]"#));
    let result = store.query_selection(&[], &favorites);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id().as_str(), "USD1");

    favorites.toggle(&"USD1".into()).unwrap();
    assert!(store.query_selection(&[], &favorites).is_empty());
    assert_eq!(store.len(), 2);
}

#[test]
fn unknown_instrument_keeps_raw_fields_without_title() {
    let mut store = QuoteStore::new();
    store.set_definitions(catalog());
    let mut patch = QuotePatch::new("ZZZ9");
    patch.fields.last = Some(7.5);
    patch.fields.bid = Some(7.4);
    store.apply_patch_batch(&[patch]);

    let favorites = FavoritesLedger::open(MemoryStorage::default());
    let result = store.query_selection(&["ZZZ9".into()], &favorites);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].fields().last, Some(7.5));
    assert_eq!(result[0].fields().bid, Some(7.4));
    assert_eq!(result[0].title(), None);
}
