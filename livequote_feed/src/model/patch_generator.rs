//! Synthetic quote stream.
//!
//! The `PatchGenerator` keeps a random-walk price per instrument and turns each
//! step into a partial `QuotePatch`, the same shape a real upstream feed sends:
//! the first patch for an instrument is a full snapshot, later ones carry only
//! the fields that moved plus a random subset of the rest.
//!
//! Event model:
//! - `FeedEvent::Batch(Vec<QuotePatch>)`: one generated batch, in apply order.
//! - `FeedEvent::Shutdown`: signal for consumers to terminate gracefully.
//!
//! Broadcast is best-effort: a subscriber whose channel is closed is dropped.

use std::collections::BTreeMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use crossbeam_channel::Sender;
use livequote_common::{InstrumentId, QuoteFields, QuotePatch};
use log::info;
use rand::Rng;

/// Built-in instruments and their opening prices, used without a catalog.
pub const DEFAULT_INSTRUMENTS: &[(&str, f64)] = &[
    ("USD1", 32.5),
    ("EUR1", 35.1),
    ("GBP1", 41.2),
    ("CHF1", 36.8),
    ("JPY1", 0.22),
    ("EURUSD1", 1.08),
    ("XAU1", 2650.0),
    ("XAG1", 31.0),
    ("GAU1", 2760.0),
    ("CEYREK1", 4550.0),
];

/// Message sent by the generator to its subscribers.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A batch of patches to route to clients.
    Batch(Vec<QuotePatch>),
    /// Global shutdown notification for all consumers.
    Shutdown,
}

#[derive(Debug, Clone)]
struct Track {
    last: f64,
    close: f64,
    day_high: f64,
    day_low: f64,
    sequence: u64,
}

impl Track {
    fn opening(price: f64) -> Self {
        Track {
            last: price,
            close: price,
            day_high: price,
            day_low: price,
            sequence: 0,
        }
    }
}

/// Random-walk state for every simulated instrument.
pub struct PatchGenerator {
    tracks: BTreeMap<InstrumentId, Track>,
}

impl PatchGenerator {
    /// Creates a generator from instruments and their opening prices.
    pub fn new(instruments: impl IntoIterator<Item = (InstrumentId, f64)>) -> Self {
        let tracks = instruments
            .into_iter()
            .map(|(id, price)| (id, Track::opening(price.max(0.01))))
            .collect();
        PatchGenerator { tracks }
    }

    /// Generator over [`DEFAULT_INSTRUMENTS`].
    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_INSTRUMENTS
                .iter()
                .map(|(id, price)| (InstrumentId::from(*id), *price)),
        )
    }

    /// Generator over catalog ids. Ids known to [`DEFAULT_INSTRUMENTS`] keep
    /// their built-in price, the rest open at a random one.
    pub fn for_ids<R: Rng + ?Sized>(ids: impl IntoIterator<Item = InstrumentId>, rng: &mut R) -> Self {
        Self::new(ids.into_iter().map(|id| {
            let price = DEFAULT_INSTRUMENTS
                .iter()
                .find(|(known, _)| *known == id.as_str())
                .map(|(_, price)| *price)
                .unwrap_or_else(|| round(rng.random_range(1.0..100.0)));
            (id, price)
        }))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Next price of a small random walk around `current_price`.
    ///
    /// The change is sampled uniformly from `[-1%, +1%]` and the result is
    /// clamped to stay positive.
    pub fn next_price<R: Rng + ?Sized>(current_price: f64, rng: &mut R) -> f64 {
        let change: f64 = rng.random_range(-0.01..0.01);
        round(current_price * (1.0 + change)).max(0.01)
    }

    /// Produces one batch. Instruments never emitted before are always
    /// included with a full snapshot; the others move with probability one half.
    pub fn next_batch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<QuotePatch> {
        let event_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut batch = Vec::new();

        for (id, track) in self.tracks.iter_mut() {
            let first = track.sequence == 0;
            if !first && !rng.random_bool(0.5) {
                continue;
            }
            let mut patch = QuotePatch::new(id.clone());
            let fields = &mut patch.fields;

            if !first {
                track.last = Self::next_price(track.last, rng);
            }
            track.sequence += 1;
            fields.last = Some(track.last);
            fields.change = Some(round(track.last - track.close));
            fields.sequence = Some(track.sequence as f64);
            fields.event_time = Some(event_time.clone());

            if track.last > track.day_high {
                track.day_high = track.last;
                fields.day_high = Some(track.day_high);
            }
            if track.last < track.day_low {
                track.day_low = track.last;
                fields.day_low = Some(track.day_low);
            }
            if first || rng.random_bool(0.7) {
                fields.bid = Some(round(track.last * 0.999));
                fields.ask = Some(round(track.last * 1.001));
            }
            if first {
                fill_ranges(fields, track);
            }
            batch.push(patch);
        }
        batch
    }

    /// Full records for `ids` at their current state, for clients that join
    /// after the first batch. Unknown ids are skipped.
    pub fn snapshot<'a>(&self, ids: impl IntoIterator<Item = &'a InstrumentId>) -> Vec<QuotePatch> {
        let event_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        ids.into_iter()
            .filter_map(|id| self.tracks.get(id).map(|track| (id, track)))
            .map(|(id, track)| {
                let mut patch = QuotePatch::new(id.clone());
                let fields = &mut patch.fields;
                fields.last = Some(track.last);
                fields.change = Some(round(track.last - track.close));
                fields.bid = Some(round(track.last * 0.999));
                fields.ask = Some(round(track.last * 1.001));
                fields.sequence = Some(track.sequence as f64);
                fields.event_time = Some(event_time.clone());
                fill_ranges(fields, track);
                patch
            })
            .collect()
    }

    /// Every simulated id, ascending.
    pub fn ids(&self) -> impl Iterator<Item = &InstrumentId> {
        self.tracks.keys()
    }

    /// Starts the generator thread and returns a channel for registering
    /// subscribers.
    ///
    /// Every `interval` a batch is pushed to all registered senders. When
    /// `shutdown` is set, `FeedEvent::Shutdown` is broadcast and the thread ends.
    pub fn start(mut self, interval: Duration, shutdown: Arc<AtomicBool>) -> Sender<Sender<FeedEvent>> {
        let (subscribe_tx, subscribe_rx) = crossbeam_channel::unbounded::<Sender<FeedEvent>>();

        thread::spawn(move || {
            let mut rng = rand::rng();
            let mut clients: Vec<Sender<FeedEvent>> = Vec::new();
            info!(
                "Patch generator started for {} instruments (Thread ID: {:?})",
                self.len(),
                thread::current().id()
            );

            loop {
                while let Ok(new_client_tx) = subscribe_rx.try_recv() {
                    clients.push(new_client_tx);
                }
                if shutdown.load(Ordering::Relaxed) {
                    clients.retain(|client_tx| client_tx.send(FeedEvent::Shutdown).is_ok());
                    break;
                }

                let batch = self.next_batch(&mut rng);
                if !batch.is_empty() {
                    let event = FeedEvent::Batch(batch);
                    clients.retain(|client_tx| client_tx.send(event.clone()).is_ok());
                }
                thread::sleep(interval);
            }
            info!("Patch generator stopping...");
        });
        subscribe_tx
    }
}

fn fill_ranges(fields: &mut QuoteFields, track: &Track) {
    fields.close = Some(track.close);
    fields.day_high = Some(track.day_high);
    fields.day_low = Some(track.day_low);
    fields.week_high = Some(track.day_high);
    fields.week_low = Some(track.day_low);
    fields.week_percent = Some(0.0);
    fields.month_high = Some(track.day_high);
    fields.month_low = Some(track.day_low);
    fields.month_percent = Some(0.0);
    fields.year_high = Some(track.day_high);
    fields.year_low = Some(track.day_low);
    fields.year_percent = Some(0.0);
}

fn round(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
