//! Live quote reconciliation core.
//!
//! Streamed partial quote records are merged into one quote per instrument,
//! joined with catalog metadata and served to any number of views.
//!
//! Modules:
//! - `catalog`: immutable `DefinitionCatalog` and the `TitleBook` title table.
//! - `quote`: the reconciled `Quote`.
//! - `store`: `QuoteStore` (merge, join, query) and its shared `StoreHandle`.
//! - `favorites`: persisted `FavoritesLedger` and its storage backends.
//! - `router`: `SubscriptionRouter` over a `PushChannel`.
//! - `views`: tabs and the keys each one needs.
//! - `session`: `LiveSession`, the event-loop facing wiring of all of the above.
pub mod catalog;
pub mod favorites;
pub mod quote;
pub mod router;
pub mod session;
pub mod store;
pub mod views;

pub use catalog::{DefinitionCatalog, TitleBook};
pub use favorites::{FavoritesLedger, FavoritesStorage, JsonFileStorage, MemoryStorage};
pub use quote::Quote;
pub use router::{PushChannel, SubscriptionRouter, SyncOutcome};
pub use session::{ChannelEvent, LiveSession};
pub use store::{QuoteStore, StoreEvent, StoreHandle, StorePhase};
pub use views::{TabKeys, ViewTab};
