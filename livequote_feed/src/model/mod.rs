//! Domain models for the feed simulator:
//! - `patch_generator`: random-walk quote stream and `FeedEvent` broadcasting.
//! - `ping_monitor`: keep-alive tracker for client timeouts.
//! - `registry`: per-client interest sets and batch routing.
//! - `snapshot`: latest merged record per instrument for late subscribers.

pub mod patch_generator;
pub mod ping_monitor;
pub mod registry;
pub mod snapshot;
