//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for envelope operations.
//!
//! Notes:
//! - Counters are plain fields owned by one call; no atomics, no locks.
//! - A snapshot is taken once, when the operation completes, and never mutated.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
