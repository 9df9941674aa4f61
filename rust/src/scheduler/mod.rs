//! Placement engine: occupancy tracking, the per-request state machine, and
//! the greedy placer.

mod core;
mod occupancy;
mod state;

pub use core::{PlacementOutcome, Placer};
pub use occupancy::{ConflictTracker, EntityKind};
pub use state::{PlacementDecision, SessionState};
