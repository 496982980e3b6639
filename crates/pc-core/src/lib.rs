//! Core domain logic for punchclock.
//!
//! This crate contains the fundamental types and logic for:
//! - Punch events: raw check-in/check-out records
//! - Reconciliation: rebuilding work sessions from unordered punches
//! - Aggregation: per-user and organization-wide attendance statistics
//!
//! Everything here is pure computation over in-memory snapshots; persistence
//! lives in `pc-db` and presentation in `pc-cli`.

pub mod punch;
pub mod reconcile;
pub mod types;
pub mod user;

pub use punch::{PunchEvent, PunchKind, UnknownPunchKind};
pub use reconcile::{
    OrgStats, ReconcileConfig, Reconciliation, Session, UnknownUserAnomaly, UserStats, reconcile,
};
pub use types::{EventId, UserId, ValidationError};
pub use user::User;
