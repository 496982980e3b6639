//! Roster entries.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A member of the organization's roster.
///
/// Read-only to the reconciliation engine. `is_checked_in` is a live flag
/// maintained by whoever records punches; the engine consumes it only for
/// the "currently checked in" organization stat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_checked_in: bool,
}
