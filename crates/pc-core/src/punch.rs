//! Raw punch events as captured at the door.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventId, UserId};

/// The direction of a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunchKind {
    CheckIn,
    CheckOut,
}

impl fmt::Display for PunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PunchKind {
    type Err = UnknownPunchKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check_in" | "in" => Ok(Self::CheckIn),
            "check_out" | "out" => Ok(Self::CheckOut),
            _ => Err(UnknownPunchKind(s.to_string())),
        }
    }
}

impl Serialize for PunchKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PunchKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown punch kind strings.
#[derive(Debug, Clone)]
pub struct UnknownPunchKind(String);

impl fmt::Display for UnknownPunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown punch kind: {}", self.0)
    }
}

impl std::error::Error for UnknownPunchKind {}

/// A single timestamped check-in or check-out record.
///
/// Punch events are externally sourced and immutable once read; the
/// reconciliation engine only ever copies them into derived sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvent {
    /// Unique identifier for this punch.
    pub id: EventId,
    /// The user who punched.
    pub user: UserId,
    /// Whether this punch is a check-in or a check-out.
    pub kind: PunchKind,
    /// When the punch occurred.
    pub timestamp: DateTime<Utc>,
}
