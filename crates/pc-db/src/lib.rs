//! Storage layer for punchclock.
//!
//! Provides persistence for punch events, the user roster, and app settings
//! using `rusqlite`. This crate is the engine's "upstream collaborator": it
//! produces already-validated snapshots for `pc_core::reconcile` and never
//! participates in the reconciliation itself.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Punch timestamps are stored as TEXT in RFC 3339 format with microsecond
//! precision (e.g., `2025-03-10T09:00:00.000000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! A row whose timestamp does not parse fails the whole load rather than
//! being dropped: downstream duration arithmetic depends on a total
//! ordering, so no partial snapshot is ever returned.
//!
//! ## Roster Integrity
//!
//! `punch_events.user_id` carries no foreign key: users may be removed from
//! the roster after punching, and those punches must survive as data for the
//! engine's unknown-user anomaly reporting.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pc_core::{EventId, PunchEvent, PunchKind, User, UserId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored punch timestamp failed to parse.
    #[error("invalid timestamp for punch {event_id}: {timestamp}")]
    TimestampParse {
        event_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored punch kind is not a known value.
    #[error("invalid punch kind for {event_id}: {value}")]
    UnknownPunchKind { event_id: String, value: String },

    /// A stored ID failed domain validation.
    #[error("invalid stored ID: {0}")]
    InvalidId(#[from] pc_core::ValidationError),

    /// The referenced user is not on the roster.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// A settings value failed to decode.
    #[error("invalid settings value for {key}")]
    SettingsDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Geofence parameters for the admin surface.
///
/// Stored as a single settings row with plain get/set semantics. Nothing in
/// this repository evaluates distances against it; the reconciliation engine
/// has no dependency on these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

const GEOFENCE_KEY: &str = "geofence";

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                email TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                is_checked_in INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS punch_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_punch_events_user_time
                ON punch_events(user_id, timestamp);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ========== Roster ==========

    /// Inserts a roster member. Fails if the ID is already taken.
    pub fn insert_user(&self, user: &User) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO users (id, display_name, email, is_admin, is_checked_in)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.as_str(),
                user.display_name,
                user.email,
                user.is_admin,
                user.is_checked_in,
            ],
        )?;
        tracing::debug!(user = %user.id, "roster member added");
        Ok(())
    }

    /// Returns the full roster, ordered by user ID.
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, email, is_admin, is_checked_in
             FROM users ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (id, display_name, email, is_admin, is_checked_in) = row?;
            users.push(User {
                id: UserId::new(id)?,
                display_name,
                email,
                is_admin,
                is_checked_in,
            });
        }
        Ok(users)
    }

    /// Removes a roster member. Their punches remain on record.
    pub fn remove_user(&self, user: &UserId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![user.as_str()])?;
        if deleted == 0 {
            return Err(DbError::UnknownUser(user.to_string()));
        }
        tracing::debug!(%user, "roster member removed");
        Ok(())
    }

    // ========== Punches ==========

    /// Records a punch and updates the user's live checked-in flag in one
    /// transaction.
    ///
    /// Rejects punches for users not on the roster: new punches require a
    /// live roster entry, even though historical punches may outlive theirs.
    pub fn record_punch(&mut self, punch: &PunchEvent) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE users SET is_checked_in = ?2 WHERE id = ?1",
            params![punch.user.as_str(), punch.kind == PunchKind::CheckIn],
        )?;
        if updated == 0 {
            return Err(DbError::UnknownUser(punch.user.to_string()));
        }
        tx.execute(
            "INSERT INTO punch_events (id, user_id, kind, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                punch.id.as_str(),
                punch.user.as_str(),
                punch.kind.to_string(),
                punch
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(punch = %punch.id, user = %punch.user, kind = %punch.kind, "punch recorded");
        Ok(())
    }

    /// Loads every punch, timestamp-ascending (insertion order on ties).
    ///
    /// Fails on the first row that does not decode; never returns a partial
    /// snapshot.
    pub fn list_punches(&self) -> Result<Vec<PunchEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, kind, timestamp
             FROM punch_events ORDER BY timestamp, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut punches = Vec::new();
        for row in rows {
            let (id, user, kind, timestamp) = row?;
            let parsed = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|source| DbError::TimestampParse {
                    event_id: id.clone(),
                    timestamp: timestamp.clone(),
                    source,
                })?
                .with_timezone(&Utc);
            let kind: PunchKind = kind.parse().map_err(|_| DbError::UnknownPunchKind {
                event_id: id.clone(),
                value: kind,
            })?;
            punches.push(PunchEvent {
                id: EventId::new(id)?,
                user: UserId::new(user)?,
                kind,
                timestamp: parsed,
            });
        }
        Ok(punches)
    }

    // ========== Settings ==========

    /// Returns a raw settings value.
    pub fn setting(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        rows.next().transpose().map_err(DbError::from)
    }

    /// Upserts a raw settings value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Returns the configured geofence, if any.
    pub fn geofence(&self) -> Result<Option<Geofence>, DbError> {
        let Some(raw) = self.setting(GEOFENCE_KEY)? else {
            return Ok(None);
        };
        let geofence =
            serde_json::from_str(&raw).map_err(|source| DbError::SettingsDecode {
                key: GEOFENCE_KEY.to_string(),
                source,
            })?;
        Ok(Some(geofence))
    }

    /// Stores the geofence parameters.
    pub fn set_geofence(&self, geofence: &Geofence) -> Result<(), DbError> {
        let raw = serde_json::to_string(geofence).map_err(|source| DbError::SettingsDecode {
            key: GEOFENCE_KEY.to_string(),
            source,
        })?;
        self.set_setting(GEOFENCE_KEY, &raw)
    }
}
