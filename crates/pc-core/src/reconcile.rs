//! Punch reconciliation and aggregation.
//!
//! Rebuilds coherent work sessions from an unordered set of raw
//! check-in/check-out punches and folds them into per-user and
//! organization-wide statistics.
//!
//! # Algorithm Summary
//!
//! 1. Bucket punches by (user, local calendar day)
//! 2. Within each bucket, match each check-in to the earliest unclaimed
//!    check-out that is strictly later; leftovers become open or orphan
//!    sessions
//! 3. Fold the session list into per-user minute totals and org-wide stats
//!
//! The whole computation is a pure function over snapshots supplied by the
//! caller. "Today" and the local-time offset are explicit inputs, never read
//! from a clock, so identical inputs always produce identical output.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::punch::{PunchEvent, PunchKind};
use crate::types::UserId;
use crate::user::User;

/// Clock inputs for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// The calendar day that counts as "today" for daily aggregates.
    pub today: NaiveDate,

    /// Offset applied to punch timestamps before day-bucketing. Two punches
    /// a moment apart that straddle local midnight land in different days.
    pub utc_offset: FixedOffset,
}

/// A reconciled pairing of at most one check-in and one check-out.
///
/// Sessions are value objects rebuilt wholesale on every run, never
/// persisted or mutated in place. At least one endpoint is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserId,

    /// Denormalized from the roster for display. `None` when the user is
    /// missing from the roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Local calendar day of whichever endpoint exists.
    pub date: NaiveDate,

    pub check_in: Option<PunchEvent>,
    pub check_out: Option<PunchEvent>,

    /// Whole minutes between the endpoints, present iff both are.
    pub duration_minutes: Option<i64>,
}

/// Per-user minute totals.
///
/// Minutes are exact integers; fractional hours are derived views so a
/// rounded value can never be re-accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub minutes_today: i64,
    pub minutes_all_time: i64,
}

impl UserStats {
    /// Fractional hours worked today.
    #[must_use]
    pub fn hours_today(&self) -> f64 {
        minutes_to_hours(self.minutes_today)
    }

    /// Fractional hours worked over all recorded days.
    #[must_use]
    pub fn hours_all_time(&self) -> f64 {
        minutes_to_hours(self.minutes_all_time)
    }
}

/// Organization-wide summary, one per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgStats {
    /// Roster size.
    pub total_users: usize,

    /// Roster members whose live checked-in flag is set.
    pub checked_in_users: usize,

    /// Distinct roster members with at least one session dated today.
    pub today_attendance: usize,

    /// Mean of hours-today across users with nonzero minutes today, rounded
    /// to one decimal. 0 when nobody has time today: this is an average over
    /// active staff, not over the whole roster.
    pub avg_hours_today: f64,
}

/// A punch that references a user missing from the roster.
///
/// Non-fatal: the user may have been deleted after punching. The punches
/// still pair into sessions but contribute nothing to the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownUserAnomaly {
    pub user: UserId,
    /// Number of punch events referencing the unknown user.
    pub punches: usize,
}

/// Output of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// All sessions across users and days, most recent activity first.
    pub sessions: Vec<Session>,

    /// Stats keyed by roster member. Every roster member is present, zeroed
    /// if idle; consumers may filter zeros for display.
    pub user_stats: BTreeMap<UserId, UserStats>,

    pub org_stats: OrgStats,

    /// Unknown-user punches encountered during aggregation, by user.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<UnknownUserAnomaly>,
}

/// Rebuilds sessions and statistics from a snapshot of punches and users.
///
/// Pure and re-entrant: no clock reads, no I/O, no shared state, so callers
/// may run it concurrently over shared slices. Empty input is not an error
/// and yields empty/zeroed output.
#[must_use]
pub fn reconcile(
    events: &[PunchEvent],
    users: &[User],
    config: &ReconcileConfig,
) -> Reconciliation {
    let roster: HashMap<&UserId, &User> = users.iter().map(|u| (&u.id, u)).collect();

    let mut sessions = Vec::new();
    for ((user, date), punches) in group_by_user_day(events, config.utc_offset) {
        pair_day(&user, date, &punches, &roster, &mut sessions);
    }

    sessions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| endpoint_time(b).cmp(&endpoint_time(a)))
    });

    let (user_stats, org_stats, anomalies) = aggregate(&sessions, users, config.today);

    Reconciliation {
        sessions,
        user_stats,
        org_stats,
        anomalies,
    }
}

/// Buckets punches by (user, local calendar day), timestamp-ascending within
/// each bucket.
///
/// Users without punches get no bucket. The map is ordered so session
/// generation order is reproducible.
fn group_by_user_day(
    events: &[PunchEvent],
    utc_offset: FixedOffset,
) -> BTreeMap<(UserId, NaiveDate), Vec<PunchEvent>> {
    let mut buckets: BTreeMap<(UserId, NaiveDate), Vec<PunchEvent>> = BTreeMap::new();
    for event in events {
        let date = event.timestamp.with_timezone(&utc_offset).date_naive();
        buckets
            .entry((event.user.clone(), date))
            .or_default()
            .push(event.clone());
    }
    for punches in buckets.values_mut() {
        // Stable sort: punches with identical timestamps keep input order,
        // which is the tie-break the matcher relies on.
        punches.sort_by_key(|p| p.timestamp);
    }
    buckets
}

/// Pairs one day bucket into sessions.
///
/// Greedy earliest-available matching: each check-in, scanned in timestamp
/// order, claims the earliest still-unclaimed check-out strictly after it.
/// Deliberately not interval-optimal: with two check-ins before any
/// check-out, the first check-in claims the check-out. Changing the policy
/// would rewrite historical hour totals.
fn pair_day(
    user: &UserId,
    date: NaiveDate,
    punches: &[PunchEvent],
    roster: &HashMap<&UserId, &User>,
    sessions: &mut Vec<Session>,
) {
    let (display_name, email) = roster.get(user).map_or((None, None), |u| {
        (Some(u.display_name.clone()), Some(u.email.clone()))
    });
    let session = |check_in: Option<&PunchEvent>, check_out: Option<&PunchEvent>| Session {
        user: user.clone(),
        display_name: display_name.clone(),
        email: email.clone(),
        date,
        check_in: check_in.cloned(),
        check_out: check_out.cloned(),
        duration_minutes: match (check_in, check_out) {
            (Some(i), Some(o)) => Some(duration_minutes(i.timestamp, o.timestamp)),
            _ => None,
        },
    };

    let mut claimed = vec![false; punches.len()];
    for punch in punches {
        if punch.kind != PunchKind::CheckIn {
            continue;
        }
        let matched = punches.iter().enumerate().find(|(j, p)| {
            !claimed[*j] && p.kind == PunchKind::CheckOut && p.timestamp > punch.timestamp
        });
        match matched {
            Some((j, check_out)) => {
                claimed[j] = true;
                sessions.push(session(Some(punch), Some(check_out)));
            }
            // Open session: checked in, never checked out.
            None => sessions.push(session(Some(punch), None)),
        }
    }

    // Unclaimed check-outs are orphans: no earlier check-in claimed them.
    for (j, punch) in punches.iter().enumerate() {
        if punch.kind == PunchKind::CheckOut && !claimed[j] {
            sessions.push(session(None, Some(punch)));
        }
    }
}

/// Whole minutes between the endpoints, rounded to nearest.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn duration_minutes(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    let seconds = (check_out - check_in).num_seconds();
    (seconds as f64 / 60.0).round() as i64
}

/// The timestamp a session sorts by: its check-in, else its check-out.
fn endpoint_time(session: &Session) -> Option<DateTime<Utc>> {
    session
        .check_in
        .as_ref()
        .or(session.check_out.as_ref())
        .map(|p| p.timestamp)
}

/// Folds sessions and the roster into per-user and org-wide stats.
#[allow(clippy::cast_precision_loss)]
fn aggregate(
    sessions: &[Session],
    users: &[User],
    today: NaiveDate,
) -> (BTreeMap<UserId, UserStats>, OrgStats, Vec<UnknownUserAnomaly>) {
    let mut user_stats: BTreeMap<UserId, UserStats> = users
        .iter()
        .map(|u| (u.id.clone(), UserStats::default()))
        .collect();

    let mut present_today: HashSet<&UserId> = HashSet::new();
    let mut unknown: BTreeMap<UserId, usize> = BTreeMap::new();

    for session in sessions {
        let Some(stats) = user_stats.get_mut(&session.user) else {
            let punches =
                usize::from(session.check_in.is_some()) + usize::from(session.check_out.is_some());
            *unknown.entry(session.user.clone()).or_default() += punches;
            continue;
        };
        if let Some(minutes) = session.duration_minutes {
            stats.minutes_all_time += minutes;
            if session.date == today {
                stats.minutes_today += minutes;
            }
        }
        if session.date == today {
            present_today.insert(&session.user);
        }
    }

    // Mean over active users only; minutes stay integral until this point.
    let active: Vec<f64> = user_stats
        .values()
        .filter(|s| s.minutes_today > 0)
        .map(UserStats::hours_today)
        .collect();
    let avg_hours_today = if active.is_empty() {
        0.0
    } else {
        round_to_tenth(active.iter().sum::<f64>() / active.len() as f64)
    };

    let org_stats = OrgStats {
        total_users: users.len(),
        checked_in_users: users.iter().filter(|u| u.is_checked_in).count(),
        today_attendance: present_today.len(),
        avg_hours_today,
    };

    let anomalies: Vec<UnknownUserAnomaly> = unknown
        .into_iter()
        .map(|(user, punches)| {
            tracing::warn!(%user, punches, "punches reference a user missing from the roster");
            UnknownUserAnomaly { user, punches }
        })
        .collect();

    (user_stats, org_stats, anomalies)
}

#[allow(clippy::cast_precision_loss)]
fn minutes_to_hours(minutes: i64) -> f64 {
    (minutes / 60) as f64 + (minutes % 60) as f64 / 60.0
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
