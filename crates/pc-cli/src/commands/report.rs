//! Report command: reconcile punches and render sessions and stats.
//!
//! This module implements `punch report` with an explicit `--date` override
//! and output formats (human-readable, JSON).

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, NaiveDate, Offset};

use pc_core::{PunchEvent, ReconcileConfig, Reconciliation, Session};
use pc_db::Database;

use crate::commands::status::format_org_summary;

/// Runs the report command.
///
/// `today` defaults to the local calendar date; `--date` pins it so a report
/// over the same snapshot is reproducible.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let events = db.list_punches().context("failed to load punches")?;
    let users = db.list_users().context("failed to load roster")?;

    let now = Local::now();
    let config = ReconcileConfig {
        today: date.unwrap_or_else(|| now.date_naive()),
        utc_offset: now.offset().fix(),
    };
    let result = pc_core::reconcile(&events, &users, &config);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &result)?;
        writeln!(writer)?;
    } else {
        let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
        write!(writer, "{}", format_report(&result, &config, &timezone))?;
    }

    Ok(())
}

/// Formats whole minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are treated as 0m (defensive).
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Formats the human-readable report output.
fn format_report(result: &Reconciliation, config: &ReconcileConfig, timezone: &str) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "ATTENDANCE REPORT: {} ({timezone})",
        config.today.format("%A, %b %-d, %Y")
    )
    .unwrap();

    if result.sessions.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No punches recorded.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(output, "SESSIONS").unwrap();
    writeln!(output, "────────").unwrap();
    for session in &result.sessions {
        writeln!(output, "{}", format_session_line(session, config.utc_offset)).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "BY USER").unwrap();
    writeln!(output, "───────").unwrap();
    let mut any_totals = false;
    for (user, stats) in &result.user_stats {
        if stats.minutes_all_time == 0 {
            continue;
        }
        any_totals = true;
        writeln!(
            output,
            "{user}  today {}  all-time {}",
            format_minutes(stats.minutes_today),
            format_minutes(stats.minutes_all_time)
        )
        .unwrap();
    }
    if !any_totals {
        writeln!(output, "(no completed sessions)").unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    output.push_str(&format_org_summary(&result.org_stats));

    if !result.anomalies.is_empty() {
        let punches: usize = result.anomalies.iter().map(|a| a.punches).sum();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Note: {punches} punches from {} users no longer on the roster.",
            result.anomalies.len()
        )
        .unwrap();
    }

    output
}

/// One session as a display line: date, endpoints, duration, who.
fn format_session_line(session: &Session, offset: FixedOffset) -> String {
    let time = |punch: &Option<PunchEvent>| {
        punch.as_ref().map_or_else(
            || "--:--".to_string(),
            |p| p.timestamp.with_timezone(&offset).format("%H:%M").to_string(),
        )
    };
    let tail = match session.duration_minutes {
        Some(minutes) => format_minutes(minutes),
        None if session.check_in.is_some() => "open".to_string(),
        None => "orphan".to_string(),
    };
    let who = session
        .display_name
        .clone()
        .unwrap_or_else(|| session.user.to_string());
    format!(
        "{}  {} → {}  {tail}  {who}",
        session.date,
        time(&session.check_in),
        time(&session.check_out)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, TimeZone, Utc};
    use insta::assert_snapshot;

    use pc_core::{EventId, PunchKind, User, UserId};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn punch(id: &str, user: &str, kind: PunchKind, at: DateTime<Utc>) -> PunchEvent {
        PunchEvent {
            id: EventId::new(id).unwrap(),
            user: UserId::new(user).unwrap(),
            kind,
            timestamp: at,
        }
    }

    fn member(id: &str, name: &str, checked_in: bool) -> User {
        User {
            id: UserId::new(id).unwrap(),
            display_name: name.to_string(),
            email: format!("{id}@example.com"),
            is_admin: false,
            is_checked_in: checked_in,
        }
    }

    fn fixture_config() -> ReconcileConfig {
        ReconcileConfig {
            today: chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            utc_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(480), "8h 0m");
        assert_eq!(format_minutes(505), "8h 25m");
        assert_eq!(format_minutes(-10), "0m");
    }

    #[test]
    fn report_renders_sessions_totals_and_summary() {
        let events = vec![
            punch("p1", "alice", PunchKind::CheckIn, at(9, 0)),
            punch("p2", "alice", PunchKind::CheckOut, at(17, 0)),
            punch("p3", "bob", PunchKind::CheckIn, at(9, 30)),
        ];
        let users = vec![
            member("alice", "Alice Park", false),
            member("bob", "Bob Lee", true),
        ];
        let config = fixture_config();
        let result = pc_core::reconcile(&events, &users, &config);

        let output = format_report(&result, &config, "UTC");

        assert_snapshot!(output.trim_end(), @r"
        ATTENDANCE REPORT: Monday, Mar 10, 2025 (UTC)

        SESSIONS
        ────────
        2025-03-10  09:30 → --:--  open  Bob Lee
        2025-03-10  09:00 → 17:00  8h 0m  Alice Park

        BY USER
        ───────
        alice  today 8h 0m  all-time 8h 0m

        SUMMARY
        ───────
        Roster:          2 users
        Checked in now:  1
        Present today:   2
        Avg hours today: 8.0
        ");
    }

    #[test]
    fn report_without_punches_is_minimal() {
        let config = fixture_config();
        let result = pc_core::reconcile(&[], &[member("alice", "Alice Park", false)], &config);

        let output = format_report(&result, &config, "UTC");

        assert_snapshot!(output.trim_end(), @r"
        ATTENDANCE REPORT: Monday, Mar 10, 2025 (UTC)

        No punches recorded.
        ");
    }

    #[test]
    fn report_flags_punches_from_removed_users() {
        let events = vec![
            punch("p1", "ghost", PunchKind::CheckIn, at(9, 0)),
            punch("p2", "ghost", PunchKind::CheckOut, at(12, 0)),
        ];
        let users = vec![member("alice", "Alice Park", false)];
        let config = fixture_config();
        let result = pc_core::reconcile(&events, &users, &config);

        let output = format_report(&result, &config, "UTC");

        assert!(output.contains("Note: 2 punches from 1 users no longer on the roster."));
        // The session itself still renders, under the raw user ID.
        assert!(output.contains("ghost"));
        assert!(output.contains("3h 0m"));
    }

    #[test]
    fn orphan_sessions_render_with_missing_check_in() {
        let events = vec![punch("p1", "alice", PunchKind::CheckOut, at(8, 0))];
        let users = vec![member("alice", "Alice Park", false)];
        let config = fixture_config();
        let result = pc_core::reconcile(&events, &users, &config);

        let output = format_report(&result, &config, "UTC");

        assert!(output.contains("--:-- → 08:00  orphan  Alice Park"));
    }
}
