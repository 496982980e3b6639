//! Status command for the organization-wide attendance summary.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, Offset};

use pc_core::{OrgStats, ReconcileConfig};
use pc_db::Database;

use crate::Config;

/// Runs the status command.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let events = db.list_punches().context("failed to load punches")?;
    let users = db.list_users().context("failed to load roster")?;

    let now = Local::now();
    let reconcile_config = ReconcileConfig {
        today: now.date_naive(),
        utc_offset: now.offset().fix(),
    };
    let result = pc_core::reconcile(&events, &users, &reconcile_config);

    writeln!(writer, "Punch clock status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    write!(writer, "{}", format_org_summary(&result.org_stats))?;

    Ok(())
}

/// The four summary lines, shared with the report footer.
pub(crate) fn format_org_summary(org: &OrgStats) -> String {
    let mut output = String::new();
    writeln!(output, "Roster:          {} users", org.total_users).unwrap();
    writeln!(output, "Checked in now:  {}", org.checked_in_users).unwrap();
    writeln!(output, "Present today:   {}", org.today_attendance).unwrap();
    writeln!(output, "Avg hours today: {:.1}", org.avg_hours_today).unwrap();
    output
}
