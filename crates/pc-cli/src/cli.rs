//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Attendance punch clock.
///
/// Records check-in/check-out punches per user and reconciles them into
/// work sessions and attendance statistics.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database.
    Init,

    /// Check a user in.
    In {
        /// The user ID punching in.
        user: String,
    },

    /// Check a user out.
    Out {
        /// The user ID punching out.
        user: String,
    },

    /// Manage the roster.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Reconcile punches into sessions and show the report.
    Report {
        /// The day that counts as "today" (defaults to the local date).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Emit the full reconciliation as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show organization-wide attendance status.
    Status,

    /// View or change the geofence settings.
    Geofence {
        #[command(subcommand)]
        action: GeofenceAction,
    },
}

/// Roster management actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Add a roster member.
    Add {
        /// Display name.
        name: String,

        /// Email address.
        #[arg(long)]
        email: String,

        /// Explicit user ID (defaults to a fresh UUID).
        #[arg(long)]
        id: Option<String>,

        /// Grant the admin flag.
        #[arg(long)]
        admin: bool,
    },

    /// List roster members.
    List,

    /// Remove a roster member. Their punches stay on record.
    Remove {
        /// The user ID to remove.
        user: String,
    },
}

/// Geofence settings actions.
#[derive(Debug, Subcommand)]
pub enum GeofenceAction {
    /// Print the configured geofence.
    Show,

    /// Set the geofence parameters.
    Set {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Radius in meters.
        #[arg(long)]
        radius: f64,
    },
}
