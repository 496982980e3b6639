use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pc_cli::commands::{geofence, init, punch, report, status, users};
use pc_cli::{Cli, Commands, Config, GeofenceAction, UserAction};
use pc_core::PunchKind;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(pc_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = pc_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Init) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            init::run(&config)?;
        }
        Some(Commands::In { user }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            punch::run(&mut db, user, PunchKind::CheckIn)?;
        }
        Some(Commands::Out { user }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            punch::run(&mut db, user, PunchKind::CheckOut)?;
        }
        Some(Commands::User { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                UserAction::Add {
                    name,
                    email,
                    id,
                    admin,
                } => {
                    users::add(&db, name.clone(), email.clone(), id.clone(), *admin)?;
                }
                UserAction::List => users::list(&mut std::io::stdout(), &db)?,
                UserAction::Remove { user } => users::remove(&db, user)?,
            }
        }
        Some(Commands::Report { date, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            report::run(&mut std::io::stdout(), &db, *date, *json)?;
        }
        Some(Commands::Status) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            status::run(&mut std::io::stdout(), &config)?;
        }
        Some(Commands::Geofence { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                GeofenceAction::Show => geofence::show(&mut std::io::stdout(), &db)?,
                GeofenceAction::Set {
                    latitude,
                    longitude,
                    radius,
                } => {
                    geofence::set(&db, *latitude, *longitude, *radius)?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
