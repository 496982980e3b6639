//! Geofence settings commands.
//!
//! Plain get/set over the settings store. Nothing here validates punches
//! against the fence; the values are configuration for external clients.

use std::io::Write;

use anyhow::{Context, Result};

use pc_db::{Database, Geofence};

/// Prints the configured geofence.
pub fn show<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    match db.geofence().context("failed to load geofence")? {
        Some(fence) => writeln!(
            writer,
            "Geofence: {:.6}, {:.6} (radius {:.0} m)",
            fence.latitude, fence.longitude, fence.radius_meters
        )?,
        None => writeln!(writer, "No geofence configured.")?,
    }
    Ok(())
}

/// Stores the geofence parameters.
pub fn set(db: &Database, latitude: f64, longitude: f64, radius: f64) -> Result<()> {
    db.set_geofence(&Geofence {
        latitude,
        longitude,
        radius_meters: radius,
    })
    .context("failed to store geofence")?;

    println!("Geofence updated.");
    Ok(())
}
