//! Roster management commands.

use std::io::Write;

use anyhow::{Context, Result};
use uuid::Uuid;

use pc_core::{User, UserId};
use pc_db::Database;

/// Adds a roster member.
pub fn add(
    db: &Database,
    name: String,
    email: String,
    id: Option<String>,
    admin: bool,
) -> Result<()> {
    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let user = User {
        id: UserId::new(id)?,
        display_name: name,
        email,
        is_admin: admin,
        is_checked_in: false,
    };
    db.insert_user(&user)
        .with_context(|| format!("failed to add user {}", user.id))?;

    println!("Added {} ({})", user.display_name, user.id);
    Ok(())
}

/// Lists the roster, one member per line.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let users = db.list_users().context("failed to load roster")?;

    if users.is_empty() {
        writeln!(writer, "Roster is empty.")?;
        return Ok(());
    }

    for user in users {
        let admin = if user.is_admin { "  [admin]" } else { "" };
        let present = if user.is_checked_in {
            "  [checked in]"
        } else {
            ""
        };
        writeln!(
            writer,
            "{}  {} <{}>{admin}{present}",
            user.id, user.display_name, user.email
        )?;
    }
    Ok(())
}

/// Removes a roster member. Their punches stay on record.
pub fn remove(db: &Database, user: &str) -> Result<()> {
    let id = UserId::new(user)?;
    db.remove_user(&id)
        .with_context(|| format!("failed to remove user {id}"))?;

    println!("Removed {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn member(id: &str, name: &str, admin: bool, checked_in: bool) -> User {
        User {
            id: UserId::new(id).unwrap(),
            display_name: name.to_string(),
            email: format!("{id}@example.com"),
            is_admin: admin,
            is_checked_in: checked_in,
        }
    }

    #[test]
    fn list_formats_roster() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&member("alice", "Alice Park", true, true))
            .unwrap();
        db.insert_user(&member("bob", "Bob Lee", false, false))
            .unwrap();

        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output.trim_end(), @r"
        alice  Alice Park <alice@example.com>  [admin]  [checked in]
        bob  Bob Lee <bob@example.com>
        ");
    }

    #[test]
    fn list_empty_roster() {
        let db = Database::open_in_memory().unwrap();

        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output.trim_end(), @"Roster is empty.");
    }

    #[test]
    fn add_then_remove_roundtrips() {
        let db = Database::open_in_memory().unwrap();
        add(
            &db,
            "Alice Park".to_string(),
            "alice@example.com".to_string(),
            Some("alice".to_string()),
            false,
        )
        .unwrap();
        assert_eq!(db.list_users().unwrap().len(), 1);

        remove(&db, "alice").unwrap();
        assert!(db.list_users().unwrap().is_empty());
    }

    #[test]
    fn add_generates_id_when_omitted() {
        let db = Database::open_in_memory().unwrap();
        add(
            &db,
            "Alice Park".to_string(),
            "alice@example.com".to_string(),
            None,
            false,
        )
        .unwrap();

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users[0].id.as_str().is_empty());
    }
}
