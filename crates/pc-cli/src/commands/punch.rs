//! Punch recording commands (`punch in`, `punch out`).

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use uuid::Uuid;

use pc_core::{EventId, PunchEvent, PunchKind, UserId};
use pc_db::Database;

/// Records a punch for the given user at the current instant and updates
/// their live checked-in flag.
pub fn run(db: &mut Database, user: &str, kind: PunchKind) -> Result<()> {
    let punch = PunchEvent {
        id: EventId::new(Uuid::new_v4().to_string())?,
        user: UserId::new(user)?,
        kind,
        timestamp: Utc::now(),
    };
    db.record_punch(&punch)
        .with_context(|| format!("failed to record {kind} for {user}"))?;

    let verb = match kind {
        PunchKind::CheckIn => "checked in",
        PunchKind::CheckOut => "checked out",
    };
    println!(
        "{user} {verb} at {}",
        punch.timestamp.with_timezone(&Local).format("%H:%M")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pc_core::User;

    fn member(id: &str) -> User {
        User {
            id: UserId::new(id).unwrap(),
            display_name: id.to_string(),
            email: format!("{id}@example.com"),
            is_admin: false,
            is_checked_in: false,
        }
    }

    #[test]
    fn punch_in_records_event_and_flag() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_user(&member("alice")).unwrap();

        run(&mut db, "alice", PunchKind::CheckIn).unwrap();

        let punches = db.list_punches().unwrap();
        assert_eq!(punches.len(), 1);
        assert_eq!(punches[0].kind, PunchKind::CheckIn);
        assert!(db.list_users().unwrap()[0].is_checked_in);
    }

    #[test]
    fn punch_out_clears_flag() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_user(&member("alice")).unwrap();

        run(&mut db, "alice", PunchKind::CheckIn).unwrap();
        run(&mut db, "alice", PunchKind::CheckOut).unwrap();

        assert_eq!(db.list_punches().unwrap().len(), 2);
        assert!(!db.list_users().unwrap()[0].is_checked_in);
    }

    #[test]
    fn punch_for_unknown_user_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let result = run(&mut db, "ghost", PunchKind::CheckIn);
        assert!(result.is_err());
        assert!(db.list_punches().unwrap().is_empty());
    }
}
