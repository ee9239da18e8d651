use anyhow::Result;

use crate::config::Config;
use crate::db::Database;

/// Execute the clear command: wipe every stored contact.
pub fn run_clear(config: &Config) -> Result<()> {
    let db = config.open_database()?;
    println!("{}", clear(&db)?);
    Ok(())
}

fn clear(db: &Database) -> Result<&'static str> {
    if db.count_contacts()? == 0 {
        return Ok("No data present in Contact table.");
    }

    let deleted = db.clear_contacts()?;
    tracing::info!(deleted, "contact table cleared");
    Ok("All data cleared from Contact table.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContact;

    #[test]
    fn test_clear_empty() {
        let db = Database::open_memory().unwrap();
        assert_eq!(clear(&db).unwrap(), "No data present in Contact table.");
    }

    #[test]
    fn test_clear_populated() {
        let db = Database::open_memory().unwrap();
        let p = db
            .insert_contact(&NewContact::primary(Some("a@x.com".into()), None))
            .unwrap();
        db.insert_contact(&NewContact::secondary(None, Some("1234567890".into()), p.id))
            .unwrap();

        assert_eq!(clear(&db).unwrap(), "All data cleared from Contact table.");
        assert_eq!(db.count_contacts().unwrap(), 0);
    }
}
