use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{Contact, ContactId, LinkPrecedence, NewContact};

fn parse_precedence(s: &str) -> rusqlite::Result<LinkPrecedence> {
    LinkPrecedence::parse(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown link precedence: {}", s).into(),
        )
    })
}

fn parse_timestamp(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl Database {
    // ==================== CONTACT CREATE ====================

    pub fn insert_contact(&self, new: &NewContact) -> Result<Contact> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        self.conn.execute(
            r#"INSERT INTO contacts (
                phone_number, email, linked_id, link_precedence, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                new.phone_number,
                new.email,
                new.linked_id,
                new.link_precedence.as_str(),
                stamp,
                stamp,
            ],
        )?;

        Ok(Contact {
            id: self.conn.last_insert_rowid(),
            email: new.email.clone(),
            phone_number: new.phone_number.clone(),
            link_precedence: new.link_precedence,
            linked_id: new.linked_id,
            created_at: now,
            updated_at: now,
        })
    }

    // ==================== CONTACT READ ====================

    pub fn get_contact_by_id(&self, id: ContactId) -> Result<Option<Contact>> {
        let contact = self
            .conn
            .query_row(
                "SELECT * FROM contacts WHERE id = ?",
                [id],
                Self::row_to_contact,
            )
            .optional()?;
        Ok(contact)
    }

    /// Find one contact whose email or phone equals the given value.
    ///
    /// Absent values never match. A row equal on both fields wins over a
    /// partial match; otherwise the oldest row wins.
    pub fn find_contact_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Option<Contact>> {
        let contact = self
            .conn
            .query_row(
                r#"SELECT * FROM contacts
                   WHERE (?1 IS NOT NULL AND email = ?1)
                      OR (?2 IS NOT NULL AND phone_number = ?2)
                   ORDER BY (email IS ?1 AND phone_number IS ?2) DESC, id ASC
                   LIMIT 1"#,
                params![email, phone_number],
                Self::row_to_contact,
            )
            .optional()?;
        Ok(contact)
    }

    /// The primary row plus every secondary linked to it, oldest first.
    pub fn list_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM contacts WHERE id = ?1 OR linked_id = ?1 ORDER BY id ASC",
        )?;

        let contacts = stmt
            .query_map([primary_id], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    pub fn count_contacts(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ==================== CONTACT DELETE ====================

    /// Remove every contact. Returns the number of rows deleted.
    pub fn clear_contacts(&self) -> Result<u64> {
        let deleted = self.conn.execute("DELETE FROM contacts", [])?;
        Ok(deleted as u64)
    }

    fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
        let precedence: String = row.get("link_precedence")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Contact {
            id: row.get("id")?,
            email: row.get("email")?,
            phone_number: row.get("phone_number")?,
            link_precedence: parse_precedence(&precedence)?,
            linked_id: row.get("linked_id")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO contacts (email, link_precedence, created_at, updated_at)
                 VALUES ('a@x.com', 'primary', 'garbage', '2024-01-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        let id = db.conn.last_insert_rowid();

        let err = db.get_contact_by_id(id).unwrap_err();
        let sql_err = err.downcast_ref::<rusqlite::Error>().unwrap();
        assert!(matches!(sql_err, rusqlite::Error::FromSqlConversionFailure(..)));
        assert!(db.find_contact_by_email_or_phone(Some("a@x.com"), None).is_err());
    }

    #[test]
    fn test_insert_and_get_contact() {
        let db = Database::open_memory().unwrap();

        let created = db
            .insert_contact(&NewContact::primary(some("a@x.com"), None))
            .unwrap();
        assert!(created.id > 0);

        let fetched = db.get_contact_by_id(created.id).unwrap().unwrap();
        assert_eq!(fetched.email, some("a@x.com"));
        assert_eq!(fetched.phone_number, None);
        assert_eq!(fetched.link_precedence, LinkPrecedence::Primary);
        assert_eq!(fetched.linked_id, None);
    }

    #[test]
    fn test_ids_increase_with_creation_order() {
        let db = Database::open_memory().unwrap();

        let first = db.insert_contact(&NewContact::primary(some("a@x.com"), None)).unwrap();
        let second = db.insert_contact(&NewContact::primary(some("b@x.com"), None)).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_get_missing_contact() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_contact_by_id(42).unwrap().is_none());
    }

    #[test]
    fn test_find_by_email_or_phone() {
        let db = Database::open_memory().unwrap();
        let c = db
            .insert_contact(&NewContact::primary(some("a@x.com"), some("1234567890")))
            .unwrap();

        let by_email = db.find_contact_by_email_or_phone(Some("a@x.com"), None).unwrap();
        assert_eq!(by_email.map(|c| c.id), Some(c.id));

        let by_phone = db
            .find_contact_by_email_or_phone(None, Some("1234567890"))
            .unwrap();
        assert_eq!(by_phone.map(|c| c.id), Some(c.id));

        let none = db
            .find_contact_by_email_or_phone(Some("z@x.com"), Some("0000000000"))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_absent_fields_do_not_match_nulls() {
        let db = Database::open_memory().unwrap();
        db.insert_contact(&NewContact::primary(some("a@x.com"), None)).unwrap();

        let found = db
            .find_contact_by_email_or_phone(None, Some("1234567890"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_exact_match_preferred_over_older_partial() {
        let db = Database::open_memory().unwrap();
        let primary = db
            .insert_contact(&NewContact::primary(some("a@x.com"), some("1234567890")))
            .unwrap();
        let secondary = db
            .insert_contact(&NewContact::secondary(None, some("1234567890"), primary.id))
            .unwrap();

        let found = db
            .find_contact_by_email_or_phone(None, Some("1234567890"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, secondary.id);

        let found = db
            .find_contact_by_email_or_phone(Some("a@x.com"), Some("5555555555"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, primary.id);
    }

    #[test]
    fn test_list_cluster() {
        let db = Database::open_memory().unwrap();
        let p = db.insert_contact(&NewContact::primary(some("a@x.com"), None)).unwrap();
        let other = db.insert_contact(&NewContact::primary(some("b@x.com"), None)).unwrap();
        let s1 = db
            .insert_contact(&NewContact::secondary(some("a@x.com"), some("1234567890"), p.id))
            .unwrap();
        db.insert_contact(&NewContact::secondary(some("b@x.com"), some("5555555555"), other.id))
            .unwrap();
        let s2 = db
            .insert_contact(&NewContact::secondary(some("c@x.com"), None, p.id))
            .unwrap();

        let ids: Vec<ContactId> = db.list_cluster(p.id).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![p.id, s1.id, s2.id]);
    }

    #[test]
    fn test_schema_rejects_empty_contact() {
        let db = Database::open_memory().unwrap();
        assert!(db.insert_contact(&NewContact::primary(None, None)).is_err());
    }

    #[test]
    fn test_schema_rejects_primary_with_link() {
        let db = Database::open_memory().unwrap();
        let p = db.insert_contact(&NewContact::primary(some("a@x.com"), None)).unwrap();

        let mut bad = NewContact::primary(some("b@x.com"), None);
        bad.linked_id = Some(p.id);
        assert!(db.insert_contact(&bad).is_err());
    }

    #[test]
    fn test_schema_rejects_dangling_link() {
        let db = Database::open_memory().unwrap();
        let bad = NewContact::secondary(some("a@x.com"), None, 999);
        assert!(db.insert_contact(&bad).is_err());
    }

    #[test]
    fn test_clear_contacts() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.clear_contacts().unwrap(), 0);

        let p = db.insert_contact(&NewContact::primary(some("a@x.com"), None)).unwrap();
        db.insert_contact(&NewContact::secondary(None, some("1234567890"), p.id))
            .unwrap();
        assert_eq!(db.count_contacts().unwrap(), 2);

        assert_eq!(db.clear_contacts().unwrap(), 2);
        assert_eq!(db.count_contacts().unwrap(), 0);
    }
}
