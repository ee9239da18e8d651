//! Storage seam used by the reconciliation engine.

use anyhow::Result;

use crate::db::Database;
use crate::models::{Contact, ContactId, NewContact};

/// The query shapes reconciliation needs from a contact store.
pub trait ContactStore {
    /// One record whose email equals `email` or whose phone equals `phone_number`.
    fn find_any_match(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Option<Contact>>;

    /// Insert a record and return it with its assigned id and timestamps.
    fn create_contact(&self, contact: NewContact) -> Result<Contact>;

    /// The primary record and every secondary linked to it.
    fn find_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>>;
}

impl ContactStore for Database {
    fn find_any_match(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Option<Contact>> {
        self.find_contact_by_email_or_phone(email, phone_number)
    }

    fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        self.insert_contact(&contact)
    }

    fn find_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
        self.list_cluster(primary_id)
    }
}

impl<S: ContactStore + ?Sized> ContactStore for &S {
    fn find_any_match(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Option<Contact>> {
        (**self).find_any_match(email, phone_number)
    }

    fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        (**self).create_contact(contact)
    }

    fn find_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
        (**self).find_cluster(primary_id)
    }
}
