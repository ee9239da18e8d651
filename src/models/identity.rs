use serde::{Deserialize, Serialize};

use super::contact::{Contact, ContactId};

/// Aggregated view of one identity cluster, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIdentity {
    pub primary_contact_id: ContactId,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<ContactId>,
}

impl ConsolidatedIdentity {
    /// Fold a fetched cluster into the response shape.
    ///
    /// Emails and phones are de-duplicated in first-seen order, with the
    /// primary record's values placed first regardless of where it sits in
    /// `cluster`. Secondary ids keep the cluster's order.
    pub fn from_cluster(primary_contact_id: ContactId, cluster: &[Contact]) -> Self {
        let primary = cluster.iter().filter(|c| c.id == primary_contact_id);
        let others = cluster.iter().filter(|c| c.id != primary_contact_id);
        let ordered: Vec<&Contact> = primary.chain(others).collect();

        let mut emails: Vec<String> = Vec::new();
        let mut phone_numbers: Vec<String> = Vec::new();
        for contact in &ordered {
            push_distinct(&mut emails, contact.email.as_deref());
            push_distinct(&mut phone_numbers, contact.phone_number.as_deref());
        }

        let secondary_contact_ids = cluster
            .iter()
            .filter(|c| !c.is_primary())
            .map(|c| c.id)
            .collect();

        Self {
            primary_contact_id,
            emails,
            phone_numbers,
            secondary_contact_ids,
        }
    }
}

fn push_distinct(values: &mut Vec<String>, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        if !values.iter().any(|existing| existing == v) {
            values.push(v.to_string());
        }
    }
}
