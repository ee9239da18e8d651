use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned contact id. Ordered by creation.
pub type ContactId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
    #[default]
    Primary,
    Secondary,
}

impl LinkPrecedence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for LinkPrecedence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored observation of an email and/or phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub link_precedence: LinkPrecedence,
    pub linked_id: Option<ContactId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn is_primary(&self) -> bool {
        self.link_precedence == LinkPrecedence::Primary
    }

    /// Id of the primary record anchoring this contact's cluster.
    ///
    /// `None` only for a secondary that lost its link, which the schema forbids.
    pub fn primary_id(&self) -> Option<ContactId> {
        match self.link_precedence {
            LinkPrecedence::Primary => Some(self.id),
            LinkPrecedence::Secondary => self.linked_id,
        }
    }

    /// True when both stored fields equal the given pair exactly.
    pub fn has_same_details(&self, email: Option<&str>, phone_number: Option<&str>) -> bool {
        self.email.as_deref() == email && self.phone_number.as_deref() == phone_number
    }
}

/// A contact about to be inserted. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub link_precedence: LinkPrecedence,
    pub linked_id: Option<ContactId>,
}

impl NewContact {
    pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
        Self {
            email,
            phone_number,
            link_precedence: LinkPrecedence::Primary,
            linked_id: None,
        }
    }

    pub fn secondary(
        email: Option<String>,
        phone_number: Option<String>,
        primary_id: ContactId,
    ) -> Self {
        Self {
            email,
            phone_number,
            link_precedence: LinkPrecedence::Secondary,
            linked_id: Some(primary_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: ContactId, precedence: LinkPrecedence, linked_id: Option<ContactId>) -> Contact {
        let now = Utc::now();
        Contact {
            id,
            email: Some("a@x.com".to_string()),
            phone_number: None,
            link_precedence: precedence,
            linked_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_primary_id() {
        assert_eq!(contact(4, LinkPrecedence::Primary, None).primary_id(), Some(4));
        assert_eq!(contact(9, LinkPrecedence::Secondary, Some(4)).primary_id(), Some(4));
        assert_eq!(contact(9, LinkPrecedence::Secondary, None).primary_id(), None);
    }

    #[test]
    fn test_has_same_details() {
        let c = contact(1, LinkPrecedence::Primary, None);
        assert!(c.has_same_details(Some("a@x.com"), None));
        assert!(!c.has_same_details(Some("a@x.com"), Some("1234567890")));
        assert!(!c.has_same_details(None, None));
    }

    #[test]
    fn test_link_precedence_round_trip() {
        for p in [LinkPrecedence::Primary, LinkPrecedence::Secondary] {
            assert_eq!(LinkPrecedence::parse(p.as_str()), Some(p));
        }
        assert_eq!(LinkPrecedence::parse("tertiary"), None);
    }
}
