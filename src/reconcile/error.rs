use thiserror::Error;

/// Message shown to callers for any failure that is not their fault.
pub const GENERIC_FAILURE: &str = "Unexpected system failure. Please try again later.";

/// Rejected input. Detected before the store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email or phone number is required")]
    MissingInput,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid phone number format. It must be a 10-digit number")]
    InvalidPhone,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("contact store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text safe to hand to an external caller. Store details never leak.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Store(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_store_detail() {
        let err = ReconcileError::from(anyhow::anyhow!("disk I/O error at /var/db/contacts.db"));
        assert!(!err.is_client_error());
        assert_eq!(err.public_message(), GENERIC_FAILURE);
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_public_message_keeps_validation_reason() {
        let err = ReconcileError::from(ValidationError::InvalidPhone);
        assert!(err.is_client_error());
        assert_eq!(
            err.public_message(),
            "Invalid phone number format. It must be a 10-digit number"
        );
    }
}
