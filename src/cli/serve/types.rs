//! Wire types for the identify server.

use serde::{Deserialize, Serialize};

use crate::reconcile::GENERIC_FAILURE;

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub contacts: u64,
}

/// A fully rendered response, ready to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self { status, body },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                Self {
                    status: 500,
                    body: format!(r#"{{"error":"{GENERIC_FAILURE}"}}"#),
                }
            }
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorResponse::new(message))
    }

    pub fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_is_json() {
        let resp = HttpResponse::error(400, "Invalid \"email\" format");
        let parsed: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(parsed.error, "Invalid \"email\" format");
        assert_eq!(resp.status_text(), "Bad Request");
        assert_eq!(parsed, ErrorResponse::new("Invalid \"email\" format"));
    }

    #[test]
    fn test_unserializable_body_becomes_generic_500() {
        // JSON object keys must be strings
        let body: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let resp = HttpResponse::json(200, &body);
        assert_eq!(resp.status, 500);
        let parsed: ErrorResponse = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(parsed.error, GENERIC_FAILURE);
    }

    #[test]
    fn test_health_serializes_camel_case() {
        let health = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3,
            contacts: 2,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["uptimeSecs"], 3);
        assert_eq!(json["contacts"], 2);
    }
}
