//! Error surface shared by the API client and every domain service.
//!
//! Nothing in this crate recovers from an [`ApiError`]: it travels unchanged
//! from the HTTP layer through the services to the caller, which decides
//! what the user sees.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by [`crate::ApiClient`] and the domain services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, or a generic one.
        message: String,
    },

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Rejected client-side before any request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identical lifecycle request is already in flight.
    #[error("duplicate request: {0}")]
    Duplicate(String),

    /// A request path could not be joined onto the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure, timeout, connection refused.
    Network,
    /// Missing, expired or invalid credentials (401/403).
    Authentication,
    /// Malformed input, caught locally or reported by the server (400/422).
    Validation,
    /// Valid request refused by a business rule (409).
    BusinessRule,
    /// Missing product, order or user (404).
    NotFound,
    /// Server-side failure (5xx) or any other unexpected status.
    Server,
    /// Suppressed duplicate request.
    Duplicate,
    /// Response body did not decode.
    Decode,
}

impl ApiError {
    /// Build a status error from a raw response body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = extract_message(body)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Self::Status { status, message }
    }

    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Network,
            Self::Status { status, .. } => match *status {
                401 | 403 => ErrorKind::Authentication,
                400 | 422 => ErrorKind::Validation,
                404 => ErrorKind::NotFound,
                409 => ErrorKind::BusinessRule,
                _ => ErrorKind::Server,
            },
            Self::Decode(_) => ErrorKind::Decode,
            Self::Validation(_) | Self::InvalidUrl(_) => ErrorKind::Validation,
            Self::Duplicate(_) => ErrorKind::Duplicate,
        }
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a user-facing notification.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. }
            | Self::Validation(message)
            | Self::Duplicate(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the server rejected the credentials (HTTP 401).
    ///
    /// The client never logs out on its own; callers decide.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// Error payload shapes seen from the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<ErrorMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

fn extract_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    let message = match parsed.message {
        Some(ErrorMessage::One(message)) => Some(message),
        Some(ErrorMessage::Many(messages)) if !messages.is_empty() => Some(messages.join("; ")),
        _ => None,
    };
    message.or(parsed.error).filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_string_payload() {
        let err = ApiError::from_response(409, br#"{"statusCode":409,"message":"Stock insuficiente"}"#);
        assert_eq!(err.message(), "Stock insuficiente");
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_message_from_array_payload() {
        let err = ApiError::from_response(
            400,
            br#"{"message":["price must not be negative","name should not be empty"],"error":"Bad Request"}"#,
        );
        assert_eq!(
            err.message(),
            "price must not be negative; name should not be empty"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_falls_back_to_error_field_then_generic() {
        let err = ApiError::from_response(404, br#"{"error":"Not Found"}"#);
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ApiError::from_response(502, b"<html>bad gateway</html>");
        assert_eq!(err.message(), "request failed with status 502");
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn test_unauthorized() {
        let err = ApiError::from_response(401, br#"{"message":"Unauthorized"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!ApiError::from_response(403, b"").is_unauthorized());
    }

    #[test]
    fn test_display() {
        let err = ApiError::Status {
            status: 400,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): bad");
        assert_eq!(
            ApiError::Validation("quantity must be at least 1".to_string()).to_string(),
            "validation failed: quantity must be at least 1"
        );
    }
}
