//! Hosted data service errors.

use aitoonic_core::StoreError;
use thiserror::Error;

/// Errors that can occur when talking to the hosted data service.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed or the body could not be read.
    #[error("Supabase request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("Supabase response error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Supabase URL: {0}")]
    Url(#[from] url::ParseError),

    /// The service answered with an error status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The token was missing, invalid or expired.
    #[error("Supabase rejected the access token")]
    Unauthorized,

    /// A write returned no representation of the row.
    #[error("no row returned for {0}")]
    NoRow(String),

    /// A count response had no usable `Content-Range` header.
    #[error("missing or malformed Content-Range header")]
    MissingCount,
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Request(e) if e.is_decode() => Self::Decode(e.to_string()),
            SupabaseError::Request(e) => Self::Transport(e.to_string()),
            SupabaseError::Json(e) => Self::Decode(e.to_string()),
            SupabaseError::Url(e) => Self::Transport(e.to_string()),
            SupabaseError::Api { status, message } => Self::Api { status, message },
            SupabaseError::Unauthorized => Self::Unauthorized,
            SupabaseError::NoRow(id) => Self::NotFound(id),
            SupabaseError::MissingCount => {
                Self::Decode("missing or malformed Content-Range header".to_string())
            }
        }
    }
}

/// Build an error from a failed response body.
///
/// The data API reports `message`; the auth API uses `msg`,
/// `error_description` or `error` depending on the endpoint.
pub(super) fn from_response(status: u16, body: &str) -> SupabaseError {
    if status == 401 {
        return SupabaseError::Unauthorized;
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("request failed with status {status}")
            } else {
                trimmed.to_string()
            }
        });

    SupabaseError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_api_message() {
        let err = from_response(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_auth_api_messages() {
        let err = from_response(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#);
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = from_response(422, r#"{"msg":"Signups not allowed"}"#);
        assert_eq!(err.to_string(), "Signups not allowed");
    }

    #[test]
    fn test_non_json_body_and_unauthorized() {
        assert_eq!(from_response(502, "").to_string(), "request failed with status 502");
        assert_eq!(from_response(500, "boom\n").to_string(), "boom");
        assert!(matches!(from_response(401, "{}"), SupabaseError::Unauthorized));
    }

    #[test]
    fn test_conversion_keeps_api_message() {
        let store_err: StoreError = SupabaseError::Api {
            status: 400,
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(store_err, StoreError::Api { status: 400, message: "bad".to_string() });
    }
}
