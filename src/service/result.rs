// ============================================================================
// catalog-signals - Service Results
// The outcome of every backend call, carried as data
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Status reported for failures that never got an HTTP response.
pub const TRANSPORT_STATUS: u16 = 0;

/// Status reported for requests rejected locally before any I/O.
pub const PRECONDITION_STATUS: u16 = 400;

// =============================================================================
// RESPONSE
// =============================================================================

/// A successful backend response: the decoded payload and its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    pub data: T,
    pub status: u16,
}

impl<T> Response<T> {
    pub fn new(data: T, status: u16) -> Self {
        Self { data, status }
    }

    /// A `200 OK` response.
    pub fn ok(data: T) -> Self {
        Self::new(data, 200)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            status: self.status,
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

// =============================================================================
// SERVICE ERROR
// =============================================================================

/// Why a backend call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No HTTP response: network failure, timeout, or client abort.
    #[error("{message}")]
    Transport { message: String },

    /// Non-2xx response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx response whose body could not be decoded.
    #[error("{message}")]
    Parse { status: u16, message: String },

    /// A required argument was missing; no request was made.
    #[error("{message}")]
    Precondition { message: String },
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self::transport("Request timed out")
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn parse(status: u16, message: impl Into<String>) -> Self {
        Self::Parse {
            status,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// HTTP status, `0` for transport failures, `400` for preconditions.
    pub fn status(&self) -> u16 {
        match self {
            Self::Transport { .. } => TRANSPORT_STATUS,
            Self::Http { status, .. } | Self::Parse { status, .. } => *status,
            Self::Precondition { .. } => PRECONDITION_STATUS,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Http { message, .. }
            | Self::Parse { message, .. }
            | Self::Precondition { message } => message,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Outcome of a backend call.
pub type ServiceResult<T> = Result<Response<T>, ServiceError>;

// =============================================================================
// RESPONSE CLASSIFICATION
// =============================================================================

/// Turn a raw `(status, body)` pair into a `ServiceResult`.
///
/// - an empty body reads as JSON `null`,
/// - a non-2xx status is an `Http` error whose message is the body's `"error"`
///   field, or `HTTP error {status}` when there is none,
/// - a 2xx body that doesn't decode into `T` is a `Parse` error.
///
/// Transports call this after receiving a response; failures without a
/// response map to `ServiceError::transport` instead.
///
/// # Example
///
/// ```
/// use catalog_signals::service::{decode_response, ServiceError};
///
/// let ok = decode_response::<Vec<u32>>(200, "[1,2]").unwrap();
/// assert_eq!(ok.data, vec![1, 2]);
///
/// let err = decode_response::<()>(422, r#"{"error":"bad title"}"#).unwrap_err();
/// assert_eq!(err, ServiceError::http(422, "bad title"));
/// ```
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> ServiceResult<T> {
    let parsed = if body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(body)
    };

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(|value| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP error {status}"));
        tracing::warn!(status, %message, "backend returned an error response");
        return Err(ServiceError::http(status, message));
    }

    let value = parsed.map_err(|err| {
        tracing::warn!(status, error = %err, "backend response is not valid JSON");
        ServiceError::parse(status, format!("Parsing error: {err}"))
    })?;
    let data = serde_json::from_value(value).map_err(|err| {
        tracing::warn!(status, error = %err, "backend response has an unexpected shape");
        ServiceError::parse(status, format!("Parsing error: {err}"))
    })?;

    Ok(Response::new(data, status))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    #[test]
    fn status_by_kind() {
        assert_eq!(ServiceError::timed_out().status(), 0);
        assert_eq!(ServiceError::http(404, "key not found").status(), 404);
        assert_eq!(ServiceError::parse(200, "x").status(), 200);
        assert_eq!(ServiceError::precondition("ID is required").status(), 400);
    }

    #[test]
    fn display_messages() {
        assert_eq!(ServiceError::timed_out().to_string(), "Request timed out");
        assert_eq!(ServiceError::http(422, "bad title").to_string(), "HTTP 422: bad title");
        assert_eq!(ServiceError::precondition("File is required").message(), "File is required");
    }

    #[test]
    fn decodes_success_body() {
        let r = decode_response::<Vec<Item>>(200, r#"[{"id":"1","title":"A"}]"#).unwrap();
        assert_eq!(r.status, 200);
        assert_eq!(r.data, vec![Item::new("1", "A")]);
    }

    #[test]
    fn empty_body_is_null() {
        let r = decode_response::<()>(200, "").unwrap();
        assert_eq!(r, Response::new((), 200));

        let r = decode_response::<Option<Item>>(201, "  ").unwrap();
        assert_eq!(r.data, None);
    }

    #[test]
    fn error_field_becomes_message() {
        let err = decode_response::<Item>(400, r#"{"error":"title is required"}"#).unwrap_err();
        assert_eq!(err, ServiceError::http(400, "title is required"));
    }

    #[test]
    fn missing_error_field_synthesizes_message() {
        let err = decode_response::<Item>(503, "<html>down</html>").unwrap_err();
        assert_eq!(err, ServiceError::http(503, "HTTP error 503"));

        let err = decode_response::<Item>(404, "").unwrap_err();
        assert_eq!(err.message(), "HTTP error 404");
    }

    #[test]
    fn malformed_success_body_is_parse_error() {
        let err = decode_response::<Item>(200, "{not json").unwrap_err();
        assert!(matches!(err, ServiceError::Parse { status: 200, .. }));
        assert!(err.message().starts_with("Parsing error:"));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err = decode_response::<Vec<Item>>(200, r#"{"id":"1"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Parse { .. }));
    }

    #[test]
    fn response_map() {
        let r = Response::ok(2).map(|n| n * 10);
        assert_eq!(r, Response::new(20, 200));
        assert_eq!(r.into_data(), 20);
    }
}
