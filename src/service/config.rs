// ============================================================================
// catalog-signals - Service Configuration
// Backend location, request timeout, and REST routes
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{ImageId, ItemId};

/// Fixed timeout applied to every backend request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Where the backend lives and how long a request may take.
///
/// Deserializes from camelCase JSON (`baseUrl`, `timeoutMs`); both fields are
/// optional and default to the same origin and a 15s timeout.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use catalog_signals::service::ServiceConfig;
///
/// let config = ServiceConfig::from_json(r#"{"baseUrl":"http://localhost:8080/","timeoutMs":500}"#).unwrap();
/// assert_eq!(config.timeout, Duration::from_millis(500));
/// assert_eq!(config.items_url(), "http://localhost:8080/api/item/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout", rename = "timeoutMs", with = "millis")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Join `path` onto the base URL with exactly one `/` between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // =========================================================================
    // ROUTES
    // =========================================================================

    pub fn items_url(&self) -> String {
        self.endpoint("api/item/")
    }

    pub fn item_url(&self, id: &ItemId) -> String {
        self.endpoint(&format!("api/item/{id}"))
    }

    pub fn upload_url(&self) -> String {
        self.endpoint("api/image/upload")
    }

    pub fn image_url(&self, id: &ImageId) -> String {
        self.endpoint(&format!("api/image/files/{id}"))
    }

    pub fn version_url(&self) -> String {
        self.endpoint("api/version")
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
