use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lower clamp for the health score
pub const ERROR_SCORE_MIN: i32 = -5000;
/// Upper clamp for the health score
pub const ERROR_SCORE_MAX: i32 = 5000;

/// Proxy entity
///
/// `full_url` is computed by the store (`url || ':' || port`) so every record
/// handed out already carries the ready-to-dial endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProxyRecord {
    pub id: i64,
    pub url: String,
    pub port: i32,
    pub country: Option<String>,
    pub town: Option<String>,
    pub speed: Option<i32>,
    pub source_name: Option<String>,
    pub upload_timestamp: DateTime<Utc>,
    pub error_score: i32,
    pub alt_success_counter: i32,
    pub full_url: String,
}

impl ProxyRecord {
    /// Selector addressing this record by its primary key
    pub fn selector(&self) -> ProxySelector {
        ProxySelector::by_id(self.id)
    }

    /// Per-scheme endpoint map for HTTP client configuration
    pub fn request_proxies(&self) -> RequestProxies {
        RequestProxies::from_full_url(&self.full_url)
    }
}

/// Request to add a new proxy
#[derive(Debug, Clone, Deserialize)]
pub struct NewProxy {
    pub url: String,
    pub port: i32,
    pub country: Option<String>,
    pub town: Option<String>,
    pub speed: Option<i32>,
    pub source_name: Option<String>,
    pub upload_timestamp: DateTime<Utc>,
}

impl NewProxy {
    pub fn new(url: impl Into<String>, port: i32) -> Self {
        Self {
            url: url.into(),
            port,
            country: None,
            town: None,
            speed: None,
            source_name: None,
            upload_timestamp: Utc::now(),
        }
    }
}

/// Dual-key proxy address: primary key or (url, port) endpoint.
///
/// `id` takes precedence when both are set. A selector with neither key is
/// not an error; mutations addressed with it are silent no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySelector {
    pub id: Option<i64>,
    pub url: Option<String>,
    pub port: Option<i32>,
}

impl ProxySelector {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_endpoint(url: impl Into<String>, port: i32) -> Self {
        Self {
            id: None,
            url: Some(url.into()),
            port: Some(port),
        }
    }

    /// The (url, port) pair, if both halves are present
    pub fn endpoint(&self) -> Option<(&str, i32)> {
        match (&self.url, self.port) {
            (Some(url), Some(port)) => Some((url.as_str(), port)),
            _ => None,
        }
    }

    /// Whether this selector addresses anything at all
    pub fn is_valid(&self) -> bool {
        self.id.is_some() || self.endpoint().is_some()
    }
}

/// Per-scheme proxy endpoints, both routed through the same HTTP CONNECT
/// endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestProxies {
    pub http: String,
    pub https: String,
}

impl RequestProxies {
    pub fn from_full_url(full_url: &str) -> Self {
        let endpoint = format!("http://{}", full_url);
        Self {
            http: endpoint.clone(),
            https: endpoint,
        }
    }
}
