use std::fmt;

use anyhow::Result;
use serde_json::Value;

mod session;

pub use session::{Session, SessionOptions};

/// Read access to the appliance's REST API.
///
/// `path` is relative to the versioned API root (e.g. `/assets`). Implementations
/// add the page-size parameter themselves.
pub trait ApiClient {
    fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub api_root: String,
}

impl Endpoint {
    pub fn base_uri(&self) -> String {
        let root = self.api_root.trim_end_matches('/');
        let root = if root.starts_with('/') || root.is_empty() {
            root.to_string()
        } else {
            format!("/{root}")
        };
        format!("https://{}:{}{}", self.host, self.port, root)
    }
}

/// A request that reached the appliance but came back with an unexpected status.
#[derive(Debug, Clone)]
pub struct HttpStatusError {
    pub method: &'static str,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The call {} {} failed, code: {}, body: {}",
            self.method, self.url, self.status, self.body
        )
    }
}

impl std::error::Error for HttpStatusError {}
