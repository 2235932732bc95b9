//! Client configuration: credentials, endpoint and protocol settings.
//!
//! Everything here is fixed when a [`QueryClient`](crate::client::QueryClient)
//! is constructed and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{QueryError, QueryResult};

/// API version sent with every request unless overridden.
pub const DEFAULT_API_VERSION: &str = "2009-11-30";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ── Credentials ─────────────────────────────────────────────────────────

/// Access key pair used to sign requests.
///
/// The access key id travels in cleartext as a request parameter. The secret
/// never leaves the process: it only keys the HMAC, is redacted from `Debug`
/// output and is wiped from memory on drop.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        }
    }

    /// Resolve credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
    pub fn from_environment() -> Option<Self> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(Self::new(&access_key, &secret_key))
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Reject credentials that could never produce a valid signature.
    pub fn validate(&self) -> QueryResult<()> {
        if self.access_key_id.trim().is_empty() {
            return Err(QueryError::configuration("access key id is required"));
        }
        if self.secret_access_key.is_empty() {
            return Err(QueryError::configuration("secret access key is required"));
        }
        if self.access_key_id.chars().any(char::is_whitespace) {
            return Err(QueryError::configuration(
                "access key id must not contain whitespace",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

// ── Endpoint ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Where query requests are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    /// Explicit port; `None` means the scheme's default.
    #[serde(default)]
    pub port: Option<u16>,
    /// Request path, `/` for the provider's public endpoints.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl Endpoint {
    /// HTTPS endpoint on the default port with the root path.
    pub fn https(host: &str) -> Self {
        Self {
            scheme: Scheme::Https,
            host: host.to_ascii_lowercase(),
            port: None,
            path: default_path(),
        }
    }

    /// Parse an endpoint URL such as `https://compute.example.com` or
    /// `http://cloud.local:8773/services/Cloud`.
    pub fn parse(input: &str) -> QueryResult<Self> {
        let url = url::Url::parse(input)
            .map_err(|e| QueryError::configuration(format!("invalid endpoint '{}': {}", input, e)))?;
        let scheme = match url.scheme() {
            "https" => Scheme::Https,
            "http" => Scheme::Http,
            other => {
                return Err(QueryError::configuration(format!(
                    "unsupported endpoint scheme '{}'",
                    other
                )))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| QueryError::configuration(format!("endpoint '{}' has no host", input)))?
            .to_ascii_lowercase();
        let path = if url.path().is_empty() {
            default_path()
        } else {
            url.path().to_string()
        };
        let endpoint = Self {
            scheme,
            host,
            // `Url::port` is already `None` when the port is the scheme default.
            port: url.port(),
            path,
        };
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// `host[:port]`, the value of the `Host` header and of the host line in
    /// the string to sign. The port is omitted when it is the scheme default.
    pub fn authority(&self) -> String {
        let host = self.host.to_ascii_lowercase();
        match self.port {
            Some(port) if port != self.scheme.default_port() => format!("{}:{}", host, port),
            _ => host,
        }
    }

    /// Full request URL.
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.authority(), self.path)
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.host.trim().is_empty() {
            return Err(QueryError::configuration("endpoint host is required"));
        }
        if self.host.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(QueryError::configuration(format!(
                "invalid endpoint host '{}'",
                self.host
            )));
        }
        if !self.path.starts_with('/') {
            return Err(QueryError::configuration(format!(
                "endpoint path '{}' must start with '/'",
                self.path
            )));
        }
        Ok(())
    }
}

// ── Client configuration ────────────────────────────────────────────────

/// Complete, immutable client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub endpoint: Endpoint,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("stratus-query/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    pub fn new(credentials: Credentials, endpoint: Endpoint) -> Self {
        Self {
            credentials,
            endpoint,
            api_version: default_api_version(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn with_timeouts(mut self, request_secs: u64, connect_secs: u64) -> Self {
        self.request_timeout_secs = request_secs;
        self.connect_timeout_secs = connect_secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> QueryResult<()> {
        self.credentials.validate()?;
        self.endpoint.validate()?;
        if self.api_version.trim().is_empty() {
            return Err(QueryError::configuration("api version is required"));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(QueryError::configuration("timeouts must be non-zero"));
        }
        Ok(())
    }
}
