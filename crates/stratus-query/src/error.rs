//! Error model for the query pipeline.
//!
//! Every call to [`QueryClient::execute`](crate::client::QueryClient::execute)
//! ends in either a fully decoded record or exactly one of the kinds below.
//! None of them are recovered inside the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::decode::DecodeError;
use crate::transport::{TransportFailure, TransportFailureKind};

/// Top-level error type for all query operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Missing or invalid credential/endpoint, detected before any network I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The transport could not complete the round trip.
    #[error("transport error calling {action} on {host}: {source}")]
    Transport {
        action: String,
        host: String,
        #[source]
        source: TransportFailure,
    },

    /// The provider answered but rejected the request.
    #[error("{0}")]
    Provider(ProviderFault),

    /// The response body did not match the shape the action's decoder expects.
    #[error("failed to decode {action} response: {source}")]
    Decode {
        action: String,
        #[source]
        source: DecodeError,
    },
}

/// An application-level fault reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFault {
    /// The action that was rejected.
    pub action: String,
    /// HTTP status of the response carrying the fault.
    pub status: u16,
    /// Provider fault code (e.g. `InvalidVolume.NotFound`).
    pub code: String,
    /// Human-readable message from the provider.
    pub message: String,
    /// Provider request id, when the fault document carried one.
    pub request_id: Option<String>,
}

impl fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejected [{}]: {} (HTTP {})",
            self.action, self.code, self.message, self.status
        )?;
        if let Some(ref req_id) = self.request_id {
            write!(f, " [RequestId: {}]", req_id)?;
        }
        Ok(())
    }
}

impl ProviderFault {
    /// Fault for a non-2xx response whose body carried no decodable fault.
    pub fn from_status(action: &str, status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let excerpt: String = text.trim().chars().take(200).collect();
        Self {
            action: action.to_string(),
            status,
            code: format!("Http{}", status),
            message: if excerpt.is_empty() {
                format!("HTTP {} with empty body", status)
            } else {
                excerpt
            },
            request_id: None,
        }
    }
}

impl QueryError {
    /// Build a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// The provider fault, if this is a provider error.
    pub fn fault(&self) -> Option<&ProviderFault> {
        match self {
            Self::Provider(fault) => Some(fault),
            _ => None,
        }
    }

    /// Whether a caller-level retry policy may reasonably try again.
    ///
    /// The pipeline never retries on its own; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => matches!(
                source.kind,
                TransportFailureKind::Connect | TransportFailureKind::Timeout
            ),
            Self::Provider(fault) => is_retryable_code(&fault.code, fault.status),
            Self::Configuration(_) | Self::Decode { .. } => false,
        }
    }
}

/// Throttling and transient server-side fault codes.
fn is_retryable_code(code: &str, status: u16) -> bool {
    if matches!(status, 429 | 500 | 502 | 503 | 504) {
        return true;
    }
    matches!(
        code,
        "Throttling"
            | "RequestLimitExceeded"
            | "InsufficientInstanceCapacity"
            | "InsufficientAddressCapacity"
            | "InternalError"
            | "Unavailable"
            | "ServiceUnavailable"
            | "RequestTimeout"
    )
}

/// Convenience result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
