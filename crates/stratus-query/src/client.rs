//! Request orchestrator.
//!
//! One call to [`QueryClient::execute`] is exactly one signed round trip:
//!
//! ```text
//! params ─► merge auth params ─► canonical_query ─► sign ─► Transport::send
//!                                                             │
//!            Record ◄─ decode ◄─ (2xx, no fault) ◄────────────┤
//!     ProviderError ◄─ fault document / non-2xx ◄─────────────┤
//!    TransportError ◄─ no response ◄──────────────────────────┘
//! ```
//!
//! Nothing is retried or cached; the timestamp and signature are rebuilt for
//! every call.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::canonical::canonical_query;
use crate::config::{ClientConfig, Endpoint};
use crate::decode::{decode, sniff_fault, ResponseDecoder};
use crate::error::{ProviderFault, QueryError, QueryResult};
use crate::params::Params;
use crate::signing::{QuerySigner, SIGNATURE_METHOD, SIGNATURE_PARAM, SIGNATURE_VERSION};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Every request is a form-encoded POST.
pub const HTTP_METHOD: &str = "POST";

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Wire format of the `Timestamp` parameter.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parameters the orchestrator adds to every request. Callers must not set
/// them.
pub const RESERVED_PARAMS: &[&str] = &[
    "AWSAccessKeyId",
    "Action",
    SIGNATURE_PARAM,
    "SignatureMethod",
    "SignatureVersion",
    "Timestamp",
    "Version",
];

/// Signs, sends and decodes query API calls.
///
/// Cheap to clone; clones share the configuration and transport.
#[derive(Clone)]
pub struct QueryClient {
    config: Arc<ClientConfig>,
    signer: QuerySigner,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("endpoint", &self.config.endpoint.url())
            .field("access_key_id", &self.config.credentials.access_key_id())
            .field("api_version", &self.config.api_version)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Validate `config` and build a client on the default HTTP transport.
    pub fn new(config: ClientConfig) -> QueryResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config).map_err(|e| {
            QueryError::configuration(format!("failed to build HTTP transport: {}", e))
        })?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Validate `config` and build a client on a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> QueryResult<Self> {
        config.validate()?;
        let signer = QuerySigner::new(&config.credentials);
        Ok(Self {
            config: Arc::new(config),
            signer,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Build the signed request for `action` as it would be sent at `now`.
    ///
    /// # Panics
    ///
    /// Panics if `params` already contains one of [`RESERVED_PARAMS`]; a
    /// wrapper that sets them is a programming error.
    pub fn prepare(&self, action: &str, params: Params, now: DateTime<Utc>) -> HttpRequest {
        let params = self.with_auth_params(action, params, now);
        let endpoint = &self.config.endpoint;
        let authority = endpoint.authority();

        let canonical = canonical_query(&params);
        let signed = self
            .signer
            .sign(HTTP_METHOD, &authority, &endpoint.path, &canonical);

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), CONTENT_TYPE.to_string());

        HttpRequest {
            method: HTTP_METHOD.to_string(),
            scheme: endpoint.scheme,
            authority,
            path: endpoint.path.clone(),
            headers,
            body: signed.body,
        }
    }

    fn with_auth_params(&self, action: &str, mut params: Params, now: DateTime<Utc>) -> Params {
        if let Some(key) = RESERVED_PARAMS.iter().find(|k| params.contains_key(k)) {
            panic!(
                "parameter '{}' is reserved for request authentication (action {})",
                key, action
            );
        }
        params
            .insert("Action", action)
            .insert("AWSAccessKeyId", self.config.credentials.access_key_id())
            .insert("SignatureMethod", SIGNATURE_METHOD)
            .insert("SignatureVersion", SIGNATURE_VERSION)
            .insert("Timestamp", now.format(TIMESTAMP_FORMAT).to_string())
            .insert("Version", self.config.api_version.as_str());
        params
    }

    /// Sign and send `action`, then decode the response with `decoder`.
    ///
    /// # Panics
    ///
    /// See [`prepare`](Self::prepare).
    pub async fn execute<D>(&self, action: &str, params: Params, decoder: D) -> QueryResult<D::Output>
    where
        D: ResponseDecoder + Send,
    {
        let request = self.prepare(action, params, Utc::now());
        let host = request.authority.clone();
        log::debug!("query {} -> {}", action, request.url());

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(source) => {
                log::warn!("query {} to {} failed: {}", action, host, source);
                return Err(QueryError::Transport {
                    action: action.to_string(),
                    host,
                    source,
                });
            }
        };
        log::debug!(
            "query {} <- HTTP {} ({} bytes)",
            action,
            response.status,
            response.body.len()
        );

        handle_response(action, &response, decoder)
    }
}

/// Classify a received response and decode it at most once.
fn handle_response<D: ResponseDecoder>(
    action: &str,
    response: &HttpResponse,
    decoder: D,
) -> QueryResult<D::Output> {
    if let Some(fault) = sniff_fault(&response.body) {
        let fault = fault.into_provider_fault(action, response.status);
        log::warn!("{}", fault);
        return Err(QueryError::Provider(fault));
    }
    if !response.is_success() {
        let fault = ProviderFault::from_status(action, response.status, &response.body);
        log::warn!("{}", fault);
        return Err(QueryError::Provider(fault));
    }
    decode(decoder, &response.body).map_err(|source| QueryError::Decode {
        action: action.to_string(),
        source,
    })
}
