//! # stratus-query – signed query API client for elastic compute providers
//!
//! Builds canonical, HMAC-SHA256 signed (signature version 2) query requests,
//! sends them through a pluggable transport and decodes the provider's XML
//! answers into typed records.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  ComputeClient  (compute/)                       │
//! │  └── one method per action:                      │
//! │       (action, params, decoder)                  │
//! ├──────────────────────────────────────────────────┤
//! │  QueryClient  (client.rs)                        │
//! │  ├── merge auth params, timestamp                │
//! │  ├── canonical_query  (canonical.rs)             │
//! │  ├── QuerySigner      (signing.rs)               │
//! │  ├── Transport        (transport.rs)             │
//! │  └── fault sniff → ResponseDecoder (decode/)     │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use stratus_query::{ClientConfig, ComputeClient, Credentials, Endpoint};
//!
//! # async fn run() -> stratus_query::QueryResult<()> {
//! let config = ClientConfig::new(
//!     Credentials::new("AKIDEXAMPLE", "secret"),
//!     Endpoint::parse("https://compute.example.com")?,
//! );
//! let compute = ComputeClient::from_config(config)?;
//! let volumes = compute.describe_volumes(&[], &[]).await?;
//! for volume in volumes.get_list("volumeSet") {
//!     println!("{:?} {:?}", volume.get_str("volumeId"), volume.get_i64("size"));
//! }
//! # Ok(())
//! # }
//! ```

// ── Sub-modules ─────────────────────────────────────────────────────────

pub mod error;
pub mod config;
pub mod params;
pub mod canonical;
pub mod signing;
pub mod transport;
pub mod decode;
pub mod client;

// Per-action wrappers
pub mod compute;

// ── Re-exports for ergonomic access ─────────────────────────────────────

pub use client::QueryClient;
pub use compute::ComputeClient;
pub use config::{ClientConfig, Credentials, Endpoint, Scheme};
pub use decode::{BasicDecoder, DecodeError, Record, ResponseDecoder, Schema, SchemaDecoder, Value};
pub use error::{ProviderFault, QueryError, QueryResult};
pub use params::{Filter, ParamValue, Params, Tag};
pub use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportFailure, TransportFailureKind,
};
