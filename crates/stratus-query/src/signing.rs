//! Query signature, version 2 (HMAC-SHA256).
//!
//! ```text
//! StringToSign = HTTPMethod + "\n" +
//!                Host       + "\n" +
//!                Path       + "\n" +
//!                CanonicalBody            (without a trailing '&')
//!
//! Signature    = Base64( HMAC-SHA256( SecretKey, StringToSign ) )
//! ```
//!
//! The signature is appended to the canonical body as the final
//! `Signature=<percent-encoded>` pair and the result is the request body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::canonical::percent_encode;
use crate::config::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Value of the `SignatureMethod` parameter.
pub const SIGNATURE_METHOD: &str = "HmacSHA256";

/// Value of the `SignatureVersion` parameter.
pub const SIGNATURE_VERSION: &str = "2";

/// Name of the parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "Signature";

/// Signs canonical bodies with one credential.
#[derive(Debug, Clone)]
pub struct QuerySigner {
    credentials: Credentials,
}

/// A body ready to be transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Canonical body with the `Signature` pair appended.
    pub body: String,
    /// The exact bytes the signature was computed over.
    pub string_to_sign: String,
    /// Base64 signature, before percent-encoding.
    pub signature: String,
}

impl QuerySigner {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            credentials: credentials.clone(),
        }
    }

    /// Build the string to sign.
    ///
    /// Exactly one trailing `&` is dropped from the body if present; any other
    /// final byte belongs to a value and is kept.
    pub fn string_to_sign(method: &str, host: &str, path: &str, canonical_body: &str) -> String {
        let body = canonical_body.strip_suffix('&').unwrap_or(canonical_body);
        format!("{}\n{}\n{}\n{}", method, host, path, body)
    }

    /// Base64 HMAC-SHA256 of `string_to_sign` keyed with the secret.
    pub fn signature(&self, string_to_sign: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret_access_key().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Sign a canonical body (which must not already carry `Signature`).
    pub fn sign(&self, method: &str, host: &str, path: &str, canonical_body: &str) -> SignedRequest {
        let string_to_sign = Self::string_to_sign(method, host, path, canonical_body);
        let signature = self.signature(&string_to_sign);

        let unsigned = canonical_body.strip_suffix('&').unwrap_or(canonical_body);
        let pair = format!("{}={}", SIGNATURE_PARAM, percent_encode(&signature));
        let body = if unsigned.is_empty() {
            pair
        } else {
            format!("{}&{}", unsigned, pair)
        };

        SignedRequest {
            body,
            string_to_sign,
            signature,
        }
    }
}
