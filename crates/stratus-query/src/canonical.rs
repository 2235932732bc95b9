//! Canonical form of a parameter mapping.
//!
//! The canonical string is both the input to the signature and the request
//! body actually sent, so it must be byte-for-byte deterministic:
//!
//! * keys sorted by byte value (not locale),
//! * nil values dropped,
//! * keys and values percent-encoded, every byte outside the RFC 3986
//!   unreserved set becomes `%XX` (upper-case hex),
//! * space encoded as `%20`, never `+`; a literal `+` is `%2B`,
//! * `key=value` pairs joined with `&`, no trailing separator.
//!
//! The provider recomputes the signature over its own canonicalisation of the
//! received parameters, so a single byte of disagreement here (`+` vs `%20`
//! being the usual culprit) turns into an authentication failure.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::params::Params;

/// Bytes that must be escaped: everything except `A-Z a-z 0-9 - _ . ~`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a key or value.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}

/// Build the canonical body for a parameter mapping.
pub fn canonical_query(params: &Params) -> String {
    params
        .transmitted()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(&v)))
        .collect::<Vec<String>>()
        .join("&")
}
