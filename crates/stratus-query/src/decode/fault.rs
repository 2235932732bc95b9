//! Provider fault documents.
//!
//! ```xml
//! <Response>
//!   <Errors><Error><Code>InvalidVolume.NotFound</Code><Message>..</Message></Error></Errors>
//!   <RequestID>ab12-..</RequestID>
//! </Response>
//!
//! <ErrorResponse>
//!   <Error><Code>AuthFailure</Code><Message>..</Message></Error>
//!   <RequestId>ab12-..</RequestId>
//! </ErrorResponse>
//! ```
//!
//! Faults may arrive with any HTTP status, so the orchestrator sniffs every
//! body before handing it to the action's own decoder.

use super::{decode, DecodeError, Element, ResponseDecoder};
use crate::error::ProviderFault;

const FAULT_ROOTS: &[&str] = &["Response", "ErrorResponse"];

/// Code, message and request id carried by a fault document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl Fault {
    pub fn into_provider_fault(self, action: &str, status: u16) -> ProviderFault {
        ProviderFault {
            action: action.to_string(),
            status,
            code: self.code,
            message: self.message,
            request_id: self.request_id,
        }
    }
}

/// Yields `Some(Fault)` for a fault document, `None` for anything else.
#[derive(Debug, Default)]
pub struct FaultDecoder {
    root: Option<String>,
    code: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
}

impl FaultDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseDecoder for FaultDecoder {
    type Output = Option<Fault>;

    fn start_element(&mut self, path: &[String], name: &str) -> Result<(), DecodeError> {
        if path.is_empty() {
            self.root = Some(name.to_string());
        }
        Ok(())
    }

    fn end_element(&mut self, path: &[String], element: &Element<'_>) -> Result<(), DecodeError> {
        let parent = path.last().map(String::as_str);
        match (element.name, parent) {
            // First error wins when a document lists several.
            ("Code", Some("Error")) if self.code.is_none() => {
                self.code = Some(element.text.to_string());
            }
            ("Message", Some("Error")) if self.message.is_none() => {
                self.message = Some(element.text.to_string());
            }
            ("RequestID" | "RequestId" | "requestId", _) if path.len() == 1 => {
                self.request_id = Some(element.text.to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Option<Fault>, DecodeError> {
        let is_fault_root = self
            .root
            .as_deref()
            .map(|r| FAULT_ROOTS.contains(&r))
            .unwrap_or(false);
        if !is_fault_root {
            return Ok(None);
        }
        Ok(self.code.filter(|c| !c.is_empty()).map(|code| Fault {
            code,
            message: self.message.unwrap_or_default(),
            request_id: self.request_id.filter(|r| !r.is_empty()),
        }))
    }
}

/// Decode `body` as a fault document. Bodies that are not well-formed XML or
/// carry no fault code yield `None`.
pub fn sniff_fault(body: &[u8]) -> Option<Fault> {
    // Success documents never contain a <Code> element; skip the parse.
    if !body.windows(5).any(|w| w == b"Code>") {
        return None;
    }
    decode(FaultDecoder::new(), body).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_errors_document() {
        let xml = br#"<?xml version="1.0"?>
<Response><Errors><Error><Code>InvalidVolume.NotFound</Code><Message>The volume 'vol-1' does not exist.</Message></Error></Errors>
<RequestID>a1b2c3</RequestID></Response>"#;
        let fault = sniff_fault(xml).unwrap();
        assert_eq!(fault.code, "InvalidVolume.NotFound");
        assert_eq!(fault.message, "The volume 'vol-1' does not exist.");
        assert_eq!(fault.request_id.as_deref(), Some("a1b2c3"));
    }

    #[test]
    fn error_response_document() {
        let xml = b"<ErrorResponse><Error><Code>AuthFailure</Code><Message>denied</Message></Error><RequestId>xyz-789</RequestId></ErrorResponse>";
        let fault = sniff_fault(xml).unwrap();
        assert_eq!(fault.code, "AuthFailure");
        assert_eq!(fault.request_id.as_deref(), Some("xyz-789"));

        let pf = fault.into_provider_fault("DescribeRegions", 401);
        assert_eq!(pf.action, "DescribeRegions");
        assert_eq!(pf.status, 401);
        assert_eq!(pf.code, "AuthFailure");
    }

    #[test]
    fn first_error_wins() {
        let xml = b"<Response><Errors>\
<Error><Code>First</Code><Message>one</Message></Error>\
<Error><Code>Second</Code><Message>two</Message></Error>\
</Errors></Response>";
        let fault = sniff_fault(xml).unwrap();
        assert_eq!(fault.code, "First");
        assert_eq!(fault.message, "one");
        assert_eq!(fault.request_id, None);
    }

    #[test]
    fn success_document_is_not_a_fault() {
        let xml = b"<Response><return>true</return><requestId>abc-123</requestId></Response>";
        assert_eq!(sniff_fault(xml), None);
        assert_eq!(decode(FaultDecoder::new(), xml).unwrap(), None);
    }

    #[test]
    fn code_under_other_root_is_ignored() {
        let xml = b"<DescribeTagsResponse><tagSet><item><Error><Code>x</Code></Error></item></tagSet></DescribeTagsResponse>";
        assert_eq!(sniff_fault(xml), None);
    }

    #[test]
    fn garbage_is_not_a_fault() {
        assert_eq!(sniff_fault(b"<html><body>Code> oops"), None);
        assert_eq!(sniff_fault(b""), None);
    }
}
