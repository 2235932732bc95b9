//! Decoder for actions that only answer with a success flag.
//!
//! ```xml
//! <DeleteVolumeResponse>
//!   <requestId>59dbff89-35bd-4eac-99ed-be587EXAMPLE</requestId>
//!   <return>true</return>
//! </DeleteVolumeResponse>
//! ```

use super::value::{parse_bool, Record};
use super::{DecodeError, Element, ResponseDecoder};

/// Produces `{return: Boolean, requestId: String}`.
#[derive(Debug, Default)]
pub struct BasicDecoder {
    success: Option<bool>,
    request_id: Option<String>,
}

impl BasicDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseDecoder for BasicDecoder {
    type Output = Record;

    fn end_element(&mut self, path: &[String], element: &Element<'_>) -> Result<(), DecodeError> {
        // Only direct children of the root element carry the flag.
        if path.len() != 1 {
            return Ok(());
        }
        match element.name {
            "return" => {
                let flag = parse_bool(element.text).ok_or_else(|| DecodeError::InvalidValue {
                    field: "return".into(),
                    kind: "boolean",
                    value: element.text.to_string(),
                })?;
                self.success = Some(flag);
            }
            "requestId" => self.request_id = Some(element.text.to_string()),
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Record, DecodeError> {
        let success = self
            .success
            .ok_or_else(|| DecodeError::MissingField("return".into()))?;
        let request_id = self
            .request_id
            .ok_or_else(|| DecodeError::MissingField("requestId".into()))?;

        let mut record = Record::new();
        record.insert("return", success);
        record.insert("requestId", request_id);
        Ok(record)
    }
}
