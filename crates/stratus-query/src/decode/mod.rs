//! Response decoding.
//!
//! A decoder is a small state machine fed by [`decode`], which walks the XML
//! body with a pull parser and reports every element twice: once when it
//! opens and once when it closes (with its accumulated text). The driver
//! owns the path of open elements and rejects malformed markup, so decoders
//! only have to care about the shape of their own action's payload.
//!
//! ```text
//! <DescribeVolumesResponse>          start(path=[],        "DescribeVolumesResponse")
//!   <volumeSet>                      start(path=[root],    "volumeSet")
//!     <item>                         start(path=[root,vs], "item")
//!       <size>1</size>               start(...), end(path=[root,vs,item], size, "1")
//!     </item>                        end(path=[root,vs],   item)
//! ```

mod basic;
mod fault;
mod schema;
mod value;

pub use basic::BasicDecoder;
pub use fault::{sniff_fault, Fault, FaultDecoder};
pub use schema::{Schema, SchemaDecoder};
pub use value::{parse_bool, parse_timestamp, Record, Value};

use quick_xml::events::Event;
use quick_xml::Reader;
use std::str;
use thiserror::Error;

/// Why a response body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("empty response document")]
    EmptyDocument,
    #[error("document ended inside <{0}>")]
    UnexpectedEof(String),
    #[error("unexpected element <{name}> under '{path}'")]
    UnexpectedElement { path: String, name: String },
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("invalid {kind} value for '{field}': {value:?}")]
    InvalidValue {
        field: String,
        kind: &'static str,
        value: String,
    },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

/// A closed element as reported to [`ResponseDecoder::end_element`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    /// Local name, namespace prefix stripped.
    pub name: &'a str,
    /// Concatenated, unescaped text content (trimmed).
    pub text: &'a str,
    /// Whether any child element appeared inside.
    pub has_children: bool,
}

/// Turns one action's response body into a typed result.
///
/// `path` holds the names of the enclosing open elements, outermost first,
/// and never includes the element being reported.
pub trait ResponseDecoder {
    type Output;

    fn start_element(&mut self, _path: &[String], _name: &str) -> Result<(), DecodeError> {
        Ok(())
    }

    fn end_element(&mut self, path: &[String], element: &Element<'_>) -> Result<(), DecodeError>;

    /// Called once after the root element closed.
    fn finish(self) -> Result<Self::Output, DecodeError>;
}

struct OpenElement {
    name: String,
    text: String,
    has_children: bool,
}

fn element_name(raw: &[u8]) -> Result<String, DecodeError> {
    str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| DecodeError::Xml("invalid UTF-8 in element name".into()))
}

/// Run `decoder` over a raw response body.
pub fn decode<D: ResponseDecoder>(mut decoder: D, body: &[u8]) -> Result<D::Output, DecodeError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut open: Vec<OpenElement> = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DecodeError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = element_name(e.local_name().as_ref())?;
                if open.is_empty() && saw_root {
                    return Err(DecodeError::UnexpectedElement {
                        path: String::new(),
                        name,
                    });
                }
                if let Some(parent) = open.last_mut() {
                    parent.has_children = true;
                }
                decoder.start_element(&path, &name)?;
                saw_root = true;

                if matches!(event, Event::Empty(_)) {
                    let element = Element {
                        name: &name,
                        text: "",
                        has_children: false,
                    };
                    decoder.end_element(&path, &element)?;
                } else {
                    path.push(name.clone());
                    open.push(OpenElement {
                        name,
                        text: String::new(),
                        has_children: false,
                    });
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape()?;
                match open.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(DecodeError::Xml(
                            "text content outside the root element".into(),
                        ))
                    }
                }
            }
            Event::CData(ref c) => {
                let text = str::from_utf8(c)
                    .map_err(|_| DecodeError::Xml("invalid UTF-8 in CDATA".into()))?;
                if let Some(current) = open.last_mut() {
                    current.text.push_str(text);
                }
            }
            Event::End(ref e) => {
                let name = element_name(e.local_name().as_ref())?;
                let closed = open.pop().ok_or_else(|| {
                    DecodeError::Xml(format!("closing tag </{}> without an open element", name))
                })?;
                if closed.name != name {
                    return Err(DecodeError::Xml(format!(
                        "expected </{}>, found </{}>",
                        closed.name, name
                    )));
                }
                path.pop();
                let element = Element {
                    name: &closed.name,
                    text: closed.text.trim(),
                    has_children: closed.has_children,
                };
                decoder.end_element(&path, &element)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(DecodeError::UnexpectedEof(unclosed.name));
    }
    if !saw_root {
        return Err(DecodeError::EmptyDocument);
    }
    decoder.finish()
}
