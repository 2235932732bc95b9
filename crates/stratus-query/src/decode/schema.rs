//! Table-driven decoder for actions with nested payloads.
//!
//! A [`Schema`] names which leaf fields are typed (integer, boolean,
//! timestamp), which elements are sets of `item`s, and which elements are
//! nested records. Everything else is a string leaf, and undeclared container
//! elements are flattened into the record that encloses them.
//!
//! ```text
//! <volumeSet>            list   -> "volumeSet": List([...])
//!   <item>               item   -> one Record per occurrence, document order
//!     <size>1</size>     leaf   -> "size": Integer(1)   (declared integer)
//!     <status>..</status>leaf   -> "status": String(..)
//! ```

use super::value::{parse_bool, parse_timestamp, Record, Value};
use super::{DecodeError, Element, ResponseDecoder};

/// Static description of one action's response shape.
///
/// Typed field names match a leaf anywhere in the document. A name of the
/// form `parent.field` only matches `field` directly inside `parent`, for
/// payloads where the same leaf name carries different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Action the schema belongs to, used in diagnostics.
    pub name: &'static str,
    pub integers: &'static [&'static str],
    pub booleans: &'static [&'static str],
    pub timestamps: &'static [&'static str],
    /// Set elements whose `item` children form a list.
    pub lists: &'static [&'static str],
    /// Elements decoded as a nested record.
    pub records: &'static [&'static str],
    /// Fields that must be present on the root record.
    pub required: &'static [&'static str],
}

impl Schema {
    pub const EMPTY: Schema = Schema {
        name: "",
        integers: &[],
        booleans: &[],
        timestamps: &[],
        lists: &[],
        records: &[],
        required: &["requestId"],
    };

    fn coerce(&self, parent: &str, field: &str, text: &str) -> Result<Option<Value>, DecodeError> {
        let typed = |kind: &'static str| {
            if text.is_empty() {
                // `<ramdiskId/>`-style empty typed leaves mean "absent".
                return Ok(None);
            }
            let value = match kind {
                "integer" => text.parse::<i64>().ok().map(Value::Integer),
                "boolean" => parse_bool(text).map(Value::Boolean),
                _ => parse_timestamp(text).map(Value::Timestamp),
            };
            value.map(Some).ok_or_else(|| DecodeError::InvalidValue {
                field: field.to_string(),
                kind,
                value: text.to_string(),
            })
        };

        let declared = |names: &[&str]| {
            names
                .iter()
                .any(|n| *n == field || n.split_once('.') == Some((parent, field)))
        };

        if declared(self.integers) {
            typed("integer")
        } else if declared(self.booleans) {
            typed("boolean")
        } else if declared(self.timestamps) {
            typed("timestamp")
        } else {
            Ok(Some(Value::String(text.to_string())))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Record,
    List,
    Item,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    name: String,
    depth: usize,
    record: Record,
    items: Vec<Record>,
}

impl Frame {
    fn new(kind: FrameKind, name: &str, depth: usize) -> Self {
        Self {
            kind,
            name: name.to_string(),
            depth,
            record: Record::new(),
            items: Vec::new(),
        }
    }
}

/// Decoder driven by a [`Schema`].
#[derive(Debug)]
pub struct SchemaDecoder {
    schema: Schema,
    frames: Vec<Frame>,
    root: Option<Record>,
}

impl SchemaDecoder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            frames: Vec::new(),
            root: None,
        }
    }

    fn top_mut(&mut self) -> Result<&mut Frame, DecodeError> {
        self.frames
            .last_mut()
            .ok_or_else(|| DecodeError::Xml("element outside the root".into()))
    }

    fn commit(&mut self, frame: Frame, text: &str) -> Result<(), DecodeError> {
        let Frame {
            kind,
            name,
            mut record,
            items,
            ..
        } = frame;

        if self.frames.is_empty() {
            self.root = Some(record);
            return Ok(());
        }

        // `<item>v</item>` or `<kernel>v</kernel>`: a scalar where a record
        // was expected is kept as `{"value": v}`.
        if kind != FrameKind::List && record.is_empty() && !text.is_empty() {
            record.insert("value", text);
        }

        let parent = self.top_mut()?;
        match kind {
            FrameKind::Item => parent.items.push(record),
            FrameKind::List => parent.record.append_list(&name, items),
            FrameKind::Record => parent.record.insert(name, record),
        }
        Ok(())
    }
}

impl ResponseDecoder for SchemaDecoder {
    type Output = Record;

    fn start_element(&mut self, path: &[String], name: &str) -> Result<(), DecodeError> {
        let depth = path.len();
        let Some(top) = self.frames.last() else {
            self.frames.push(Frame::new(FrameKind::Record, name, depth));
            return Ok(());
        };

        if top.kind == FrameKind::List {
            if name != "item" {
                return Err(DecodeError::UnexpectedElement {
                    path: path.join("/"),
                    name: name.to_string(),
                });
            }
            self.frames.push(Frame::new(FrameKind::Item, name, depth));
        } else if self.schema.lists.contains(&name) {
            self.frames.push(Frame::new(FrameKind::List, name, depth));
        } else if self.schema.records.contains(&name) {
            self.frames.push(Frame::new(FrameKind::Record, name, depth));
        }
        Ok(())
    }

    fn end_element(&mut self, path: &[String], element: &Element<'_>) -> Result<(), DecodeError> {
        let depth = path.len();
        let closes_frame = self
            .frames
            .last()
            .map(|f| f.depth == depth && f.name == element.name)
            .unwrap_or(false);

        if closes_frame {
            if let Some(frame) = self.frames.pop() {
                self.commit(frame, element.text)?;
            }
            return Ok(());
        }

        // Undeclared container: its leaves already landed in the enclosing record.
        if element.has_children {
            return Ok(());
        }

        let parent = path.last().map(String::as_str).unwrap_or("");
        let value = self.schema.coerce(parent, element.name, element.text)?;
        let top = self.top_mut()?;
        if top.kind == FrameKind::List {
            return Err(DecodeError::UnexpectedElement {
                path: path.join("/"),
                name: element.name.to_string(),
            });
        }
        if let Some(value) = value {
            top.record.insert(element.name, value);
        }
        Ok(())
    }

    fn finish(self) -> Result<Record, DecodeError> {
        if let Some(open) = self.frames.last() {
            return Err(DecodeError::UnexpectedEof(open.name.clone()));
        }
        let record = self.root.ok_or(DecodeError::EmptyDocument)?;
        for field in self.schema.required {
            if !record.contains_key(field) {
                return Err(DecodeError::MissingField(field.to_string()));
            }
        }
        Ok(record)
    }
}
