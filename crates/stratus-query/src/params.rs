//! Request parameter mapping.
//!
//! Keys use the provider's dotted/indexed naming convention: a sequence
//! parameter `PublicIp` is sent as `PublicIp.1`, `PublicIp.2`, ... and nested
//! structures as `Filter.1.Value.2`. Values are scalars; a `Nil` value means
//! "not sent at all" rather than "sent empty".

use std::collections::BTreeMap;
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
}

impl ParamValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, ParamValue::Nil)
    }

    /// Wire representation, `None` for `Nil`.
    pub fn render(&self) -> Option<String> {
        match self {
            ParamValue::Str(s) => Some(s.clone()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Nil => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(s) => f.write_str(&s),
            None => f.write_str("nil"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue::Str(v.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::Int(i64::from(v))
            }
        })*
    };
}

int_param!(i32, i64, u16, u32);

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Nil)
    }
}

/// Parameter mapping for one request.
///
/// Backed by a `BTreeMap`, so iteration is always in byte-wise key order
/// regardless of insertion order, and a key can appear only once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a sequence as `name.1`, `name.2`, ...
    pub fn insert_indexed<V>(&mut self, name: &str, values: &[V]) -> &mut Self
    where
        V: Clone + Into<ParamValue>,
    {
        for (i, value) in values.iter().enumerate() {
            self.entries
                .insert(format!("{}.{}", name, i + 1), value.clone().into());
        }
        self
    }

    /// Insert `Filter.N.Name` / `Filter.N.Value.M` pairs.
    pub fn insert_filters(&mut self, filters: &[Filter]) -> &mut Self {
        for (i, filter) in filters.iter().enumerate() {
            let idx = i + 1;
            self.insert(format!("Filter.{}.Name", idx), filter.name.as_str());
            for (j, val) in filter.values.iter().enumerate() {
                self.insert(format!("Filter.{}.Value.{}", idx, j + 1), val.as_str());
            }
        }
        self
    }

    /// Insert `{prefix}.N.Key` / `{prefix}.N.Value` pairs. An absent tag value
    /// is omitted, which the provider reads as "any value".
    pub fn insert_tags(&mut self, prefix: &str, tags: &[Tag]) -> &mut Self {
        for (i, tag) in tags.iter().enumerate() {
            let idx = i + 1;
            self.insert(format!("{}.{}.Key", prefix, idx), tag.key.as_str());
            self.insert(
                format!("{}.{}.Value", prefix, idx),
                tag.value.as_deref(),
            );
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, nil ones included, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries that will actually be transmitted, in key order.
    pub fn transmitted(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.render().map(|s| (k.as_str(), s)))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Describe-call filter (`Filter.N.Name` with one or more values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// Resource tag. The value is optional so the same type serves tag deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.to_string()),
        }
    }

    pub fn key_only(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
        }
    }
}
