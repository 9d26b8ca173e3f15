//! Transform attributes and their normalization.
//!
//! Callers describe a transform in one of three shapes, modelled by
//! [`TransformAttrs`]:
//!
//! | Input | Canonical attributes |
//! |---|---|
//! | `TransformAttrs::None` | empty (no query string) |
//! | `TransformAttrs::Width(200)` | `width=200` |
//! | `TransformAttrs::Explicit(..)` | unchanged, caller order kept |
//!
//! [`resolve`] turns any of them into [`Attributes`], the only form the URL
//! and descriptor builders accept. Keys are not checked against the known
//! set (`width`, `height`, `crop`, `quality`); unknown keys pass through to
//! the query string untouched.

use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for Scalar {
    /// Query-string rendering: booleans become `1`/`0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(true) => f.write_str("1"),
            Scalar::Bool(false) => f.write_str("0"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

/// Ordered attribute mapping.
///
/// Iteration order is insertion order. Setting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, Scalar)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, keeping its original position if already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a raw `application/x-www-form-urlencoded` query string.
    ///
    /// Every value is kept as a string; pair order is preserved.
    pub fn from_query(raw: &str) -> Self {
        let mut attrs = Self::new();
        for (k, v) in url::form_urlencoded::parse(raw.as_bytes()) {
            attrs.set(k.into_owned(), v.into_owned());
        }
        attrs
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<Scalar>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

/// The accepted shapes of a transform request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransformAttrs {
    /// No transform: address the original image.
    #[default]
    None,
    /// Shortcut for `{ width: n }`.
    Width(u32),
    /// Explicit key/value pairs.
    Explicit(Attributes),
}

impl From<u32> for TransformAttrs {
    fn from(width: u32) -> Self {
        TransformAttrs::Width(width)
    }
}

impl From<Option<u32>> for TransformAttrs {
    fn from(width: Option<u32>) -> Self {
        width.map_or(TransformAttrs::None, TransformAttrs::Width)
    }
}

impl From<Attributes> for TransformAttrs {
    fn from(attrs: Attributes) -> Self {
        TransformAttrs::Explicit(attrs)
    }
}

/// Normalize any [`TransformAttrs`] into canonical [`Attributes`].
pub fn resolve(attrs: impl Into<TransformAttrs>) -> Attributes {
    match attrs.into() {
        TransformAttrs::None => Attributes::new(),
        TransformAttrs::Width(width) => Attributes::new().with("width", width),
        TransformAttrs::Explicit(attrs) => attrs,
    }
}
