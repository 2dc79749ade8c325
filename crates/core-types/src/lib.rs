//! Core vocabulary shared across the VectorBase workspace.
//!
//! These types intentionally avoid heavy dependencies so that the store, the
//! embedding providers, and the CLI agree on what a vector, a metadata map,
//! and a ranked hit look like.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod config;

/// Dense embedding. Dimensionality is fixed per store instance.
pub type Vector = Vec<f32>;

/// Structured attributes attached to an entry. Key order is irrelevant; the
/// `BTreeMap` only keeps debug and serialized output deterministic.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Scalar metadata value.
///
/// Integers are kept as `i64` so identifiers compare exactly at any
/// magnitude. An `Int` equals a `Number` only when the float holds exactly
/// that integer, so `1` and `1.0` match while `"1"` and `1` do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
}

impl MetadataValue {
    /// Interpret a raw command-line token: `true`/`false` become booleans,
    /// integers stay exact, other numbers become floats, the rest stays text.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw.parse::<i64>().map_or_else(
                |_| {
                    raw.parse::<f64>()
                        .map_or_else(|_| Self::String(raw.to_string()), Self::Number)
                },
                Self::Int,
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value as a float; large integers may round.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// `f` holds exactly the integer `n`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_is_int(f: f64, n: i64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 && f as i64 == n
}

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Int(n), Self::Number(f)) | (Self::Number(f), Self::Int(n)) => {
                float_is_int(*f, *n)
            }
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Saturates at `i64::MAX`.
impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Build a [`Metadata`] map from `(key, value)` pairs.
pub fn metadata<K, V, I>(pairs: I) -> Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Exact-match-all-keys predicate over an entry's metadata.
///
/// Every required key must be present with exactly the required value. A key
/// missing from the entry excludes it; there is no wildcard. An empty filter
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter(Metadata);

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required `key == value` clause.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(key, required)| metadata.get(key) == Some(required))
    }
}

impl From<Metadata> for MetadataFilter {
    fn from(value: Metadata) -> Self {
        Self(value)
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataFilter
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(metadata(iter))
    }
}

/// One ranked hit. Produced fresh per query and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub key: String,
    pub score: f32,
}

impl SearchResult {
    pub fn new(key: impl Into<String>, score: f32) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}
