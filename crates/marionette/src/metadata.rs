//! # NPC Metadata
//!
//! String-keyed values with typed reads. A read names its own default, which
//! is returned when the key is absent or holds a value of another type; a
//! missing key is never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known metadata keys.
pub mod keys {
    /// Whether the NPC resists external pushes. Read with a default of `true`.
    pub const DEFAULT_PROTECTED: &str = "protected";
    /// Whether a player-type NPC is hidden from the player list.
    pub const REMOVE_FROM_PLAYER_LIST: &str = "removefromplayerlist";
}

/// A single stored value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Free text.
    Text(String),
}

/// Types that can be stored in and read from a [`MetadataStore`].
pub trait MetadataType: Sized {
    /// Extracts `Self` if `value` holds this type.
    fn from_value(value: &MetadataValue) -> Option<Self>;
    /// Wraps `self` for storage.
    fn into_value(self) -> MetadataValue;
}

impl MetadataType for bool {
    fn from_value(value: &MetadataValue) -> Option<Self> {
        match value {
            MetadataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> MetadataValue {
        MetadataValue::Bool(self)
    }
}

impl MetadataType for i64 {
    fn from_value(value: &MetadataValue) -> Option<Self> {
        match value {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> MetadataValue {
        MetadataValue::Int(self)
    }
}

impl MetadataType for f64 {
    fn from_value(value: &MetadataValue) -> Option<Self> {
        match value {
            MetadataValue::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            MetadataValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn into_value(self) -> MetadataValue {
        MetadataValue::Float(self)
    }
}

impl MetadataType for String {
    fn from_value(value: &MetadataValue) -> Option<Self> {
        match value {
            MetadataValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> MetadataValue {
        MetadataValue::Text(self)
    }
}

/// Per-NPC metadata.
///
/// # Example
///
/// ```rust,ignore
/// let mut data = MetadataStore::new();
/// data.set(keys::DEFAULT_PROTECTED, false);
/// assert!(!data.get(keys::DEFAULT_PROTECTED, true));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataStore {
    values: HashMap<String, MetadataValue>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `key` as `T`, or `default` when it is absent or not a `T`.
    #[must_use]
    pub fn get<T: MetadataType>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(T::from_value)
            .unwrap_or(default)
    }

    /// Raw stored value.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<&MetadataValue> {
        self.values.get(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set<T: MetadataType>(&mut self, key: impl Into<String>, value: T) -> Option<MetadataValue> {
        self.values.insert(key.into(), value.into_value())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.values.remove(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
