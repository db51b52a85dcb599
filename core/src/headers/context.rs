//! headers/context.rs
//! Encryption context: caller-supplied string pairs, authenticated but
//! never encrypted.
//!
//! Serialization is canonical (sorted by key) so seal and open always
//! produce the same bytes for the same logical context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::headers::encode::{put_field, put_u32};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionContext {
    entries: BTreeMap<String, String>,
}

impl EncryptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `u32 count ‖ (u32 len ‖ key ‖ u32 len ‖ value)*`, big-endian, key order.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        put_u32(out, self.entries.len() as u32);
        for (k, v) in &self.entries {
            put_field(out, k.as_bytes());
            put_field(out, v.as_bytes());
        }
    }

    pub fn serialized_len(&self) -> usize {
        4 + self.entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum::<usize>()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EncryptionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for EncryptionContext {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}
