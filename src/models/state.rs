//! Known-state snapshot: what has already been announced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Availability;

/// Last observed attributes of a catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntry {
    /// `None` for entries migrated from a legacy file that never recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
}

impl KnownEntry {
    pub fn new(availability: Availability) -> Self {
        Self {
            availability: Some(availability),
        }
    }
}

/// Map from catalog key to its last observed attributes.
///
/// Ordered so that the saved file is byte-stable across load/save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KnownState {
    entries: BTreeMap<String, KnownEntry>,
}

/// Every shape the state file has had.
#[derive(Deserialize)]
#[serde(untagged)]
enum StateFile {
    Current(BTreeMap<String, KnownEntry>),
    LegacyFlags(BTreeMap<String, bool>),
    LegacyKeys(Vec<String>),
}

impl KnownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a state file in the current or a legacy schema.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let entries = match serde_json::from_slice::<StateFile>(bytes)? {
            StateFile::Current(entries) => entries,
            StateFile::LegacyFlags(flags) => flags
                .into_keys()
                .map(|key| (key, KnownEntry::default()))
                .collect(),
            StateFile::LegacyKeys(keys) => keys
                .into_iter()
                .map(|key| (key, KnownEntry::default()))
                .collect(),
        };
        Ok(Self { entries })
    }

    /// Serialize in the current schema.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn get(&self, key: &str) -> Option<&KnownEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record the observed availability for `key`.
    pub fn record(&mut self, key: impl Into<String>, availability: Availability) {
        self.entries.insert(key.into(), KnownEntry::new(availability));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KnownEntry)> {
        self.entries.iter()
    }

    /// Number of entries per recorded availability, plus unrecorded ones.
    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for entry in self.entries.values() {
            match entry.availability {
                Some(Availability::InStock) => counts.in_stock += 1,
                Some(Availability::OutOfStock) => counts.out_of_stock += 1,
                Some(Availability::Unknown) => counts.unknown += 1,
                None => counts.unrecorded += 1,
            }
        }
        counts
    }
}

/// Per-availability tally of a `KnownState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub in_stock: usize,
    pub out_of_stock: usize,
    pub unknown: usize,
    pub unrecorded: usize,
}
