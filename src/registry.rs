//! Static table mapping RFID tag identifiers to animal names.
//!
//! The herd is small (tens of animals at most) and fixed at build time, so
//! lookups are a linear scan over a `&'static` slice.
//!
//! # Example
//!
//! ```rust
//! use barn_gate::registry::{TagRegistry, UNKNOWN_NAME};
//! use barn_gate::traits::TagId;
//!
//! let registry = TagRegistry::herd();
//! assert_eq!(registry.resolve(&TagId::new([0x93, 0x4B, 0x1C, 0x2E])), "Bron");
//! assert_eq!(registry.resolve(&TagId::new([0, 0, 0, 0])), UNKNOWN_NAME);
//! ```

use crate::traits::TagId;

/// Name reported for identifiers that are not in the registry.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// One registered tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagRecord {
    /// Display name shown in the status API.
    pub name: &'static str,
    /// Tag identifier.
    pub id: TagId,
}

impl TagRecord {
    /// Creates a record.
    pub const fn new(name: &'static str, id: [u8; 4]) -> Self {
        Self {
            name,
            id: TagId::new(id),
        }
    }
}

/// The tags issued to the herd.
pub const HERD: &[TagRecord] = &[
    TagRecord::new("Bron", [0x93, 0x4B, 0x1C, 0x2E]),
    TagRecord::new("TFrance", [0x63, 0xD2, 0x8A, 0x11]),
    TagRecord::new("Clover", [0xA7, 0x05, 0x3F, 0x9B]),
    TagRecord::new("Juniper", [0x2C, 0xE8, 0x74, 0x50]),
    TagRecord::new("Pepper", [0xF1, 0x19, 0x66, 0xC4]),
];

/// Immutable lookup table from identifier to display name.
#[derive(Clone, Copy, Debug)]
pub struct TagRegistry {
    records: &'static [TagRecord],
}

impl TagRegistry {
    /// Creates a registry over the given records.
    pub const fn new(records: &'static [TagRecord]) -> Self {
        Self { records }
    }

    /// Registry over the built-in [`HERD`] table.
    pub const fn herd() -> Self {
        Self::new(HERD)
    }

    /// Find the record for an identifier.
    pub fn lookup(&self, id: &TagId) -> Option<&'static TagRecord> {
        self.records.iter().find(|record| record.id == *id)
    }

    /// Resolve an identifier to a display name.
    ///
    /// Unknown identifiers resolve to [`UNKNOWN_NAME`], never to nothing.
    pub fn resolve(&self, id: &TagId) -> &'static str {
        self.lookup(id).map_or(UNKNOWN_NAME, |record| record.name)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no tags are registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records.
    pub fn records(&self) -> impl Iterator<Item = &'static TagRecord> {
        self.records.iter()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::herd()
    }
}
