//! Ordered, bounded set of animals currently inside the barn.
//!
//! Insertion order is preserved for display. Adding a name that is already
//! present, removing one that is absent, and adding beyond capacity are all
//! logged no-ops.
//!
//! # Example
//!
//! ```rust
//! use barn_gate::occupancy::{OccupancyChange, OccupancySet};
//!
//! let mut barn: OccupancySet<4> = OccupancySet::new();
//! assert_eq!(barn.add_if_absent("Bron"), OccupancyChange::Added);
//! assert_eq!(barn.add_if_absent("TFrance"), OccupancyChange::Added);
//! assert_eq!(barn.add_if_absent("Bron"), OccupancyChange::AlreadyPresent);
//!
//! assert_eq!(barn.remove_if_present("Bron"), OccupancyChange::Removed);
//! assert_eq!(barn.snapshot().names(), ["TFrance"]);
//! ```

use heapless::Vec;
use tracing::{debug, info, warn};

use crate::config::{name_string, NameString, OCCUPANCY_CAPACITY};

/// Occupancy set sized for the barn.
pub type BarnOccupancy = OccupancySet<OCCUPANCY_CAPACITY>;

/// Result of an occupancy mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OccupancyChange {
    /// Name appended at the end.
    Added,
    /// Name was already inside; nothing changed.
    AlreadyPresent,
    /// Set is at capacity; the name was not added.
    Full,
    /// Name removed; remaining order kept.
    Removed,
    /// Name was not inside; nothing changed.
    NotPresent,
}

impl OccupancyChange {
    /// True if the set was mutated.
    pub const fn is_mutation(&self) -> bool {
        matches!(self, OccupancyChange::Added | OccupancyChange::Removed)
    }
}

/// Ordered sequence of distinct names with capacity `N`.
#[derive(Clone, Debug, Default)]
pub struct OccupancySet<const N: usize> {
    names: Vec<NameString, N>,
}

impl<const N: usize> OccupancySet<N> {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Append `name` unless it is already inside or the set is full.
    pub fn add_if_absent(&mut self, name: &str) -> OccupancyChange {
        if self.contains(name) {
            debug!(name, "already inside, ignoring entry");
            return OccupancyChange::AlreadyPresent;
        }
        match self.names.push(name_string(name)) {
            Ok(()) => {
                info!(name, count = self.names.len(), "entered");
                OccupancyChange::Added
            }
            Err(_) => {
                warn!(name, capacity = N, "occupancy full, entry rejected");
                OccupancyChange::Full
            }
        }
    }

    /// Remove `name` if present, keeping the order of the others.
    pub fn remove_if_present(&mut self, name: &str) -> OccupancyChange {
        match self.position(name) {
            Some(index) => {
                self.names.remove(index);
                info!(name, count = self.names.len(), "left");
                OccupancyChange::Removed
            }
            None => {
                debug!(name, "not inside, ignoring exit");
                OccupancyChange::NotPresent
            }
        }
    }

    /// True if `name` is inside.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of names inside.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nobody is inside.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Maximum number of names.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterate names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_str())
    }

    /// Owned copy of the current contents.
    pub fn snapshot(&self) -> OccupancySnapshot<N> {
        OccupancySnapshot {
            names: self.names.clone(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name_string(name);
        self.names.iter().position(|existing| *existing == name)
    }
}

/// Point-in-time copy of an [`OccupancySet`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancySnapshot<const N: usize> {
    names: Vec<NameString, N>,
}

impl<const N: usize> OccupancySnapshot<N> {
    /// Number of names.
    pub fn count(&self) -> usize {
        self.names.len()
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<&str, N> {
        self.names.iter().map(|name| name.as_str()).collect()
    }

    /// Iterate names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_str())
    }
}
