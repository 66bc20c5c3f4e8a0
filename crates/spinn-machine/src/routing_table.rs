//! Per-chip multicast routing tables.
//!
//! Rows are keyed by `(key, mask)`. Adding a row for a key and mask already in
//! the table merges the destinations into the existing row, so independent
//! route computations can each contribute their own destinations.

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::routing_entry::MulticastRoutingEntry;

/// Multicast entries a SpiNNaker router can hold.
pub const MAX_ROUTER_ENTRIES: usize = 1024;

/// The multicast routing table of one chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastRoutingTable {
    x: u32,
    y: u32,
    capacity: usize,
    entries: IndexMap<(u32, u32), MulticastRoutingEntry>,
}

impl MulticastRoutingTable {
    /// An empty table sized for a SpiNNaker router.
    pub fn new(x: u32, y: u32) -> Self {
        Self::with_capacity_limit(x, y, MAX_ROUTER_ENTRIES)
    }

    /// An empty table holding at most `capacity` entries.
    pub fn with_capacity_limit(x: u32, y: u32, capacity: usize) -> Self {
        Self {
            x,
            y,
            capacity,
            entries: IndexMap::new(),
        }
    }

    /// Chip x-coordinate.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Chip y-coordinate.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add an entry, merging it into any entry with the same key and mask.
    ///
    /// Merging never needs a new row, so only entries for a new key and mask
    /// can fail on a full table.
    pub fn add_entry(&mut self, entry: MulticastRoutingEntry) -> Result<()> {
        let slot = (entry.key(), entry.mask());
        if let Some(existing) = self.entries.get_mut(&slot) {
            *existing = existing.merge(&entry)?;
            trace!(
                x = self.x,
                y = self.y,
                key = slot.0,
                mask = slot.1,
                "merged into existing routing entry"
            );
            return Ok(());
        }

        if self.entries.len() >= self.capacity {
            warn!(
                x = self.x,
                y = self.y,
                capacity = self.capacity,
                key = slot.0,
                "routing table full"
            );
            return Err(Error::CapacityExceeded {
                x: self.x,
                y: self.y,
                capacity: self.capacity,
            });
        }

        self.entries.insert(slot, entry);
        Ok(())
    }

    /// The entry for exactly this key and mask.
    pub fn get_entry(&self, key: u32, mask: u32) -> Option<&MulticastRoutingEntry> {
        self.entries.get(&(key, mask))
    }

    /// First entry, in table order, that matches a packet key.
    pub fn route(&self, packet_key: u32) -> Option<&MulticastRoutingEntry> {
        self.entries.values().find(|e| e.matches(packet_key))
    }

    /// Entries in the order their key and mask were first added.
    pub fn entries(&self) -> impl Iterator<Item = &MulticastRoutingEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries the router could drop in favour of default routing.
    pub fn n_defaultable_entries(&self) -> usize {
        self.entries.values().filter(|e| e.defaultable()).count()
    }
}

impl<'a> IntoIterator for &'a MulticastRoutingTable {
    type Item = &'a MulticastRoutingEntry;
    type IntoIter = indexmap::map::Values<'a, (u32, u32), MulticastRoutingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
