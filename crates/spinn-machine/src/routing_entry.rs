//! Routing table entries.
//!
//! A multicast entry matches packets whose key, masked with the entry's mask,
//! equals the entry's key, and copies them to a set of local cores and a set
//! of outgoing links. A fixed-route entry has no key: every packet sent on the
//! fixed route goes to the same destinations.
//!
//! Destinations are sets. Listing a destination twice when building an entry
//! is rejected, while merging two entries that share destinations is a plain
//! union.

use std::collections::BTreeSet;
use std::ops::{Add, BitOr};

use tracing::trace;

use crate::error::{DestinationKind, Error, Result, RoutingField};

/// Collect ids into a set, failing on the first repeat.
pub(crate) fn collect_unique<I>(ids: I, kind: DestinationKind) -> Result<BTreeSet<u32>>
where
    I: IntoIterator<Item = u32>,
{
    let mut set = BTreeSet::new();
    for id in ids {
        if !set.insert(id) {
            return Err(Error::DuplicateDestination { kind, id });
        }
    }
    Ok(set)
}

fn write_ids(f: &mut std::fmt::Formatter<'_>, ids: &BTreeSet<u32>) -> std::fmt::Result {
    f.write_str("{")?;
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", id)?;
    }
    f.write_str("}")
}

/// One row of a chip's multicast routing table.
///
/// Immutable: merging produces a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRoutingEntry"))]
pub struct MulticastRoutingEntry {
    key: u32,
    mask: u32,
    processor_ids: BTreeSet<u32>,
    link_ids: BTreeSet<u32>,
    defaultable: bool,
}

impl MulticastRoutingEntry {
    /// Create an entry.
    ///
    /// Fails if `key` has bits outside `mask`, or if either id list repeats
    /// an id.
    pub fn new<P, L>(
        key: u32,
        mask: u32,
        processor_ids: P,
        link_ids: L,
        defaultable: bool,
    ) -> Result<Self>
    where
        P: IntoIterator<Item = u32>,
        L: IntoIterator<Item = u32>,
    {
        if key & mask != key {
            return Err(Error::InvalidKeyMask { key, mask });
        }
        Ok(Self {
            key,
            mask,
            processor_ids: collect_unique(processor_ids, DestinationKind::Processor)?,
            link_ids: collect_unique(link_ids, DestinationKind::Link)?,
            defaultable,
        })
    }

    /// The routing key.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// The routing mask.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Destination cores.
    pub fn processor_ids(&self) -> &BTreeSet<u32> {
        &self.processor_ids
    }

    /// Destination links.
    pub fn link_ids(&self) -> &BTreeSet<u32> {
        &self.link_ids
    }

    /// Whether the router could handle this entry by default routing, i.e.
    /// the packet leaves on the link opposite the one it arrived on.
    pub fn defaultable(&self) -> bool {
        self.defaultable
    }

    /// Whether a packet key is matched by this entry.
    pub fn matches(&self, packet_key: u32) -> bool {
        packet_key & self.mask == self.key
    }

    /// Merge the destinations of two entries for the same key and mask.
    ///
    /// The result is defaultable only if both inputs are.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if other.key != self.key {
            return Err(Error::RoutingMismatch {
                field: RoutingField::Key,
                ours: self.key,
                theirs: other.key,
            });
        }
        if other.mask != self.mask {
            return Err(Error::RoutingMismatch {
                field: RoutingField::Mask,
                ours: self.mask,
                theirs: other.mask,
            });
        }

        let merged = Self {
            key: self.key,
            mask: self.mask,
            processor_ids: self.processor_ids.union(&other.processor_ids).copied().collect(),
            link_ids: self.link_ids.union(&other.link_ids).copied().collect(),
            defaultable: self.defaultable && other.defaultable,
        };
        trace!(
            key = self.key,
            mask = self.mask,
            processors = merged.processor_ids.len(),
            links = merged.link_ids.len(),
            "merged routing entries"
        );
        Ok(merged)
    }
}

impl BitOr for &MulticastRoutingEntry {
    type Output = Result<MulticastRoutingEntry>;

    fn bitor(self, other: Self) -> Self::Output {
        self.merge(other)
    }
}

impl Add for &MulticastRoutingEntry {
    type Output = Result<MulticastRoutingEntry>;

    fn add(self, other: Self) -> Self::Output {
        self.merge(other)
    }
}

impl std::fmt::Display for MulticastRoutingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}:{:#010x}:{}:", self.key, self.mask, self.defaultable)?;
        write_ids(f, &self.processor_ids)?;
        f.write_str(":")?;
        write_ids(f, &self.link_ids)
    }
}

/// Wire form of a routing entry, validated on the way in.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawRoutingEntry {
    key: u32,
    mask: u32,
    processor_ids: Vec<u32>,
    link_ids: Vec<u32>,
    defaultable: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRoutingEntry> for MulticastRoutingEntry {
    type Error = Error;

    fn try_from(raw: RawRoutingEntry) -> Result<Self> {
        Self::new(raw.key, raw.mask, raw.processor_ids, raw.link_ids, raw.defaultable)
    }
}

/// Destinations of a chip's fixed route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFixedRouteEntry"))]
pub struct FixedRouteEntry {
    processor_ids: BTreeSet<u32>,
    link_ids: BTreeSet<u32>,
}

impl FixedRouteEntry {
    /// Create a fixed route. Fails if either id list repeats an id.
    pub fn new<P, L>(processor_ids: P, link_ids: L) -> Result<Self>
    where
        P: IntoIterator<Item = u32>,
        L: IntoIterator<Item = u32>,
    {
        Ok(Self {
            processor_ids: collect_unique(processor_ids, DestinationKind::Processor)?,
            link_ids: collect_unique(link_ids, DestinationKind::Link)?,
        })
    }

    /// Destination cores.
    pub fn processor_ids(&self) -> &BTreeSet<u32> {
        &self.processor_ids
    }

    /// Destination links.
    pub fn link_ids(&self) -> &BTreeSet<u32> {
        &self.link_ids
    }
}

impl std::fmt::Display for FixedRouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_ids(f, &self.processor_ids)?;
        f.write_str(":")?;
        write_ids(f, &self.link_ids)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFixedRouteEntry {
    processor_ids: Vec<u32>,
    link_ids: Vec<u32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFixedRouteEntry> for FixedRouteEntry {
    type Error = Error;

    fn try_from(raw: RawFixedRouteEntry) -> Result<Self> {
        Self::new(raw.processor_ids, raw.link_ids)
    }
}
