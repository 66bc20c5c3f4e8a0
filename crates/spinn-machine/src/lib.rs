//! SpiNNaker Machine Model
//!
//! Routing entries, routing tables and core selections for SpiNNaker
//! machines, built on the chip geometry in `spinn-geometry`.
//!
//! # Routing
//!
//! Each chip's router holds a table of multicast entries. An entry matches a
//! packet key under a mask and copies the packet to a set of local cores and a
//! set of outgoing links. Entries for the same key and mask merge by taking
//! the union of their destinations.
//!
//! # Core selection
//!
//! [`CoreSubsets`] records which cores are chosen on which chips, one subset
//! per chip, in the order chips were first seen.
//!
//! # Invariants
//!
//! Violations are reported as [`Error`] at construction or merge time and are
//! never corrected silently: they mean the caller computed a bad route.

mod core_subsets;
mod error;
mod routing_entry;
mod routing_table;

pub use core_subsets::{CoreSubset, CoreSubsets};
pub use error::{DestinationKind, Error, Result, RoutingField};
pub use routing_entry::{FixedRouteEntry, MulticastRoutingEntry};
pub use routing_table::{MulticastRoutingTable, MAX_ROUTER_ENTRIES};
pub use spinn_geometry::{get_board_geometry, ChipCoord, TriadGeometry};

/// Cores on a SpiNNaker chip.
pub const MAX_CORES_PER_CHIP: u32 = 18;

/// Links per SpiNNaker chip.
pub const MAX_LINKS_PER_CHIP: u32 = 6;

/// Build a routing entry that delivers to `processors` on the local chip.
///
/// Shorthand for a non-defaultable entry with no outgoing links.
pub fn local_delivery<I>(key: u32, mask: u32, processors: I) -> Result<MulticastRoutingEntry>
where
    I: IntoIterator<Item = u32>,
{
    MulticastRoutingEntry::new(key, mask, processors, std::iter::empty(), false)
}
