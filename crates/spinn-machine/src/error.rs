//! Error types for spinn-machine.

use thiserror::Error;

/// Result type for spinn-machine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which destination set of a route an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// A core on the routing chip.
    Processor,
    /// An outgoing link of the routing chip.
    Link,
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestinationKind::Processor => f.write_str("processor"),
            DestinationKind::Link => f.write_str("link"),
        }
    }
}

/// The matching field of a routing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingField {
    /// The routing key.
    Key,
    /// The routing mask.
    Mask,
}

impl std::fmt::Display for RoutingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingField::Key => f.write_str("key"),
            RoutingField::Mask => f.write_str("mask"),
        }
    }
}

/// Errors raised while building the machine model.
///
/// All of these point at a bug in the routing or placement code that produced
/// the input; none are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The key has bits set that the mask clears.
    #[error("key {key:#010x} has bits set outside mask {mask:#010x}")]
    InvalidKeyMask { key: u32, mask: u32 },

    /// The same destination was listed twice for one route.
    #[error("{kind} id {id} is listed more than once")]
    DuplicateDestination { kind: DestinationKind, id: u32 },

    /// Two entries to be merged do not match the same packets.
    #[error("cannot merge routing entries: {field} {ours:#010x} does not match {theirs:#010x}")]
    RoutingMismatch {
        field: RoutingField,
        ours: u32,
        theirs: u32,
    },

    /// A routing table has no room for another entry.
    #[error("routing table of chip ({x}, {y}) is full at {capacity} entries")]
    CapacityExceeded { x: u32, y: u32, capacity: usize },
}
