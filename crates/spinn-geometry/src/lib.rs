//! SpiNNaker Machine Geometry
//!
//! Chip coordinates and the board layout of SpiNN-5 based machines.
//!
//! # Layout
//!
//! A SpiNNaker machine is a grid of chips joined by six links each, usually
//! wrapped into a torus. SpiNN-5 boards hold 48 chips in a hexagon inside an
//! 8x8 bounding box; three boards tile a 12x12 triad, and machines are built
//! from whole triads.
//!
//! Mapping tools need to know which board a chip lives on and where on that
//! board it sits. [`TriadGeometry`] answers both with a table computed once
//! per geometry; the standard one is shared through [`get_board_geometry`].

mod coord;
mod triad;

pub use coord::ChipCoord;
pub use triad::{get_board_geometry, GeometryError, TriadGeometry, TriadGeometryConfig};

/// Width of a triad of SpiNN-5 boards, in chips.
pub const TRIAD_WIDTH: u32 = 12;

/// Height of a triad of SpiNN-5 boards, in chips.
pub const TRIAD_HEIGHT: u32 = 12;

/// Bounding-box width of one SpiNN-5 board.
pub const BOARD_WIDTH: u32 = 8;

/// Bounding-box height of one SpiNN-5 board.
pub const BOARD_HEIGHT: u32 = 8;

/// Chips on one SpiNN-5 board.
pub const CHIPS_PER_BOARD: u32 = 48;

/// Boards in a triad.
pub const BOARDS_PER_TRIAD: u32 = 3;

/// Root (Ethernet) chips of the three boards in a SpiNN-5 triad.
pub const SPINN5_ROOTS: [ChipCoord; BOARDS_PER_TRIAD as usize] = [
    ChipCoord::new(0, 0),
    ChipCoord::new(4, 8),
    ChipCoord::new(8, 4),
];

// Three boards exactly tile a triad
const _: () = assert!(BOARDS_PER_TRIAD * CHIPS_PER_BOARD == TRIAD_WIDTH * TRIAD_HEIGHT);
