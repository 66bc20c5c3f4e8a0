//! Triad geometry of SpiNN-5 boards.
//!
//! A SpiNN-5 board is a hexagon of 48 chips. Three boards tile a 12x12 torus,
//! which is called a triad; larger machines repeat the triad. Each board has a
//! root chip in its bottom-left corner, the one carrying the Ethernet
//! connection.
//!
//! # Lookup table
//!
//! For every chip of the triad we precompute its offset from the root of the
//! board it belongs to. A chip belongs to the board whose centre is nearest
//! under the hexagonal metric `max(|dx|, |dy|, |dx - dy|)`, measured against
//! copies of every root in the eight surrounding triads so wrap-around is
//! handled without special cases.
//!
//! The centres sit slightly off the chip lattice, `(3.6, 3.4)` from each root,
//! which decides which board owns the chips on shared edges. Distances are
//! computed in tenths of a chip so the comparison stays exact.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use crate::coord::hex_metric;
use crate::{ChipCoord, BOARD_HEIGHT, BOARD_WIDTH, SPINN5_ROOTS, TRIAD_HEIGHT, TRIAD_WIDTH};

/// Scale applied to chip coordinates when comparing against board centres.
const TENTHS: i64 = 10;

/// Errors from building a custom geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The triad has no chips.
    #[error("triad dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// No board roots were given.
    #[error("triad geometry needs at least one root chip")]
    NoRoots,

    /// A root lies outside the triad.
    #[error("root {root} lies outside the {width}x{height} triad")]
    RootOutsideTriad {
        root: ChipCoord,
        width: u32,
        height: u32,
    },
}

/// Parameters of a triad geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriadGeometryConfig {
    /// Triad width in chips.
    pub width: u32,
    /// Triad height in chips.
    pub height: u32,
    /// Root chip of each board in the triad.
    pub roots: Vec<ChipCoord>,
    /// Offset from a root to its board centre, in tenths of a chip.
    pub centre_tenths: (u32, u32),
}

impl Default for TriadGeometryConfig {
    /// The SpiNN-5 arrangement.
    fn default() -> Self {
        Self {
            width: TRIAD_WIDTH,
            height: TRIAD_HEIGHT,
            roots: SPINN5_ROOTS.to_vec(),
            centre_tenths: (36, 34),
        }
    }
}

impl TriadGeometryConfig {
    fn validate(&self) -> Result<(), GeometryError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeometryError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.roots.is_empty() {
            return Err(GeometryError::NoRoots);
        }
        if let Some(&root) = self
            .roots
            .iter()
            .find(|r| r.x >= self.width || r.y >= self.height)
        {
            return Err(GeometryError::RootOutsideTriad {
                root,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Precomputed mapping from triad position to in-board offset.
///
/// Immutable once built; share it freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriadGeometry {
    config: TriadGeometryConfig,
    /// Offsets indexed by `y * width + x`.
    offsets: Vec<ChipCoord>,
}

/// The shared SpiNN-5 geometry, computed on first use.
pub fn get_board_geometry() -> &'static TriadGeometry {
    static SPINN5: OnceLock<TriadGeometry> = OnceLock::new();
    SPINN5.get_or_init(|| {
        debug!("initialising shared SpiNN-5 triad geometry");
        TriadGeometry::build(TriadGeometryConfig::default())
    })
}

impl TriadGeometry {
    /// Build a geometry from custom parameters.
    pub fn new(config: TriadGeometryConfig) -> Result<Self, GeometryError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// The shared SpiNN-5 geometry. Same as [`get_board_geometry`].
    pub fn spinn5() -> &'static Self {
        get_board_geometry()
    }

    fn build(config: TriadGeometryConfig) -> Self {
        let (w, h) = (i64::from(config.width), i64::from(config.height));

        // Copy every root into the eight surrounding triads
        let lattice: Vec<(i64, i64)> = config
            .roots
            .iter()
            .flat_map(|root| {
                [-w, 0, w].into_iter().flat_map(move |sx| {
                    [-h, 0, h]
                        .into_iter()
                        .map(move |sy| (i64::from(root.x) + sx, i64::from(root.y) + sy))
                })
            })
            .collect();

        let centre = (
            i64::from(config.centre_tenths.0),
            i64::from(config.centre_tenths.1),
        );

        let mut offsets = Vec::with_capacity((config.width * config.height) as usize);
        for y in 0..h {
            for x in 0..w {
                let (rx, ry) = nearest_root(x, y, &lattice, centre);
                // Down and left of the chip for any sane centre; wrap otherwise
                offsets.push(ChipCoord::new(
                    (x - rx).rem_euclid(w) as u32,
                    (y - ry).rem_euclid(h) as u32,
                ));
            }
        }

        debug!(
            width = config.width,
            height = config.height,
            roots = config.roots.len(),
            "computed triad geometry table"
        );

        Self { config, offsets }
    }

    /// Triad width in chips.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Triad height in chips.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Root chips of the boards in one triad.
    pub fn roots(&self) -> &[ChipCoord] {
        &self.config.roots
    }

    /// The parameters this geometry was built from.
    pub fn config(&self) -> &TriadGeometryConfig {
        &self.config
    }

    /// Position of a chip on its board, relative to the board's root chip.
    ///
    /// Coordinates beyond the triad wrap around, so `(x + width, y)` gives
    /// the same answer as `(x, y)`.
    pub fn get_local_chip_coordinate(&self, x: u32, y: u32) -> ChipCoord {
        self.local_chip_coordinate_from(x, y, 0, 0)
    }

    /// As [`get_local_chip_coordinate`](Self::get_local_chip_coordinate),
    /// for a machine whose boot chip is at `(root_x, root_y)`.
    pub fn local_chip_coordinate_from(&self, x: u32, y: u32, root_x: u32, root_y: u32) -> ChipCoord {
        let dx = (i64::from(x) - i64::from(root_x)).rem_euclid(i64::from(self.config.width));
        let dy = (i64::from(y) - i64::from(root_y)).rem_euclid(i64::from(self.config.height));
        self.offsets[(dy * i64::from(self.config.width) + dx) as usize]
    }

    /// Root chip of the board holding `(x, y)` in a `width` x `height` machine.
    ///
    /// This is where the board's root would be; the chip itself may be dead.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn get_ethernet_chip_coordinates(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        root_x: u32,
        root_y: u32,
    ) -> ChipCoord {
        let local = self.local_chip_coordinate_from(x, y, root_x, root_y);
        ChipCoord::new(
            (i64::from(x) - i64::from(local.x)).rem_euclid(i64::from(width)) as u32,
            (i64::from(y) - i64::from(local.y)).rem_euclid(i64::from(height)) as u32,
        )
    }

    /// Every chip that should be a board root in a `width` x `height` machine.
    ///
    /// A dimension that is not a whole number of triads only has room for
    /// boards starting within `dimension - board_size + 1` of the origin.
    pub fn get_potential_ethernet_chips(&self, width: u32, height: u32) -> Vec<ChipCoord> {
        let usable = |extent: u32, period: u32, board: u32| -> i64 {
            if extent % period == 0 {
                i64::from(extent)
            } else {
                i64::from(extent) - i64::from(board) + 1
            }
        };
        let eth_width = usable(width, self.config.width, BOARD_WIDTH);
        let eth_height = usable(height, self.config.height, BOARD_HEIGHT);

        // Anything smaller than a board is a single-root machine
        if eth_width <= 0 || eth_height <= 0 {
            return vec![ChipCoord::ORIGIN];
        }

        let mut chips = Vec::new();
        for root in &self.config.roots {
            for y in (i64::from(root.y)..eth_height).step_by(self.config.height as usize) {
                for x in (i64::from(root.x)..eth_width).step_by(self.config.width as usize) {
                    chips.push(ChipCoord::new(x as u32, y as u32));
                }
            }
        }
        chips
    }

    /// Hexagonal distance between two chips with triad wrap-around.
    pub fn chip_distance(&self, a: ChipCoord, b: ChipCoord) -> u64 {
        a.wrapped(self.config.width, self.config.height).toroidal_distance(
            &b.wrapped(self.config.width, self.config.height),
            self.config.width,
            self.config.height,
        )
    }

    /// Whether two chips sit on the same board of the triad.
    pub fn same_board(&self, a: ChipCoord, b: ChipCoord) -> bool {
        let (w, h) = (self.config.width, self.config.height);
        self.get_ethernet_chip_coordinates(a.x, a.y, w, h, 0, 0)
            == self.get_ethernet_chip_coordinates(b.x, b.y, w, h, 0, 0)
    }
}

/// Root whose board centre is nearest `(x, y)`.
///
/// Ties go to the lexicographically smaller root.
fn nearest_root(x: i64, y: i64, lattice: &[(i64, i64)], centre: (i64, i64)) -> (i64, i64) {
    let mut best = lattice[0];
    let mut best_distance = u64::MAX;
    for &(rx, ry) in lattice {
        let distance = hex_metric(
            x * TENTHS - (rx * TENTHS + centre.0),
            y * TENTHS - (ry * TENTHS + centre.1),
        );
        if distance < best_distance || (distance == best_distance && (rx, ry) < best) {
            best = (rx, ry);
            best_distance = distance;
        }
    }
    best
}
