//! Chip coordinate system.
//!
//! SpiNNaker chips sit on a 2D grid. Each chip has six links: east, north-east,
//! north, west, south-west and south. The north-east/south-west diagonal makes
//! the grid hexagonal, so the natural metric is not Manhattan distance but
//! `max(|dx|, |dy|, |dx - dy|)`.
//!
//! Machines usually wrap around in one or both dimensions, which turns the
//! grid into a torus. Distances on a torus take the shorter of the direct and
//! wrapped paths on each axis.

use std::ops::Add;

/// A chip position in a SpiNNaker machine.
///
/// Coordinates are non-negative; signed displacements are carried as
/// `(i64, i64)` pairs by the functions that need them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipCoord {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl ChipCoord {
    /// The boot chip of a machine.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The six link directions as `(dx, dy)`, in SpiNNaker link-id order.
    pub const LINK_DIRECTIONS: [(i64, i64); 6] = [
        (1, 0),   // East
        (1, 1),   // North-east
        (0, 1),   // North
        (-1, 0),  // West
        (-1, -1), // South-west
        (0, -1),  // South
    ];

    /// Reduce this coordinate onto a `width` x `height` torus.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub const fn wrapped(&self, width: u32, height: u32) -> Self {
        Self {
            x: self.x % width,
            y: self.y % height,
        }
    }

    /// Hexagonal distance between two coordinates on an unwrapped grid.
    pub fn hex_distance(&self, other: &Self) -> u64 {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dy = i64::from(other.y) - i64::from(self.y);
        hex_metric(dx, dy)
    }

    /// Displacement from `self` to `other` on a `width` x `height` torus.
    ///
    /// Each axis is reduced independently into `(-period/2, period/2]`, so the
    /// result is the shortest path along that axis.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn toroidal_displacement(&self, other: &Self, width: u32, height: u32) -> (i64, i64) {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dy = i64::from(other.y) - i64::from(self.y);
        (symmetric_mod(dx, width), symmetric_mod(dy, height))
    }

    /// Hexagonal distance on a `width` x `height` torus.
    ///
    /// Every wrapped image of `other` is a candidate, because the diagonal
    /// term can make a longer per-axis path the shorter hexagonal one.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn toroidal_distance(&self, other: &Self, width: u32, height: u32) -> u64 {
        let (dx, dy) = self.toroidal_displacement(other, width, height);
        let (w, h) = (i64::from(width), i64::from(height));
        let mut best = u64::MAX;
        for sx in [-w, 0, w] {
            for sy in [-h, 0, h] {
                best = best.min(hex_metric(dx + sx, dy + sy));
            }
        }
        best
    }

    /// Coordinates of the six neighbours on a `width` x `height` torus.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn link_neighbours(&self, width: u32, height: u32) -> [Self; 6] {
        Self::LINK_DIRECTIONS.map(|(dx, dy)| Self {
            x: (i64::from(self.x) + dx).rem_euclid(i64::from(width)) as u32,
            y: (i64::from(self.y) + dy).rem_euclid(i64::from(height)) as u32,
        })
    }
}

/// `max(|dx|, |dy|, |dx - dy|)`
pub(crate) fn hex_metric(dx: i64, dy: i64) -> u64 {
    dx.unsigned_abs()
        .max(dy.unsigned_abs())
        .max((dx - dy).unsigned_abs())
}

fn symmetric_mod(delta: i64, period: u32) -> i64 {
    let period = i64::from(period);
    let reduced = delta.rem_euclid(period);
    if reduced * 2 > period {
        reduced - period
    } else {
        reduced
    }
}

impl Add for ChipCoord {
    type Output = Self;

    /// Component-wise sum.
    ///
    /// # Panics
    ///
    /// Panics on overflow in debug builds.
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl From<(u32, u32)> for ChipCoord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<ChipCoord> for (u32, u32) {
    fn from(coord: ChipCoord) -> Self {
        (coord.x, coord.y)
    }
}

impl std::fmt::Display for ChipCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
