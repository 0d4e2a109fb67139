//! Grid coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position on the grid, always within bounds once produced by a world.
///
/// Positions order row-major (`y` first, then `x`), matching the order in
/// which the world enumerates its sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, `0..width`.
    pub x: usize,
    /// Row, `0..height`.
    pub y: usize,
}

impl Position {
    /// Create a position from its column and row.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
