//! The toroidal grid of sites.
//!
//! The [`World`] stores `width * height` [`Cell`]s in one flat vector,
//! indexed row-major (`x + y * width`). The grid has no edges: every
//! coordinate outside `[0, width) x [0, height)` wraps around, so every
//! site has the same number of neighbors.
//!
//! Neighbor queries return positions rather than references, so the
//! engine can freely mutate a site that is both the focus of one step and
//! the target of another within the same pass.

use std::collections::HashSet;

use colicin_types::{Cell, Position, Strain};
use rand::Rng;
use tracing::debug;

use crate::error::WorldError;

/// Offsets of the four von Neumann neighbors: up, right, down, left.
const VON_NEUMANN_OFFSETS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// A rectangular toroidal grid of sites.
///
/// The number of sites is fixed at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct World {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
    /// Site storage, row-major.
    cells: Vec<Cell>,
}

impl World {
    /// Create a grid of empty sites.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is
    /// zero or the grid is too large to address.
    pub fn new(width: usize, height: usize) -> Result<Self, WorldError> {
        Self::from_cells(width, height, Vec::new())
    }

    /// Create a grid from an initial run of cells, filling the remaining
    /// positions (in row-major order) with empty sites.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for unusable dimensions or
    /// [`WorldError::TooManyCells`] if `cells` is longer than the grid.
    pub fn from_cells(
        width: usize,
        height: usize,
        mut cells: Vec<Cell>,
    ) -> Result<Self, WorldError> {
        let capacity = checked_capacity(width, height)?;
        if cells.len() > capacity {
            return Err(WorldError::TooManyCells {
                supplied: cells.len(),
                capacity,
            });
        }
        let supplied = cells.len();
        cells.resize(capacity, Cell::empty());
        debug!(width, height, supplied, capacity, "World created");
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of sites (`width * height`).
    pub const fn site_count(&self) -> usize {
        self.cells.len()
    }

    /// All sites in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All sites in row-major order, mutably.
    ///
    /// The slice can be rewritten but not resized, so the site count
    /// invariant holds.
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Replace every site at once.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TooManyCells`] if `cells` is longer than the
    /// grid. Shorter inputs are padded with empty sites.
    pub fn replace_cells(&mut self, mut cells: Vec<Cell>) -> Result<(), WorldError> {
        let capacity = self.site_count();
        if cells.len() > capacity {
            return Err(WorldError::TooManyCells {
                supplied: cells.len(),
                capacity,
            });
        }
        cells.resize(capacity, Cell::empty());
        self.cells = cells;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Addressing
    // -------------------------------------------------------------------

    /// Whether `position` lies inside the grid.
    pub const fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Flat index of an in-bounds position.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        position
            .y
            .checked_mul(self.width)
            .and_then(|row| row.checked_add(position.x))
    }

    /// Position of a flat index.
    pub fn position_of(&self, index: usize) -> Option<Position> {
        if index >= self.site_count() {
            return None;
        }
        let x = index.checked_rem(self.width)?;
        let y = index.checked_div(self.width)?;
        Some(Position::new(x, y))
    }

    /// Reduce arbitrary coordinates onto the grid.
    pub fn wrap(&self, x: i64, y: i64) -> Position {
        Position::new(wrap_axis(x, self.width), wrap_axis(y, self.height))
    }

    /// The position `dx` columns and `dy` rows away from `origin`, wrapped.
    pub fn offset(&self, origin: Position, dx: i64, dy: i64) -> Position {
        let x = i64::try_from(origin.x).unwrap_or(0).saturating_add(dx);
        let y = i64::try_from(origin.y).unwrap_or(0).saturating_add(dy);
        self.wrap(x, y)
    }

    /// Every position exactly once, row by row starting at `(0, 0)`.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    // -------------------------------------------------------------------
    // Site access
    // -------------------------------------------------------------------

    /// The site at `position`, if in bounds.
    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.index_of(position).and_then(|i| self.cells.get(i))
    }

    /// The site at `position` mutably, if in bounds.
    pub fn cell_mut(&mut self, position: Position) -> Option<&mut Cell> {
        self.index_of(position).and_then(|i| self.cells.get_mut(i))
    }

    /// The site at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the grid.
    pub fn try_cell(&self, position: Position) -> Result<&Cell, WorldError> {
        self.cell(position).ok_or(WorldError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        })
    }

    /// The site at `position` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the grid.
    pub fn try_cell_mut(&mut self, position: Position) -> Result<&mut Cell, WorldError> {
        let (width, height) = (self.width, self.height);
        self.cell_mut(position).ok_or(WorldError::OutOfBounds {
            position,
            width,
            height,
        })
    }

    /// The occupant at `position`, if in bounds.
    pub fn strain_at(&self, position: Position) -> Option<Strain> {
        self.cell(position).map(|cell| cell.strain)
    }

    /// Overwrite the occupant at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the grid.
    pub fn set_strain(&mut self, position: Position, strain: Strain) -> Result<(), WorldError> {
        self.try_cell_mut(position)?.strain = strain;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Neighbor queries
    // -------------------------------------------------------------------

    /// The four adjacent positions in the order up, right, down, left.
    ///
    /// On grids narrower than 3 in either direction some of these coincide
    /// (and on a 1x1 grid all four are the focal position itself).
    pub fn four_neighbors(&self, position: Position) -> [Position; 4] {
        VON_NEUMANN_OFFSETS.map(|(dx, dy)| self.offset(position, dx, dy))
    }

    /// Every position in the `(2r + 1) x (2r + 1)` block centered on
    /// `position`, except `position` itself.
    ///
    /// Radius 0 yields nothing, radius 1 yields 8 positions and radius 2
    /// yields 24. Positions are produced column by column (`dx` outer, `dy`
    /// inner). When the grid is smaller than `2r + 1` along an axis the
    /// block wraps onto itself and positions repeat, possibly including the
    /// focal position; the repeats are kept.
    pub fn radius_neighbors(&self, position: Position, radius: u32) -> Vec<Position> {
        let r = i64::from(radius);
        let low = 0_i64.saturating_sub(r);
        let mut result = Vec::new();
        for dx in low..=r {
            for dy in low..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                result.push(self.offset(position, dx, dy));
            }
        }
        result
    }

    /// Draw `count` distinct positions uniformly from the whole grid,
    /// excluding `position`.
    ///
    /// Sampling is by rejection on `(x, y)` pairs; the result is in draw
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `position` is outside the
    /// grid, or [`WorldError::InsufficientPositions`] if the grid does not
    /// have more than `count` sites.
    pub fn random_distinct_neighbors(
        &self,
        position: Position,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Position>, WorldError> {
        if !self.contains(position) {
            return Err(WorldError::OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            });
        }
        let available = self.site_count().saturating_sub(1);
        if count > available {
            return Err(WorldError::InsufficientPositions {
                requested: count,
                available,
            });
        }

        let mut seen = HashSet::with_capacity(count);
        let mut result = Vec::with_capacity(count);
        while result.len() < count {
            let candidate = Position::new(
                rng.random_range(0..self.width),
                rng.random_range(0..self.height),
            );
            if candidate == position || !seen.insert(candidate) {
                continue;
            }
            result.push(candidate);
        }
        Ok(result)
    }
}

/// `width * height`, rejecting zero and unaddressable sizes.
fn checked_capacity(width: usize, height: usize) -> Result<usize, WorldError> {
    let invalid = WorldError::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid);
    }
    if i64::try_from(width).is_err() || i64::try_from(height).is_err() {
        return Err(invalid);
    }
    width.checked_mul(height).ok_or(invalid)
}

/// Euclidean remainder of `value` by a non-zero axis length.
fn wrap_axis(value: i64, len: usize) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let wrapped = value.checked_rem_euclid(len).unwrap_or(0);
    usize::try_from(wrapped).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn world(width: usize, height: usize) -> World {
        World::new(width, height).unwrap()
    }

    #[test]
    fn new_fills_with_empty_sites() {
        let w = world(4, 3);
        assert_eq!(w.site_count(), 12);
        assert!(w.cells().iter().all(|c| *c == Cell::empty()));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            World::new(0, 5),
            Err(WorldError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
        assert!(World::new(5, 0).is_err());
    }

    #[test]
    fn from_cells_pads_remaining_positions() {
        let cells = vec![Cell::with_strain(Strain::Sensitive); 3];
        let w = World::from_cells(2, 3, cells).unwrap();
        assert_eq!(w.site_count(), 6);
        assert_eq!(w.strain_at(Position::new(0, 0)), Some(Strain::Sensitive));
        assert_eq!(w.strain_at(Position::new(0, 1)), Some(Strain::Sensitive));
        assert_eq!(w.strain_at(Position::new(1, 1)), Some(Strain::Empty));
    }

    #[test]
    fn from_cells_rejects_overflow() {
        let cells = vec![Cell::empty(); 5];
        assert_eq!(
            World::from_cells(2, 2, cells),
            Err(WorldError::TooManyCells {
                supplied: 5,
                capacity: 4
            })
        );
    }

    #[test]
    fn index_is_row_major() {
        let w = world(5, 4);
        assert_eq!(w.index_of(Position::new(0, 0)), Some(0));
        assert_eq!(w.index_of(Position::new(4, 0)), Some(4));
        assert_eq!(w.index_of(Position::new(0, 1)), Some(5));
        assert_eq!(w.index_of(Position::new(3, 2)), Some(13));
        assert_eq!(w.index_of(Position::new(5, 0)), None);
        assert_eq!(w.position_of(13), Some(Position::new(3, 2)));
        assert_eq!(w.position_of(20), None);
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let mut w = world(3, 3);
        assert!(w.cell(Position::new(3, 0)).is_none());
        assert_eq!(
            w.set_strain(Position::new(0, 7), Strain::Sensitive),
            Err(WorldError::OutOfBounds {
                position: Position::new(0, 7),
                width: 3,
                height: 3
            })
        );
    }

    #[test]
    fn wrap_lands_inside_grid() {
        for width in 1..=6_usize {
            for height in 1..=6_usize {
                let w = world(width, height);
                for x in -20_i64..=20 {
                    for y in -20_i64..=20 {
                        let p = w.wrap(x, y);
                        assert!(w.contains(p), "{x},{y} wrapped to {p} on {width}x{height}");
                    }
                }
            }
        }
    }

    #[test]
    fn wrap_handles_negative_and_large_values() {
        let w = world(10, 7);
        assert_eq!(w.wrap(-1, -1), Position::new(9, 6));
        assert_eq!(w.wrap(10, 7), Position::new(0, 0));
        assert_eq!(w.wrap(23, -15), Position::new(3, 6));
        assert_eq!(w.wrap(i64::MIN, i64::MAX), w.wrap(i64::MIN, i64::MAX));
    }

    #[test]
    fn positions_enumerate_row_major_from_origin() {
        let w = world(3, 2);
        let all: Vec<Position> = w.positions().collect();
        assert_eq!(
            all,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(2, 1),
            ]
        );
        for (i, p) in all.iter().enumerate() {
            assert_eq!(w.index_of(*p), Some(i));
        }
    }

    #[test]
    fn four_neighbors_are_up_right_down_left() {
        let w = world(5, 5);
        assert_eq!(
            w.four_neighbors(Position::new(2, 2)),
            [
                Position::new(2, 1),
                Position::new(3, 2),
                Position::new(2, 3),
                Position::new(1, 2),
            ]
        );
        assert_eq!(
            w.four_neighbors(Position::new(0, 0)),
            [
                Position::new(0, 4),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(4, 0),
            ]
        );
    }

    #[test]
    fn four_neighbors_are_adjacent_everywhere() {
        let w = world(4, 6);
        for p in w.positions() {
            let n = w.four_neighbors(p);
            assert_eq!(n.len(), 4);
            assert_eq!(n[0], w.offset(p, 0, -1));
            assert_eq!(n[1], w.offset(p, 1, 0));
            assert_eq!(n[2], w.offset(p, 0, 1));
            assert_eq!(n[3], w.offset(p, -1, 0));
            assert!(!n.contains(&p));
        }
    }

    #[test]
    fn four_neighbors_on_single_site_grid_are_self() {
        let w = world(1, 1);
        let origin = Position::new(0, 0);
        assert_eq!(w.four_neighbors(origin), [origin; 4]);
    }

    #[test]
    fn radius_neighbor_counts() {
        let w = world(10, 10);
        let p = Position::new(0, 9);
        assert!(w.radius_neighbors(p, 0).is_empty());

        let r1 = w.radius_neighbors(p, 1);
        assert_eq!(r1.len(), 8);
        assert!(!r1.contains(&p));
        let unique: HashSet<Position> = r1.iter().copied().collect();
        assert_eq!(unique.len(), 8);

        let r2 = w.radius_neighbors(p, 2);
        assert_eq!(r2.len(), 24);
        assert!(!r2.contains(&p));
        let unique: HashSet<Position> = r2.iter().copied().collect();
        assert_eq!(unique.len(), 24);
    }

    #[test]
    fn radius_neighbors_on_minimal_grid() {
        let w = world(3, 3);
        for p in w.positions() {
            let r1 = w.radius_neighbors(p, 1);
            assert_eq!(r1.len(), 8);
            assert!(!r1.contains(&p));
        }
    }

    #[test]
    fn radius_neighbors_repeat_on_small_grids() {
        let w = world(2, 2);
        let p = Position::new(0, 0);
        let r2 = w.radius_neighbors(p, 2);
        assert_eq!(r2.len(), 24);
        // The 5x5 block folds onto 4 sites, including the focal one.
        assert!(r2.contains(&p));
        let unique: HashSet<Position> = r2.iter().copied().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn random_neighbors_are_distinct_and_exclude_focal() {
        let w = world(4, 4);
        let mut rng = SmallRng::seed_from_u64(7);
        for p in w.positions() {
            let sample = w.random_distinct_neighbors(p, 4, &mut rng).unwrap();
            assert_eq!(sample.len(), 4);
            assert!(!sample.contains(&p));
            assert!(sample.iter().all(|q| w.contains(*q)));
            let unique: HashSet<Position> = sample.iter().copied().collect();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn random_neighbors_can_take_every_other_site() {
        let w = world(3, 2);
        let mut rng = SmallRng::seed_from_u64(11);
        let p = Position::new(1, 1);
        let mut sample = w.random_distinct_neighbors(p, 5, &mut rng).unwrap();
        sample.sort();
        let expected: Vec<Position> = w.positions().filter(|q| *q != p).collect();
        assert_eq!(sample, expected);
    }

    #[test]
    fn random_neighbors_guard_against_exhaustion() {
        let w = world(2, 2);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            w.random_distinct_neighbors(Position::new(0, 0), 4, &mut rng),
            Err(WorldError::InsufficientPositions {
                requested: 4,
                available: 3
            })
        );
        let single = world(1, 1);
        assert!(
            single
                .random_distinct_neighbors(Position::new(0, 0), 1, &mut rng)
                .is_err()
        );
        assert_eq!(
            single
                .random_distinct_neighbors(Position::new(0, 0), 0, &mut rng)
                .unwrap(),
            Vec::new()
        );
    }

    #[test]
    fn random_neighbors_are_reproducible() {
        let w = world(10, 10);
        let p = Position::new(5, 5);
        let a = w
            .random_distinct_neighbors(p, 4, &mut SmallRng::seed_from_u64(3))
            .unwrap();
        let b = w
            .random_distinct_neighbors(p, 4, &mut SmallRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn replace_cells_keeps_site_count() {
        let mut w = world(3, 3);
        w.replace_cells(vec![Cell::with_strain(Strain::ColicinImmune); 2])
            .unwrap();
        assert_eq!(w.site_count(), 9);
        assert!(w.replace_cells(vec![Cell::empty(); 10]).is_err());
        assert_eq!(w.site_count(), 9);
    }
}
