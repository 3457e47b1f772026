//! Spatial addressing over a rectangular grid.
//!
//! The topology knows nothing about occupants. It answers "where is the cell
//! in front of me", rotates facings, samples random directions and cells,
//! and measures distance. A grid either wraps at its edges (a torus) or is
//! bounded, in which case stepping off the edge yields no location.

use rand::Rng;
use serde::{Deserialize, Serialize};

use habitat_types::{Direction, Location, LocationDirection};

use crate::error::WorldError;
use crate::rng::SimRng;

/// Shape and size of the simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    width: u32,
    height: u32,
    wrap: bool,
}

impl Topology {
    /// Create a topology.
    ///
    /// Fails for zero-sized grids and grids whose cell count does not fit
    /// in memory addressing.
    pub fn new(width: u32, height: u32, wrap: bool) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let cells = u64::from(width).checked_mul(u64::from(height));
        if cells.and_then(|c| usize::try_from(c).ok()).is_none() {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            wrap,
        })
    }

    /// Grid width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether edges wrap around.
    pub const fn wraps(&self) -> bool {
        self.wrap
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        usize::try_from(u64::from(self.width).saturating_mul(u64::from(self.height)))
            .unwrap_or(usize::MAX)
    }

    /// Whether the location lies on the grid.
    pub const fn contains(&self, location: Location) -> bool {
        location.x < self.width && location.y < self.height
    }

    /// Row-major index of a location, or `None` if off-grid.
    pub fn index_of(&self, location: Location) -> Option<usize> {
        if !self.contains(location) {
            return None;
        }
        let row = u64::from(location.y).checked_mul(u64::from(self.width))?;
        let index = row.checked_add(u64::from(location.x))?;
        usize::try_from(index).ok()
    }

    /// Location for a row-major index, or `None` if off-grid.
    pub fn location_at(&self, index: usize) -> Option<Location> {
        let index = u64::try_from(index).ok()?;
        let width = u64::from(self.width);
        let x = u32::try_from(index.checked_rem(width)?).ok()?;
        let y = u32::try_from(index.checked_div(width)?).ok()?;
        let location = Location::new(x, y);
        self.contains(location).then_some(location)
    }

    /// The cell one step from `location` in `direction`.
    ///
    /// On a bounded grid, stepping off the edge returns `None`.
    pub fn get_adjacent(&self, location: Location, direction: Direction) -> Option<Location> {
        if !self.contains(location) {
            return None;
        }
        let (dx, dy) = direction.delta();
        let x = step_axis(location.x, dx, self.width, self.wrap)?;
        let y = step_axis(location.y, dy, self.height, self.wrap)?;
        Some(Location::new(x, y))
    }

    /// The cell in front of a located, facing agent, keeping its facing.
    pub fn get_adjacent_facing(&self, position: LocationDirection) -> Option<LocationDirection> {
        self.get_adjacent(position.location, position.direction)
            .map(|location| LocationDirection::new(location, position.direction))
    }

    /// Same cell, facing rotated counter-clockwise.
    pub const fn get_turn_left_position(&self, position: LocationDirection) -> LocationDirection {
        LocationDirection::new(position.location, position.direction.turn_left())
    }

    /// Same cell, facing rotated clockwise.
    pub const fn get_turn_right_position(&self, position: LocationDirection) -> LocationDirection {
        LocationDirection::new(position.location, position.direction.turn_right())
    }

    /// Uniform draw from the four facings.
    pub fn get_random_direction(&self, rng: &mut SimRng) -> Direction {
        let choice: usize = rng.random_range(0..Direction::ALL.len());
        Direction::ALL.get(choice).copied().unwrap_or(Direction::North)
    }

    /// Uniform draw over every cell of the grid.
    pub fn get_random_location(&self, rng: &mut SimRng) -> Location {
        let x = rng.random_range(0..self.width);
        let y = rng.random_range(0..self.height);
        Location::new(x, y)
    }

    /// Distance between two cells.
    ///
    /// Euclidean on a bounded grid; on a wrapped grid each axis takes the
    /// shorter way around.
    pub fn get_distance(&self, a: Location, b: Location) -> f64 {
        let dx = axis_distance(a.x, b.x, self.width, self.wrap);
        let dy = axis_distance(a.y, b.y, self.height, self.wrap);
        let dx = f64::from(dx);
        let dy = f64::from(dy);
        dx.hypot(dy)
    }

    /// Neighbouring cells in `Direction::ALL` order, skipping off-grid ones.
    pub fn neighbours(&self, location: Location) -> Vec<Location> {
        Direction::ALL
            .iter()
            .filter_map(|dir| self.get_adjacent(location, *dir))
            .collect()
    }
}

/// Move one coordinate by `delta` along an axis of length `len`.
fn step_axis(coord: u32, delta: i64, len: u32, wrap: bool) -> Option<u32> {
    let moved = i64::from(coord).checked_add(delta)?;
    let len = i64::from(len);
    if wrap {
        u32::try_from(moved.rem_euclid(len)).ok()
    } else if (0..len).contains(&moved) {
        u32::try_from(moved).ok()
    } else {
        None
    }
}

/// Per-axis separation between two coordinates.
fn axis_distance(a: u32, b: u32, len: u32, wrap: bool) -> u32 {
    let direct = a.abs_diff(b);
    if wrap {
        direct.min(len.saturating_sub(direct))
    } else {
        direct
    }
}
