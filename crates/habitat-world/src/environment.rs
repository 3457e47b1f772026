//! The environment grid.
//!
//! Each cell holds at most one of: an agent, a food marker, a stone, or a
//! drop. The [`Cell`] enum makes that exclusion structural, and every
//! mutation primitive refuses to overwrite an occupied cell. Callers (the
//! agent state machine, mutators) check before they mutate; a refused
//! mutation is a bug in the caller and is surfaced as a [`WorldError`].
//!
//! The environment also owns the broadcast conduit and advances food and
//! drop state once per tick in [`Environment::update`].

use tracing::debug;

use habitat_types::{AgentId, Direction, Location};

use crate::broadcast::BroadcastConduit;
use crate::drop::Drop;
use crate::error::WorldError;
use crate::food::FoodParams;
use crate::rng::{SimRng, pick_index, roll};
use crate::topology::Topology;

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Nothing here.
    #[default]
    Empty,
    /// An agent stands here.
    Agent(AgentId),
    /// Food of the given type.
    Food(usize),
    /// An impassable obstacle.
    Stone,
    /// A drop (waste or product).
    Drop(Drop),
}

impl Cell {
    /// Short name of the occupant, used in error messages.
    pub const fn occupant_name(&self) -> &'static str {
        match self {
            Self::Empty => "nothing",
            Self::Agent(_) => "agent",
            Self::Food(_) => "food",
            Self::Stone => "stone",
            Self::Drop(Drop::Waste { .. }) => "waste",
            Self::Drop(Drop::Product { .. }) => "product",
        }
    }
}

/// What happened during an environment update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentUpdate {
    /// Broadcast packets that expired.
    pub expired_packets: usize,
    /// Waste drops that decayed.
    pub decayed_waste: usize,
    /// Food cells added by spreading or dropping.
    pub food_grown: usize,
}

/// The grid plus everything placed on it.
#[derive(Debug, Clone)]
pub struct Environment {
    topology: Topology,
    cells: Vec<Cell>,
    food_types: usize,
    conduit: BroadcastConduit,
}

impl Environment {
    /// Create an empty environment.
    pub fn new(topology: Topology, food_types: usize, packet_lifetime: u64) -> Self {
        Self {
            topology,
            cells: vec![Cell::Empty; topology.cell_count()],
            food_types,
            conduit: BroadcastConduit::new(packet_lifetime),
        }
    }

    /// The grid shape.
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Number of configured food types.
    pub const fn food_types(&self) -> usize {
        self.food_types
    }

    /// Read access to the broadcast conduit.
    pub const fn conduit(&self) -> &BroadcastConduit {
        &self.conduit
    }

    /// Write access to the broadcast conduit.
    pub const fn conduit_mut(&mut self) -> &mut BroadcastConduit {
        &mut self.conduit
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The contents of a cell.
    pub fn cell(&self, location: Location) -> Result<Cell, WorldError> {
        let index = self
            .topology
            .index_of(location)
            .ok_or(WorldError::OutOfBounds(location))?;
        self.cells
            .get(index)
            .copied()
            .ok_or(WorldError::OutOfBounds(location))
    }

    fn cell_or_empty(&self, location: Location) -> Cell {
        self.cell(location).unwrap_or_default()
    }

    /// Whether an agent stands at the location.
    pub fn has_agent(&self, location: Location) -> bool {
        matches!(self.cell_or_empty(location), Cell::Agent(_))
    }

    /// Whether food lies at the location.
    pub fn has_food(&self, location: Location) -> bool {
        matches!(self.cell_or_empty(location), Cell::Food(_))
    }

    /// Whether a stone lies at the location.
    pub fn has_stone(&self, location: Location) -> bool {
        matches!(self.cell_or_empty(location), Cell::Stone)
    }

    /// Whether a drop lies at the location.
    pub fn has_drop(&self, location: Location) -> bool {
        matches!(self.cell_or_empty(location), Cell::Drop(_))
    }

    /// Whether the location is on the grid and holds nothing.
    pub fn is_empty(&self, location: Location) -> bool {
        matches!(self.cell(location), Ok(Cell::Empty))
    }

    /// The agent standing at the location.
    pub fn get_agent(&self, location: Location) -> Option<AgentId> {
        match self.cell_or_empty(location) {
            Cell::Agent(id) => Some(id),
            _ => None,
        }
    }

    /// The food type lying at the location.
    pub fn get_food_type(&self, location: Location) -> Option<usize> {
        match self.cell_or_empty(location) {
            Cell::Food(food_type) => Some(food_type),
            _ => None,
        }
    }

    /// The drop lying at the location.
    pub fn get_drop(&self, location: Location) -> Option<Drop> {
        match self.cell_or_empty(location) {
            Cell::Drop(drop) => Some(drop),
            _ => None,
        }
    }

    /// Every cell with its location, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Location, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| self.topology.location_at(i).map(|loc| (loc, *cell)))
    }

    /// Number of food cells of one type.
    pub fn count_food(&self, food_type: usize) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Food(t) if *t == food_type))
            .count()
    }

    /// Number of drops matching a predicate.
    pub fn count_drops(&self, predicate: impl Fn(&Drop) -> bool) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Drop(d) if predicate(d)))
            .count()
    }

    /// Number of empty cells.
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Empty).count()
    }

    /// Empty neighbours of a location, in `Direction::ALL` order.
    pub fn empty_neighbours(&self, location: Location) -> Vec<Location> {
        self.topology
            .neighbours(location)
            .into_iter()
            .filter(|loc| self.is_empty(*loc))
            .collect()
    }

    /// First empty cell next to `location`, trying ahead, left, right, then
    /// behind relative to `facing`.
    pub fn first_empty_facing(&self, location: Location, facing: Direction) -> Option<Location> {
        [
            facing,
            facing.turn_left(),
            facing.turn_right(),
            facing.opposite(),
        ]
        .into_iter()
        .filter_map(|dir| self.topology.get_adjacent(location, dir))
        .find(|loc| self.is_empty(*loc))
    }

    /// A uniformly chosen empty cell, or `None` if the grid is full.
    pub fn random_empty_location(&self, rng: &mut SimRng) -> Option<Location> {
        let empties: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Empty)
            .map(|(i, _)| i)
            .collect();
        let choice = pick_index(rng, empties.len())?;
        let index = empties.get(choice).copied()?;
        self.topology.location_at(index)
    }

    // -----------------------------------------------------------------------
    // Mutation primitives
    // -----------------------------------------------------------------------

    fn slot_mut(&mut self, location: Location) -> Result<&mut Cell, WorldError> {
        let index = self
            .topology
            .index_of(location)
            .ok_or(WorldError::OutOfBounds(location))?;
        self.cells
            .get_mut(index)
            .ok_or(WorldError::OutOfBounds(location))
    }

    /// Put `next` into an empty cell.
    fn occupy(&mut self, location: Location, next: Cell) -> Result<(), WorldError> {
        let slot = self.slot_mut(location)?;
        match *slot {
            Cell::Empty => {
                *slot = next;
                Ok(())
            }
            Cell::Stone => Err(WorldError::CellBlocked(location)),
            other => Err(WorldError::CellOccupied {
                location,
                occupant: other.occupant_name(),
            }),
        }
    }

    /// Place an agent on an empty cell.
    pub fn set_agent(&mut self, location: Location, agent: AgentId) -> Result<(), WorldError> {
        self.occupy(location, Cell::Agent(agent))
    }

    /// Release the cell held by `agent`.
    pub fn clear_agent(&mut self, location: Location, agent: AgentId) -> Result<(), WorldError> {
        let slot = self.slot_mut(location)?;
        match *slot {
            Cell::Agent(found) if found == agent => {
                *slot = Cell::Empty;
                Ok(())
            }
            Cell::Agent(found) => Err(WorldError::AgentMismatch {
                location,
                expected: agent,
                found,
            }),
            _ => Err(WorldError::NoAgentAt(location)),
        }
    }

    /// Move an agent to an empty cell.
    ///
    /// The destination is checked before the origin is released, so a
    /// refused move leaves the grid untouched.
    pub fn move_agent(
        &mut self,
        from: Location,
        to: Location,
        agent: AgentId,
    ) -> Result<(), WorldError> {
        let destination = self.cell(to)?;
        if destination != Cell::Empty {
            return Err(match destination {
                Cell::Stone => WorldError::CellBlocked(to),
                other => WorldError::CellOccupied {
                    location: to,
                    occupant: other.occupant_name(),
                },
            });
        }
        self.clear_agent(from, agent)?;
        self.set_agent(to, agent)
    }

    /// Place food of a type on an empty cell.
    pub fn add_food(&mut self, location: Location, food_type: usize) -> Result<(), WorldError> {
        if food_type >= self.food_types {
            return Err(WorldError::UnknownFoodType {
                food_type,
                food_types: self.food_types,
            });
        }
        self.occupy(location, Cell::Food(food_type))
    }

    /// Remove the food at a cell and return its type.
    pub fn remove_food(&mut self, location: Location) -> Result<usize, WorldError> {
        let slot = self.slot_mut(location)?;
        match *slot {
            Cell::Food(food_type) => {
                *slot = Cell::Empty;
                Ok(food_type)
            }
            _ => Err(WorldError::NoFoodAt(location)),
        }
    }

    /// Place a stone on an empty cell.
    pub fn add_stone(&mut self, location: Location) -> Result<(), WorldError> {
        self.occupy(location, Cell::Stone)
    }

    /// Remove the stone at a cell.
    pub fn remove_stone(&mut self, location: Location) -> Result<(), WorldError> {
        let slot = self.slot_mut(location)?;
        if *slot == Cell::Stone {
            *slot = Cell::Empty;
            Ok(())
        } else {
            Err(WorldError::NoStoneAt(location))
        }
    }

    /// Place a drop on an empty cell.
    pub fn add_drop(&mut self, location: Location, drop: Drop) -> Result<(), WorldError> {
        self.occupy(location, Cell::Drop(drop))
    }

    /// Remove the drop at a cell and return it.
    pub fn remove_drop(&mut self, location: Location) -> Result<Drop, WorldError> {
        let slot = self.slot_mut(location)?;
        match *slot {
            Cell::Drop(drop) => {
                *slot = Cell::Empty;
                Ok(drop)
            }
            _ => Err(WorldError::NoDropAt(location)),
        }
    }

    // -----------------------------------------------------------------------
    // Seeding and per-tick update
    // -----------------------------------------------------------------------

    /// Scatter up to `count` stones on random empty cells.
    ///
    /// Returns how many were placed; fewer than requested means the grid
    /// ran out of empty cells.
    pub fn scatter_stones(&mut self, count: u32, rng: &mut SimRng) -> Result<u32, WorldError> {
        let mut placed: u32 = 0;
        for _ in 0..count {
            let Some(location) = self.random_empty_location(rng) else {
                break;
            };
            self.add_stone(location)?;
            placed = placed.saturating_add(1);
        }
        Ok(placed)
    }

    /// Scatter up to `count` food cells of a type on random empty cells.
    pub fn scatter_food(
        &mut self,
        food_type: usize,
        count: u32,
        rng: &mut SimRng,
    ) -> Result<u32, WorldError> {
        let mut placed: u32 = 0;
        for _ in 0..count {
            let Some(location) = self.random_empty_location(rng) else {
                break;
            };
            self.add_food(location, food_type)?;
            placed = placed.saturating_add(1);
        }
        Ok(placed)
    }

    /// Advance environment state by one tick.
    ///
    /// Order: expire broadcast packets, decay waste, then grow food for
    /// each food type in type order.
    pub fn update(
        &mut self,
        now: u64,
        food: &[FoodParams],
        rng: &mut SimRng,
    ) -> Result<EnvironmentUpdate, WorldError> {
        let expired_packets = self.conduit.expire(now);

        let mut decayed_waste: usize = 0;
        for cell in &mut self.cells {
            if let Cell::Drop(drop) = cell {
                if matches!(drop, Drop::Waste { .. }) && drop.is_expired(now) {
                    *cell = Cell::Empty;
                    decayed_waste = decayed_waste.saturating_add(1);
                }
            }
        }

        let mut food_grown: usize = 0;
        for (food_type, params) in food.iter().enumerate() {
            food_grown = food_grown.saturating_add(self.grow_food(food_type, params, rng)?);
        }

        let summary = EnvironmentUpdate {
            expired_packets,
            decayed_waste,
            food_grown,
        };
        debug!(
            tick = now,
            expired_packets, decayed_waste, food_grown, "Environment updated"
        );
        Ok(summary)
    }

    /// Spread existing food of one type and maybe drop a new cell.
    fn grow_food(
        &mut self,
        food_type: usize,
        params: &FoodParams,
        rng: &mut SimRng,
    ) -> Result<usize, WorldError> {
        let sources: Vec<Location> = self
            .cells()
            .filter(|(_, c)| *c == Cell::Food(food_type))
            .map(|(loc, _)| loc)
            .collect();

        let mut grown: usize = 0;
        for source in sources {
            if !roll(rng, params.grow_chance) {
                continue;
            }
            let direction = self.topology.get_random_direction(rng);
            if let Some(target) = self.topology.get_adjacent(source, direction) {
                if self.is_empty(target) {
                    self.add_food(target, food_type)?;
                    grown = grown.saturating_add(1);
                }
            }
        }

        if roll(rng, params.drop_rate) {
            if let Some(target) = self.random_empty_location(rng) {
                self.add_food(target, food_type)?;
                grown = grown.saturating_add(1);
            }
        }
        Ok(grown)
    }
}
