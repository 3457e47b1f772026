//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Compass facing of an agent on the grid.
///
/// `North` is towards `y = 0`; `East` is towards increasing `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards decreasing `y`.
    North,
    /// Towards increasing `x`.
    East,
    /// Towards increasing `y`.
    South,
    /// Towards decreasing `x`.
    West,
}

impl Direction {
    /// All directions in clockwise order starting from north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Direction after a 90 degree counter-clockwise turn.
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Direction after a 90 degree clockwise turn.
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// The opposite direction.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Unit step `(dx, dy)` for one move in this direction.
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Stable ordinal (0..4), used by controllers to encode facing.
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

/// The action a controller selects for its agent on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Move one cell in the facing direction (or bump whatever is there).
    StepForward,
    /// Rotate facing counter-clockwise without moving.
    TurnLeft,
    /// Rotate facing clockwise without moving.
    TurnRight,
    /// Do nothing this tick.
    Rest,
}

impl Action {
    /// Decode the two low bits of a controller output.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::TurnLeft,
            1 => Self::TurnRight,
            2 => Self::StepForward,
            _ => Self::Rest,
        }
    }
}

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Energy dropped to zero or below.
    Starvation,
    /// Age reached the configured aging limit.
    OldAge,
    /// Eaten by another agent.
    Eaten,
    /// Removed by an external request (operator, test harness).
    Removed,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::OldAge => write!(f, "old_age"),
            Self::Eaten => write!(f, "eaten"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// Reason attached to every energy change, reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyCause {
    /// Cost of stepping forward.
    StepForward,
    /// Cost of turning left.
    TurnLeft,
    /// Cost of turning right.
    TurnRight,
    /// Gain from eating food of the agent's own type.
    EatFavoriteFood,
    /// Gain from eating any other food type.
    EatFood,
    /// Gain from eating another agent.
    EatAgent,
    /// Penalty for bumping a stone, waste, or the grid edge.
    BumpWall,
    /// Penalty for bumping another agent.
    BumpAgent,
    /// Cost of producing a child sexually.
    SexualReproduction,
    /// Cost of producing a child asexually.
    AsexualReproduction,
    /// Age-based energy penalty.
    AgingPenalty,
    /// Cost of sending a broadcast packet.
    Broadcast,
    /// Energy granted or taken by a mutator or drop.
    Plugin,
}

/// How a child came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReproductionMode {
    /// Seeded from configuration, no parent.
    Seeded,
    /// One parent.
    Asexual,
    /// Two parents.
    Sexual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_left_turns_return_to_start() {
        for dir in Direction::ALL {
            let turned = dir.turn_left().turn_left().turn_left().turn_left();
            assert_eq!(turned, dir);
            assert_eq!(dir.turn_left().turn_right(), dir);
        }
    }

    #[test]
    fn opposite_is_two_turns() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite(), dir.turn_right().turn_right());
        }
    }

    #[test]
    fn action_bits_cover_all_actions() {
        assert_eq!(Action::from_bits(0), Action::TurnLeft);
        assert_eq!(Action::from_bits(1), Action::TurnRight);
        assert_eq!(Action::from_bits(2), Action::StepForward);
        assert_eq!(Action::from_bits(3), Action::Rest);
        assert_eq!(Action::from_bits(0b110), Action::StepForward);
    }

    #[test]
    fn death_cause_display() {
        assert_eq!(DeathCause::OldAge.to_string(), "old_age");
        assert_eq!(DeathCause::Eaten.to_string(), "eaten");
    }
}
