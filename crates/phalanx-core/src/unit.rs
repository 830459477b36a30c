//! Unit types for the combat core.
//!
//! This module provides the combat entities the resolution engine operates on:
//! - [`UnitId`]: Unique identifier for units within an encounter
//! - [`Side`]: Which roster a unit belongs to
//! - [`Archetype`]: Targeting-strategy tag consumed by the targeting resolver
//! - [`UnitStats`]: Immutable stat block supplied by the spawner
//! - [`UnitSpec`]: Spawn descriptor (stats + archetype + preferred row)
//! - [`Unit`]: A live combat entity with current HP and world position
//!
//! # Invariants
//!
//! - `alive == (hp > 0)` at all times; [`Unit::apply_damage`] maintains this
//! - HP never exceeds `max_hp` and never drops below zero
//! - A dead unit is inert: it takes no turns and is removed from the grid and
//!   roster by the encounter's round-end sweep
//!
//! # Example
//!
//! ```
//! use phalanx_core::unit::{Archetype, Side, Unit, UnitId, UnitSpec, UnitStats};
//! use phalanx_core::grid::Row;
//!
//! let spec = UnitSpec::new(UnitStats::new(20, 5, 1), Archetype::Bruiser, Row::Front);
//! let mut unit = Unit::spawn(UnitId::new(0), Side::Ally, &spec);
//!
//! assert!(unit.is_alive());
//! unit.apply_damage(25);
//! assert!(!unit.is_alive());
//! assert_eq!(unit.hp(), 0);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Row;

/// Unique identifier for a unit.
///
/// `UnitId` is a newtype wrapper around `u64` that provides type safety and
/// a clear semantic meaning. Unit IDs are assigned monotonically by the
/// encounter when a wave is staged and are unique for the encounter's
/// lifetime.
///
/// # Ordering
///
/// Unit IDs order by their numeric value. Because allies are staged before
/// enemies, ID order doubles as the canonical roster enumeration order used
/// for deterministic tie-breaks.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    /// Creates a new `UnitId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UnitId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<UnitId> for u64 {
    fn from(id: UnitId) -> Self {
        id.0
    }
}

/// Which roster a unit fights for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player-controlled roster.
    Ally,
    /// The wave-spawned opposing roster.
    Enemy,
}

impl Side {
    /// Returns the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ally => write!(f, "ally"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// Targeting-strategy tag carried by every unit.
///
/// The archetype is derived from a unit's source data and consumed only by
/// the targeting resolver; it has no effect on damage or initiative.
///
/// # Variants
///
/// - `Bruiser`: front row first, leftmost occupant
/// - `Archer`: back row first, leftmost occupant
/// - `Assassin`: lowest HP fraction across both rows
/// - `Sniper`: highest attack power across both rows
/// - `Bomber`: the second column if occupied, otherwise leftmost overall
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Front row first, leftmost occupant.
    Bruiser,
    /// Back row first, leftmost occupant.
    Archer,
    /// Lowest HP fraction across both rows.
    Assassin,
    /// Highest attack power across both rows.
    Sniper,
    /// Second column if occupied, otherwise leftmost overall.
    Bomber,
}

impl Archetype {
    /// Parses an archetype from a source-data tag.
    ///
    /// Unknown or malformed tags fail closed to [`Archetype::Bruiser`]: a
    /// stalled encounter is worse than a suboptimal targeting decision, so
    /// bad data degrades to the most defensive strategy instead of erroring.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "archer" => Self::Archer,
            "assassin" => Self::Assassin,
            "sniper" => Self::Sniper,
            "bomber" => Self::Bomber,
            _ => Self::Bruiser,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bruiser => write!(f, "bruiser"),
            Self::Archer => write!(f, "archer"),
            Self::Assassin => write!(f, "assassin"),
            Self::Sniper => write!(f, "sniper"),
            Self::Bomber => write!(f, "bomber"),
        }
    }
}

/// Immutable stat block supplied by the spawner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points. Current HP starts here and never exceeds it.
    pub max_hp: i32,
    /// Damage dealt per attack before positional modifiers.
    pub attack: i32,
    /// Attack interval. Higher values act earlier in a round.
    pub speed: u32,
    /// Movement speed. Carried for the host; unused by resolution.
    pub move_speed: f32,
    /// Attack range. Carried for the host; unused by resolution.
    pub range: f32,
}

impl UnitStats {
    /// Creates a stat block with the given core values and neutral movement
    /// and range.
    #[must_use]
    pub const fn new(max_hp: i32, attack: i32, speed: u32) -> Self {
        Self {
            max_hp,
            attack,
            speed,
            move_speed: 0.0,
            range: 0.0,
        }
    }
}

/// Spawn descriptor for one unit.
///
/// The spawner/roster provider supplies a list of these per side; the core
/// only places what it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Stat block for the spawned unit.
    pub stats: UnitStats,
    /// Targeting strategy the unit attacks with.
    pub archetype: Archetype,
    /// Row the unit would like to start in. Falls back to the other row if
    /// the preferred row is full.
    pub preferred_row: Row,
}

impl UnitSpec {
    /// Creates a spawn descriptor.
    #[must_use]
    pub const fn new(stats: UnitStats, archetype: Archetype, preferred_row: Row) -> Self {
        Self {
            stats,
            archetype,
            preferred_row,
        }
    }
}

/// A live combat entity.
///
/// Units are created when a wave is staged, mutated by damage application,
/// and destroyed (removed from roster and grid) once the encounter's
/// round-end sweep observes their death.
///
/// The unit's `position` is its authoritative world position once placed:
/// the grid moves it onto a slot at placement time, and all "leftmost"
/// targeting comparisons read it rather than the slot index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    side: Side,
    archetype: Archetype,
    stats: UnitStats,
    hp: i32,
    alive: bool,
    position: Vec2,
}

impl Unit {
    /// Spawns a unit from a descriptor at full health.
    ///
    /// The unit's position starts at the origin; placement moves it onto its
    /// slot.
    #[must_use]
    pub fn spawn(id: UnitId, side: Side, spec: &UnitSpec) -> Self {
        let max_hp = spec.stats.max_hp.max(1);
        Self {
            id,
            side,
            archetype: spec.archetype,
            stats: UnitStats {
                max_hp,
                ..spec.stats
            },
            hp: max_hp,
            alive: true,
            position: Vec2::ZERO,
        }
    }

    /// Returns the unit's unique identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Returns the side this unit fights for.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the unit's targeting archetype.
    #[must_use]
    pub const fn archetype(&self) -> Archetype {
        self.archetype
    }

    /// Returns the unit's stat block.
    #[must_use]
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Returns the unit's current hit points.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Returns the unit's maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.stats.max_hp
    }

    /// Returns the unit's attack power.
    #[must_use]
    pub const fn attack(&self) -> i32 {
        self.stats.attack
    }

    /// Returns the unit's attack interval (initiative speed).
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.stats.speed
    }

    /// Returns `true` while the unit has hit points remaining.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns current HP as a fraction of maximum, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hp_fraction(&self) -> f32 {
        self.hp as f32 / self.stats.max_hp as f32
    }

    /// Returns the unit's current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the unit's world position. Called by the grid on placement.
    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Applies damage, clamping HP to zero and updating the alive flag.
    ///
    /// Negative amounts are ignored; this is not a healing path. Returns the
    /// unit's HP after the hit.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        if amount > 0 {
            self.hp = (self.hp - amount).max(0);
            if self.hp == 0 {
                self.alive = false;
            }
        }
        self.hp
    }
}
