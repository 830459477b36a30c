//! Slot grid: authoritative placement and occupancy bookkeeping.
//!
//! The grid owns a fixed set of positional slots — two sides, two rows per
//! side, `row_size` columns per row — created once when an encounter is
//! constructed and never destroyed while it runs. Each slot holds at most one
//! occupant, and a unit occupies exactly one slot or none.
//!
//! # Ownership
//!
//! The grid exclusively owns slot occupancy. A unit's slot membership is a
//! back-reference maintained here ([`SlotGrid::unit_slot`]); the unit itself
//! never stores a link to its slot. The roster (which units exist) is owned
//! by the encounter — the grid never decides a unit's existence, it only
//! records where living units stand.
//!
//! # Determinism
//!
//! Slots are stored in a `BTreeMap` keyed by [`SlotId`], whose derived
//! ordering is side, then row (front before back), then index ascending.
//! Every iteration over slots therefore produces the canonical "front row
//! first, leftmost first" order the targeting resolver relies on.
//!
//! # Example
//!
//! ```
//! use phalanx_core::config::EncounterConfig;
//! use phalanx_core::grid::{Row, SlotGrid};
//! use phalanx_core::unit::{Archetype, Side, Unit, UnitId, UnitSpec, UnitStats};
//!
//! let mut grid = SlotGrid::new(&EncounterConfig::default());
//! let spec = UnitSpec::new(UnitStats::new(10, 2, 1), Archetype::Bruiser, Row::Front);
//! let mut unit = Unit::spawn(UnitId::new(0), Side::Ally, &spec);
//!
//! assert!(grid.place_unit(&mut unit, Row::Front, None));
//! assert_eq!(grid.occupied_slots(Side::Ally, None).count(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EncounterConfig;
use crate::unit::{Side, Unit, UnitId};

/// Row within a side's half of the grid.
///
/// The front row absorbs default melee targeting and shields the back row
/// via the shield-wall block check; the back row suffers the range penalty
/// when struck from the opposing back row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Row {
    /// The row facing the opposing side.
    Front,
    /// The row behind the front line.
    Back,
}

impl Row {
    /// Returns the other row on the same side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

/// Identity of one slot: side, row, and column index.
///
/// The derived ordering (side, then row, then index) is the canonical slot
/// enumeration order for the whole crate.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotId {
    /// Which side the slot belongs to.
    pub side: Side,
    /// Which row within that side.
    pub row: Row,
    /// Column index in `0..row_size`.
    pub index: usize,
}

impl SlotId {
    /// Creates a slot identity.
    #[must_use]
    pub const fn new(side: Side, row: Row, index: usize) -> Self {
        Self { side, row, index }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.side, self.row, self.index)
    }
}

/// One positional slot: identity, fixed world position, optional occupant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    id: SlotId,
    position: Vec2,
    occupant: Option<UnitId>,
}

impl Slot {
    /// Returns the slot's identity.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Returns the slot's fixed world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the occupying unit, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// Returns `true` if no unit occupies this slot.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Fixed grid of slots with exclusive occupancy.
///
/// # Invariants
///
/// - A placement never overwrites an occupied slot
/// - [`SlotGrid::remove_unit`] is idempotent
/// - The unit→slot back-reference map and slot occupants are always
///   consistent: `unit_slot(u) == Some(s)` iff slot `s` holds occupant `u`
///
/// The grid itself is not serialized; occupancy is exported through
/// [`crate::encounter::Encounter::snapshot`] as `(slot, unit)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotGrid {
    row_size: usize,
    slots: BTreeMap<SlotId, Slot>,
    by_unit: BTreeMap<UnitId, SlotId>,
}

impl SlotGrid {
    /// Creates the grid for one encounter.
    ///
    /// Builds `2 sides x 2 rows x row_size` slots with fixed world positions
    /// derived from the config geometry: columns run along the x axis, the
    /// two sides face each other across the y axis, and back rows sit behind
    /// their front rows.
    #[must_use]
    pub fn new(config: &EncounterConfig) -> Self {
        let mut slots = BTreeMap::new();
        for side in [Side::Ally, Side::Enemy] {
            for row in [Row::Front, Row::Back] {
                for index in 0..config.row_size {
                    let id = SlotId::new(side, row, index);
                    slots.insert(
                        id,
                        Slot {
                            id,
                            position: Self::slot_position(config, side, row, index),
                            occupant: None,
                        },
                    );
                }
            }
        }
        Self {
            row_size: config.row_size,
            slots,
            by_unit: BTreeMap::new(),
        }
    }

    /// Computes the fixed world position of a slot.
    #[allow(clippy::cast_precision_loss)]
    fn slot_position(config: &EncounterConfig, side: Side, row: Row, index: usize) -> Vec2 {
        let x = index as f32 * config.slot_spacing;
        let depth = match row {
            Row::Front => config.side_gap / 2.0,
            Row::Back => config.side_gap / 2.0 + config.row_spacing,
        };
        let y = match side {
            Side::Ally => -depth,
            Side::Enemy => depth,
        };
        Vec2::new(x, y)
    }

    /// Returns the number of columns per row.
    #[must_use]
    pub const fn row_size(&self) -> usize {
        self.row_size
    }

    /// Returns a slot by identity.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    /// Returns the slot currently held by a unit, if any.
    #[must_use]
    pub fn unit_slot(&self, unit: UnitId) -> Option<SlotId> {
        self.by_unit.get(&unit).copied()
    }

    /// Returns the front-row slot in the same column, for the shield-wall
    /// check against a back-row defender.
    #[must_use]
    pub fn front_slot_in_column(&self, side: Side, index: usize) -> Option<&Slot> {
        self.slots.get(&SlotId::new(side, Row::Front, index))
    }

    /// Finds the nearest empty slot on a side.
    ///
    /// Searches the preferred row first, ordered by distance to `reference`
    /// ascending (ties broken by lower index), and falls back to the other
    /// row on the same side if the preferred row is full. Returns `None` if
    /// both rows are full.
    #[must_use]
    pub fn find_nearest_empty(
        &self,
        side: Side,
        preferred_row: Row,
        reference: Vec2,
    ) -> Option<SlotId> {
        self.nearest_empty_in_row(side, preferred_row, reference)
            .or_else(|| self.nearest_empty_in_row(side, preferred_row.other(), reference))
    }

    fn nearest_empty_in_row(&self, side: Side, row: Row, reference: Vec2) -> Option<SlotId> {
        let mut candidates: Vec<(f32, usize, SlotId)> = self
            .slots
            .values()
            .filter(|s| s.id.side == side && s.id.row == row && s.is_empty())
            .map(|s| (s.position.distance_squared(reference), s.id.index, s.id))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.first().map(|&(_, _, id)| id)
    }

    /// Places a unit into the grid.
    ///
    /// With `explicit_index` the exact slot `(unit.side, preferred_row,
    /// index)` is attempted; otherwise the nearest-empty search runs from
    /// the unit's current position. Fails — returning `false` with no
    /// mutation — if the unit already holds a slot, the chosen slot does not
    /// exist, or it is occupied.
    ///
    /// On success the unit's world position moves to the slot's position;
    /// reporting that move to the rendering collaborator is the caller's
    /// concern.
    pub fn place_unit(
        &mut self,
        unit: &mut Unit,
        preferred_row: Row,
        explicit_index: Option<usize>,
    ) -> bool {
        if self.by_unit.contains_key(&unit.id()) {
            return false;
        }

        let target = match explicit_index {
            Some(index) => {
                let id = SlotId::new(unit.side(), preferred_row, index);
                match self.slots.get(&id) {
                    Some(slot) if slot.is_empty() => Some(id),
                    _ => None,
                }
            }
            None => self.find_nearest_empty(unit.side(), preferred_row, unit.position()),
        };

        let Some(id) = target else {
            return false;
        };

        let slot = self
            .slots
            .get_mut(&id)
            .filter(|slot| slot.is_empty());
        let Some(slot) = slot else {
            return false;
        };

        slot.occupant = Some(unit.id());
        unit.set_position(slot.position);
        self.by_unit.insert(unit.id(), id);
        debug!(unit = %unit.id(), slot = %id, "unit placed");
        true
    }

    /// Clears occupancy for whichever slot currently holds the unit.
    ///
    /// No-op if the unit holds no slot.
    pub fn remove_unit(&mut self, unit: UnitId) {
        if let Some(id) = self.by_unit.remove(&unit) {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.occupant = None;
            }
            debug!(unit = %unit, slot = %id, "unit removed from grid");
        }
    }

    /// Returns occupied slots on a side, optionally filtered by row.
    ///
    /// Ordering is the canonical slot order: front row before back row,
    /// index ascending within a row. Occupancy is a grid-level fact; the
    /// caller filters for liveness against the roster.
    pub fn occupied_slots(
        &self,
        side: Side,
        row: Option<Row>,
    ) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.values().filter(move |s| {
            s.id.side == side && row.map_or(true, |r| s.id.row == r) && s.occupant.is_some()
        })
    }

    /// Returns the number of occupied slots on a side.
    #[must_use]
    pub fn occupied_count(&self, side: Side) -> usize {
        self.occupied_slots(side, None).count()
    }

    /// Returns all slots in canonical order. Mainly for snapshots and tests.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.values()
    }
}
