//! Per-archetype target selection.
//!
//! Given an attacking unit's [`Archetype`] and the occupied-slot view of the
//! opposing side, the resolver selects exactly one living target, or none if
//! the opposing side is empty. Every strategy is a pure function over a
//! [`TargetView`]; the archetype dispatch is a plain match, so each strategy
//! is table-testable in isolation.
//!
//! # Tie-breaks
//!
//! "Leftmost" comparisons use each unit's current world horizontal position,
//! not its slot index — a unit's position is authoritative once placed.
//! Stat-scan strategies (Assassin, Sniper) break ties by iteration order:
//! first encountered wins, scanning front row before back row, index
//! ascending.
//!
//! # Failure mode
//!
//! An empty view yields `None`; the caller treats that as a no-op turn, not
//! an error.

use std::collections::BTreeMap;

use crate::grid::{Row, SlotGrid, SlotId};
use crate::unit::{Archetype, Side, Unit, UnitId};

/// Column index the Bomber archetype is drawn to.
const BOMBER_COLUMN: usize = 1;

/// Occupied-slot view of one side, restricted to living units.
///
/// Built fresh for each attack from the grid's occupancy and the roster's
/// liveness; rows keep the canonical index-ascending order.
#[derive(Debug)]
pub struct TargetView<'a> {
    front: Vec<(SlotId, &'a Unit)>,
    back: Vec<(SlotId, &'a Unit)>,
}

impl<'a> TargetView<'a> {
    /// Builds the view of `side` from grid occupancy and the roster.
    ///
    /// Occupants that are no longer alive are filtered out — a dead unit may
    /// still hold its slot until the round-end sweep, but it is not a valid
    /// target.
    #[must_use]
    pub fn of_side(grid: &SlotGrid, units: &'a BTreeMap<UnitId, Unit>, side: Side) -> Self {
        let collect = |row: Row| -> Vec<(SlotId, &'a Unit)> {
            grid.occupied_slots(side, Some(row))
                .filter_map(|slot| {
                    let unit = units.get(&slot.occupant()?)?;
                    unit.is_alive().then_some((slot.id(), unit))
                })
                .collect()
        };
        Self {
            front: collect(Row::Front),
            back: collect(Row::Back),
        }
    }

    /// Returns `true` if no living unit stands on this side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }

    /// Living occupants of the front row, index ascending.
    #[must_use]
    pub fn front(&self) -> &[(SlotId, &'a Unit)] {
        &self.front
    }

    /// Living occupants of the back row, index ascending.
    #[must_use]
    pub fn back(&self) -> &[(SlotId, &'a Unit)] {
        &self.back
    }

    /// All living occupants in first-encountered order: front row before
    /// back row, index ascending.
    fn all(&self) -> impl Iterator<Item = (SlotId, &'a Unit)> + '_ {
        self.front.iter().chain(self.back.iter()).copied()
    }
}

/// Selects a target for the given archetype, or `None` if the view is empty.
#[must_use]
pub fn select_target(archetype: Archetype, view: &TargetView<'_>) -> Option<UnitId> {
    match archetype {
        Archetype::Bruiser => row_priority(view.front(), view.back()),
        Archetype::Archer => row_priority(view.back(), view.front()),
        Archetype::Assassin => lowest_hp_fraction(view),
        Archetype::Sniper => highest_attack(view),
        Archetype::Bomber => second_column(view),
    }
}

/// Leftmost occupant of the preferred row, falling back to the other row.
fn row_priority(preferred: &[(SlotId, &Unit)], fallback: &[(SlotId, &Unit)]) -> Option<UnitId> {
    if preferred.is_empty() {
        leftmost(fallback.iter().copied())
    } else {
        leftmost(preferred.iter().copied())
    }
}

/// Occupant with the smallest world x. Ties keep the first encountered.
fn leftmost<'a>(units: impl Iterator<Item = (SlotId, &'a Unit)>) -> Option<UnitId> {
    units
        .min_by(|a, b| a.1.position().x.total_cmp(&b.1.position().x))
        .map(|(_, unit)| unit.id())
}

/// Lowest `hp / max_hp` across both rows, first encountered on ties.
fn lowest_hp_fraction(view: &TargetView<'_>) -> Option<UnitId> {
    let mut best: Option<(f32, UnitId)> = None;
    for (_, unit) in view.all() {
        let fraction = unit.hp_fraction();
        if best.is_none() || best.is_some_and(|(b, _)| fraction < b) {
            best = Some((fraction, unit.id()));
        }
    }
    best.map(|(_, id)| id)
}

/// Highest attack power across both rows, first encountered on ties.
fn highest_attack(view: &TargetView<'_>) -> Option<UnitId> {
    let mut best: Option<(i32, UnitId)> = None;
    for (_, unit) in view.all() {
        if best.is_none() || best.is_some_and(|(b, _)| unit.attack() > b) {
            best = Some((unit.attack(), unit.id()));
        }
    }
    best.map(|(_, id)| id)
}

/// The second column if occupied (front row checked first), otherwise the
/// leftmost occupant across both rows.
fn second_column(view: &TargetView<'_>) -> Option<UnitId> {
    view.all()
        .find(|(slot, _)| slot.index == BOMBER_COLUMN)
        .map(|(_, unit)| unit.id())
        .or_else(|| leftmost(view.all()))
}
