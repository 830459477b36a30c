//! Initiative scheduling for one combat round.
//!
//! At the start of each round every living unit is snapshotted into a queue,
//! sorted descending by attack interval ("speed"). The sort is stable and the
//! collection order is fixed — ally roster before enemy roster, insertion
//! order within each — so equal speeds always resolve the same way.
//!
//! The queue is rebuilt from scratch every round and never persisted, which
//! prevents drift from units that died or spawned mid-round. Entries are unit
//! IDs, not references: a unit that dies after the queue is built is caught
//! by the drain-time liveness re-check in the encounter and skipped without
//! consuming a turn.

use std::collections::BTreeMap;

use crate::unit::{Side, Unit, UnitId};

/// Speed-ordered action queue for one round.
///
/// Built by [`InitiativeQueue::build`], drained front to back by
/// [`InitiativeQueue::next`]. Once drained it is discarded; the next round
/// builds a fresh queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitiativeQueue {
    entries: Vec<UnitId>,
    cursor: usize,
}

impl InitiativeQueue {
    /// Snapshots every living unit into a new queue.
    ///
    /// Allies are collected before enemies, each side in roster (ID) order;
    /// a stable descending sort by speed then fixes the action order for the
    /// round. Ordering is fully determined here, before any damage is
    /// applied — later deaths can only cause skips, never reorders.
    #[must_use]
    pub fn build(units: &BTreeMap<UnitId, Unit>) -> Self {
        let mut keyed: Vec<(u32, UnitId)> = Vec::with_capacity(units.len());
        for side in [Side::Ally, Side::Enemy] {
            keyed.extend(
                units
                    .values()
                    .filter(|u| u.side() == side && u.is_alive())
                    .map(|u| (u.speed(), u.id())),
            );
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0));

        Self {
            entries: keyed.into_iter().map(|(_, id)| id).collect(),
            cursor: 0,
        }
    }

    /// Pops the next unit due to act, or `None` when the round is drained.
    pub fn next(&mut self) -> Option<UnitId> {
        let id = self.entries.get(self.cursor).copied();
        if id.is_some() {
            self.cursor += 1;
        }
        id
    }

    /// Returns the full action order fixed at round start.
    #[must_use]
    pub fn order(&self) -> &[UnitId] {
        &self.entries
    }

    /// Returns how many entries have not yet been drained.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Returns `true` if every entry has been drained.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.cursor >= self.entries.len()
    }
}
