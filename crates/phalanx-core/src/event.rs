//! Combat event log.
//!
//! Every observable thing the resolution core does is appended to an
//! encounter-local event list. The log is the contract with the presentation
//! layer: per-action damage numbers, deaths, and the final outcome are all
//! derived from it, and two encounters with the same seed and staging
//! produce byte-identical logs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::unit::UnitId;

/// Final result of an encounter, reported exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// The enemy roster was wiped out.
    Victory,
    /// The ally roster was wiped out. A simultaneous wipe also lands here;
    /// the round-end check tests allies first.
    Defeat,
}

impl BattleOutcome {
    /// Returns `true` for a victory.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Victory)
    }
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
        }
    }
}

/// One entry in the combat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A wave was staged onto the grid.
    WaveStaged {
        /// Ally units successfully placed.
        allies: usize,
        /// Enemy units successfully placed.
        enemies: usize,
        /// Units discarded because no slot was available.
        discarded: usize,
    },
    /// The preview ended and the round loop began.
    CombatStarted,
    /// A new round's initiative queue was built.
    RoundStarted {
        /// Round number, starting at 1.
        round: u32,
    },
    /// An attack resolved and its damage was applied.
    AttackResolved {
        /// Round the attack happened in.
        round: u32,
        /// Acting unit.
        attacker: UnitId,
        /// Unit the damage was applied to.
        target: UnitId,
        /// Final damage after mitigation.
        damage: i32,
        /// The attack was absorbed by a shield-wall block.
        blocked: bool,
        /// The flanking bonus applied.
        flanking: bool,
        /// The back-row range penalty applied.
        range_penalty: bool,
        /// Target HP after the hit.
        target_hp: i32,
    },
    /// A living unit found no target and forfeited its turn.
    TurnSkipped {
        /// Round the turn belonged to.
        round: u32,
        /// The unit whose turn became a no-op.
        unit: UnitId,
    },
    /// A unit's HP reached zero.
    UnitDied {
        /// Round the death happened in.
        round: u32,
        /// The unit that died.
        unit: UnitId,
    },
    /// The round's queue drained and the dead were swept.
    RoundEnded {
        /// Round number.
        round: u32,
        /// Living allies after the sweep.
        allies_alive: usize,
        /// Living enemies after the sweep.
        enemies_alive: usize,
    },
    /// The encounter reached its terminal state.
    EncounterComplete {
        /// Which side won.
        outcome: BattleOutcome,
    },
}

/// Condensed result of a finished encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    /// Final outcome.
    pub outcome: BattleOutcome,
    /// Number of rounds fought.
    pub rounds: u32,
    /// Ally survivors.
    pub allies_alive: usize,
    /// Enemy survivors.
    pub enemies_alive: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_predicates() {
        assert!(BattleOutcome::Victory.is_victory());
        assert!(!BattleOutcome::Defeat.is_victory());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(format!("{}", BattleOutcome::Victory), "victory");
        assert_eq!(format!("{}", BattleOutcome::Defeat), "defeat");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = CombatEvent::AttackResolved {
            round: 2,
            attacker: UnitId::new(0),
            target: UnitId::new(3),
            damage: 8,
            blocked: false,
            flanking: true,
            range_penalty: false,
            target_hp: 4,
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: CombatEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event, deserialized);
    }

    #[test]
    fn summary_serialization_roundtrip() {
        let summary = EncounterSummary {
            outcome: BattleOutcome::Defeat,
            rounds: 7,
            allies_alive: 0,
            enemies_alive: 2,
        };

        let json = serde_json::to_string(&summary).unwrap();
        let deserialized: EncounterSummary = serde_json::from_str(&json).unwrap();

        assert_eq!(summary, deserialized);
    }
}
