//! # Phalanx Core
//!
//! Positional combat resolution for a wave-based autobattler.
//!
//! Given two rosters of units placed on a two-row-per-side slot grid, the
//! engine runs discrete combat rounds, selects targets per unit according to
//! per-archetype strategies, computes damage with positional modifiers, and
//! drives the encounter to a win/loss outcome.
//!
//! ## Architecture
//!
//! - **Slot grid** ([`grid`]): exclusive occupancy over a fixed set of
//!   positional slots, nearest-empty search, row views
//! - **Units** ([`unit`]): combat entities with HP, attack, speed, and a
//!   targeting archetype
//! - **Damage calculator** ([`damage`]): pure function with flanking bonus,
//!   back-row range penalty, and a probabilistic shield-wall block
//! - **Targeting resolver** ([`targeting`]): five pure per-archetype
//!   strategies over the opposing side's occupied slots
//! - **Initiative scheduler** ([`initiative`]): per-round, speed-sorted,
//!   stably ordered action queue
//! - **Encounter** ([`encounter`]): the wave/combat state machine tying it
//!   all together, with an event log ([`event`]) as its observable surface
//!
//! ## Determinism
//!
//! The simulation is deterministic: unit storage iterates in ID order, the
//! initiative sort is stable, targeting tie-breaks are first-encountered,
//! and the only randomness (the shield-wall block) flows through a generator
//! seeded at encounter construction. Same seed, same staging, same result.
//!
//! ## Usage
//!
//! ```
//! use phalanx_core::config::EncounterConfig;
//! use phalanx_core::encounter::Encounter;
//! use phalanx_core::grid::Row;
//! use phalanx_core::unit::{Archetype, UnitSpec, UnitStats};
//!
//! let mut encounter = Encounter::new(EncounterConfig::default(), 7);
//! encounter.stage_wave(
//!     &[UnitSpec::new(UnitStats::new(30, 6, 2), Archetype::Bruiser, Row::Front)],
//!     &[UnitSpec::new(UnitStats::new(12, 2, 1), Archetype::Archer, Row::Back)],
//! )?;
//! encounter.start_combat()?;
//! let summary = encounter.run_to_completion()?;
//!
//! assert!(summary.outcome.is_victory());
//! # Ok::<(), phalanx_core::error::EncounterError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod damage;
pub mod encounter;
pub mod error;
pub mod event;
pub mod grid;
pub mod initiative;
pub mod targeting;
pub mod unit;

#[cfg(test)]
mod tests;

pub use config::EncounterConfig;
pub use damage::DamageOutcome;
pub use encounter::{CombatState, Encounter, StepOutcome};
pub use error::EncounterError;
pub use event::{BattleOutcome, CombatEvent, EncounterSummary};
pub use grid::{Row, SlotGrid, SlotId};
pub use unit::{Archetype, Side, Unit, UnitId, UnitSpec, UnitStats};
