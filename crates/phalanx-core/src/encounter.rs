//! Encounter state machine and round loop.
//!
//! The [`Encounter`] orchestrates one wave of combat: it places spawned
//! units into the slot grid, drives the initiative-ordered round loop, and
//! detects the win/loss outcome.
//!
//! # State machine
//!
//! ```text
//! Preparing <-> Preview -> Fighting -> Complete
//! ```
//!
//! - `Preparing -> Preview`: [`Encounter::stage_wave`] places both rosters.
//!   Restaging loops back through the same pair of states until combat
//!   starts.
//! - `Preview -> Fighting`: [`Encounter::start_combat`]. Manual
//!   repositioning of allied units is disabled at this transition.
//! - `Fighting` self-loops through rounds until one side's living-unit
//!   count reaches zero, then moves to the terminal `Complete` state.
//!
//! # Stepping
//!
//! The round loop is advanced by [`Encounter::step`], which performs exactly
//! one unit of work per call: start a round, resolve one unit's turn, or end
//! a round. The core is logically single-threaded and cooperative — there is
//! no parallelism between turns, and a round's queue fully drains before the
//! termination check runs.
//!
//! # Presentation rendezvous
//!
//! Rather than suspending on animation callbacks, "waiting for presentation"
//! is an explicit machine state. In presentation-paced mode a resolved
//! attack is staged ([`StepOutcome::AttackStaged`]) without touching any HP;
//! the driver applies the damage at the visual impact moment via
//! [`Encounter::confirm_impact`] and releases the turn with
//! [`Encounter::complete_action`]. Without pacing, damage applies
//! immediately inside `step` and nothing waits.
//!
//! # Example
//!
//! ```
//! use phalanx_core::config::EncounterConfig;
//! use phalanx_core::encounter::Encounter;
//! use phalanx_core::grid::Row;
//! use phalanx_core::unit::{Archetype, UnitSpec, UnitStats};
//!
//! let mut encounter = Encounter::new(EncounterConfig::default(), 42);
//! let ally = UnitSpec::new(UnitStats::new(20, 5, 2), Archetype::Bruiser, Row::Front);
//! let enemy = UnitSpec::new(UnitStats::new(10, 3, 1), Archetype::Bruiser, Row::Front);
//!
//! encounter.stage_wave(&[ally], &[enemy]).unwrap();
//! encounter.start_combat().unwrap();
//! let summary = encounter.run_to_completion().unwrap();
//!
//! assert!(summary.outcome.is_victory());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::EncounterConfig;
use crate::damage::{resolve_attack, DamageOutcome};
use crate::error::EncounterError;
use crate::event::{BattleOutcome, CombatEvent, EncounterSummary};
use crate::grid::{Row, SlotGrid, SlotId};
use crate::initiative::InitiativeQueue;
use crate::targeting::{select_target, TargetView};
use crate::unit::{Side, Unit, UnitId, UnitSpec};

/// Lifecycle state of an encounter.
///
/// Transitions are one-directional except `Preparing <-> Preview`, which may
/// loop while a wave is (re)previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    /// No wave staged yet.
    Preparing,
    /// Rosters are placed; allied units may still be repositioned.
    Preview,
    /// The round loop is running.
    Fighting,
    /// Terminal; the outcome has been recorded.
    Complete,
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => write!(f, "preparing"),
            Self::Preview => write!(f, "preview"),
            Self::Fighting => write!(f, "fighting"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Internal position within a fighting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnPhase {
    /// The next `step` builds a fresh initiative queue.
    RoundPending,
    /// The next `step` drains one entry from the current queue.
    Acting,
}

/// An attack staged for presentation, damage not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttack {
    /// Acting unit.
    pub attacker: UnitId,
    /// Chosen target.
    pub target: UnitId,
    /// Computed damage awaiting application.
    pub outcome: DamageOutcome,
    impact_applied: bool,
}

/// Result of applying a staged or immediate attack to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackImpact {
    /// Target HP after the hit.
    pub target_hp: i32,
    /// The hit dropped the target to zero.
    pub target_died: bool,
}

/// Result of staging a wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveReport {
    /// Ally units successfully placed.
    pub allies_placed: usize,
    /// Enemy units successfully placed.
    pub enemies_placed: usize,
    /// Units discarded because no slot was available.
    pub discarded: usize,
}

/// One unit of work performed by [`Encounter::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// A new round began and its initiative queue was built.
    RoundStarted {
        /// Round number, starting at 1.
        round: u32,
    },
    /// A turn resolved and its damage was applied immediately.
    ActionResolved {
        /// Acting unit.
        attacker: UnitId,
        /// Unit the damage was applied to.
        target: UnitId,
        /// Final damage after mitigation.
        damage: i32,
        /// The hit dropped the target to zero.
        target_died: bool,
    },
    /// A turn resolved in presentation-paced mode; damage is pending.
    AttackStaged {
        /// Acting unit.
        attacker: UnitId,
        /// Chosen target.
        target: UnitId,
        /// Damage that [`Encounter::confirm_impact`] will apply.
        damage: i32,
    },
    /// A living unit found no target; its turn was a no-op.
    TurnSkipped {
        /// The unit that forfeited its turn.
        unit: UnitId,
    },
    /// The round's queue drained without ending the encounter.
    RoundEnded {
        /// Round number.
        round: u32,
        /// Pacing hint for the driver; the core does not sleep.
        inter_round_delay: f32,
    },
    /// The encounter reached its terminal state.
    Finished(BattleOutcome),
}

/// Serializable view of an encounter for inspection and replay tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    /// Lifecycle state at snapshot time.
    pub state: CombatState,
    /// Rounds started so far.
    pub round: u32,
    /// Master seed the encounter was created with.
    pub seed: u64,
    /// All units still in the roster.
    pub units: Vec<Unit>,
    /// Occupied slots and their occupants.
    pub occupancy: Vec<(SlotId, UnitId)>,
    /// Full combat log so far.
    pub events: Vec<CombatEvent>,
}

type WaveHandoff = Box<dyn FnMut(BattleOutcome) + Send>;

/// One wave's combat, from staging to outcome.
///
/// The encounter owns the roster and the slot grid; collaborators interact
/// through [`Encounter::stage_wave`], the step loop, and the event log. All
/// randomness flows through a seeded generator, so identical seeds and
/// staging produce identical encounters.
pub struct Encounter {
    config: EncounterConfig,
    grid: SlotGrid,
    units: BTreeMap<UnitId, Unit>,
    next_unit_id: u64,
    state: CombatState,
    round: u32,
    queue: InitiativeQueue,
    phase: TurnPhase,
    pending: Option<PendingAttack>,
    presentation_paced: bool,
    rng: ChaCha8Rng,
    events: Vec<CombatEvent>,
    outcome: Option<BattleOutcome>,
    on_complete: Option<WaveHandoff>,
    seed: u64,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("state", &self.state)
            .field("round", &self.round)
            .field("units", &self.units.len())
            .field("pending", &self.pending)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl Encounter {
    /// Creates an encounter in the `Preparing` state.
    ///
    /// `seed` drives every random roll in the encounter (currently only the
    /// shield-wall block check).
    #[must_use]
    pub fn new(config: EncounterConfig, seed: u64) -> Self {
        info!(seed, row_size = config.row_size, "encounter created");
        Self {
            grid: SlotGrid::new(&config),
            config,
            units: BTreeMap::new(),
            next_unit_id: 0,
            state: CombatState::Preparing,
            round: 0,
            queue: InitiativeQueue::default(),
            phase: TurnPhase::RoundPending,
            pending: None,
            presentation_paced: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
            outcome: None,
            on_complete: None,
            seed,
        }
    }

    /// Registers the wave-progression collaborator.
    ///
    /// The callback fires exactly once, with the boolean-equivalent outcome,
    /// when the encounter reaches `Complete`. Reward granting and scene
    /// transitions live behind it, outside this core.
    pub fn set_wave_handoff<F>(&mut self, handoff: F)
    where
        F: FnMut(BattleOutcome) + Send + 'static,
    {
        self.on_complete = Some(Box::new(handoff));
    }

    /// Switches between immediate damage application and the presentation
    /// rendezvous. Takes effect from the next resolved attack.
    pub fn set_presentation_paced(&mut self, paced: bool) {
        self.presentation_paced = paced;
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CombatState {
        self.state
    }

    /// Returns the number of rounds started so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Returns the encounter configuration.
    #[must_use]
    pub const fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Returns the slot grid.
    #[must_use]
    pub const fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Returns a unit by ID, if it is still in the roster.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Returns all roster units in ID order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values()
    }

    /// Returns the number of living units on a side.
    #[must_use]
    pub fn living_count(&self, side: Side) -> usize {
        self.units
            .values()
            .filter(|u| u.side() == side && u.is_alive())
            .count()
    }

    /// Returns the combat log so far.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Returns the attack staged for presentation, if any.
    #[must_use]
    pub const fn pending_attack(&self) -> Option<&PendingAttack> {
        self.pending.as_ref()
    }

    /// Returns the recorded outcome once the encounter is complete.
    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Returns the master seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the condensed result of a finished encounter.
    #[must_use]
    pub fn summary(&self) -> Option<EncounterSummary> {
        self.outcome.map(|outcome| EncounterSummary {
            outcome,
            rounds: self.round,
            allies_alive: self.living_count(Side::Ally),
            enemies_alive: self.living_count(Side::Enemy),
        })
    }

    /// Returns a serializable view of the current encounter state.
    #[must_use]
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            state: self.state,
            round: self.round,
            seed: self.seed,
            units: self.units.values().cloned().collect(),
            occupancy: self
                .grid
                .slots()
                .filter_map(|s| s.occupant().map(|u| (s.id(), u)))
                .collect(),
            events: self.events.clone(),
        }
    }

    /// Stages a wave: spawns both rosters and places them into the grid.
    ///
    /// Valid in `Preparing` or `Preview`; restaging replaces the previous
    /// preview entirely. The core only places what it is given — allies
    /// first, then enemies, each in the order supplied by the roster
    /// provider. A unit whose placement fails (both rows full) is silently
    /// discarded and counted in the report; it never enters combat.
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidState`] once combat has started.
    pub fn stage_wave(
        &mut self,
        allies: &[UnitSpec],
        enemies: &[UnitSpec],
    ) -> Result<WaveReport, EncounterError> {
        match self.state {
            CombatState::Preparing | CombatState::Preview => {}
            actual => {
                return Err(EncounterError::InvalidState {
                    expected: CombatState::Preparing,
                    actual,
                })
            }
        }

        self.units.clear();
        self.grid = SlotGrid::new(&self.config);

        let mut report = WaveReport::default();
        for spec in allies {
            if self.spawn_into_grid(Side::Ally, spec) {
                report.allies_placed += 1;
            } else {
                report.discarded += 1;
            }
        }
        for spec in enemies {
            if self.spawn_into_grid(Side::Enemy, spec) {
                report.enemies_placed += 1;
            } else {
                report.discarded += 1;
            }
        }

        self.state = CombatState::Preview;
        self.events.push(CombatEvent::WaveStaged {
            allies: report.allies_placed,
            enemies: report.enemies_placed,
            discarded: report.discarded,
        });
        info!(
            allies = report.allies_placed,
            enemies = report.enemies_placed,
            discarded = report.discarded,
            "wave staged"
        );
        Ok(report)
    }

    fn spawn_into_grid(&mut self, side: Side, spec: &UnitSpec) -> bool {
        let id = UnitId::new(self.next_unit_id);
        let mut unit = Unit::spawn(id, side, spec);
        if self.grid.place_unit(&mut unit, spec.preferred_row, None) {
            self.next_unit_id += 1;
            self.units.insert(id, unit);
            true
        } else {
            debug!(%side, "placement failed, unit discarded");
            false
        }
    }

    /// Moves an allied unit to an explicit empty slot during the preview.
    ///
    /// Returns `false` without mutating anything if the unit is unknown, not
    /// allied, or the requested slot is occupied or out of range.
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidState`] outside `Preview` — repositioning is
    /// locked once combat starts.
    pub fn reposition_unit(
        &mut self,
        unit_id: UnitId,
        row: Row,
        index: usize,
    ) -> Result<bool, EncounterError> {
        if self.state != CombatState::Preview {
            return Err(EncounterError::InvalidState {
                expected: CombatState::Preview,
                actual: self.state,
            });
        }
        match self.units.get(&unit_id) {
            Some(unit) if unit.side() == Side::Ally => {}
            _ => return Ok(false),
        }
        let target = SlotId::new(Side::Ally, row, index);
        if !self.grid.slot(target).is_some_and(|slot| slot.is_empty()) {
            return Ok(false);
        }

        self.grid.remove_unit(unit_id);
        let Some(unit) = self.units.get_mut(&unit_id) else {
            return Ok(false);
        };
        Ok(self.grid.place_unit(unit, row, Some(index)))
    }

    /// Locks placement and enters the round loop.
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidState`] outside `Preview`;
    /// [`EncounterError::NoUnitsStaged`] if the staged wave left no units at
    /// all — running the scheduler with nothing placed is a programmer
    /// error, unlike a one-sided wave, which completes on its first round.
    pub fn start_combat(&mut self) -> Result<(), EncounterError> {
        if self.state != CombatState::Preview {
            return Err(EncounterError::InvalidState {
                expected: CombatState::Preview,
                actual: self.state,
            });
        }
        if self.units.is_empty() {
            return Err(EncounterError::NoUnitsStaged);
        }

        self.state = CombatState::Fighting;
        self.phase = TurnPhase::RoundPending;
        self.events.push(CombatEvent::CombatStarted);
        info!(
            allies = self.living_count(Side::Ally),
            enemies = self.living_count(Side::Enemy),
            "combat started"
        );
        Ok(())
    }

    /// Advances the round loop by one unit of work.
    ///
    /// Each call performs exactly one of: building the next round's
    /// initiative queue, resolving one queued unit's turn, or ending the
    /// round (sweeping the dead and checking for termination). Dead entries
    /// in the queue are skipped without consuming a call.
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidState`] outside `Fighting`;
    /// [`EncounterError::PresentationPending`] while a staged attack has not
    /// been completed.
    pub fn step(&mut self) -> Result<StepOutcome, EncounterError> {
        if self.state != CombatState::Fighting {
            return Err(EncounterError::InvalidState {
                expected: CombatState::Fighting,
                actual: self.state,
            });
        }
        if self.pending.is_some() {
            return Err(EncounterError::PresentationPending);
        }

        match self.phase {
            TurnPhase::RoundPending => Ok(self.begin_round()),
            TurnPhase::Acting => Ok(self.advance_turn()),
        }
    }

    /// Applies the staged attack's damage at the visual impact moment.
    ///
    /// This is the rendezvous point that keeps HP mutation in sync with the
    /// presentation layer's feedback.
    ///
    /// # Errors
    ///
    /// [`EncounterError::NoPendingAttack`] with nothing staged;
    /// [`EncounterError::ImpactAlreadyConfirmed`] on a second call.
    pub fn confirm_impact(&mut self) -> Result<AttackImpact, EncounterError> {
        let Some(pending) = self.pending else {
            return Err(EncounterError::NoPendingAttack);
        };
        if pending.impact_applied {
            return Err(EncounterError::ImpactAlreadyConfirmed);
        }

        let impact = self.apply_attack(pending.attacker, pending.target, pending.outcome);
        self.pending = Some(PendingAttack {
            impact_applied: true,
            ..pending
        });
        Ok(impact)
    }

    /// Releases the staged attack so the queue can advance.
    ///
    /// # Errors
    ///
    /// [`EncounterError::NoPendingAttack`] with nothing staged;
    /// [`EncounterError::ImpactNotConfirmed`] if the damage was never
    /// applied.
    pub fn complete_action(&mut self) -> Result<(), EncounterError> {
        match self.pending {
            None => Err(EncounterError::NoPendingAttack),
            Some(pending) if !pending.impact_applied => Err(EncounterError::ImpactNotConfirmed),
            Some(_) => {
                self.pending = None;
                Ok(())
            }
        }
    }

    /// Drives the encounter until it completes and returns the summary.
    ///
    /// Staged attacks are confirmed and completed immediately, so this works
    /// in either pacing mode.
    ///
    /// # Errors
    ///
    /// Propagates [`Encounter::step`] preconditions — in particular, combat
    /// must have been started.
    pub fn run_to_completion(&mut self) -> Result<EncounterSummary, EncounterError> {
        loop {
            match self.step()? {
                StepOutcome::AttackStaged { .. } => {
                    self.confirm_impact()?;
                    self.complete_action()?;
                }
                StepOutcome::Finished(outcome) => {
                    return Ok(EncounterSummary {
                        outcome,
                        rounds: self.round,
                        allies_alive: self.living_count(Side::Ally),
                        enemies_alive: self.living_count(Side::Enemy),
                    });
                }
                _ => {}
            }
        }
    }

    fn begin_round(&mut self) -> StepOutcome {
        self.round += 1;
        self.queue = InitiativeQueue::build(&self.units);
        trace!(round = self.round, order = ?self.queue.order(), "initiative queue built");
        self.events.push(CombatEvent::RoundStarted { round: self.round });
        self.phase = TurnPhase::Acting;
        StepOutcome::RoundStarted { round: self.round }
    }

    fn advance_turn(&mut self) -> StepOutcome {
        loop {
            let Some(actor_id) = self.queue.next() else {
                return self.finish_round();
            };

            // Queued at round start, possibly dead by now: skip without
            // consuming a turn.
            let Some(actor) = self.units.get(&actor_id) else {
                continue;
            };
            if !actor.is_alive() {
                continue;
            }

            let view = TargetView::of_side(&self.grid, &self.units, actor.side().opponent());
            let Some(target_id) = select_target(actor.archetype(), &view) else {
                self.events.push(CombatEvent::TurnSkipped {
                    round: self.round,
                    unit: actor_id,
                });
                debug!(unit = %actor_id, "no valid target, turn skipped");
                return StepOutcome::TurnSkipped { unit: actor_id };
            };
            let Some(target) = self.units.get(&target_id) else {
                continue;
            };

            let outcome = resolve_attack(actor, target, &self.grid, &self.config, &mut self.rng);

            if self.presentation_paced {
                self.pending = Some(PendingAttack {
                    attacker: actor_id,
                    target: target_id,
                    outcome,
                    impact_applied: false,
                });
                debug!(
                    attacker = %actor_id,
                    target = %target_id,
                    damage = outcome.amount,
                    "attack staged for presentation"
                );
                return StepOutcome::AttackStaged {
                    attacker: actor_id,
                    target: target_id,
                    damage: outcome.amount,
                };
            }

            let impact = self.apply_attack(actor_id, target_id, outcome);
            return StepOutcome::ActionResolved {
                attacker: actor_id,
                target: target_id,
                damage: outcome.amount,
                target_died: impact.target_died,
            };
        }
    }

    fn apply_attack(
        &mut self,
        attacker: UnitId,
        target: UnitId,
        outcome: DamageOutcome,
    ) -> AttackImpact {
        let (target_hp, target_died) = match self.units.get_mut(&target) {
            Some(unit) => {
                let was_alive = unit.is_alive();
                let hp = unit.apply_damage(outcome.amount);
                (hp, was_alive && !unit.is_alive())
            }
            None => (0, false),
        };

        self.events.push(CombatEvent::AttackResolved {
            round: self.round,
            attacker,
            target,
            damage: outcome.amount,
            blocked: outcome.blocked,
            flanking: outcome.flanking,
            range_penalty: outcome.range_penalty,
            target_hp,
        });
        debug!(
            %attacker,
            %target,
            damage = outcome.amount,
            blocked = outcome.blocked,
            "attack resolved"
        );
        if target_died {
            self.events.push(CombatEvent::UnitDied {
                round: self.round,
                unit: target,
            });
            debug!(unit = %target, "unit died");
        }

        AttackImpact {
            target_hp,
            target_died,
        }
    }

    fn finish_round(&mut self) -> StepOutcome {
        let dead: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| !u.is_alive())
            .map(|u| u.id())
            .collect();
        for id in dead {
            self.grid.remove_unit(id);
            self.units.remove(&id);
        }

        let allies_alive = self.living_count(Side::Ally);
        let enemies_alive = self.living_count(Side::Enemy);
        self.events.push(CombatEvent::RoundEnded {
            round: self.round,
            allies_alive,
            enemies_alive,
        });
        debug!(round = self.round, allies_alive, enemies_alive, "round ended");

        // Allies are checked first: a simultaneous wipe counts as a defeat.
        if allies_alive == 0 {
            return self.finish(BattleOutcome::Defeat);
        }
        if enemies_alive == 0 {
            return self.finish(BattleOutcome::Victory);
        }

        self.phase = TurnPhase::RoundPending;
        StepOutcome::RoundEnded {
            round: self.round,
            inter_round_delay: self.config.inter_round_delay,
        }
    }

    fn finish(&mut self, outcome: BattleOutcome) -> StepOutcome {
        self.state = CombatState::Complete;
        self.outcome = Some(outcome);
        self.events.push(CombatEvent::EncounterComplete { outcome });
        info!(%outcome, rounds = self.round, "encounter complete");
        if let Some(mut handoff) = self.on_complete.take() {
            handoff(outcome);
        }
        StepOutcome::Finished(outcome)
    }

    #[cfg(test)]
    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }
}
