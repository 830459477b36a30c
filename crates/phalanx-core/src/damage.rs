//! Damage and mitigation calculator.
//!
//! Pure computation of the damage a single attack inflicts, given attacker,
//! defender, and their slot context. Three layered effects apply in a fixed
//! order:
//!
//! 1. **Shield-wall block**: a back-row defender whose same-column front
//!    slot is occupied has a `block_probability` chance to take zero damage.
//!    A successful block short-circuits everything else.
//! 2. **Flanking bonus**: a front-row attacker at either end of its row
//!    deals `x (1 + flanking_bonus)` damage.
//! 3. **Back-row range penalty**: a back-row attacker striking a back-row
//!    defender deals `x back_row_modifier` damage.
//!
//! The multipliers compose multiplicatively; flanking is additive inside its
//! own factor. Final damage is `round(attack x multiplier)`.
//!
//! Setting [`EncounterConfig::position_bonuses`] to `false` disables the
//! whole layer: the calculator returns raw attack power and the block roll
//! never happens, so the RNG stream is untouched.
//!
//! # Purity
//!
//! The only non-deterministic input is the injected [`Rng`]. Two calls with
//! identical unit/slot state and an identically seeded generator return
//! identical outcomes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EncounterConfig;
use crate::grid::{Row, SlotGrid};
use crate::unit::Unit;

/// Result of one damage computation.
///
/// Carries the mitigation detail alongside the final amount so the event
/// log and presentation layer can explain the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Final damage to apply to the defender.
    pub amount: i32,
    /// The attack was fully absorbed by a shield-wall block.
    pub blocked: bool,
    /// The flanking bonus applied.
    pub flanking: bool,
    /// The back-row range penalty applied.
    pub range_penalty: bool,
}

impl DamageOutcome {
    /// An unmodified hit for the given amount.
    #[must_use]
    pub const fn neutral(amount: i32) -> Self {
        Self {
            amount,
            blocked: false,
            flanking: false,
            range_penalty: false,
        }
    }

    const fn blocked() -> Self {
        Self {
            amount: 0,
            blocked: true,
            flanking: false,
            range_penalty: false,
        }
    }
}

/// Computes the damage one attack inflicts.
///
/// Looks up both units' slots in the grid; if either unit currently holds no
/// slot (already removed), all bonuses default to neutral and no block roll
/// happens.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn resolve_attack<R: Rng>(
    attacker: &Unit,
    defender: &Unit,
    grid: &SlotGrid,
    config: &EncounterConfig,
    rng: &mut R,
) -> DamageOutcome {
    let base = attacker.attack();

    if !config.position_bonuses {
        return DamageOutcome::neutral(base);
    }

    let (Some(attacker_slot), Some(defender_slot)) = (
        grid.unit_slot(attacker.id()),
        grid.unit_slot(defender.id()),
    ) else {
        return DamageOutcome::neutral(base);
    };

    // Shield wall: the front-line unit in the defender's column may
    // intercept a strike aimed past it.
    if defender_slot.row == Row::Back {
        let shielded = grid
            .front_slot_in_column(defender_slot.side, defender_slot.index)
            .is_some_and(|slot| slot.occupant().is_some());
        if shielded && rng.gen::<f32>() < config.block_probability {
            return DamageOutcome::blocked();
        }
    }

    let mut multiplier = 1.0_f32;
    let mut flanking = false;
    let mut range_penalty = false;

    if attacker_slot.row == Row::Front
        && (attacker_slot.index == 0 || attacker_slot.index + 1 == grid.row_size())
    {
        multiplier *= 1.0 + config.flanking_bonus;
        flanking = true;
    }

    if attacker_slot.row == Row::Back && defender_slot.row == Row::Back {
        multiplier *= config.back_row_modifier;
        range_penalty = true;
    }

    DamageOutcome {
        amount: (base as f32 * multiplier).round() as i32,
        blocked: false,
        flanking,
        range_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::unit::{Archetype, Side, UnitId, UnitSpec, UnitStats};

    struct Fixture {
        grid: SlotGrid,
        config: EncounterConfig,
        next_id: u64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                grid: SlotGrid::new(&EncounterConfig::default()),
                config: EncounterConfig::default(),
                next_id: 0,
            }
        }

        fn place(&mut self, side: Side, row: Row, index: usize) -> Unit {
            let spec = UnitSpec::new(UnitStats::new(100, 10, 1), Archetype::Bruiser, row);
            let mut unit = Unit::spawn(UnitId::new(self.next_id), side, &spec);
            self.next_id += 1;
            assert!(self.grid.place_unit(&mut unit, row, Some(index)));
            unit
        }

        fn unplaced(&mut self, side: Side) -> Unit {
            let spec = UnitSpec::new(UnitStats::new(100, 10, 1), Archetype::Bruiser, Row::Front);
            let unit = Unit::spawn(UnitId::new(self.next_id), side, &spec);
            self.next_id += 1;
            unit
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    mod flanking_tests {
        use super::*;

        #[test]
        fn applies_at_left_end_of_front_row() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(outcome.flanking);
            assert_eq!(outcome.amount, 15);
        }

        #[test]
        fn applies_at_right_end_of_front_row() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 2);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(outcome.flanking);
            assert_eq!(outcome.amount, 15);
        }

        #[test]
        fn does_not_apply_in_the_middle() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(!outcome.flanking);
            assert_eq!(outcome.amount, 10);
        }

        #[test]
        fn does_not_apply_from_back_row_ends() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Back, 0);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(!outcome.flanking);
            assert_eq!(outcome.amount, 10);
        }
    }

    mod range_penalty_tests {
        use super::*;

        // The block check would interfere with back-row defenders shielded
        // by their column's front slot, so defenders sit in column 0 with
        // that front slot left empty.
        fn outcome_for(attacker_row: Row, defender_row: Row) -> DamageOutcome {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, attacker_row, 1);
            let defender = fx.place(Side::Enemy, defender_row, 0);
            resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng())
        }

        #[test]
        fn applies_only_for_back_row_versus_back_row() {
            let cases = [
                (Row::Front, Row::Front, 10),
                (Row::Front, Row::Back, 10),
                (Row::Back, Row::Front, 10),
                (Row::Back, Row::Back, 8), // 10 x 0.75 rounds to 8
            ];

            for (attacker_row, defender_row, expected) in cases {
                let outcome = outcome_for(attacker_row, defender_row);
                assert_eq!(
                    outcome.amount, expected,
                    "{attacker_row} vs {defender_row}"
                );
                assert_eq!(
                    outcome.range_penalty,
                    expected != 10,
                    "{attacker_row} vs {defender_row}"
                );
            }
        }

        #[test]
        fn stacks_multiplicatively_with_flanking() {
            let mut fx = Fixture::new();
            // Back-row attacker cannot flank, so force the combination the
            // other way: flanking front attacker against a back-row target
            // only multiplies once.
            let attacker = fx.place(Side::Ally, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(outcome.flanking);
            assert!(!outcome.range_penalty);
            assert_eq!(outcome.amount, 15);
        }
    }

    mod shield_wall_tests {
        use super::*;

        #[test]
        fn block_rate_matches_probability() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let _shield = fx.place(Side::Enemy, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let mut rng = rng();
            let trials = 100_000;
            let mut blocks = 0u32;
            for _ in 0..trials {
                let outcome =
                    resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng);
                if outcome.blocked {
                    assert_eq!(outcome.amount, 0);
                    blocks += 1;
                }
            }

            let rate = f64::from(blocks) / f64::from(trials);
            assert!(
                (rate - 0.25).abs() < 0.005,
                "empirical block rate {rate} outside tolerance"
            );
        }

        #[test]
        fn never_blocks_when_front_slot_is_empty() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let mut rng = rng();
            for _ in 0..10_000 {
                let outcome =
                    resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng);
                assert!(!outcome.blocked);
            }
        }

        #[test]
        fn never_blocks_front_row_defenders() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let defender = fx.place(Side::Enemy, Row::Front, 0);

            let mut rng = rng();
            for _ in 0..10_000 {
                let outcome =
                    resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng);
                assert!(!outcome.blocked);
            }
        }

        #[test]
        fn block_short_circuits_other_modifiers() {
            let mut fx = Fixture::new();
            fx.config.block_probability = 1.0;
            // Flanking attacker; the guaranteed block must still zero it.
            let attacker = fx.place(Side::Ally, Row::Front, 0);
            let _shield = fx.place(Side::Enemy, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(outcome.blocked);
            assert!(!outcome.flanking);
            assert_eq!(outcome.amount, 0);
        }
    }

    mod disable_flag_tests {
        use super::*;

        #[test]
        fn disabled_bonuses_return_raw_attack() {
            let mut fx = Fixture::new();
            fx.config.position_bonuses = false;
            let attacker = fx.place(Side::Ally, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert_eq!(outcome, DamageOutcome::neutral(10));
        }

        #[test]
        fn disabled_bonuses_suppress_the_block_roll() {
            let mut fx = Fixture::new();
            fx.config.position_bonuses = false;
            fx.config.block_probability = 1.0;
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let _shield = fx.place(Side::Enemy, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert!(!outcome.blocked);
            assert_eq!(outcome.amount, 10);
        }
    }

    mod slotless_tests {
        use super::*;

        #[test]
        fn slotless_attacker_is_neutral() {
            let mut fx = Fixture::new();
            let attacker = fx.unplaced(Side::Ally);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert_eq!(outcome, DamageOutcome::neutral(10));
        }

        #[test]
        fn slotless_defender_is_neutral() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 0);
            let defender = fx.unplaced(Side::Enemy);

            let outcome = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert_eq!(outcome, DamageOutcome::neutral(10));
        }
    }

    mod purity_tests {
        use super::*;

        #[test]
        fn identical_state_and_seed_give_identical_outcomes() {
            let mut fx = Fixture::new();
            let attacker = fx.place(Side::Ally, Row::Front, 1);
            let _shield = fx.place(Side::Enemy, Row::Front, 0);
            let defender = fx.place(Side::Enemy, Row::Back, 0);

            let run = |seed: u64| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..64)
                    .map(|_| resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng))
                    .collect::<Vec<_>>()
            };

            assert_eq!(run(7), run(7));
        }

        #[test]
        fn unit_positions_do_not_leak_into_damage() {
            // Damage depends on slots, not on where the unit happens to
            // stand in the world.
            let mut fx = Fixture::new();
            let mut attacker = fx.place(Side::Ally, Row::Front, 1);
            let defender = fx.place(Side::Enemy, Row::Front, 1);

            let before = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());
            attacker.set_position(Vec2::new(500.0, 500.0));
            let after = resolve_attack(&attacker, &defender, &fx.grid, &fx.config, &mut rng());

            assert_eq!(before, after);
        }
    }
}
