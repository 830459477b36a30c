//! Test helper functions for staging encounters.
//!
//! Factory functions and setup utilities shared by the determinism and
//! integration tests.

use crate::config::EncounterConfig;
use crate::encounter::Encounter;
use crate::grid::Row;
use crate::unit::{Archetype, UnitSpec, UnitStats};

/// Installs a test-writer tracing subscriber for the current test binary.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Default config with positional damage logic switched off.
///
/// Used by scenarios that assert raw damage numbers.
pub fn raw_config() -> EncounterConfig {
    EncounterConfig {
        position_bonuses: false,
        ..EncounterConfig::default()
    }
}

/// Builds a spawn descriptor in one line.
pub fn spec(archetype: Archetype, row: Row, hp: i32, attack: i32, speed: u32) -> UnitSpec {
    UnitSpec::new(UnitStats::new(hp, attack, speed), archetype, row)
}

/// Stages a wave and starts combat, ready for stepping.
pub fn fighting_encounter(
    config: EncounterConfig,
    seed: u64,
    allies: &[UnitSpec],
    enemies: &[UnitSpec],
) -> Encounter {
    let mut encounter = Encounter::new(config, seed);
    encounter
        .stage_wave(allies, enemies)
        .expect("staging a fresh encounter cannot fail");
    encounter
        .start_combat()
        .expect("starting a staged encounter cannot fail");
    encounter
}

/// A balanced mixed-archetype wave used by the larger scenarios.
pub fn mixed_wave() -> Vec<UnitSpec> {
    vec![
        spec(Archetype::Bruiser, Row::Front, 30, 5, 4),
        spec(Archetype::Assassin, Row::Front, 22, 6, 6),
        spec(Archetype::Bomber, Row::Front, 26, 4, 3),
        spec(Archetype::Archer, Row::Back, 18, 4, 2),
        spec(Archetype::Sniper, Row::Back, 16, 7, 1),
        spec(Archetype::Archer, Row::Back, 18, 3, 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::CombatState;
    use crate::unit::Side;

    #[test]
    fn fighting_encounter_is_ready_to_step() {
        let encounter = fighting_encounter(
            raw_config(),
            1,
            &[spec(Archetype::Bruiser, Row::Front, 10, 2, 1)],
            &[spec(Archetype::Bruiser, Row::Front, 10, 2, 1)],
        );

        assert_eq!(encounter.state(), CombatState::Fighting);
        assert_eq!(encounter.living_count(Side::Ally), 1);
        assert_eq!(encounter.living_count(Side::Enemy), 1);
    }

    #[test]
    fn mixed_wave_fills_one_side() {
        let mut encounter = Encounter::new(EncounterConfig::default(), 1);
        let report = encounter.stage_wave(&mixed_wave(), &[]).unwrap();

        assert_eq!(report.allies_placed, 6);
        assert_eq!(report.discarded, 0);
    }
}
