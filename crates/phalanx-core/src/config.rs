//! Encounter configuration.
//!
//! All numeric tunables consumed by the combat core are collected in
//! [`EncounterConfig`] and injected at construction time. The core never
//! reaches into ambient global state to determine row sizes, bonuses, or
//! pacing; a host that wants different balance values builds a different
//! config.
//!
//! # Example
//!
//! ```
//! use phalanx_core::config::EncounterConfig;
//!
//! let mut config = EncounterConfig::default();
//! config.row_size = 4;
//! config.position_bonuses = false;
//!
//! assert_eq!(config.side_capacity(), 8);
//! ```

use serde::{Deserialize, Serialize};

/// Default number of columns per row.
pub const DEFAULT_ROW_SIZE: usize = 3;

/// Default horizontal distance between adjacent slots in a row.
pub const DEFAULT_SLOT_SPACING: f32 = 2.0;

/// Default distance between a side's front and back rows.
pub const DEFAULT_ROW_SPACING: f32 = 1.5;

/// Default distance between the two sides' front rows.
pub const DEFAULT_SIDE_GAP: f32 = 3.0;

/// Default flanking damage bonus for front-row attackers at a row end.
pub const DEFAULT_FLANKING_BONUS: f32 = 0.5;

/// Default damage multiplier for back-row attackers striking back-row targets.
pub const DEFAULT_BACK_ROW_MODIFIER: f32 = 0.75;

/// Default probability that a front-row unit blocks a strike aimed at the
/// back-row unit behind it.
pub const DEFAULT_BLOCK_PROBABILITY: f32 = 0.25;

/// Default pause between rounds, in seconds. Consumed by the driver, not the
/// core; see [`crate::encounter::StepOutcome::RoundEnded`].
pub const DEFAULT_INTER_ROUND_DELAY: f32 = 1.0;

/// Numeric tunables for one encounter.
///
/// # Fields
///
/// Grid geometry (`row_size`, `slot_spacing`, `row_spacing`, `side_gap`)
/// fixes slot world positions for the whole encounter. Combat modifiers
/// (`flanking_bonus`, `back_row_modifier`, `block_probability`) feed the
/// damage calculator. `position_bonuses` is the global kill switch: when
/// `false` the calculator returns raw attack power and the block check never
/// fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Columns per row. Both rows on both sides share this width.
    pub row_size: usize,
    /// Horizontal distance between adjacent slots in a row.
    pub slot_spacing: f32,
    /// Distance between a side's front and back rows.
    pub row_spacing: f32,
    /// Distance between the two sides' front rows.
    pub side_gap: f32,
    /// Additive damage bonus for front-row attackers at a row end.
    ///
    /// Applied as `x (1 + flanking_bonus)`.
    pub flanking_bonus: f32,
    /// Damage multiplier when both attacker and defender sit in back rows.
    ///
    /// Values below 1.0 are a penalty.
    pub back_row_modifier: f32,
    /// Chance that an occupied front-row slot blocks a strike aimed at the
    /// back-row slot in the same column.
    pub block_probability: f32,
    /// Pause between rounds, in seconds. Pacing data for the driver.
    pub inter_round_delay: f32,
    /// Master switch for all positional damage logic.
    pub position_bonuses: bool,
}

impl EncounterConfig {
    /// Returns the total number of slots available to one side.
    #[must_use]
    pub const fn side_capacity(&self) -> usize {
        self.row_size * 2
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            row_size: DEFAULT_ROW_SIZE,
            slot_spacing: DEFAULT_SLOT_SPACING,
            row_spacing: DEFAULT_ROW_SPACING,
            side_gap: DEFAULT_SIDE_GAP,
            flanking_bonus: DEFAULT_FLANKING_BONUS,
            back_row_modifier: DEFAULT_BACK_ROW_MODIFIER,
            block_probability: DEFAULT_BLOCK_PROBABILITY,
            inter_round_delay: DEFAULT_INTER_ROUND_DELAY,
            position_bonuses: true,
        }
    }
}
