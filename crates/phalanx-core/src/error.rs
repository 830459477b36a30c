//! Error types for the combat core.
//!
//! Only programmer errors surface as [`EncounterError`]: calling an
//! operation in the wrong state, or misusing the presentation rendezvous
//! protocol. Expected in-combat failures never reach this enum — a failed
//! placement returns `false` and the unit is discarded, and a unit with no
//! valid target simply forfeits its turn.

use thiserror::Error;

use crate::encounter::CombatState;

/// Precondition violations raised by the encounter state machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncounterError {
    /// An operation was invoked in the wrong state.
    #[error("operation requires the {expected:?} state, encounter is {actual:?}")]
    InvalidState {
        /// State the operation is valid in.
        expected: CombatState,
        /// State the encounter was actually in.
        actual: CombatState,
    },

    /// Combat was started with no units staged on either side.
    #[error("cannot start combat with no units staged")]
    NoUnitsStaged,

    /// `step` was called while an attack is awaiting presentation.
    #[error("an attack is awaiting presentation; confirm its impact and complete the action")]
    PresentationPending,

    /// `confirm_impact` or `complete_action` was called with nothing staged.
    #[error("no attack is awaiting presentation")]
    NoPendingAttack,

    /// `complete_action` was called before the staged attack's impact was
    /// confirmed.
    #[error("the staged attack's impact has not been confirmed")]
    ImpactNotConfirmed,

    /// `confirm_impact` was called twice for the same staged attack.
    #[error("the staged attack's impact was already confirmed")]
    ImpactAlreadyConfirmed,
}
