//! Error types for engagement resolution.
//!
//! Apart from [`GameError::Serialization`], every variant is a precondition
//! violation: inputs are rejected before any simulation state exists, so a
//! failed call never yields partial results. Annihilation and draws are
//! regular outcomes, not errors.

use thiserror::Error;

use crate::division::DivisionKind;
use crate::modifiers::Role;
use crate::side::Side;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the force model and the engagement simulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A division mix with no divisions has no manpower to average over.
    #[error("Division mix is empty: at least one division is required")]
    EmptyDivisionMix,

    /// Experience tier outside 1..=5.
    #[error("Invalid experience tier {0}: expected 1 to 5")]
    InvalidExperience(u8),

    /// Morale must be finite and strictly positive.
    #[error("Invalid morale {0}: must be finite and greater than zero")]
    InvalidMorale(f64),

    /// A multiplicative buff is not a finite number.
    #[error("Invalid buff '{name}': factor {factor} is not finite")]
    InvalidBuff {
        /// Buff label.
        name: String,
        /// Offending factor.
        factor: f64,
    },

    /// Reinforcement wave with an unusable distance or speed correction.
    #[error(
        "Invalid {division:?} reinforcement wave: distance {distance}, speed correction {speed_correction}"
    )]
    InvalidReinforcement {
        /// Parent division type of the wave.
        division: DivisionKind,
        /// Distance to the battlefield.
        distance: f64,
        /// March speed correction.
        speed_correction: f64,
    },

    /// Initial troop count must be finite and strictly positive.
    #[error("Invalid initial troops for {side}: {value}")]
    InvalidTroops {
        /// Side the value belongs to.
        side: Side,
        /// Offending troop count.
        value: f64,
    },

    /// A per-side rate or threshold is negative or not finite.
    #[error("Invalid {parameter} for {side}: {value}")]
    InvalidParameter {
        /// Side the value belongs to.
        side: Side,
        /// Parameter name.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The engagement must run for at least one day.
    #[error("Engagement horizon must be at least one day")]
    ZeroHorizon,

    /// Reinforcement timeline shorter than the horizon.
    #[error("Reinforcement timeline for {side} covers {len} days, horizon is {horizon}")]
    TimelineTooShort {
        /// Side the timeline belongs to.
        side: Side,
        /// Timeline length.
        len: usize,
        /// Requested horizon.
        horizon: u32,
    },

    /// A timeline entry has negative or non-finite troops or strength.
    #[error("Invalid reinforcement on day {day} for {side}: troops {troops}, strength {strength}")]
    InvalidTimelineEntry {
        /// Side the timeline belongs to.
        side: Side,
        /// Day index of the entry.
        day: usize,
        /// Reinforcement troops.
        troops: f64,
        /// Reinforcement strength factor.
        strength: f64,
    },

    /// An army was placed on a side that does not match its combat role.
    #[error("The {side} cannot fight in the {role:?} role")]
    RoleMismatch {
        /// Side the army was assigned to.
        side: Side,
        /// Role declared by the army's modifiers.
        role: Role,
    },

    /// Report encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
