//! # Warcalc Core
//!
//! Deterministic engagement resolution for a grand-strategy wargame.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//!
//! Identical inputs produce bit-identical reports, and every engagement is an
//! independent value computation, so many battles can be resolved in
//! parallel without coordination.
//!
//! ## Crate Structure
//!
//! - [`division`] - Division mix and aggregate force
//! - [`modifiers`] - Terrain, experience, morale and buff tables
//! - [`reinforcement`] - Regiment marches and the daily arrival timeline
//! - [`army`] - A side's full description, reduced to simulator input
//! - [`engagement`] - The day-stepped attrition simulator
//! - [`report`] - Outcome, losses and summary lines

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod army;
pub mod division;
pub mod engagement;
pub mod error;
pub mod modifiers;
pub mod reinforcement;
pub mod report;
pub mod side;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::army::{Army, ArmyCorrection};
    pub use crate::division::{derive_force, DivisionKind, DivisionMix, ForceState};
    pub use crate::engagement::{simulate, DaySnapshot, Engagement, EngagementParams, SideInput};
    pub use crate::error::{GameError, Result};
    pub use crate::modifiers::{
        derive_modifier_factor, Buff, CombatModifiers, Experience, ModifierFactor, Role, Terrain,
    };
    pub use crate::reinforcement::{
        arrival_day, schedule_reinforcements, DailyReinforcement, EngagementTimeline,
        ReinforcementWave, RegimentArchetype, RegimentDraft,
    };
    pub use crate::report::{EngagementReport, Outcome, SideReport, Termination};
    pub use crate::side::Side;
}
