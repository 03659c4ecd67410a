//! Day-stepped attrition between an attacker and a defender.
//!
//! Each day both sides inflict casualties computed from the same start-of-day
//! snapshot, reinforcements land, and the cumulative loss ratios are checked
//! against each side's threshold. If neither side breaks, the attrition rates
//! are re-weighted for the next day: surviving troops keep their rate, fresh
//! arrivals contribute their own strength.
//!
//! ```text
//! D' = D - a·A + v[i].troops
//! A' = A - d·D + u[i].troops
//! a' = (a·(A - d·D) + u[i].troops·u[i].strength) / A'
//! d' = (d·(D - a'·A) + v[i].troops·v[i].strength) / D'
//! ```
//!
//! The defender's update reads the attacker's *already updated* rate `a'`.
//! That ordering is part of the model and must not be symmetrised.
//!
//! The simulator is a plain state machine: [`Engagement::tick`] advances one
//! day and returns a [`DaySnapshot`], so callers can observe or abandon an
//! engagement at any day. [`simulate`] runs it to completion.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::army::Army;
use crate::error::{GameError, Result};
use crate::modifiers::Role;
use crate::reinforcement::EngagementTimeline;
use crate::report::{EngagementReport, Outcome, SideReport, Termination};
use crate::side::Side;

/// Simulator input for one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideInput {
    /// Troops on the field on day 0.
    pub troops: f64,
    /// Seed attrition rate this side inflicts on its opponent.
    pub attrition_rate: f64,
    /// One-off non-combat loss fraction of initial troops.
    #[serde(default)]
    pub non_combat_rate: f64,
    /// Cumulative loss ratio above which the side breaks.
    pub loss_threshold: f64,
    /// Reinforcement arrivals, one entry per day.
    pub timeline: EngagementTimeline,
}

impl SideInput {
    /// Create a side with no non-combat attrition and an empty timeline
    /// over `horizon_days`.
    #[must_use]
    pub fn new(troops: f64, attrition_rate: f64, loss_threshold: f64, horizon_days: u32) -> Self {
        Self {
            troops,
            attrition_rate,
            non_combat_rate: 0.0,
            loss_threshold,
            timeline: EngagementTimeline::empty(horizon_days),
        }
    }

    /// Builder method to set the non-combat attrition rate.
    #[must_use]
    pub fn with_non_combat_rate(mut self, rate: f64) -> Self {
        self.non_combat_rate = rate;
        self
    }

    /// Builder method to replace the reinforcement timeline.
    #[must_use]
    pub fn with_timeline(mut self, timeline: EngagementTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Simulator input for an army, using its combat factor as the seed
    /// attrition rate.
    ///
    /// # Errors
    ///
    /// Fails if the army's force, modifiers or reinforcements are invalid.
    pub fn from_army(army: &Army, horizon_days: u32) -> Result<Self> {
        let correction = army.correction()?;
        Ok(Self {
            troops: correction.force.troop,
            attrition_rate: correction.factor.combat_factor,
            non_combat_rate: correction.factor.non_combat_attrition,
            loss_threshold: correction.factor.attrition_threshold,
            timeline: army.support(horizon_days)?,
        })
    }

    fn validate(&self, side: Side, horizon_days: u32) -> Result<()> {
        if !self.troops.is_finite() || self.troops <= 0.0 {
            return Err(GameError::InvalidTroops {
                side,
                value: self.troops,
            });
        }

        let parameters = [
            ("attrition rate", self.attrition_rate),
            ("non-combat rate", self.non_combat_rate),
            ("loss threshold", self.loss_threshold),
        ];
        for (parameter, value) in parameters {
            if !value.is_finite() || value < 0.0 {
                return Err(GameError::InvalidParameter {
                    side,
                    parameter,
                    value,
                });
            }
        }

        if self.timeline.len() < horizon_days as usize {
            return Err(GameError::TimelineTooShort {
                side,
                len: self.timeline.len(),
                horizon: horizon_days,
            });
        }

        let bad_entry = self
            .timeline
            .days()
            .iter()
            .take(horizon_days as usize)
            .enumerate()
            .find(|(_, d)| {
                !d.troops.is_finite() || d.troops < 0.0 || !d.strength.is_finite() || d.strength < 0.0
            });
        if let Some((day, entry)) = bad_entry {
            return Err(GameError::InvalidTimelineEntry {
                side,
                day,
                troops: entry.troops,
                strength: entry.strength,
            });
        }

        Ok(())
    }
}

/// Complete simulator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementParams {
    /// Attacking side.
    pub attacker: SideInput,
    /// Defending side.
    pub defender: SideInput,
    /// Maximum number of days to simulate.
    pub horizon_days: u32,
}

impl EngagementParams {
    /// Bundle two sides and a horizon.
    #[must_use]
    pub fn new(attacker: SideInput, defender: SideInput, horizon_days: u32) -> Self {
        Self {
            attacker,
            defender,
            horizon_days,
        }
    }

    /// Wire two armies into simulator input.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::RoleMismatch`] unless the attacker fights in the
    /// attack role and the defender in the defence role, and propagates any
    /// force model error.
    pub fn between(attacker: &Army, defender: &Army, horizon_days: u32) -> Result<Self> {
        if attacker.modifiers.role != Role::Attack {
            return Err(GameError::RoleMismatch {
                side: Side::Attacker,
                role: attacker.modifiers.role,
            });
        }
        if defender.modifiers.role != Role::Defence {
            return Err(GameError::RoleMismatch {
                side: Side::Defender,
                role: defender.modifiers.role,
            });
        }

        Ok(Self {
            attacker: SideInput::from_army(attacker, horizon_days)?,
            defender: SideInput::from_army(defender, horizon_days)?,
            horizon_days,
        })
    }

    /// Input for one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &SideInput {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Check every precondition of the simulator.
    ///
    /// # Errors
    ///
    /// Returns the first precondition violation found.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(GameError::ZeroHorizon);
        }
        self.attacker.validate(Side::Attacker, self.horizon_days)?;
        self.defender.validate(Side::Defender, self.horizon_days)
    }
}

/// Mutable per-side state.
#[derive(Debug, Clone)]
struct CombatantState {
    troops: f64,
    attrition_rate: f64,
    cumulative_losses: f64,
    curve: Vec<f64>,
}

impl CombatantState {
    fn new(input: &SideInput, horizon_days: u32) -> Self {
        Self {
            troops: input.troops,
            attrition_rate: input.attrition_rate,
            cumulative_losses: 0.0,
            curve: Vec::with_capacity(horizon_days as usize),
        }
    }

    fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        self.troops.to_bits().hash(hasher);
        self.attrition_rate.to_bits().hash(hasher);
        self.cumulative_losses.to_bits().hash(hasher);
    }
}

/// What happened on one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySnapshot {
    /// Day index.
    pub day: u32,
    /// Attacker troops at the end of the day.
    pub attacker_troops: f64,
    /// Defender troops at the end of the day.
    pub defender_troops: f64,
    /// Casualties the attacker suffered this day.
    pub attacker_day_loss: f64,
    /// Casualties the defender suffered this day.
    pub defender_day_loss: f64,
    /// Attacker cumulative loss ratio; `None` when the day ended in annihilation.
    pub attacker_loss_ratio: Option<f64>,
    /// Defender cumulative loss ratio; `None` when the day ended in annihilation.
    pub defender_loss_ratio: Option<f64>,
    /// Attacker attrition rate in effect for the next day.
    pub attacker_rate: f64,
    /// Defender attrition rate in effect for the next day.
    pub defender_rate: f64,
    /// Set on the day the engagement ends.
    pub verdict: Option<(Outcome, Termination)>,
}

/// A running engagement.
#[derive(Debug, Clone)]
pub struct Engagement {
    params: EngagementParams,
    day: u32,
    attacker: CombatantState,
    defender: CombatantState,
    verdict: Option<(Outcome, Termination)>,
}

impl Engagement {
    /// Start an engagement.
    ///
    /// # Errors
    ///
    /// Returns a precondition violation if `params` fails
    /// [`EngagementParams::validate`]; no state is created in that case.
    pub fn new(params: EngagementParams) -> Result<Self> {
        params.validate()?;
        let attacker = CombatantState::new(&params.attacker, params.horizon_days);
        let defender = CombatantState::new(&params.defender, params.horizon_days);
        Ok(Self {
            params,
            day: 0,
            attacker,
            defender,
            verdict: None,
        })
    }

    /// Index of the next day to simulate.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Whether the engagement has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.verdict.is_some()
    }

    /// Current troops of one side.
    #[must_use]
    pub fn troops(&self, side: Side) -> f64 {
        self.state(side).troops
    }

    fn state(&self, side: Side) -> &CombatantState {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Simulate one day.
    ///
    /// Returns `None` once the engagement has ended.
    pub fn tick(&mut self) -> Option<DaySnapshot> {
        if self.verdict.is_some() {
            return None;
        }

        let day = self.day;
        let u = self.params.attacker.timeline.day(day as usize);
        let v = self.params.defender.timeline.day(day as usize);

        // Start-of-day snapshot shared by both sides' losses
        let attacker_troops = self.attacker.troops;
        let defender_troops = self.defender.troops;
        let a = self.attacker.attrition_rate;
        let d = self.defender.attrition_rate;

        let defender_day_loss = a * attacker_troops;
        let defender_next = defender_troops - defender_day_loss + v.troops;
        let attacker_day_loss = d * defender_troops;
        let attacker_next = attacker_troops - attacker_day_loss + u.troops;

        self.attacker.cumulative_losses += attacker_day_loss;
        self.defender.cumulative_losses += defender_day_loss;
        self.attacker.curve.push(attacker_next);
        self.defender.curve.push(defender_next);

        let mut attacker_loss_ratio = None;
        let mut defender_loss_ratio = None;

        let verdict = match (attacker_next <= 0.0, defender_next <= 0.0) {
            (true, true) => Some((Outcome::Draw, Termination::Annihilation)),
            (true, false) => Some((Outcome::defeat_of(Side::Attacker), Termination::Annihilation)),
            (false, true) => Some((Outcome::defeat_of(Side::Defender), Termination::Annihilation)),
            (false, false) => {
                let attacker_ratio = self.attacker.cumulative_losses / attacker_next;
                let defender_ratio = self.defender.cumulative_losses / defender_next;
                attacker_loss_ratio = Some(attacker_ratio);
                defender_loss_ratio = Some(defender_ratio);

                let attacker_threshold = self.params.attacker.loss_threshold;
                let defender_threshold = self.params.defender.loss_threshold;

                if attacker_ratio > attacker_threshold || defender_ratio > defender_threshold {
                    let attacker_excess = attacker_ratio - attacker_threshold;
                    let defender_excess = defender_ratio - defender_threshold;
                    let outcome = if attacker_excess > defender_excess {
                        Outcome::defeat_of(Side::Attacker)
                    } else if attacker_excess < defender_excess {
                        Outcome::defeat_of(Side::Defender)
                    } else {
                        Outcome::Draw
                    };
                    Some((outcome, Termination::Threshold))
                } else {
                    // Sequential: the defender's update sees the new attacker rate
                    let a_next = (a * (attacker_troops - d * defender_troops)
                        + u.troops * u.strength)
                        / attacker_next;
                    let d_next = (d * (defender_troops - a_next * attacker_troops)
                        + v.troops * v.strength)
                        / defender_next;
                    self.attacker.attrition_rate = a_next;
                    self.defender.attrition_rate = d_next;

                    (day + 1 >= self.params.horizon_days)
                        .then_some((Outcome::Draw, Termination::Horizon))
                }
            }
        };

        self.attacker.troops = attacker_next;
        self.defender.troops = defender_next;

        tracing::debug!(
            day,
            attacker_troops = attacker_next,
            defender_troops = defender_next,
            attacker_day_loss,
            defender_day_loss,
            attacker_rate = self.attacker.attrition_rate,
            defender_rate = self.defender.attrition_rate,
            "Engagement day resolved"
        );

        if let Some((outcome, termination)) = verdict {
            tracing::info!(
                day,
                ?outcome,
                ?termination,
                attacker_losses = self.attacker.cumulative_losses,
                defender_losses = self.defender.cumulative_losses,
                "Engagement ended"
            );
            self.verdict = verdict;
        } else {
            self.day += 1;
        }

        Some(DaySnapshot {
            day,
            attacker_troops: attacker_next,
            defender_troops: defender_next,
            attacker_day_loss,
            defender_day_loss,
            attacker_loss_ratio,
            defender_loss_ratio,
            attacker_rate: self.attacker.attrition_rate,
            defender_rate: self.defender.attrition_rate,
            verdict,
        })
    }

    /// Hash of the full mutable state, bit-exact on floats.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.day.hash(&mut hasher);
        self.attacker.hash_into(&mut hasher);
        self.defender.hash_into(&mut hasher);
        self.verdict.hash(&mut hasher);
        hasher.finish()
    }

    /// Final report, available once the engagement has ended.
    #[must_use]
    pub fn report(&self) -> Option<EngagementReport> {
        let (outcome, termination) = self.verdict?;
        let duration = self.day;
        Some(EngagementReport {
            outcome,
            termination,
            duration,
            attacker: self.side_report(Side::Attacker, duration),
            defender: self.side_report(Side::Defender, duration),
        })
    }

    fn side_report(&self, side: Side, duration: u32) -> SideReport {
        let input = self.params.side(side);
        let state = self.state(side);
        SideReport {
            initial_troops: input.troops,
            committed_troops: input.troops + input.timeline.troops_through(duration as usize),
            combat_losses: state.cumulative_losses,
            non_combat_losses: input.non_combat_rate * input.troops,
            troop_curve: state.curve.clone(),
        }
    }

    /// Run to completion and report.
    #[must_use]
    pub fn run(mut self) -> EngagementReport {
        loop {
            if let Some(report) = self.report() {
                return report;
            }
            self.tick();
        }
    }
}

/// Resolve an engagement from start to finish.
///
/// # Errors
///
/// Returns a precondition violation before any simulation happens if the
/// input is invalid (see [`EngagementParams::validate`]).
pub fn simulate(params: &EngagementParams) -> Result<EngagementReport> {
    Ok(Engagement::new(params.clone())?.run())
}
