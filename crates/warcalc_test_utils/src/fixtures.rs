//! Test fixtures and helpers.
//!
//! Reference armies and engagement inputs for consistent testing.

use warcalc_core::prelude::*;

/// Assert two floats agree to within `tolerance`.
///
/// # Panics
///
/// Panics if the values differ by more than `tolerance`.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}

/// The hill assault army, see [`Army::hill_assault`].
#[must_use]
pub fn hilly_offensive() -> Army {
    Army::hill_assault()
}

/// The hill garrison army, see [`Army::hill_garrison`].
#[must_use]
pub fn hilly_defence() -> Army {
    Army::hill_garrison()
}

/// Attacker 10000 vs defender 8000, a = 0.01, d = 0.012, thresholds 0.3,
/// no reinforcements, no non-combat attrition, ten days.
#[must_use]
pub fn reference_engagement() -> EngagementParams {
    let horizon = 10;
    EngagementParams::new(
        SideInput::new(10000.0, 0.01, 0.3, horizon),
        SideInput::new(8000.0, 0.012, 0.3, horizon),
        horizon,
    )
}

/// Mirror-image sides with no reinforcements over `horizon` days.
#[must_use]
pub fn symmetric_engagement(troops: f64, rate: f64, threshold: f64, horizon: u32) -> EngagementParams {
    EngagementParams::new(
        SideInput::new(troops, rate, threshold, horizon),
        SideInput::new(troops, rate, threshold, horizon),
        horizon,
    )
}

/// Full pipeline from the two hill armies over `horizon` days.
///
/// # Panics
///
/// Panics if the fixture armies are invalid, which would be a bug in the
/// fixtures themselves.
#[must_use]
pub fn hill_battle(horizon: u32) -> EngagementParams {
    EngagementParams::between(&hilly_offensive(), &hilly_defence(), horizon)
        .expect("fixture armies are valid")
}
