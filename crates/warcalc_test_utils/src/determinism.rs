//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engagement simulator
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Reports must be reproducible bit-for-bit: a battle resolved twice, on
//! another thread, or after a save/load round trip must give the same
//! losses and the same troop curves. Sources of non-determinism include:
//!
//! - **Floating-point evaluation order**: The recurrence is sensitive to the
//!   order of operations (the sequential rate update in particular). We
//!   compare raw bits, never approximate equality.
//!
//! - **Hidden state**: The simulator owns all of its state; nothing crosses
//!   engagement boundaries.
//!
//! - **System randomness**: None in the core. Anything random lives outside
//!   and must be injected.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Single-day transitions are exact
//! 2. **Property tests**: Random inputs still produce deterministic outputs
//! 3. **Integration tests**: Full army-to-report pipelines are reproducible
//! 4. **Parallel tests**: Running N engagements in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use warcalc_core::engagement::{Engagement, EngagementParams};
use warcalc_core::report::EngagementReport;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulator).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engagement is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel engagement runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Report hash from each engagement.
    pub hashes: Vec<u64>,
    /// Number of engagements run.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all engagements produced identical reports.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all engagements matched.
    ///
    /// # Panics
    ///
    /// Panics if engagements produced different reports.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel engagements diverged!\n\
                 Engagements: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped computation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use warcalc_test_utils::determinism::verify_determinism;
/// use warcalc_test_utils::fixtures::reference_engagement;
/// use warcalc_core::engagement::Engagement;
///
/// let result = verify_determinism(
///     5,  // Run 5 times
///     10, // 10 days each
///     || Engagement::new(reference_engagement()).unwrap(),
///     |engagement| { engagement.tick(); },
///     |engagement| engagement.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    tracing::debug!(runs, steps, is_deterministic, "Determinism check complete");

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash a report through its serialized bytes, so every float is compared
/// bit-for-bit.
///
/// # Panics
///
/// Panics if the report cannot be serialized.
#[must_use]
pub fn report_hash(report: &EngagementReport) -> u64 {
    let bytes = report
        .serialize()
        .expect("engagement reports always serialize");
    compute_hash(&bytes)
}

/// Resolve the same engagement `runs` times and compare the reports.
///
/// # Panics
///
/// Panics if `params` is not a valid engagement.
pub fn verify_engagement_determinism(params: &EngagementParams, runs: usize) -> DeterminismResult {
    verify_determinism(
        runs,
        u64::from(params.horizon_days),
        || Engagement::new(params.clone()).expect("valid engagement params"),
        |engagement| {
            engagement.tick();
        },
        |engagement| {
            let report = engagement
                .report()
                .expect("engagement finishes within its horizon");
            report_hash(&report)
        },
    )
}

/// Resolve N copies of an engagement on separate threads and collect
/// report hashes.
///
/// This is useful for catching non-determinism that only manifests
/// under thread scheduling variations.
///
/// # Example
///
/// ```
/// use warcalc_test_utils::determinism::run_parallel_engagements;
/// use warcalc_test_utils::fixtures::hill_battle;
///
/// let result = run_parallel_engagements(|| hill_battle(30), 8);
/// result.assert_deterministic();
/// ```
///
/// # Panics
///
/// Panics if the setup produces invalid params or a worker thread panics.
pub fn run_parallel_engagements<F>(setup_fn: F, num_runs: usize) -> ParallelRunResult
where
    F: Fn() -> EngagementParams + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let params = setup_fn();
                    let engagement = Engagement::new(params).expect("valid engagement params");
                    report_hash(&engagement.run())
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        num_runs,
    }
}

/// Compare two engagements day-by-day, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly which day
/// the runs start to differ.
///
/// # Returns
///
/// `None` if the runs match, `Some(day)` if they diverge after
/// simulating that many days (0 means the initial states differ).
///
/// # Panics
///
/// Panics if `setup_fn` produces invalid params.
pub fn find_first_divergence<F>(setup_fn: F) -> Option<u64>
where
    F: Fn() -> EngagementParams,
{
    let mut first = Engagement::new(setup_fn()).expect("valid engagement params");
    let mut second = Engagement::new(setup_fn()).expect("valid engagement params");

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    let mut days = 0;
    loop {
        let a = first.tick();
        let b = second.tick();
        if a.is_none() && b.is_none() {
            return None;
        }
        days += 1;

        if a != b || first.state_hash() != second.state_hash() {
            tracing::warn!(days, ?a, ?b, "Engagements diverged");
            return Some(days);
        }
    }
}

/// Verify that a serialization round trip preserves a report exactly.
///
/// # Panics
///
/// Panics if `params` is not a valid engagement.
pub fn verify_serialization_determinism(params: &EngagementParams) -> bool {
    let report = Engagement::new(params.clone())
        .expect("valid engagement params")
        .run();

    let Ok(bytes) = report.serialize() else {
        return false;
    };

    match EngagementReport::deserialize(&bytes) {
        Ok(restored) => restored == report && report_hash(&restored) == report_hash(&report),
        Err(_) => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engagement testing.
///
/// These strategies generate random but valid inputs for
/// property-based testing of the force model and simulator.
pub mod strategies {
    use proptest::prelude::*;
    use warcalc_core::prelude::*;

    /// Initial troop counts (500 to 60000).
    pub fn arb_troops() -> impl Strategy<Value = f64> {
        (500u32..60000u32).prop_map(f64::from)
    }

    /// Seed attrition rates (0.001 to 0.05 per day).
    pub fn arb_rate() -> impl Strategy<Value = f64> {
        (1u32..50u32).prop_map(|n| f64::from(n) / 1000.0)
    }

    /// Power-of-two attrition rates (1/32 to 1/512).
    ///
    /// Scaling by a power of two is exact, so without reinforcements these
    /// rates survive the daily re-weighting bit-for-bit. Mirror-image sides
    /// then stay exactly symmetric.
    pub fn arb_dyadic_rate() -> impl Strategy<Value = f64> {
        (5i32..=9i32).prop_map(|k| 2f64.powi(-k))
    }

    /// Loss thresholds (0.05 to 0.6).
    pub fn arb_threshold() -> impl Strategy<Value = f64> {
        (5u32..60u32).prop_map(|n| f64::from(n) / 100.0)
    }

    /// Non-combat attrition rates (0 to 0.02).
    pub fn arb_non_combat_rate() -> impl Strategy<Value = f64> {
        (0u32..20u32).prop_map(|n| f64::from(n) / 1000.0)
    }

    /// Engagement horizons (1 to 40 days).
    pub fn arb_horizon() -> impl Strategy<Value = u32> {
        1u32..40u32
    }

    /// One day of arrivals: mostly nothing, sometimes a regiment or two.
    pub fn arb_daily_reinforcement() -> impl Strategy<Value = DailyReinforcement> {
        prop_oneof![
            3 => Just(DailyReinforcement::NONE),
            1 => ((1u32..4u32), (15u32..45u32)).prop_map(|(regiments, strength)| {
                DailyReinforcement::new(f64::from(regiments * 800), f64::from(strength) / 1000.0)
            }),
        ]
    }

    /// A timeline covering exactly `horizon` days.
    pub fn arb_timeline(horizon: u32) -> impl Strategy<Value = EngagementTimeline> {
        proptest::collection::vec(arb_daily_reinforcement(), horizon as usize)
            .prop_map(EngagementTimeline::from_days)
    }

    /// One side's simulator input.
    pub fn arb_side(horizon: u32) -> impl Strategy<Value = SideInput> {
        (
            arb_troops(),
            arb_rate(),
            arb_threshold(),
            arb_non_combat_rate(),
            arb_timeline(horizon),
        )
            .prop_map(|(troops, rate, threshold, non_combat, timeline)| {
                SideInput::new(troops, rate, threshold, 0)
                    .with_non_combat_rate(non_combat)
                    .with_timeline(timeline)
            })
    }

    /// A complete, valid engagement.
    pub fn arb_engagement() -> impl Strategy<Value = EngagementParams> {
        arb_horizon().prop_flat_map(|horizon| {
            (arb_side(horizon), arb_side(horizon))
                .prop_map(move |(attacker, defender)| EngagementParams::new(attacker, defender, horizon))
        })
    }

    /// One side's simulator input with no arrivals over `horizon` days.
    pub fn arb_unreinforced_side(horizon: u32) -> impl Strategy<Value = SideInput> {
        (arb_troops(), arb_rate(), arb_threshold(), arb_non_combat_rate()).prop_map(
            move |(troops, rate, threshold, non_combat)| {
                SideInput::new(troops, rate, threshold, horizon).with_non_combat_rate(non_combat)
            },
        )
    }

    /// A valid engagement in which no reinforcements ever arrive.
    pub fn arb_unreinforced_engagement() -> impl Strategy<Value = EngagementParams> {
        arb_horizon().prop_flat_map(|horizon| {
            (arb_unreinforced_side(horizon), arb_unreinforced_side(horizon))
                .prop_map(move |(attacker, defender)| EngagementParams::new(attacker, defender, horizon))
        })
    }

    /// A division mix with at least one division.
    pub fn arb_division_mix() -> impl Strategy<Value = DivisionMix> {
        (0u32..6u32, 0u32..6u32, 0u32..6u32)
            .prop_filter("at least one division", |(r, g, f)| r + g + f > 0)
            .prop_map(|(r, g, f)| DivisionMix::new(r, g, f))
    }

    /// Any terrain.
    pub fn arb_terrain() -> impl Strategy<Value = Terrain> {
        proptest::sample::select(Terrain::ALL.to_vec())
    }

    /// Any experience tier.
    pub fn arb_experience() -> impl Strategy<Value = Experience> {
        (1u8..=5u8).prop_map(|tier| Experience::try_from(tier).expect("tier in range"))
    }

    /// Modifiers for a side fighting in `role`, morale 0.8 to 1.2.
    pub fn arb_modifiers(role: Role) -> impl Strategy<Value = CombatModifiers> {
        (
            arb_terrain(),
            arb_experience(),
            80u32..=120u32,
            any::<bool>(),
            proptest::collection::vec(80u32..130u32, 0..4),
        )
            .prop_map(move |(terrain, experience, morale, surrounded, buffs)| {
                buffs.into_iter().enumerate().fold(
                    CombatModifiers::new(terrain, role, experience)
                        .with_morale(f64::from(morale) / 100.0)
                        .with_surrounded(surrounded),
                    |mods, (i, buff)| mods.with_buff(format!("buff_{i}"), f64::from(buff) / 100.0),
                )
            })
    }

    /// An army fighting in `role`, with up to three reinforcement waves.
    pub fn arb_army(role: Role) -> impl Strategy<Value = Army> {
        let wave = (
            proptest::sample::select(DivisionKind::ALL.to_vec()),
            0u32..400u32,
            50u32..120u32,
        )
            .prop_map(|(division, distance, correction)| {
                ReinforcementWave::new(division, f64::from(distance), f64::from(correction) / 100.0)
            });

        (
            arb_division_mix(),
            arb_modifiers(role),
            proptest::collection::vec(wave, 0..3),
        )
            .prop_map(|(divisions, modifiers, waves)| {
                waves
                    .into_iter()
                    .fold(Army::new(divisions, modifiers), Army::with_reinforcement)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{hill_battle, reference_engagement};
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_reference_engagement_determinism() {
        verify_engagement_determinism(&reference_engagement(), 5).assert_deterministic();
    }

    #[test]
    fn test_hill_battle_determinism() {
        verify_engagement_determinism(&hill_battle(30), 3).assert_deterministic();
    }

    #[test]
    fn test_find_divergence_on_deterministic_engagement() {
        assert!(find_first_divergence(|| hill_battle(30)).is_none());
    }

    #[test]
    fn test_parallel_engagements_match() {
        let result = run_parallel_engagements(reference_engagement, 8);
        assert_eq!(result.num_runs, 8);
        result.assert_deterministic();
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_detects_divergent_runs() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        result.assert_deterministic();
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_reference_report() {
        assert!(verify_serialization_determinism(&reference_engagement()));
    }

    #[test]
    fn test_serialization_preserves_hill_battle_report() {
        assert!(verify_serialization_determinism(&hill_battle(30)));
    }

    // =========================================================================
    // Property-based determinism tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_random_engagements_are_deterministic(params in strategies::arb_engagement()) {
            let result = verify_engagement_determinism(&params, 2);
            prop_assert!(result.is_deterministic);
        }

        #[test]
        fn prop_random_reports_survive_serialization(params in strategies::arb_engagement()) {
            prop_assert!(verify_serialization_determinism(&params));
        }
    }
}
