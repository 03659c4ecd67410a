//! End-to-end and property tests for the force model and the simulator.

use proptest::prelude::*;
use warcalc_core::prelude::*;
use warcalc_test_utils::determinism::{report_hash, strategies};
use warcalc_test_utils::fixtures::{
    assert_close, hill_battle, hilly_defence, hilly_offensive, reference_engagement,
    symmetric_engagement,
};

// =============================================================================
// Force model
// =============================================================================

mod force_model {
    use super::*;

    #[test]
    fn test_mixed_corps_force() {
        let force = derive_force(&DivisionMix::new(3, 4, 3)).unwrap();
        assert_eq!(force.troop, 37900.0);
        assert_close(
            force.strength,
            (0.0217 * 6900.0 + 0.0253 * 12400.0 + 0.0306 * 18600.0) / 37900.0,
            1e-12,
        );
    }

    #[test]
    fn test_reserve_infantry_arrival_day() {
        let speed = RegimentArchetype::ReserveInfantry.base_speed();
        assert_eq!(speed, 4.0);
        assert_eq!(arrival_day(200.0, speed, 0.7), 9);

        let wave = ReinforcementWave::new(DivisionKind::Reserve, 200.0, 0.7);
        let infantry = wave.drafts().unwrap()[0];
        assert_eq!(infantry.archetype, RegimentArchetype::ReserveInfantry);
        assert_eq!(infantry.arrival_day, 9);
    }

    #[test]
    fn test_army_seeds_simulator_with_combat_factor() {
        let attacker = hilly_offensive();
        let params = EngagementParams::between(&attacker, &hilly_defence(), 30).unwrap();
        let correction = attacker.correction().unwrap();

        assert_eq!(params.attacker.troops, correction.force.troop);
        assert_eq!(params.attacker.attrition_rate, correction.factor.combat_factor);
        assert_eq!(params.attacker.loss_threshold, correction.factor.attrition_threshold);
        assert_eq!(
            params.attacker.non_combat_rate,
            correction.factor.non_combat_attrition
        );
        assert_eq!(params.attacker.timeline, attacker.support(30).unwrap());
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let err = EngagementParams::between(&hilly_defence(), &hilly_defence(), 10).unwrap_err();
        assert_eq!(
            err,
            GameError::RoleMismatch {
                side: Side::Attacker,
                role: Role::Defence
            }
        );

        let err = EngagementParams::between(&hilly_offensive(), &hilly_offensive(), 10).unwrap_err();
        assert!(matches!(
            err,
            GameError::RoleMismatch {
                side: Side::Defender,
                ..
            }
        ));
    }
}

// =============================================================================
// Reference scenario
// =============================================================================

mod reference {
    use super::*;

    #[test]
    fn test_reference_curve_is_reproducible() {
        let first = simulate(&reference_engagement()).unwrap();
        let second = simulate(&reference_engagement()).unwrap();

        assert_eq!(first, second);
        assert_eq!(report_hash(&first), report_hash(&second));
        let bits = |curve: &[f64]| curve.iter().map(|t| t.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.attacker.troop_curve), bits(&second.attacker.troop_curve));
        assert_eq!(bits(&first.defender.troop_curve), bits(&second.defender.troop_curve));
    }

    #[test]
    fn test_reference_curve_matches_hand_recurrence() {
        let report = simulate(&reference_engagement()).unwrap();

        let (mut attacker, mut defender) = (10000.0f64, 8000.0f64);
        let (mut a, mut d) = (0.01f64, 0.012f64);
        for day in 0..10 {
            let defender_next = defender - a * attacker + 0.0;
            let attacker_next = attacker - d * defender + 0.0;
            let a_next = (a * (attacker - d * defender) + 0.0 * 0.0) / attacker_next;
            let d_next = (d * (defender - a_next * attacker) + 0.0 * 0.0) / defender_next;
            a = a_next;
            d = d_next;
            attacker = attacker_next;
            defender = defender_next;

            assert_eq!(report.attacker.troop_curve[day], attacker);
            assert_eq!(report.defender.troop_curve[day], defender);
        }
    }

    #[test]
    fn test_reference_losses() {
        let report = simulate(&reference_engagement()).unwrap();
        assert_eq!(report.termination, Termination::Horizon);
        assert_eq!(report.duration, 9);

        // Without reinforcements, losses equal the drop in troops
        let attacker_final = report.attacker.troop_curve[9];
        let defender_final = report.defender.troop_curve[9];
        assert_close(report.attacker_losses(), 10000.0 - attacker_final, 1e-6);
        assert_close(report.defender_losses(), 8000.0 - defender_final, 1e-6);
    }
}

// =============================================================================
// Behavioural properties
// =============================================================================

mod properties {
    use super::*;

    #[test]
    fn test_symmetric_engagement_draws_at_threshold() {
        let report = simulate(&symmetric_engagement(10000.0, 1.0 / 16.0, 0.3, 20)).unwrap();

        assert_eq!(report.outcome, Outcome::Draw);
        assert_eq!(report.termination, Termination::Threshold);
        assert_eq!(report.attacker_losses(), report.defender_losses());
    }

    #[test]
    fn test_symmetric_engagement_draws_at_horizon() {
        let report = simulate(&symmetric_engagement(10000.0, 1.0 / 128.0, 0.5, 4)).unwrap();

        assert_eq!(report.outcome, Outcome::Draw);
        assert_eq!(report.termination, Termination::Horizon);
        assert_eq!(report.attacker.troop_curve, report.defender.troop_curve);
    }

    #[test]
    fn test_annihilated_side_loses_regardless_of_ratio() {
        // The defender's threshold is huge, so only annihilation can end it
        let horizon = 10;
        let params = EngagementParams::new(
            SideInput::new(50000.0, 0.3, 100.0, horizon),
            SideInput::new(6000.0, 0.01, 100.0, horizon),
            horizon,
        );
        let mut engagement = Engagement::new(params).unwrap();

        let mut last = None;
        while let Some(snapshot) = engagement.tick() {
            last = Some(snapshot);
        }
        let last = last.unwrap();
        assert!(last.defender_troops <= 0.0);

        let report = engagement.report().unwrap();
        assert_eq!(report.outcome, Outcome::DefenderDefeated);
        assert_eq!(report.termination, Termination::Annihilation);
        assert_eq!(report.duration, last.day);
        assert_eq!(report.defender.troop_curve.len(), last.day as usize + 1);
    }

    #[test]
    fn test_stepping_can_stop_early() {
        let mut engagement = Engagement::new(hill_battle(30)).unwrap();
        let first = engagement.tick().unwrap();
        let second = engagement.tick().unwrap();

        assert_eq!(first.day, 0);
        assert_eq!(second.day, 1);
        assert!(engagement.report().is_none() || second.verdict.is_some());
        assert_eq!(engagement.troops(Side::Attacker), second.attacker_troops);
    }

    #[test]
    fn test_hill_battle_summary() {
        let report = simulate(&hill_battle(30)).unwrap();
        let lines = report.summary_lines();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], report.outcome.to_string());
        assert!(lines[1].starts_with("The attacking side committed"));
        assert!(lines[2].starts_with("The defense side committed"));
        assert!(report.attacker.committed_troops >= report.attacker.initial_troops);
    }

    proptest! {
        #[test]
        fn prop_losses_include_non_combat_floor(params in strategies::arb_unreinforced_engagement()) {
            let report = simulate(&params).unwrap();
            let attacker_floor = params.attacker.non_combat_rate * params.attacker.troops;
            let defender_floor = params.defender.non_combat_rate * params.defender.troops;
            prop_assert!(report.attacker_losses() >= attacker_floor);
            prop_assert!(report.defender_losses() >= defender_floor);
        }

        #[test]
        fn prop_curve_covers_every_simulated_day(params in strategies::arb_engagement()) {
            let report = simulate(&params).unwrap();
            let expected = report.duration as usize + 1;
            prop_assert_eq!(report.attacker.troop_curve.len(), expected);
            prop_assert_eq!(report.defender.troop_curve.len(), expected);
            prop_assert!(report.duration < params.horizon_days);
        }

        #[test]
        fn prop_higher_attacker_threshold_never_shortens(
            params in strategies::arb_engagement(),
            extra in 1u32..50u32,
        ) {
            let baseline = simulate(&params).unwrap();

            let mut tolerant = params.clone();
            tolerant.attacker.loss_threshold += f64::from(extra) / 100.0;
            let tolerant = simulate(&tolerant).unwrap();

            prop_assert!(tolerant.duration >= baseline.duration);
        }

        #[test]
        fn prop_symmetric_sides_draw(
            troops in strategies::arb_troops(),
            rate in strategies::arb_dyadic_rate(),
            threshold in strategies::arb_threshold(),
            half_horizon in 1u32..15u32,
        ) {
            let report = simulate(&symmetric_engagement(troops, rate, threshold, half_horizon * 2)).unwrap();
            prop_assert_eq!(report.outcome, Outcome::Draw);
            prop_assert_eq!(report.attacker_losses(), report.defender_losses());
        }

        #[test]
        fn prop_army_pipeline_is_valid(
            attacker in strategies::arb_army(Role::Attack),
            defender in strategies::arb_army(Role::Defence),
            horizon in strategies::arb_horizon(),
        ) {
            let params = EngagementParams::between(&attacker, &defender, horizon).unwrap();
            prop_assert!(params.validate().is_ok());
            let report = simulate(&params).unwrap();
            prop_assert!(report.attacker.committed_troops >= params.attacker.troops);
        }
    }
}
