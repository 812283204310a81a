use dealcalc_core::assumptions::{DealAssumptions, DistributionAssumptions, PromoteTier};
use dealcalc_core::waterfall::distribution::{
    calculate_waterfall, distribute_scenario, standard_tiers, WaterfallInput,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn default_input(distributable: Decimal) -> WaterfallInput {
    WaterfallInput {
        distributable,
        lp_capital: dec!(175000),
        years_held: 10,
        tiers: standard_tiers(&DistributionAssumptions::default()),
    }
}

// ===========================================================================
// Tier bookkeeping
// ===========================================================================

#[test]
fn test_running_balance_is_consistent() {
    let out = calculate_waterfall(&default_input(dec!(900000))).unwrap().result;
    let mut balance = dec!(900000);
    for tier in &out.tiers {
        balance -= tier.amount;
        assert_eq!(tier.remaining, balance);
        assert_eq!(tier.to_gp + tier.to_lp, tier.amount);
    }
    assert_eq!(out.left_over, Decimal::ZERO);
}

#[test]
fn test_preferred_return_is_lp_only() {
    let out = calculate_waterfall(&default_input(dec!(900000))).unwrap().result;
    let pref = &out.tiers[1];
    // 175,000 * (1.08^10 - 1)
    assert!((pref.amount - dec!(202811.87)).abs() < dec!(0.01));
    assert_eq!(pref.to_gp, Decimal::ZERO);
    assert_eq!(pref.return_pct, Some(dec!(8)));
}

#[test]
fn test_small_distribution_stops_at_capital() {
    let out = calculate_waterfall(&default_input(dec!(50000))).unwrap().result;
    assert_eq!(out.tiers[0].amount, dec!(50000));
    assert_eq!(out.total_to_lp, dec!(50000));
    assert_eq!(out.total_to_gp, Decimal::ZERO);
    assert_eq!(out.lp_pct_of_total, dec!(100));
}

#[test]
fn test_gp_share_grows_with_proceeds() {
    let modest = calculate_waterfall(&default_input(dec!(500000))).unwrap().result;
    let large = calculate_waterfall(&default_input(dec!(5000000))).unwrap().result;
    assert!(large.gp_pct_of_total > modest.gp_pct_of_total);
    assert!(large.lp_multiple.unwrap() > modest.lp_multiple.unwrap());
}

#[test]
fn test_custom_tiers_without_residual_get_ownership_split() {
    let distribution = DistributionAssumptions {
        promote_tiers: vec![PromoteTier::new("Catch-up", dec!(90), Some(dec!(10)))],
        ..DistributionAssumptions::default()
    };
    let input = WaterfallInput {
        tiers: standard_tiers(&distribution),
        ..default_input(dec!(2000000))
    };
    let out = calculate_waterfall(&input).unwrap().result;
    let last = out.tiers.last().unwrap();
    assert_eq!(last.tier_name, "Residual");
    // Default ownership is 80 LP / 20 GP
    assert!((last.to_lp - last.amount * dec!(0.8)).abs() < dec!(0.0000001));
}

// ===========================================================================
// Scenario distribution
// ===========================================================================

#[test]
fn test_scenario_distribution_balances() {
    let deal = DealAssumptions::with_scenarios(1).unwrap();
    let out = distribute_scenario(&deal, deal.scenarios.get(1).unwrap())
        .unwrap()
        .result;
    assert_eq!(out.total_to_gp + out.total_to_lp, out.distributable);
    assert_eq!(out.tiers.len(), 5);
}

#[test]
fn test_underwater_scenario_distributes_nothing() {
    let mut deal = DealAssumptions::with_scenarios(1).unwrap();
    deal.operating_costs.misc = dec!(90000);
    let out = distribute_scenario(&deal, deal.scenarios.get(1).unwrap()).unwrap();
    assert_eq!(out.result.distributable, Decimal::ZERO);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("distributable cash is negative")));
}
