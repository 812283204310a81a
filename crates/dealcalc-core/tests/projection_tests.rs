use dealcalc_core::assumptions::{DealAssumptions, OperatingCosts};
use dealcalc_core::projection::{cash_flow, dscr};
use dealcalc_core::scenario::FinancingType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn deal_with_costs() -> DealAssumptions {
    DealAssumptions {
        operating_costs: OperatingCosts {
            hoa_fee: dec!(1200),
            property_taxes: dec!(6500),
            insurance: dec!(1800),
            ..OperatingCosts::default()
        },
        ..DealAssumptions::with_scenarios(2).unwrap()
    }
}

// ===========================================================================
// DSCR
// ===========================================================================

#[test]
fn test_dscr_zero_noi() {
    assert_eq!(dscr::dscr(Decimal::ZERO, dec!(1000)), Some(Decimal::ZERO));
}

#[test]
fn test_dscr_no_debt_service() {
    assert_eq!(dscr::dscr(dec!(1000), Decimal::ZERO), None);
}

#[test]
fn test_debt_service_summary_matches_projection_year_one() {
    let deal = deal_with_costs();
    let scenario = deal.scenarios.get(1).unwrap();
    let summary = dscr::analyze_debt_service(&deal, scenario).unwrap().result;
    let projection = cash_flow::project_scenario(&deal, scenario).unwrap().result;

    let y1 = &projection.rows[0];
    assert_eq!(summary.noi_year_1, y1.noi);
    assert_eq!(summary.dscr, y1.dscr);
    assert_eq!(summary.annual_costs, dec!(9500));
    assert_eq!(summary.target_income_year_10, projection.rows[9].income);
}

// ===========================================================================
// Ten-year projection
// ===========================================================================

#[test]
fn test_projection_covers_ten_calendar_years() {
    let deal = deal_with_costs();
    let projection = cash_flow::project_scenario(&deal, deal.scenarios.get(1).unwrap())
        .unwrap()
        .result;
    assert_eq!(projection.rows.len(), 10);
    let years: Vec<Option<i32>> = projection.rows.iter().map(|r| r.calendar_year).collect();
    assert_eq!(years.first(), Some(&Some(2025)));
    assert_eq!(years.last(), Some(&Some(2034)));
}

#[test]
fn test_income_grows_costs_flat_by_default() {
    let deal = deal_with_costs();
    let projection = cash_flow::project_scenario(&deal, deal.scenarios.get(1).unwrap())
        .unwrap()
        .result;
    for pair in projection.rows.windows(2) {
        assert!(pair[1].income > pair[0].income);
        assert_eq!(pair[1].costs, pair[0].costs);
        assert!(pair[1].cash_flow > pair[0].cash_flow);
    }
}

#[test]
fn test_gp_lp_split_of_adjusted() {
    let deal = deal_with_costs();
    let projection = cash_flow::project_scenario(&deal, deal.scenarios.get(1).unwrap())
        .unwrap()
        .result;
    for row in &projection.rows {
        assert_eq!(row.adjusted, row.cash_flow * dec!(0.85));
        assert!((row.gp + row.lp - row.adjusted).abs() < dec!(0.000001));
    }
    assert!(
        (projection.total_gp + projection.total_lp - projection.total_adjusted).abs()
            < dec!(0.000001)
    );
}

#[test]
fn test_unlevered_scenario_out_earns_levered_each_year() {
    let mut deal = deal_with_costs();
    deal.scenarios.get_mut(2).unwrap().financing_type = FinancingType::Cash;
    let levered = cash_flow::project_scenario(&deal, deal.scenarios.get(1).unwrap())
        .unwrap()
        .result;
    let cash = cash_flow::project_scenario(&deal, deal.scenarios.get(2).unwrap())
        .unwrap()
        .result;
    for (l, c) in levered.rows.iter().zip(cash.rows.iter()) {
        assert_eq!(l.noi, c.noi);
        assert!(c.cash_flow > l.cash_flow);
    }
}

#[test]
fn test_invalid_escalator_rejected() {
    let mut deal = deal_with_costs();
    deal.project.income_escalator_pct = dec!(150);
    assert!(cash_flow::project_scenario(&deal, deal.scenarios.get(1).unwrap()).is_err());
}
