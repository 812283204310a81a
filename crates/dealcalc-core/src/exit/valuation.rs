use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::DealAssumptions;
use crate::loan::{amortization, metrics};
use crate::projection::cash_flow;
use crate::scenario::{FinancingType, Scenario};
use crate::types::*;
use crate::DealCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Exit value at one cap rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSensitivityRow {
    pub cap_rate_pct: Percent,
    /// 0 when the cap rate is not positive
    pub exit_price: Money,
}

/// Sale of the asset at the end of the hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitOutput {
    pub scenario_id: u32,
    pub financing_type: FinancingType,
    pub final_year_noi: Money,
    pub exit_cap_rate_pct: Percent,
    /// Final-year NOI capitalised at the exit cap rate
    pub exit_price: Option<Money>,
    pub sensitivity: Vec<ExitSensitivityRow>,
    pub loan_amount: Money,
    pub payments_made: u32,
    /// Loan principal still owed at sale (0 without a loan)
    pub remaining_principal: Money,
    /// Exit price − remaining principal
    pub projected_equity: Option<Money>,
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Exit price = NOI / cap rate. `None` when the cap rate is not positive.
pub fn exit_price(final_year_noi: Money, exit_cap_rate_pct: Percent) -> Option<Money> {
    if exit_cap_rate_pct <= Decimal::ZERO {
        return None;
    }
    Some(final_year_noi / pct_to_rate(exit_cap_rate_pct))
}

/// Exit value at cap − step, cap and cap + step.
pub fn exit_sensitivity(
    final_year_noi: Money,
    exit_cap_rate_pct: Percent,
    step_pct: Percent,
) -> Vec<ExitSensitivityRow> {
    [
        exit_cap_rate_pct - step_pct,
        exit_cap_rate_pct,
        exit_cap_rate_pct + step_pct,
    ]
    .into_iter()
    .map(|cap| ExitSensitivityRow {
        cap_rate_pct: cap,
        exit_price: exit_price(final_year_noi, cap).unwrap_or(Decimal::ZERO),
    })
    .collect()
}

/// Loan principal outstanding once `payments_made` monthly payments are in.
/// Scenarios without debt service owe nothing.
pub fn remaining_principal(
    project_cost: Money,
    scenario: &Scenario,
    payments_made: u32,
) -> DealCalcResult<Money> {
    if !scenario.financing_type.carries_debt_service() {
        return Ok(Decimal::ZERO);
    }
    let loan_amount = metrics::loan_metrics(project_cost, scenario).loan_amount;
    amortization::remaining_balance(loan_amount, scenario.rate, scenario.term, payments_made)
}

// ---------------------------------------------------------------------------
// Scenario API
// ---------------------------------------------------------------------------

/// Exit price, sensitivity and projected equity for one scenario.
pub fn value_scenario_exit(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<ExitOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    scenario.validate(&mut warnings)?;

    let input = cash_flow::CashFlowProjectionInput::for_scenario(deal, scenario)?;
    let projection = cash_flow::build_projection(&input, &mut warnings)?;
    let output = build_exit(deal, scenario, projection.final_year_noi, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Direct Capitalisation Exit (Final-Year NOI / Exit Cap Rate)",
        &serde_json::json!({
            "scenario": scenario,
            "exit": deal.exit,
        }),
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn build_exit(
    deal: &DealAssumptions,
    scenario: &Scenario,
    final_year_noi: Money,
    warnings: &mut Vec<String>,
) -> DealCalcResult<ExitOutput> {
    let e = &deal.exit;
    let price = exit_price(final_year_noi, e.exit_cap_rate_pct);
    let remaining =
        remaining_principal(deal.project.project_cost, scenario, e.total_payments_made)?;

    if price.is_none() {
        warnings.push(format!(
            "Scenario {}: exit price undefined at a {}% cap rate",
            scenario.id, e.exit_cap_rate_pct
        ));
    }
    let projected_equity = price.map(|p| p - remaining);
    if let Some(equity) = projected_equity {
        if equity < Decimal::ZERO {
            warnings.push(format!(
                "Scenario {}: sale does not cover the remaining loan balance",
                scenario.id
            ));
        }
    }

    Ok(ExitOutput {
        scenario_id: scenario.id,
        financing_type: scenario.financing_type,
        final_year_noi,
        exit_cap_rate_pct: e.exit_cap_rate_pct,
        exit_price: price,
        sensitivity: exit_sensitivity(final_year_noi, e.exit_cap_rate_pct, e.cap_rate_step_pct),
        loan_amount: metrics::loan_metrics(deal.project.project_cost, scenario).loan_amount,
        payments_made: e.total_payments_made,
        remaining_principal: remaining,
        projected_equity,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exit_price_basic() {
        assert_eq!(exit_price(dec!(65000), dec!(6.5)), Some(dec!(1000000)));
    }

    #[test]
    fn test_exit_price_zero_cap_undefined() {
        assert_eq!(exit_price(dec!(65000), Decimal::ZERO), None);
    }

    #[test]
    fn test_sensitivity_rows() {
        let rows = exit_sensitivity(dec!(60000), dec!(6), dec!(1));
        assert_eq!(
            rows,
            vec![
                ExitSensitivityRow {
                    cap_rate_pct: dec!(5),
                    exit_price: dec!(1200000),
                },
                ExitSensitivityRow {
                    cap_rate_pct: dec!(6),
                    exit_price: dec!(1000000),
                },
                ExitSensitivityRow {
                    cap_rate_pct: dec!(7),
                    exit_price: dec!(60000) / dec!(0.07),
                },
            ]
        );
    }

    #[test]
    fn test_sensitivity_non_positive_cap_is_zero() {
        let rows = exit_sensitivity(dec!(60000), dec!(0.5), dec!(0.5));
        assert_eq!(rows[0].cap_rate_pct, Decimal::ZERO);
        assert_eq!(rows[0].exit_price, Decimal::ZERO);
        assert!(rows[1].exit_price > Decimal::ZERO);
    }

    #[test]
    fn test_cash_scenario_owes_nothing() {
        let scenario = Scenario {
            financing_type: FinancingType::Cash,
            ..Scenario::default()
        };
        assert_eq!(
            remaining_principal(dec!(550000), &scenario, 120).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_default_scenario_exit() {
        let deal = DealAssumptions::with_scenarios(1).unwrap();
        let scenario = deal.scenarios.get(1).unwrap();
        let out = value_scenario_exit(&deal, scenario).unwrap();
        let exit = &out.result;

        // 35 * 1.03^9 * 1500 with no operating costs
        assert!((exit.final_year_noi - dec!(68500.59)).abs() < dec!(0.01));
        let price = exit.exit_price.unwrap();
        assert!((price - dec!(1053855.26)).abs() < dec!(0.01));
        // 412,500 at 7% / 25 years after 120 payments
        assert!(exit.remaining_principal > dec!(320000));
        assert!(exit.remaining_principal < dec!(340000));
        assert_eq!(
            exit.projected_equity,
            Some(price - exit.remaining_principal)
        );
        assert_eq!(exit.sensitivity.len(), 3);
    }

    #[test]
    fn test_zero_cap_rate_warns() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.exit.exit_cap_rate_pct = Decimal::ZERO;
        let scenario = deal.scenarios.get(1).unwrap();
        let out = value_scenario_exit(&deal, scenario).unwrap();
        assert!(out.result.exit_price.is_none());
        assert!(out.result.projected_equity.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("exit price undefined")));
    }

    proptest! {
        #[test]
        fn exit_price_is_linear_in_noi(
            noi_cents in 0i64..1_000_000_000,
            factor in 1i64..50,
            cap_bp in 1i64..2_000,
        ) {
            let noi = Decimal::new(noi_cents, 2);
            let cap = Decimal::new(cap_bp, 2);
            let k = Decimal::from(factor);
            let single = exit_price(noi, cap).unwrap();
            let scaled = exit_price(noi * k, cap).unwrap();
            prop_assert!((scaled - single * k).abs() < dec!(0.000001));
        }
    }
}
