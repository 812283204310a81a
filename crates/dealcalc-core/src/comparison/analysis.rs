use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::assumptions::DealAssumptions;
use crate::exit::returns::{self, ReturnsOutput};
use crate::exit::valuation::{self, ExitOutput};
use crate::loan::metrics::{self, LoanMetrics};
use crate::projection::cash_flow::{self, CashFlowProjection};
use crate::projection::dscr::{self, DebtServiceSummary};
use crate::scenario::Scenario;
use crate::types::*;
use crate::waterfall::distribution::{self, WaterfallOutput};
use crate::DealCalcResult;

/// Every calculated figure for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub scenario: Scenario,
    pub loan: LoanMetrics,
    pub debt_service: DebtServiceSummary,
    pub cash_flow: CashFlowProjection,
    pub exit: ExitOutput,
    pub returns: ReturnsOutput,
    pub waterfall: WaterfallOutput,
}

/// Loan, debt service, projection, exit, returns and waterfall for one
/// scenario.
pub fn analyze_scenario(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<ScenarioAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    let analysis = build_analysis(deal, scenario, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario Analysis (loan, DSCR, 10-year projection, exit, IRR, waterfall)",
        &serde_json::json!({
            "project": deal.project,
            "operating_costs": deal.operating_costs,
            "exit": deal.exit,
            "distribution": deal.distribution,
            "scenario": scenario,
        }),
        warnings,
        elapsed,
        analysis,
    ))
}

/// Deal-level validation is left to the caller so it runs once per report.
pub(crate) fn build_analysis(
    deal: &DealAssumptions,
    scenario: &Scenario,
    warnings: &mut Vec<String>,
) -> DealCalcResult<ScenarioAnalysis> {
    scenario.validate(warnings)?;

    let loan = metrics::loan_metrics(deal.project.project_cost, scenario);
    let debt_service = dscr::build_debt_service(deal, scenario, warnings)?;

    let input = cash_flow::CashFlowProjectionInput::for_scenario(deal, scenario)?;
    let projection = cash_flow::build_projection(&input, warnings)?;

    let exit = valuation::build_exit(deal, scenario, projection.final_year_noi, warnings)?;
    let terminal = exit.projected_equity.unwrap_or_default();
    let returns = returns::build_returns(scenario, &projection.adjusted_series(), terminal, warnings);

    let waterfall_input = distribution::scenario_waterfall_input(
        deal,
        scenario,
        projection.total_adjusted,
        exit.projected_equity,
        warnings,
    );
    let waterfall = distribution::build_waterfall(&waterfall_input)?;

    debug!(
        scenario = scenario.id,
        financing = %scenario.financing_type,
        irr_pct = ?returns.irr_pct,
        distributable = %waterfall.distributable,
        "scenario analysed"
    );

    Ok(ScenarioAnalysis {
        scenario: scenario.clone(),
        loan,
        debt_service,
        cash_flow: projection,
        exit,
        returns,
        waterfall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::FinancingType;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_analysis_pieces_agree() {
        let deal = DealAssumptions::with_scenarios(1).unwrap();
        let scenario = deal.scenarios.get(1).unwrap();
        let a = analyze_scenario(&deal, scenario).unwrap().result;

        assert_eq!(a.scenario.id, 1);
        assert_eq!(a.loan.loan_amount, a.debt_service.loan_amount);
        assert_eq!(a.cash_flow.rows[0].debt_service, a.debt_service.annual_debt_service);
        assert_eq!(a.exit.final_year_noi, a.cash_flow.final_year_noi);
        let expected = a.cash_flow.total_adjusted + a.exit.projected_equity.unwrap();
        assert!((a.waterfall.distributable - expected).abs() < dec!(0.000001));
        assert_eq!(a.returns.total_adjusted_cash_flow, a.cash_flow.total_adjusted);
    }

    #[test]
    fn test_cash_scenario_analysis() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.scenarios.get_mut(1).unwrap().financing_type = FinancingType::Cash;
        let scenario = deal.scenarios.get(1).unwrap();
        let a = analyze_scenario(&deal, scenario).unwrap().result;

        assert!(a.debt_service.dscr.is_none());
        assert_eq!(a.exit.remaining_principal, Decimal::ZERO);
        assert_eq!(a.exit.projected_equity, a.exit.exit_price);
    }

    #[test]
    fn test_term_beyond_limit_rejected() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.scenarios.get_mut(1).unwrap().term = 400_000_000;
        let scenario = deal.scenarios.get(1).unwrap();
        assert!(matches!(
            analyze_scenario(&deal, scenario),
            Err(crate::DealCalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.scenarios.get_mut(1).unwrap().term = 0;
        let scenario = deal.scenarios.get(1).unwrap();
        assert!(analyze_scenario(&deal, scenario).is_err());
    }
}
