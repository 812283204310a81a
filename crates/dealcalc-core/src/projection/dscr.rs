use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::DealAssumptions;
use crate::loan::{amortization, metrics};
use crate::projection::escalation;
use crate::scenario::{FinancingType, Scenario};
use crate::types::*;
use crate::DealCalcResult;

/// Debt service coverage: NOI / annual debt service.
///
/// `None` when there is no debt service to cover.
pub fn dscr(noi: Money, annual_debt_service: Money) -> Option<Decimal> {
    if annual_debt_service.is_zero() {
        return None;
    }
    Some(noi / annual_debt_service)
}

/// Lender-style reading of a DSCR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DscrRating {
    /// Below 1.0x: income does not cover debt
    Insufficient,
    /// 1.0x to 1.25x: may not meet lender requirements
    BelowLenderMinimum,
    /// 1.25x to 1.5x
    Acceptable,
    /// 1.5x and above
    Strong,
}

impl DscrRating {
    pub fn from_dscr(value: Decimal) -> Self {
        if value < Decimal::ONE {
            DscrRating::Insufficient
        } else if value < dec!(1.25) {
            DscrRating::BelowLenderMinimum
        } else if value < dec!(1.5) {
            DscrRating::Acceptable
        } else {
            DscrRating::Strong
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DscrRating::Insufficient => "Insufficient income to cover debt",
            DscrRating::BelowLenderMinimum => "May not meet lender requirements",
            DscrRating::Acceptable => "Acceptable DSCR",
            DscrRating::Strong => "Strong DSCR",
        }
    }
}

/// Year-1 debt service and coverage for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtServiceSummary {
    pub scenario_id: u32,
    pub financing_type: FinancingType,
    pub interest_rate_pct: Percent,
    pub monthly_rate: Rate,
    pub loan_amount: Money,
    pub term_years: u32,
    pub term_months: u32,
    pub monthly_payment: Money,
    /// Interest portion of the first payment
    pub first_month_interest: Money,
    pub annual_debt_service: Money,
    pub projected_income_year_1: Money,
    pub annual_costs: Money,
    pub noi_year_1: Money,
    pub dscr: Option<Decimal>,
    pub rating: Option<DscrRating>,
    pub target_income_year_10: Money,
}

/// Debt service, year-1 DSCR and rating for a scenario.
pub fn analyze_debt_service(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<DebtServiceSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    scenario.validate(&mut warnings)?;

    let summary = build_debt_service(deal, scenario, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt Service Coverage (Year-1 NOI / Annual Debt Service)",
        scenario,
        warnings,
        elapsed,
        summary,
    ))
}

pub(crate) fn build_debt_service(
    deal: &DealAssumptions,
    scenario: &Scenario,
    warnings: &mut Vec<String>,
) -> DealCalcResult<DebtServiceSummary> {
    let terms = metrics::debt_terms(deal.project.project_cost, scenario)?;

    let first_month_interest = if terms.financing_type.carries_debt_service() {
        amortization::interest_payment(terms.loan_amount, scenario.rate, scenario.term, 1)?
    } else {
        Decimal::ZERO
    };

    let p = &deal.project;
    let rents = escalation::rent_projection(
        p.price_per_sqft,
        p.total_sqft,
        p.income_escalator_pct,
        PROJECTION_YEARS,
    );
    let projected_income_year_1 = rents.first().copied().unwrap_or_default();
    let target_income_year_10 = rents.last().copied().unwrap_or_default();

    let annual_costs = deal.annual_costs();
    let noi_year_1 = projected_income_year_1 - annual_costs;
    let coverage = dscr(noi_year_1, terms.annual_debt_service);
    let rating = coverage.map(DscrRating::from_dscr);

    if let Some(DscrRating::Insufficient) = rating {
        warnings.push(format!(
            "Scenario {}: year-1 DSCR {} is below 1.0x",
            scenario.id,
            coverage.unwrap_or_default().round_dp(3)
        ));
    }

    Ok(DebtServiceSummary {
        scenario_id: scenario.id,
        financing_type: scenario.financing_type,
        interest_rate_pct: scenario.rate,
        monthly_rate: amortization::monthly_rate(scenario.rate),
        loan_amount: terms.loan_amount,
        term_years: scenario.term,
        term_months: amortization::num_payments(scenario.term)?,
        monthly_payment: terms.monthly_payment,
        first_month_interest,
        annual_debt_service: terms.annual_debt_service,
        projected_income_year_1,
        annual_costs,
        noi_year_1,
        dscr: coverage,
        rating,
        target_income_year_10,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::OperatingCosts;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dscr_zero_noi_is_zero() {
        assert_eq!(dscr(Decimal::ZERO, dec!(35000)), Some(Decimal::ZERO));
    }

    #[test]
    fn test_dscr_zero_debt_service_is_undefined() {
        assert_eq!(dscr(dec!(40000), Decimal::ZERO), None);
    }

    #[test]
    fn test_dscr_ratio() {
        assert_eq!(dscr(dec!(50000), dec!(40000)), Some(dec!(1.25)));
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(DscrRating::from_dscr(dec!(0.99)), DscrRating::Insufficient);
        assert_eq!(DscrRating::from_dscr(dec!(1.0)), DscrRating::BelowLenderMinimum);
        assert_eq!(DscrRating::from_dscr(dec!(1.25)), DscrRating::Acceptable);
        assert_eq!(DscrRating::from_dscr(dec!(1.49)), DscrRating::Acceptable);
        assert_eq!(DscrRating::from_dscr(dec!(1.5)), DscrRating::Strong);
    }

    #[test]
    fn test_default_deal_debt_service() {
        let deal = DealAssumptions {
            operating_costs: OperatingCosts {
                property_taxes: dec!(2500),
                ..OperatingCosts::default()
            },
            ..DealAssumptions::with_scenarios(1).unwrap()
        };
        let scenario = deal.scenarios.get(1).unwrap();
        let out = analyze_debt_service(&deal, scenario).unwrap();
        let s = &out.result;

        assert_eq!(s.loan_amount, dec!(412500));
        assert_eq!(s.term_months, 300);
        assert_eq!(s.projected_income_year_1, dec!(52500));
        assert_eq!(s.noi_year_1, dec!(50000));
        // 412,500 * 0.07 / 12
        assert!((s.first_month_interest - dec!(2406.25)).abs() < dec!(0.0001));
        // 50,000 / (2,915.46 * 12) ≈ 1.429
        let coverage = s.dscr.unwrap();
        assert!((coverage - dec!(1.429)).abs() < dec!(0.001));
        assert_eq!(s.rating, Some(DscrRating::Acceptable));
        // Balanced default deal: nothing to flag
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_cash_scenario_has_no_dscr() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.scenarios.get_mut(1).unwrap().financing_type = FinancingType::Cash;
        let scenario = deal.scenarios.get(1).unwrap();
        let s = analyze_debt_service(&deal, scenario).unwrap().result;
        assert_eq!(s.annual_debt_service, Decimal::ZERO);
        assert_eq!(s.first_month_interest, Decimal::ZERO);
        assert!(s.dscr.is_none());
        assert!(s.rating.is_none());
    }

    #[test]
    fn test_low_coverage_warns() {
        let mut deal = DealAssumptions::with_scenarios(1).unwrap();
        deal.operating_costs.misc = dec!(30000);
        let scenario = deal.scenarios.get(1).unwrap();
        let out = analyze_debt_service(&deal, scenario).unwrap();
        assert_eq!(out.result.rating, Some(DscrRating::Insufficient));
        assert!(out.warnings.iter().any(|w| w.contains("below 1.0x")));
    }
}
