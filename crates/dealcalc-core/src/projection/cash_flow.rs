use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::DealAssumptions;
use crate::error::DealCalcError;
use crate::loan::metrics;
use crate::projection::dscr::dscr;
use crate::projection::escalation;
use crate::scenario::Scenario;
use crate::types::*;
use crate::DealCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything the yearly projection needs, already resolved for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProjectionInput {
    pub price_per_sqft: Money,
    pub total_sqft: u32,
    pub income_escalator_pct: Percent,
    /// Year-1 operating costs
    pub annual_costs: Money,
    pub cost_escalator_pct: Percent,
    /// Level annual debt service (0 when unlevered)
    pub annual_debt_service: Money,
    /// Share of cash flow that is distributable
    pub adjusted_pct: Percent,
    pub gp_pct: Percent,
    pub lp_pct: Percent,
    /// LP equity used for the cash-on-cash column
    pub adjusted_raise: Money,
    /// Calendar year of projection year 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    pub years: u32,
}

impl CashFlowProjectionInput {
    pub fn for_scenario(deal: &DealAssumptions, scenario: &Scenario) -> DealCalcResult<Self> {
        let terms = metrics::debt_terms(deal.project.project_cost, scenario)?;
        let p = &deal.project;
        let d = &deal.distribution;
        Ok(Self {
            price_per_sqft: p.price_per_sqft,
            total_sqft: p.total_sqft,
            income_escalator_pct: p.income_escalator_pct,
            annual_costs: deal.annual_costs(),
            cost_escalator_pct: p.cost_escalator_pct,
            annual_debt_service: terms.annual_debt_service,
            adjusted_pct: d.adjusted_pct,
            gp_pct: d.cash_flow_gp_pct,
            lp_pct: d.cash_flow_lp_pct,
            adjusted_raise: scenario.adjusted_raise,
            start_year: Some(p.anticipated_start.year()),
            years: PROJECTION_YEARS,
        })
    }
}

/// One projected year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    pub year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_year: Option<i32>,
    /// Escalation applied going into this year (0 in year 1)
    pub escalator_pct: Percent,
    pub price_per_sqft: Money,
    pub income: Money,
    pub costs: Money,
    pub debt_service: Money,
    pub noi: Money,
    pub cash_flow: Money,
    pub dscr: Option<Decimal>,
    /// Distributable share of cash flow
    pub adjusted: Money,
    pub gp: Money,
    pub lp: Money,
    /// LP distribution / adjusted raise, in percent
    pub lp_cash_on_cash_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub rows: Vec<YearlyCashFlow>,
    pub total_income: Money,
    pub total_noi: Money,
    pub total_cash_flow: Money,
    pub average_cash_flow: Money,
    pub total_adjusted: Money,
    pub total_gp: Money,
    pub total_lp: Money,
    pub minimum_dscr: Option<Decimal>,
    pub final_year_noi: Money,
}

impl CashFlowProjection {
    /// Distributable (adjusted) cash flow per year, year 1 first.
    pub fn adjusted_series(&self) -> Vec<Money> {
        self.rows.iter().map(|r| r.adjusted).collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project income, costs, NOI, debt service, cash flow and GP/LP splits.
pub fn project_cash_flows(
    input: &CashFlowProjectionInput,
) -> DealCalcResult<ComputationOutput<CashFlowProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let projection = build_projection(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Escalated Cash Flow Projection (straight-line escalators)",
        input,
        warnings,
        elapsed,
        projection,
    ))
}

/// Ten-year projection for one scenario of a deal.
pub fn project_scenario(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<CashFlowProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    scenario.validate(&mut warnings)?;

    let input = CashFlowProjectionInput::for_scenario(deal, scenario)?;
    let projection = build_projection(&input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Escalated Cash Flow Projection (straight-line escalators)",
        &input,
        warnings,
        elapsed,
        projection,
    ))
}

pub(crate) fn build_projection(
    input: &CashFlowProjectionInput,
    warnings: &mut Vec<String>,
) -> DealCalcResult<CashFlowProjection> {
    validate_input(input)?;

    let prices = escalation::escalate(input.price_per_sqft, input.income_escalator_pct, input.years);
    let costs = escalation::escalate(input.annual_costs, input.cost_escalator_pct, input.years);
    let sqft = Decimal::from(input.total_sqft);
    let adjusted_rate = pct_to_rate(input.adjusted_pct);
    let gp_rate = pct_to_rate(input.gp_pct);
    let lp_rate = pct_to_rate(input.lp_pct);

    let mut rows = Vec::with_capacity(input.years as usize);
    for (idx, (price, cost)) in prices.iter().zip(costs.iter()).enumerate() {
        let year = idx as u32 + 1;
        let income = *price * sqft;
        let noi = income - *cost;
        let cash_flow = noi - input.annual_debt_service;
        let adjusted = cash_flow * adjusted_rate;
        let gp = adjusted * gp_rate;
        let lp = adjusted * lp_rate;
        let lp_cash_on_cash_pct = if input.adjusted_raise > Decimal::ZERO {
            lp / input.adjusted_raise * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        rows.push(YearlyCashFlow {
            year,
            calendar_year: input.start_year.map(|y| y + idx as i32),
            escalator_pct: if year == 1 {
                Decimal::ZERO
            } else {
                input.income_escalator_pct
            },
            price_per_sqft: *price,
            income,
            costs: *cost,
            debt_service: input.annual_debt_service,
            noi,
            cash_flow,
            dscr: dscr(noi, input.annual_debt_service),
            adjusted,
            gp,
            lp,
            lp_cash_on_cash_pct,
        });
    }

    let negative_years: Vec<String> = rows
        .iter()
        .filter(|r| r.cash_flow < Decimal::ZERO)
        .map(|r| r.year.to_string())
        .collect();
    if !negative_years.is_empty() {
        warnings.push(format!(
            "Negative cash flow in year(s) {}",
            negative_years.join(", ")
        ));
    }

    let total_income: Money = rows.iter().map(|r| r.income).sum();
    let total_noi: Money = rows.iter().map(|r| r.noi).sum();
    let total_cash_flow: Money = rows.iter().map(|r| r.cash_flow).sum();
    let total_adjusted: Money = rows.iter().map(|r| r.adjusted).sum();
    let total_gp: Money = rows.iter().map(|r| r.gp).sum();
    let total_lp: Money = rows.iter().map(|r| r.lp).sum();
    let average_cash_flow = total_cash_flow / Decimal::from(input.years);
    let minimum_dscr = rows.iter().filter_map(|r| r.dscr).min();
    let final_year_noi = rows.last().map(|r| r.noi).unwrap_or_default();

    Ok(CashFlowProjection {
        rows,
        total_income,
        total_noi,
        total_cash_flow,
        average_cash_flow,
        total_adjusted,
        total_gp,
        total_lp,
        minimum_dscr,
        final_year_noi,
    })
}

fn validate_input(input: &CashFlowProjectionInput) -> DealCalcResult<()> {
    if input.years == 0 {
        return Err(DealCalcError::InvalidInput {
            field: "years".into(),
            reason: "Projection needs at least 1 year".into(),
        });
    }
    let non_negative = [
        ("price_per_sqft", input.price_per_sqft),
        ("annual_costs", input.annual_costs),
        ("annual_debt_service", input.annual_debt_service),
        ("adjusted_raise", input.adjusted_raise),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(DealCalcError::InvalidInput {
                field: field.into(),
                reason: "Value cannot be negative".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
