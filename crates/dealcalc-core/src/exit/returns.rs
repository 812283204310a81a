use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::DealAssumptions;
use crate::error::DealCalcError;
use crate::exit::valuation;
use crate::projection::cash_flow;
use crate::scenario::Scenario;
use crate::time_value;
use crate::types::*;
use crate::DealCalcResult;

/// Investor return metrics for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsOutput {
    pub scenario_id: u32,
    pub adjusted_raise: Money,
    pub total_adjusted_cash_flow: Money,
    /// Net sale proceeds received with the final year
    pub terminal_value: Money,
    /// Flows the IRR was solved over, investment first
    pub cash_flows: Vec<Money>,
    /// Project IRR in percent; `None` when it cannot be solved
    pub irr_pct: Option<Percent>,
    /// (Σ adjusted cash flow + terminal value) / adjusted raise
    pub cash_on_cash: Option<Multiple>,
}

/// Input for a standalone IRR solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Period 0 first
    pub cash_flows: Vec<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// `None` when Newton-Raphson fails
    pub irr: Option<Rate>,
    pub irr_pct: Option<Percent>,
    pub npv_at_irr: Option<Money>,
}

/// `[−|investment|, cf₁, …, cfₙ + terminal]`.
pub fn investment_cash_flows(investment: Money, yearly: &[Money], terminal: Money) -> Vec<Money> {
    let mut flows = Vec::with_capacity(yearly.len() + 1);
    flows.push(-investment.abs());
    flows.extend_from_slice(yearly);
    if yearly.is_empty() {
        flows.push(terminal);
    } else if let Some(last) = flows.last_mut() {
        *last += terminal;
    }
    flows
}

/// IRR in percent. Undefined when nothing was invested or Newton-Raphson
/// fails; the failure is recorded as a warning.
pub fn project_irr_pct(
    investment: Money,
    yearly: &[Money],
    terminal: Money,
    warnings: &mut Vec<String>,
) -> Option<Percent> {
    if investment <= Decimal::ZERO {
        warnings.push("IRR undefined: no capital invested".into());
        return None;
    }
    let flows = investment_cash_flows(investment, yearly, terminal);
    match time_value::irr(&flows) {
        Ok(rate) => Some(rate * Decimal::ONE_HUNDRED),
        Err(e) => {
            warnings.push(format!("IRR undefined: {e}"));
            None
        }
    }
}

/// Total cash returned per dollar invested. `None` when nothing was invested.
pub fn cash_on_cash(investment: Money, yearly: &[Money], terminal: Money) -> Option<Multiple> {
    if investment <= Decimal::ZERO {
        return None;
    }
    let returned: Money = yearly.iter().copied().sum::<Money>() + terminal;
    Some(returned / investment)
}

/// IRR of an arbitrary flow series. Non-convergence is reported as an
/// undefined result with a warning rather than an error.
pub fn solve_irr(input: &IrrInput) -> DealCalcResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.len() < 2 {
        return Err(DealCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let guess = input.guess.unwrap_or(time_value::IRR_INITIAL_GUESS);
    let irr = match time_value::irr_with_guess(&input.cash_flows, guess) {
        Ok(rate) => Some(rate),
        Err(e) => {
            warnings.push(format!("IRR undefined: {e}"));
            None
        }
    };
    let npv_at_irr = irr.and_then(|r| time_value::npv(r, &input.cash_flows).ok());

    let output = IrrOutput {
        irr,
        irr_pct: irr.map(|r| r * Decimal::ONE_HUNDRED),
        npv_at_irr,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Internal Rate of Return (Newton-Raphson)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// IRR and cash-on-cash for one scenario of a deal.
pub fn scenario_returns(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<ReturnsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    scenario.validate(&mut warnings)?;

    let input = cash_flow::CashFlowProjectionInput::for_scenario(deal, scenario)?;
    let projection = cash_flow::build_projection(&input, &mut warnings)?;
    let exit = valuation::build_exit(deal, scenario, projection.final_year_noi, &mut warnings)?;
    let output = build_returns(
        scenario,
        &projection.adjusted_series(),
        exit.projected_equity.unwrap_or(Decimal::ZERO),
        &mut warnings,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Project IRR (Newton-Raphson) and Cash-on-Cash Multiple",
        scenario,
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn build_returns(
    scenario: &Scenario,
    adjusted: &[Money],
    terminal_value: Money,
    warnings: &mut Vec<String>,
) -> ReturnsOutput {
    let investment = scenario.adjusted_raise;
    let mut irr_warnings = Vec::new();
    let irr_pct = project_irr_pct(investment, adjusted, terminal_value, &mut irr_warnings);
    warnings.extend(
        irr_warnings
            .into_iter()
            .map(|w| format!("Scenario {}: {w}", scenario.id)),
    );

    ReturnsOutput {
        scenario_id: scenario.id,
        adjusted_raise: investment,
        total_adjusted_cash_flow: adjusted.iter().copied().sum(),
        terminal_value,
        cash_flows: investment_cash_flows(investment, adjusted, terminal_value),
        irr_pct,
        cash_on_cash: cash_on_cash(investment, adjusted, terminal_value),
    }
}
