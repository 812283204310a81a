use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{DealAssumptions, DistributionAssumptions};
use crate::error::DealCalcError;
use crate::exit::valuation;
use crate::projection::cash_flow;
use crate::scenario::Scenario;
use crate::types::*;
use crate::DealCalcResult;

/// Capped tier sizes are held to this many decimal places so the running
/// balance subtracts exactly.
const ALLOCATION_DP: u32 = 10;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Input for a GP/LP distribution waterfall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallInput {
    /// Cash available for distribution over the hold
    pub distributable: Money,
    /// Capital contributed by LPs
    pub lp_capital: Money,
    /// Years the capital was outstanding (compounds hurdles)
    pub years_held: u32,
    /// Ordered tiers, executed top-to-bottom
    pub tiers: Vec<WaterfallTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallTier {
    pub name: String,
    pub tier_type: WaterfallTierType,
}

/// Distribution mechanics for a waterfall tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WaterfallTierType {
    /// Contributed capital back to LPs
    ReturnOfCapital,
    /// Compounded preferred return to LPs
    PreferredReturn { rate_pct: Percent },
    /// LP/GP split, optionally until LP profit reaches a compounded return
    Promote {
        lp_share_pct: Percent,
        gp_share_pct: Percent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lp_return_ceiling_pct: Option<Percent>,
    },
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallOutput {
    pub tiers: Vec<WaterfallTierResult>,
    pub distributable: Money,
    pub total_to_gp: Money,
    pub total_to_lp: Money,
    pub total_distributed: Money,
    /// Undistributed cash (0 whenever the last tier is uncapped)
    pub left_over: Money,
    /// LP distributions / LP capital
    pub lp_multiple: Option<Multiple>,
    pub gp_pct_of_total: Percent,
    pub lp_pct_of_total: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallTierResult {
    pub tier_name: String,
    /// Hurdle or ceiling rate the tier runs to, if any
    pub return_pct: Option<Percent>,
    pub amount: Money,
    pub to_gp: Money,
    pub to_lp: Money,
    /// Cash left after this tier
    pub remaining: Money,
}

// ---------------------------------------------------------------------------
// Tier construction
// ---------------------------------------------------------------------------

/// Return of capital, preferred return at the hurdle, then the configured
/// promote tiers. A residual tier at the GP/LP ownership split is appended
/// when the configured tiers do not end uncapped.
pub fn standard_tiers(distribution: &DistributionAssumptions) -> Vec<WaterfallTier> {
    let mut tiers = vec![
        WaterfallTier {
            name: "Return of Capital".into(),
            tier_type: WaterfallTierType::ReturnOfCapital,
        },
        WaterfallTier {
            name: format!("Preferred Return ({}%)", distribution.hurdle_rate_pct.normalize()),
            tier_type: WaterfallTierType::PreferredReturn {
                rate_pct: distribution.hurdle_rate_pct,
            },
        },
    ];

    tiers.extend(distribution.promote_tiers.iter().map(|t| WaterfallTier {
        name: t.name.clone(),
        tier_type: WaterfallTierType::Promote {
            lp_share_pct: t.lp_share_pct,
            gp_share_pct: t.gp_share_pct,
            lp_return_ceiling_pct: t.lp_return_ceiling_pct,
        },
    }));

    let ends_uncapped = distribution
        .promote_tiers
        .last()
        .is_some_and(|t| t.lp_return_ceiling_pct.is_none());
    if !ends_uncapped {
        tiers.push(WaterfallTier {
            name: "Residual".into(),
            tier_type: WaterfallTierType::Promote {
                lp_share_pct: distribution.lp_pct,
                gp_share_pct: distribution.gp_pct,
                lp_return_ceiling_pct: None,
            },
        });
    }

    tiers
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Run cash through the tiers, tracking GP and LP allocations.
///
/// Every tier takes from a running balance, so the tier amounts always add
/// up to `distributable`; the final uncapped tier absorbs what is left.
pub fn calculate_waterfall(
    input: &WaterfallInput,
) -> DealCalcResult<ComputationOutput<WaterfallOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let output = build_waterfall(input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "GP/LP Distribution Waterfall (compounded hurdles)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn build_waterfall(input: &WaterfallInput) -> DealCalcResult<WaterfallOutput> {
    validate_input(input)?;

    let capital = input.lp_capital;
    let mut remaining = input.distributable;
    // LP profit above returned capital, used to test promote ceilings
    let mut lp_profit = Decimal::ZERO;
    let mut results: Vec<WaterfallTierResult> = Vec::with_capacity(input.tiers.len());

    for tier in &input.tiers {
        let (return_pct, amount, to_lp) = match &tier.tier_type {
            WaterfallTierType::ReturnOfCapital => {
                let amount = remaining.min(capital);
                (None, amount, amount)
            }
            WaterfallTierType::PreferredReturn { rate_pct } => {
                let target = compounded_profit(capital, *rate_pct, input.years_held)?;
                let amount = remaining.min(target);
                lp_profit += amount;
                (Some(*rate_pct), amount, amount)
            }
            WaterfallTierType::Promote {
                lp_share_pct,
                lp_return_ceiling_pct,
                ..
            } => {
                let lp_rate = pct_to_rate(*lp_share_pct);
                let amount = match lp_return_ceiling_pct {
                    Some(ceiling) if lp_rate > Decimal::ZERO => {
                        let target = compounded_profit(capital, *ceiling, input.years_held)?;
                        let lp_room = (target - lp_profit).max(Decimal::ZERO);
                        let capacity = (lp_room / lp_rate).round_dp(ALLOCATION_DP);
                        remaining.min(capacity)
                    }
                    _ => remaining,
                };
                let to_lp = (amount * lp_rate).round_dp(ALLOCATION_DP);
                lp_profit += to_lp;
                (*lp_return_ceiling_pct, amount, to_lp)
            }
        };

        remaining -= amount;
        results.push(WaterfallTierResult {
            tier_name: tier.name.clone(),
            return_pct,
            amount,
            to_gp: amount - to_lp,
            to_lp,
            remaining,
        });
    }

    let total_to_gp: Money = results.iter().map(|t| t.to_gp).sum();
    let total_to_lp: Money = results.iter().map(|t| t.to_lp).sum();
    let total_distributed = total_to_gp + total_to_lp;

    let (gp_pct_of_total, lp_pct_of_total) = if total_distributed.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            total_to_gp / total_distributed * Decimal::ONE_HUNDRED,
            total_to_lp / total_distributed * Decimal::ONE_HUNDRED,
        )
    };

    Ok(WaterfallOutput {
        tiers: results,
        distributable: input.distributable,
        total_to_gp,
        total_to_lp,
        total_distributed,
        left_over: remaining,
        lp_multiple: if capital > Decimal::ZERO {
            Some(total_to_lp / capital)
        } else {
            None
        },
        gp_pct_of_total,
        lp_pct_of_total,
    })
}

/// Profit on `capital` compounded annually at `rate_pct` for `years`.
fn compounded_profit(capital: Money, rate_pct: Percent, years: u32) -> DealCalcResult<Money> {
    let growth = (Decimal::ONE + pct_to_rate(rate_pct))
        .checked_powu(u64::from(years))
        .ok_or_else(|| {
            DealCalcError::FinancialImpossibility(format!(
                "{rate_pct}% compounded over {years} years overflows"
            ))
        })?;
    capital
        .checked_mul(growth - Decimal::ONE)
        .map(|v| v.round_dp(ALLOCATION_DP))
        .ok_or_else(|| DealCalcError::FinancialImpossibility("Hurdle amount overflows".into()))
}

fn validate_input(input: &WaterfallInput) -> DealCalcResult<()> {
    if input.distributable < Decimal::ZERO {
        return Err(DealCalcError::InvalidInput {
            field: "distributable".into(),
            reason: "Distributable cash cannot be negative".into(),
        });
    }
    if input.lp_capital < Decimal::ZERO {
        return Err(DealCalcError::InvalidInput {
            field: "lp_capital".into(),
            reason: "LP capital cannot be negative".into(),
        });
    }
    if input.tiers.is_empty() {
        return Err(DealCalcError::InvalidInput {
            field: "tiers".into(),
            reason: "At least one waterfall tier is required".into(),
        });
    }

    for (i, tier) in input.tiers.iter().enumerate() {
        let field = format!("tiers[{i}]");
        match &tier.tier_type {
            WaterfallTierType::ReturnOfCapital => {}
            WaterfallTierType::PreferredReturn { rate_pct } => {
                if *rate_pct < Decimal::ZERO {
                    return Err(DealCalcError::InvalidInput {
                        field,
                        reason: "Preferred return cannot be negative".into(),
                    });
                }
            }
            WaterfallTierType::Promote {
                lp_share_pct,
                gp_share_pct,
                lp_return_ceiling_pct,
            } => {
                let in_range = |v: Decimal| v >= Decimal::ZERO && v <= Decimal::ONE_HUNDRED;
                if !in_range(*lp_share_pct) || !in_range(*gp_share_pct) {
                    return Err(DealCalcError::InvalidInput {
                        field,
                        reason: "Promote shares must be between 0 and 100".into(),
                    });
                }
                if (*lp_share_pct + *gp_share_pct - Decimal::ONE_HUNDRED).abs() > dec!(0.0001) {
                    return Err(DealCalcError::InvalidInput {
                        field,
                        reason: format!(
                            "LP share ({lp_share_pct}%) + GP share ({gp_share_pct}%) must equal 100%"
                        ),
                    });
                }
                if lp_return_ceiling_pct.is_some_and(|c| c < Decimal::ZERO) {
                    return Err(DealCalcError::InvalidInput {
                        field,
                        reason: "Return ceiling cannot be negative".into(),
                    });
                }
            }
        }
    }

    let ends_uncapped = matches!(
        input.tiers.last().map(|t| &t.tier_type),
        Some(WaterfallTierType::Promote {
            lp_return_ceiling_pct: None,
            ..
        })
    );
    if !ends_uncapped {
        return Err(DealCalcError::InvalidInput {
            field: "tiers".into(),
            reason: "The last tier must be an uncapped promote split".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Scenario API
// ---------------------------------------------------------------------------

/// Waterfall of a scenario's adjusted cash flows plus projected sale equity.
pub fn distribute_scenario(
    deal: &DealAssumptions,
    scenario: &Scenario,
) -> DealCalcResult<ComputationOutput<WaterfallOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    deal.validate(&mut warnings)?;
    scenario.validate(&mut warnings)?;

    let input = cash_flow::CashFlowProjectionInput::for_scenario(deal, scenario)?;
    let projection = cash_flow::build_projection(&input, &mut warnings)?;
    let exit = valuation::build_exit(deal, scenario, projection.final_year_noi, &mut warnings)?;
    let waterfall_input = scenario_waterfall_input(
        deal,
        scenario,
        projection.total_adjusted,
        exit.projected_equity,
        &mut warnings,
    );
    let output = build_waterfall(&waterfall_input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "GP/LP Distribution Waterfall (compounded hurdles)",
        &waterfall_input,
        warnings,
        elapsed,
        output,
    ))
}

/// Distributable = Σ adjusted cash flow + projected equity, floored at 0.
/// Held to the allocation precision so tier sums stay exact.
pub(crate) fn scenario_waterfall_input(
    deal: &DealAssumptions,
    scenario: &Scenario,
    total_adjusted: Money,
    projected_equity: Option<Money>,
    warnings: &mut Vec<String>,
) -> WaterfallInput {
    let raw = total_adjusted + projected_equity.unwrap_or(Decimal::ZERO);
    if raw < Decimal::ZERO {
        warnings.push(format!(
            "Scenario {}: distributable cash is negative ({raw:.2}); nothing to distribute",
            scenario.id
        ));
    }
    WaterfallInput {
        distributable: raw.max(Decimal::ZERO).round_dp(ALLOCATION_DP),
        lp_capital: scenario.adjusted_raise,
        years_held: deal.exit.years_held,
        tiers: standard_tiers(&deal.distribution),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
