use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealCalcError;
use crate::scenario::{check_percent, ScenarioSet};
use crate::types::{Money, Percent};
use crate::DealCalcResult;

// ---------------------------------------------------------------------------
// Project-level inputs (shared by every scenario)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDetails {
    pub project_name: String,
    pub asset_class: String,
    pub anticipated_start: NaiveDate,
    /// Total acquisition / development cost
    pub project_cost: Money,
    pub total_sqft: u32,
    /// Year-1 rent per square foot
    pub price_per_sqft: Money,
    /// Annual growth of price per square foot
    pub income_escalator_pct: Percent,
    /// Annual growth of operating costs
    pub cost_escalator_pct: Percent,
}

impl Default for ProjectDetails {
    fn default() -> Self {
        Self {
            project_name: "620 Glen Iris Unit 101".into(),
            asset_class: "Mixed-Use".into(),
            anticipated_start: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or_default(),
            project_cost: dec!(550000.0),
            total_sqft: 1500,
            price_per_sqft: dec!(35.0),
            income_escalator_pct: dec!(3.0),
            cost_escalator_pct: Decimal::ZERO,
        }
    }
}

/// Annual operating costs in dollars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingCosts {
    pub hoa_fee: Money,
    pub cam_fee: Money,
    pub property_taxes: Money,
    pub insurance: Money,
    pub misc: Money,
    pub other: Money,
}

impl OperatingCosts {
    pub fn annual_total(&self) -> Money {
        self.hoa_fee + self.cam_fee + self.property_taxes + self.insurance + self.misc + self.other
    }

    fn components(&self) -> [(&'static str, Money); 6] {
        [
            ("hoa_fee", self.hoa_fee),
            ("cam_fee", self.cam_fee),
            ("property_taxes", self.property_taxes),
            ("insurance", self.insurance),
            ("misc", self.misc),
            ("other", self.other),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitAssumptions {
    pub exit_cap_rate_pct: Percent,
    pub years_held: u32,
    /// Monthly loan payments made before the sale
    pub total_payments_made: u32,
    /// Cap rate shift used for the exit sensitivity rows
    pub cap_rate_step_pct: Percent,
}

impl Default for ExitAssumptions {
    fn default() -> Self {
        Self {
            exit_cap_rate_pct: dec!(6.50),
            years_held: 10,
            total_payments_made: 120,
            cap_rate_step_pct: dec!(0.5),
        }
    }
}

/// One promote split of the distribution waterfall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoteTier {
    pub name: String,
    pub lp_share_pct: Percent,
    pub gp_share_pct: Percent,
    /// Annual LP return at which the tier stops. `None` takes the balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lp_return_ceiling_pct: Option<Percent>,
}

impl PromoteTier {
    pub fn new(name: &str, lp_share_pct: Percent, ceiling: Option<Percent>) -> Self {
        Self {
            name: name.into(),
            lp_share_pct,
            gp_share_pct: Decimal::ONE_HUNDRED - lp_share_pct,
            lp_return_ceiling_pct: ceiling,
        }
    }
}

fn default_promote_tiers() -> Vec<PromoteTier> {
    vec![
        PromoteTier::new("Tier 1", dec!(80), Some(dec!(15))),
        PromoteTier::new("Tier 2", dec!(70), Some(dec!(50))),
        PromoteTier::new("Tier 3", dec!(50), None),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionAssumptions {
    /// Share of annual cash flow treated as distributable
    pub adjusted_pct: Percent,
    /// GP share of the adjusted annual cash flow
    pub cash_flow_gp_pct: Percent,
    /// LP share of the adjusted annual cash flow
    pub cash_flow_lp_pct: Percent,
    /// Waterfall GP ownership
    pub gp_pct: Percent,
    /// Waterfall LP ownership
    pub lp_pct: Percent,
    /// Annual preferred return owed to LPs before any promote
    pub hurdle_rate_pct: Percent,
    pub promote_tiers: Vec<PromoteTier>,
}

impl Default for DistributionAssumptions {
    fn default() -> Self {
        Self {
            adjusted_pct: dec!(85.0),
            cash_flow_gp_pct: dec!(20.0),
            cash_flow_lp_pct: dec!(80.0),
            gp_pct: dec!(20.0),
            lp_pct: dec!(80.0),
            hurdle_rate_pct: dec!(8.0),
            promote_tiers: default_promote_tiers(),
        }
    }
}

// ---------------------------------------------------------------------------
// Whole deal document
// ---------------------------------------------------------------------------

/// Every input needed to analyse and compare the scenarios of one deal.
///
/// All sections default, so a deal file only needs the fields it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealAssumptions {
    pub project: ProjectDetails,
    pub operating_costs: OperatingCosts,
    pub exit: ExitAssumptions,
    pub distribution: DistributionAssumptions,
    pub scenarios: ScenarioSet,
}

impl DealAssumptions {
    /// Default deal with `scenario_count` template scenarios.
    pub fn with_scenarios(scenario_count: usize) -> DealCalcResult<Self> {
        Ok(Self {
            scenarios: ScenarioSet::with_defaults(scenario_count)?,
            ..Self::default()
        })
    }

    pub fn annual_costs(&self) -> Money {
        self.operating_costs.annual_total()
    }

    /// Validate project-level inputs. Scenarios are checked separately
    /// via [`crate::scenario::Scenario::validate`].
    pub fn validate(&self, warnings: &mut Vec<String>) -> DealCalcResult<()> {
        let p = &self.project;
        if p.project_cost < Decimal::ZERO {
            return Err(DealCalcError::InvalidInput {
                field: "project.project_cost".into(),
                reason: "Project cost cannot be negative".into(),
            });
        }
        if p.price_per_sqft < Decimal::ZERO {
            return Err(DealCalcError::InvalidInput {
                field: "project.price_per_sqft".into(),
                reason: "Price per square foot cannot be negative".into(),
            });
        }
        check_percent("project.income_escalator_pct", p.income_escalator_pct)?;
        check_percent("project.cost_escalator_pct", p.cost_escalator_pct)?;

        for (name, amount) in self.operating_costs.components() {
            if amount < Decimal::ZERO {
                return Err(DealCalcError::InvalidInput {
                    field: format!("operating_costs.{name}"),
                    reason: "Operating costs cannot be negative".into(),
                });
            }
        }

        let e = &self.exit;
        check_percent("exit.exit_cap_rate_pct", e.exit_cap_rate_pct)?;
        check_percent("exit.cap_rate_step_pct", e.cap_rate_step_pct)?;
        if e.years_held == 0 {
            return Err(DealCalcError::InvalidInput {
                field: "exit.years_held".into(),
                reason: "Holding period must be at least 1 year".into(),
            });
        }
        if e.exit_cap_rate_pct.is_zero() {
            warnings.push("Exit cap rate is 0%; exit price is undefined".into());
        }

        let d = &self.distribution;
        check_percent("distribution.adjusted_pct", d.adjusted_pct)?;
        check_percent("distribution.cash_flow_gp_pct", d.cash_flow_gp_pct)?;
        check_percent("distribution.cash_flow_lp_pct", d.cash_flow_lp_pct)?;
        check_percent("distribution.gp_pct", d.gp_pct)?;
        check_percent("distribution.lp_pct", d.lp_pct)?;
        check_percent("distribution.hurdle_rate_pct", d.hurdle_rate_pct)?;

        if (d.gp_pct + d.lp_pct - Decimal::ONE_HUNDRED).abs() > dec!(0.01) {
            warnings.push(format!(
                "GP % ({}%) + LP % ({}%) ≠ 100%",
                d.gp_pct, d.lp_pct
            ));
        }
        if (d.cash_flow_gp_pct + d.cash_flow_lp_pct - Decimal::ONE_HUNDRED).abs() > dec!(0.01) {
            warnings.push(format!(
                "Cash flow GP % ({}%) + LP % ({}%) ≠ 100%",
                d.cash_flow_gp_pct, d.cash_flow_lp_pct
            ));
        }

        Ok(())
    }
}
