use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::DealAssumptions;
use crate::comparison::analysis::{build_analysis, ScenarioAnalysis};
use crate::error::DealCalcError;
use crate::format::{
    format_currency, format_multiple, format_number, format_percentage, or_na,
};
use crate::types::*;
use crate::DealCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One labelled line of the side-by-side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub section: String,
    pub metric: String,
    /// One formatted value per scenario, in scenario order
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub project_name: String,
    pub scenario_ids: Vec<u32>,
    pub rows: Vec<ComparisonRow>,
    pub analyses: Vec<ScenarioAnalysis>,
}

impl ComparisonReport {
    /// Rows belonging to `section`, in display order.
    pub fn section(&self, section: &str) -> impl Iterator<Item = &ComparisonRow> {
        let section = section.to_string();
        self.rows.iter().filter(move |r| r.section == section)
    }

    pub fn row(&self, section: &str, metric: &str) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|r| r.section == section && r.metric == metric)
    }
}

pub const SECTION_PROJECT: &str = "Project Details";
pub const SECTION_FINANCING: &str = "Financing Details";
pub const SECTION_YEAR_ONE: &str = "Year 1 Performance";
pub const SECTION_TEN_YEAR: &str = "10-Year Performance";
pub const SECTION_EXIT: &str = "Exit & Returns";
pub const SECTION_WATERFALL: &str = "Waterfall Distribution";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse every scenario of a deal and lay the results side by side.
pub fn compare_scenarios(
    deal: &DealAssumptions,
) -> DealCalcResult<ComputationOutput<ComparisonReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if deal.scenarios.is_empty() {
        return Err(DealCalcError::InsufficientData(
            "At least one scenario is required for a comparison".into(),
        ));
    }
    deal.validate(&mut warnings)?;

    let analyses = deal
        .scenarios
        .iter()
        .map(|s| build_analysis(deal, s, &mut warnings))
        .collect::<DealCalcResult<Vec<_>>>()?;

    let report = ComparisonReport {
        project_name: deal.project.project_name.clone(),
        scenario_ids: analyses.iter().map(|a| a.scenario.id).collect(),
        rows: build_rows(deal, &analyses),
        analyses,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-Side Scenario Comparison",
        deal,
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Row layout
// ---------------------------------------------------------------------------

struct RowBuilder<'a> {
    analyses: &'a [ScenarioAnalysis],
    section: &'static str,
    rows: Vec<ComparisonRow>,
}

impl<'a> RowBuilder<'a> {
    fn section(&mut self, name: &'static str) -> &mut Self {
        self.section = name;
        self
    }

    fn row(&mut self, metric: &str, value: impl Fn(&ScenarioAnalysis) -> String) -> &mut Self {
        self.rows.push(ComparisonRow {
            section: self.section.to_string(),
            metric: metric.to_string(),
            values: self.analyses.iter().map(&value).collect(),
        });
        self
    }
}

fn build_rows(deal: &DealAssumptions, analyses: &[ScenarioAnalysis]) -> Vec<ComparisonRow> {
    let p = &deal.project;
    let mut b = RowBuilder {
        analyses,
        section: SECTION_PROJECT,
        rows: Vec::new(),
    };

    b.row("Project Name", |_| p.project_name.clone())
        .row("Asset Class", |_| p.asset_class.clone())
        .row("Anticipated Start", |_| p.anticipated_start.format("%Y-%m-%d").to_string())
        .row("Project Cost", |_| format_currency(p.project_cost))
        .row("Total Sq Ft", |_| format_number(p.total_sqft.into(), 0));

    b.section(SECTION_FINANCING)
        .row("Type", |a| a.scenario.financing_type.to_string())
        .row("Loan Amount", |a| format_currency(a.loan.loan_amount))
        .row("Down Payment", |a| format_currency(a.loan.down_payment))
        .row("Raise", |a| format_currency(a.loan.raise_amount))
        .row("Reserve Cash", |a| format_currency(a.loan.reserve_cash))
        .row("Rate", |a| format_percentage(a.scenario.rate, 2))
        .row("Term", |a| a.scenario.term.to_string())
        .row("Loan %", |a| format_percentage(a.scenario.loan_percent, 2))
        .row("Down %", |a| format_percentage(a.scenario.down_payment_percent, 2))
        .row("Adjusted Raise", |a| format_currency(a.scenario.adjusted_raise))
        .row("Monthly Payment", |a| format_currency(a.debt_service.monthly_payment));

    b.section(SECTION_YEAR_ONE)
        .row("Gross Income", |a| format_currency(a.debt_service.projected_income_year_1))
        .row("NOI", |a| format_currency(a.debt_service.noi_year_1))
        .row("DSCR", |a| or_na(a.debt_service.dscr, |v| format_number(v, 3)))
        .row("DSCR Rating", |a| or_na(a.debt_service.rating, |r| r.description().to_string()))
        .row("Debt Service", |a| format_currency(a.debt_service.annual_debt_service));

    b.section(SECTION_TEN_YEAR)
        .row("Total Cash Flow", |a| format_currency(a.cash_flow.total_cash_flow))
        .row("Avg Annual Cash Flow", |a| format_currency(a.cash_flow.average_cash_flow))
        .row("Total Adjusted Cash Flow", |a| format_currency(a.cash_flow.total_adjusted))
        .row("Minimum DSCR", |a| or_na(a.cash_flow.minimum_dscr, |v| format_number(v, 3)));

    b.section(SECTION_EXIT)
        .row("Year 10 NOI", |a| format_currency(a.exit.final_year_noi))
        .row("Exit Price", |a| or_na(a.exit.exit_price, format_currency))
        .row("Remaining Principal", |a| format_currency(a.exit.remaining_principal))
        .row("Projected Equity", |a| or_na(a.exit.projected_equity, format_currency))
        .row("Project IRR", |a| or_na(a.returns.irr_pct, |v| format_percentage(v, 2)))
        .row("Cash On Cash", |a| or_na(a.returns.cash_on_cash, format_multiple));

    b.section(SECTION_WATERFALL)
        .row("Distributable", |a| format_currency(a.waterfall.distributable))
        .row("GP Return", |a| format_currency(a.waterfall.total_to_gp))
        .row("LP Return", |a| format_currency(a.waterfall.total_to_lp))
        .row("LP Multiple", |a| or_na(a.waterfall.lp_multiple, format_multiple));

    b.rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{FinancingType, ScenarioSet};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn three_way_deal() -> DealAssumptions {
        let mut deal = DealAssumptions::with_scenarios(3).unwrap();
        deal.scenarios.get_mut(2).unwrap().rate = dec!(6);
        let cash = deal.scenarios.get_mut(3).unwrap();
        cash.financing_type = FinancingType::Cash;
        cash.adjusted_raise = dec!(550000);
        deal
    }

    #[test]
    fn test_one_column_per_scenario() {
        let report = compare_scenarios(&three_way_deal()).unwrap().result;
        assert_eq!(report.scenario_ids, vec![1, 2, 3]);
        assert_eq!(report.analyses.len(), 3);
        assert!(report.rows.iter().all(|r| r.values.len() == 3));
    }

    #[test]
    fn test_sections_in_order() {
        let report = compare_scenarios(&three_way_deal()).unwrap().result;
        let mut sections: Vec<&str> = Vec::new();
        for row in &report.rows {
            if sections.last() != Some(&row.section.as_str()) {
                sections.push(&row.section);
            }
        }
        assert_eq!(
            sections,
            vec![
                SECTION_PROJECT,
                SECTION_FINANCING,
                SECTION_YEAR_ONE,
                SECTION_TEN_YEAR,
                SECTION_EXIT,
                SECTION_WATERFALL
            ]
        );
    }

    #[test]
    fn test_formatted_values() {
        let report = compare_scenarios(&three_way_deal()).unwrap().result;
        let cost = report.row(SECTION_PROJECT, "Project Cost").unwrap();
        assert_eq!(cost.values[0], "$550,000.00");
        let loan = report.row(SECTION_FINANCING, "Loan Amount").unwrap();
        assert_eq!(loan.values[0], "$412,500.00");
        let kind = report.row(SECTION_FINANCING, "Type").unwrap();
        assert_eq!(kind.values, vec!["Loan", "Loan", "Cash"]);
        let rate = report.row(SECTION_FINANCING, "Rate").unwrap();
        assert_eq!(rate.values[1], "6.00%");
    }

    #[test]
    fn test_cash_scenario_dscr_is_na() {
        let report = compare_scenarios(&three_way_deal()).unwrap().result;
        let dscr = report.row(SECTION_YEAR_ONE, "DSCR").unwrap();
        assert_ne!(dscr.values[0], "N/A");
        assert_eq!(dscr.values[2], "N/A");
        let rating = report.row(SECTION_YEAR_ONE, "DSCR Rating").unwrap();
        assert_eq!(rating.values[2], "N/A");
        let expected = report.analyses[0].debt_service.rating.unwrap().description();
        assert_eq!(rating.values[0], expected);
        assert_eq!(report.section(SECTION_WATERFALL).count(), 4);
    }

    #[test]
    fn test_empty_deal_rejected() {
        let deal = DealAssumptions {
            scenarios: ScenarioSet::new(),
            ..DealAssumptions::default()
        };
        assert!(matches!(
            compare_scenarios(&deal),
            Err(DealCalcError::InsufficientData(_))
        ));
    }
}
