use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::loan::amortization;
use crate::scenario::{FinancingType, Scenario};
use crate::types::*;
use crate::DealCalcResult;

/// Sources of capital implied by a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanMetrics {
    /// Project cost × loan %
    pub loan_amount: Money,
    /// Project cost × down payment %
    pub down_payment: Money,
    /// Down payment + additional startup
    pub raise_amount: Money,
    /// Adjusted raise − raise (negative means a shortfall)
    pub reserve_cash: Money,
}

/// Debt terms for a scenario. All zero for scenarios without debt service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTerms {
    pub financing_type: FinancingType,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
}

pub fn loan_metrics(project_cost: Money, scenario: &Scenario) -> LoanMetrics {
    let loan_amount = project_cost * pct_to_rate(scenario.loan_percent);
    let down_payment = project_cost * pct_to_rate(scenario.down_payment_percent);
    let raise_amount = down_payment + scenario.additional_startup;
    LoanMetrics {
        loan_amount,
        down_payment,
        raise_amount,
        reserve_cash: scenario.adjusted_raise - raise_amount,
    }
}

pub fn debt_terms(project_cost: Money, scenario: &Scenario) -> DealCalcResult<DebtTerms> {
    let loan_amount = loan_metrics(project_cost, scenario).loan_amount;
    let monthly_payment = if scenario.financing_type.carries_debt_service() {
        amortization::monthly_payment(loan_amount, scenario.rate, scenario.term)?
    } else {
        Decimal::ZERO
    };
    Ok(DebtTerms {
        financing_type: scenario.financing_type,
        loan_amount,
        monthly_payment,
        annual_debt_service: monthly_payment * Decimal::from(12),
    })
}
