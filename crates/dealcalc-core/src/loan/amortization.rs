use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DealCalcError;
use crate::scenario::MAX_TERM_YEARS;
use crate::types::*;
use crate::DealCalcResult;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Input for a standalone loan analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed
    pub principal: Money,
    /// Annual interest rate (7.0 = 7%)
    pub annual_rate_pct: Percent,
    /// Term in years
    pub term_years: u32,
    /// Monthly payments already made (for remaining balance)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_made: Option<u32>,
    /// Include the year-by-year amortization schedule
    #[serde(default)]
    pub include_schedule: bool,
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub monthly_rate: Rate,
    pub num_payments: u32,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    /// Interest portion of the first monthly payment
    pub first_month_interest: Money,
    /// Interest paid over the full term
    pub total_interest: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AmortizationYear>>,
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Number of monthly payments in a term of `term_years`.
pub fn num_payments(term_years: u32) -> DealCalcResult<u32> {
    if term_years > MAX_TERM_YEARS {
        return Err(DealCalcError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Loan term cannot exceed {MAX_TERM_YEARS} years"),
        });
    }
    Ok(term_years * MONTHS_PER_YEAR)
}

/// Monthly rate as a decimal: annual / 12 / 100.
pub fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    annual_rate_pct / Decimal::from(MONTHS_PER_YEAR) / Decimal::ONE_HUNDRED
}

/// Level monthly payment (PMT): `P·r(1+r)^n / ((1+r)^n − 1)`.
///
/// Zero principal or zero term yields a zero payment. A zero rate falls back
/// to straight-line repayment of `principal / months`.
pub fn monthly_payment(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> DealCalcResult<Money> {
    check_rate(annual_rate_pct)?;
    let n = num_payments(term_years)?;
    if principal <= Decimal::ZERO || n == 0 {
        return Ok(Decimal::ZERO);
    }

    let r = monthly_rate(annual_rate_pct);
    if r.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let growth = compound(r, n)?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return Err(DealCalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * r * growth / denominator)
}

/// Annual debt service: monthly payment × 12.
pub fn annual_debt_service(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> DealCalcResult<Money> {
    Ok(monthly_payment(principal, annual_rate_pct, term_years)? * Decimal::from(MONTHS_PER_YEAR))
}

/// Principal still owed after `nper` level payments of `pmt` on `pv`:
/// `pv(1+r)^n − pmt((1+r)^n − 1)/r`. Never negative.
pub fn future_value(rate: Rate, nper: u32, pmt: Money, pv: Money) -> DealCalcResult<Money> {
    let remaining = if rate.is_zero() {
        pv - pmt * Decimal::from(nper)
    } else {
        let growth = compound(rate, nper)?;
        pv * growth - pmt * (growth - Decimal::ONE) / rate
    };
    Ok(remaining.max(Decimal::ZERO))
}

/// Remaining principal after `payments_made` monthly payments.
///
/// Zero when nothing was borrowed or no payments are counted.
pub fn remaining_balance(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
    payments_made: u32,
) -> DealCalcResult<Money> {
    check_rate(annual_rate_pct)?;
    if principal <= Decimal::ZERO || term_years == 0 || payments_made == 0 {
        return Ok(Decimal::ZERO);
    }

    let payment = monthly_payment(principal, annual_rate_pct, term_years)?;
    future_value(monthly_rate(annual_rate_pct), payments_made, payment, principal)
}

/// Interest portion of the payment in `period` (IPMT, 1-based months).
pub fn interest_payment(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
    period: u32,
) -> DealCalcResult<Money> {
    check_rate(annual_rate_pct)?;
    let n = num_payments(term_years)?;
    if principal <= Decimal::ZERO || term_years == 0 || period < 1 || period > n {
        return Ok(Decimal::ZERO);
    }

    let r = monthly_rate(annual_rate_pct);
    if r.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let opening = if period == 1 {
        principal
    } else {
        let growth_n = compound(r, n)?;
        let growth_k = compound(r, period - 1)?;
        principal * (growth_n - growth_k) / (growth_n - Decimal::ONE)
    };

    Ok(opening * r)
}

/// Year-by-year amortization built from monthly payments.
///
/// The final payment clears whatever balance is left so the schedule
/// always closes at exactly zero.
pub fn amortization_schedule(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> DealCalcResult<Vec<AmortizationYear>> {
    let payment = monthly_payment(principal, annual_rate_pct, term_years)?;
    if payment.is_zero() {
        return Ok(Vec::new());
    }

    let r = monthly_rate(annual_rate_pct);
    let n = num_payments(term_years)?;
    let mut balance = principal;
    let mut years = Vec::with_capacity(term_years as usize);

    for year in 1..=term_years {
        let opening_balance = balance;
        let mut interest = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;

        for month in 1..=MONTHS_PER_YEAR {
            let period = (year - 1) * MONTHS_PER_YEAR + month;
            let month_interest = balance * r;
            let month_principal = if period == n {
                balance
            } else {
                (payment - month_interest).min(balance)
            };
            interest += month_interest;
            principal_paid += month_principal;
            balance -= month_principal;
        }

        years.push(AmortizationYear {
            year,
            opening_balance,
            interest,
            principal: principal_paid,
            closing_balance: balance,
        });
    }

    Ok(years)
}

/// Analyse a single loan: payment, debt service, interest and balances.
pub fn analyze_loan(input: &LoanInput) -> DealCalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal <= Decimal::ZERO {
        return Err(DealCalcError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal must be positive".into(),
        });
    }
    if input.term_years == 0 {
        return Err(DealCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }
    check_rate(input.annual_rate_pct)?;

    let total_payments = num_payments(input.term_years)?;
    if input.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate; payment is straight-line principal".into());
    }
    if let Some(k) = input.payments_made {
        if k > total_payments {
            warnings.push(format!(
                "{k} payments made exceeds the {total_payments}-payment term; balance is zero"
            ));
        }
    }

    let monthly_payment = monthly_payment(input.principal, input.annual_rate_pct, input.term_years)?;
    let annual_debt_service = monthly_payment * Decimal::from(MONTHS_PER_YEAR);
    let first_month_interest =
        interest_payment(input.principal, input.annual_rate_pct, input.term_years, 1)?;
    let total_interest = monthly_payment * Decimal::from(total_payments) - input.principal;

    let remaining_balance = match input.payments_made {
        Some(k) => Some(remaining_balance(
            input.principal,
            input.annual_rate_pct,
            input.term_years,
            k,
        )?),
        None => None,
    };

    let schedule = if input.include_schedule {
        Some(amortization_schedule(
            input.principal,
            input.annual_rate_pct,
            input.term_years,
        )?)
    } else {
        None
    };

    let output = LoanOutput {
        monthly_rate: monthly_rate(input.annual_rate_pct),
        num_payments: total_payments,
        monthly_payment,
        annual_debt_service,
        first_month_interest,
        total_interest,
        remaining_balance,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Mortgage Amortization (monthly)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_rate(annual_rate_pct: Percent) -> DealCalcResult<()> {
    if annual_rate_pct < Decimal::ZERO {
        return Err(DealCalcError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    Ok(())
}

/// `(1 + r)^n`, failing instead of overflowing.
fn compound(r: Rate, n: u32) -> DealCalcResult<Decimal> {
    (Decimal::ONE + r)
        .checked_powu(u64::from(n))
        .ok_or_else(|| {
            DealCalcError::FinancialImpossibility(format!(
                "(1 + {r})^{n} exceeds decimal range"
            ))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_30yr_6pct() {
        // Standard table value: $100k at 6% for 30 years = $599.55
        let pmt = monthly_payment(dec!(100000), dec!(6), 30).unwrap();
        assert_eq!(pmt.round_dp(2), dec!(599.55));
    }

    #[test]
    fn test_payment_15yr_5pct() {
        let pmt = monthly_payment(dec!(200000), dec!(5), 15).unwrap();
        assert_eq!(pmt.round_dp(2), dec!(1581.59));
    }

    #[test]
    fn test_payment_zero_rate_straight_line() {
        let pmt = monthly_payment(dec!(120000), dec!(0), 10).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_payment_zero_principal_or_term() {
        assert_eq!(monthly_payment(dec!(0), dec!(7), 25).unwrap(), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(1000), dec!(7), 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(monthly_payment(dec!(1000), dec!(-1), 10).is_err());
    }

    #[test]
    fn test_remaining_balance_after_full_term_is_zero() {
        let bal = remaining_balance(dec!(412500), dec!(7), 25, 300).unwrap();
        assert!(bal < dec!(0.01), "expected ~0, got {bal}");
    }

    #[test]
    fn test_remaining_balance_without_payments_is_zero() {
        let bal = remaining_balance(dec!(412500), dec!(7), 25, 0).unwrap();
        assert_eq!(bal, Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_zero_rate() {
        // 120 of 240 straight-line payments => half the principal left
        let bal = remaining_balance(dec!(240000), dec!(0), 20, 120).unwrap();
        assert_eq!(bal, dec!(120000));
    }

    #[test]
    fn test_remaining_balance_declines() {
        let after_5 = remaining_balance(dec!(100000), dec!(6), 30, 60).unwrap();
        let after_10 = remaining_balance(dec!(100000), dec!(6), 30, 120).unwrap();
        assert!(after_5 > after_10);
        // Known table value after 10 years: ~$83,685
        assert!((after_10 - dec!(83685)).abs() < dec!(5));
    }

    #[test]
    fn test_interest_payment_first_period() {
        // First month interest = 100,000 * 0.06 / 12 = 500
        let ipmt = interest_payment(dec!(100000), dec!(6), 30, 1).unwrap();
        assert_eq!(ipmt, dec!(500));
    }

    #[test]
    fn test_interest_payment_matches_balance() {
        // Interest in period k = balance after k-1 payments * monthly rate
        let k = 61;
        let ipmt = interest_payment(dec!(100000), dec!(6), 30, k).unwrap();
        let bal = remaining_balance(dec!(100000), dec!(6), 30, k - 1).unwrap();
        assert!((ipmt - bal * dec!(0.005)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_interest_payment_out_of_range() {
        assert_eq!(interest_payment(dec!(1000), dec!(6), 1, 0).unwrap(), Decimal::ZERO);
        assert_eq!(interest_payment(dec!(1000), dec!(6), 1, 13).unwrap(), Decimal::ZERO);
        assert_eq!(interest_payment(dec!(1000), dec!(0), 1, 1).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let schedule = amortization_schedule(dec!(100000), dec!(6), 30).unwrap();
        assert_eq!(schedule.len(), 30);
        assert_eq!(schedule[0].opening_balance, dec!(100000));
        assert_eq!(schedule[29].closing_balance, Decimal::ZERO);

        let total_principal: Money = schedule.iter().map(|y| y.principal).sum();
        assert!((total_principal - dec!(100000)).abs() < dec!(0.000001));

        // Year 10 closing balance agrees with the closed-form balance
        let closed_form = remaining_balance(dec!(100000), dec!(6), 30, 120).unwrap();
        assert!((schedule[9].closing_balance - closed_form).abs() < dec!(0.01));
    }

    #[test]
    fn test_analyze_loan_output() {
        let input = LoanInput {
            principal: dec!(100000),
            annual_rate_pct: dec!(6),
            term_years: 30,
            payments_made: Some(120),
            include_schedule: false,
        };
        let out = analyze_loan(&input).unwrap().result;
        assert_eq!(out.num_payments, 360);
        assert_eq!(out.monthly_rate, dec!(0.005));
        assert_eq!(out.monthly_payment.round_dp(2), dec!(599.55));
        assert_eq!(out.annual_debt_service, out.monthly_payment * dec!(12));
        assert_eq!(out.first_month_interest, dec!(500));
        assert!(out.remaining_balance.is_some());
        assert!(out.schedule.is_none());
        // 360 * 599.55 - 100,000 ≈ 115,838
        assert!((out.total_interest - dec!(115838)).abs() < dec!(5));
    }

    #[test]
    fn test_term_bound() {
        assert_eq!(num_payments(MAX_TERM_YEARS).unwrap(), 1200);
        assert!(monthly_payment(dec!(100000), dec!(6), MAX_TERM_YEARS).is_ok());
        assert!(matches!(
            monthly_payment(dec!(100000), dec!(6), 400_000_000),
            Err(DealCalcError::InvalidInput { .. })
        ));
        assert!(interest_payment(dec!(100000), dec!(6), MAX_TERM_YEARS + 1, 1).is_err());

        let input = LoanInput {
            principal: dec!(100000),
            annual_rate_pct: dec!(6),
            term_years: 400_000_000,
            payments_made: None,
            include_schedule: false,
        };
        match analyze_loan(&input) {
            Err(DealCalcError::InvalidInput { field, .. }) => assert_eq!(field, "term_years"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_loan_rejects_zero_principal() {
        let input = LoanInput {
            principal: dec!(0),
            annual_rate_pct: dec!(6),
            term_years: 30,
            payments_made: None,
            include_schedule: true,
        };
        match analyze_loan(&input) {
            Err(DealCalcError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }
}
