use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::DealCalcError;
use crate::types::{Money, Rate};
use crate::DealCalcResult;

/// Starting estimate for the Newton-Raphson IRR search.
pub const IRR_INITIAL_GUESS: Rate = dec!(0.1);
/// Both the NPV convergence test and the flat-derivative bailout use this.
pub const IRR_TOLERANCE: Decimal = dec!(0.000001);
pub const MAX_IRR_ITERATIONS: u32 = 100;
/// Estimates at or below this rate end the search as undefined.
pub const IRR_RATE_FLOOR: Rate = dec!(-1);

/// Net Present Value of a series of annual cash flows (index 0 undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DealCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(DealCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_derivative(rate, cash_flows)
        .map(|(value, _)| value)
        .ok_or_else(|| DealCalcError::FinancialImpossibility(format!(
            "NPV at rate {rate} overflows decimal precision"
        )))
}

/// Internal Rate of Return using Newton-Raphson from the standard 10% guess.
///
/// Fails with `ConvergenceFailure` when the NPV cannot be driven below
/// [`IRR_TOLERANCE`] within [`MAX_IRR_ITERATIONS`] steps, when the NPV
/// curve goes flat, or when the estimate lands on a rate where the discount
/// factor is undefined, or when an estimate reaches [`IRR_RATE_FLOOR`].
/// Callers that present results treat the error as an undefined IRR.
pub fn irr(cash_flows: &[Money]) -> DealCalcResult<Rate> {
    irr_with_guess(cash_flows, IRR_INITIAL_GUESS)
}

/// Newton-Raphson IRR from an explicit starting estimate.
pub fn irr_with_guess(cash_flows: &[Money], guess: Rate) -> DealCalcResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DealCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;
    let mut npv_val = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        if rate <= IRR_RATE_FLOOR {
            warn!(iteration = i, %rate, "IRR estimate fell to -100% or below");
            return Err(non_convergence(i, npv_val));
        }

        let Some((value, derivative)) = npv_and_derivative(rate, cash_flows) else {
            warn!(iteration = i, %rate, "IRR discount factor undefined");
            return Err(non_convergence(i, npv_val));
        };
        npv_val = value;

        if npv_val.abs() < IRR_TOLERANCE {
            debug!(iterations = i, %rate, "IRR converged");
            return Ok(rate);
        }

        if derivative.abs() < IRR_TOLERANCE {
            warn!(iteration = i, %rate, npv = %npv_val, "IRR derivative vanished");
            return Err(non_convergence(i, npv_val));
        }

        rate = match npv_val
            .checked_div(derivative)
            .and_then(|step| rate.checked_sub(step))
        {
            Some(next) => next,
            None => return Err(non_convergence(i, npv_val)),
        };
    }

    warn!(iterations = MAX_IRR_ITERATIONS, npv = %npv_val, "IRR did not converge");
    Err(non_convergence(MAX_IRR_ITERATIONS, npv_val))
}

fn non_convergence(iterations: u32, last_delta: Decimal) -> DealCalcError {
    DealCalcError::ConvergenceFailure {
        function: "IRR".into(),
        iterations,
        last_delta,
    }
}

/// NPV and its first derivative with respect to the rate.
///
/// `None` when `1 + rate` is zero or an intermediate term overflows.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    let mut discount = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        value = value.checked_add(cf.checked_div(discount)?)?;

        if t > 0 {
            let t_dec = Decimal::from(t as i64);
            let next_discount = discount.checked_mul(one_plus_r)?;
            let term = t_dec.checked_mul(*cf)?.checked_div(next_discount)?;
            derivative = derivative.checked_sub(term)?;
        }
    }

    Some((value, derivative))
}
