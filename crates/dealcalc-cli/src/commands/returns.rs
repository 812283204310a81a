use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dealcalc_core::exit::returns::{self, IrrInput};

use super::deal::{run_per_scenario, DealArgs};

/// Arguments for IRR, either over explicit flows or per scenario
#[derive(Args)]
pub struct IrrArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Explicit cash flows, period 0 first (e.g. "-175000,20000,...")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting estimate for explicit flows (0.1 = 10%)
    #[arg(long, requires = "cash_flows")]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(cash_flows) = args.cash_flows {
        let input = IrrInput {
            cash_flows,
            guess: args.guess,
        };
        let result = returns::solve_irr(&input)?;
        return Ok(serde_json::to_value(result)?);
    }

    run_per_scenario(&args.deal, returns::scenario_returns)
}
