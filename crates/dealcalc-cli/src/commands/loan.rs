use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dealcalc_core::loan::amortization::{self, LoanInput};

use crate::input;

/// Arguments for a standalone loan analysis
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (7 = 7%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Monthly payments already made, for the remaining balance
    #[arg(long)]
    pub payments_made: Option<u32>,

    /// Include the yearly amortization schedule
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.term.ok_or("--term is required (or provide --input)")?,
            payments_made: args.payments_made,
            include_schedule: args.schedule,
        }
    };

    let result = amortization::analyze_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}
