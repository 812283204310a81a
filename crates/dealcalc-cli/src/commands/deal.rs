use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use dealcalc_core::comparison::report;
use dealcalc_core::exit::valuation;
use dealcalc_core::projection::{cash_flow, dscr};
use dealcalc_core::types::ComputationOutput;
use dealcalc_core::waterfall::distribution::{self, WaterfallInput};
use dealcalc_core::{DealAssumptions, DealCalcResult, Scenario, ScenarioSet};

use crate::input;

/// Where the deal comes from and which scenarios to run
#[derive(Args)]
pub struct DealArgs {
    /// Path to a JSON/YAML deal file (otherwise stdin, then defaults)
    #[arg(long)]
    pub input: Option<String>,

    /// Template scenarios to use when the deal defines none (1-3)
    #[arg(long, default_value_t = 1)]
    pub scenarios: usize,

    /// Run a single scenario by id
    #[arg(long)]
    pub scenario: Option<u32>,
}

/// Deal from `--input`, piped stdin, or the built-in defaults.
pub fn load_deal(args: &DealArgs) -> Result<DealAssumptions, Box<dyn std::error::Error>> {
    let mut deal: DealAssumptions = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        DealAssumptions::default()
    };

    if deal.scenarios.is_empty() {
        debug!(count = args.scenarios, "deal has no scenarios, using templates");
        deal.scenarios = ScenarioSet::with_defaults(args.scenarios)?;
    }
    Ok(deal)
}

/// Run `op` for the selected scenario, or for every scenario as
/// `{"results": [...]}`.
pub fn run_per_scenario<T, F>(args: &DealArgs, op: F) -> Result<Value, Box<dyn std::error::Error>>
where
    T: Serialize,
    F: Fn(&DealAssumptions, &Scenario) -> DealCalcResult<ComputationOutput<T>>,
{
    let deal = load_deal(args)?;

    if let Some(id) = args.scenario {
        let scenario = deal.scenarios.get(id)?;
        return Ok(serde_json::to_value(op(&deal, scenario)?)?);
    }

    let results = deal
        .scenarios
        .iter()
        .map(|s| op(&deal, s))
        .collect::<DealCalcResult<Vec<_>>>()?;
    Ok(json!({ "results": results }))
}

pub fn run_debt_service(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_per_scenario(&args, dscr::analyze_debt_service)
}

pub fn run_cash_flow(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_per_scenario(&args, cash_flow::project_scenario)
}

pub fn run_exit(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_per_scenario(&args, valuation::value_scenario_exit)
}

/// Arguments for the GP/LP waterfall
#[derive(Args)]
pub struct WaterfallArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Treat the input as a standalone waterfall (distributable, lp_capital,
    /// years_held, tiers) instead of a deal
    #[arg(long)]
    pub raw: bool,
}

pub fn run_waterfall(args: WaterfallArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if !args.raw {
        return run_per_scenario(&args.deal, distribution::distribute_scenario);
    }

    let wf_input: WaterfallInput = if let Some(ref path) = args.deal.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for --raw waterfall".into());
    };
    let result = distribution::calculate_waterfall(&wf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.scenario.is_some() {
        return Err("compare always runs every scenario; drop --scenario".into());
    }
    let deal = load_deal(&args)?;
    let result = report::compare_scenarios(&deal)?;
    Ok(serde_json::to_value(result)?)
}
