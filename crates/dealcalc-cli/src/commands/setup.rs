use clap::Args;
use serde_json::Value;

use dealcalc_core::DealAssumptions;

/// Arguments for printing a starter deal document
#[derive(Args)]
pub struct InitArgs {
    /// Number of template scenarios (1-3)
    #[arg(long, default_value_t = 1)]
    pub scenarios: usize,

    /// Emit YAML instead of the selected output format
    #[arg(long)]
    pub yaml: bool,
}

fn default_deal(args: &InitArgs) -> Result<DealAssumptions, Box<dyn std::error::Error>> {
    Ok(DealAssumptions::with_scenarios(args.scenarios)?)
}

pub fn run_init(args: InitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(default_deal(&args)?)?)
}

/// The default deal as a YAML document, ready to save and edit.
pub fn render_init_yaml(args: &InitArgs) -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_yaml::to_string(&default_deal(args)?)?)
}
