mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::deal::{DealArgs, WaterfallArgs};
use commands::loan::LoanArgs;
use commands::returns::IrrArgs;
use commands::setup::InitArgs;

/// Real-estate deal calculator
#[derive(Parser)]
#[command(
    name = "dealcalc",
    version,
    about = "Compare financing scenarios for a real-estate deal",
    long_about = "Loan amortization, DSCR, 10-year cash-flow projections, exit \
                  valuation, project IRR and GP/LP waterfalls for up to three \
                  financing scenarios, computed with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Debug logging to stderr (DEALCALC_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a default deal document with N scenarios
    Init(InitArgs),
    /// Loan payment, debt service and remaining balance
    Loan(LoanArgs),
    /// Year-1 DSCR per scenario
    DebtService(DealArgs),
    /// 10-year cash-flow projection per scenario
    CashFlow(DealArgs),
    /// Exit price, cap-rate sensitivity and projected equity
    Exit(DealArgs),
    /// Project IRR per scenario, or over explicit cash flows
    Irr(IrrArgs),
    /// GP/LP distribution waterfall
    Waterfall(WaterfallArgs),
    /// Side-by-side comparison of every scenario
    Compare(DealArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEALCALC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Init(args) if args.yaml => match commands::setup::render_init_yaml(&args) {
            Ok(text) => {
                print!("{text}");
                return;
            }
            Err(e) => fail(e),
        },
        Commands::Init(args) => commands::setup::run_init(args),
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::DebtService(args) => commands::deal::run_debt_service(args),
        Commands::CashFlow(args) => commands::deal::run_cash_flow(args),
        Commands::Exit(args) => commands::deal::run_exit(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Waterfall(args) => commands::deal::run_waterfall(args),
        Commands::Compare(args) => commands::deal::run_compare(args),
        Commands::Version => {
            println!("dealcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
