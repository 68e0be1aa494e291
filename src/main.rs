use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budget_ledger::io::{
    load_adjustment_rules, load_career_records, load_fixed_budgets, load_yearly_budgets,
    write_ledger, write_milestones,
};
use budget_ledger::{simulate, SimulationConfig, SimulationInputs, SimulationWindow};

#[derive(Parser)]
#[command(name = "budget-ledger", version, about = "Career research budget simulation")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every CF and write the ledger
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Parameters table (one career per CF)
    #[arg(long)]
    params: PathBuf,

    /// Negotiated lab budgets (CF, From, To, Annual amount)
    #[arg(long)]
    fixed_budgets: Option<PathBuf>,

    /// Manual adjustments (CF, From, To, Monthly amount, Note)
    #[arg(long)]
    adjustments: Option<PathBuf>,

    /// Yearly budget table (CF + one column per year)
    #[arg(long)]
    yearly_budgets: Option<PathBuf>,

    /// JSON configuration (budget constants, window)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulation start, overrides the configuration
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Simulation end, overrides the configuration
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Ledger output file
    #[arg(long)]
    output: PathBuf,

    /// Milestones output file
    #[arg(long)]
    milestones: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };

    let start = args.start.unwrap_or(config.window.start);
    let end = args.end.unwrap_or(config.window.end);
    config.window = SimulationWindow::new(start, end).context("Invalid simulation window")?;

    let mut inputs = SimulationInputs::from_rows(load_career_records(&args.params)?);
    if let Some(path) = &args.fixed_budgets {
        inputs.fixed_budgets = load_fixed_budgets(path)?;
    }
    if let Some(path) = &args.adjustments {
        inputs.adjustments = load_adjustment_rules(path)?;
    }
    if let Some(path) = &args.yearly_budgets {
        inputs.yearly_budgets = Some(load_yearly_budgets(path)?);
    }

    let output = simulate(&inputs, &config);

    write_ledger(&args.output, &output.ledger)?;
    if let Some(path) = &args.milestones {
        write_milestones(path, &output.milestones)?;
    }

    for failure in &output.failures {
        warn!("CF {} not simulated: {}", failure.cf, failure.error);
    }
    info!("Ledger digest: {}", output.ledger.digest());

    println!("✓ {}", output.summary());
    if let Some(report) = &output.reconciliation {
        println!("✓ {}", report.summary());
    }
    println!("✓ Ledger written to {}", args.output.display());

    Ok(())
}
