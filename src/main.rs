use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scenario_rebase::{
    index_to_base_year, interpolate_annual, percent_change, pivot_wide, read_series_path, rebase,
    table, write_long_csv, write_wide_csv, ReportConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scenario re-basing and reshaping for emission pathways")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rescale scenario pathways onto market intensities for every lag year
    Rebase(RebaseArgs),
    /// Index every (scenario, sector) group to its base year
    Index(CommonArgs),
    /// Percent change per group between two years
    Change(ChangeArgs),
    /// Linearly interpolate a raw table to annual granularity
    Interpolate(CommonArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input CSV with scenario,sector,year,emission_factor,emission_factor_unit
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output CSV path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct RebaseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// TOML file with [market_intensity] and optional scenario_order
    #[arg(short, long, env = "SCENARIO_REBASE_CONFIG", value_hint = ValueHint::FilePath)]
    config: PathBuf,

    /// Pivot wide by year instead of long form
    #[arg(long)]
    wide: bool,

    /// Restrict to these scenarios (repeatable)
    #[arg(long = "scenario")]
    scenarios: Vec<String>,

    /// Restrict to these sectors (repeatable)
    #[arg(long = "sector")]
    sectors: Vec<String>,
}

#[derive(Args, Debug)]
struct ChangeArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    from: i32,

    #[arg(long)]
    to: i32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Rebase(args) => args.common.verbose,
        Command::Change(args) => args.common.verbose,
        Command::Index(args) | Command::Interpolate(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Rebase(args) => handle_rebase(args),
        Command::Index(args) => handle_index(args),
        Command::Change(args) => handle_change(args),
        Command::Interpolate(args) => handle_interpolate(args),
    }
}

fn handle_rebase(args: RebaseArgs) -> Result<()> {
    let config = ReportConfig::from_path(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    let series = load(&args.common.input)?
        .filter(&args.scenarios, &args.sectors)
        .ordered_by_scenario(&config.scenario_order);

    let projection = rebase(&series, &config.market_intensity).context("re-basing failed")?;
    info!(lags = projection.lag_count(), "writing lagged projection");

    let out = open_output(&args.common.output)?;
    if args.wide {
        write_wide_csv(&pivot_wide(&projection), out)?;
    } else {
        write_long_csv(&projection, out)?;
    }
    Ok(())
}

fn handle_index(args: CommonArgs) -> Result<()> {
    let series = load(&args.input)?;
    let rows = index_to_base_year(&series).context("base-year indexing failed")?;
    table::write_rows(&rows, open_output(&args.output)?)?;
    Ok(())
}

fn handle_change(args: ChangeArgs) -> Result<()> {
    let series = load(&args.common.input)?;
    let rows = percent_change(&series, args.from, args.to)
        .with_context(|| format!("percent change {} -> {} failed", args.from, args.to))?;
    if rows.is_empty() {
        warn!(from = args.from, to = args.to, "no group covers both years");
    }
    table::write_rows(&rows, open_output(&args.common.output)?)?;
    Ok(())
}

fn handle_interpolate(args: CommonArgs) -> Result<()> {
    let series = load(&args.input)?;
    let annual = interpolate_annual(&series).context("interpolation failed")?;
    let rows: Vec<_> = annual.records().collect();
    table::write_rows(&rows, open_output(&args.output)?)?;
    Ok(())
}

fn load(path: &Path) -> Result<scenario_rebase::EmissionSeries> {
    read_series_path(path).with_context(|| format!("failed to read {}", path.display()))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(file))
}
