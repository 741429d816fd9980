use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{DEFAULT_SCENARIO_NAME, default_input, run_http_server};
use crate::config::{DEFAULT_PORT, Settings};
use crate::core::{
    ScenarioInput, SimulationError, Strategy, financed_percent, principal_for_percent,
    run_simulation,
};
use crate::store::{ScenarioStore, StoreError};

#[derive(Debug, Parser)]
#[command(
    name = "mortgage-sim",
    about = "Compare paying a mortgage off early against investing the difference"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Saved scenario document; defaults to $MORTGAGE_SIM_STORE or scenarios.json"
    )]
    pub store: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Log level; defaults to $MORTGAGE_SIM_LOG or info"
    )]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scenario and print its report
    Simulate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Append the scenario to the saved collection")]
        save: bool,
        #[arg(long, requires = "save")]
        name: Option<String>,
    },
    /// Saved scenarios, best return ratio first
    List,
    /// Print the report of a saved scenario
    Show { id: u64 },
    /// Delete a saved scenario
    Remove { id: u64 },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    PayDownExtra,
    Invest,
    DoNothing,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::PayDownExtra => Strategy::PayDownExtra,
            CliStrategy::Invest => Strategy::Invest,
            CliStrategy::DoNothing => Strategy::DoNothing,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    #[arg(long, default_value_t = 215_500.0)]
    pub house_value: f64,
    #[arg(long, help = "Amount financed; defaults to 140000")]
    pub principal: Option<f64>,
    #[arg(
        long,
        conflicts_with = "principal",
        help = "Amount financed as a percent of the house value"
    )]
    pub financed_percent: Option<f64>,
    #[arg(long, default_value_t = 2.2, help = "Nominal annual mortgage rate in percent")]
    pub mortgage_rate: f64,
    #[arg(long, default_value_t = 20)]
    pub term_years: u32,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual investment return in percent"
    )]
    pub investment_rate: f64,
    #[arg(long, value_enum, default_value_t = CliStrategy::PayDownExtra)]
    pub strategy: CliStrategy,
    #[arg(
        long,
        default_value_t = 6_000.0,
        help = "Yearly extra principal payment or extra investment"
    )]
    pub extra_contribution: f64,
}

impl InputArgs {
    pub fn to_input(&self) -> ScenarioInput {
        let principal = match (self.principal, self.financed_percent) {
            (Some(principal), _) => principal,
            (None, Some(pct)) => principal_for_percent(self.house_value, pct),
            (None, None) => default_input().principal,
        };
        ScenarioInput {
            house_value: self.house_value,
            principal,
            mortgage_rate_annual: self.mortgage_rate,
            term_years: self.term_years,
            investment_rate_annual: self.investment_rate,
            strategy: self.strategy.into(),
            extra_contribution: self.extra_contribution,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("output failed: {0}")]
    Io(#[from] io::Error),
}

pub async fn run(command: Command, settings: &Settings) -> Result<(), CliError> {
    let store_path = settings.store_path.as_path();
    match command {
        Command::Serve { port } => {
            let store = ScenarioStore::open(store_path)?;
            run_http_server(port, store).await?;
            Ok(())
        }
        Command::Simulate { input, save, name } => {
            simulate(&input, save, name.as_deref(), store_path, &mut io::stdout().lock())
        }
        Command::List => list(store_path, &mut io::stdout().lock()),
        Command::Show { id } => show(id, store_path, &mut io::stdout().lock()),
        Command::Remove { id } => remove(id, store_path, &mut io::stdout().lock()),
    }
}

fn simulate(
    args: &InputArgs,
    save: bool,
    name: Option<&str>,
    store_path: &Path,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let input = args.to_input();
    writeln!(
        out,
        "Financed: {:.1} % of {:.2} €",
        financed_percent(input.house_value, input.principal),
        input.house_value
    )?;

    if save {
        let mut store = ScenarioStore::open(store_path)?;
        let scenario = store.add(name.unwrap_or(DEFAULT_SCENARIO_NAME), input)?;
        writeln!(out, "{}", scenario.result.summary_text)?;
        writeln!(out, "Saved as #{} \"{}\"", scenario.id, scenario.name)?;
    } else {
        let result = run_simulation(&input)?;
        writeln!(out, "{}", result.summary_text)?;
    }
    Ok(())
}

fn list(store_path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let store = ScenarioStore::open(store_path)?;
    let ranked = store.ranked();
    if ranked.is_empty() {
        writeln!(out, "No saved scenarios.")?;
        return Ok(());
    }
    for (rank, scenario) in ranked.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. #{} {} | {} | return {:.2} %",
            rank + 1,
            scenario.id,
            scenario.name,
            scenario.headline(),
            scenario.result.return_ratio_percent
        )?;
    }
    Ok(())
}

fn show(id: u64, store_path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let store = ScenarioStore::open(store_path)?;
    let scenario = store.get(id).ok_or(StoreError::NotFound(id))?;
    writeln!(out, "#{} {}", scenario.id, scenario.name)?;
    writeln!(out, "{}", scenario.result.summary_text)?;
    Ok(())
}

fn remove(id: u64, store_path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let mut store = ScenarioStore::open(store_path)?;
    let removed = store.remove(id)?;
    writeln!(out, "Removed #{} \"{}\"", removed.id, removed.name)?;
    Ok(())
}
