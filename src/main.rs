use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scenario_engine::{Scenario, ScenarioConfig, Strictness};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenario-engine", version, about = "Run scenario scripts against a simulated deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a scenario script, one statement per line
    Run {
        /// Script file
        script: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override catch-all strictness (strict or lenient)
        #[arg(long)]
        strictness: Option<Strictness>,
    },
    /// Print the usage of every available command
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            script,
            config,
            strictness,
        } => run(script, config, strictness).await,
        Command::Commands => {
            let scenario = Scenario::new(&ScenarioConfig::default())?;
            print!("{}", scenario.catalogue().usage());
            Ok(())
        }
    }
}

async fn run(script: PathBuf, config: Option<PathBuf>, strictness: Option<Strictness>) -> Result<()> {
    let mut config = match config {
        Some(path) => ScenarioConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    if let Some(strictness) = strictness {
        config = config.strictness(strictness);
    }

    let text = tokio::fs::read_to_string(&script)
        .await
        .with_context(|| format!("reading script {}", script.display()))?;

    let mut scenario = Scenario::new(&config)?;
    let report = scenario.run_script(&text).await;

    println!("Applied {} statement(s) on {}", report.applied, config.network);
    for entry in report.state.registry().entries() {
        let labels: Vec<String> = entry.metadata.iter().map(|m| m.index.join(".")).collect();
        println!(
            "  #{} {} {} [{}]",
            entry.sequence,
            entry.handle.kind,
            entry.handle.address,
            labels.join(", ")
        );
    }

    if let Some(failure) = report.failure {
        bail!(
            "line {}: \"{}\" failed: {}",
            failure.line,
            failure.statement,
            failure.error
        );
    }
    Ok(())
}
