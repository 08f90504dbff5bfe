use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use txflow::Orchestrator;
use txflow::application::guard::{InFlightRegistry, in_flight_key};
use txflow::interfaces::scenario::Scenario;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON file with scripted submit/confirm outcomes
    scenario: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let file = File::open(&cli.scenario).into_diagnostic()?;
    let scenario = Scenario::from_reader(file).into_diagnostic()?;

    let registry = InFlightRegistry::new();
    let key = in_flight_key(&scenario.operation, &scenario.input);
    let _ticket = registry
        .try_begin(key)
        .ok_or_else(|| miette!("operation {} is already in flight", scenario.operation))?;

    let orchestrator = Orchestrator::new();
    orchestrator.subscribe(|state| {
        println!(
            "phase={} attempt={} confirmations={} handle={}",
            state.phase,
            state.attempt,
            state.confirmations,
            state.handle.as_deref().unwrap_or("-")
        );
    });

    let result = orchestrator.execute(scenario.into_request()).await;
    match &result.error {
        None => {
            println!(
                "result: success handle={} confirmations={} attempts={}",
                result.tx_hash.as_deref().unwrap_or("-"),
                result.confirmations,
                result.state.attempt
            );
            Ok(())
        }
        Some(err) => {
            println!("result: failed code={} cause={}", err.code, err.cause.code);
            Err(miette!("transaction failed: {err}"))
        }
    }
}
