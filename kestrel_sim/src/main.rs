// kestrel_sim/src/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use kestrel_sim::logging::init_logging;
use kestrel_sim::prelude::*;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SimError> {
    let config = ScenarioConfig::load(&cli.scenario)?.with_overrides(cli.duration, cli.seed);
    config.validate()?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let summary = Simulation::new(config)?.run()?;
    println!("{summary}");
    Ok(())
}
