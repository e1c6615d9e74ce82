// kestrel_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Kestrel: runs the measurement-update pipeline against a simulated vehicle.
///
/// This struct defines the command-line arguments accepted by the simulator.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/default.toml")]
    pub scenario: PathBuf,

    /// Overrides the scenario duration, in seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Overrides the scenario seed for the pseudo-random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the fully resolved configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Log filter used when `RUST_LOG` is not set (e.g. "debug", "kestrel_core=trace").
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "kestrel_sim",
            "--scenario",
            "custom.toml",
            "--duration",
            "12.5",
            "--seed",
            "9",
        ])
        .expect("valid arguments");
        assert_eq!(cli.scenario, PathBuf::from("custom.toml"));
        assert_eq!(cli.duration, Some(12.5));
        assert_eq!(cli.seed, Some(9));
        assert!(!cli.print_config);
    }

    #[test]
    fn defaults_to_the_bundled_scenario() {
        let cli = Cli::try_parse_from(["kestrel_sim"]).expect("no arguments needed");
        assert_eq!(cli.scenario, PathBuf::from("assets/scenarios/default.toml"));
        assert_eq!(cli.duration, None);
    }
}
