//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;
use gcodetrim_optimizer::{validate_allowance, CrossingStrategy, MultiAxisStrategy, Strategy};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("GCODETRIM_BUILD_DATE"),
    ")"
);

/// Remove finishing-pass moves that only cut air left behind by the roughing pass
#[derive(Parser, Debug, Clone)]
#[command(name = "gcodetrim")]
#[command(version, long_version = LONG_VERSION)]
#[command(after_help = strategy_help())]
pub struct Cli {
    /// G-code file produced for the finishing pass
    pub input: PathBuf,

    /// Material depth in mm left by the roughing pass (e.g. 1.0)
    #[arg(value_parser = parse_allowance, allow_negative_numbers = true)]
    pub allowance: f64,

    /// Path for the optimized G-code
    pub output: PathBuf,

    /// How moves that cross the threshold are handled [default: aggressive]
    #[arg(short, long, value_name = "STRATEGY")]
    pub strategy: Option<CrossingStrategy>,

    /// How shallow moves with horizontal components are handled [default: safe]
    #[arg(short, long = "multi-axis", value_name = "STRATEGY")]
    pub multi_axis: Option<MultiAxisStrategy>,

    /// Settings file (.toml or .json); defaults to the user config file if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Overwrite the output file without asking
    #[arg(short, long)]
    pub force: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

const USAGE_EXAMPLES: &str = "\
Examples:
  gcodetrim finishing.cnc 1.0 output.cnc
  gcodetrim finishing.cnc 1.5 output.cnc --force
  gcodetrim finishing.cnc 0.5 output.cnc --strategy conservative --multi-axis all-axes";

/// Strategy list and usage examples shown after the options
fn strategy_help() -> String {
    let mut help = String::from("Crossing strategies (--strategy):\n");
    for strategy in CrossingStrategy::ALL {
        help.push_str(&format!("  {:<14}{}\n", strategy.name(), strategy.description()));
    }
    help.push_str("\nMulti-axis strategies (--multi-axis):\n");
    for strategy in MultiAxisStrategy::ALL {
        help.push_str(&format!("  {:<14}{}\n", strategy.name(), strategy.description()));
    }
    help.push('\n');
    help.push_str(USAGE_EXAMPLES);
    help
}

fn parse_allowance(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("invalid allowance '{}': must be a number", text))?;
    validate_allowance(value).map_err(|e| e.to_string())?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_lists_strategies() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("split moves at the threshold"), "{}", help);
        assert!(help.contains("all-axes"), "{}", help);
        assert!(help.contains("gcodetrim finishing.cnc 1.0 output.cnc"), "{}", help);
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["gcodetrim", "in.cnc", "1.5", "out.cnc"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("in.cnc"));
        assert_eq!(cli.allowance, 1.5);
        assert_eq!(cli.output, PathBuf::from("out.cnc"));
        assert!(cli.strategy.is_none());
        assert!(cli.multi_axis.is_none());
        assert!(!cli.force);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "gcodetrim",
            "in.cnc",
            "0.5",
            "out.cnc",
            "--strategy",
            "Conservative",
            "--multi-axis=all-axes",
            "--force",
            "--json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.strategy, Some(CrossingStrategy::Conservative));
        assert_eq!(cli.multi_axis, Some(MultiAxisStrategy::AllAxes));
        assert!(cli.force);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_bad_allowance() {
        let err = Cli::try_parse_from(["gcodetrim", "in.cnc", "-1", "out.cnc"]).unwrap_err();
        assert!(err.to_string().contains("non-negative"), "{}", err);

        let err = Cli::try_parse_from(["gcodetrim", "in.cnc", "deep", "out.cnc"]).unwrap_err();
        assert!(err.to_string().contains("must be a number"), "{}", err);
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let err = Cli::try_parse_from(["gcodetrim", "in.cnc", "1", "out.cnc", "-m", "sideways"])
            .unwrap_err();
        assert!(err.to_string().contains("all-axes"), "{}", err);
    }

    #[test]
    fn test_missing_arguments() {
        assert!(Cli::try_parse_from(["gcodetrim", "in.cnc", "1"]).is_err());
    }
}
