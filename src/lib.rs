//! # gcodetrim
//!
//! Optimizes finishing-pass G-code for CNC milling. After a roughing pass has
//! cleared the stock down to within an allowance of the final surface, most of
//! a finishing pass cuts air. gcodetrim removes the cutting moves that stay
//! entirely above that level and splits the ones that cross it.
//!
//! ## Architecture
//!
//! 1. **gcodetrim-core** - Instructions, parameters, header metadata, errors
//! 2. **gcodetrim-parser** - Line parser, header extraction, reader and writer
//! 3. **gcodetrim-optimizer** - Threshold, classification, splitting, strategies
//! 4. **gcodetrim-settings** - TOML/JSON settings files
//! 5. **gcodetrim** - Command-line binary that wires the crates together

pub mod cli;
pub mod report;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use gcodetrim_core::ConfigError;
use gcodetrim_optimizer::{Engine, OptimizationReport, ProgressUpdate};
use gcodetrim_parser::{GcodeWriter, ProgramReader};
use gcodetrim_settings::{OptimizerSettings, SettingsError};

pub use cli::Cli;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("GCODETRIM_BUILD_DATE");

/// Exit code for runtime failures
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for invalid settings or arguments
pub const EXIT_CONFIG: u8 = 2;

/// How a run ended
#[derive(Debug)]
pub enum Outcome {
    Completed(Box<OptimizationReport>),
    /// The user declined to overwrite the output file
    Cancelled,
}

/// Initialize logging to stderr
///
/// `RUST_LOG` takes precedence; otherwise the level is warn, raised to
/// debug or trace by `verbosity`.
pub fn init_logging(verbosity: u8) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbosity > 0)
        .with_level(true)
        .with_line_number(verbosity > 1);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Map an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let is_config = err.chain().any(|cause| {
        cause.is::<ConfigError>()
            || cause
                .downcast_ref::<SettingsError>()
                .is_some_and(SettingsError::is_bad_input)
            || cause
                .downcast_ref::<gcodetrim_core::Error>()
                .is_some_and(|e| e.is_config_error())
    });
    if is_config {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}

/// Ask whether `path` may be overwritten; only `y` or `Y` agrees
pub fn confirm_overwrite<R: BufRead, W: Write>(
    mut input: R,
    mut prompt: W,
    path: &Path,
) -> io::Result<bool> {
    write!(
        prompt,
        "Output file {} already exists. Overwrite? (y/n): ",
        path.display()
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

/// Resolve settings: defaults, then the config file, then command-line flags
pub fn resolve_settings(cli: &Cli) -> Result<OptimizerSettings> {
    let settings = OptimizerSettings::load_or_default(cli.config.as_deref())?
        .with_allowance(cli.allowance)
        .with_overrides(cli.strategy, cli.multi_axis);
    settings.validate()?;
    Ok(settings)
}

/// Run one optimization from the command line
pub fn run(cli: &Cli) -> Result<Outcome> {
    let settings = resolve_settings(cli)?;
    let engine = Engine::new(settings.engine_config())?;

    let reader = ProgramReader::from_path(&cli.input)
        .with_context(|| format!("Cannot read input file {}", cli.input.display()))?;

    let output_dir = match cli.output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().context("Failed to determine current directory")?,
    };
    if !output_dir.is_dir() {
        bail!("Output directory does not exist: {}", output_dir.display());
    }

    if cli.output.exists() && !cli.force {
        let stdin = io::stdin();
        let confirmed = confirm_overwrite(stdin.lock(), io::stdout(), &cli.output)
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Operation cancelled.");
            return Ok(Outcome::Cancelled);
        }
    }

    let program = reader
        .read()
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    tracing::debug!(
        "Read {} lines ({} bytes) from {}",
        program.len(),
        program.bytes,
        cli.input.display()
    );

    // Written beside the target and renamed into place only on success
    let staging = tempfile::NamedTempFile::new_in(&output_dir)
        .with_context(|| format!("Cannot create output in {}", output_dir.display()))?;
    let mut writer = GcodeWriter::new(staging);

    let show_progress = !cli.json;
    let report = engine
        .run(&program, &mut writer, |update| {
            if show_progress {
                print_progress(update);
            }
        })
        .context("Optimization failed")?;
    if show_progress {
        eprintln!();
    }

    let staging = writer.into_inner().context("Failed to flush output")?;
    staging
        .persist(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        for advisory in &report.advisories {
            eprintln!("{}", report::format_advisory(advisory));
        }
        print!("{}", report::render_summary(&report));
    }

    Ok(Outcome::Completed(Box::new(report)))
}

fn print_progress(update: &ProgressUpdate) {
    eprint!(
        "\rProcessing: {:5.1}% ({} / {} lines, {} removed)",
        update.fraction() * 100.0,
        report::format_number(update.lines_processed),
        report::format_number(update.total_lines),
        report::format_number(update.removed)
    );
    let _ = io::stderr().flush();
}
