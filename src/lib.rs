#![warn(missing_docs)]
//! monkeyc — brute-force compile probing
//!
//! Generates fixed-length random byte strings over a configurable alphabet,
//! embeds each one in a fixed C `main` body, and asks a real compiler
//! whether the noise happens to compile. Accepted fragments are kept on
//! disk; everything else is counted and discarded.
//!
//! The interesting part is the dispatch loop: a fixed worker pool fans
//! generate-and-compile tasks out, shared counters track attempts and
//! successes under a single mutex, and both a bounded task count and an
//! unbounded batch-streaming mode are supported with graceful Ctrl+C
//! interruption.
//!
//! # Example
//!
//! ```ignore
//! // Probe 5-byte fragments with the system C compiler:
//! //     monkeyc 5 --tasks 10000
//! // Run until interrupted, printing compiler errors:
//! //     monkeyc 8 --tasks 0 --show-errors
//! fn main() -> anyhow::Result<()> {
//!     monkeyc::run()
//! }
//! ```

pub mod charset;
pub mod config;
pub mod counters;
pub mod dispatcher;
pub mod format;
pub mod generate;
pub mod probe;
pub mod worker;

pub use charset::{Charset, CharsetError, CharsetOptions};
pub use config::MonkeyConfig;
pub use counters::{RunStats, SharedCounters, Snapshot};
pub use dispatcher::Dispatcher;
pub use probe::{ProbeOutcome, Prober};
pub use worker::Task;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

/// Task-count sentinel for unbounded mode.
const UNBOUNDED: u64 = 0;

/// monkeyc CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "monkeyc")]
#[command(author, version, about = "Brute-force random C fragment compile prober")]
pub struct Cli {
    /// Byte size of the generated C fragment
    #[arg(default_value_t = 5)]
    pub byte_size: usize,

    /// Number of probes to run (0 = run until interrupted) [default: 10000]
    #[arg(long)]
    pub tasks: Option<u64>,

    /// Exclude lowercase letters
    #[arg(long)]
    pub no_lowercase: bool,

    /// Exclude uppercase letters
    #[arg(long)]
    pub no_uppercase: bool,

    /// Exclude digits
    #[arg(long)]
    pub no_digits: bool,

    /// Exclude symbols
    #[arg(long)]
    pub no_symbols: bool,

    /// Include whitespace characters
    #[arg(long)]
    pub whitespace: bool,

    /// Custom character set (overrides the class toggles)
    #[arg(long)]
    pub charset: Option<String>,

    /// Compiler executable [default: cc]
    #[arg(long)]
    pub compiler: Option<String>,

    /// Print truncated compiler errors for failed probes
    #[arg(long)]
    pub show_errors: bool,

    /// Per-attempt compile timeout in seconds [default: 2]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Worker pool size [default: available CPU cores]
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Directory accepted sources are kept in [default: successful_codes]
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Verbose diagnostic logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved settings for one run: CLI over `monkeyc.toml` over
/// built-in defaults.
#[derive(Debug, Clone)]
struct RunSettings {
    byte_size: usize,
    tasks: u64,
    compiler: String,
    timeout: Duration,
    jobs: usize,
    results_dir: PathBuf,
    show_errors: bool,
    charset: CharsetOptions,
}

fn resolve_settings(cli: &Cli, config: &MonkeyConfig) -> RunSettings {
    let charset = CharsetOptions {
        lowercase: !cli.no_lowercase && config.charset.lowercase,
        uppercase: !cli.no_uppercase && config.charset.uppercase,
        digits: !cli.no_digits && config.charset.digits,
        symbols: !cli.no_symbols && config.charset.symbols,
        whitespace: cli.whitespace || config.charset.whitespace,
        custom: cli.charset.clone().or_else(|| config.charset.custom.clone()),
    };

    RunSettings {
        byte_size: cli.byte_size,
        tasks: cli.tasks.or(config.runner.tasks).unwrap_or(10_000),
        compiler: cli
            .compiler
            .clone()
            .or_else(|| config.runner.compiler.clone())
            .unwrap_or_else(|| "cc".to_string()),
        timeout: Duration::from_secs(cli.timeout.or(config.runner.timeout_secs).unwrap_or(2)),
        jobs: cli
            .jobs
            .or(config.runner.jobs)
            .unwrap_or_else(available_cores),
        results_dir: cli
            .results_dir
            .clone()
            .or_else(|| config.output.results_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("successful_codes")),
        show_errors: cli.show_errors || config.output.show_errors,
        charset,
    }
}

/// Number of available CPU cores.
fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parse the command line and run the harness. Main entry point.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the harness with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("monkeyc=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("monkeyc=info")
            .init();
    }

    // monkeyc.toml fills in whatever the command line left unset.
    let config = MonkeyConfig::discover().unwrap_or_default();
    let settings = resolve_settings(&cli, &config);

    // An empty alphabet is fatal before any task is dispatched.
    let charset = Charset::build(&settings.charset).context("invalid charset configuration")?;
    let space = charset.combination_space(settings.byte_size as u32);

    println!(
        "Starting random C compile probing with {}-byte fragments",
        settings.byte_size
    );
    println!("Charset size: {} characters", charset.len());
    println!("Charset: {}", charset.preview());
    println!("Compiler: {}", settings.compiler);
    println!(
        "Total possible combinations: {}",
        format::format_large_number(space)
    );
    println!("Available CPU cores: {}", available_cores());
    println!("Worker pool size: {}", settings.jobs);

    let prober = Prober::new(&settings.compiler, settings.timeout, &settings.results_dir)
        .with_context(|| {
            format!(
                "failed to prepare results directory {}",
                settings.results_dir.display()
            )
        })?;

    let dispatcher = Dispatcher::new(
        settings.jobs,
        std::sync::Arc::new(charset),
        settings.byte_size,
        prober,
        settings.show_errors,
    )?;

    let stop = dispatcher.stop_flag();
    ctrlc::set_handler(move || {
        // First Ctrl+C stops submission; in-flight probes drain on their own.
        if !stop.swap(true, Ordering::Relaxed) {
            eprintln!("\nStopping after interrupt...");
        }
    })
    .context("failed to install Ctrl+C handler")?;

    if settings.tasks == UNBOUNDED {
        println!("Running in unbounded mode... (press Ctrl+C to stop)");
        dispatcher.run_unbounded();
    } else {
        dispatcher.run_bounded(settings.tasks);
    }

    dispatcher.print_summary(space);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("monkeyc").chain(args.iter().copied()))
    }

    #[test]
    fn cli_defaults_resolve_to_spec_defaults() {
        let settings = resolve_settings(&parse(&[]), &MonkeyConfig::default());
        assert_eq!(settings.byte_size, 5);
        assert_eq!(settings.tasks, 10_000);
        assert_eq!(settings.compiler, "cc");
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert_eq!(settings.results_dir, PathBuf::from("successful_codes"));
        assert!(!settings.show_errors);
    }

    #[test]
    fn cli_flags_override_config_file() {
        let config: MonkeyConfig = toml::from_str(
            r#"
            [runner]
            compiler = "clang"
            timeout_secs = 9
            tasks = 7
        "#,
        )
        .unwrap();

        let settings = resolve_settings(&parse(&["--compiler", "tcc", "--tasks", "3"]), &config);
        assert_eq!(settings.compiler, "tcc");
        assert_eq!(settings.tasks, 3);
        // Unset on the CLI, so the file wins.
        assert_eq!(settings.timeout, Duration::from_secs(9));
    }

    #[test]
    fn exclusion_flags_reach_the_charset() {
        let settings = resolve_settings(
            &parse(&["--no-lowercase", "--no-uppercase", "--whitespace"]),
            &MonkeyConfig::default(),
        );
        assert!(!settings.charset.lowercase);
        assert!(!settings.charset.uppercase);
        assert!(settings.charset.digits);
        assert!(settings.charset.whitespace);
    }

    #[test]
    fn zero_tasks_selects_unbounded_mode() {
        let settings = resolve_settings(&parse(&["--tasks", "0"]), &MonkeyConfig::default());
        assert_eq!(settings.tasks, UNBOUNDED);
    }

    #[test]
    fn custom_charset_flag_overrides_toggles() {
        let settings = resolve_settings(&parse(&["--charset", "abc"]), &MonkeyConfig::default());
        assert_eq!(settings.charset.custom.as_deref(), Some("abc"));
    }
}
