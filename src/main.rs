use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use process_text_sender::key_sender::preview;
use process_text_sender::{
    parse_payload_args, Config, DeliveryMode, Desktop, FailurePolicy, KeySender, Platform,
    SendOptions, Transcoded,
};

/// Type text into the window of a running process.
///
/// Payloads understand backslash escapes (\n, \t, \xHH, \uHHHH, \UHHHHHHHH).
/// Prefix a payload with -r/--raw to send it exactly as given.
///
/// The first positional argument is always the process name, also with
/// --config: `pts --config job.json notepad "text"` overrides both the
/// job's process and its payloads, and `pts --config job.json hello` targets
/// a process named "hello".
#[derive(Parser, Debug)]
#[command(name = "pts", version, about)]
struct Cli {
    /// Name of the target process (".exe" may be omitted); with --config this
    /// is still the first positional argument and overrides the job's process
    #[arg(required_unless_present = "config")]
    process: Option<String>,

    /// Only deliver to a window whose title contains this text
    #[arg(short, long = "window", value_name = "TITLE")]
    window_title: Option<String>,

    /// Load the job from a JSON file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// How text reaches the window
    #[arg(short, long, value_enum)]
    mode: Option<DeliveryMode>,

    /// Stop at the first failed payload
    #[arg(long)]
    abort_on_failure: bool,

    /// Print what would be sent instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Platform whose output a dry run shows
    #[arg(long, value_enum, requires = "dry_run")]
    platform: Option<Platform>,

    /// Log every resolution and delivery step
    #[arg(short, long)]
    verbose: bool,

    /// Payloads: [-r|--raw] TEXT, repeated
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TEXT")]
    payloads: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<(Config, bool, Option<Platform>)> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::new(self.process.clone().unwrap_or_default()),
        };

        if let Some(process) = self.process {
            config.process_name = process;
        }
        if self.window_title.is_some() {
            config.window_title = self.window_title;
        }
        if let Some(mode) = self.mode {
            config.delivery_mode = mode;
        }
        if self.abort_on_failure {
            config.failure_policy = FailurePolicy::AbortRemaining;
        }
        config.verbose |= self.verbose;

        let payloads = parse_payload_args(&self.payloads)?;
        if !payloads.is_empty() {
            config.payloads = payloads;
        }

        Ok((config, self.dry_run, self.platform))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_preview(platform: Platform, config: &Config) {
    println!(
        "{} {} payload(s) for '{}' on {}",
        "Dry run:".cyan().bold(),
        config.payloads.len(),
        config.process_name,
        platform
    );
    for (index, transcoded) in preview(platform, &config.payloads).iter().enumerate() {
        match transcoded {
            Transcoded::Markup(markup) => println!("  [{index}] {markup}"),
            Transcoded::Lines(lines) => {
                println!("  [{index}] {} line(s)", lines.len());
                for line in lines {
                    println!("      {line:?}");
                }
            }
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let (config, dry_run, platform) = cli.into_config()?;
    init_logging(config.verbose);
    config.validate().context("invalid job")?;
    debug!("Job: {:?}", config);

    if dry_run {
        let platform = match platform {
            Some(platform) => platform,
            None => Platform::current()?,
        };
        print_preview(platform, &config);
        return Ok(true);
    }

    let desktop = Desktop::detect().context("no desktop backend")?;
    let sender = KeySender::new(desktop, SendOptions::from(&config));
    let report = sender
        .send(&config.target(), &config.payloads)
        .with_context(|| format!("could not deliver to '{}'", config.process_name))?;

    for failure in &report.failures {
        eprintln!(
            "{} payload {}: {}",
            "Failed".red().bold(),
            failure.index,
            failure.error
        );
    }
    if !report.skipped.is_empty() {
        eprintln!(
            "{} payload(s) {:?}",
            "Skipped".yellow().bold(),
            report.skipped
        );
    }
    if report.is_success() {
        println!(
            "{} {} payload(s) to '{}'",
            "Sent".green().bold(),
            report.delivered.len(),
            config.process_name
        );
    }

    Ok(report.is_success())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
