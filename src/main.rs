//! paramsweep - HTTP parameter fuzzer
//!
//! Sweeps one URL, header, cookie or path parameter at a time through its
//! configured values and records every response.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paramsweep::app::Config;
use paramsweep::fuzzer::{
    CancelToken, Enumerator, FuzzResultSet, Fuzzer, FuzzerConfig, Registry,
};
use paramsweep::http::{HttpClient, RequestTemplate};
use paramsweep::FuzzError;

/// One-parameter-at-a-time HTTP parameter fuzzer
#[derive(Parser, Debug)]
#[command(name = "paramsweep")]
#[command(author, version, about = "HTTP parameter fuzzer", long_about = None)]
struct Cli {
    /// Path to the fuzzer configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "./config.json", env = "PARAMSWEEP_CONFIG")]
    config: PathBuf,

    /// Maximum number of concurrent requests
    #[arg(long, default_value_t = 6, env = "PARAMSWEEP_CONCURRENCY")]
    concurrency: usize,

    /// Write all results as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PARAMSWEEP_LOG_LEVEL")]
    log_level: String,

    /// Log file path (enables file logging)
    #[arg(long, env = "PARAMSWEEP_LOG_FILE")]
    log_file: Option<String>,

    /// Enable JSON structured logging
    #[arg(long, env = "PARAMSWEEP_LOG_JSON")]
    log_json: bool,

    /// Print an example configuration and exit
    #[arg(long)]
    generate_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate_config: bool,
}

/// Exit status for an operator-requested stop
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.generate_config {
        return match generate_default_config() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = init_logging(&cli) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting paramsweep");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<FuzzError>() {
            Some(err) if err.is_cancellation() => {
                tracing::info!("Stopped at operator request");
                ExitCode::from(EXIT_CANCELLED)
            }
            Some(err) => {
                tracing::error!(error = %err, "Fuzzing run failed");
                eprintln!("{}", err.user_message());
                ExitCode::FAILURE
            }
            None => {
                tracing::error!(error = %format!("{:#}", e), "Fuzzing run failed");
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_path) = &cli.log_file {
        // File-based logging with rotation
        let file_appender = if log_path.contains('/') || log_path.contains('\\') {
            let path = Path::new(log_path);
            let dir = path.parent().unwrap_or(Path::new("."));
            let filename = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("paramsweep.log");
            RollingFileAppender::new(Rotation::DAILY, dir, filename)
        } else {
            let log_dir = Config::data_dir()
                .map(|d| d.join("logs"))
                .unwrap_or_else(|_| PathBuf::from("."));
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
            RollingFileAppender::new(Rotation::DAILY, log_dir, log_path)
        };

        if cli.log_json {
            let file_layer = fmt::layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false);
            subscriber.with(file_layer).init();
        } else {
            let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
            subscriber.with(file_layer).init();
        }
    } else if cli.log_json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Print an example configuration document
fn generate_default_config() -> Result<()> {
    let example = serde_json::to_string_pretty(&Config::example())
        .context("Failed to serialize configuration")?;
    println!("{}", example);
    Ok(())
}

/// Load configuration, build the run, and drive it to completion
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config).map_err(FuzzError::from)?;

    if cli.concurrency == 0 {
        anyhow::bail!("Concurrency must be greater than 0");
    }

    let registry = Registry::from_config(&config)?;
    let enumerator = Enumerator::new(registry, RequestTemplate::from_config(&config));
    tracing::info!(
        url = %format!("{}://{}{}", config.scheme(), config.authority(), config.path),
        planned = enumerator.planned_requests(),
        "Configuration is valid"
    );

    if cli.validate_config {
        return Ok(());
    }

    let client = HttpClient::new(&config.http)?;
    let fuzzer = Fuzzer::new(
        FuzzerConfig {
            max_concurrent: cli.concurrency,
        },
        Arc::new(client),
    );

    let cancel = CancelToken::new();
    tokio::spawn(handle_signals(cancel.clone()));

    let mut results = FuzzResultSet::new();
    let outcome = fuzzer
        .run(enumerator, cancel, |outcome| {
            match &outcome.result {
                Ok(response) => tracing::info!(
                    seq = outcome.request.seq,
                    url = %outcome.request.url,
                    status = response.status,
                    size = response.size,
                    duration_ms = response.duration_ms,
                    "Response"
                ),
                Err(e) => tracing::warn!(
                    seq = outcome.request.seq,
                    url = %outcome.request.url,
                    error = %e,
                    "Request failed"
                ),
            }
            results.add_outcome(outcome);
        })
        .await;

    results.finalize();
    if let Some(path) = &cli.output {
        write_results(path, &results)?;
    }

    let summary = outcome?;
    print_summary(&results);
    tracing::info!(
        completed = summary.completed,
        elapsed_ms = summary.elapsed_ms,
        "Finished"
    );

    Ok(())
}

fn write_results(path: &Path, results: &FuzzResultSet) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write results to {:?}", path))?;
    tracing::info!("Saved {} results to {:?}", results.results.len(), path);
    Ok(())
}

fn print_summary(results: &FuzzResultSet) {
    let stats = results.stats();
    println!(
        "{} requests, {} interesting, average response time {}ms",
        stats.total_requests,
        stats.interesting_count,
        stats.average_response_time.as_millis()
    );

    let mut statuses: Vec<_> = stats.status_distribution.iter().collect();
    statuses.sort();
    for (status, count) in statuses {
        println!("  {:>3}: {}", status, count);
    }

    for result in results.interesting_results() {
        println!(
            "  #{:<5} {:>3} {:>8}B  {}  ({})",
            result.seq,
            result.status_code,
            result.response_length,
            result.url,
            result.interesting_reason.as_deref().unwrap_or_default()
        );
    }
}

/// Trigger cancellation on interrupt or termination signals
async fn handle_signals(cancel: CancelToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigint, mut sigterm, mut sigquit) = match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) {
            (Ok(sigint), Ok(sigterm), Ok(sigquit)) => (sigint, sigterm, sigquit),
            _ => {
                tracing::error!("Failed to register signal handlers; Ctrl+C will not stop the run cleanly");
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, stopping");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, stopping");
            }
            _ = sigquit.recv() => {
                tracing::info!("Received SIGQUIT, stopping");
            }
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to register Ctrl+C handler");
            return;
        }
        tracing::info!("Received Ctrl+C, stopping");
    }

    cancel.cancel();
}
