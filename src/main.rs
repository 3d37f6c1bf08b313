mod analyzer;
mod cache;
mod config;
mod model;
mod monitor;
mod normalizer;
mod parser;
mod scraper;

use clap::{Parser, Subcommand};
use config::{AppConfig, load_config};
use futures::future::join_all;
use monitor::{Monitor, log_summary};
use crate::scraper::HttpFetcher;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graintrade-monitor")]
#[command(about = "Grain market price analytics from Graintrade listings")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured cultures
    List,

    /// Fetch and analyze one culture, printing the report as JSON
    Analyze {
        /// Culture name as configured (case-insensitive)
        culture: String,

        /// Only analyze listings dated in this year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Analyze every culture on the configured interval
    Watch {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config: Arc<AppConfig> = match load_config(&cli.config) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Commands::List = cli.command {
        for culture in &config.cultures {
            println!("{}\t{}", culture.name, culture.url);
        }
        return ExitCode::SUCCESS;
    }

    let fetcher = match HttpFetcher::new(Duration::from_secs(config.request_timeout_seconds)) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let monitor = match Monitor::new(fetcher, &config) {
        Ok(m) => m,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::List => ExitCode::SUCCESS,
        Commands::Analyze { culture, year } => analyze(&monitor, &config, &culture, year).await,
        Commands::Watch { once } => {
            watch(&monitor, &config, once).await;
            ExitCode::SUCCESS
        }
    }
}

async fn analyze(monitor: &Monitor<HttpFetcher>, config: &AppConfig, name: &str, year: Option<i32>) -> ExitCode {
    let Some(culture) = config.culture(name) else {
        error!("Unknown culture '{}'. Run `list` to see configured cultures.", name);
        return ExitCode::FAILURE;
    };
    let year_filter = year.or(config.year_filter);

    let report = tokio::select! {
        report = monitor.report(culture, year_filter) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, discarding partial results.");
            return ExitCode::from(130);
        }
    };

    log_summary(&report);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(monitor: &Monitor<HttpFetcher>, config: &AppConfig, once: bool) {
    loop {
        info!("Cultures to process: {}", config.cultures.len());

        let pass = join_all(
            config
                .cultures
                .iter()
                .map(|culture| monitor.report(culture, config.year_filter)),
        );
        let reports = tokio::select! {
            reports = pass => reports,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping.");
                return;
            }
        };
        for report in &reports {
            log_summary(report);
        }

        if once {
            return;
        }

        let purged = monitor.purge_cache().await;
        if purged > 0 {
            info!("Evicted {} stale listing sets", purged);
        }

        info!("Waiting {}s before the next pass...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping.");
                return;
            }
        }
    }
}
