//! mintwatch CLI
//!
//! Local execution entry point for checks, the watch loop and catalog listing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mintwatch::{
    error::Result,
    models::{Config, KnownState},
    pipeline::{self, AppContext, Scheduler},
    storage::{LocalStateStore, StateStore},
};

/// mintwatch - NBU coin catalog watcher
#[derive(Parser, Debug)]
#[command(
    name = "mintwatch",
    version,
    about = "Announces new coins and availability changes in the NBU catalog"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write notifications to the log instead of sending them
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one check now and print the summary
    Check,

    /// Check on a fixed interval until interrupted
    Watch {
        /// Override the interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Ignore the active window and check around the clock
        #[arg(long)]
        always: bool,
    },

    /// Print the current catalog without touching the known state
    List {
        /// Fetch each item's page for denomination, mintage, year and material
        #[arg(long)]
        details: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the state file and what it knows
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::debug!("Configuration from {}", cli.config.display());

    match cli.command {
        Command::Check => {
            config.validate()?;
            let context = AppContext::from_config(config, cli.dry_run)?;
            let detector = context.open_detector().await?;
            let report = pipeline::run_check(&detector).await?;
            println!("{}", report.summary());
        }

        Command::Watch { interval, always } => {
            if let Some(secs) = interval {
                config.schedule.interval_secs = secs;
            }
            if always {
                config.schedule.enforce_window = false;
            }
            config.validate()?;

            let context = AppContext::from_config(config, cli.dry_run)?;
            let detector = context.open_detector().await?;
            let scheduler = Scheduler::new(detector, &context.config.schedule);

            scheduler
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }

        Command::List { details } => {
            config.validate()?;
            let batch_size = details.then_some(config.enrich.batch_size);
            let context = AppContext::from_config(config, true)?;
            let listings = pipeline::run_list(
                &context.config.catalog.url,
                context.fetcher.as_ref(),
                &context.extractor,
                batch_size,
            )
            .await?;
            for listing in &listings {
                println!("{}", listing.line());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!(
                "Telegram: {}",
                if config.notify.telegram.is_configured() {
                    "configured"
                } else {
                    "not configured (notifications go to the log)"
                }
            );
            log::info!(
                "Proxy: {}",
                if config.proxy.api_key.is_some() {
                    "enabled"
                } else {
                    "disabled (direct fetch)"
                }
            );
        }

        Command::Info => {
            let store = LocalStateStore::new(&config.storage.state_file);
            log::info!("State file: {}", store.path().display());
            if !store.path().exists() {
                log::info!("No state saved yet.");
                return Ok(());
            }
            print_state(&store.load().await);
        }
    }

    Ok(())
}

fn print_state(state: &KnownState) {
    let counts = state.counts();
    println!("Known items:   {}", state.len());
    println!("  in stock:     {}", counts.in_stock);
    println!("  out of stock: {}", counts.out_of_stock);
    println!("  unknown:      {}", counts.unknown);
    if counts.unrecorded > 0 {
        println!("  unrecorded:   {}", counts.unrecorded);
    }
}
