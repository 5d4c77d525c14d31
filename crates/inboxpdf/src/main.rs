use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};

use inboxpdf::config::Config;
use inboxpdf::logging::init_logging;
use inboxpdf::{load_config, run_once, InboxPdfError, RunSummary};

/// Saves PDF attachments from unread mail sent by one address.
#[derive(Parser, Debug)]
#[command(name = "inboxpdf", version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "INBOXPDF_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single pass and exit.
    #[arg(long, conflicts_with = "continuous")]
    once: bool,

    /// Keep running, one pass every interval.
    #[arg(long)]
    continuous: bool,

    /// Minutes between passes in continuous mode.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_minutes: Option<u64>,

    /// Log level or filter directive, e.g. "debug" or "inboxpdf=trace".
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config {
            return path.clone();
        }
        dirs::config_dir()
            .map(|dir| dir.join("inboxpdf").join("config.json"))
            .filter(|path| path.is_file())
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    fn apply(&self, config: &mut Config) {
        if self.once {
            config.schedule.run_continuous = false;
        }
        if self.continuous {
            config.schedule.run_continuous = true;
        }
        if let Some(minutes) = self.interval_minutes {
            config.schedule.interval_minutes = minutes;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config_path();
    let mut config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("inboxpdf: {}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    if let Err(e) = init_logging(&config.logging, args.log_level.as_deref()) {
        eprintln!("inboxpdf: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Loaded configuration from {}", config_path.display());

    if config.schedule.run_continuous {
        run_continuous(&config).await;
        ExitCode::SUCCESS
    } else {
        match run_cycle(&config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        }
    }
}

/// One pass; the summary goes to the log and to stdout.
async fn run_cycle(config: &Config) -> Result<(), InboxPdfError> {
    match run_once(config).await {
        Ok(summary) => {
            report(&summary);
            Ok(())
        }
        Err(InboxPdfError::Email(e)) if e.is_fatal() => {
            error!("Could not open a mail session, no mailbox was changed: {}", e);
            Err(InboxPdfError::Email(e))
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e)
        }
    }
}

async fn run_continuous(config: &Config) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let interval = config.schedule.interval();
    info!(
        "Running every {} minutes, press Ctrl-C to stop",
        config.schedule.interval_minutes
    );

    while !shutdown.load(Ordering::SeqCst) {
        // Failures are already logged; the next cycle tries again.
        let _ = run_cycle(config).await;
        wait_or_shutdown(interval, &shutdown).await;
    }

    info!("Shutting down");
}

async fn wait_or_shutdown(interval: Duration, shutdown: &AtomicBool) {
    let started = Instant::now();
    while started.elapsed() < interval && !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn report(summary: &RunSummary) {
    let totals = summary.totals();
    info!("Run complete: {}", totals);

    let json = serde_json::json!({
        "mailboxes": summary.mailboxes,
        "totals": totals,
    });
    match serde_json::to_string_pretty(&json) {
        Ok(text) => println!("{}", text),
        Err(e) => warn!("Could not render run summary: {}", e),
    }
}
