//! `migmon` binary: flag parsing, configuration, logging and wiring.
//!
//! The dashboard owns the terminal's alternate screen, so logs are piped to
//! a file instead of stderr while the UI runs.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::LevelFilter;
use migmon_core::{Config, GithubApiClient, GithubClientArc, MigrationService};
use migmon_term::{destruct_terminal_for_panic, start_loop, DashboardState, RefreshService};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const LOG_FILE: &str = "migmon.log";

#[derive(Parser, Debug)]
#[clap(
    name = "migmon",
    version,
    about = "Terminal dashboard for monitoring GitHub organization migrations"
)]
struct Cli {
    #[clap(long, short, help = "GitHub organization to monitor")]
    organization: Option<String>,

    #[clap(
        long,
        short = 't',
        help = "GitHub token (can also be set via GHMM_GITHUB_TOKEN)"
    )]
    github_token: Option<String>,

    #[clap(long, short, help = "Monitor legacy migrations")]
    legacy: bool,

    #[clap(long, help = "Path to a YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, default_value = "info", help = "Log level for the log file")]
    log_level: String,

    #[clap(
        long,
        default_value_t = 60,
        help = "Background refresh interval in seconds"
    )]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(organization) = cli.organization {
        config.github.organization = organization;
    }
    if let Some(token) = cli.github_token {
        config.github.token = token;
    }
    if cli.legacy {
        config.migration.is_legacy = true;
    }
    config.validate()?;

    let client: GithubClientArc = Arc::new(GithubApiClient::new(
        &config.github.token,
        config.migration.is_legacy,
    )?);
    let service = Arc::new(MigrationService::new(client));

    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let worker_cancel = cancel.clone();
    let organization = config.github.organization.clone();
    let is_legacy = config.migration.is_legacy;
    let interval = Duration::from_secs(cli.interval.max(1));
    let worker = tokio::spawn(async move {
        RefreshService::start(
            service,
            organization,
            is_legacy,
            interval,
            event_tx,
            &mut action_rx,
            worker_cancel,
        )
        .await
    });

    std::panic::set_hook(Box::new(|panic_info| {
        destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    enable_raw_mode()?;
    crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let state = DashboardState::new(config.github.organization.clone());
    let result = start_loop(&mut terminal, state, action_tx, event_rx).await;

    cancel.cancel();
    let _ = worker.await;

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    let _ = crossterm::execute!(io::stdout(), cursor::Show);

    result
}

fn init_logger(level: &str) -> Result<()> {
    let filter = level.parse().unwrap_or(LevelFilter::Info);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("failed to open {LOG_FILE}"))?;

    env_logger::Builder::new()
        .filter_level(filter)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    Ok(())
}
