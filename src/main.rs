use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use gpudash::api::HttpDataSource;
use gpudash::app::App;
use gpudash::config::Config;
use gpudash::event_loop::run_app;
use gpudash::lifecycle::Dashboard;
use gpudash::logging::init_logging;
use gpudash::scheduler::{DisplayRegions, Domain, RefreshScheduler, RegionState};
use gpudash::terminal::WsConnector;

/// Terminal console for a GPU server fleet: live panels plus a remote shell.
#[derive(Debug, Parser)]
#[command(name = "gpudash", version, about)]
struct Cli {
    /// Config file (default: <config_dir>/gpudash/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monitoring API base URL, overriding the config file
    #[arg(long)]
    base_url: Option<Url>,

    /// Log file, overriding the config file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Load every panel once, print a summary and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    if let Some(log_file) = cli.log_file {
        config.logging.file = Some(log_file);
    }

    let log_path = config.logging.file_path()?;
    init_logging(&log_path, &config.logging.level)?;
    tracing::info!(
        event = "app.started",
        base_url = %config.server.base_url,
        log_file = %log_path.display(),
    );

    if cli.once {
        return print_snapshot(&config).await;
    }

    // Check if we're in a proper terminal
    if !io::stdin().is_terminal() {
        anyhow::bail!("gpudash must be run in an interactive terminal (or use --once)");
    }
    run_tui(config).await
}

async fn run_tui(config: Config) -> Result<()> {
    let source = HttpDataSource::new(
        config.server.base_url.clone(),
        config.server.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

    let (scheduler_tx, scheduler_rx) = mpsc::unbounded_channel();
    let (socket_tx, socket_rx) = mpsc::unbounded_channel();
    let dashboard = Dashboard::new(
        &config,
        Arc::new(source),
        Arc::new(WsConnector),
        scheduler_tx,
        socket_tx,
    );
    let mut app = App::new(config, dashboard);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )
    .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = match terminal.size() {
        Ok(size) => {
            app.resize(size.width, size.height, Instant::now());
            run_app(&mut terminal, &mut app, scheduler_rx, socket_rx).await
        }
        Err(e) => Err(e).context("Failed to get terminal size"),
    };

    // Timers and the socket go first, then the terminal is restored even on error
    app.dashboard.teardown();
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange,
        DisableBracketedPaste
    );
    let _ = terminal.show_cursor();

    tracing::info!(event = "app.stopped", ok = result.is_ok());
    result
}

/// Fetch every domain once and print one line per panel.
async fn print_snapshot(config: &Config) -> Result<()> {
    let source = HttpDataSource::new(
        config.server.base_url.clone(),
        config.server.request_timeout(),
    )
    .context("Failed to build HTTP client")?;
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut scheduler = RefreshScheduler::new(
        Arc::new(source),
        config.refresh.base_interval(),
        config.refresh.cadence,
        tx,
    );
    let mut regions = DisplayRegions::new();
    scheduler.load_all(&mut regions).await;

    let mut failed = 0;
    for domain in Domain::ALL {
        match regions.get(domain) {
            RegionState::Ready { data, .. } => {
                println!("{:<12} {}", domain.title(), data.summary());
            }
            RegionState::Failed { message, .. } => {
                failed += 1;
                println!("{:<12} {}", domain.title(), message);
            }
            RegionState::Loading => println!("{:<12} no data", domain.title()),
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} panels failed to load", Domain::ALL.len());
    }
    Ok(())
}
