//! posgate TUI - PIN gate for the point-of-sale terminal
//!
//! Shows the PIN keypad, checks the PIN against the verification server and
//! opens the protected panel once it is accepted.

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use posgate_core::HttpPinVerifier;
use posgate_tui::app::{App, TuiConfig};
use ratatui::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "posgate-tui")]
#[command(about = "PIN gate for the point-of-sale terminal")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/posgate/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verification server base URL, overriding the configuration file
    #[arg(long)]
    server_url: Option<String>,

    /// Write the effective configuration to the configuration file and exit
    #[arg(long)]
    write_config: bool,
}

/// Application entry point with panic handling for terminal restoration
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up panic hook to restore terminal on crash
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    // Logs go to stderr so the alternate screen stays clean when redirected
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("posgate_tui=info".parse()?))
        .init();

    let mut config = match &args.config {
        Some(path) => TuiConfig::load_from(path),
        None => TuiConfig::load(),
    };
    if let Some(server_url) = args.server_url {
        config.gate.server_url = server_url;
    }

    if args.write_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        tracing::info!("Configuration written");
        return Ok(());
    }

    let result = run_app(&config).await;

    if let Err(e) = &result {
        tracing::error!("Application error: {}", e);
    }

    result
}

/// Main application runner
async fn run_app(config: &TuiConfig) -> Result<()> {
    let verifier = HttpPinVerifier::new(&config.gate.server_url, &config.gate.verify_path)
        .context("Invalid verification server")?;
    tracing::info!(endpoint = %verifier.endpoint(), "Using verification server");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run event loop
    let mut app = App::new(config, Arc::new(verifier));
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
