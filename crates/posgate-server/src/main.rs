//! posgate-server: PIN verification endpoint for the point-of-sale gate

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use posgate_server::{router, PinPolicy, DEFAULT_PIN, DEFAULT_PIN_LEN};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "posgate-server")]
#[command(about = "PIN verification server for the posgate gate")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind to
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// PIN accepted by the server
    #[arg(long, env = "POS_PIN", default_value = DEFAULT_PIN, hide_env_values = true)]
    pin: String,

    /// Number of digits in a PIN
    #[arg(long, env = "POS_PIN_LEN", default_value_t = DEFAULT_PIN_LEN)]
    pin_length: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "posgate_server=debug,tower_http=debug"
    } else {
        "posgate_server=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let policy = PinPolicy::new(args.pin, args.pin_length).context("Invalid PIN configuration")?;

    info!("Starting posgate-server");
    info!("PIN length: {}", policy.length());

    let app = router(policy);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid bind address")?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
