// PayMetrics - Web Server
// JSON API over the dashboard snapshot

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use paymetrics::api::{router, AppState};
use paymetrics::{Config, DashboardService, TimeRange};

#[derive(Parser)]
#[command(name = "paymetrics-server")]
#[command(author, version, about = "Lightning coffee shop dashboard API", long_about = None)]
struct Args {
    #[arg(short, long)]
    verbose: bool,

    /// Use generated wallet data instead of the Blink API
    #[arg(long)]
    mock: bool,

    /// Listen address (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("🌐 PayMetrics - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env().context("Invalid configuration")?;
    let mock = args.mock || !config.has_token();
    if mock && !args.mock {
        warn!("BLINK_TOKEN is not set, serving mock data");
    }

    let addr = args.bind.clone().unwrap_or_else(|| config.bind_addr.clone());
    let service =
        DashboardService::from_config(config, mock).context("Failed to set up API clients")?;
    let state = AppState::new(service);

    // Warm the cache so section endpoints answer immediately
    let snapshot = state.service.refresh(TimeRange::AllTime).await;
    for error in &snapshot.errors {
        warn!("Initial refresh: {}", error);
    }
    info!("Initial snapshot: {} days of revenue", snapshot.daily.len());

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
