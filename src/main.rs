use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use paymetrics::{
    export_daily_csv, format_currency, price_or_fallback, render_report, Config, Currency,
    DashboardService, TimeRange, WalletSource,
};

#[derive(Parser)]
#[command(name = "paymetrics")]
#[command(author, version, about = "Lightning coffee shop dashboard", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use generated wallet data instead of the Blink API
    #[arg(long, global = true)]
    mock: bool,

    /// all-time, current-month or custom
    #[arg(long, global = true, default_value = "all-time")]
    range: String,

    /// Start day for a custom range (YYYY-MM-DD)
    #[arg(long, global = true)]
    start: Option<String>,

    /// End day for a custom range (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full dashboard summary (default)
    Report,

    /// Snapshot as JSON
    Json,

    /// Settled outgoing payments
    Outgoing,

    /// Write daily revenue to a CSV file
    Export {
        #[arg(short, long, default_value = "daily.csv")]
        out: PathBuf,
    },

    /// Check that the wallet and price APIs answer
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env().context("Invalid configuration")?;
    let range = TimeRange::parse(&cli.range, cli.start.as_deref(), cli.end.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Invalid --range")?;

    if !cli.mock && !config.has_token() {
        eprintln!("❌ BLINK_TOKEN is not set!");
        eprintln!("   Export BLINK_TOKEN=<api key>");
        eprintln!("   or run with --mock to use generated data.");
        std::process::exit(1);
    }

    let service = DashboardService::from_config(config, cli.mock)
        .context("Failed to set up API clients")?;

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => {
            let snapshot = service.refresh(range).await;
            print!("{}", render_report(&snapshot));
        }
        Commands::Json => {
            let snapshot = service.refresh(range).await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Outgoing => {
            let snapshot = service.refresh(range).await;
            println!("💸 Outgoing payments ({})", snapshot.range.label());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            if snapshot.outgoing.is_empty() {
                println!("No outgoing payments found.");
            }
            for tx in &snapshot.outgoing {
                println!("{}  {:>12}", tx.date, format_currency(tx.amount, Currency::Eur));
            }
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!(
                "Total: {} in {} payments",
                format_currency(snapshot.coffee.total_sent, Currency::Eur),
                snapshot.coffee.send_count
            );
        }
        Commands::Export { out } => {
            let snapshot = service.refresh(range).await;
            let rows = export_daily_csv(&snapshot.daily, &out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("✓ Wrote {} days to {}", rows, out.display());
        }
        Commands::Check => run_check(&service, cli.mock).await?,
    }

    Ok(())
}

async fn run_check(service: &DashboardService, mock: bool) -> Result<()> {
    println!("🛠️  API check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = service.config();
    let mut ok = true;

    if mock {
        println!("⚡ Wallet: mock data (Blink not contacted)");
    } else {
        let wallet = paymetrics::BlinkClient::new(config)?;
        match wallet.fetch_balance().await {
            Ok(balance) => println!(
                "✓ Blink: {} wallets, {}",
                balance.wallets.len(),
                format_currency(balance.btc_sats() as f64, Currency::Sats)
            ),
            Err(e) => {
                ok = false;
                println!("❌ Blink: {}", e);
            }
        }
    }

    let quote = price_or_fallback(
        service.price_source(),
        &config.price_currency,
        config.fallback_price,
    )
    .await;
    if quote.is_fallback() {
        ok = false;
        println!(
            "❌ CoinGecko: {} (fallback {:.2} {})",
            quote.error.as_deref().unwrap_or("unknown error"),
            quote.price,
            quote.currency
        );
    } else {
        println!("✓ CoinGecko: 1 BTC = {:.2} {}", quote.price, quote.currency);
    }

    info!("API check finished, healthy={}", ok);
    if !ok {
        std::process::exit(2);
    }
    Ok(())
}
