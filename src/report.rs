// 🧾 Reports - plain-text summary and CSV export

use crate::aggregate::DailyData;
use crate::convert::{format_currency, Currency};
use crate::dashboard::DashboardSnapshot;
use crate::error::Result;
use std::io;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Human-readable summary of a snapshot.
pub fn render_report(snapshot: &DashboardSnapshot) -> String {
    let eur = |v: f64| format_currency(v, Currency::Eur);
    let coffee = &snapshot.coffee;
    let mut lines = Vec::new();

    lines.push(format!("☕ Coffee Dashboard ({})", snapshot.range.label()));
    lines.push(RULE.to_string());
    if snapshot.mock {
        lines.push("🧪 Mock data".to_string());
    }

    lines.push(format!(
        "💰 Balance:      {}  ({} ⚡, {})",
        eur(snapshot.balance_fiat),
        format_currency(snapshot.balance_sats as f64, Currency::Sats),
        format_currency(snapshot.balance_btc, Currency::Btc),
    ));
    lines.push(format!(
        "📈 BTC price:    {} {:.2} ({:?})",
        snapshot.price.currency, snapshot.price.price, snapshot.price.source
    ));

    lines.push("\n📊 Revenue".to_string());
    lines.push(format!("   Total:        {}", eur(snapshot.stats.total_euros)));
    lines.push(format!("   Payments:     {}", snapshot.stats.total_transactions));
    lines.push(format!(
        "   Ø payment:    {}",
        eur(snapshot.stats.average_transaction_value)
    ));
    lines.push(format!("   Ø per day:    {}", eur(snapshot.stats.daily_average)));

    lines.push("\n☕ Coffees".to_string());
    lines.push(format!(
        "   Estimated:    {} (simple count {})",
        coffee.smart_coffee_count, coffee.simple_coffee_count
    ));
    lines.push(format!("   Coffee price: {}", eur(coffee.coffee_price)));
    lines.push(format!("   Ø per coffee: {}", eur(coffee.average_price_per_coffee)));
    lines.push(format!(
        "   Ignored:      {} small, {} bulk",
        coffee.ignored_count, coffee.bulk_count
    ));

    lines.push(format!(
        "\n💸 Expenses:     {} ({} payments)",
        eur(coffee.total_sent),
        coffee.send_count
    ));
    lines.push(format!("⚖️  Profit/loss:  {}", eur(snapshot.profit_loss)));

    if !snapshot.daily.is_empty() {
        lines.push("\n📅 Daily".to_string());
        for day in &snapshot.daily {
            lines.push(format!(
                "   {}  {:>10}  {:>3} payments  {:>3} coffees",
                day.date,
                eur(day.euros),
                day.transaction_count,
                day.coffee_count
            ));
        }
    }

    if !snapshot.errors.is_empty() {
        lines.push("\n⚠️  Warnings".to_string());
        for error in &snapshot.errors {
            lines.push(format!("   - {}", error));
        }
    }

    lines.push(RULE.to_string());
    lines.push(format!(
        "Last update: {}",
        snapshot.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write daily rows as CSV with a header line.
pub fn write_daily_csv<W: io::Write>(daily: &[DailyData], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for day in daily {
        csv_writer.serialize(day)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export daily rows to a CSV file, returning the number of rows written.
pub fn export_daily_csv(daily: &[DailyData], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    write_daily_csv(daily, file)?;
    Ok(daily.len())
}
