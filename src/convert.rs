// 💱 Unit conversion and display formatting

pub const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Eur,
    Btc,
    Sats,
}

pub fn sats_to_btc(sats: f64) -> f64 {
    sats / SATS_PER_BTC
}

pub fn btc_to_fiat(btc: f64, price: f64) -> f64 {
    btc * price
}

pub fn sats_to_fiat(sats: f64, price: f64) -> f64 {
    btc_to_fiat(sats_to_btc(sats), price)
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_currency(amount: f64, currency: Currency) -> String {
    match currency {
        Currency::Eur => format!("{:.2} €", amount),
        Currency::Btc => format!("₿ {:.8}", amount),
        Currency::Sats => format!("{} sats", group_thousands(amount.round() as i64)),
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}
