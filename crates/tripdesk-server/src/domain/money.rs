//! Integer money helpers.
//!
//! Amounts are minor units (cents) in the trip currency. Rates are basis
//! points, so `1_250` bps is 12.5%.

/// Basis points in a whole.
pub const BPS_SCALE: i64 = 10_000;

/// Largest single amount accepted as input (100 billion major units).
///
/// Keeps every derived sum (markup up to 1000%, tax, fees, trip totals) far
/// inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// Apply a basis-point rate to an amount, rounding half away from zero.
pub fn apply_bps(amount_cents: i64, bps: i32) -> i64 {
    div_round(i128::from(amount_cents) * i128::from(bps), i128::from(BPS_SCALE))
}

/// `part / whole` expressed in basis points, rounded half away from zero.
///
/// Returns 0 when `whole` is 0.
pub fn ratio_bps(part_cents: i64, whole_cents: i64) -> i32 {
    if whole_cents == 0 {
        return 0;
    }
    let bps = div_round(
        i128::from(part_cents) * i128::from(BPS_SCALE),
        i128::from(whole_cents),
    );
    bps.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn div_round(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) ^ (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };
    rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Render an amount like `USD 1,234.56`.
pub fn format_minor(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let fraction = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{} {}{}.{:02}", currency, sign, grouped, fraction)
}

/// Normalize an ISO 4217 style currency code.
pub fn validate_currency(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}
