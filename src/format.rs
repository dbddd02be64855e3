//! Human-readable number and time formatting
//!
//! Small helpers for the banner and the final summary: thousands grouping,
//! a `m.mm × 10^e` form for astronomically large counts, and the ladder of
//! units used for the exhaustive-coverage time estimate.

/// Values at or above this are shown in scientific form.
pub const SCIENTIFIC_THRESHOLD: f64 = 1e6;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const YEAR: f64 = 31_536_000.0;

/// Group an integer with comma thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a (non-negative) count, switching to `m.mm × 10^e` at the
/// scientific threshold.
pub fn format_large_number(value: f64) -> String {
    if value < SCIENTIFIC_THRESHOLD {
        return format_count(value as u64);
    }
    let exponent = value.log10().floor();
    let mantissa = value / 10f64.powf(exponent);
    format!("{:.2} × 10^{}", mantissa, exponent as i64)
}

/// Estimated wall time to exhaustively cover `space` candidates at
/// `throughput` attempts per second. `None` when no throughput was observed.
pub fn coverage_eta(space: f64, throughput: f64) -> Option<String> {
    if !(throughput.is_finite() && throughput > 0.0) {
        return None;
    }
    Some(format_eta(space / throughput))
}

/// Render a duration in the most appropriate unit, from seconds up through
/// years, with years beyond a century in scientific form.
pub fn format_eta(seconds: f64) -> String {
    if seconds < MINUTE {
        format!("{seconds:.2} seconds")
    } else if seconds < HOUR {
        format!("{:.2} minutes", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{:.2} hours", seconds / HOUR)
    } else if seconds < YEAR {
        format!("{:.2} days", seconds / DAY)
    } else if seconds < YEAR * 100.0 {
        format!("{:.2} years", seconds / YEAR)
    } else {
        format!("{} years", format_large_number(seconds / YEAR))
    }
}
