use chrono::NaiveDate;

pub const NOT_AVAILABLE: &str = "N/A";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Tenure in years with two decimals, `N/A` when there is no hire date.
pub fn format_tenure(hire_date: Option<NaiveDate>, tenure_years: f64) -> String {
    match hire_date {
        Some(_) => format!("{:.2}", tenure_years),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
