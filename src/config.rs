use std::{env, fmt::Debug, str::FromStr};

use chrono::FixedOffset;
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,
    pub rate_scan_per_min: u32,

    pub api_prefix: String,
    pub log_level: tracing::Level,

    // Attendance
    /// Offset of the canteen's local clock from UTC, used for shift classification.
    pub utc_offset: FixedOffset,
    pub late_grace_minutes: i64,
    pub scan_debounce_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 900), // 15 min
            refresh_token_ttl: var_or("REFRESH_TOKEN_TTL", 604800), // 7 days

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60),
            rate_register_per_min: var_or("RATE_REGISTER_PER_MIN", 30),
            rate_refresh_per_min: var_or("RATE_REFRESH_PER_MIN", 30),
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000),
            rate_scan_per_min: var_or("RATE_SCAN_PER_MIN", 600),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: var_or("LOG_LEVEL", tracing::Level::DEBUG),

            utc_offset: offset_from_minutes("UTC_OFFSET_MINUTES", var_or("UTC_OFFSET_MINUTES", 0)),
            late_grace_minutes: var_or("LATE_GRACE_MINUTES", 10),
            scan_debounce_secs: var_or("SCAN_DEBOUNCE_SECS", 60),
        }
    }

    pub fn local_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}

/// Offsets must stay strictly within a day either way.
fn offset_from_minutes(key: &str, minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| panic!("{key} must be within +/- 24h, got {minutes}"))
}

fn var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    parse_or(key, env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value {value:?}: {e:?}")),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_when_unset() {
        assert_eq!(parse_or::<u32>("RATE_LOGIN_PER_MIN", None, 60), 60);
    }

    #[test]
    fn test_parse_or_reads_value() {
        assert_eq!(parse_or::<i32>("UTC_OFFSET_MINUTES", Some(" -360 ".into()), 0), -360);
        assert_eq!(
            parse_or("LOG_LEVEL", Some("info".into()), tracing::Level::DEBUG),
            tracing::Level::INFO
        );
    }

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(
            offset_from_minutes("UTC_OFFSET_MINUTES", -360),
            FixedOffset::west_opt(6 * 3600).unwrap()
        );
        assert_eq!(offset_from_minutes("UTC_OFFSET_MINUTES", 0).local_minus_utc(), 0);
    }

    #[test]
    #[should_panic(expected = "UTC_OFFSET_MINUTES")]
    fn test_offset_out_of_range_fails_at_startup() {
        offset_from_minutes("UTC_OFFSET_MINUTES", 1500);
    }

    #[test]
    #[should_panic(expected = "UTC_OFFSET_MINUTES")]
    fn test_offset_overflow_fails_at_startup() {
        offset_from_minutes("UTC_OFFSET_MINUTES", i32::MAX);
    }

    #[test]
    #[should_panic(expected = "LATE_GRACE_MINUTES")]
    fn test_parse_or_panics_on_garbage() {
        parse_or::<i64>("LATE_GRACE_MINUTES", Some("ten".into()), 10);
    }
}
