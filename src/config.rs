use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Business timezone for every "today" / "now".
    pub timezone: Tz,
    /// Local time the absence sweep runs each day.
    pub absence_sweep_at: NaiveTime,

    pub employee_cache_capacity: u64,
    pub employee_cache_ttl_secs: u64,
    /// JSON array of employees loaded into the in-memory store.
    pub employee_seed_file: Option<String>,

    pub log_level: tracing::Level,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let absence_sweep_at = var_or("ABSENCE_SWEEP_AT", "23:00:00");
        let absence_sweep_at = NaiveTime::parse_from_str(&absence_sweep_at, "%H:%M:%S")
            .with_context(|| format!("ABSENCE_SWEEP_AT={absence_sweep_at:?} must be HH:MM:SS"))?;

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            rate_protected_per_min: parse_var("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: var_or("API_PREFIX", "/api"),

            timezone: parse_var("APP_TIMEZONE", "Asia/Kolkata")?,
            absence_sweep_at,

            employee_cache_capacity: parse_var("EMPLOYEE_CACHE_CAPACITY", "10000")?,
            employee_cache_ttl_secs: parse_var("EMPLOYEE_CACHE_TTL_SECS", "300")?,
            employee_seed_file: env::var("EMPLOYEE_SEED_FILE").ok(),

            log_level: parse_var("LOG_LEVEL", "debug")?,
        })
    }
}
