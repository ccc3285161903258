use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, Offset};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_check_in_per_min: u32,
    pub rate_protected_per_min: u32,

    // Site cache
    pub site_cache_capacity: u64,
    pub site_cache_ttl: Duration,

    /// Offset whose local midnight starts a new work day
    pub local_offset: FixedOffset,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("LOCAL_UTC_OFFSET_MINUTES {minutes} is out of range"))
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let local_offset = match env::var("LOCAL_UTC_OFFSET_MINUTES") {
            Ok(_) => offset_from_minutes(parse_or("LOCAL_UTC_OFFSET_MINUTES", 0)?)?,
            Err(_) => Local::now().offset().fix(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_check_in_per_min: parse_or("RATE_CHECK_IN_PER_MIN", 30)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            site_cache_capacity: parse_or("SITE_CACHE_CAPACITY", 10_000)?,
            site_cache_ttl: Duration::from_secs(parse_or("SITE_CACHE_TTL_SECS", 300)?),

            local_offset,
        })
    }
}
