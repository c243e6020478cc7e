use std::str::FromStr;

use anyhow::{bail, Context};
/// Which backend serves the repositories for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "sql" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("unknown STORE_BACKEND {:?}, expected postgres or memory", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

/// Longest accepted session lifetime: one year.
pub const MAX_TTL_HOURS: i64 = 24 * 365;

/// `SESSION_TTL_HOURS`, defaulting to 72. Must lie in `1..=MAX_TTL_HOURS`.
fn parse_ttl_hours(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(72);
    };
    let hours: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("SESSION_TTL_HOURS {:?}", raw))?;
    if !(1..=MAX_TTL_HOURS).contains(&hours) {
        bail!("SESSION_TTL_HOURS must be between 1 and {}, got {}", MAX_TTL_HOURS, hours);
    }
    Ok(hours)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required for the postgres backend");
        }
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "taskdeck".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "taskdeck-users".into()),
            ttl_hours: parse_ttl_hours(std::env::var("SESSION_TTL_HOURS").ok().as_deref())?,
        };
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse().with_context(|| format!("APP_PORT {:?}", v))?,
            Err(_) => 8080,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            backend,
            database_url,
            session,
        })
    }
}
