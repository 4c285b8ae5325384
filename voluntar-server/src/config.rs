//! Server configuration
//!
//! All settings come from environment variables and fall back to defaults
//! suitable for local development.

use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
const DEFAULT_JWT_SECRET: &str = "voluntar-dev-secret-change-me";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// PostgreSQL connection string; the in-memory store is used when unset
    pub database_url: Option<String>,

    /// Refuse to start instead of falling back to memory when the database is unreachable
    pub require_database: bool,

    /// Secret used to sign and verify access tokens
    pub jwt_secret: String,

    /// Lifetime of issued access tokens
    pub jwt_ttl: Duration,

    /// Seed the in-memory store with demo users and listings
    pub seed: bool,

    /// Number of events buffered per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            require_database: false,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl: Duration::from_secs(24 * 60 * 60),
            seed: true,
            event_capacity: 64,
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognised variables:
    /// - VOLUNTAR_BIND_ADDR (default: 0.0.0.0:4000)
    /// - PORT (overrides only the port of the default bind address)
    /// - DATABASE_URL (optional)
    /// - VOLUNTAR_REQUIRE_DATABASE (default: false)
    /// - JWT_SECRET (default: development secret)
    /// - JWT_EXPIRATION (e.g. 24h, 30m, 45s, 7d or plain seconds; default: 24h)
    /// - VOLUNTAR_SEED (default: true)
    /// - VOLUNTAR_EVENT_CAPACITY (default: 64)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match (env("VOLUNTAR_BIND_ADDR"), env("PORT")) {
            (Some(addr), _) => addr,
            (None, Some(port)) => format!("0.0.0.0:{}", port),
            (None, None) => defaults.bind_addr,
        };

        let database_url = env("DATABASE_URL");

        let require_database = env("VOLUNTAR_REQUIRE_DATABASE")
            .map(|s| parse_bool(&s))
            .transpose()?
            .unwrap_or(defaults.require_database);

        let jwt_secret = env("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set, using the development secret");
            defaults.jwt_secret
        });

        let jwt_ttl = env("JWT_EXPIRATION")
            .map(|s| parse_duration(&s))
            .transpose()?
            .unwrap_or(defaults.jwt_ttl);

        let seed = env("VOLUNTAR_SEED")
            .map(|s| parse_bool(&s))
            .transpose()?
            .unwrap_or(defaults.seed);

        let event_capacity = env("VOLUNTAR_EVENT_CAPACITY")
            .map(|s| {
                s.parse::<usize>().map_err(|_| {
                    anyhow::anyhow!("VOLUNTAR_EVENT_CAPACITY must be a number, got '{}'", s)
                })
            })
            .transpose()?
            .unwrap_or(defaults.event_capacity);

        Ok(Self {
            bind_addr,
            database_url,
            require_database,
            jwt_secret,
            jwt_ttl,
            seed,
            event_capacity,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.jwt_ttl.is_zero() {
            anyhow::bail!("Token lifetime must be greater than 0");
        }

        if self.event_capacity == 0 {
            anyhow::bail!("Event capacity must be greater than 0");
        }

        if self.require_database && self.database_url.is_none() {
            anyhow::bail!("VOLUNTAR_REQUIRE_DATABASE is set but DATABASE_URL is missing");
        }

        Ok(())
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}

/// Parses durations written as `24h`, `30m`, `45s`, `7d` or plain seconds
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{}'", value))?;

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => anyhow::bail!("invalid duration unit in '{}' (use s, m, h or d)", value),
    };

    let seconds = amount
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("duration '{}' is too large", value))?;

    Ok(Duration::from_secs(seconds))
}

/// Hides the credentials of a connection string for logging
pub fn mask_credentials(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****:****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
