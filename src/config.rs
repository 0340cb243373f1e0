use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Longest a payment request may stay open.
pub const MAX_REQUEST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Wallet backend
    pub wallet_api_url: String,
    pub wallet_api_token: Option<String>,
    pub wallet_api_timeout: Duration,

    // Request lifecycle
    pub request_ttl: Duration,
    pub poll_interval: Duration,
    pub poll_immediately: bool,
    pub refresh_failure_warn_threshold: u32,

    // Push events
    pub event_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::parse_environment(&lookup)?;

        let config = Self {
            environment,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: Self::parse_var(&lookup, "PORT", "8080")?,

            wallet_api_url: lookup("WALLET_API_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            wallet_api_token: lookup("WALLET_API_TOKEN").filter(|t| !t.is_empty()),
            wallet_api_timeout: Duration::from_millis(Self::parse_var(
                &lookup,
                "WALLET_API_TIMEOUT_MS",
                "10000",
            )?),

            request_ttl: Duration::from_secs(Self::parse_var(&lookup, "REQUEST_TTL_SECS", "120")?),
            poll_interval: Duration::from_secs(Self::parse_var(
                &lookup,
                "POLL_INTERVAL_SECS",
                "3",
            )?),
            poll_immediately: Self::parse_var(&lookup, "POLL_IMMEDIATELY", "true")?,
            refresh_failure_warn_threshold: Self::parse_var(
                &lookup,
                "REFRESH_FAILURE_WARN_THRESHOLD",
                "5",
            )?,

            event_channel_capacity: Self::parse_var(&lookup, "EVENT_CHANNEL_CAPACITY", "64")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment<F>(lookup: &F) -> Result<Environment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        lookup(var)
            .unwrap_or_else(|| default.to_string())
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", var))
    }

    fn validate(&self) -> Result<()> {
        if !self.wallet_api_url.starts_with("http") {
            bail!("WALLET_API_URL must be HTTP(S) URL");
        }
        if self.request_ttl.is_zero() {
            bail!("REQUEST_TTL_SECS must be greater than 0");
        }
        if self.request_ttl > MAX_REQUEST_TTL {
            bail!(
                "REQUEST_TTL_SECS must be at most {}",
                MAX_REQUEST_TTL.as_secs()
            );
        }
        if self.poll_interval.is_zero() {
            bail!("POLL_INTERVAL_SECS must be greater than 0");
        }
        if self.wallet_api_timeout.is_zero() {
            bail!("WALLET_API_TIMEOUT_MS must be greater than 0");
        }
        if self.event_channel_capacity == 0 {
            bail!("EVENT_CHANNEL_CAPACITY must be greater than 0");
        }
        if self.environment == Environment::Production && self.wallet_api_token.is_none() {
            bail!("WALLET_API_TOKEN required in production");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
