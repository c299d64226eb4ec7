//! Runtime configuration
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file. Configuration is read once at startup and handed to the
//! clients by reference.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{ChartsError, ChartsResult};
use crate::utils::DEFAULT_TIMEOUT_SECS;

/// Crypto.com API key variable
pub const ENV_API_KEY: &str = "CRYPTOCOM_API_KEY";
/// Crypto.com API secret variable
pub const ENV_API_SECRET: &str = "CRYPTOCOM_API_SECRET";
/// Optional Crypto.com base URL override
pub const ENV_CRYPTOCOM_URL: &str = "CRYPTOCOM_API_URL";
/// Optional CoinGecko base URL override
pub const ENV_COINGECKO_URL: &str = "COINGECKO_API_URL";
/// Optional request timeout in whole seconds
pub const ENV_HTTP_TIMEOUT: &str = "CRYPTO_CHARTS_HTTP_TIMEOUT_SECS";

pub const CRYPTOCOM_API_BASE: &str = "https://api.crypto.com/v2";
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Load a `.env` file from the working directory or one of its parents.
///
/// A missing file is not an error; variables already set in the process
/// environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => crate::log_debug!("config", "Loaded .env file", path = path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => crate::log_warn!("config", "Ignoring unreadable .env file", error = e),
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// HTTP behaviour shared by both providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpSettings {
    pub fn from_lookup<F>(lookup: F) -> ChartsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw) = lookup(ENV_HTTP_TIMEOUT) else {
            return Ok(Self::default());
        };
        let secs: u64 = raw.trim().parse().map_err(|_| {
            ChartsError::configuration(format!("{} must be a positive integer", ENV_HTTP_TIMEOUT))
                .with_details(raw.clone())
        })?;
        if secs == 0 {
            return Err(ChartsError::configuration(format!(
                "{} must be a positive integer",
                ENV_HTTP_TIMEOUT
            )));
        }
        Ok(Self {
            timeout: Duration::from_secs(secs),
        })
    }
}

/// Crypto.com API credentials
pub struct Credentials {
    pub api_key: String,
    pub api_secret: SecretString,
}

impl Credentials {
    /// Both values must be present and non-blank.
    pub fn new(api_key: impl Into<String>, api_secret: SecretString) -> ChartsResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChartsError::configuration(format!("{} is not set", ENV_API_KEY)));
        }
        if api_secret.expose_secret().trim().is_empty() {
            return Err(ChartsError::configuration(format!("{} is not set", ENV_API_SECRET)));
        }
        Ok(Self { api_key, api_secret })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Settings for the public CoinGecko dashboard
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: Url,
    pub http: HttpSettings,
}

impl CoinGeckoConfig {
    pub fn from_env() -> ChartsResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> ChartsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url: base_url(&lookup, ENV_COINGECKO_URL, COINGECKO_API_BASE)?,
            http: HttpSettings::from_lookup(&lookup)?,
        })
    }
}

/// Settings for the authenticated Crypto.com dashboard
#[derive(Debug)]
pub struct CryptoComConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    pub http: HttpSettings,
}

impl CryptoComConfig {
    /// Read the configuration, failing if either credential is absent.
    pub fn from_env() -> ChartsResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> ChartsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY).unwrap_or_default();
        let api_secret = SecretString::from(lookup(ENV_API_SECRET).unwrap_or_default());
        let credentials = Credentials::new(api_key, api_secret)?;

        Ok(Self {
            base_url: base_url(&lookup, ENV_CRYPTOCOM_URL, CRYPTOCOM_API_BASE)?,
            credentials,
            http: HttpSettings::from_lookup(&lookup)?,
        })
    }
}

fn base_url<F>(lookup: &F, var: &str, default: &str) -> ChartsResult<Url>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    let url = Url::parse(raw.trim()).map_err(|e| {
        ChartsError::configuration(format!("{} is not a valid URL", var)).with_details(e.to_string())
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ChartsError::configuration(format!("{} must be an http(s) URL", var))
            .with_details(raw));
    }
    Ok(url)
}
