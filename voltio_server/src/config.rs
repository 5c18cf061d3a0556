use std::env;

use chrono::Duration;
use log::*;
use voltio_common::Secret;

const DEFAULT_VOLTIO_HOST: &str = "127.0.0.1";
const DEFAULT_VOLTIO_PORT: u16 = 8360;
const DEFAULT_RATE_REFRESH: Duration = Duration::minutes(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// How often the exchange-rate worker polls the bank during business
    /// hours.
    pub rate_refresh_interval: Duration,
    /// Disables the background rate worker entirely (tests, offline work).
    pub disable_rate_worker: bool,
    /// Overrides the BNA quote board URL (tests point this at a stub).
    pub bna_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Shared HS256 secret for the session tokens issued by the auth
    /// collaborator.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, String> {
        let secret = env::var("VOLTIO_JWT_SECRET")
            .map_err(|_| "VOLTIO_JWT_SECRET is not set".to_string())?;
        if secret.len() < 32 {
            return Err("VOLTIO_JWT_SECRET must be at least 32 bytes".to_string());
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VOLTIO_HOST.to_string(),
            port: DEFAULT_VOLTIO_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            rate_refresh_interval: DEFAULT_RATE_REFRESH,
            disable_rate_worker: false,
            bna_url: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VOLTIO_HOST").ok().unwrap_or_else(|| DEFAULT_VOLTIO_HOST.into());
        let port = env::var("VOLTIO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for VOLTIO_PORT. {e} Using the default, \
                         {DEFAULT_VOLTIO_PORT}, instead."
                    );
                    DEFAULT_VOLTIO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_VOLTIO_PORT);
        let database_url = env::var("VOLTIO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ VOLTIO_DATABASE_URL is not set. Please set it to the storefront database URL.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. \
                 Reverting to the default configuration."
            );
            AuthConfig::default()
        });
        let rate_refresh_interval = env::var("VOLTIO_RATE_REFRESH_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::minutes)
            .unwrap_or(DEFAULT_RATE_REFRESH);
        let disable_rate_worker = env::var("VOLTIO_DISABLE_RATE_WORKER")
            .map(|s| &s == "1" || &s == "true")
            .unwrap_or(false);
        let bna_url = env::var("VOLTIO_BNA_URL").ok();
        Self { host, port, database_url, auth, rate_refresh_interval, disable_rate_worker, bna_url }
    }
}
