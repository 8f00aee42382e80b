use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Origin allowed by CORS, i.e. where the front end is served from.
    pub client_url: String,
    pub jobs_api_url: String,
    pub jobs_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    /// Idle time after which a notification session is dropped.
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind.clone(),
        })?;

        let session_ttl = match lookup("SESSION_TTL_SECS") {
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            Some(value) => match value.trim().parse::<u64>().ok() {
                Some(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_TTL_SECS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            client_url: required("CLIENT_URL")?,
            jobs_api_url: required("JOBS_API_URL")?,
            jobs_api_key: lookup("JOBS_API_KEY").filter(|key| !key.is_empty()),
            bind_addr,
            session_ttl,
        })
    }
}
