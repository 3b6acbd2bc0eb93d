use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Application configuration managed by Figment.
///
/// Every field has a local-development default; environment variables
/// override in UPPER_SNAKE_CASE.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// Env: `LISTEN_ADDR`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// Env: `LISTEN_PORT`. Default: `3000`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Database URL for SQLite.
    /// Env: `DATABASE_URL`. Default: `sqlite://roster.db`.
    #[serde(default)]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// Env: `LOGLEVEL`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Max attempts for the startup database connection retry loop.
    /// Env: `DB_CONNECT_MAX_RETRIES`. Default: `8`.
    #[serde(default = "default_db_connect_max_retries")]
    pub db_connect_max_retries: usize,

    /// Base delay in milliseconds for the connection retry backoff.
    /// Env: `DB_CONNECT_BASE_DELAY_MS`. Default: `500`.
    #[serde(default = "default_db_connect_base_delay_ms")]
    pub db_connect_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            database_url: "sqlite://roster.db".to_string(),
            loglevel: "info".to_string(),
            db_connect_max_retries: default_db_connect_max_retries(),
            db_connect_base_delay_ms: default_db_connect_base_delay_ms(),
        }
    }
}

impl Config {
    /// Builds a Figment that merges defaults and environment variables.
    /// Uses raw env mapping, so field names map to env vars in UPPER_SNAKE_CASE.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::raw())
    }

    /// Loads configuration from the environment (with defaults).
    pub fn from_env() -> Self {
        Self::figment()
            .extract()
            .expect("failed to extract configuration via Figment")
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    3000
}

fn default_db_connect_max_retries() -> usize {
    8
}

fn default_db_connect_base_delay_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_override_defaults() {
        // SAFETY: single-threaded at this point in the test binary is not
        // guaranteed, but no other test reads LISTEN_PORT.
        unsafe {
            std::env::set_var("LISTEN_PORT", "4100");
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.listen_port, 4100);
        unsafe {
            std::env::remove_var("LISTEN_PORT");
        }
    }

    #[test]
    fn defaults_are_local_development_values() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_port, 3000);
        assert_eq!(cfg.database_url, "sqlite://roster.db");
        assert_eq!(cfg.loglevel, "info");
        assert_eq!(cfg.db_connect_max_retries, 8);
        assert_eq!(cfg.db_connect_base_delay_ms, 500);
    }
}
