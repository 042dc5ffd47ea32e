//! Environment-derived server configuration.

use std::env;
use std::time::Duration;

use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SESSION_TTL_SECS: u64 = 5;
const DEFAULT_GC_CYCLE_SECS: u64 = 2;

/// Runtime configuration, sourced from the environment following a
/// "missing is fine, malformed is fatal (for the one field that must bind a
/// socket)" convention.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_level: String,
    pub trace: bool,
    pub session_ttl: Duration,
    pub gc_cycle: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            trace: false,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            gc_cycle: Duration::from_secs(DEFAULT_GC_CYCLE_SECS),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `LOG_LEVEL`, `SOCKJS_TRACE`, `SOCKJS_SESSION_TTL_SECS`
    /// and `SOCKJS_GC_CYCLE_SECS`. A missing variable falls back to the
    /// default silently; a present-but-malformed value falls back to the
    /// default with a logged warning, except `BIND_ADDR`, which is the one
    /// field the process cannot run without — parsed into a socket address
    /// and `expect`ed on failure rather than falling back silently.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            trace: parse_env_or("SOCKJS_TRACE", defaults.trace),
            session_ttl: Duration::from_secs(parse_env_or(
                "SOCKJS_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
            gc_cycle: Duration::from_secs(parse_env_or(
                "SOCKJS_GC_CYCLE_SECS",
                DEFAULT_GC_CYCLE_SECS,
            )),
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Err(_) => default,
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid environment value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(!config.trace);
        assert_eq!(config.session_ttl, Duration::from_secs(5));
        assert_eq!(config.gc_cycle, Duration::from_secs(2));
    }

    #[test]
    fn parse_env_or_falls_back_on_malformed_value() {
        // SAFETY: single-threaded test process, no concurrent env access.
        unsafe {
            env::set_var("SOCKJS_TEST_PARSE_ENV", "not-a-number");
        }
        let value: u64 = parse_env_or("SOCKJS_TEST_PARSE_ENV", 42);
        assert_eq!(value, 42);
        unsafe {
            env::remove_var("SOCKJS_TEST_PARSE_ENV");
        }
    }

    #[test]
    fn parse_env_or_uses_default_when_unset() {
        let value: u64 = parse_env_or("SOCKJS_TEST_PARSE_ENV_UNSET", 7);
        assert_eq!(value, 7);
    }
}
