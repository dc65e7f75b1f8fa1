//! Structured logging initialization and environment-driven configuration
//! for the Sentinel policy authority (ambient concerns, spec §7).
#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initialize JSON-formatted structured logging, filtered by `RUST_LOG`
/// (e.g. `"info,sentinel_gating=debug"`). Defaults to `info` when unset.
///
/// Safe to call more than once per process; subsequent calls are no-ops
/// because `tracing` only accepts the first global subscriber.
pub fn init_json_logging() {
    let fmt_layer = fmt::layer().json().with_current_span(true).with_span_list(true);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Environment-sourced runtime configuration. No config-file discovery —
/// every knob is read straight from `std::env::var` with a hard-coded
/// default, mirroring the defaults stated in the component specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether the verifying loader rejects unsigned/invalid policies
    /// outright, rather than logging a warning and loading anyway.
    pub enforce_signatures: bool,
    /// TTL cache entry lifetime.
    pub cache_ttl: Duration,
    /// Webhook sink request timeout.
    pub webhook_timeout: Duration,
    /// Webhook sink max retry attempts after the first.
    pub webhook_max_retries: u32,
    /// Webhook sink base backoff delay.
    pub webhook_base_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enforce_signatures: true,
            cache_ttl: Duration::from_secs(300),
            webhook_timeout: Duration::from_secs(10),
            webhook_max_retries: 3,
            webhook_base_delay: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Build a [`Config`] from environment variables, falling back to
    /// [`Config::default`] for anything unset or unparseable.
    ///
    /// Recognized variables: `SENTINEL_ENFORCE_SIGNATURES` (`"true"`/`"false"`),
    /// `SENTINEL_CACHE_TTL_SECS`, `SENTINEL_WEBHOOK_TIMEOUT_SECS`,
    /// `SENTINEL_WEBHOOK_MAX_RETRIES`, `SENTINEL_WEBHOOK_BASE_DELAY_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enforce_signatures: read_bool("SENTINEL_ENFORCE_SIGNATURES", defaults.enforce_signatures),
            cache_ttl: read_secs("SENTINEL_CACHE_TTL_SECS", defaults.cache_ttl),
            webhook_timeout: read_secs("SENTINEL_WEBHOOK_TIMEOUT_SECS", defaults.webhook_timeout),
            webhook_max_retries: read_u32("SENTINEL_WEBHOOK_MAX_RETRIES", defaults.webhook_max_retries),
            webhook_base_delay: read_secs("SENTINEL_WEBHOOK_BASE_DELAY_SECS", defaults.webhook_base_delay),
        }
    }
}

fn read_bool(key: &str, default: bool) -> bool {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn read_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn read_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_used_when_env_unset() {
        for key in [
            "SENTINEL_ENFORCE_SIGNATURES",
            "SENTINEL_CACHE_TTL_SECS",
            "SENTINEL_WEBHOOK_TIMEOUT_SECS",
            "SENTINEL_WEBHOOK_MAX_RETRIES",
            "SENTINEL_WEBHOOK_BASE_DELAY_SECS",
        ] {
            std::env::remove_var(key);
        }
        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    #[serial]
    fn env_vars_override_defaults() {
        std::env::set_var("SENTINEL_ENFORCE_SIGNATURES", "false");
        std::env::set_var("SENTINEL_CACHE_TTL_SECS", "60");
        std::env::set_var("SENTINEL_WEBHOOK_MAX_RETRIES", "5");
        let cfg = Config::from_env();
        assert!(!cfg.enforce_signatures);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.webhook_max_retries, 5);
        std::env::remove_var("SENTINEL_ENFORCE_SIGNATURES");
        std::env::remove_var("SENTINEL_CACHE_TTL_SECS");
        std::env::remove_var("SENTINEL_WEBHOOK_MAX_RETRIES");
    }

    #[test]
    #[serial]
    fn malformed_value_falls_back_to_default() {
        std::env::set_var("SENTINEL_WEBHOOK_MAX_RETRIES", "not-a-number");
        let cfg = Config::from_env();
        assert_eq!(cfg.webhook_max_retries, Config::default().webhook_max_retries);
        std::env::remove_var("SENTINEL_WEBHOOK_MAX_RETRIES");
    }
}
