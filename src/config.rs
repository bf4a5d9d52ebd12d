//! Service configuration from the environment

use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Configuration for the inference engine connection
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of a remote engine; `None` runs the in-process keyword engine
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub engine: EngineConfig,
    /// Sessions with no activity for this long are dropped
    pub session_idle_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or_default(&lookup, "TRIAGE_PORT", DEFAULT_PORT);
        let timeout_secs = parse_or_default(
            &lookup,
            "TRIAGE_ENGINE_TIMEOUT_SECS",
            DEFAULT_ENGINE_TIMEOUT_SECS,
        );
        let idle_secs = parse_or_default(
            &lookup,
            "TRIAGE_SESSION_IDLE_SECS",
            DEFAULT_SESSION_IDLE_SECS,
        );
        let url = lookup("TRIAGE_ENGINE_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Self {
            port,
            engine: EngineConfig {
                url,
                timeout: Duration::from_secs(timeout_secs),
            },
            session_idle_timeout: Duration::from_secs(idle_secs),
        }
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
