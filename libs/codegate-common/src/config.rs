// Gateway configuration
// Read once from the environment at startup

use crate::engine::{DEFAULT_ENGINE_URL, DEFAULT_TIMEOUT};
use crate::validation::MAX_CODE_BYTES;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub engine_url: String,
    pub bind_addr: String,
    pub timeout: Duration,
    pub max_code_bytes: usize,
    /// Optional languages.json overriding the builtin table
    pub languages_path: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_code_bytes: MAX_CODE_BYTES,
            languages_path: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or empty values keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("ENGINE_URL") {
            config.engine_url = url;
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = get("EXECUTION_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_positive("EXECUTION_TIMEOUT_SECS", &secs)?);
        }
        if let Some(bytes) = get("MAX_CODE_BYTES") {
            config.max_code_bytes = parse_positive("MAX_CODE_BYTES", &bytes)? as usize;
        }
        config.languages_path = get("LANGUAGES_CONFIG").map(PathBuf::from);

        Ok(config)
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_code_bytes, 50_000);
        assert_eq!(config.engine_url, DEFAULT_ENGINE_URL);
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("ENGINE_URL", "http://piston:2000/api/v2/execute"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("EXECUTION_TIMEOUT_SECS", "10"),
            ("MAX_CODE_BYTES", "1024"),
            ("LANGUAGES_CONFIG", "config/languages.json"),
        ]))
        .unwrap();

        assert_eq!(config.engine_url, "http://piston:2000/api/v2/execute");
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_code_bytes, 1024);
        assert_eq!(
            config.languages_path,
            Some(PathBuf::from("config/languages.json"))
        );
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[("ENGINE_URL", "  ")])).unwrap();
        assert_eq!(config.engine_url, DEFAULT_ENGINE_URL);
    }

    #[test]
    fn test_invalid_timeout() {
        for bad in ["0", "-5", "soon"] {
            let result = GatewayConfig::from_lookup(lookup(&[("EXECUTION_TIMEOUT_SECS", bad)]));
            assert_eq!(
                result,
                Err(ConfigError::Invalid {
                    name: "EXECUTION_TIMEOUT_SECS",
                    value: bad.to_string()
                })
            );
        }
    }
}
