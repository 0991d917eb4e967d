use std::{env, fmt, path::PathBuf, str::FromStr};

use thiserror::Error;

/// Whether tool methods are answered before `initialize` has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandshakePolicy {
    /// Answer `tools/list` and `tools/call` in any order.
    #[default]
    Lenient,
    /// Reject tool methods with `InvalidRequest` until `initialize` succeeds.
    Strict,
}

impl FromStr for HandshakePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidHandshake),
        }
    }
}

impl fmt::Display for HandshakePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log to this file instead of stderr. stdout is reserved for protocol lines.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub handshake: HandshakePolicy,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_HANDSHAKE must be one of: lenient, strict")]
    InvalidHandshake,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let handshake = non_empty("MCP_HANDSHAKE")
            .map(|value| value.parse::<HandshakePolicy>())
            .transpose()?
            .unwrap_or_default();
        let file = non_empty("MCP_LOG_FILE").map(PathBuf::from);

        Ok(Self {
            handshake,
            logging: LoggingConfig { file },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config should parse");
        assert_eq!(config.handshake, HandshakePolicy::Lenient);
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn strict_handshake_parses_case_insensitively() {
        let config = Config::from_lookup(lookup(&[("MCP_HANDSHAKE", " Strict ")]))
            .expect("config should parse");
        assert_eq!(config.handshake, HandshakePolicy::Strict);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("MCP_HANDSHAKE", ""), ("MCP_LOG_FILE", "  ")]))
            .expect("config should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn log_file_is_taken_verbatim() {
        let config = Config::from_lookup(lookup(&[("MCP_LOG_FILE", "/tmp/pairec-mcp.log")]))
            .expect("config should parse");
        assert_eq!(
            config.logging.file,
            Some(PathBuf::from("/tmp/pairec-mcp.log"))
        );
    }

    #[test]
    fn unknown_handshake_fails() {
        let err = Config::from_lookup(lookup(&[("MCP_HANDSHAKE", "paranoid")]))
            .expect_err("expected invalid handshake error");
        assert!(matches!(err, ConfigError::InvalidHandshake));
    }
}
