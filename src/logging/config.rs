use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Logging settings, read before anything else so startup errors are captured.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub production: bool,
    pub level: LogLevel,
    /// Directory for the rolling files; `None` logs to stdout only.
    pub dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let production = get("ENVIRONMENT").as_deref() == Some("production");
        let default_level = if production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        let level = get("LOG_LEVEL")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default_level);
        let dir = match get("LOG_DIR") {
            Some(raw) if raw.trim().is_empty() || raw.trim() == "-" => None,
            Some(raw) => Some(PathBuf::from(raw.trim())),
            None => Some(PathBuf::from("logs")),
        };
        Self {
            production,
            level,
            dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_environment() {
        let dev = LogConfig::from_vars(|_| None);
        assert!(!dev.production);
        assert_eq!(dev.level, LogLevel::Debug);
        assert_eq!(dev.dir, Some(PathBuf::from("logs")));

        let prod = LogConfig::from_vars(|key| (key == "ENVIRONMENT").then(|| "production".into()));
        assert_eq!(prod.level, LogLevel::Info);
    }

    #[test]
    fn test_overrides() {
        let config = LogConfig::from_vars(|key| match key {
            "LOG_LEVEL" => Some("WARNING".into()),
            "LOG_DIR" => Some("-".into()),
            _ => None,
        });
        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.dir.is_none());

        let bad = LogConfig::from_vars(|key| (key == "LOG_LEVEL").then(|| "loud".into()));
        assert_eq!(bad.level, LogLevel::Debug);
    }
}
