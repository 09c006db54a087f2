//! Configuration for [`vld_logger`](../vld_logger/index.html).
use serde::{Deserialize, Serialize};

/// Logger configuration, loadable from a TOML `[logger]` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `log` crate filter string, e.g. `"info,vld_pack=debug"`.
    pub filter: Option<String>,
    /// Disable ANSI colors (e.g. when logs are piped to a file).
    pub color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            color: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_color_and_no_filter() {
        let cfg = LoggerConfig::default();
        assert!(cfg.color);
        assert!(cfg.filter.is_none());
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = LoggerConfig {
            filter: Some("debug".to_owned()),
            color: false,
        };
        let s = toml::to_string(&cfg).unwrap();
        let back: LoggerConfig = toml::from_str(&s).unwrap();
        assert_eq!(back.filter.as_deref(), Some("debug"));
        assert!(!back.color);
    }
}
