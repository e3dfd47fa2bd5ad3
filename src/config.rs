use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::Backoff;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grouping::DEFAULT_GROUP_BY;
use crate::transport::{DEFAULT_MAX_FRAME_LENGTH, TcpConnector};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8333";

#[derive(Debug, Error)]
pub enum Error {
    #[error("read {path:?} failed: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config failed: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_group_by() -> Vec<String> {
    vec![DEFAULT_GROUP_BY.to_string()]
}

const fn default_max_frame_length() -> usize {
    DEFAULT_MAX_FRAME_LENGTH
}

const fn default_attempts() -> usize {
    10
}

const fn default_interval() -> Duration {
    Duration::from_secs(3)
}

const fn default_max_interval() -> Duration {
    Duration::from_secs(30)
}

const fn default_factor() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address of the rules server, `host:port`.
    #[serde(default = "default_address")]
    pub address: String,

    /// Label keys the fleet is grouped by initially.
    #[serde(default = "default_group_by")]
    pub group_by: Vec<String>,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Frames longer than this are dropped.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: default_address(),
            group_by: default_group_by(),
            reconnect: ReconnectConfig::default(),
            max_frame_length: default_max_frame_length(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        text.parse()
    }

    /// Collect every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = vec![];

        if self.address.trim().is_empty() {
            errors.push("address must not be empty".to_string());
        }
        if self.max_frame_length == 0 {
            errors.push("max_frame_length must be greater than 0".to_string());
        }
        if self.group_by.iter().any(|key| key.is_empty()) {
            errors.push("group_by must not contain empty keys".to_string());
        }

        let reconnect = &self.reconnect;
        if reconnect.attempts == 0 {
            errors.push("reconnect.attempts must be at least 1".to_string());
        }
        if reconnect.interval.is_zero() {
            errors.push("reconnect.interval must be greater than 0".to_string());
        }
        if reconnect.factor == 0 {
            errors.push("reconnect.factor must be at least 1".to_string());
        }
        if reconnect.max_interval < reconnect.interval {
            errors.push("reconnect.max_interval must not be less than interval".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn connector(&self) -> TcpConnector {
        TcpConnector::new(self.address.clone()).max_frame_length(self.max_frame_length)
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an empty document means all defaults
        let config = if s.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str::<Config>(s)?
        };

        config.validate().map_err(Error::Invalid)?;

        Ok(config)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Retries after a lost or failed connection before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_max_interval", with = "humantime_serde")]
    pub max_interval: Duration,

    /// Multiplier applied to the interval after every attempt.
    #[serde(default = "default_factor")]
    pub factor: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            attempts: default_attempts(),
            interval: default_interval(),
            max_interval: default_max_interval(),
            factor: default_factor(),
        }
    }
}

impl ReconnectConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::exponential(self.interval, self.factor)
            .max_delay(self.max_interval)
            .max_attempts(self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = "".parse::<Config>().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.address, "127.0.0.1:8333");
        assert_eq!(config.group_by, vec!["__container_id__"]);
        assert_eq!(config.max_frame_length, 16 * 1024 * 1024);

        let delays = config.reconnect.backoff().collect::<Vec<_>>();
        assert_eq!(delays, vec![Duration::from_secs(3); 10]);
    }

    #[test]
    fn full() {
        let config = r#"
address: profiler.local:9000
group_by: [namespace, container]
reconnect:
  attempts: 3
  interval: 500ms
  max_interval: 1s
  factor: 2
max_frame_length: 1024
"#
        .parse::<Config>()
        .unwrap();

        assert_eq!(config.address, "profiler.local:9000");
        assert_eq!(config.group_by, vec!["namespace", "container"]);
        assert_eq!(config.max_frame_length, 1024);
        assert_eq!(
            config.reconnect.backoff().collect::<Vec<_>>(),
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(1)
            ]
        );
    }

    #[test]
    fn partial_reconnect_section() {
        let config = "reconnect:\n  attempts: 1\n".parse::<Config>().unwrap();

        assert_eq!(config.reconnect.attempts, 1);
        assert_eq!(config.reconnect.interval, Duration::from_secs(3));
    }

    #[test]
    fn unknown_fields() {
        let err = "adress: 127.0.0.1:1\n".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{err}");

        let err = "reconnect:\n  retries: 1\n".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{err}");
    }

    #[test]
    fn bad_duration() {
        let err = "reconnect:\n  interval: 3 fortnights\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{err}");
        assert!(err.to_string().contains("3 fortnights"), "{err}");

        let config = "reconnect:\n  interval: 1m30s\n".parse::<Config>().unwrap();
        assert_eq!(config.reconnect.interval, Duration::from_secs(90));
    }

    #[test]
    fn invalid() {
        let err = r#"
address: ""
reconnect:
  attempts: 0
  interval: 0s
  factor: 0
"#
        .parse::<Config>()
        .unwrap_err();

        let Error::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(
            errors,
            vec![
                "address must not be empty",
                "reconnect.attempts must be at least 1",
                "reconnect.interval must be greater than 0",
                "reconnect.factor must be at least 1",
            ]
        );
    }

    #[test]
    fn serialize_round_trip() {
        let config = Config::default();
        let text = serde_yaml::to_string(&config).unwrap();

        assert!(text.contains("interval: 3s"), "{text}");
        assert_eq!(text.parse::<Config>().unwrap(), config);
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
