use std::{fmt, num::NonZeroUsize, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{buffer::default_capacity, level::Level};

pub const ENV_VAR: &str = "DIAGLOG_ENV";
pub const CAPACITY_VAR: &str = "DIAGLOG_CAPACITY";
pub const SLOW_OPERATION_VAR: &str = "DIAGLOG_SLOW_OPERATION_MS";
pub const SLOW_API_VAR: &str = "DIAGLOG_SLOW_API_MS";
pub const SUPPRESS_VAR: &str = "DIAGLOG_SUPPRESS";

pub const DEFAULT_SLOW_OPERATION: Duration = Duration::from_millis(1000);
pub const DEFAULT_SLOW_API: Duration = Duration::from_millis(2000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown environment `{0}` (expected development or production)")]
    UnknownEnvironment(String),
    #[error("unknown log level `{0}`")]
    UnknownLevel(String),
    #[error("{var}: `{value}` is not a valid {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Whether a record of `level` reaches the sink in this environment.
    pub fn emits(&self, level: Level) -> bool {
        match self {
            Environment::Development => true,
            Environment::Production => level >= Level::Warn,
        }
    }

    #[inline]
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Environment::Development => "development",
            Environment::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_owned())),
        }
    }
}

/// Construction-time settings of a [`DiagnosticLogger`](crate::DiagnosticLogger).
///
/// Thresholds are compared with `>`: a duration exactly at the threshold is not slow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub environment: Environment,
    pub capacity: NonZeroUsize,
    #[serde(rename = "slow_operation_ms", with = "millis")]
    pub slow_operation_threshold: Duration,
    #[serde(rename = "slow_api_ms", with = "millis")]
    pub slow_api_threshold: Duration,
    /// Message substrings whose records are kept but not emitted. Errors are never suppressed.
    pub suppress: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            capacity: default_capacity(),
            slow_operation_threshold: DEFAULT_SLOW_OPERATION,
            slow_api_threshold: DEFAULT_SLOW_API,
            suppress: vec![],
        }
    }
}

impl Config {
    pub fn development() -> Self {
        Self::default()
    }

    pub fn production() -> Self {
        Self::default().with_environment(Environment::Production)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_slow_operation_threshold(mut self, threshold: Duration) -> Self {
        self.slow_operation_threshold = threshold;
        self
    }

    pub fn with_slow_api_threshold(mut self, threshold: Duration) -> Self {
        self.slow_api_threshold = threshold;
        self
    }

    pub fn with_suppress<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suppress = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the `DIAGLOG_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a caller supplied variable lookup.
    /// Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_VAR) {
            config.environment = v.parse()?;
        }
        if let Some(v) = lookup(CAPACITY_VAR) {
            config.capacity = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: CAPACITY_VAR,
                value: v.clone(),
                expected: "positive integer",
            })?;
        }
        if let Some(v) = lookup(SLOW_OPERATION_VAR) {
            config.slow_operation_threshold = parse_millis(SLOW_OPERATION_VAR, &v)?;
        }
        if let Some(v) = lookup(SLOW_API_VAR) {
            config.slow_api_threshold = parse_millis(SLOW_API_VAR, &v)?;
        }
        if let Some(v) = lookup(SUPPRESS_VAR) {
            config.suppress = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(config)
    }

    /// True when the message matches a suppression pattern and the level may be suppressed.
    pub fn is_suppressed(&self, level: Level, message: &str) -> bool {
        level < Level::Error && self.suppress.iter().any(|p| message.contains(p.as_str()))
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_owned(),
            expected: "number of milliseconds",
        })
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, num::NonZeroUsize, time::Duration};

    use super::{Config, ConfigError, Environment, CAPACITY_VAR};
    use crate::level::Level;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.environment, Environment::Development);
        assert_eq!(c.capacity.get(), 100);
        assert_eq!(c.slow_operation_threshold, Duration::from_millis(1000));
        assert_eq!(c.slow_api_threshold, Duration::from_millis(2000));
        assert!(c.suppress.is_empty());
    }

    #[test]
    fn emission_policy() {
        for level in Level::ALL {
            assert!(Environment::Development.emits(level));
        }
        assert!(!Environment::Production.emits(Level::Debug));
        assert!(!Environment::Production.emits(Level::Info));
        assert!(Environment::Production.emits(Level::Warn));
        assert!(Environment::Production.emits(Level::Error));
    }

    #[test]
    fn parse_environment() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "staging".parse::<Environment>(),
            Err(ConfigError::UnknownEnvironment("staging".to_owned()))
        );
    }

    #[test]
    fn from_lookup_reads_all_vars() {
        let c = Config::from_lookup(lookup(&[
            ("DIAGLOG_ENV", "production"),
            ("DIAGLOG_CAPACITY", "25"),
            ("DIAGLOG_SLOW_OPERATION_MS", "250"),
            ("DIAGLOG_SLOW_API_MS", " 900 "),
            ("DIAGLOG_SUPPRESS", "heartbeat, ,prefetch"),
        ]))
        .unwrap();
        assert_eq!(c.environment, Environment::Production);
        assert_eq!(c.capacity.get(), 25);
        assert_eq!(c.slow_operation_threshold, Duration::from_millis(250));
        assert_eq!(c.slow_api_threshold, Duration::from_millis(900));
        assert_eq!(c.suppress, vec!["heartbeat".to_owned(), "prefetch".to_owned()]);
    }

    #[test]
    fn from_lookup_empty_is_default() {
        assert_eq!(Config::from_lookup(|_| None).unwrap(), Config::default());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = Config::from_lookup(lookup(&[("DIAGLOG_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == CAPACITY_VAR));
    }

    #[test]
    fn bad_millis_rejected() {
        assert!(Config::from_lookup(lookup(&[("DIAGLOG_SLOW_API_MS", "fast")])).is_err());
    }

    #[test]
    fn deserialize_partial_json() {
        let c: Config = serde_json::from_str(r#"{"environment":"production","slow_api_ms":500}"#).unwrap();
        assert_eq!(c.environment, Environment::Production);
        assert_eq!(c.slow_api_threshold, Duration::from_millis(500));
        assert_eq!(c.capacity.get(), 100);
        assert!(serde_json::from_str::<Config>(r#"{"capacity":0}"#).is_err());
    }

    #[test]
    fn suppression_never_hides_errors() {
        let c = Config::default()
            .with_capacity(NonZeroUsize::new(3).unwrap())
            .with_suppress(["poll"]);
        assert!(c.is_suppressed(Level::Info, "poll tick"));
        assert!(c.is_suppressed(Level::Warn, "slow poll"));
        assert!(!c.is_suppressed(Level::Error, "poll failed"));
        assert!(!c.is_suppressed(Level::Info, "page view"));
    }
}
