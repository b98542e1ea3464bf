use crate::error::ForwarderError;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ENDPOINT: &str = "not-configured";
pub const DEFAULT_MAX_RECORDS_PER_POST: usize = 1000;

/// How a batch is rendered into the POST body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON document per line, each terminated by `\n`.
    #[default]
    Multiline,
    /// The whole batch as a single JSON array.
    Array,
}

/// Diagnostic verbosity. Accepts the usual level names case-insensitively,
/// including `WARNING` and `CRITICAL`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ForwarderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ForwarderError::InvalidConfig(format!(
                "Invalid log level '{other}'. Must be one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_filter_directive().to_uppercase())
    }
}

/// Process-wide forwarding configuration, read once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwarderConfig {
    /// Sumo Logic HTTP source URL
    pub endpoint: String,
    /// Upper bound on events per POST
    pub max_records_per_post: usize,
    /// When false, batches are built but never posted
    pub send_enabled: bool,
    pub output_mode: OutputMode,
    /// Unwrap streaming envelope records before dispatch
    pub streaming_conversion_enabled: bool,
    pub log_level: LogLevel,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_records_per_post: DEFAULT_MAX_RECORDS_PER_POST,
            send_enabled: true,
            output_mode: OutputMode::Multiline,
            streaming_conversion_enabled: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ForwarderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Unset variables
    /// take their defaults; set but unparseable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForwarderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let endpoint = lookup("SUMOLOGIC_ENDPOINT").unwrap_or(defaults.endpoint);
        let max_records_per_post = match lookup("MAX_RECORDS_PER_POST") {
            Some(val) => val.trim().parse::<usize>().map_err(|e| {
                ForwarderError::InvalidConfig(format!(
                    "MAX_RECORDS_PER_POST '{val}' is not a valid count: {e}"
                ))
            })?,
            None => defaults.max_records_per_post,
        };
        let send_enabled = parse_flag(&lookup, "SEND_TO_SUMOLOGIC", defaults.send_enabled)?;
        let output_mode = if parse_flag(&lookup, "SEND_AS_MULT_LINE", true)? {
            OutputMode::Multiline
        } else {
            OutputMode::Array
        };
        let streaming_conversion_enabled = parse_flag(
            &lookup,
            "OCI_STREAMING_CONVERSION_ENABLED",
            defaults.streaming_conversion_enabled,
        )?;
        let log_level = match lookup("LOGGING_LEVEL") {
            Some(val) => val.parse()?,
            None => defaults.log_level,
        };

        let config = Self {
            endpoint,
            max_records_per_post,
            send_enabled,
            output_mode,
            streaming_conversion_enabled,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.max_records_per_post == 0 {
            return Err(ForwarderError::InvalidConfig(
                "MAX_RECORDS_PER_POST must be greater than 0".to_string(),
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "SUMOLOGIC_ENDPOINT cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Strict boolean parsing: `true` or `false`, ignoring case and surrounding
/// whitespace.
pub fn parse_bool(key: &str, val: &str) -> Result<bool, ForwarderError> {
    match val.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ForwarderError::InvalidConfig(format!(
            "{key} must be 'true' or 'false', got '{val}'"
        ))),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ForwarderError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |val| parse_bool(key, &val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ForwarderConfig, ForwarderError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ForwarderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, ForwarderConfig::default());
        assert_eq!(config.endpoint, "not-configured");
        assert_eq!(config.max_records_per_post, 1000);
        assert!(config.send_enabled);
        assert_eq!(config.output_mode, OutputMode::Multiline);
        assert!(config.streaming_conversion_enabled);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            ("SUMOLOGIC_ENDPOINT", "https://collectors.example.com/receiver/v1/http/abc"),
            ("MAX_RECORDS_PER_POST", "100"),
            ("SEND_TO_SUMOLOGIC", "False"),
            ("SEND_AS_MULT_LINE", "FALSE"),
            ("OCI_STREAMING_CONVERSION_ENABLED", "false"),
            ("LOGGING_LEVEL", "DEBUG"),
        ])
        .unwrap();

        assert_eq!(
            config.endpoint,
            "https://collectors.example.com/receiver/v1/http/abc"
        );
        assert_eq!(config.max_records_per_post, 100);
        assert!(!config.send_enabled);
        assert_eq!(config.output_mode, OutputMode::Array);
        assert!(!config.streaming_conversion_enabled);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_parse_bool_is_strict() {
        assert!(parse_bool("X", "True").unwrap());
        assert!(parse_bool("X", " true ").unwrap());
        assert!(!parse_bool("X", "false").unwrap());
        assert!(parse_bool("X", "1").is_err());
        assert!(parse_bool("X", "yes").is_err());
        assert!(parse_bool("X", "").is_err());
        assert!(parse_bool("X", "__import__('os')").is_err());
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let err = config_from(&[("SEND_TO_SUMOLOGIC", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SEND_TO_SUMOLOGIC"));
    }

    #[test]
    fn test_invalid_batch_size() {
        assert!(config_from(&[("MAX_RECORDS_PER_POST", "ten")]).is_err());
        assert!(config_from(&[("MAX_RECORDS_PER_POST", "-5")]).is_err());
        assert!(config_from(&[("MAX_RECORDS_PER_POST", "0")]).is_err());
    }

    #[test]
    fn test_validate_empty_endpoint() {
        let config = ForwarderConfig {
            endpoint: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!("CRITICAL".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Info.to_string(), "INFO");
    }
}
