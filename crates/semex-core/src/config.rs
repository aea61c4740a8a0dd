//! Semex configuration management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults that reproduce the behaviour of a plain `semex extract` run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Per-document extraction parameters
    pub extraction: ExtractionParameters,

    /// Output filters
    pub filters: FilterConfig,

    /// Output format
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(EnvOverrides::from_env()?.apply(Self::default()))
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        Ok(EnvOverrides::from_env()?.apply(self))
    }
}

/// Settings named by `SEMEX_*` variables; `None` when the variable is unset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub stop_at_first_error: Option<bool>,
    pub mime_detection: Option<bool>,
    pub metadata_timesize: Option<bool>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the overrides through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let flag = |key: &str| lookup(key).map(|value| parse_flag(key, value)).transpose();
        Ok(Self {
            log_level: lookup("SEMEX_LOG_LEVEL"),
            output_format: lookup("SEMEX_OUTPUT_FORMAT")
                .map(|format| format.parse::<OutputFormat>())
                .transpose()?,
            stop_at_first_error: flag("SEMEX_STOP_AT_FIRST_ERROR")?,
            mime_detection: flag("SEMEX_MIME_DETECTION")?,
            metadata_timesize: flag("SEMEX_METADATA_TIMESIZE")?,
        })
    }

    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
        if let Some(stop) = self.stop_at_first_error {
            config.extraction.stop_at_first_error = stop;
        }
        if let Some(detect) = self.mime_detection {
            config.extraction.mime_detection = detect;
        }
        if let Some(metadata) = self.metadata_timesize {
            config.extraction.metadata_timesize = metadata;
        }
        config
    }
}

fn parse_flag(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

/// Parameters of a single document extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionParameters {
    /// Consult the MIME detector before selecting extractors
    pub mime_detection: bool,

    /// Maximum number of bytes handed to the MIME detector
    pub mime_sample_size: usize,

    /// Ask extractors to halt their own parse loop at the first error
    pub stop_at_first_error: bool,

    /// Emit extraction date and triple count meta triples
    pub metadata_timesize: bool,

    /// Document IRI to use instead of the source URI
    pub document_context_iri: Option<String>,

    /// Character encoding used to decode markup documents
    pub default_encoding: Option<String>,
}

impl Default for ExtractionParameters {
    fn default() -> Self {
        Self {
            mime_detection: true,
            mime_sample_size: 4096,
            stop_at_first_error: false,
            metadata_timesize: false,
            document_context_iri: None,
            default_encoding: None,
        }
    }
}

/// Output filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Suppress output of the accidental-markup extractor unless it finds
    /// something outside the reserved vocabulary
    pub ignore_accidental_rdfa: bool,

    /// Extractor whose contexts are suppressed by default
    pub accidental_extractor: String,

    /// Namespace whose predicates do not lift the suppression
    pub reserved_namespace: String,

    /// Drop `xhtml:stylesheet` triples whatever extractor produced them
    pub always_suppress_css_triples: bool,

    /// Drop documents whose only output is a title
    pub ignore_empty_titles: bool,

    /// Extractor producing document titles
    pub title_extractor: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignore_accidental_rdfa: true,
            accidental_extractor: "html-rdfa11".to_string(),
            reserved_namespace: "http://www.w3.org/1999/xhtml/vocab#".to_string(),
            always_suppress_css_triples: true,
            ignore_empty_titles: true,
            title_extractor: "html-head-title".to_string(),
        }
    }
}

/// Serialization formats supported by the built-in writers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    NQuads,
    NTriples,
    Json,
}

impl OutputFormat {
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::NQuads => "nquads",
            Self::NTriples => "ntriples",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nquads" | "nq" => Ok(Self::NQuads),
            "ntriples" | "nt" => Ok(Self::NTriples),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "output.format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Writer to serialize with
    pub format: OutputFormat,

    /// Only count triples, write nothing
    pub count_only: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.extraction.mime_detection);
        assert_eq!(config.extraction.mime_sample_size, 4096);
        assert!(config.filters.ignore_empty_titles);
        assert_eq!(config.filters.title_extractor, "html-head-title");
        assert_eq!(config.output.format, OutputFormat::NQuads);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("nquads".parse::<OutputFormat>().unwrap(), OutputFormat::NQuads);
        assert_eq!("NT".parse::<OutputFormat>().unwrap(), OutputFormat::NTriples);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("rdfxml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("K", "Yes".to_string()).unwrap());
        assert!(!parse_flag("K", "0".to_string()).unwrap());
        assert!(parse_flag("K", "maybe".to_string()).is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extraction]\nstop_at_first_error = true\n\n[output]\nformat = \"json\"\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.extraction.stop_at_first_error);
        assert!(config.extraction.mime_detection);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_overrides_restore_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extraction]\nstop_at_first_error = true\nmime_detection = false\n"
        )
        .unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();

        let env = std::collections::HashMap::from([
            ("SEMEX_STOP_AT_FIRST_ERROR", "false"),
            ("SEMEX_MIME_DETECTION", "true"),
        ]);
        let overrides =
            EnvOverrides::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(overrides.stop_at_first_error, Some(false));
        assert_eq!(overrides.metadata_timesize, None);

        let config = overrides.apply(config);
        assert!(!config.extraction.stop_at_first_error);
        assert!(config.extraction.mime_detection);
        assert!(!config.extraction.metadata_timesize);
    }

    #[test]
    fn test_env_overrides_unset_keep_file_values() {
        let config = AppConfig {
            output: OutputConfig {
                format: OutputFormat::Json,
                ..OutputConfig::default()
            },
            ..AppConfig::default()
        };
        let overrides = EnvOverrides::from_lookup(|_| None).unwrap();
        assert_eq!(overrides, EnvOverrides::default());
        assert_eq!(overrides.apply(config).output.format, OutputFormat::Json);
    }

    #[test]
    fn test_env_overrides_invalid_value() {
        let err = EnvOverrides::from_lookup(|key| {
            (key == "SEMEX_MIME_DETECTION").then(|| "sometimes".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/semex.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
