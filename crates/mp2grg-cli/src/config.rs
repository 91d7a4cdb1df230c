//! Configuration file and the settings resolved from it and the command line.
//!
//! ```toml
//! [encode]
//! omit_subtypes = true
//!
//! [decode]
//! mappings = ["starting_points", "breakers_assignment"]
//! float_precision = 9
//!
//! [diagnostics]
//! strict = false
//!
//! [logging]
//! level = "debug"
//! ```

use anyhow::{Context, Result};
use mp2grg_io::decode::DEFAULT_FLOAT_PRECISION;
use mp2grg_io::{DecodeOptions, EncodeOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Mp2grgConfig {
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EncodeConfig {
    #[serde(default)]
    pub omit_subtypes: bool,
    #[serde(default)]
    pub skip_validation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodeConfig {
    #[serde(default)]
    pub mappings: Option<Vec<String>>,
    #[serde(default)]
    pub add_generator_costs: bool,
    #[serde(default)]
    pub add_bus_names: bool,
    /// Decimal places kept when scaling per-unit values back
    #[serde(default = "default_float_precision")]
    pub float_precision: u32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            mappings: None,
            add_generator_costs: false,
            add_bus_names: false,
            float_precision: default_float_precision(),
        }
    }
}

fn default_float_precision() -> u32 {
    DEFAULT_FLOAT_PRECISION
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DiagnosticsConfig {
    /// Treat warnings as errors
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load the configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Mp2grgConfig> {
    let Some(path) = path else {
        return Ok(Mp2grgConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config file {}", path.display()))
}

/// Options for one run after command-line flags are applied over the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub encode: EncodeOptions,
    pub decode: DecodeOptions,
    pub strict: bool,
    pub log_level: tracing::Level,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Mp2grgConfig) -> Result<Self> {
        let log_level = match cli.log_level {
            Some(level) => level,
            None => config
                .logging
                .level
                .parse()
                .with_context(|| format!("invalid log level '{}'", config.logging.level))?,
        };

        Ok(Settings {
            encode: EncodeOptions {
                omit_subtypes: cli.omit_subtypes || config.encode.omit_subtypes,
                skip_validation: cli.skip_validation || config.encode.skip_validation,
            },
            decode: DecodeOptions {
                mappings: cli.mappings.clone().or(config.decode.mappings),
                add_generator_costs: cli.add_generator_costs || config.decode.add_generator_costs,
                add_bus_names: cli.add_bus_names || config.decode.add_bus_names,
                float_precision: config.decode.float_precision,
            },
            strict: cli.strict || config.diagnostics.strict,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Mp2grgConfig = toml::from_str("").unwrap();
        assert_eq!(config, Mp2grgConfig::default());
        assert_eq!(config.decode.float_precision, 12);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_flags_override_file() {
        let config: Mp2grgConfig = toml::from_str(
            r#"
            [decode]
            mappings = ["starting_points"]
            float_precision = 6

            [diagnostics]
            strict = true

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let cli = Cli::parse_from(["mp2grg", "case.json", "--add-bus-names"]);
        let settings = Settings::resolve(&cli, config.clone()).unwrap();
        assert_eq!(settings.decode.mappings, Some(vec!["starting_points".to_string()]));
        assert_eq!(settings.decode.float_precision, 6);
        assert!(settings.decode.add_bus_names);
        assert!(settings.strict);
        assert_eq!(settings.log_level, tracing::Level::WARN);

        let cli = Cli::parse_from([
            "mp2grg",
            "case.json",
            "-m",
            "breakers_assignment",
            "--log-level",
            "trace",
        ]);
        let settings = Settings::resolve(&cli, config).unwrap();
        assert_eq!(settings.decode.mappings, Some(vec!["breakers_assignment".to_string()]));
        assert_eq!(settings.log_level, tracing::Level::TRACE);
    }

    #[test]
    fn test_bad_log_level_is_reported() {
        let config: Mp2grgConfig = toml::from_str("[logging]\nlevel = \"loud\"").unwrap();
        let cli = Cli::parse_from(["mp2grg", "case.m"]);
        let err = Settings::resolve(&cli, config).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(None).is_ok());
        let err = load_config(Some(Path::new("/nonexistent/mp2grg.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("reading config file"));
    }
}
