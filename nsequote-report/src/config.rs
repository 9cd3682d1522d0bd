//! Viewer configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working NSE/Rupee setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nsequote_core::data::yahoo::DEFAULT_BASE_URL;
use nsequote_core::data::YahooSettings;
use nsequote_core::format::{DisplayStyle, FractionStyle, RUPEE};
use nsequote_core::symbol::{Normalizer, NSE_SUFFIX};

/// Largest accepted `provider.max_retries`.
pub const MAX_RETRIES: u32 = 10;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub market: MarketConfig,
    pub display: DisplayConfig,
    pub export: ExportConfig,
    pub provider: ProviderConfig,
}

/// Exchange the symbols are qualified for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Market identifier appended to tickers, without the dot.
    pub suffix: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            suffix: NSE_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub fraction_style: FractionStyle,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: RUPEE.to_string(),
            fraction_style: FractionStyle::Fixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory CSV files are written to.
    pub output_dir: PathBuf,
    /// Prefix files with a UTF-8 byte-order mark (helps spreadsheet apps
    /// pick up the Rupee sign).
    pub bom: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            bom: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

impl QuoteConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the config to use.
    ///
    /// An explicit path must exist. Without one, the per-user file
    /// (`<config dir>/nsequote/config.toml`) is used if present, otherwise
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Per-user config location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nsequote").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.normalizer()?;
        if self.display.currency_symbol.chars().any(char::is_control) {
            return Err(ConfigError::Invalid(
                "display.currency_symbol contains control characters".into(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.provider.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be at most {MAX_RETRIES}, got {}",
                self.provider.max_retries
            )));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".into()));
        }
        Ok(())
    }

    pub fn normalizer(&self) -> Result<Normalizer, ConfigError> {
        Normalizer::new(&self.market.suffix)
            .map_err(|e| ConfigError::Invalid(format!("market.suffix: {e}")))
    }

    pub fn display_style(&self) -> DisplayStyle {
        DisplayStyle {
            currency_symbol: self.display.currency_symbol.clone(),
            fraction: self.display.fraction_style,
        }
    }

    pub fn yahoo_settings(&self) -> YahooSettings {
        YahooSettings {
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            max_retries: self.provider.max_retries,
            base_delay: Duration::from_millis(self.provider.base_delay_ms),
            ..YahooSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = QuoteConfig::from_toml("").unwrap();
        assert_eq!(config, QuoteConfig::default());
        assert_eq!(config.normalizer().unwrap().suffix(), ".NS");
        assert_eq!(config.display_style(), DisplayStyle::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = QuoteConfig::from_toml(
            r#"
            [display]
            fraction_style = "compact"

            [export]
            bom = false
            "#,
        )
        .unwrap();
        assert_eq!(config.display.fraction_style, FractionStyle::Compact);
        assert_eq!(config.display.currency_symbol, "₹");
        assert!(!config.export.bom);
        assert_eq!(config.export.output_dir, PathBuf::from("exports"));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = QuoteConfig::default();
        config.market.suffix = "BO".into();
        config.provider.max_retries = 1;
        let text = config.to_toml().unwrap();
        assert_eq!(QuoteConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_values() {
        for bad in [
            "[market]\nsuffix = \"\"",
            "[market]\nsuffix = \"N S\"",
            "[provider]\ntimeout_secs = 0",
            "[display]\nfraction_style = \"scientific\"",
        ] {
            assert!(QuoteConfig::from_toml(bad).is_err(), "accepted: {bad}");
        }
    }

    #[test]
    fn retry_limit_is_bounded() {
        assert!(QuoteConfig::from_toml("[provider]\nmax_retries = 10").is_ok());
        assert!(QuoteConfig::from_toml("[provider]\nmax_retries = 0").is_ok());
        let err = QuoteConfig::from_toml("[provider]\nmax_retries = 40").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("max_retries")));
    }

    #[test]
    fn yahoo_settings_follow_provider_section() {
        let config = QuoteConfig::from_toml("[provider]\ntimeout_secs = 5\nbase_delay_ms = 10").unwrap();
        let settings = config.yahoo_settings();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.base_delay, Duration::from_millis(10));
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let err = QuoteConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
