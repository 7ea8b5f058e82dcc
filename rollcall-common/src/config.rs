//! Bootstrap configuration loading
//!
//! Configuration is read once at startup and cannot change while running.
//!
//! # Config File Resolution
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`ROLLCALL_CONFIG`)
//! 3. User config file (`~/.config/rollcall/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! A file that exists but does not parse or validate is an error.

use crate::roster::{Roster, RosterEntry};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ROLLCALL_CONFIG";

/// Highest Tesseract page segmentation mode
const MAX_PAGE_SEGMENTATION_MODE: u8 = 13;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upload staging directory, created at startup
    #[serde(default = "default_upload_folder")]
    pub upload_folder: PathBuf,

    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Subject label reported in every summary
    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Expected attendees; the built-in class list is used when omitted
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

/// OCR engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OcrConfig {
    /// Tesseract binary name or path
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: PathBuf,

    /// Tesseract language code
    #[serde(default = "default_language")]
    pub language: String,

    /// Tesseract `--psm` value (6 = single uniform block of text)
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u8,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upload_folder() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_subject() -> String {
    "CS 405 - Computer Vision".to_string()
}

fn default_tesseract_path() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_page_segmentation_mode() -> u8 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: default_tesseract_path(),
            language: default_language(),
            page_segmentation_mode: default_page_segmentation_mode(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            upload_folder: default_upload_folder(),
            max_upload_bytes: default_max_upload_bytes(),
            subject: default_subject(),
            ocr: OcrConfig::default(),
            logging: LoggingConfig::default(),
            roster: Vec::new(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from the resolved path, falling back to defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(path)
            }
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Configured roster, or the built-in class list when none is given
    pub fn roster(&self) -> Result<Roster> {
        if self.roster.is_empty() {
            Ok(Roster::default())
        } else {
            Roster::new(self.roster.clone())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ocr.page_segmentation_mode > MAX_PAGE_SEGMENTATION_MODE {
            return Err(Error::Config(format!(
                "ocr.page_segmentation_mode must be 0..={}, got {}",
                MAX_PAGE_SEGMENTATION_MODE, self.ocr.page_segmentation_mode
            )));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(Error::Config("ocr.language must not be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        if !self.roster.is_empty() {
            Roster::new(self.roster.clone()).map_err(|e| Error::Config(e.to_string()))?;
        }
        Ok(())
    }
}

/// Config file resolution following the priority order in the module docs
///
/// Returns `None` when neither an explicit path nor a user config file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file
    default_config_file().filter(|path| path.exists())
}

/// Platform config location (`~/.config/rollcall/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rollcall").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.upload_folder, PathBuf::from("uploads"));
        assert_eq!(config.subject, "CS 405 - Computer Vision");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.roster().unwrap().len(), 7);
    }

    #[test]
    fn test_rejects_out_of_range_psm() {
        let err = TomlConfig::from_toml_str("[ocr]\npage_segmentation_mode = 14\n").unwrap_err();
        assert!(err.to_string().contains("page_segmentation_mode"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(TomlConfig::from_toml_str("colour = \"blue\"\n").is_err());
    }

    #[test]
    fn test_custom_roster_replaces_default() {
        let config = TomlConfig::from_toml_str(
            r#"
            [[roster]]
            roll_no = "A1"
            name = "Ada Lovelace"

            [[roster]]
            roll_no = "A2"
            name = "Alan Turing"
            "#,
        )
        .unwrap();

        let roster = config.roster().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.entries()[1].surname(), "Turing");
    }

    #[test]
    fn test_duplicate_roster_roll_numbers_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
            [[roster]]
            roll_no = "A1"
            name = "Ada Lovelace"

            [[roster]]
            roll_no = "A1"
            name = "Alan Turing"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_arg_wins_resolution() {
        let path = resolve_config_path(Some(Path::new("/tmp/explicit.toml")), "ROLLCALL_TEST_UNSET_VAR");
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
