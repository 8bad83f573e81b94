//! Run configuration.
//!
//! A [`ChopConfig`] is built once at startup (YAML file, then CLI overrides) and
//! passed by reference to every source and sink. Nothing reads global state.
//!
//! # Example YAML Configuration
//!
//! ```yaml
//! date_format: "2006/01/02"
//! output_dir: "chopped"
//! encoding: shift_jis
//! has_header: false
//! compression_level: 9
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::partition::DatePattern;
use crate::ChopError;

/// Text encoding of the input files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Legacy double-byte Japanese encoding, decoded before parsing
    #[default]
    ShiftJis,

    /// Parse the raw bytes as UTF-8
    Utf8,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::ShiftJis => "Shift_JIS",
            TextEncoding::Utf8 => "UTF-8",
        }
    }
}

/// Configuration shared by every input file of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChopConfig {
    /// Date format of the first column
    ///
    /// Either a Go reference layout such as `20060102` or `2006-01-02 15:04:05`,
    /// or a strftime pattern (anything containing `%`).
    pub date_format: String,

    /// Root directory of the `year=/month=/day=` tree
    pub output_dir: PathBuf,

    /// Encoding the input bytes are decoded from
    pub encoding: TextEncoding,

    /// Treat the first row of every input as a header and drop it
    pub has_header: bool,

    /// bzip2 block size level, 1 (fastest) to 9 (best)
    pub compression_level: u32,
}

impl Default for ChopConfig {
    fn default() -> Self {
        Self {
            date_format: "20060102".to_string(),
            output_dir: PathBuf::from("chopped"),
            encoding: TextEncoding::default(),
            has_header: false,
            compression_level: 9,
        }
    }
}

impl ChopConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ChopError> {
        serde_yaml::from_str(yaml).map_err(|err| ChopError::Config(err.to_string()))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ChopError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|err| ChopError::Config(format!("{}: {err}", path.display())))?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject settings that would fail only after output has been written.
    pub fn validate(&self) -> Result<(), ChopError> {
        if !(1..=9).contains(&self.compression_level) {
            return Err(ChopError::Config(format!(
                "compression_level must be between 1 and 9, got {}",
                self.compression_level
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ChopError::Config("output_dir must not be empty".into()));
        }
        self.date_pattern().map(|_| ())
    }

    pub fn date_pattern(&self) -> Result<DatePattern, ChopError> {
        DatePattern::new(&self.date_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cli_defaults() {
        let config = ChopConfig::default();
        assert_eq!(config.date_format, "20060102");
        assert_eq!(config.output_dir, PathBuf::from("chopped"));
        assert_eq!(config.encoding, TextEncoding::ShiftJis);
        assert_eq!(config.compression_level, 9);
        config.validate().unwrap();
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = ChopConfig::from_yaml_str("encoding: utf8\noutput_dir: out\n").unwrap();
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.date_format, "20060102");
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        let err = ChopConfig::from_yaml_str("utf8_mode: true\n").unwrap_err();
        assert!(matches!(err, ChopError::Config(_)));
    }

    #[test]
    fn yaml_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chop.yaml");
        std::fs::write(&path, "date_format: \"%Y-%m-%d\"\nhas_header: true\n").unwrap();

        let config = ChopConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert!(config.has_header);
    }

    #[test]
    fn validate_rejects_bad_compression_level() {
        let config = ChopConfig {
            compression_level: 0,
            ..ChopConfig::default()
        };
        assert!(matches!(config.validate(), Err(ChopError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_strftime_pattern() {
        let config = ChopConfig {
            date_format: "%Y-%Q".into(),
            ..ChopConfig::default()
        };
        assert!(matches!(config.validate(), Err(ChopError::Config(_))));
    }
}
