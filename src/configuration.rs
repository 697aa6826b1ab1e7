//! Configuration loading for uabench.
//!
//! Settings come from a TOML file layered with `UABENCH_*` environment
//! variables (`UABENCH_RESULTS_DIR`, `UABENCH_PARSERS=a,b`, ...). Every
//! field has a default so an absent file is not an error.

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use validator::{Validate, ValidationError};

use crate::compare::EXPECTED_KEY;

pub const ENV_PREFIX: &str = "UABENCH";

/// Default config location, relative to the home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".config/uabench/config.toml";

/// Config file to load. An explicit path is taken as given, so a relative
/// one resolves against the working directory; the default lives under `home`.
pub fn config_file_path(explicit: Option<&Path>, home: &Path) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => home.join(DEFAULT_CONFIG_FILE),
    }
}

fn non_empty_path(path: &PathBuf) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::new("empty_path"));
    }
    Ok(())
}

/// Main configuration structure for uabench
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct UaBenchConfig {
    /// Root of the result store
    #[validate(custom(function = "non_empty_path"))]
    pub results_dir: PathBuf,
    /// Directory holding `<suite>.json` expected corpora
    #[validate(custom(function = "non_empty_path"))]
    pub corpus_dir: PathBuf,
    /// Synonym map file (JSON or YAML)
    pub synonyms: Option<PathBuf>,
    /// Parsers to analyze, in report order; empty means every stored parser
    pub parsers: Vec<String>,
    /// Test suites to analyze; empty means every stored suite
    pub suites: Vec<String>,
    /// Use a parser's output as ground truth instead of the corpora
    pub comparison_only: bool,
    /// Ground-truth parser for comparison-only mode
    pub reference_parser: Option<String>,
}

impl Default for UaBenchConfig {
    fn default() -> Self {
        UaBenchConfig {
            results_dir: PathBuf::from("results"),
            corpus_dir: PathBuf::from("corpus"),
            synonyms: None,
            parsers: Vec::new(),
            suites: Vec::new(),
            comparison_only: false,
            reference_parser: None,
        }
    }
}

impl UaBenchConfig {
    /// Load configuration from a TOML string, without environment overrides.
    ///
    /// # Example
    /// ```
    /// use uabench::configuration::UaBenchConfig;
    ///
    /// let config = UaBenchConfig::load_from_str(r#"
    /// results_dir = "out/results"
    /// parsers = ["uap-core", "woothee"]
    /// "#).unwrap();
    /// assert_eq!(config.parsers.len(), 2);
    /// ```
    pub fn load_from_str(toml: &str) -> anyhow::Result<Self> {
        let config: UaBenchConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize)
            .context("Failed to parse TOML config")?;

        config
            .validate_basic()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// Load configuration from a file (if it exists) plus `UABENCH_*`
    /// environment variables.
    pub fn load_from(file: &Path) -> anyhow::Result<Self> {
        debug!("Loading config from: {}", file.display());
        if !file.exists() {
            warn!("Can't find config file: {}", file.display());
        }

        let config: UaBenchConfig = Config::builder()
            .add_source(File::from(file).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("parsers")
                    .with_list_parse_key("suites"),
            )
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| format!("Failed to load config file: {}", file.display()))?;

        config
            .validate_basic()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// Field validation plus cross-field checks:
    /// - no duplicate parsers
    /// - the reference parser must be in a non-empty parser list
    /// - duplicate suites only warn
    pub fn validate_basic(&self) -> anyhow::Result<()> {
        self.validate()?;

        let mut seen = HashSet::new();
        for parser in &self.parsers {
            if !seen.insert(parser) {
                return Err(anyhow::anyhow!("Duplicate parser found: {}", parser));
            }
            if parser == EXPECTED_KEY {
                return Err(anyhow::anyhow!(
                    "Parser name '{}' is reserved for expected values in reports",
                    parser
                ));
            }
        }

        if let Some(reference) = &self.reference_parser {
            if !self.parsers.is_empty() && !self.parsers.contains(reference) {
                return Err(anyhow::anyhow!(
                    "Reference parser '{}' is not in the parser list",
                    reference
                ));
            }
        }

        let mut seen = HashSet::new();
        for suite in &self.suites {
            if !seen.insert(suite) {
                warn!("Duplicate suite found: {}", suite);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_file_path() {
        let home = Path::new("/home/someone");
        assert_eq!(
            config_file_path(None, home),
            PathBuf::from("/home/someone/.config/uabench/config.toml")
        );
        assert_eq!(
            config_file_path(Some(Path::new("bench.toml")), home),
            PathBuf::from("bench.toml")
        );
        assert_eq!(
            config_file_path(Some(Path::new("/etc/uabench.toml")), home),
            PathBuf::from("/etc/uabench.toml")
        );
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = UaBenchConfig::default();
        assert!(config.validate_basic().is_ok());
        assert_eq!(config.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn test_load_from_str_valid_toml() {
        let config = UaBenchConfig::load_from_str(
            r#"
results_dir = "data/results"
corpus_dir = "data/corpus"
synonyms = "data/synonyms.yaml"
parsers = ["matomo", "uap-core"]
comparison_only = true
reference_parser = "matomo"
"#,
        )
        .unwrap();

        assert_eq!(config.results_dir, PathBuf::from("data/results"));
        assert_eq!(config.synonyms, Some(PathBuf::from("data/synonyms.yaml")));
        assert!(config.comparison_only);
        assert_eq!(config.reference_parser.as_deref(), Some("matomo"));
        assert!(config.suites.is_empty());
    }

    #[test]
    fn test_load_from_str_invalid_toml() {
        let result = UaBenchConfig::load_from_str("parsers = [unterminated");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_duplicate_parsers_rejected() {
        let config = UaBenchConfig {
            parsers: vec!["woothee".to_string(), "woothee".to_string()],
            ..Default::default()
        };
        let err = config.validate_basic().unwrap_err();
        assert!(err.to_string().contains("Duplicate parser found"));
    }

    #[test]
    fn test_reserved_parser_name_rejected() {
        let config = UaBenchConfig {
            parsers: vec!["woothee".to_string(), "expected".to_string()],
            ..Default::default()
        };
        let err = config.validate_basic().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_reference_parser_must_be_listed() {
        let config = UaBenchConfig {
            parsers: vec!["woothee".to_string()],
            reference_parser: Some("matomo".to_string()),
            ..Default::default()
        };
        assert!(config.validate_basic().is_err());

        let unlisted = UaBenchConfig {
            reference_parser: Some("matomo".to_string()),
            ..Default::default()
        };
        assert!(unlisted.validate_basic().is_ok());
    }

    #[test]
    fn test_empty_results_dir_rejected() {
        let config = UaBenchConfig {
            results_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate_basic().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = UaBenchConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.corpus_dir, UaBenchConfig::default().corpus_dir);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "suites = [\"browscap\", \"whichbrowser\"]").unwrap();
        let config = UaBenchConfig::load_from(file.path()).unwrap();
        assert_eq!(config.suites, vec!["browscap", "whichbrowser"]);
    }
}
