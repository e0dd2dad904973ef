//! Analysis configuration: the values the engine needs from the outside.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// The architecture model file (JSON).
    pub model_file: PathBuf,
    /// Rule ids to skip; unknown ids are reported, not fatal.
    #[serde(default)]
    pub skip_rules: Vec<String>,
    /// Custom-rule plugin executables.
    #[serde(default)]
    pub custom_rule_plugins: Vec<PathBuf>,
    /// Tolerate tracking entries that match no generated risk.
    #[serde(default)]
    pub ignore_orphaned_risk_tracking: bool,
    /// Additional technologies merged over the built-in catalog.
    #[serde(default)]
    pub technology_file: Option<PathBuf>,
    /// Bound on each plugin call; unbounded when absent, matching the
    /// original fire-and-block behavior.
    #[serde(default)]
    pub plugin_timeout_secs: Option<u64>,
}

impl AnalysisConfig {
    pub fn new(model_file: impl Into<PathBuf>) -> Self {
        Self {
            model_file: model_file.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_parses_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"model_file": "arch.json", "skip_rules": ["missing-waf"]}}"#).unwrap();
        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.model_file, PathBuf::from("arch.json"));
        assert_eq!(config.skip_rules, vec!["missing-waf".to_string()]);
        assert!(!config.ignore_orphaned_risk_tracking);
        assert!(config.custom_rule_plugins.is_empty());
        assert!(config.plugin_timeout_secs.is_none());
    }
}
