//! Runtime configuration for the eligibility pipeline
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables. The resulting value is never mutated afterwards.

use crate::errors::{EligibilityError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Where the fitted artifacts live
    pub artifacts: ArtifactConfig,
    /// Label texts written to reports
    pub labels: LabelConfig,
    /// Batch report column names
    pub report: ReportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    pub encoder_file: String,
    pub numeric_features_file: String,
    pub categorical_features_file: String,
    pub selected_features_file: String,
    /// Refuse to start unless the bundle fingerprint matches
    pub expected_fingerprint: Option<String>,
}

/// Label texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub eligible: String,
    pub ineligible: String,
}

/// Report column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub prediction_column: String,
    pub eligible_probability_column: String,
    pub ineligible_probability_column: String,
    /// Optional ground-truth column used for the accuracy check
    pub ground_truth_column: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models/pkh_v1"),
            model_file: "model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            encoder_file: "ohe.json".to_string(),
            numeric_features_file: "numerical_features.json".to_string(),
            categorical_features_file: "categorical_features.json".to_string(),
            selected_features_file: "selected_features.json".to_string(),
            expected_fingerprint: None,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            eligible: "LAYAK".to_string(),
            ineligible: "TIDAK LAYAK".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            prediction_column: "Hasil Prediksi".to_string(),
            eligible_probability_column: "Prob_LAYAK (%)".to_string(),
            ineligible_probability_column: "Prob_TIDAK_LAYAK (%)".to_string(),
            ground_truth_column: "Status Kelayakan".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ArtifactConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.dir.join(&self.encoder_file)
    }

    pub fn numeric_features_path(&self) -> PathBuf {
        self.dir.join(&self.numeric_features_file)
    }

    pub fn categorical_features_path(&self) -> PathBuf {
        self.dir.join(&self.categorical_features_file)
    }

    pub fn selected_features_path(&self) -> PathBuf {
        self.dir.join(&self.selected_features_file)
    }
}

impl EligibilityConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| EligibilityError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// File (if given) then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `PKH_*` overrides; `lookup` abstracts the environment for tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PKH_ARTIFACT_DIR") {
            self.artifacts.dir = PathBuf::from(dir);
        }
        if let Some(fingerprint) = lookup("PKH_EXPECTED_FINGERPRINT") {
            self.artifacts.expected_fingerprint = Some(fingerprint);
        }
        if let Some(level) = lookup("PKH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(column) = lookup("PKH_GROUND_TRUTH_COLUMN") {
            self.report.ground_truth_column = column;
        }
    }

    /// Reject contradictory settings; return non-fatal warnings
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        let labels = [&self.labels.eligible, &self.labels.ineligible];
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(EligibilityError::Config("label texts must not be empty".into()));
        }
        if self.labels.eligible.trim().eq_ignore_ascii_case(self.labels.ineligible.trim()) {
            return Err(EligibilityError::Config(
                "eligible and ineligible labels must differ".into(),
            ));
        }

        let appended = [
            &self.report.prediction_column,
            &self.report.eligible_probability_column,
            &self.report.ineligible_probability_column,
        ];
        if appended.iter().any(|c| c.is_empty()) {
            return Err(EligibilityError::Config("report column names must not be empty".into()));
        }
        if appended[0] == appended[1] || appended[0] == appended[2] || appended[1] == appended[2] {
            return Err(EligibilityError::Config("report column names must be distinct".into()));
        }
        if appended.contains(&&self.report.ground_truth_column) {
            return Err(EligibilityError::Config(
                "ground-truth column cannot be one of the appended report columns".into(),
            ));
        }

        if self.report.ground_truth_column.is_empty() {
            warnings.push("ground-truth column is empty; accuracy will never be reported".to_string());
        }
        if self.artifacts.expected_fingerprint.is_none() {
            warnings.push("no expected artifact fingerprint configured".to_string());
        }

        if !warnings.is_empty() {
            warn!("Configuration warnings: {:?}", warnings);
        }
        Ok(warnings)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| EligibilityError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to: {}", path.display());
        Ok(())
    }
}
