//! Loading the persisted artifacts into an [`InferenceContext`]
//!
//! Every artifact file is hashed with BLAKE3 while it is read. The bundle
//! fingerprint is the BLAKE3 hash over `name || file hash` for each artifact
//! in a fixed order, so any change to any file changes the fingerprint.

use crate::classifier::load_classifier;
use crate::config::ArtifactConfig;
use crate::encoder::OneHotEncoder;
use crate::errors::{EligibilityError, Result};
use crate::pipeline::InferenceContext;
use crate::scaler::AffineScaler;
use crate::schema::FeatureSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Hash of one artifact file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDigest {
    pub name: &'static str,
    pub path: PathBuf,
    pub blake3: String,
}

/// Hashes of every artifact plus the combined fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFingerprint {
    pub files: Vec<ArtifactDigest>,
    pub bundle: String,
}

impl ArtifactFingerprint {
    fn from_files(files: Vec<(ArtifactDigest, blake3::Hash)>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"pkh-artifacts-v1");
        for (digest, hash) in &files {
            hasher.update(digest.name.as_bytes());
            hasher.update(hash.as_bytes());
        }
        Self {
            bundle: hex::encode(hasher.finalize().as_bytes()),
            files: files.into_iter().map(|(digest, _)| digest).collect(),
        }
    }
}

struct ArtifactReader {
    files: Vec<(ArtifactDigest, blake3::Hash)>,
}

impl ArtifactReader {
    fn new() -> Self {
        Self { files: Vec::new() }
    }

    fn read(&mut self, name: &'static str, path: PathBuf) -> Result<String> {
        let bytes = std::fs::read(&path)
            .map_err(|e| EligibilityError::schema_load(path.display().to_string(), e))?;
        let hash = blake3::hash(&bytes);
        let text = String::from_utf8(bytes)
            .map_err(|e| EligibilityError::schema_load(path.display().to_string(), e))?;
        self.files.push((
            ArtifactDigest {
                name,
                path,
                blake3: hash.to_hex().to_string(),
            },
            hash,
        ));
        Ok(text)
    }
}

fn name_list(name: &str, json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json).map_err(|e| EligibilityError::schema_load(name, e))
}

/// Read, verify and assemble every artifact listed in `config`
#[instrument(skip(config), fields(dir = %config.dir.display()))]
pub fn load_context(config: &ArtifactConfig) -> Result<InferenceContext> {
    let mut reader = ArtifactReader::new();

    let numeric = reader.read("numerical_features", config.numeric_features_path())?;
    let categorical = reader.read("categorical_features", config.categorical_features_path())?;
    let selected = reader.read("selected_features", config.selected_features_path())?;
    let encoder = reader.read("ohe", config.encoder_path())?;
    let scaler = reader.read("scaler", config.scaler_path())?;
    let model = reader.read("model", config.model_path())?;

    let fingerprint = ArtifactFingerprint::from_files(reader.files);
    if let Some(expected) = &config.expected_fingerprint {
        if !expected.trim().eq_ignore_ascii_case(&fingerprint.bundle) {
            return Err(EligibilityError::schema_load(
                "bundle",
                format!(
                    "fingerprint {} does not match expected {}",
                    fingerprint.bundle,
                    expected.trim()
                ),
            ));
        }
    }

    let schema = FeatureSchema::new(
        name_list("numerical_features", &numeric)?,
        name_list("categorical_features", &categorical)?,
        name_list("selected_features", &selected)?,
    )?;
    let encoder = OneHotEncoder::from_json(&encoder)?;
    let scaler = AffineScaler::from_json(&scaler)?;
    let classifier = load_classifier(&model)?;

    let context = InferenceContext::new(schema, Box::new(encoder), Box::new(scaler), classifier)?
        .with_fingerprint(fingerprint);

    info!(
        numeric = context.schema().numeric_features().len(),
        categorical = context.schema().categorical_features().len(),
        selected = context.schema().selected_features().len(),
        fingerprint = context.fingerprint().map(|f| f.bundle.as_str()).unwrap_or_default(),
        "Loaded eligibility artifacts"
    );
    Ok(context)
}

/// Hash the artifacts without building a context
pub fn fingerprint(config: &ArtifactConfig) -> Result<ArtifactFingerprint> {
    let mut reader = ArtifactReader::new();
    for (name, path) in artifact_paths(config) {
        reader.read(name, path)?;
    }
    Ok(ArtifactFingerprint::from_files(reader.files))
}

fn artifact_paths(config: &ArtifactConfig) -> [(&'static str, PathBuf); 6] {
    [
        ("numerical_features", config.numeric_features_path()),
        ("categorical_features", config.categorical_features_path()),
        ("selected_features", config.selected_features_path()),
        ("ohe", config.encoder_path()),
        ("scaler", config.scaler_path()),
        ("model", config.model_path()),
    ]
}

/// Convenience for callers that only have a directory with default file names
pub fn load_context_from_dir(dir: &Path) -> Result<InferenceContext> {
    load_context(&ArtifactConfig {
        dir: dir.to_path_buf(),
        ..ArtifactConfig::default()
    })
}
