//! Schema registry: the frozen feature name lists every component honours.

use crate::errors::{EligibilityError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Frozen numeric, categorical and selected feature lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
    selected: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from in-memory lists
    pub fn new(numeric: Vec<String>, categorical: Vec<String>, selected: Vec<String>) -> Result<Self> {
        for (artifact, list) in [
            ("numerical_features", &numeric),
            ("categorical_features", &categorical),
            ("selected_features", &selected),
        ] {
            if list.is_empty() {
                return Err(EligibilityError::schema_load(artifact, "feature list is empty"));
            }
            if let Some(dup) = first_duplicate(list.iter()) {
                return Err(EligibilityError::schema_load(
                    artifact,
                    format!("duplicate feature name `{dup}`"),
                ));
            }
        }
        if let Some(dup) = first_duplicate(numeric.iter().chain(categorical.iter())) {
            return Err(EligibilityError::schema_load(
                "categorical_features",
                format!("`{dup}` is listed as both numeric and categorical"),
            ));
        }

        Ok(Self {
            numeric,
            categorical,
            selected,
        })
    }

    /// Load the three feature lists from JSON arrays of strings
    pub fn load(numeric_path: &Path, categorical_path: &Path, selected_path: &Path) -> Result<Self> {
        Self::new(
            read_name_list(numeric_path)?,
            read_name_list(categorical_path)?,
            read_name_list(selected_path)?,
        )
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical
    }

    pub fn selected_features(&self) -> &[String] {
        &self.selected
    }

    /// Every field a record must carry: numeric first, then categorical
    pub fn required_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a String>) -> Option<&'a String> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(name.as_str()))
}

fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let artifact = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|e| EligibilityError::schema_load(&artifact, e))?;
    serde_json::from_str::<Vec<String>>(&content)
        .map_err(|e| EligibilityError::schema_load(&artifact, e))
}
