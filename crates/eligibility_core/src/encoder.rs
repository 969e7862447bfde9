//! Categorical encoder adapter
//!
//! Wraps a fitted one-hot transform. Column order is the learned category
//! order per feature, features concatenated in schema order. Values outside
//! the fitted vocabulary are rejected, never zero-filled.

use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Narrow contract the pipeline needs from any fitted categorical encoder
pub trait CategoricalEncoder: Send + Sync + fmt::Debug {
    /// Categorical features the encoder was fitted on, in column order
    fn feature_names_in(&self) -> &[String];

    /// Names of the produced columns, in output order
    fn feature_names_out(&self) -> Vec<String>;

    /// Fitted vocabulary of one feature
    fn categories(&self, feature: &str) -> Option<&[String]>;

    /// Encode rows whose values are given in `feature_names_in` order
    fn transform(&self, rows: &[Vec<String>]) -> Result<Matrix>;
}

/// A category as stored in the artifact: text or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CategoryValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            CategoryValue::Integer(v) => Some(*v as f64),
            CategoryValue::Float(v) => Some(*v),
            CategoryValue::Text(_) => None,
        }
    }

    fn into_text(self) -> String {
        match self {
            CategoryValue::Integer(v) => v.to_string(),
            CategoryValue::Float(v) => v.to_string(),
            CategoryValue::Text(s) => s,
        }
    }
}

/// Unknown-category setting recorded in the fitted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
    InfrequentIfExist,
}

/// Serialized form of a fitted one-hot encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotArtifact {
    pub feature_names_in: Vec<String>,
    pub categories: Vec<Vec<CategoryValue>>,
    /// Per feature, index of the category that produces no column
    #[serde(default)]
    pub drop_idx: Option<Vec<Option<usize>>>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

#[derive(Debug, Clone)]
struct EncodedFeature {
    categories: Vec<String>,
    lookup: HashMap<String, usize>,
    /// Fitted value of each numeric category, compared by value
    numeric: Vec<Option<f64>>,
    dropped: Option<usize>,
    /// First output column of this feature
    offset: usize,
}

impl EncodedFeature {
    fn width(&self) -> usize {
        self.categories.len() - usize::from(self.dropped.is_some())
    }

    /// Category index of a raw value: exact text first, then numeric
    /// equality so `"1.0"` finds a category fitted as `1`
    fn index_of(&self, value: &str) -> Option<usize> {
        if let Some(&idx) = self.lookup.get(value) {
            return Some(idx);
        }
        if self.numeric.iter().all(Option::is_none) {
            return None;
        }
        let parsed = value.trim().parse::<f64>().ok()?;
        self.numeric.iter().position(|n| *n == Some(parsed))
    }

    /// Output column for a category index, `None` for the dropped category
    fn column_of(&self, category_idx: usize) -> Option<usize> {
        match self.dropped {
            Some(d) if d == category_idx => None,
            Some(d) if category_idx > d => Some(self.offset + category_idx - 1),
            _ => Some(self.offset + category_idx),
        }
    }
}

/// Fitted one-hot encoder
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    names_in: Vec<String>,
    features: Vec<EncodedFeature>,
    width: usize,
}

impl OneHotEncoder {
    /// Build the encoder and its lookup tables from the artifact
    pub fn from_artifact(artifact: OneHotArtifact) -> Result<Self> {
        const NAME: &str = "ohe";
        if artifact.feature_names_in.is_empty() {
            return Err(EligibilityError::schema_load(NAME, "encoder has no input features"));
        }
        if artifact.feature_names_in.len() != artifact.categories.len() {
            return Err(EligibilityError::schema_load(
                NAME,
                format!(
                    "{} input feature(s) but {} category list(s)",
                    artifact.feature_names_in.len(),
                    artifact.categories.len()
                ),
            ));
        }
        let drops = match artifact.drop_idx {
            Some(drops) if drops.len() != artifact.categories.len() => {
                return Err(EligibilityError::schema_load(
                    NAME,
                    "drop_idx length does not match the number of features",
                ))
            }
            Some(drops) => drops,
            None => vec![None; artifact.categories.len()],
        };
        if artifact.handle_unknown != HandleUnknown::Error {
            warn!(
                setting = ?artifact.handle_unknown,
                "encoder was fitted with a permissive unknown-category setting; unknown values are still rejected"
            );
        }

        let mut features = Vec::with_capacity(artifact.categories.len());
        let mut offset = 0;
        for ((name, categories), dropped) in artifact
            .feature_names_in
            .iter()
            .zip(artifact.categories)
            .zip(drops)
        {
            let numeric: Vec<Option<f64>> = categories.iter().map(CategoryValue::as_number).collect();
            let categories: Vec<String> = categories.into_iter().map(CategoryValue::into_text).collect();
            if categories.is_empty() {
                return Err(EligibilityError::schema_load(
                    NAME,
                    format!("feature `{name}` has no categories"),
                ));
            }
            if matches!(dropped, Some(d) if d >= categories.len()) {
                return Err(EligibilityError::schema_load(
                    NAME,
                    format!("drop index out of range for feature `{name}`"),
                ));
            }
            let mut lookup = HashMap::with_capacity(categories.len());
            for (idx, category) in categories.iter().enumerate() {
                if lookup.insert(category.clone(), idx).is_some() {
                    return Err(EligibilityError::schema_load(
                        NAME,
                        format!("duplicate category {category:?} for feature `{name}`"),
                    ));
                }
            }
            let feature = EncodedFeature {
                categories,
                lookup,
                numeric,
                dropped,
                offset,
            };
            offset += feature.width();
            features.push(feature);
        }

        Ok(Self {
            names_in: artifact.feature_names_in,
            features,
            width: offset,
        })
    }

    /// Load a fitted encoder from its JSON artifact
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: OneHotArtifact =
            serde_json::from_str(json).map_err(|e| EligibilityError::schema_load("ohe", e))?;
        Self::from_artifact(artifact)
    }

    /// Total number of output columns
    pub fn width(&self) -> usize {
        self.width
    }
}

impl CategoricalEncoder for OneHotEncoder {
    fn feature_names_in(&self) -> &[String] {
        &self.names_in
    }

    fn feature_names_out(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width);
        for (name, feature) in self.names_in.iter().zip(&self.features) {
            for (idx, category) in feature.categories.iter().enumerate() {
                if feature.dropped != Some(idx) {
                    names.push(format!("{name}_{category}"));
                }
            }
        }
        names
    }

    fn categories(&self, feature: &str) -> Option<&[String]> {
        let idx = self.names_in.iter().position(|n| n == feature)?;
        Some(&self.features[idx].categories)
    }

    fn transform(&self, rows: &[Vec<String>]) -> Result<Matrix> {
        let mut out = Matrix::zeros(rows.len(), self.width);
        for (row_idx, values) in rows.iter().enumerate() {
            if values.len() != self.features.len() {
                return Err(EligibilityError::SchemaMismatch(format!(
                    "encoder expects {} categorical value(s), row {row_idx} has {}",
                    self.features.len(),
                    values.len()
                )));
            }
            let encoded = out.row_mut(row_idx);
            for ((feature, name), value) in self.features.iter().zip(&self.names_in).zip(values) {
                let category_idx = feature
                    .index_of(value)
                    .ok_or_else(|| EligibilityError::UnknownCategory {
                        field: name.clone(),
                        value: value.clone(),
                        row: row_idx,
                    })?;
                if let Some(col) = feature.column_of(category_idx) {
                    encoded[col] = 1.0;
                }
            }
        }
        Ok(out)
    }
}
