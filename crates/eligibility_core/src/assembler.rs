//! Feature assembler: numeric columns ++ encoded categorical columns, then
//! projection onto the selected features.
//!
//! Selected feature names are resolved to column indices once, when the
//! assembler is built. Requests only move numbers around.

use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use crate::schema::FeatureSchema;
use std::collections::HashMap;

/// Resolved concatenation layout and selected-feature projection
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    numeric_width: usize,
    encoded_width: usize,
    columns: Vec<String>,
    projection: Vec<usize>,
}

impl FeatureAssembler {
    /// Resolve every selected feature against `numeric ++ encoded_names`.
    ///
    /// Fails with `SchemaMismatch` listing every selected name that is not
    /// produced, which means the stored schema and encoder are out of sync.
    pub fn new(schema: &FeatureSchema, encoded_names: &[String]) -> Result<Self> {
        let columns: Vec<String> = schema
            .numeric_features()
            .iter()
            .chain(encoded_names)
            .cloned()
            .collect();

        let mut index = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if index.insert(name.as_str(), idx).is_some() {
                return Err(EligibilityError::SchemaMismatch(format!(
                    "column `{name}` is produced more than once"
                )));
            }
        }

        let mut projection = Vec::with_capacity(schema.selected_features().len());
        let mut unresolved = Vec::new();
        for name in schema.selected_features() {
            match index.get(name.as_str()) {
                Some(&idx) => projection.push(idx),
                None => unresolved.push(name.as_str()),
            }
        }
        if !unresolved.is_empty() {
            return Err(EligibilityError::SchemaMismatch(format!(
                "selected feature(s) not produced by numeric columns or encoder: {}",
                unresolved.join(", ")
            )));
        }

        Ok(Self {
            numeric_width: schema.numeric_features().len(),
            encoded_width: encoded_names.len(),
            columns,
            projection,
        })
    }

    /// Names of the concatenated columns, numeric first
    pub fn combined_columns(&self) -> &[String] {
        &self.columns
    }

    /// Width of the projected output
    pub fn selected_width(&self) -> usize {
        self.projection.len()
    }

    /// Horizontal concatenation into encoded rows
    pub fn concat(&self, numeric: &Matrix, encoded: &Matrix) -> Result<Matrix> {
        if numeric.cols() != self.numeric_width || encoded.cols() != self.encoded_width {
            return Err(EligibilityError::SchemaMismatch(format!(
                "expected {} numeric + {} encoded column(s), got {} + {}",
                self.numeric_width,
                self.encoded_width,
                numeric.cols(),
                encoded.cols()
            )));
        }
        numeric.hstack(encoded)
    }

    /// Project encoded rows onto the selected features, in selected order
    pub fn project(&self, combined: &Matrix) -> Result<Matrix> {
        if combined.cols() != self.columns.len() {
            return Err(EligibilityError::SchemaMismatch(format!(
                "expected {} combined column(s), got {}",
                self.columns.len(),
                combined.cols()
            )));
        }
        combined.select_columns(&self.projection)
    }

    /// `concat` followed by `project`
    pub fn assemble(&self, numeric: &Matrix, encoded: &Matrix) -> Result<Matrix> {
        self.project(&self.concat(numeric, encoded)?)
    }
}
