//! Scaler adapter: the fitted per-column affine transform.

use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Narrow contract the pipeline needs from any fitted numeric scaler
pub trait Scaler: Send + Sync + fmt::Debug {
    /// Width the scaler was fitted on
    fn n_features(&self) -> usize;

    /// Scale a batch; the output has the same shape and column order
    fn transform(&self, rows: &Matrix) -> Result<Matrix>;
}

/// Serialized form of a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// `(x - center) / scale`
    Robust { center: Vec<f64>, scale: Vec<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AffineMode {
    /// `(x - offset) / factor`
    CenterDivide,
    /// `x * factor + offset`
    MultiplyShift,
}

/// Fitted affine scaler
#[derive(Debug, Clone)]
pub struct AffineScaler {
    mode: AffineMode,
    offset: Vec<f64>,
    factor: Vec<f64>,
}

impl AffineScaler {
    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self> {
        let (mode, offset, factor) = match artifact {
            ScalerArtifact::Standard { mean, scale } => (AffineMode::CenterDivide, mean, scale),
            ScalerArtifact::Robust { center, scale } => (AffineMode::CenterDivide, center, scale),
            ScalerArtifact::MinMax { min, scale } => (AffineMode::MultiplyShift, min, scale),
        };

        if offset.is_empty() {
            return Err(EligibilityError::schema_load("scaler", "scaler has no fitted columns"));
        }
        if offset.len() != factor.len() {
            return Err(EligibilityError::schema_load(
                "scaler",
                format!("{} center value(s) but {} scale value(s)", offset.len(), factor.len()),
            ));
        }
        if let Some(col) = offset.iter().chain(&factor).position(|v| !v.is_finite()) {
            return Err(EligibilityError::schema_load(
                "scaler",
                format!("non-finite fitted parameter at position {col}"),
            ));
        }
        if mode == AffineMode::CenterDivide {
            if let Some(col) = factor.iter().position(|&s| s == 0.0) {
                return Err(EligibilityError::schema_load(
                    "scaler",
                    format!("zero scale for column {col}"),
                ));
            }
        }

        Ok(Self { mode, offset, factor })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: ScalerArtifact =
            serde_json::from_str(json).map_err(|e| EligibilityError::schema_load("scaler", e))?;
        Self::from_artifact(artifact)
    }
}

impl Scaler for AffineScaler {
    fn n_features(&self) -> usize {
        self.offset.len()
    }

    fn transform(&self, rows: &Matrix) -> Result<Matrix> {
        if rows.cols() != self.n_features() {
            return Err(EligibilityError::ScalerDimension {
                expected: self.n_features(),
                actual: rows.cols(),
            });
        }
        let mut out = rows.clone();
        for i in 0..out.rows() {
            let row = out.row_mut(i);
            for ((x, &offset), &factor) in row.iter_mut().zip(&self.offset).zip(&self.factor) {
                *x = match self.mode {
                    AffineMode::CenterDivide => (*x - offset) / factor,
                    AffineMode::MultiplyShift => *x * factor + offset,
                };
            }
        }
        Ok(out)
    }
}
