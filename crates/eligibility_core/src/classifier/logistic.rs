//! Binary logistic regression

use super::{check_input, label_from_positive, sigmoid, Classifier};
use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

/// Fitted coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self> {
        if artifact.coef.is_empty() {
            return Err(EligibilityError::schema_load("model", "logistic model has no coefficients"));
        }
        if !artifact.intercept.is_finite() || artifact.coef.iter().any(|c| !c.is_finite()) {
            return Err(EligibilityError::schema_load("model", "non-finite coefficient"));
        }
        Ok(Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
        })
    }

    fn decision(&self, row: &[f64]) -> f64 {
        self.coef.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + self.intercept
    }

    fn positive_probabilities(&self, rows: &Matrix) -> Result<Vec<f64>> {
        check_input(rows, self.coef.len())?;
        Ok(rows.iter_rows().map(|row| sigmoid(self.decision(row))).collect())
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn predict(&self, rows: &Matrix) -> Result<Vec<u8>> {
        Ok(self
            .positive_probabilities(rows)?
            .into_iter()
            .map(label_from_positive)
            .collect())
    }

    fn predict_proba(&self, rows: &Matrix) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .positive_probabilities(rows)?
            .into_iter()
            .map(|p1| [1.0 - p1, p1])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LogisticRegression {
        LogisticRegression::from_artifact(LogisticArtifact {
            coef: vec![2.0, -1.0],
            intercept: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn zero_decision_is_even_odds_and_class_zero() {
        let rows = Matrix::from_rows(vec![vec![0.0, 0.0]]).unwrap();
        assert_eq!(model().predict_proba(&rows).unwrap(), vec![[0.5, 0.5]]);
        assert_eq!(model().predict(&rows).unwrap(), vec![0]);
    }

    #[test]
    fn positive_decision_is_class_one() {
        let rows = Matrix::from_rows(vec![vec![3.0, 0.0], vec![-3.0, 0.0]]).unwrap();
        let proba = model().predict_proba(&rows).unwrap();
        assert!(proba[0][1] > 0.99);
        assert!(proba[1][0] > 0.99);
        assert_eq!(model().predict(&rows).unwrap(), vec![1, 0]);
        for [p0, p1] in proba {
            assert!((p0 + p1 - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn nan_input_is_inference_error() {
        let rows = Matrix::from_rows(vec![vec![f64::NAN, 0.0]]).unwrap();
        assert!(matches!(
            model().predict(&rows),
            Err(EligibilityError::Inference { row: Some(0), .. })
        ));
    }

    #[test]
    fn rejects_empty_or_non_finite_coefficients() {
        assert!(LogisticRegression::from_artifact(LogisticArtifact {
            coef: vec![],
            intercept: 0.0
        })
        .is_err());
        assert!(LogisticRegression::from_artifact(LogisticArtifact {
            coef: vec![f64::INFINITY],
            intercept: 0.0
        })
        .is_err());
    }
}
