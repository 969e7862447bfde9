//! Classifier adapter
//!
//! The fitted model is opaque to the pipeline: anything that implements
//! [`Classifier`] can sit behind it. Raw label 0 is ELIGIBLE and raw label 1
//! is INELIGIBLE; that polarity belongs to the trained artifact and is never
//! re-derived here.

pub mod boosted;
pub mod logistic;

use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use boosted::{BoostedTrees, BoostedTreesArtifact, TreeNode};
pub use logistic::{LogisticArtifact, LogisticRegression};

/// Narrow contract the pipeline needs from any fitted binary classifier
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Width the classifier was fitted on
    fn n_features(&self) -> usize;

    /// Raw class label (0 or 1) per row
    fn predict(&self, rows: &Matrix) -> Result<Vec<u8>>;

    /// `[P(class 0), P(class 1)]` per row
    fn predict_proba(&self, rows: &Matrix) -> Result<Vec<[f64; 2]>>;
}

/// Serialized form of the fitted classifier, tagged by model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LogisticArtifact),
    GradientBoosting(BoostedTreesArtifact),
}

impl ClassifierArtifact {
    /// Validate the artifact and turn it into a ready classifier
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        Ok(match self {
            ClassifierArtifact::LogisticRegression(a) => Box::new(LogisticRegression::from_artifact(a)?),
            ClassifierArtifact::GradientBoosting(a) => Box::new(BoostedTrees::from_artifact(a)?),
        })
    }
}

/// Load a classifier from its JSON artifact
pub fn load_classifier(json: &str) -> Result<Box<dyn Classifier>> {
    let artifact: ClassifierArtifact =
        serde_json::from_str(json).map_err(|e| EligibilityError::schema_load("model", e))?;
    artifact.into_classifier()
}

/// Predicted eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eligibility {
    Eligible,
    Ineligible,
}

impl Eligibility {
    /// Fixed polarity of the trained artifact
    pub fn from_raw_label(label: u8) -> Result<Self> {
        match label {
            0 => Ok(Eligibility::Eligible),
            1 => Ok(Eligibility::Ineligible),
            other => Err(EligibilityError::inference(
                None,
                format!("classifier produced unknown label {other}"),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "ELIGIBLE",
            Eligibility::Ineligible => "INELIGIBLE",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one applicant. Probabilities are kept at full precision;
/// the `*_percent` helpers are for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Eligibility,
    pub probability_eligible: f64,
    pub probability_ineligible: f64,
}

impl PredictionResult {
    pub fn eligible_percent(&self) -> f64 {
        percent_2dp(self.probability_eligible)
    }

    pub fn ineligible_percent(&self) -> f64 {
        percent_2dp(self.probability_ineligible)
    }
}

/// `p * 100` rounded to two decimals, ties to even
pub fn percent_2dp(p: f64) -> f64 {
    ((p * 100.0) * 100.0).round_ties_even() / 100.0
}

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Run both model calls over the batch and pair them into results.
///
/// Any failure aborts the whole batch; no partial results are returned.
pub fn classify(classifier: &dyn Classifier, rows: &Matrix) -> Result<Vec<PredictionResult>> {
    let labels = classifier.predict(rows)?;
    let probabilities = classifier.predict_proba(rows)?;
    if labels.len() != rows.rows() || probabilities.len() != rows.rows() {
        return Err(EligibilityError::inference(
            None,
            format!(
                "classifier returned {} label(s) and {} probability pair(s) for {} row(s)",
                labels.len(),
                probabilities.len(),
                rows.rows()
            ),
        ));
    }

    labels
        .into_iter()
        .zip(probabilities)
        .enumerate()
        .map(|(row, (label, [p_eligible, p_ineligible]))| {
            let in_range = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
            if !in_range(p_eligible)
                || !in_range(p_ineligible)
                || (p_eligible + p_ineligible - 1.0).abs() > PROBABILITY_TOLERANCE
            {
                return Err(EligibilityError::inference(
                    Some(row),
                    format!("invalid probability pair [{p_eligible}, {p_ineligible}]"),
                ));
            }
            let label = Eligibility::from_raw_label(label).map_err(|_| {
                EligibilityError::inference(Some(row), format!("classifier produced unknown label {label}"))
            })?;
            Ok(PredictionResult {
                label,
                probability_eligible: p_eligible,
                probability_ineligible: p_ineligible,
            })
        })
        .collect()
}

/// Width and finiteness checks shared by the concrete classifiers
pub(crate) fn check_input(rows: &Matrix, n_features: usize) -> Result<()> {
    if rows.cols() != n_features {
        return Err(EligibilityError::inference(
            None,
            format!("classifier expects {n_features} feature(s), got {}", rows.cols()),
        ));
    }
    if let Some(row) = rows.first_non_finite_row() {
        return Err(EligibilityError::inference(
            Some(row),
            "input contains NaN or infinite values",
        ));
    }
    Ok(())
}

/// Logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Label from `P(class 1)`; ties go to class 0 like an argmax over the pair
pub(crate) fn label_from_positive(p1: f64) -> u8 {
    u8::from(p1 > 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns canned outputs regardless of input
    #[derive(Debug)]
    struct Canned {
        labels: Vec<u8>,
        probabilities: Vec<[f64; 2]>,
    }

    impl Classifier for Canned {
        fn n_features(&self) -> usize {
            1
        }

        fn predict(&self, _rows: &Matrix) -> Result<Vec<u8>> {
            Ok(self.labels.clone())
        }

        fn predict_proba(&self, _rows: &Matrix) -> Result<Vec<[f64; 2]>> {
            Ok(self.probabilities.clone())
        }
    }

    #[test]
    fn label_polarity_is_fixed() {
        assert_eq!(Eligibility::from_raw_label(0).unwrap(), Eligibility::Eligible);
        assert_eq!(Eligibility::from_raw_label(1).unwrap(), Eligibility::Ineligible);
        assert!(Eligibility::from_raw_label(2).is_err());
    }

    #[test]
    fn classify_pairs_labels_with_probabilities() {
        let model = Canned {
            labels: vec![1, 0],
            probabilities: vec![[0.2, 0.8], [0.9, 0.1]],
        };
        let results = classify(&model, &Matrix::zeros(2, 1)).unwrap();
        assert_eq!(results[0].label, Eligibility::Ineligible);
        assert_eq!(results[0].probability_ineligible, 0.8);
        assert_eq!(results[1].label, Eligibility::Eligible);
        assert_eq!(results[1].eligible_percent(), 90.0);
    }

    #[test]
    fn classify_rejects_misaligned_outputs() {
        let model = Canned {
            labels: vec![0],
            probabilities: vec![[0.5, 0.5], [0.5, 0.5]],
        };
        assert!(classify(&model, &Matrix::zeros(2, 1)).is_err());
    }

    #[test]
    fn classify_rejects_unnormalized_probabilities() {
        let model = Canned {
            labels: vec![0],
            probabilities: vec![[0.7, 0.7]],
        };
        let err = classify(&model, &Matrix::zeros(1, 1)).unwrap_err();
        assert!(matches!(err, EligibilityError::Inference { row: Some(0), .. }));
    }

    #[test]
    fn classify_rejects_unknown_labels_with_row() {
        let model = Canned {
            labels: vec![0, 7],
            probabilities: vec![[0.5, 0.5], [0.5, 0.5]],
        };
        let err = classify(&model, &Matrix::zeros(2, 1)).unwrap_err();
        assert!(matches!(err, EligibilityError::Inference { row: Some(1), .. }));
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        assert_eq!(percent_2dp(0.123456), 12.35);
        assert_eq!(percent_2dp(0.876544), 87.65);
        assert_eq!(percent_2dp(1.0), 100.0);
        assert_eq!(percent_2dp(0.0), 0.0);
    }

    #[test]
    fn check_input_flags_first_bad_row() {
        let m = Matrix::from_rows(vec![vec![0.0], vec![f64::NAN]]).unwrap();
        let err = check_input(&m, 1).unwrap_err();
        assert!(matches!(err, EligibilityError::Inference { row: Some(1), .. }));
        assert!(check_input(&Matrix::zeros(1, 2), 1).is_err());
    }

    #[test]
    fn ties_go_to_class_zero() {
        assert_eq!(label_from_positive(0.5), 0);
        assert_eq!(label_from_positive(0.5000001), 1);
        assert_eq!(label_from_positive(0.1), 0);
    }
}
