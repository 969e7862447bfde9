//! Inference pipeline orchestrator
//!
//! Per request: `Validating → Encoding → Assembling → Scaling → Classifying
//! → Done`, with `Failed` reachable from every stage. Validation covers the
//! whole batch before any transform runs, so a batch either produces one
//! result per record, in order, or a single failure.

use crate::artifacts::ArtifactFingerprint;
use crate::assembler::FeatureAssembler;
use crate::classifier::{classify, Classifier, PredictionResult};
use crate::encoder::CategoricalEncoder;
use crate::errors::{EligibilityError, Result};
use crate::matrix::Matrix;
use crate::record::{ApplicantRecord, FieldValue};
use crate::scaler::Scaler;
use crate::schema::FeatureSchema;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Immutable, process-wide inference state. Built once and shared by
/// reference (or `Arc`) across any number of concurrent requests.
#[derive(Debug)]
pub struct InferenceContext {
    schema: FeatureSchema,
    encoder: Box<dyn CategoricalEncoder>,
    assembler: FeatureAssembler,
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
    fingerprint: Option<ArtifactFingerprint>,
}

impl InferenceContext {
    /// Wire the fitted adapters together, resolving every name to an index
    /// and checking that the widths line up end to end.
    pub fn new(
        schema: FeatureSchema,
        encoder: Box<dyn CategoricalEncoder>,
        scaler: Box<dyn Scaler>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        if encoder.feature_names_in() != schema.categorical_features() {
            return Err(EligibilityError::SchemaMismatch(format!(
                "encoder was fitted on [{}] but the schema lists [{}]",
                encoder.feature_names_in().join(", "),
                schema.categorical_features().join(", ")
            )));
        }
        let assembler = FeatureAssembler::new(&schema, &encoder.feature_names_out())?;
        if scaler.n_features() != assembler.selected_width() {
            return Err(EligibilityError::ScalerDimension {
                expected: scaler.n_features(),
                actual: assembler.selected_width(),
            });
        }
        if classifier.n_features() != assembler.selected_width() {
            return Err(EligibilityError::SchemaMismatch(format!(
                "classifier expects {} feature(s) but {} are selected",
                classifier.n_features(),
                assembler.selected_width()
            )));
        }

        Ok(Self {
            schema,
            encoder,
            assembler,
            scaler,
            classifier,
            fingerprint: None,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: ArtifactFingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &dyn CategoricalEncoder {
        self.encoder.as_ref()
    }

    pub fn fingerprint(&self) -> Option<&ArtifactFingerprint> {
        self.fingerprint.as_ref()
    }

    /// Record with the manual-entry defaults: every numeric field 0, every
    /// categorical field its first fitted category.
    ///
    /// The fitted category order is the encoder's sorted vocabulary, so these
    /// defaults deliberately differ from the hand-ordered option lists of the
    /// old entry form (which opened on `PEDAGANG` for Pekerjaan and `Ya` for
    /// the yes/no fields). They are a starting point only.
    pub fn default_record(&self) -> ApplicantRecord {
        let mut record = ApplicantRecord::new();
        for name in self.schema.numeric_features() {
            record.insert(name.clone(), 0_i64);
        }
        for name in self.schema.categorical_features() {
            if let Some(first) = self.encoder.categories(name).and_then(|c| c.first()) {
                record.insert(name.clone(), first.clone());
            }
        }
        record
    }

    /// Run the pipeline over a batch
    pub fn predict(
        &self,
        records: &[ApplicantRecord],
    ) -> std::result::Result<Vec<PredictionResult>, PipelineFailure> {
        predict(self, records)
    }
}

/// Stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Validating,
    Encoding,
    Assembling,
    Scaling,
    Classifying,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "VALIDATING",
            PipelineStage::Encoding => "ENCODING",
            PipelineStage::Assembling => "ASSEMBLING",
            PipelineStage::Scaling => "SCALING",
            PipelineStage::Classifying => "CLASSIFYING",
            PipelineStage::Done => "DONE",
            PipelineStage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single structured failure a caller receives
#[derive(Debug)]
pub struct PipelineFailure {
    /// Stage that was running when the error occurred
    pub stage: PipelineStage,
    pub error: EligibilityError,
}

impl PipelineFailure {
    /// Human-readable message for the presentation layer
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prediction failed during {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Tracks the current stage so a failure can be attributed to it
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Validating,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    fn fail(&self, error: EligibilityError) -> PipelineFailure {
        debug!(stage = %self.stage, error = %error, "pipeline {}", PipelineStage::Failed);
        PipelineFailure {
            stage: self.stage,
            error,
        }
    }
}

/// Validated batch split into its numeric and categorical blocks
struct ValidatedBatch {
    numeric: Matrix,
    categorical: Vec<Vec<String>>,
}

/// Predict every record; same length and order as the input.
#[instrument(skip_all, fields(records = records.len()))]
pub fn predict(
    ctx: &InferenceContext,
    records: &[ApplicantRecord],
) -> std::result::Result<Vec<PredictionResult>, PipelineFailure> {
    let started = Instant::now();
    let mut tracker = StageTracker::new();

    if records.is_empty() {
        tracker.enter(PipelineStage::Done);
        return Ok(Vec::new());
    }

    let batch = validate(ctx.schema(), records).map_err(|e| tracker.fail(e))?;

    tracker.enter(PipelineStage::Encoding);
    let encoded = ctx
        .encoder
        .transform(&batch.categorical)
        .map_err(|e| tracker.fail(e))?;

    tracker.enter(PipelineStage::Assembling);
    let selected = ctx
        .assembler
        .assemble(&batch.numeric, &encoded)
        .map_err(|e| tracker.fail(e))?;

    tracker.enter(PipelineStage::Scaling);
    let scaled = ctx.scaler.transform(&selected).map_err(|e| tracker.fail(e))?;

    tracker.enter(PipelineStage::Classifying);
    let results = classify(ctx.classifier.as_ref(), &scaled).map_err(|e| tracker.fail(e))?;

    tracker.enter(PipelineStage::Done);
    info!(
        rows = results.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Batch prediction complete"
    );
    Ok(results)
}

/// Predict a single record
pub fn predict_one(
    ctx: &InferenceContext,
    record: &ApplicantRecord,
) -> std::result::Result<PredictionResult, PipelineFailure> {
    let mut results = predict(ctx, std::slice::from_ref(record))?;
    results.pop().ok_or_else(|| PipelineFailure {
        stage: PipelineStage::Classifying,
        error: EligibilityError::inference(None, "no result produced for the record"),
    })
}

/// All-or-nothing validation of the batch.
///
/// Missing fields are collected across every record and reported once, in
/// schema order. Numeric fields are coerced here so later stages only see
/// numbers.
fn validate(schema: &FeatureSchema, records: &[ApplicantRecord]) -> Result<ValidatedBatch> {
    let mut missing: Vec<&str> = Vec::new();
    let mut records_affected = 0;
    for record in records {
        let mut incomplete = false;
        for field in schema.required_fields() {
            if !record.contains(field) {
                incomplete = true;
                if !missing.contains(&field) {
                    missing.push(field);
                }
            }
        }
        records_affected += usize::from(incomplete);
    }
    if !missing.is_empty() {
        let order: Vec<&str> = schema.required_fields().collect();
        missing.sort_by_key(|field| order.iter().position(|f| f == field));
        return Err(EligibilityError::MissingField {
            fields: missing.into_iter().map(str::to_string).collect(),
            records_affected,
        });
    }

    let numeric_features = schema.numeric_features();
    let mut numeric = Matrix::zeros(records.len(), numeric_features.len());
    let mut categorical = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        let values = numeric.row_mut(row);
        for (slot, field) in values.iter_mut().zip(numeric_features) {
            let value = record.get(field).ok_or_else(|| missing_one(field))?;
            *slot = value.as_number().ok_or_else(|| EligibilityError::InvalidNumeric {
                field: field.clone(),
                value: value.to_string(),
                row,
            })?;
        }
        categorical.push(
            schema
                .categorical_features()
                .iter()
                .map(|field| record.get(field).map(FieldValue::as_category).ok_or_else(|| missing_one(field)))
                .collect::<Result<Vec<_>>>()?,
        );
    }

    Ok(ValidatedBatch {
        numeric,
        categorical,
    })
}

fn missing_one(field: &str) -> EligibilityError {
    EligibilityError::MissingField {
        fields: vec![field.to_string()],
        records_affected: 1,
    }
}
