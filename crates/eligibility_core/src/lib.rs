//! PKH eligibility inference core
//!
//! Turns applicant records into the feature matrix a pre-trained binary
//! classifier expects and reports predicted eligibility with probabilities.
//! The classifier, scaler, encoder and feature lists are fitted elsewhere
//! and loaded read-only at startup.
//!
//! Modules:
//! - `schema`: frozen numeric / categorical / selected feature lists
//! - `encoder`: fitted one-hot encoder adapter
//! - `assembler`: concatenation and selected-feature projection
//! - `scaler`: fitted affine scaler adapter
//! - `classifier`: fitted classifier adapters and label polarity
//! - `pipeline`: the orchestrator and the immutable inference context
//! - `artifacts`: artifact loading and fingerprinting
//! - `report`: annotated batch table, accuracy, label distribution
//! - `table_io`: CSV batch input and output
//! - `config`: TOML and environment configuration

pub mod artifacts;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod matrix;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod scaler;
pub mod schema;
pub mod table_io;

pub use artifacts::{load_context, load_context_from_dir, ArtifactFingerprint};
pub use classifier::{Classifier, Eligibility, PredictionResult};
pub use config::EligibilityConfig;
pub use encoder::{CategoricalEncoder, OneHotEncoder};
pub use errors::{EligibilityError, Result};
pub use matrix::Matrix;
pub use pipeline::{predict, predict_one, InferenceContext, PipelineFailure, PipelineStage};
pub use record::{ApplicantRecord, FieldValue};
pub use report::{accuracy, annotate, label_distribution, AccuracyReport, LabelDistribution, RecordTable};
pub use scaler::{AffineScaler, Scaler};
pub use schema::FeatureSchema;

/// Crate version string for reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
