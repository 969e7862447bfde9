//! Error types for the eligibility pipeline

use thiserror::Error;

/// Errors that can occur while loading artifacts or running predictions
#[derive(Error, Debug)]
pub enum EligibilityError {
    /// A persisted artifact is missing, unreadable or empty
    #[error("failed to load artifact `{artifact}`: {reason}")]
    SchemaLoad { artifact: String, reason: String },

    /// Input records lack required fields
    #[error(
        "missing required field(s) {}: absent from {records_affected} record(s)",
        .fields.join(", ")
    )]
    MissingField {
        fields: Vec<String>,
        records_affected: usize,
    },

    /// A categorical value outside the fitted vocabulary
    #[error("unknown category {value:?} for field `{field}` (row {row})")]
    UnknownCategory {
        field: String,
        value: String,
        row: usize,
    },

    /// Selected features cannot be resolved against the assembled columns
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Scaler width does not match the input width
    #[error("scaler expects {expected} feature(s), got {actual}")]
    ScalerDimension { expected: usize, actual: usize },

    /// The classifier could not produce a prediction
    #[error("inference failed{}: {reason}", .row.map(|r| format!(" at row {r}")).unwrap_or_default())]
    Inference { row: Option<usize>, reason: String },

    /// A numeric field holds a value that is not a number
    #[error("field `{field}` expects a number, got {value:?} (row {row})")]
    InvalidNumeric {
        field: String,
        value: String,
        row: usize,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed tabular input or output
    #[error("table error: {0}")]
    Table(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EligibilityError {
    pub(crate) fn schema_load(artifact: impl Into<String>, reason: impl ToString) -> Self {
        Self::SchemaLoad {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(row: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Inference {
            row,
            reason: reason.into(),
        }
    }

    /// True when the error means the loaded deployment itself is unusable,
    /// as opposed to a problem with one request's data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaLoad { .. } | Self::SchemaMismatch(_) | Self::Config(_)
        )
    }
}

impl From<csv::Error> for EligibilityError {
    fn from(err: csv::Error) -> Self {
        Self::Table(err.to_string())
    }
}

/// Result type for eligibility operations
pub type Result<T> = std::result::Result<T, EligibilityError>;
