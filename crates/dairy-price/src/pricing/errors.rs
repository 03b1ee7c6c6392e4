use std::path::PathBuf;

use serde::Serialize;

use super::domain::InputField;

/// A raw form value outside its declared domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unrecognized breed label '{0}' (expected HF or JY)")]
    UnknownBreed(String),
    #[error("unrecognized pregnancy status '{0}' (expected Yes or No)")]
    UnknownPregnancyStatus(String),
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: InputField,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("pregnancy_trimester is required when the animal is pregnant")]
    MissingTrimester,
    #[error("{0} is required")]
    Missing(InputField),
    #[error("{field} must be {expected}")]
    WrongType {
        field: InputField,
        expected: &'static str,
    },
}

impl InputError {
    pub fn field(&self) -> InputField {
        match self {
            Self::UnknownBreed(_) => InputField::Breed,
            Self::UnknownPregnancyStatus(_) => InputField::PregnancyStatus,
            Self::OutOfRange { field, .. } => *field,
            Self::MissingTrimester => InputField::PregnancyTrimester,
            Self::Missing(field) | Self::WrongType { field, .. } => *field,
        }
    }
}

/// A fitted artifact disagrees with the encoder's feature layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("artifact was fitted on {expected} features but the encoder produces {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("artifact feature #{position} is '{found}' but the encoder produces '{expected}'")]
    FeatureOrder {
        position: usize,
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("price model unavailable: {reason}")]
    ModelUnavailable { reason: String },
    #[error("price model expects {expected} features but received {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("price model returned a non-finite score ({score})")]
    NonFiniteScore { score: f64 },
}

/// Failure to read or validate a scaler/model artifact at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid artifact table: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid artifact document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("artifact columns do not match the encoder: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl ArtifactError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validate,
    Scale,
    Predict,
    Assemble,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Scale => "scale",
            Self::Predict => "predict",
            Self::Assemble => "assemble",
        }
    }
}

/// Error surfaced by [`super::InferencePipeline::run`]; carries the originating component's error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("incompatible scaler schema: {0}")]
    IncompatibleSchema(#[from] SchemaError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::InvalidInput(_) => PipelineStage::Validate,
            Self::IncompatibleSchema(_) => PipelineStage::Scale,
            Self::Prediction(_) => PipelineStage::Predict,
        }
    }

    pub fn field(&self) -> Option<InputField> {
        match self {
            Self::InvalidInput(err) => Some(err.field()),
            _ => None,
        }
    }

    /// User errors are recoverable by the caller; everything else is deployment drift or an
    /// unavailable model.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
