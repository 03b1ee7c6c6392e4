use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{PredictionResult, ScaledVector};
use super::errors::PredictionError;
use super::model::{load_model, PriceModel};

#[derive(Debug, Clone)]
enum ModelState {
    Ready(Arc<dyn PriceModel>),
    Unavailable { reason: String },
}

/// Wraps the fitted regression model. A model that failed to load leaves the service in an
/// unavailable state instead of aborting, so readiness can report it.
#[derive(Debug, Clone)]
pub struct PredictionService {
    state: ModelState,
}

impl PredictionService {
    pub fn new(model: Arc<dyn PriceModel>) -> Self {
        Self {
            state: ModelState::Ready(model),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match load_model(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    kind = model.kind(),
                    n_features = model.n_features(),
                    "price model loaded"
                );
                Self::new(model)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "price model failed to load");
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ModelState::Ready(_) => None,
            ModelState::Unavailable { reason } => Some(reason),
        }
    }

    /// Raw model score; no rounding is applied here.
    pub fn predict(&self, vector: &ScaledVector) -> Result<PredictionResult, PredictionError> {
        let model = match &self.state {
            ModelState::Ready(model) => model,
            ModelState::Unavailable { reason } => {
                return Err(PredictionError::ModelUnavailable {
                    reason: reason.clone(),
                })
            }
        };

        if vector.len() != model.n_features() {
            return Err(PredictionError::ShapeMismatch {
                expected: model.n_features(),
                actual: vector.len(),
            });
        }

        let raw_score = model.predict(vector.values());
        if !raw_score.is_finite() {
            return Err(PredictionError::NonFiniteScore { score: raw_score });
        }

        Ok(PredictionResult { raw_score })
    }
}
