use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use super::domain::RawInput;
use super::errors::{PipelineError, PipelineStage, PredictionError};
use super::pipeline::InferencePipeline;

pub const PREDICT_PATH: &str = "/api/v1/price/predict";

/// Router builder exposing the prediction endpoint.
pub fn pricing_router(pipeline: Arc<InferencePipeline>) -> Router {
    Router::new()
        .route(PREDICT_PATH, post(predict_handler))
        .with_state(pipeline)
}

pub(crate) async fn predict_handler(
    State(pipeline): State<Arc<InferencePipeline>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let form = match body {
        Ok(Json(Value::Object(form))) => form,
        Ok(Json(_)) => {
            return unreadable_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                "request body must be a JSON object".to_string(),
            )
        }
        Err(rejection) => return unreadable_body(rejection.status(), rejection.body_text()),
    };

    let raw = match RawInput::from_json(&form) {
        Ok(raw) => raw,
        Err(err) => {
            let err = PipelineError::from(err);
            debug!(
                field = err.field().map(|field| field.as_str()),
                error = %err,
                "price request rejected"
            );
            return err.into_response();
        }
    };

    match pipeline.run(&raw) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Body that never reached field decoding: not JSON, wrong content type, or not an object.
fn unreadable_body(status: StatusCode, error: String) -> Response {
    let payload = json!({
        "error": error,
        "stage": PipelineStage::Validate,
        "field": Value::Null,
    });
    (status, Json(payload)).into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Prediction(PredictionError::ModelUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PipelineError::IncompatibleSchema(_) | PipelineError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({
            "error": self.to_string(),
            "stage": self.stage(),
            "field": self.field(),
        });
        (status, Json(payload)).into_response()
    }
}
