use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::RawInput;
use super::encoder::FeatureEncoder;
use super::errors::{ArtifactError, PipelineError, PipelineStage};
use super::prediction::PredictionService;
use super::report::{ReportAssembler, ReportMeta, ReportRecord};
use super::scaler::ScalingAdapter;
use crate::config::{ArtifactConfig, ReportConfig};

/// Encoder → scaler → model → report, as one request/response step.
///
/// The scaler and model are shared, read-only artifacts; each run builds its own vectors and
/// record, so a single pipeline can serve concurrent callers without locking.
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    scaler: Arc<ScalingAdapter>,
    predictor: Arc<PredictionService>,
    assembler: ReportAssembler,
}

impl InferencePipeline {
    pub fn new(
        scaler: Arc<ScalingAdapter>,
        predictor: Arc<PredictionService>,
        assembler: ReportAssembler,
    ) -> Self {
        Self {
            scaler,
            predictor,
            assembler,
        }
    }

    /// Load both artifacts. A broken scaler is fatal; a broken model leaves the pipeline
    /// running but unavailable.
    pub fn load(artifacts: &ArtifactConfig, report: &ReportConfig) -> Result<Self, ArtifactError> {
        let scaler = ScalingAdapter::load(&artifacts.scaler_path)?;
        info!(
            path = %artifacts.scaler_path.display(),
            n_features = scaler.n_features(),
            "feature scaler loaded"
        );
        if let Err(err) = scaler.check_schema() {
            warn!(error = %err, "feature scaler does not match the encoder layout");
        }

        let predictor = PredictionService::load(&artifacts.model_path);

        Ok(Self::new(
            Arc::new(scaler),
            Arc::new(predictor),
            ReportAssembler::from_config(report),
        ))
    }

    pub fn is_ready(&self) -> bool {
        self.predictor.is_available()
    }

    pub fn predictor(&self) -> &PredictionService {
        &self.predictor
    }

    pub fn scaler(&self) -> &ScalingAdapter {
        &self.scaler
    }

    /// Timestamp and report number are issued only once a price exists, so rejected requests
    /// never draw a number.
    pub fn run(&self, raw: &RawInput) -> Result<ReportRecord, PipelineError> {
        let outcome = self.execute(raw, || self.assembler.issue_meta());
        Self::record_outcome(&outcome);
        outcome
    }

    pub fn run_with_meta(
        &self,
        raw: &RawInput,
        meta: ReportMeta,
    ) -> Result<ReportRecord, PipelineError> {
        let outcome = self.execute(raw, move || meta);
        Self::record_outcome(&outcome);
        outcome
    }

    fn record_outcome(outcome: &Result<ReportRecord, PipelineError>) {
        match outcome {
            Ok(record) => info!(
                breed = record.breed_label(),
                displayed_price = record.displayed_price(),
                report_number = record.report_number().map(|number| number.as_str()),
                "price prediction completed"
            ),
            Err(err) if err.is_user_error() => debug!(
                stage = err.stage().as_str(),
                field = err.field().map(|field| field.as_str()),
                error = %err,
                "price prediction rejected input"
            ),
            Err(err) => warn!(
                stage = err.stage().as_str(),
                error = %err,
                "price prediction failed"
            ),
        }
    }

    fn execute(
        &self,
        raw: &RawInput,
        meta: impl FnOnce() -> ReportMeta,
    ) -> Result<ReportRecord, PipelineError> {
        let features = FeatureEncoder::encode(raw)?;
        debug!(stage = PipelineStage::Validate.as_str(), features = ?features.values(), "encoded");

        let scaled = self.scaler.transform(&features)?;
        debug!(stage = PipelineStage::Scale.as_str(), scaled = ?scaled.values(), "scaled");

        let result = self.predictor.predict(&scaled)?;
        debug!(
            stage = PipelineStage::Predict.as_str(),
            raw_score = result.raw_score,
            "predicted"
        );

        let record = self.assembler.assemble(raw, &features, &result, meta());
        debug!(stage = PipelineStage::Assemble.as_str(), "assembled");
        Ok(record)
    }
}
