//! Dairy animal price inference: encoding, scaling, prediction and report assembly.

pub mod domain;
pub mod encoder;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod prediction;
pub mod report;
pub mod router;
pub mod scaler;

pub use domain::{
    AnimalIdentity, Breed, FeatureVector, InputField, PredictionResult, PregnancyAnswer,
    RawInput, ScaledVector, FEATURE_COUNT, FEATURE_NAMES,
};
pub use encoder::FeatureEncoder;
pub use errors::{
    ArtifactError, InputError, PipelineError, PipelineStage, PredictionError, SchemaError,
};
pub use model::{
    load_model, model_from_reader, ConstantModel, LinearModel, PriceModel, RegressionTree,
    TreeEnsembleModel, TreeNode,
};
pub use pipeline::InferencePipeline;
pub use prediction::PredictionService;
pub use report::{
    displayed_price, Clock, RandomReportNumbers, ReportAssembler, ReportMeta, ReportNumber,
    ReportNumberSource, ReportRecord, SystemClock,
};
pub use router::{pricing_router, PREDICT_PATH};
pub use scaler::ScalingAdapter;
