//! End-to-end scenarios for the price pipeline, loading real artifact files through the public
//! facade the service binary uses.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use dairy_price::config::{ArtifactConfig, ReportConfig};
use dairy_price::pricing::{
    AnimalIdentity, ArtifactError, Clock, InferencePipeline, PipelineError, PipelineStage,
    PredictionError, RawInput, ReportAssembler, ReportNumberSource, SchemaError,
};

struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    fn new(label: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let root = std::env::temp_dir().join(format!(
            "dairy-price-{label}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&root).expect("create artifact dir");
        Self { root }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write artifact");
        path
    }

    fn config(&self, scaler: &str, model: &str) -> ArtifactConfig {
        ArtifactConfig {
            scaler_path: self.root.join(scaler),
            model_path: self.root.join(model),
        }
    }
}

impl Drop for ArtifactDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

const CENTERED_SCALER: &str = "feature,mean,scale
Animal_Breed,0,1
Milk_Yield,20,1
Parity_No,1,1
Pregnancy_Status,1,1
Pregnancy_Trimester,2,1
";

/// Linear model whose intercept is the price of the scenario animal (all scaled features zero).
const LINEAR_MODEL: &str = r#"{
    "kind": "linear",
    "feature_names": ["Animal_Breed", "Milk_Yield", "Parity_No", "Pregnancy_Status", "Pregnancy_Trimester"],
    "coefficients": [-4000.0, 2500.0, -1200.0, 3000.0, 1500.0],
    "intercept": 50000.0
}"#;

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 15, 0)
            .single()
            .expect("valid instant")
    }
}

struct FixedSuffix;

impl ReportNumberSource for FixedSuffix {
    fn next_suffix(&self) -> u16 {
        1234
    }
}

fn load_pipeline(dir: &ArtifactDir) -> InferencePipeline {
    InferencePipeline::load(
        &dir.config("scaler.csv", "model.json"),
        &ReportConfig::default(),
    )
    .expect("artifacts load")
}

fn scenario() -> RawInput {
    RawInput::new("HF", 20, 1, true, Some(2))
}

#[test]
fn scenario_prices_holstein_through_file_artifacts() {
    let dir = ArtifactDir::new("scenario");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write("model.json", LINEAR_MODEL);

    let pipeline = load_pipeline(&dir);
    assert!(pipeline.is_ready());

    let record = pipeline.run(&scenario()).expect("scenario succeeds");
    assert_eq!(record.raw_score(), 50_000.0);
    assert_eq!(record.displayed_price(), 50_000);
    assert_eq!(record.breed_label(), "HF");
    assert_eq!(record.pregnancy_label(), "Yes");
    assert_eq!(record.milk_yield_liters(), 20);
    assert_eq!(record.currency(), "INR");
}

#[test]
fn jersey_label_round_trips_into_the_report() {
    let dir = ArtifactDir::new("jersey");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write("model.json", LINEAR_MODEL);

    let record = load_pipeline(&dir)
        .run(&RawInput::new("JY", 22, 1, false, Some(2)))
        .expect("jersey succeeds");

    assert_eq!(record.breed_code(), 1);
    assert_eq!(record.breed_label(), "JY");
    assert_eq!(record.pregnancy_code(), 0);
    assert_eq!(record.pregnancy_trimester(), 0);
    // 50000 - 4000 (JY) + 2 * 2500 (milk) - 3000 (not pregnant) - 2 * 1500 (trimester 0)
    assert_eq!(record.displayed_price(), 45_000);
}

#[test]
fn injected_metadata_appears_verbatim() {
    let dir = ArtifactDir::new("metadata");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write("model.json", LINEAR_MODEL);

    let loaded = load_pipeline(&dir);
    let assembler = ReportAssembler::from_config(&ReportConfig {
        org_code: "JKVDA".to_string(),
        region_code: "SGR".to_string(),
        ..ReportConfig::default()
    })
    .with_clock(Arc::new(FixedClock))
    .with_numbering(Arc::new(FixedSuffix));
    let pipeline = InferencePipeline::new(
        Arc::new(loaded.scaler().clone()),
        Arc::new(loaded.predictor().clone()),
        assembler,
    );

    let raw = scenario().with_identity(AnimalIdentity {
        farmer_name: Some("Ghulam Nabi".to_string()),
        parentage: Some("S/o Abdul Ahad".to_string()),
        address: Some("Pulwama".to_string()),
        tag_number: Some("PLW-0093".to_string()),
    });
    let record = pipeline.run(&raw).expect("scenario succeeds");

    assert_eq!(
        record.report_number().map(|number| number.as_str()),
        Some("JKVDA/SGR/1234")
    );
    assert_eq!(
        record.generated_at().to_rfc3339(),
        "2026-10-17T13:45:00+05:30"
    );
    assert_eq!(record.identity().parentage.as_deref(), Some("S/o Abdul Ahad"));
    assert_eq!(record.identity().tag_number.as_deref(), Some("PLW-0093"));
}

#[test]
fn repeated_runs_are_deterministic_across_threads() {
    let dir = ArtifactDir::new("concurrent");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write("model.json", LINEAR_MODEL);

    let pipeline = Arc::new(load_pipeline(&dir));
    let baseline = pipeline.run(&scenario()).expect("baseline");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || pipeline.run(&scenario()).expect("threaded run"))
        })
        .collect();

    for handle in handles {
        let record = handle.join().expect("thread completes");
        assert!(record.same_prediction_as(&baseline));
    }
}

#[test]
fn boundary_milk_yields() {
    let dir = ArtifactDir::new("bounds");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write("model.json", LINEAR_MODEL);
    let pipeline = load_pipeline(&dir);

    for accepted in [10, 30] {
        assert!(pipeline
            .run(&RawInput::new("HF", accepted, 1, true, Some(2)))
            .is_ok());
    }
    for rejected in [9, 31] {
        let err = pipeline
            .run(&RawInput::new("HF", rejected, 1, true, Some(2)))
            .expect_err("out of domain");
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(err.stage(), PipelineStage::Validate);
    }
}

#[test]
fn missing_model_keeps_pipeline_loaded_but_unavailable() {
    let dir = ArtifactDir::new("no-model");
    dir.write("scaler.csv", CENTERED_SCALER);

    let pipeline = load_pipeline(&dir);
    assert!(!pipeline.is_ready());
    assert!(matches!(
        pipeline.run(&scenario()),
        Err(PipelineError::Prediction(
            PredictionError::ModelUnavailable { .. }
        ))
    ));
}

#[test]
fn missing_scaler_is_fatal() {
    let dir = ArtifactDir::new("no-scaler");
    dir.write("model.json", LINEAR_MODEL);

    let result = InferencePipeline::load(
        &dir.config("scaler.csv", "model.json"),
        &ReportConfig::default(),
    );
    assert!(matches!(result, Err(ArtifactError::Io { .. })));
}

#[test]
fn reordered_scaler_columns_are_reported_as_schema_drift() {
    let dir = ArtifactDir::new("drift");
    dir.write(
        "scaler.json",
        r#"{
            "feature_names": ["Milk_Yield", "Animal_Breed", "Parity_No", "Pregnancy_Status", "Pregnancy_Trimester"],
            "mean": [20, 0, 1, 1, 2],
            "scale": [1, 1, 1, 1, 1]
        }"#,
    );
    dir.write("model.json", LINEAR_MODEL);

    let pipeline = InferencePipeline::load(
        &dir.config("scaler.json", "model.json"),
        &ReportConfig::default(),
    )
    .expect("artifacts load");

    assert!(matches!(
        pipeline.run(&scenario()),
        Err(PipelineError::IncompatibleSchema(
            SchemaError::FeatureOrder { position: 0, .. }
        ))
    ));
}

#[test]
fn model_fitted_on_reordered_columns_is_never_served() {
    let dir = ArtifactDir::new("model-drift");
    dir.write("scaler.csv", CENTERED_SCALER);
    dir.write(
        "model.json",
        r#"{
            "kind": "linear",
            "feature_names": ["Milk_Yield", "Animal_Breed", "Parity_No", "Pregnancy_Status", "Pregnancy_Trimester"],
            "coefficients": [2500.0, -4000.0, -1200.0, 3000.0, 1500.0],
            "intercept": 50000.0
        }"#,
    );

    let pipeline = load_pipeline(&dir);
    assert!(!pipeline.is_ready());
    assert!(pipeline
        .predictor()
        .unavailable_reason()
        .is_some_and(|reason| reason.contains("'Milk_Yield'")));
    assert!(matches!(
        pipeline.run(&scenario()),
        Err(PipelineError::Prediction(
            PredictionError::ModelUnavailable { .. }
        ))
    ));
}
