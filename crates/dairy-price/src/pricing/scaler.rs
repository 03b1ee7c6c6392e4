use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{check_feature_order, FeatureVector, ScaledVector, FEATURE_COUNT};
use super::errors::{ArtifactError, SchemaError};

/// Pre-fitted per-feature standardization: `(value - mean) / scale`.
///
/// Loaded once at startup and shared read-only; nothing here re-fits or mutates the constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingAdapter {
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ScalerRow {
    feature: String,
    mean: f64,
    scale: f64,
}

#[derive(Debug, Deserialize)]
struct ScalerDocument {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl ScalingAdapter {
    /// Load from `*.json` or a `feature,mean,scale` CSV table (any other extension).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_reader(file)
        } else {
            Self::from_csv_reader(file)
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut names = Vec::new();
        let mut mean = Vec::new();
        let mut scale = Vec::new();
        for row in csv_reader.deserialize::<ScalerRow>() {
            let row = row?;
            names.push(row.feature);
            mean.push(row.mean);
            scale.push(row.scale);
        }

        Self::from_parts(mean, scale)?.with_feature_names(names)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let document: ScalerDocument = serde_json::from_reader(reader)?;
        let adapter = Self::from_parts(document.mean, document.scale)?;
        match document.feature_names {
            Some(names) => adapter.with_feature_names(names),
            None => Ok(adapter),
        }
    }

    /// Build from raw constants. The feature count is not checked against the encoder here;
    /// [`ScalingAdapter::transform`] reports that as a schema error.
    pub fn from_parts(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        if mean.is_empty() {
            return Err(ArtifactError::invalid("scaler has no features"));
        }
        if mean.len() != scale.len() {
            return Err(ArtifactError::invalid(format!(
                "scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        if let Some(position) = mean.iter().position(|value| !value.is_finite()) {
            return Err(ArtifactError::invalid(format!(
                "scaler mean #{position} is not finite"
            )));
        }
        if let Some(position) = scale
            .iter()
            .position(|value| !value.is_finite() || *value == 0.0)
        {
            return Err(ArtifactError::invalid(format!(
                "scaler scale #{position} must be finite and non-zero"
            )));
        }

        Ok(Self {
            feature_names: None,
            mean,
            scale,
        })
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, ArtifactError> {
        if names.len() != self.mean.len() {
            return Err(ArtifactError::invalid(format!(
                "scaler lists {} feature names for {} columns",
                names.len(),
                self.mean.len()
            )));
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Check that the artifact was fitted on the encoder's columns, in the same order.
    pub fn check_schema(&self) -> Result<(), SchemaError> {
        if self.mean.len() != FEATURE_COUNT {
            return Err(SchemaError::FeatureCount {
                expected: self.mean.len(),
                actual: FEATURE_COUNT,
            });
        }

        match &self.feature_names {
            Some(names) => check_feature_order(names),
            None => Ok(()),
        }
    }

    pub fn transform(&self, vector: &FeatureVector) -> Result<ScaledVector, SchemaError> {
        self.check_schema()?;

        let scaled = vector
            .values()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect();

        Ok(ScaledVector::new(scaled))
    }
}
