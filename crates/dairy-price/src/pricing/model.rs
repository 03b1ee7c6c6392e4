use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::domain::check_feature_order;
use super::errors::ArtifactError;

/// A fitted regression model: fixed input width, deterministic scalar output.
pub trait PriceModel: Send + Sync + fmt::Debug {
    fn kind(&self) -> &'static str;

    fn n_features(&self) -> usize;

    /// Column names recorded when the model was fitted, if the artifact carries them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Callers guarantee `features.len() == self.n_features()`.
    fn predict(&self, features: &[f64]) -> f64;
}

/// `intercept + Σ coefficient_i · x_i`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    feature_names: Option<Vec<String>>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        if coefficients.is_empty() {
            return Err(ArtifactError::invalid("linear model has no coefficients"));
        }
        if !intercept.is_finite() || coefficients.iter().any(|value| !value.is_finite()) {
            return Err(ArtifactError::invalid(
                "linear model contains non-finite parameters",
            ));
        }
        Ok(Self {
            feature_names: None,
            coefficients,
            intercept,
        })
    }

    /// Attach fitted column names; they must be the encoder's columns in the encoder's order.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, ArtifactError> {
        if names.len() != self.coefficients.len() {
            return Err(ArtifactError::invalid(format!(
                "linear model lists {} feature names for {} coefficients",
                names.len(),
                self.coefficients.len()
            )));
        }
        check_feature_order(&names)?;
        self.feature_names = Some(names);
        Ok(self)
    }
}

impl PriceModel for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (weight, value)| acc + weight * value)
    }
}

/// Ignores its input. Used for smoke deployments and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantModel {
    n_features: usize,
    value: f64,
}

impl ConstantModel {
    pub fn new(n_features: usize, value: f64) -> Self {
        Self { n_features, value }
    }
}

impl PriceModel for ConstantModel {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, _features: &[f64]) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Children must come after their parent (pre-order layout), which also rules out cycles.
    fn validate(&self, index: usize, n_features: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::invalid(format!("tree #{index} has no nodes")));
        }

        for (position, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(ArtifactError::invalid(format!(
                        "tree #{index} node #{position} has a non-finite leaf"
                    )));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ArtifactError::invalid(format!(
                            "tree #{index} node #{position} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ArtifactError::invalid(format!(
                            "tree #{index} node #{position} has a NaN threshold"
                        )));
                    }
                    for child in [left, right] {
                        if child <= position || child >= self.nodes.len() {
                            return Err(ArtifactError::invalid(format!(
                                "tree #{index} node #{position} points at invalid child {child}"
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let mut position = 0;
        loop {
            match self.nodes[position] {
                TreeNode::Leaf { leaf } => return leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    position = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Bagged regression trees: `base_score + mean(tree outputs)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsembleModel {
    feature_names: Option<Vec<String>>,
    n_features: usize,
    trees: Vec<RegressionTree>,
    base_score: f64,
}

impl TreeEnsembleModel {
    pub fn new(
        n_features: usize,
        trees: Vec<RegressionTree>,
        base_score: f64,
    ) -> Result<Self, ArtifactError> {
        if n_features == 0 {
            return Err(ArtifactError::invalid("tree ensemble declares no features"));
        }
        if trees.is_empty() {
            return Err(ArtifactError::invalid("tree ensemble has no trees"));
        }
        if !base_score.is_finite() {
            return Err(ArtifactError::invalid("tree ensemble base score is not finite"));
        }
        for (index, tree) in trees.iter().enumerate() {
            tree.validate(index, n_features)?;
        }

        Ok(Self {
            feature_names: None,
            n_features,
            trees,
            base_score,
        })
    }

    /// Attach fitted column names; they must be the encoder's columns in the encoder's order.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, ArtifactError> {
        if names.len() != self.n_features {
            return Err(ArtifactError::invalid(format!(
                "tree ensemble lists {} feature names for {} features",
                names.len(),
                self.n_features
            )));
        }
        check_feature_order(&names)?;
        self.feature_names = Some(names);
        Ok(self)
    }
}

impl PriceModel for TreeEnsembleModel {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        self.base_score + total / self.trees.len() as f64
    }
}

/// Serialized model document, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    Linear {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        n_features: usize,
        trees: Vec<RegressionTree>,
        #[serde(default)]
        base_score: f64,
    },
    Constant {
        n_features: usize,
        value: f64,
    },
}

impl ModelArtifact {
    fn into_model(self) -> Result<Arc<dyn PriceModel>, ArtifactError> {
        match self {
            Self::Linear {
                feature_names,
                coefficients,
                intercept,
            } => {
                let model = LinearModel::new(coefficients, intercept)?;
                match feature_names {
                    Some(names) => Ok(Arc::new(model.with_feature_names(names)?)),
                    None => Ok(Arc::new(model)),
                }
            }
            Self::TreeEnsemble {
                feature_names,
                n_features,
                trees,
                base_score,
            } => {
                let model = TreeEnsembleModel::new(n_features, trees, base_score)?;
                match feature_names {
                    Some(names) => Ok(Arc::new(model.with_feature_names(names)?)),
                    None => Ok(Arc::new(model)),
                }
            }
            Self::Constant { n_features, value } => {
                if !value.is_finite() {
                    return Err(ArtifactError::invalid("constant model value is not finite"));
                }
                Ok(Arc::new(ConstantModel::new(n_features, value)))
            }
        }
    }
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Arc<dyn PriceModel>, ArtifactError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    model_from_reader(file)
}

pub fn model_from_reader<R: Read>(reader: R) -> Result<Arc<dyn PriceModel>, ArtifactError> {
    let artifact: ModelArtifact = serde_json::from_reader(reader)?;
    artifact.into_model()
}
