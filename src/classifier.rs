use std::path::Path;

use ndarray::Array2;
use tract_onnx::prelude::*;

use crate::error::ModelError;
use crate::models::{FeatureVector, CLASS_NAMES, FEATURE_NAMES};

/// Contract every loaded model honors.
///
/// Implementations are read-only after construction and shared by all
/// request handlers.
pub trait Classifier: Send + Sync {
    /// Index of the predicted class, matching `CLASS_NAMES`.
    fn classify(&self, features: &FeatureVector) -> Result<usize, ModelError>;

    /// Probability of each class, in `CLASS_NAMES` order.
    fn class_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;
}

/// Classifier backed by an ONNX graph executed with tract.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let load_err = |e: TractError| ModelError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact([1, FEATURE_NAMES.len()]).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        Ok(Self { plan })
    }

    fn run(&self, features: &FeatureVector) -> Result<Output, ModelError> {
        let values = features.as_f32();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Runtime("feature value out of float32 range".into()));
        }
        let row = Array2::from_shape_vec((1, FEATURE_NAMES.len()), values.to_vec())
            .map_err(|e| ModelError::Runtime(e.to_string()))?;
        let tensor: Tensor = row.into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ModelError::Runtime(e.to_string()))?;

        Output::from_tensors(&outputs)
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        Ok(self.run(features)?.label)
    }

    fn class_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        Ok(self.run(features)?.probabilities)
    }
}

#[derive(Debug, PartialEq)]
struct Output {
    label: usize,
    probabilities: Vec<f64>,
}

impl Output {
    // Classical exports emit (label, probabilities); network exports emit a single score row.
    fn from_tensors(outputs: &[TValue]) -> Result<Self, ModelError> {
        match outputs {
            [label, probabilities, ..] => {
                let label = label
                    .cast_to::<i64>()
                    .map_err(|e| ModelError::Output(e.to_string()))?;
                let label = *label
                    .as_slice::<i64>()
                    .map_err(|e| ModelError::Output(e.to_string()))?
                    .first()
                    .ok_or_else(|| ModelError::Output("empty label tensor".into()))?;
                let label = usize::try_from(label)
                    .map_err(|_| ModelError::Output(format!("negative class label {}", label)))?;
                Ok(Self {
                    label,
                    probabilities: first_row(probabilities)?,
                })
            }
            [scores] => Ok(Self::from_scores(first_row(scores)?)),
            [] => Err(ModelError::Output("model produced no outputs".into())),
        }
    }

    fn from_scores(scores: Vec<f64>) -> Self {
        let probabilities = if is_distribution(&scores) {
            scores
        } else {
            softmax(&scores)
        };
        Self {
            label: argmax(&probabilities),
            probabilities,
        }
    }
}

fn first_row(tensor: &TValue) -> Result<Vec<f64>, ModelError> {
    let values = tensor
        .cast_to::<f32>()
        .map_err(|e| ModelError::Output(e.to_string()))?;
    let values = values
        .as_slice::<f32>()
        .map_err(|e| ModelError::Output(e.to_string()))?;
    if values.len() != CLASS_NAMES.len() {
        return Err(ModelError::Output(format!(
            "expected {} class scores, got {}",
            CLASS_NAMES.len(),
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Output("non-finite class score".into()));
    }
    Ok(values.iter().map(|&v| v as f64).collect())
}

fn is_distribution(values: &[f64]) -> bool {
    values.iter().all(|&v| (0.0..=1.0).contains(&v))
        && (values.iter().sum::<f64>() - 1.0).abs() < 1e-3
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
