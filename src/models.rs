use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PredictError;

/// Input fields in the order the model expects them.
pub const FEATURE_NAMES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Class names indexed by the model's class index.
pub const CLASS_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

pub const SERVICE_NAME: &str = "Iris Classification API";

/// One row of measurements, in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; 4]);

impl FeatureVector {
    /// Validates a decoded request body and coerces it into a feature row.
    ///
    /// Checks run in a fixed order: missing/empty data, absent fields, then
    /// numeric coercion. The first failing check is returned.
    pub fn from_json(data: &Value) -> Result<Self, PredictError> {
        let object = match data {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(PredictError::JsonRequired),
        };

        let missing: Vec<String> = FEATURE_NAMES
            .iter()
            .filter(|name| !object.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::MissingFeatures(missing));
        }

        let mut row = [0.0; 4];
        for (slot, name) in row.iter_mut().zip(FEATURE_NAMES) {
            *slot = coerce_number(&object[name]).ok_or(PredictError::NonNumeric)?;
        }
        Ok(FeatureVector(row))
    }

    pub fn as_f32(&self) -> [f32; 4] {
        self.0.map(|v| v as f32)
    }
}

// Numbers pass through, booleans count as 1/0 and strings must hold a float literal.
// NaN and infinities are refused; the model cannot score them.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: &'static str,
    pub class_index: usize,
    pub probabilities: Map<String, Value>,
    pub features: Value,
}

impl PredictionResponse {
    pub fn new(
        class_index: usize,
        probabilities: &[f64],
        features: Value,
    ) -> Result<Self, PredictError> {
        let prediction = CLASS_NAMES.get(class_index).copied().ok_or_else(|| {
            PredictError::Inference(format!("class index {} out of range", class_index))
        })?;
        if probabilities.len() != CLASS_NAMES.len() {
            return Err(PredictError::Inference(format!(
                "expected {} class probabilities, got {}",
                CLASS_NAMES.len(),
                probabilities.len()
            )));
        }

        let probabilities = CLASS_NAMES
            .iter()
            .zip(probabilities)
            .map(|(name, p)| (name.to_string(), Value::from(*p)))
            .collect();

        Ok(Self {
            prediction,
            class_index,
            probabilities,
            features,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub service: &'static str,
}

impl HealthResponse {
    pub fn new(model_loaded: bool) -> Self {
        Self {
            status: if model_loaded { "healthy" } else { "unhealthy" },
            model_loaded,
            service: SERVICE_NAME,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExampleRequest {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

/// Static description served on `GET /api`.
#[derive(Debug, Serialize)]
pub struct ApiDocs {
    pub message: &'static str,
    pub endpoints: Map<String, Value>,
    pub features: [&'static str; 4],
    pub classes: [&'static str; 3],
    pub example_request: ExampleRequest,
}

impl Default for ApiDocs {
    fn default() -> Self {
        let endpoints = [
            ("GET /", "Web interface"),
            ("POST /predict", "Prediction"),
            ("GET /health", "Service status"),
            ("GET /api", "API documentation"),
        ]
        .into_iter()
        .map(|(route, what)| (route.to_string(), Value::from(what)))
        .collect();

        Self {
            message: "Iris classification API",
            endpoints,
            features: FEATURE_NAMES,
            classes: CLASS_NAMES,
            example_request: ExampleRequest {
                sepal_length: 5.1,
                sepal_width: 3.5,
                petal_length: 1.4,
                petal_width: 0.2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_or_non_object_bodies_are_rejected_as_no_data() {
        for body in [json!(null), json!({}), json!([]), json!(0), json!(""), json!(false), json!([1, 2])] {
            assert!(matches!(
                FeatureVector::from_json(&body),
                Err(PredictError::JsonRequired)
            ));
        }
    }

    #[test]
    fn missing_fields_are_listed_in_canonical_order() {
        let body = json!({"petal_width": 0.2, "sepal_length": 5.1});
        match FeatureVector::from_json(&body) {
            Err(PredictError::MissingFeatures(missing)) => {
                assert_eq!(missing, vec!["sepal_width", "petal_length"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_check_wins_over_numeric_check() {
        let body = json!({"sepal_length": "abc"});
        assert!(matches!(
            FeatureVector::from_json(&body),
            Err(PredictError::MissingFeatures(_))
        ));
    }

    #[test]
    fn coerces_strings_and_booleans() {
        let body = json!({
            "sepal_length": " 5.1 ",
            "sepal_width": 3,
            "petal_length": true,
            "petal_width": "0.2",
        });
        let row = FeatureVector::from_json(&body).unwrap();
        assert_eq!(row.0, [5.1, 3.0, 1.0, 0.2]);
    }

    #[test]
    fn rejects_non_numeric_values() {
        for bad in [json!("abc"), json!(null), json!([1.0]), json!({"v": 1})] {
            let body = json!({
                "sepal_length": 5.1,
                "sepal_width": 3.5,
                "petal_length": bad,
                "petal_width": 0.2,
            });
            assert!(matches!(
                FeatureVector::from_json(&body),
                Err(PredictError::NonNumeric)
            ));
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        for bad in ["nan", "NaN", "inf", "-infinity", "1e400"] {
            let body = json!({
                "sepal_length": 5.1,
                "sepal_width": bad,
                "petal_length": 1.4,
                "petal_width": 0.2,
            });
            assert!(matches!(
                FeatureVector::from_json(&body),
                Err(PredictError::NonNumeric)
            ));
        }
    }

    #[test]
    fn response_rejects_out_of_range_index() {
        let err = PredictionResponse::new(3, &[0.2, 0.3, 0.5], json!({})).unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
    }

    #[test]
    fn health_status_tracks_model_presence() {
        assert_eq!(HealthResponse::new(true).status, "healthy");
        assert_eq!(HealthResponse::new(false).status, "unhealthy");
    }
}
