use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

/// Failures of a single `POST /predict` request.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("model not available")]
    ModelUnavailable,

    #[error("JSON data required")]
    JsonRequired,

    #[error("missing features: [{}]", quoted(.0))]
    MissingFeatures(Vec<String>),

    #[error("numeric values required")]
    NonNumeric,

    #[error("{0}")]
    Inference(String),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::ModelUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Errors raised by the model runtime while loading or running the artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}

impl From<ModelError> for PredictError {
    fn from(err: ModelError) -> Self {
        PredictError::Inference(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl From<ConfigError> for std::io::Error {
    fn from(err: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            PredictError::ModelUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(PredictError::JsonRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PredictError::NonNumeric.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PredictError::Inference("boom".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_features_message_lists_names() {
        let err = PredictError::MissingFeatures(vec!["sepal_width".into(), "petal_width".into()]);
        assert_eq!(
            err.to_string(),
            "missing features: ['sepal_width', 'petal_width']"
        );
    }
}
