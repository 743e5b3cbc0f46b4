use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Runtime settings, taken from `IRIS_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("IRIS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("IRIS_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "IRIS_PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let model_path = lookup("IRIS_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_model_path);

        Ok(Self {
            host,
            port,
            model_path,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

// The artifact ships next to the service sources.
fn default_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("model")
        .join("model.onnx")
}
