use std::path::Path;
use std::sync::Arc;

use crate::classifier::{Classifier, OnnxClassifier};

/// Shared context handed to every request. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    model: Option<Arc<dyn Classifier>>,
}

impl AppState {
    pub fn new(model: Option<Arc<dyn Classifier>>) -> Self {
        Self { model }
    }

    /// Loads the artifact at `path`. A failed load leaves the service up without a model.
    pub fn load(path: &Path) -> Self {
        match OnnxClassifier::load(path) {
            Ok(classifier) => {
                tracing::info!(path = %path.display(), "model loaded");
                Self::new(Some(Arc::new(classifier)))
            }
            Err(e) => {
                tracing::error!(error = %e, "model not loaded, serving in degraded mode");
                Self::new(None)
            }
        }
    }

    pub fn model(&self) -> Option<&dyn Classifier> {
        self.model.as_deref()
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(&dir.path().join("absent.onnx"));
        assert!(!state.model_loaded());
        assert!(state.model().is_none());
    }
}
