use std::sync::Arc;

use log::info;

use crate::config::ModelConfig;
use crate::error::{LoadError, StartupError};
use crate::model::artifact::{self, ArtifactSource, EnsureOutcome};
use crate::model::backends::onnx::TractClassifier;
use crate::model::imaging::InputSpec;
use crate::model::labels::ClassLabels;
use crate::model::traits::model_trait::Predictor;

/// Owns the fetch-then-load sequence for the one model this process serves.
pub struct ModelManager {
    source: Arc<dyn ArtifactSource>,
    config: ModelConfig,
}

impl ModelManager {
    pub fn new(source: Arc<dyn ArtifactSource>, config: ModelConfig) -> Self {
        Self { source, config }
    }

    /// Download the artifact if needed without loading it.
    pub async fn fetch(&self) -> Result<EnsureOutcome, StartupError> {
        let dest = self.config.dir.join(&self.config.file);
        Ok(artifact::ensure(self.source.as_ref(), &self.config.url, &dest).await?)
    }

    pub async fn prepare(&self) -> Result<Arc<dyn Predictor>, StartupError> {
        self.fetch().await?;
        self.load().await
    }

    pub async fn load(&self) -> Result<Arc<dyn Predictor>, StartupError> {
        let dir = self.config.dir.clone();
        let file = self.config.file.clone();
        let input = InputSpec::from(&self.config);
        let labels = ClassLabels::new(self.config.labels.iter().cloned());

        info!("Loading model {} from {}", file, dir.display());
        let classifier =
            tokio::task::spawn_blocking(move || TractClassifier::load(&dir, &file, input, labels))
                .await
                .map_err(|e| LoadError::Generic(e.to_string()))??;

        Ok(Arc::new(classifier))
    }
}
