use std::sync::Arc;

use log::info;

use crate::api::server::AppState;
use crate::config::Config;
use crate::error::StartupError;
use crate::message::QuoteBook;
use crate::model::artifact::{ArtifactSource, HttpSource};
use crate::model::manager::ModelManager;

/// Fetch and load the model, then build the shared request state.
/// Must complete before the listener is bound.
pub async fn initialize(config: &Config) -> Result<AppState, StartupError> {
    initialize_with(Arc::new(HttpSource::new()), config).await
}

pub async fn initialize_with(
    source: Arc<dyn ArtifactSource>,
    config: &Config,
) -> Result<AppState, StartupError> {
    let manager = ModelManager::new(source, config.model.clone());
    let predictor = manager.prepare().await?;
    info!(
        "Predictor ready with {} labels",
        predictor.labels().len()
    );

    let messages = Arc::new(QuoteBook::new(config.app.quotes.clone()));
    Ok(
        AppState::new(predictor, messages, config.app.view_dir.clone())
            .with_max_upload_bytes(config.server.max_upload_bytes),
    )
}
