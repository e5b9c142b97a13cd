use async_trait::async_trait;
use image::DynamicImage;

use crate::error::InferenceError;
use crate::model::labels::{ClassLabels, Prediction};

/// An image classifier loaded once at startup and shared read-only by every request.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, image: DynamicImage) -> Result<Prediction, InferenceError>;

    /// The closed vocabulary `predict` draws its labels from.
    fn labels(&self) -> &ClassLabels;
}
