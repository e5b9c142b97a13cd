pub mod artifact;
pub mod backends;
pub mod imaging;
pub mod labels;
pub mod manager;
pub mod traits;

pub use labels::{ClassLabels, Prediction};
pub use traits::Predictor;
