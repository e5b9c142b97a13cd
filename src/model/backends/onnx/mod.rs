pub mod tract_classifier;

pub use tract_classifier::{RuntimeProfile, TractClassifier};
