mod encoder;
mod error;
mod forest;
mod metrics;
mod predictor;

pub mod dataset;

pub use dataset::{load_records, split_records, ProjectRecord, FEATURE_NAMES};
pub use encoder::EncodingMap;
pub use error::PredictorError;
pub use forest::{Forest, N_FEATURES};
pub use metrics::TrainingReport;
pub use predictor::{Prediction, Predictor, TrainConfig, TrainedArtifact};

/// Information about the current state and configuration of a predictor
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    /// Number of trees in the fitted ensemble
    pub n_trees: usize,
    /// Dimensionality of the feature vector
    pub n_features: usize,
    /// Resource-tier labels the encoding was fitted on, in code order
    pub resource_labels: Vec<String>,
}
