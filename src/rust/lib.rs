//! A thread-safe project success predictor built on bagged decision trees.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use previsor::{Predictor, ProjectRecord, TrainConfig};
//!
//! let mut records = Vec::new();
//! for i in 0u32..20 {
//!     records.push(ProjectRecord {
//!         duration_months: 4.0 + f64::from(i),
//!         budget: 100_000.0 * f64::from(i + 1),
//!         team_size: 5 + i,
//!         resources: if i % 2 == 0 { "Alto".into() } else { "Baixo".into() },
//!         success: i % 2 == 0,
//!     });
//! }
//!
//! let (predictor, report) = Predictor::train(&records, &TrainConfig::default())?;
//! println!("held-out accuracy: {:.4}", report.accuracy);
//!
//! let prediction = predictor.predict(8.0, 650_000.0, 12, "Alto")?;
//! println!(
//!     "success: {} ({:.1}%)",
//!     prediction.success,
//!     prediction.probability_success * 100.0
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! [`PredictionService`] is the boundary between untrusted request data and
//! the model: it validates raw JSON inputs, lazily loads the persisted
//! artifact exactly once under a lock, and shapes outcomes into the payloads
//! in [`api`]. The resident model is shared, read-only state (`Arc`) across
//! concurrent requests once ready.

pub mod api;
pub mod artifact_store;
pub mod predictor;
pub mod service;

pub use artifact_store::{ArtifactError, ArtifactStore, ARTIFACT_SCHEMA_VERSION};
pub use predictor::{
    EncodingMap, Prediction, Predictor, PredictorError, PredictorInfo, ProjectRecord, TrainConfig,
    TrainedArtifact, TrainingReport,
};
pub use service::{
    ConfidenceBand, PredictionOutcome, PredictionService, ServiceError, ValidatedFeatures,
    ValidationError,
};

pub fn init_logger() {
    env_logger::init();
}
