use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::dataset::{split_records, ProjectRecord, FEATURE_NAMES};
use super::encoder::EncodingMap;
use super::error::PredictorError;
use super::forest::{Forest, N_FEATURES};
use super::metrics::{evaluate, TrainingReport};
use super::PredictorInfo;

/// Training hyperparameters: 100 trees, a 20% held-out partition, and a
/// fixed seed by default.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub n_trees: usize,
    pub split_ratio: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            split_ratio: 0.2,
            seed: 42,
        }
    }
}

/// Outcome of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub success: bool,
    pub probability_success: f64,
    pub probability_failure: f64,
}

/// The persisted bundle: fitted forest, encoding map, and the trained flag.
///
/// Immutable once produced — a retraining run builds an entirely new artifact
/// that supersedes the old one at the store boundary, never a patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub forest: Forest,
    pub encoding: EncodingMap,
    pub trained: bool,
}

/// A trained project success predictor: the fitted forest plus the
/// resource-tier encoding frozen at training time.
///
/// A `Predictor` only exists in a trained (or loaded) state, so "predict
/// before train" is unrepresentable here; the serving layer models the
/// not-ready case with its own state machine.
///
/// # Thread Safety
///
/// All fields are plain data, so the type is `Send + Sync` and can be shared
/// across request threads behind an `Arc` once built.
#[derive(Debug, Clone)]
pub struct Predictor {
    encoding: EncodingMap,
    forest: Forest,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

impl Predictor {
    /// Trains a predictor on historical project records.
    ///
    /// The encoding map is fitted over the full record set, then the records
    /// are partitioned with a seeded shuffle and the forest is grown on the
    /// training side. Metrics in the returned report are computed on the
    /// held-out side. The same records and config always reproduce the same
    /// model and the same reported metrics.
    ///
    /// # Errors
    /// `InsufficientData` if `records` is empty or every record carries the
    /// same outcome class.
    pub fn train(
        records: &[ProjectRecord],
        config: &TrainConfig,
    ) -> Result<(Self, TrainingReport), PredictorError> {
        if records.is_empty() {
            return Err(PredictorError::InsufficientData(
                "training set is empty".to_string(),
            ));
        }
        let successes = records.iter().filter(|r| r.success).count();
        if successes == 0 || successes == records.len() {
            return Err(PredictorError::InsufficientData(
                "training set contains a single outcome class".to_string(),
            ));
        }

        let encoding = EncodingMap::fit(records.iter().map(|r| r.resources.as_str()));
        let (train, test) = split_records(records, config.split_ratio, config.seed);
        info!(
            "Training on {} records, evaluating on {} ({} resource tiers)",
            train.len(),
            test.len(),
            encoding.len()
        );

        let x_train = feature_rows(&train, &encoding)?;
        let y_train: Vec<bool> = train.iter().map(|r| r.success).collect();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let forest = Forest::fit(&x_train, &y_train, config.n_trees, &mut rng);

        let x_test = feature_rows(&test, &encoding)?;
        let predicted: Vec<bool> = x_test
            .iter()
            .map(|row| forest.predict_proba(row)[1] > 0.5)
            .collect();
        let actual: Vec<bool> = test.iter().map(|r| r.success).collect();
        let (accuracy, precision, recall, f1) = evaluate(&predicted, &actual);

        let mut feature_importances: Vec<(String, f64)> = FEATURE_NAMES
            .iter()
            .zip(forest.feature_importances())
            .map(|(name, importance)| (name.to_string(), importance))
            .collect();
        feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

        let report = TrainingReport {
            accuracy,
            precision,
            recall,
            f1,
            feature_importances,
            train_size: train.len(),
            test_size: test.len(),
        };
        info!("Held-out accuracy: {:.4}", report.accuracy);

        Ok((Self { encoding, forest }, report))
    }

    /// Predicts success for a single project.
    ///
    /// The label is the class with probability strictly above 0.5 for
    /// success; an exact 0.5/0.5 tie resolves to failure.
    ///
    /// # Errors
    /// `UnknownCategory` if `resources` was not in the training vocabulary.
    pub fn predict(
        &self,
        duration_months: f64,
        budget: f64,
        team_size: u32,
        resources: &str,
    ) -> Result<Prediction, PredictorError> {
        let code = self.encoding.encode(resources)?;
        let features: [f64; N_FEATURES] =
            [duration_months, budget, f64::from(team_size), code as f64];

        let [probability_failure, probability_success] = self.forest.predict_proba(&features);
        Ok(Prediction {
            success: probability_success > 0.5,
            probability_success,
            probability_failure,
        })
    }

    /// Returns information about the predictor's current state
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            n_trees: self.forest.n_trees(),
            n_features: N_FEATURES,
            resource_labels: self.encoding.labels(),
        }
    }

    /// Packages the predictor for persistence.
    pub fn to_artifact(&self) -> TrainedArtifact {
        TrainedArtifact {
            forest: self.forest.clone(),
            encoding: self.encoding.clone(),
            trained: true,
        }
    }

    /// Restores a predictor from a loaded artifact.
    ///
    /// # Errors
    /// `NotTrained` if the artifact's trained flag is unset.
    pub fn from_artifact(artifact: TrainedArtifact) -> Result<Self, PredictorError> {
        if !artifact.trained {
            return Err(PredictorError::NotTrained);
        }
        Ok(Self {
            encoding: artifact.encoding,
            forest: artifact.forest,
        })
    }
}

fn feature_rows(
    records: &[&ProjectRecord],
    encoding: &EncodingMap,
) -> Result<Vec<[f64; N_FEATURES]>, PredictorError> {
    records
        .iter()
        .map(|r| {
            let code = encoding.encode(&r.resources)?;
            Ok([
                r.duration_months,
                r.budget,
                f64::from(r.team_size),
                code as f64,
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::forest::TreeNode;

    fn sample_records(n: u32) -> Vec<ProjectRecord> {
        (0..n)
            .map(|i| {
                let resources = ["Alto", "Médio", "Baixo"][(i % 3) as usize];
                ProjectRecord {
                    duration_months: 4.0 + f64::from(i % 12),
                    budget: 100_000.0 + 25_000.0 * f64::from(i),
                    team_size: 3 + (i % 10),
                    resources: resources.to_string(),
                    // successes concentrate on well-funded Alto projects
                    success: resources == "Alto" || i % 4 == 0,
                }
            })
            .collect()
    }

    #[test]
    fn test_train_rejects_empty_set() {
        let result = Predictor::train(&[], &TrainConfig::default());
        assert!(matches!(
            result,
            Err(PredictorError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_train_rejects_single_class() {
        let mut records = sample_records(30);
        for record in records.iter_mut() {
            record.success = true;
        }
        let result = Predictor::train(&records, &TrainConfig::default());
        assert!(matches!(
            result,
            Err(PredictorError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_predict_rejects_unseen_tier() {
        let records = sample_records(30);
        let (predictor, _) = Predictor::train(&records, &TrainConfig::default()).unwrap();
        let result = predictor.predict(8.0, 650_000.0, 12, "Urgente");
        assert_eq!(
            result.unwrap_err(),
            PredictorError::UnknownCategory("Urgente".to_string())
        );
    }

    #[test]
    fn test_training_is_reproducible() {
        let records = sample_records(40);
        let config = TrainConfig::default();

        let (predictor_a, report_a) = Predictor::train(&records, &config).unwrap();
        let (predictor_b, report_b) = Predictor::train(&records, &config).unwrap();

        assert_eq!(report_a.accuracy, report_b.accuracy);
        assert_eq!(report_a.precision, report_b.precision);
        assert_eq!(report_a.recall, report_b.recall);
        assert_eq!(report_a.f1, report_b.f1);

        let a = predictor_a.predict(8.0, 650_000.0, 12, "Alto").unwrap();
        let b = predictor_b.predict(8.0, 650_000.0, 12, "Alto").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predictor_info() {
        let records = sample_records(30);
        let (predictor, _) = Predictor::train(&records, &TrainConfig::default()).unwrap();
        let info = predictor.info();
        assert_eq!(info.n_trees, 100);
        assert_eq!(info.n_features, 4);
        assert_eq!(info.resource_labels, vec!["Alto", "Baixo", "Médio"]);
    }

    #[test]
    fn test_report_ranks_importances() {
        let records = sample_records(40);
        let (_, report) = Predictor::train(&records, &TrainConfig::default()).unwrap();
        assert_eq!(report.feature_importances.len(), 4);
        for window in report.feature_importances.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn test_exact_tie_resolves_to_failure() {
        // Two single-leaf trees voting in opposite directions average to 0.5/0.5.
        let forest_json = serde_json::json!({
            "trees": [
                [TreeNode { feature: -1, threshold: 0.0, left: -1, right: -1, value: Some([1.0, 0.0]) }],
                [TreeNode { feature: -1, threshold: 0.0, left: -1, right: -1, value: Some([0.0, 1.0]) }],
            ],
            "feature_importances": [0.0, 0.0, 0.0, 0.0],
        });
        let forest: Forest = serde_json::from_value(forest_json).unwrap();
        let predictor = Predictor {
            encoding: EncodingMap::fit(["Alto", "Baixo", "Médio"]),
            forest,
        };

        let prediction = predictor.predict(8.0, 650_000.0, 12, "Alto").unwrap();
        assert_eq!(prediction.probability_success, 0.5);
        assert_eq!(prediction.probability_failure, 0.5);
        assert!(!prediction.success);
    }

    #[test]
    fn test_artifact_roundtrip_preserves_predictions() {
        let records = sample_records(40);
        let (predictor, _) = Predictor::train(&records, &TrainConfig::default()).unwrap();

        let artifact = predictor.to_artifact();
        assert!(artifact.trained);
        let restored = Predictor::from_artifact(artifact).unwrap();

        let original = predictor.predict(10.0, 300_000.0, 7, "Médio").unwrap();
        let roundtripped = restored.predict(10.0, 300_000.0, 7, "Médio").unwrap();
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_untrained_artifact_is_rejected() {
        let records = sample_records(30);
        let (predictor, _) = Predictor::train(&records, &TrainConfig::default()).unwrap();

        let mut artifact = predictor.to_artifact();
        artifact.trained = false;
        assert_eq!(
            Predictor::from_artifact(artifact).unwrap_err(),
            PredictorError::NotTrained
        );
    }
}
