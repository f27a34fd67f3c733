use std::fmt;

use serde::Serialize;

/// Evaluation metrics and feature ranking produced by a training run.
///
/// Precision, recall, and F1 are support-weighted averages over the two
/// outcome classes, computed on the held-out partition.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `(feature name, normalized importance)`, ranked descending.
    pub feature_importances: Vec<(String, f64)>,
    pub train_size: usize,
    pub test_size: usize,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Métricas do Modelo ===")?;
        writeln!(f, "Acurácia: {:.4}", self.accuracy)?;
        writeln!(f, "Precisão: {:.4}", self.precision)?;
        writeln!(f, "Recall: {:.4}", self.recall)?;
        writeln!(f, "F1-Score: {:.4}", self.f1)?;
        writeln!(f)?;
        writeln!(f, "=== Importância das Features ===")?;
        for (name, importance) in &self.feature_importances {
            writeln!(f, "{}: {:.4}", name, importance)?;
        }
        Ok(())
    }
}

/// Computes `(accuracy, weighted precision, weighted recall, weighted f1)`.
pub(crate) fn evaluate(predicted: &[bool], actual: &[bool]) -> (f64, f64, f64, f64) {
    if actual.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let n = actual.len() as f64;
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count() as f64;
    let accuracy = correct / n;

    let mut precision_weighted = 0.0;
    let mut recall_weighted = 0.0;
    let mut f1_weighted = 0.0;

    for class in [false, true] {
        let support = actual.iter().filter(|&&a| a == class).count() as f64;
        if support == 0.0 {
            continue;
        }

        let predicted_count = predicted.iter().filter(|&&p| p == class).count() as f64;
        let true_positives = predicted
            .iter()
            .zip(actual)
            .filter(|(&p, &a)| p == class && a == class)
            .count() as f64;

        let precision = if predicted_count > 0.0 {
            true_positives / predicted_count
        } else {
            0.0
        };
        let recall = true_positives / support;
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let weight = support / n;
        precision_weighted += weight * precision;
        recall_weighted += weight * recall;
        f1_weighted += weight * f1;
    }

    (accuracy, precision_weighted, recall_weighted, f1_weighted)
}
