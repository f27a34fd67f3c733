use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::PredictorError;

/// Immutable mapping from resource-tier labels to integer codes.
///
/// The map is produced once at training time from the set of labels observed
/// in the historical data and never re-fitted during serving. Codes are
/// assigned in lexicographic (byte) order of the distinct labels, so the same
/// training set always yields the same artifact: for the canonical vocabulary
/// this gives `Alto = 0`, `Baixo = 1`, `Médio = 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingMap {
    codes: BTreeMap<String, i64>,
}

impl EncodingMap {
    /// Fits an encoding over the distinct labels of a training set.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        distinct.sort();
        distinct.dedup();

        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, label)| (label, code as i64))
            .collect();

        Self { codes }
    }

    /// Looks up the code for a label.
    ///
    /// # Errors
    /// `UnknownCategory` if the label was not in the fitted set. Unseen labels
    /// are rejected rather than defaulted so that a request against a stale or
    /// differently-trained artifact cannot silently produce a wrong feature.
    pub fn encode(&self, label: &str) -> Result<i64, PredictorError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| PredictorError::UnknownCategory(label.to_string()))
    }

    /// The fitted labels, in code order.
    pub fn labels(&self) -> Vec<String> {
        self.codes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
