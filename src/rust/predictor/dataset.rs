use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer};

use super::error::PredictorError;

/// Feature names in vector order, matching the historical CSV columns.
pub const FEATURE_NAMES: [&str; 4] = [
    "Duracao_meses",
    "Orcamento",
    "Tamanho_equipe",
    "Recursos_disponiveis",
];

/// One historical project outcome, as stored in the training CSV.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "Duracao_meses")]
    pub duration_months: f64,
    #[serde(rename = "Orcamento")]
    pub budget: f64,
    #[serde(rename = "Tamanho_equipe")]
    pub team_size: u32,
    #[serde(rename = "Recursos_disponiveis")]
    pub resources: String,
    #[serde(rename = "Sucesso", deserialize_with = "bool_from_int")]
    pub success: bool,
}

// The Sucesso column stores 0/1.
fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u8::deserialize(deserializer)?;
    Ok(value != 0)
}

/// Loads the historical project dataset from a CSV file.
///
/// # Errors
/// `DataError` if the file cannot be opened or a row does not match the
/// expected schema.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<ProjectRecord>, PredictorError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        PredictorError::DataError(format!("failed to open {}: {}", path.display(), e))
    })?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: ProjectRecord = row.map_err(|e| {
            PredictorError::DataError(format!("bad row in {}: {}", path.display(), e))
        })?;
        records.push(record);
    }

    info!("Loaded {} project records from {:?}", records.len(), path);
    Ok(records)
}

/// Splits records into train/test partitions with a seeded shuffle.
///
/// The same records and seed always produce the same partition, which is what
/// makes reported training metrics reproducible across runs.
pub fn split_records(
    records: &[ProjectRecord],
    split_ratio: f64,
    seed: u64,
) -> (Vec<&ProjectRecord>, Vec<&ProjectRecord>) {
    let mut shuffled: Vec<&ProjectRecord> = records.iter().collect();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let mut test_size = (records.len() as f64 * split_ratio) as usize;
    if test_size == 0 && records.len() > 1 {
        test_size = 1;
    }
    let test = shuffled.split_off(shuffled.len() - test_size);
    (shuffled, test)
}
