use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::predictor::TrainedArtifact;

/// Envelope version accepted by this build; anything else is a schema mismatch.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

const ARTIFACT_FILE_NAME: &str = "project_success_model.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Artifact is not trained")]
    NotTrained,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Corrupt artifact payload: {0}")]
    CorruptPayload(String),
    #[error("Artifact schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: u32, actual: u32 },
}

// The on-disk format: a versioned envelope around the JSON-encoded artifact,
// with a SHA-256 checksum over the payload so corruption is detected before
// deserialization.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    schema_version: u32,
    checksum: String,
    payload: String,
}

/// Persists and restores trained artifacts at a fixed filesystem location.
///
/// The store never mutates an artifact in place: `save` writes a temp file
/// next to the destination and renames it over, so a concurrent reader only
/// ever observes the old artifact or the new one.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifact_path: PathBuf,
}

impl ArtifactStore {
    /// Creates a store at the default artifact location
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifact_path())
    }

    /// Returns the default artifact path
    pub fn get_default_artifact_path() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("PREVISOR_CACHE") {
            return PathBuf::from(path).join(ARTIFACT_FILE_NAME);
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("previsor").join(ARTIFACT_FILE_NAME);
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir
                .join(".cache")
                .join("previsor")
                .join(ARTIFACT_FILE_NAME);
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("previsor").join(ARTIFACT_FILE_NAME)
    }

    pub fn new<P: AsRef<Path>>(artifact_path: P) -> io::Result<Self> {
        let artifact_path = artifact_path.as_ref().to_path_buf();
        if let Some(parent) = artifact_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { artifact_path })
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn exists(&self) -> bool {
        self.artifact_path.exists()
    }

    /// Writes an artifact to the store's path, superseding any previous one.
    ///
    /// # Errors
    /// `NotTrained` if the artifact's trained flag is unset; IO and
    /// serialization failures otherwise.
    pub fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
        if !artifact.trained {
            return Err(ArtifactError::NotTrained);
        }

        let payload = serde_json::to_string(artifact)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        let envelope = ArtifactEnvelope {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            checksum: hash_payload(&payload),
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;

        let tmp_path = self.artifact_path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &self.artifact_path)?;

        log::info!(
            "Artifact saved to {:?} ({} bytes)",
            self.artifact_path,
            bytes.len()
        );
        Ok(())
    }

    /// Reads and verifies the artifact at the store's path.
    ///
    /// Every failure is structured — missing file, unreadable or tampered
    /// payload, unsupported envelope version — so callers can treat any of
    /// them as "model unavailable" instead of crashing.
    pub fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
        if !self.artifact_path.exists() {
            return Err(ArtifactError::NotFound(self.artifact_path.clone()));
        }

        let bytes = fs::read(&self.artifact_path)?;
        let envelope: ArtifactEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::CorruptPayload(e.to_string()))?;

        if envelope.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ArtifactError::SchemaMismatch {
                expected: ARTIFACT_SCHEMA_VERSION,
                actual: envelope.schema_version,
            });
        }

        let checksum = hash_payload(&envelope.payload);
        if checksum != envelope.checksum {
            log::error!(
                "Artifact checksum mismatch: expected {}, got {}",
                envelope.checksum,
                checksum
            );
            return Err(ArtifactError::CorruptPayload(
                "checksum mismatch".to_string(),
            ));
        }

        let artifact: TrainedArtifact = serde_json::from_str(&envelope.payload)
            .map_err(|e| ArtifactError::CorruptPayload(e.to_string()))?;
        if !artifact.trained {
            return Err(ArtifactError::NotTrained);
        }

        log::info!("Artifact loaded from {:?}", self.artifact_path);
        Ok(artifact)
    }
}

fn hash_payload(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}
