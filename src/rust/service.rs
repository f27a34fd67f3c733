use std::fmt;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde_json::Value;

use crate::artifact_store::ArtifactStore;
use crate::predictor::{Predictor, PredictorError};

/// Request fields required for a prediction, in reporting order.
pub const REQUIRED_FIELDS: [&str; 4] = ["duracao", "orcamento", "tamanho_equipe", "recursos"];

/// The canonical resource-tier vocabulary.
pub const RESOURCE_LABELS: [&str; 3] = ["Alto", "Médio", "Baixo"];

/// Rejection of a malformed request. Never retried by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Every absent required field, reported in one response
    MissingFields(Vec<String>),
    /// A present field with a bad type, range, or vocabulary
    InvalidValue(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "Campos obrigatórios faltando: {}", fields.join(", "))
            }
            Self::InvalidValue(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Represents the different types of errors that can occur while serving.
#[derive(Debug)]
pub enum ServiceError {
    /// The request failed validation
    Validation(ValidationError),
    /// No trained model could be made resident; safe to retry later
    ModelUnavailable(String),
    /// The resource tier was valid vocabulary but absent from the artifact
    UnknownResource(String),
    /// Any unexpected failure, reported with a generic message
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{}", err),
            Self::ModelUnavailable(msg) => write!(f, "Modelo não disponível: {}", msg),
            Self::UnknownResource(label) => write!(f, "Recurso desconhecido: {}", label),
            Self::Internal(msg) => write!(f, "Erro interno: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// A single request's feature set after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeatures {
    pub duration_months: f64,
    pub budget: f64,
    pub team_size: u32,
    pub resources: String,
}

/// Qualitative confidence derived from the winning class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// `High` above 0.7, `Medium` above 0.5, `Low` otherwise.
    pub fn from_probability(p: f64) -> Self {
        if p > 0.7 {
            Self::High
        } else if p > 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// The band's label in the domain vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Média",
            Self::Low => "Baixa",
        }
    }
}

/// A shaped prediction ready for the response payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionOutcome {
    pub success: bool,
    pub probability_success: f64,
    pub probability_failure: f64,
    pub confidence: ConfidenceBand,
}

// Model handle lifecycle: Unloaded → Ready on a successful load, Unloaded →
// Unavailable on a failed one. Unavailable is not terminal; the next call
// attempts the load again.
#[derive(Debug)]
enum ModelState {
    Unloaded,
    Ready(Arc<Predictor>),
    Unavailable,
}

/// Boundary between untrusted request data and the model.
///
/// The service owns the artifact store and a lazily-initialized model handle.
/// The handle transitions to `Ready` under a mutex, so concurrent first
/// requests neither deserialize the artifact twice nor observe a partially
/// initialized model; once `Ready`, requests share the predictor read-only
/// through an `Arc` and never block each other.
pub struct PredictionService {
    store: ArtifactStore,
    state: Mutex<ModelState>,
}

impl PredictionService {
    /// Creates a service whose model will be loaded on first use.
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    /// Creates a service that is already `Ready` — used right after training,
    /// when the predictor is still in memory.
    pub fn with_predictor(store: ArtifactStore, predictor: Predictor) -> Self {
        Self {
            store,
            state: Mutex::new(ModelState::Ready(Arc::new(predictor))),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Whether a model is resident and ready to serve.
    pub fn model_loaded(&self) -> bool {
        self.state
            .lock()
            .map(|state| matches!(&*state, ModelState::Ready(_)))
            .unwrap_or(false)
    }

    /// Validates a raw request object into a feature set.
    ///
    /// Missing fields are all collected before reporting, so the caller sees
    /// the complete list in one response. Value checks follow the canonical
    /// contract: positive numeric duration and budget, positive integer team
    /// size, and a resource tier from the exact (case-sensitive) vocabulary.
    pub fn validate(input: &Value) -> Result<ValidatedFeatures, ValidationError> {
        let object = input.as_object().ok_or_else(|| {
            ValidationError::InvalidValue("Formato inválido: esperado um objeto JSON".to_string())
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let duration_months = object
            .get("duracao")
            .and_then(Value::as_f64)
            .filter(|v| *v > 0.0)
            .ok_or_else(|| {
                ValidationError::InvalidValue("Duração deve ser um número positivo".to_string())
            })?;

        let budget = object
            .get("orcamento")
            .and_then(Value::as_f64)
            .filter(|v| *v > 0.0)
            .ok_or_else(|| {
                ValidationError::InvalidValue("Orçamento deve ser um número positivo".to_string())
            })?;

        let team_size = object
            .get("tamanho_equipe")
            .and_then(Value::as_i64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ValidationError::InvalidValue(
                    "Tamanho da equipe deve ser um número inteiro positivo".to_string(),
                )
            })?;

        let resources = object
            .get("recursos")
            .and_then(Value::as_str)
            .filter(|s| RESOURCE_LABELS.contains(s))
            .ok_or_else(|| {
                ValidationError::InvalidValue("Recursos deve ser: Alto, Médio ou Baixo".to_string())
            })?
            .to_string();

        Ok(ValidatedFeatures {
            duration_months,
            budget,
            team_size,
            resources,
        })
    }

    /// Returns the resident predictor, loading the artifact if necessary.
    ///
    /// One load attempt per call: a failure leaves the handle `Unavailable`
    /// and surfaces `ModelUnavailable` instead of retrying in a loop, but a
    /// later call will try again once an artifact exists.
    pub fn ensure_ready(&self) -> Result<Arc<Predictor>, ServiceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ServiceError::Internal("model state lock poisoned".to_string()))?;

        if let ModelState::Ready(predictor) = &*state {
            return Ok(Arc::clone(predictor));
        }

        match self.store.load().map_err(|e| e.to_string()).and_then(|artifact| {
            Predictor::from_artifact(artifact).map_err(|e| e.to_string())
        }) {
            Ok(predictor) => {
                let predictor = Arc::new(predictor);
                *state = ModelState::Ready(Arc::clone(&predictor));
                info!("Model ready from {:?}", self.store.artifact_path());
                Ok(predictor)
            }
            Err(msg) => {
                *state = ModelState::Unavailable;
                warn!("Model load failed: {}", msg);
                Err(ServiceError::ModelUnavailable(msg))
            }
        }
    }

    /// Validates and predicts a single raw request.
    pub fn predict_one(&self, input: &Value) -> Result<PredictionOutcome, ServiceError> {
        let features = Self::validate(input)?;
        let predictor = self.ensure_ready()?;
        run_prediction(&predictor, &features)
    }

    /// Predicts a list of raw requests independently.
    ///
    /// The outer error only reports an unavailable model. Per-item failures
    /// are recorded in place and never abort the remaining items; the result
    /// length always equals the input length.
    pub fn predict_batch(
        &self,
        projects: &[Value],
    ) -> Result<Vec<Result<PredictionOutcome, ServiceError>>, ServiceError> {
        let predictor = self.ensure_ready()?;

        let results = projects
            .iter()
            .map(|project| {
                Self::validate(project)
                    .map_err(ServiceError::from)
                    .and_then(|features| run_prediction(&predictor, &features))
            })
            .collect();
        Ok(results)
    }
}

fn run_prediction(
    predictor: &Predictor,
    features: &ValidatedFeatures,
) -> Result<PredictionOutcome, ServiceError> {
    let prediction = predictor
        .predict(
            features.duration_months,
            features.budget,
            features.team_size,
            &features.resources,
        )
        .map_err(|e| match e {
            PredictorError::UnknownCategory(label) => ServiceError::UnknownResource(label),
            other => ServiceError::Internal(other.to_string()),
        })?;

    let winning = prediction
        .probability_success
        .max(prediction.probability_failure);
    Ok(PredictionOutcome {
        success: prediction.success,
        probability_success: prediction.probability_success,
        probability_failure: prediction.probability_failure,
        confidence: ConfidenceBand::from_probability(winning),
    })
}
