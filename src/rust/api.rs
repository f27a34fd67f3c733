//! Request/response payload shapes for the serving boundary.
//!
//! The HTTP shell itself lives outside this crate, but the JSON bodies it
//! speaks are part of the core contract and are defined here, field-for-field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{PredictionOutcome, ServiceError, ValidationError, RESOURCE_LABELS};

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn new(model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            message: "API de Previsão de Sucesso de Projetos está funcionando".to_string(),
            model_loaded,
        }
    }
}

/// Numeric prediction block inside a predict response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionBody {
    pub success: bool,
    pub probability_success: f64,
    pub probability_failure: f64,
}

/// Human-readable interpretation block inside a predict response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    pub success_percentage: String,
    pub status: String,
    pub confidence: String,
}

/// `POST /predict` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionBody,
    pub input_data: Value,
    pub interpretation: Interpretation,
}

impl PredictResponse {
    pub fn new(input_data: Value, outcome: &PredictionOutcome) -> Self {
        Self {
            prediction: PredictionBody {
                success: outcome.success,
                probability_success: outcome.probability_success,
                probability_failure: outcome.probability_failure,
            },
            input_data,
            interpretation: Interpretation {
                success_percentage: format_percentage(outcome.probability_success),
                status: if outcome.success { "Sucesso" } else { "Fracasso" }.to_string(),
                confidence: outcome.confidence.as_str().to_string(),
            },
        }
    }
}

/// Error body for 400- and 500-class responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn from_service_error(err: &ServiceError) -> Self {
        match err {
            ServiceError::Validation(ValidationError::MissingFields(fields)) => Self {
                error: "Campos obrigatórios faltando".to_string(),
                missing_fields: Some(fields.clone()),
                message: None,
            },
            ServiceError::Validation(ValidationError::InvalidValue(msg)) => Self {
                error: msg.clone(),
                missing_fields: None,
                message: None,
            },
            ServiceError::ModelUnavailable(_) => Self {
                error: "Modelo não pôde ser carregado".to_string(),
                missing_fields: None,
                message: Some(
                    "Certifique-se de que o modelo foi treinado primeiro".to_string(),
                ),
            },
            ServiceError::UnknownResource(_) | ServiceError::Internal(_) => Self {
                error: "Erro interno do servidor".to_string(),
                missing_fields: None,
                message: Some(err.to_string()),
            },
        }
    }
}

/// HTTP status a serving shell should attach to an error body.
pub fn http_status(err: &ServiceError) -> u16 {
    match err {
        ServiceError::Validation(_) => 400,
        _ => 500,
    }
}

/// `POST /batch-predict` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub projects: Vec<Value>,
}

/// One entry of a batch response: an outcome or an isolated item error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItemResult {
    Outcome {
        project_index: usize,
        success: bool,
        probability_success: f64,
        success_percentage: String,
    },
    Error {
        project_index: usize,
        error: String,
    },
}

/// `POST /batch-predict` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub results: Vec<BatchItemResult>,
    pub total_projects: usize,
}

impl BatchPredictResponse {
    pub fn new(outcomes: &[Result<PredictionOutcome, ServiceError>]) -> Self {
        let results: Vec<BatchItemResult> = outcomes
            .iter()
            .enumerate()
            .map(|(project_index, item)| match item {
                Ok(outcome) => BatchItemResult::Outcome {
                    project_index,
                    success: outcome.success,
                    probability_success: outcome.probability_success,
                    success_percentage: format_percentage(outcome.probability_success),
                },
                Err(err) => BatchItemResult::Error {
                    project_index,
                    error: err.to_string(),
                },
            })
            .collect();

        Self {
            total_projects: results.len(),
            results,
        }
    }
}

/// `GET /model-info` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub features: Vec<String>,
    pub target: String,
    pub resources_options: Vec<String>,
    pub trained: bool,
}

impl ModelInfoResponse {
    pub fn new(trained: bool) -> Self {
        Self {
            model_type: "Random Forest Classifier".to_string(),
            features: vec![
                "Duração (meses)".to_string(),
                "Orçamento (R$)".to_string(),
                "Tamanho da equipe".to_string(),
                "Recursos disponíveis".to_string(),
            ],
            target: "Sucesso do projeto (0/1)".to_string(),
            resources_options: RESOURCE_LABELS.iter().map(|s| s.to_string()).collect(),
            trained,
        }
    }
}

fn format_percentage(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}
