use std::fmt;

/// Represents the different types of errors that can occur in the prediction core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictorError {
    /// A resource-tier label was not part of the encoding fitted at training time
    UnknownCategory(String),
    /// The training set was empty or contained a single outcome class
    InsufficientData(String),
    /// The historical dataset could not be read or parsed
    DataError(String),
    /// An operation required a trained model and none was available
    NotTrained,
}

impl fmt::Display for PredictorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory(label) => write!(f, "Unknown resource tier: '{}'", label),
            Self::InsufficientData(msg) => write!(f, "Insufficient training data: {}", msg),
            Self::DataError(msg) => write!(f, "Data error: {}", msg),
            Self::NotTrained => write!(f, "Model has not been trained"),
        }
    }
}

impl std::error::Error for PredictorError {}
