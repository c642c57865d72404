use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // Registry configuration
    #[error("Unknown saga step kind: {0}")]
    UnknownStepKind(String),

    #[error("Saga step kind registered twice: {0}")]
    DuplicateStepKind(String),

    // Step execution
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Step '{step}' timed out after {timeout_ms}ms")]
    StepTimeout { step: String, timeout_ms: u64 },

    #[error("Saga {saga_instance_id} failed at step '{step}': {reason}")]
    SagaFailed {
        saga_instance_id: Uuid,
        step: String,
        reason: String,
        compensation_failures: usize,
    },
}

impl AppError {
    /// Id of the saga instance a `SagaFailed` error belongs to.
    pub fn saga_instance_id(&self) -> Option<Uuid> {
        match self {
            AppError::SagaFailed {
                saga_instance_id, ..
            } => Some(*saga_instance_id),
            _ => None,
        }
    }

    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, AppError::DatabaseError(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ConfigError(format!("YAML error: {}", err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::DatabaseError(format!("Serialization failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
