use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Survey not found: {survey_id}")]
    SurveyNotFound { survey_id: String },

    #[error("Question not found: {question_id}")]
    QuestionNotFound { question_id: String },

    #[error("Answer not found: {answer_id}")]
    AnswerNotFound { answer_id: String },

    #[error("Question flow not found: {flow_id}")]
    FlowNotFound { flow_id: String },

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Flow integrity violations raised by the candidate validator.
///
/// Each variant maps to a stable machine-readable kind and names the
/// request field a caller would change to fix the rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("a specific-answer flow requires a source answer")]
    MissingRequiredAnswer,

    #[error("answer {answer_id} belongs to question {owner_id}, not source question {source_id}")]
    AnswerNotOwnedBySource {
        answer_id: String,
        owner_id: String,
        source_id: String,
    },

    #[error("source and target question must differ")]
    SelfLoop,

    #[error("a flow for this answer between these questions already exists")]
    DuplicateSpecificFlow,

    #[error("an any-answer flow between these questions already exists")]
    DuplicateAnyFlow,
}

impl FlowError {
    /// Stable identifier carried in wire rejections.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::MissingRequiredAnswer => "missing_required_answer",
            FlowError::AnswerNotOwnedBySource { .. } => "answer_not_owned_by_source",
            FlowError::SelfLoop => "self_loop",
            FlowError::DuplicateSpecificFlow => "duplicate_specific_flow",
            FlowError::DuplicateAnyFlow => "duplicate_any_flow",
        }
    }

    /// The request field the violation concerns.
    pub fn field(&self) -> &'static str {
        match self {
            FlowError::MissingRequiredAnswer => "source_answer",
            FlowError::AnswerNotOwnedBySource { .. } => "source_answer",
            FlowError::SelfLoop => "target_question",
            FlowError::DuplicateSpecificFlow => "source_answer",
            FlowError::DuplicateAnyFlow => "target_question",
        }
    }
}

/// Errors surfaced through the JSON-RPC boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] FlowError),

    #[error("Unknown method: {method}")]
    UnknownMethod { method: String },

    #[error("Invalid parameters for {method}: {message}")]
    InvalidParameters { method: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// JSON-RPC error code for this failure.
    ///
    /// Application failures use the -32000..-32099 implementation-defined
    /// range; protocol failures keep their standard codes.
    pub fn code(&self) -> i32 {
        match self {
            ApiError::Unauthenticated => -32001,
            ApiError::Validation(_) => -32002,
            ApiError::NotFound { .. } => -32004,
            ApiError::UnknownMethod { .. } => -32601,
            ApiError::InvalidParameters { .. } => -32602,
            ApiError::Internal { .. } | ApiError::Json(_) => -32603,
        }
    }

    /// Structured detail attached to the JSON-RPC error object, if any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Unauthenticated => Some(serde_json::json!({
                "kind": "unauthenticated",
            })),
            ApiError::NotFound { resource, id } => Some(serde_json::json!({
                "kind": "not_found",
                "resource": resource,
                "id": id,
            })),
            ApiError::Validation(err) => Some(serde_json::json!({
                "kind": err.kind(),
                "field": err.field(),
            })),
            _ => None,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SurveyNotFound { survey_id } => ApiError::NotFound {
                resource: "survey",
                id: survey_id,
            },
            StorageError::QuestionNotFound { question_id } => ApiError::NotFound {
                resource: "question",
                id: question_id,
            },
            StorageError::AnswerNotFound { answer_id } => ApiError::NotFound {
                resource: "answer",
                id: answer_id,
            },
            StorageError::FlowNotFound { flow_id } => ApiError::NotFound {
                resource: "question flow",
                id: flow_id,
            },
            other => ApiError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for flow validation
pub type FlowResult<T> = Result<T, FlowError>;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
