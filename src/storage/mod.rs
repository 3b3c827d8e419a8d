//! Storage layer for survey authoring data.
//!
//! This module provides SQLite-based storage for surveys, their ordered
//! questions and answers, and the question flows that connect questions
//! into a branching graph.

mod sqlite;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// A survey: a named container of ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    /// Unique survey identifier.
    pub id: String,
    /// Survey title shown to respondents.
    pub title: String,
    /// Longer description of the survey's purpose.
    pub description: String,
    /// Whether the survey is open for responses.
    pub is_active: bool,
    /// When the survey was created.
    pub created_at: DateTime<Utc>,
    /// When the survey was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A question within a survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question identifier.
    pub id: String,
    /// Parent survey ID.
    pub survey_id: String,
    /// The question text.
    pub text: String,
    /// How the question is answered.
    pub question_type: QuestionType,
    /// Sort position within the survey (lower first).
    pub position: i64,
    /// Whether respondents must answer before moving on.
    pub is_required: bool,
    /// When the question was created.
    pub created_at: DateTime<Utc>,
    /// When the question was last updated.
    pub updated_at: DateTime<Utc>,
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Pick exactly one of the predefined answers.
    #[default]
    SingleChoice,
    /// Pick any number of the predefined answers.
    MultipleChoice,
    /// Free-form text response.
    FreeText,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "single-choice"),
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::FreeText => write!(f, "free-text"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single-choice" => Ok(QuestionType::SingleChoice),
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "free-text" => Ok(QuestionType::FreeText),
            _ => Err(format!("Unknown question type: {}", s)),
        }
    }
}

/// A predefined answer option for a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Unique answer identifier.
    pub id: String,
    /// Question this answer belongs to.
    pub question_id: String,
    /// The answer text.
    pub text: String,
    /// Sort position within the question (lower first).
    pub position: i64,
    /// When the answer was created.
    pub created_at: DateTime<Utc>,
    /// When the answer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// How a flow edge is triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowType {
    /// The edge fires for every answer to the source question.
    #[default]
    AnyAnswer,
    /// The edge fires only for one designated answer.
    SpecificAnswer,
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowType::AnyAnswer => write!(f, "any-answer"),
            FlowType::SpecificAnswer => write!(f, "specific-answer"),
        }
    }
}

impl std::str::FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any-answer" => Ok(FlowType::AnyAnswer),
            "specific-answer" => Ok(FlowType::SpecificAnswer),
            _ => Err(format!("Unknown flow type: {}", s)),
        }
    }
}

/// A directed edge in the question graph.
///
/// An `any-answer` edge routes every respondent from the source question
/// to the target; a `specific-answer` edge routes only respondents who
/// picked the designated source answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFlow {
    /// Unique flow identifier.
    pub id: String,
    /// Question the edge leaves from.
    #[serde(rename = "source_question")]
    pub source_question_id: String,
    /// Question the edge leads to.
    #[serde(rename = "target_question")]
    pub target_question_id: String,
    /// Trigger kind for this edge.
    pub relationship_type: FlowType,
    /// Designated answer for specific-answer edges.
    #[serde(rename = "source_answer")]
    pub source_answer_id: Option<String>,
    /// When the flow was created.
    pub created_at: DateTime<Utc>,
    /// When the flow was last updated.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for QuestionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.relationship_type {
            FlowType::AnyAnswer => write!(
                f,
                "any answer to {} leads to {}",
                self.source_question_id, self.target_question_id
            ),
            FlowType::SpecificAnswer => write!(
                f,
                "answer {} to {} leads to {}",
                self.source_answer_id.as_deref().unwrap_or("?"),
                self.source_question_id,
                self.target_question_id
            ),
        }
    }
}

impl Survey {
    /// Create a new active survey with the given title
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the survey as inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Question {
    /// Create a new required single-choice question
    pub fn new(survey_id: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            survey_id: survey_id.into(),
            text: text.into(),
            question_type: QuestionType::SingleChoice,
            position: 0,
            is_required: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the question type
    pub fn with_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = question_type;
        self
    }

    /// Set the sort position
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    /// Mark the question as optional
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }
}

impl Answer {
    /// Create a new answer option for a question
    pub fn new(question_id: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            question_id: question_id.into(),
            text: text.into(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the sort position
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }
}

impl QuestionFlow {
    /// Create a new any-answer flow between two questions
    pub fn new(
        source_question_id: impl Into<String>,
        target_question_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source_question_id: source_question_id.into(),
            target_question_id: target_question_id.into(),
            relationship_type: FlowType::AnyAnswer,
            source_answer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the trigger kind
    pub fn with_type(mut self, relationship_type: FlowType) -> Self {
        self.relationship_type = relationship_type;
        self
    }

    /// Set the designated source answer
    pub fn with_source_answer(mut self, answer_id: impl Into<String>) -> Self {
        self.source_answer_id = Some(answer_id.into());
        self
    }
}

/// Storage trait for database operations.
///
/// This trait defines all persistence operations for surveys, questions,
/// answers, and question flows. Deletes cascade: removing a survey removes
/// its questions, their answers, and every flow touching those rows.
/// Updating or deleting a missing row reports the typed not-found error.
#[async_trait]
pub trait Storage: Send + Sync {
    // Survey operations

    /// Create a new survey.
    async fn create_survey(&self, survey: &Survey) -> StorageResult<()>;
    /// Get a survey by ID.
    async fn get_survey(&self, id: &str) -> StorageResult<Option<Survey>>;
    /// Get all surveys, newest first.
    async fn list_surveys(&self) -> StorageResult<Vec<Survey>>;
    /// Update an existing survey.
    async fn update_survey(&self, survey: &Survey) -> StorageResult<()>;
    /// Delete a survey by ID.
    async fn delete_survey(&self, id: &str) -> StorageResult<()>;

    // Question operations

    /// Create a new question.
    async fn create_question(&self, question: &Question) -> StorageResult<()>;
    /// Get a question by ID.
    async fn get_question(&self, id: &str) -> StorageResult<Option<Question>>;
    /// Get all questions in a survey, in position order.
    async fn list_survey_questions(&self, survey_id: &str) -> StorageResult<Vec<Question>>;
    /// Update an existing question.
    async fn update_question(&self, question: &Question) -> StorageResult<()>;
    /// Delete a question by ID.
    async fn delete_question(&self, id: &str) -> StorageResult<()>;

    // Answer operations

    /// Create a new answer option.
    async fn create_answer(&self, answer: &Answer) -> StorageResult<()>;
    /// Get an answer by ID.
    async fn get_answer(&self, id: &str) -> StorageResult<Option<Answer>>;
    /// Get all answers for a question, in position order.
    async fn list_question_answers(&self, question_id: &str) -> StorageResult<Vec<Answer>>;
    /// Update an existing answer.
    async fn update_answer(&self, answer: &Answer) -> StorageResult<()>;
    /// Delete an answer by ID.
    async fn delete_answer(&self, id: &str) -> StorageResult<()>;

    // Question flow operations

    /// Create a new flow edge.
    async fn create_flow(&self, flow: &QuestionFlow) -> StorageResult<()>;
    /// Get a flow by ID.
    async fn get_flow(&self, id: &str) -> StorageResult<Option<QuestionFlow>>;
    /// Get every flow edge, oldest first.
    async fn list_flows(&self) -> StorageResult<Vec<QuestionFlow>>;
    /// Get flows between a source and target question, oldest first.
    async fn list_flows_between(
        &self,
        source_question_id: &str,
        target_question_id: &str,
    ) -> StorageResult<Vec<QuestionFlow>>;
    /// Get flows leaving a source question, oldest first.
    async fn list_flows_from(&self, source_question_id: &str) -> StorageResult<Vec<QuestionFlow>>;
    /// Update an existing flow.
    async fn update_flow(&self, flow: &QuestionFlow) -> StorageResult<()>;
    /// Delete a flow by ID.
    async fn delete_flow(&self, id: &str) -> StorageResult<()>;
}
