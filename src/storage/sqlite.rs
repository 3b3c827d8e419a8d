use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{Answer, Question, QuestionFlow, Storage, Survey};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        // SQLite ships with foreign keys off; cascade deletes need the pragma.
        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory storage instance, used by tests
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        // A single never-recycled connection: an in-memory database lives
        // and dies with its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Turn unique-index failures into a typed error the service layer can
/// translate into a duplicate-flow rejection; pass everything else through.
fn classify(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db) = err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return StorageError::UniqueViolation {
                constraint: db.message().to_string(),
            };
        }
    }
    StorageError::Sqlx(err)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_survey(&self, survey: &Survey) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO surveys (id, title, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&survey.id)
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(survey.is_active)
        .bind(survey.created_at.to_rfc3339())
        .bind(survey.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_survey(&self, id: &str) -> StorageResult<Option<Survey>> {
        let row: Option<SurveyRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, is_active, created_at, updated_at
            FROM surveys
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_surveys(&self) -> StorageResult<Vec<Survey>> {
        let rows: Vec<SurveyRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, is_active, created_at, updated_at
            FROM surveys
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_survey(&self, survey: &Survey) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE surveys
            SET title = ?, description = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(survey.is_active)
        .bind(survey.updated_at.to_rfc3339())
        .bind(&survey.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::SurveyNotFound {
                survey_id: survey.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_survey(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM surveys WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::SurveyNotFound {
                survey_id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn create_question(&self, question: &Question) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO questions (id, survey_id, text, question_type, position, is_required, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&question.id)
        .bind(&question.survey_id)
        .bind(&question.text)
        .bind(question.question_type.to_string())
        .bind(question.position)
        .bind(question.is_required)
        .bind(question.created_at.to_rfc3339())
        .bind(question.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_question(&self, id: &str) -> StorageResult<Option<Question>> {
        let row: Option<QuestionRow> = sqlx::query_as(
            r#"
            SELECT id, survey_id, text, question_type, position, is_required, created_at, updated_at
            FROM questions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_survey_questions(&self, survey_id: &str) -> StorageResult<Vec<Question>> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT id, survey_id, text, question_type, position, is_required, created_at, updated_at
            FROM questions
            WHERE survey_id = ?
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_question(&self, question: &Question) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET survey_id = ?, text = ?, question_type = ?, position = ?, is_required = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&question.survey_id)
        .bind(&question.text)
        .bind(question.question_type.to_string())
        .bind(question.position)
        .bind(question.is_required)
        .bind(question.updated_at.to_rfc3339())
        .bind(&question.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::QuestionNotFound {
                question_id: question.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_question(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::QuestionNotFound {
                question_id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn create_answer(&self, answer: &Answer) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO answers (id, question_id, text, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&answer.id)
        .bind(&answer.question_id)
        .bind(&answer.text)
        .bind(answer.position)
        .bind(answer.created_at.to_rfc3339())
        .bind(answer.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_answer(&self, id: &str) -> StorageResult<Option<Answer>> {
        let row: Option<AnswerRow> = sqlx::query_as(
            r#"
            SELECT id, question_id, text, position, created_at, updated_at
            FROM answers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_question_answers(&self, question_id: &str) -> StorageResult<Vec<Answer>> {
        let rows: Vec<AnswerRow> = sqlx::query_as(
            r#"
            SELECT id, question_id, text, position, created_at, updated_at
            FROM answers
            WHERE question_id = ?
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_answer(&self, answer: &Answer) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE answers
            SET question_id = ?, text = ?, position = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&answer.question_id)
        .bind(&answer.text)
        .bind(answer.position)
        .bind(answer.updated_at.to_rfc3339())
        .bind(&answer.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AnswerNotFound {
                answer_id: answer.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_answer(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM answers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AnswerNotFound {
                answer_id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn create_flow(&self, flow: &QuestionFlow) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO question_flows (id, source_question_id, target_question_id, relationship_type, source_answer_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&flow.id)
        .bind(&flow.source_question_id)
        .bind(&flow.target_question_id)
        .bind(flow.relationship_type.to_string())
        .bind(&flow.source_answer_id)
        .bind(flow.created_at.to_rfc3339())
        .bind(flow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn get_flow(&self, id: &str) -> StorageResult<Option<QuestionFlow>> {
        let row: Option<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, source_question_id, target_question_id, relationship_type, source_answer_id, created_at, updated_at
            FROM question_flows
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_flows(&self) -> StorageResult<Vec<QuestionFlow>> {
        let rows: Vec<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, source_question_id, target_question_id, relationship_type, source_answer_id, created_at, updated_at
            FROM question_flows
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_flows_between(
        &self,
        source_question_id: &str,
        target_question_id: &str,
    ) -> StorageResult<Vec<QuestionFlow>> {
        let rows: Vec<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, source_question_id, target_question_id, relationship_type, source_answer_id, created_at, updated_at
            FROM question_flows
            WHERE source_question_id = ? AND target_question_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(source_question_id)
        .bind(target_question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_flows_from(&self, source_question_id: &str) -> StorageResult<Vec<QuestionFlow>> {
        let rows: Vec<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, source_question_id, target_question_id, relationship_type, source_answer_id, created_at, updated_at
            FROM question_flows
            WHERE source_question_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(source_question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_flow(&self, flow: &QuestionFlow) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE question_flows
            SET source_question_id = ?, target_question_id = ?, relationship_type = ?, source_answer_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&flow.source_question_id)
        .bind(&flow.target_question_id)
        .bind(flow.relationship_type.to_string())
        .bind(&flow.source_answer_id)
        .bind(flow.updated_at.to_rfc3339())
        .bind(&flow.id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::FlowNotFound {
                flow_id: flow.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_flow(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM question_flows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::FlowNotFound {
                flow_id: id.to_string(),
            });
        }

        Ok(())
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct SurveyRow {
    id: String,
    title: String,
    description: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl From<SurveyRow> for Survey {
    fn from(row: SurveyRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            is_active: row.is_active,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    survey_id: String,
    text: String,
    question_type: String,
    position: i64,
    is_required: bool,
    created_at: String,
    updated_at: String,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            survey_id: row.survey_id,
            text: row.text,
            question_type: row.question_type.parse().unwrap_or_default(),
            position: row.position,
            is_required: row.is_required,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    id: String,
    question_id: String,
    text: String,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Self {
            id: row.id,
            question_id: row.question_id,
            text: row.text,
            position: row.position,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlowRow {
    id: String,
    source_question_id: String,
    target_question_id: String,
    relationship_type: String,
    source_answer_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FlowRow> for QuestionFlow {
    fn from(row: FlowRow) -> Self {
        Self {
            id: row.id,
            source_question_id: row.source_question_id,
            target_question_id: row.target_question_id,
            relationship_type: row.relationship_type.parse().unwrap_or_default(),
            source_answer_id: row.source_answer_id,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}
