use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::validator::{self, FlowCandidate};
use crate::error::{ApiError, ApiResult, FlowError, StorageError};
use crate::storage::{FlowType, QuestionFlow, SqliteStorage, Storage};

/// Fields accepted when creating a flow edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlowParams {
    /// Id of the question the edge leaves from
    pub source_question: String,
    /// Id of the question the edge leads to
    pub target_question: String,
    /// Trigger kind; defaults to any-answer
    #[serde(default)]
    pub relationship_type: FlowType,
    /// Designated answer id for specific-answer edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_answer: Option<String>,
}

/// Fields accepted when updating a flow edge.
///
/// Absent fields keep their stored values. `source_answer` distinguishes
/// absent from explicit null: null clears the stored answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFlowParams {
    /// Replacement source question id
    pub source_question: Option<String>,
    /// Replacement target question id
    pub target_question: Option<String>,
    /// Replacement trigger kind
    pub relationship_type: Option<FlowType>,
    /// Replacement source answer; present-but-null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub source_answer: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // The extra Some keeps present-but-null distinct from absent.
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Validated CRUD over stored flow edges.
///
/// Every mutation resolves its ids against storage, runs the candidate
/// validator, and persists only on success, so a rejected request leaves
/// the edge set untouched.
#[derive(Clone)]
pub struct FlowService {
    storage: SqliteStorage,
}

impl FlowService {
    /// Create a new flow service over the given storage
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// List every stored flow edge, oldest first.
    pub async fn list(&self) -> ApiResult<Vec<QuestionFlow>> {
        let flows = self.storage.list_flows().await?;
        debug!(count = flows.len(), "Listed question flows");
        Ok(flows)
    }

    /// Fetch a single flow edge by id.
    pub async fn get(&self, id: &str) -> ApiResult<QuestionFlow> {
        self.storage
            .get_flow(id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: "question flow",
                id: id.to_string(),
            })
    }

    /// Create a flow edge from the given request fields.
    pub async fn create(&self, params: CreateFlowParams) -> ApiResult<QuestionFlow> {
        let candidate = self
            .resolve_candidate(
                &params.source_question,
                &params.target_question,
                params.relationship_type,
                params.source_answer.as_deref(),
            )
            .await?;

        self.check(&candidate, None).await?;

        let mut flow =
            QuestionFlow::new(&candidate.source_question_id, &candidate.target_question_id)
                .with_type(candidate.relationship_type);
        if let Some(binding) = &candidate.source_answer {
            flow = flow.with_source_answer(&binding.answer_id);
        }

        self.storage
            .create_flow(&flow)
            .await
            .map_err(|e| remap_conflict(e, flow.relationship_type))?;

        info!(flow_id = %flow.id, flow = %flow, "Question flow created");
        Ok(flow)
    }

    /// Apply a partial update to a flow edge.
    ///
    /// The stored edge and the changes merge into a full candidate, which
    /// passes the same validation as a create, excluding the edge itself
    /// from the duplicate rules.
    pub async fn update(&self, id: &str, params: UpdateFlowParams) -> ApiResult<QuestionFlow> {
        let current = self.get(id).await?;

        let source_question = params
            .source_question
            .unwrap_or_else(|| current.source_question_id.clone());
        let target_question = params
            .target_question
            .unwrap_or_else(|| current.target_question_id.clone());
        let relationship_type = params
            .relationship_type
            .unwrap_or(current.relationship_type);
        let source_answer = match params.source_answer {
            Some(explicit) => explicit,
            None => current.source_answer_id.clone(),
        };

        let candidate = self
            .resolve_candidate(
                &source_question,
                &target_question,
                relationship_type,
                source_answer.as_deref(),
            )
            .await?;

        self.check(&candidate, Some(id)).await?;

        let mut updated = current;
        updated.source_question_id = candidate.source_question_id;
        updated.target_question_id = candidate.target_question_id;
        updated.relationship_type = candidate.relationship_type;
        updated.source_answer_id = candidate.source_answer.map(|b| b.answer_id);
        updated.updated_at = Utc::now();

        self.storage
            .update_flow(&updated)
            .await
            .map_err(|e| remap_conflict(e, updated.relationship_type))?;

        info!(flow_id = %updated.id, flow = %updated, "Question flow updated");
        Ok(updated)
    }

    /// Delete a flow edge. Removal needs no integrity re-check.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.storage.delete_flow(id).await?;
        info!(flow_id = %id, "Question flow deleted");
        Ok(())
    }

    /// Resolve request ids into a candidate, confirming every referenced
    /// record exists before any rule runs.
    async fn resolve_candidate(
        &self,
        source_question: &str,
        target_question: &str,
        relationship_type: FlowType,
        source_answer: Option<&str>,
    ) -> ApiResult<FlowCandidate> {
        self.require_question(source_question).await?;
        if target_question != source_question {
            self.require_question(target_question).await?;
        }

        let mut candidate =
            FlowCandidate::new(source_question, target_question).with_type(relationship_type);

        if let Some(answer_id) = source_answer {
            let answer = self
                .storage
                .get_answer(answer_id)
                .await?
                .ok_or_else(|| ApiError::NotFound {
                    resource: "answer",
                    id: answer_id.to_string(),
                })?;
            candidate = candidate.with_answer(answer.id, answer.question_id);
        }

        Ok(candidate)
    }

    async fn require_question(&self, id: &str) -> ApiResult<()> {
        self.storage
            .get_question(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound {
                resource: "question",
                id: id.to_string(),
            })
    }

    async fn check(&self, candidate: &FlowCandidate, excluding: Option<&str>) -> ApiResult<()> {
        let existing = self
            .storage
            .list_flows_between(&candidate.source_question_id, &candidate.target_question_id)
            .await?;
        validator::validate(candidate, &existing, excluding)?;
        Ok(())
    }
}

/// Two writers can validate the same candidate before either commits; the
/// unique indexes catch whichever lands second, and the rejection carries
/// the same kind the validator would have produced.
fn remap_conflict(err: StorageError, relationship_type: FlowType) -> ApiError {
    match err {
        StorageError::UniqueViolation { constraint } => {
            warn!(constraint = %constraint, "Flow rejected by unique index after validation");
            match relationship_type {
                FlowType::AnyAnswer => FlowError::DuplicateAnyFlow.into(),
                FlowType::SpecificAnswer => FlowError::DuplicateSpecificFlow.into(),
            }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_params_default_type() {
        let params: CreateFlowParams = serde_json::from_value(json!({
            "source_question": "q-1",
            "target_question": "q-2",
        }))
        .unwrap();
        assert_eq!(params.relationship_type, FlowType::AnyAnswer);
        assert!(params.source_answer.is_none());
    }

    #[test]
    fn test_update_params_absent_answer() {
        let params: UpdateFlowParams = serde_json::from_value(json!({
            "target_question": "q-3",
        }))
        .unwrap();
        assert_eq!(params.target_question, Some("q-3".to_string()));
        assert_eq!(params.source_answer, None);
    }

    #[test]
    fn test_update_params_null_answer() {
        let params: UpdateFlowParams = serde_json::from_value(json!({
            "source_answer": null,
        }))
        .unwrap();
        assert_eq!(params.source_answer, Some(None));
    }

    #[test]
    fn test_update_params_answer_value() {
        let params: UpdateFlowParams = serde_json::from_value(json!({
            "source_answer": "a-2",
        }))
        .unwrap();
        assert_eq!(params.source_answer, Some(Some("a-2".to_string())));
    }

    #[test]
    fn test_remap_conflict_by_type() {
        let err = StorageError::UniqueViolation {
            constraint: "uq_any_answer_flow".to_string(),
        };
        assert!(matches!(
            remap_conflict(err, FlowType::AnyAnswer),
            ApiError::Validation(FlowError::DuplicateAnyFlow)
        ));

        let err = StorageError::UniqueViolation {
            constraint: "uq_question_flow".to_string(),
        };
        assert!(matches!(
            remap_conflict(err, FlowType::SpecificAnswer),
            ApiError::Validation(FlowError::DuplicateSpecificFlow)
        ));
    }

    #[test]
    fn test_remap_conflict_passes_other_errors_through() {
        let err = StorageError::FlowNotFound {
            flow_id: "f-1".to_string(),
        };
        assert!(matches!(
            remap_conflict(err, FlowType::AnyAnswer),
            ApiError::NotFound { .. }
        ));
    }
}
