//! Integrity rules for candidate flow edges.
//!
//! The checks run in a fixed order and the first failure wins, so a
//! candidate that breaks several rules always reports the same one:
//! 1. A specific-answer edge must carry a source answer.
//! 2. A carried answer must belong to the source question.
//! 3. Source and target question must differ.
//! 4. A specific-answer edge must not repeat (source, target, answer).
//! 5. An any-answer edge must be the only one between its questions.
//!
//! The caller resolves ids to live records first; this module never
//! touches storage.

use crate::error::{FlowError, FlowResult};
use crate::storage::{FlowType, QuestionFlow};

/// A prospective flow edge, resolved and ready for validation.
#[derive(Debug, Clone)]
pub struct FlowCandidate {
    /// Question the edge would leave from.
    pub source_question_id: String,
    /// Question the edge would lead to.
    pub target_question_id: String,
    /// Trigger kind for the edge.
    pub relationship_type: FlowType,
    /// Resolved source answer, if the request named one.
    pub source_answer: Option<AnswerBinding>,
}

/// A resolved source answer: the answer id plus the question that owns it.
#[derive(Debug, Clone)]
pub struct AnswerBinding {
    /// The answer's id.
    pub answer_id: String,
    /// Id of the question the answer belongs to.
    pub question_id: String,
}

impl FlowCandidate {
    /// Create an any-answer candidate between two questions
    pub fn new(
        source_question_id: impl Into<String>,
        target_question_id: impl Into<String>,
    ) -> Self {
        Self {
            source_question_id: source_question_id.into(),
            target_question_id: target_question_id.into(),
            relationship_type: FlowType::AnyAnswer,
            source_answer: None,
        }
    }

    /// Set the trigger kind
    pub fn with_type(mut self, relationship_type: FlowType) -> Self {
        self.relationship_type = relationship_type;
        self
    }

    /// Attach a resolved answer and its owning question
    pub fn with_answer(
        mut self,
        answer_id: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        self.source_answer = Some(AnswerBinding {
            answer_id: answer_id.into(),
            question_id: question_id.into(),
        });
        self
    }
}

/// Check a candidate edge against the integrity rules.
///
/// `existing` holds the stored edges the duplicate rules compare against;
/// only edges on the candidate's (source, target, type) triple matter, so
/// passing the full edge set is fine. When editing, `excluding` carries
/// the id of the edge being edited so it does not collide with itself.
pub fn validate(
    candidate: &FlowCandidate,
    existing: &[QuestionFlow],
    excluding: Option<&str>,
) -> FlowResult<()> {
    if candidate.relationship_type == FlowType::SpecificAnswer && candidate.source_answer.is_none()
    {
        return Err(FlowError::MissingRequiredAnswer);
    }

    if let Some(binding) = &candidate.source_answer {
        if binding.question_id != candidate.source_question_id {
            return Err(FlowError::AnswerNotOwnedBySource {
                answer_id: binding.answer_id.clone(),
                owner_id: binding.question_id.clone(),
                source_id: candidate.source_question_id.clone(),
            });
        }
    }

    if candidate.source_question_id == candidate.target_question_id {
        return Err(FlowError::SelfLoop);
    }

    let rivals: Vec<&QuestionFlow> = existing
        .iter()
        .filter(|flow| excluding != Some(flow.id.as_str()))
        .filter(|flow| {
            flow.source_question_id == candidate.source_question_id
                && flow.target_question_id == candidate.target_question_id
                && flow.relationship_type == candidate.relationship_type
        })
        .collect();

    match candidate.relationship_type {
        FlowType::SpecificAnswer => {
            let answer_id = candidate.source_answer.as_ref().map(|b| b.answer_id.as_str());
            if rivals
                .iter()
                .any(|flow| flow.source_answer_id.as_deref() == answer_id)
            {
                return Err(FlowError::DuplicateSpecificFlow);
            }
        }
        FlowType::AnyAnswer => {
            if !rivals.is_empty() {
                return Err(FlowError::DuplicateAnyFlow);
            }
        }
    }

    Ok(())
}
