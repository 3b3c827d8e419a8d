//! Resolving which question an answer leads to.
//!
//! The edge set can hold both an any-answer edge and specific-answer
//! edges for the same source question. The most specific match wins:
//! an edge designated for the chosen answer beats the catch-all. Ties
//! beyond specificity fall back to creation order, which is the order
//! [`Storage::list_flows_from`] returns.
//!
//! [`Storage::list_flows_from`]: crate::storage::Storage::list_flows_from

use crate::storage::{FlowType, QuestionFlow};

/// Pick the edge a respondent follows after answering.
///
/// `outgoing` holds the edges leaving the answered question, oldest
/// first. Pass `None` for the chosen answer when the question was
/// skipped or free-text; only the catch-all edge can fire then.
/// Returns `None` when no edge applies and the path ends.
pub fn next_flow<'a>(
    outgoing: &'a [QuestionFlow],
    chosen_answer: Option<&str>,
) -> Option<&'a QuestionFlow> {
    if let Some(answer_id) = chosen_answer {
        let designated = outgoing.iter().find(|flow| {
            flow.relationship_type == FlowType::SpecificAnswer
                && flow.source_answer_id.as_deref() == Some(answer_id)
        });
        if designated.is_some() {
            return designated;
        }
    }

    outgoing
        .iter()
        .find(|flow| flow.relationship_type == FlowType::AnyAnswer)
}

/// Like [`next_flow`], but returns the target question id.
pub fn next_question<'a>(outgoing: &'a [QuestionFlow], chosen_answer: Option<&str>) -> Option<&'a str> {
    next_flow(outgoing, chosen_answer).map(|flow| flow.target_question_id.as_str())
}
