//! Unit tests for storage types and builder patterns.
//!
//! Tests defaults, builder methods, enum parsing, and wire-format
//! serialization for Survey, Question, Answer, and QuestionFlow.

use super::*;
use serde_json::json;

// ============================================================================
// Survey tests
// ============================================================================

#[test]
fn test_survey_new() {
    let survey = Survey::new("Customer feedback");
    assert!(!survey.id.is_empty());
    assert_eq!(survey.title, "Customer feedback");
    assert_eq!(survey.description, "");
    assert!(survey.is_active);
    assert_eq!(survey.created_at, survey.updated_at);
}

#[test]
fn test_survey_with_description() {
    let survey = Survey::new("Exit poll").with_description("Asked after checkout");
    assert_eq!(survey.description, "Asked after checkout");
}

#[test]
fn test_survey_inactive() {
    let survey = Survey::new("Draft").inactive();
    assert!(!survey.is_active);
}

// ============================================================================
// Question tests
// ============================================================================

#[test]
fn test_question_new() {
    let question = Question::new("survey-1", "How did you hear about us?");
    assert!(!question.id.is_empty());
    assert_eq!(question.survey_id, "survey-1");
    assert_eq!(question.text, "How did you hear about us?");
    assert_eq!(question.question_type, QuestionType::SingleChoice); // default
    assert_eq!(question.position, 0);
    assert!(question.is_required);
}

#[test]
fn test_question_builder_chain() {
    let question = Question::new("survey-1", "Anything else?")
        .with_type(QuestionType::FreeText)
        .with_position(9)
        .optional();

    assert_eq!(question.question_type, QuestionType::FreeText);
    assert_eq!(question.position, 9);
    assert!(!question.is_required);
}

#[test]
fn test_question_type_display() {
    assert_eq!(QuestionType::SingleChoice.to_string(), "single-choice");
    assert_eq!(QuestionType::MultipleChoice.to_string(), "multiple-choice");
    assert_eq!(QuestionType::FreeText.to_string(), "free-text");
}

#[test]
fn test_question_type_from_str() {
    assert_eq!(
        "single-choice".parse::<QuestionType>().unwrap(),
        QuestionType::SingleChoice
    );
    assert_eq!(
        "multiple-choice".parse::<QuestionType>().unwrap(),
        QuestionType::MultipleChoice
    );
    assert_eq!(
        "free-text".parse::<QuestionType>().unwrap(),
        QuestionType::FreeText
    );
    assert_eq!(
        "FREE-TEXT".parse::<QuestionType>().unwrap(),
        QuestionType::FreeText
    );
}

#[test]
fn test_question_type_from_str_invalid() {
    let result = "dropdown".parse::<QuestionType>();
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown question type"));
}

#[test]
fn test_question_type_default() {
    assert_eq!(QuestionType::default(), QuestionType::SingleChoice);
}

// ============================================================================
// Answer tests
// ============================================================================

#[test]
fn test_answer_new() {
    let answer = Answer::new("question-1", "Word of mouth");
    assert!(!answer.id.is_empty());
    assert_eq!(answer.question_id, "question-1");
    assert_eq!(answer.text, "Word of mouth");
    assert_eq!(answer.position, 0);
}

#[test]
fn test_answer_with_position() {
    let answer = Answer::new("question-1", "Other").with_position(4);
    assert_eq!(answer.position, 4);
}

// ============================================================================
// QuestionFlow tests
// ============================================================================

#[test]
fn test_question_flow_new() {
    let flow = QuestionFlow::new("q-1", "q-2");
    assert!(!flow.id.is_empty());
    assert_eq!(flow.source_question_id, "q-1");
    assert_eq!(flow.target_question_id, "q-2");
    assert_eq!(flow.relationship_type, FlowType::AnyAnswer); // default
    assert!(flow.source_answer_id.is_none());
}

#[test]
fn test_question_flow_builder_chain() {
    let flow = QuestionFlow::new("q-1", "q-2")
        .with_type(FlowType::SpecificAnswer)
        .with_source_answer("a-7");

    assert_eq!(flow.relationship_type, FlowType::SpecificAnswer);
    assert_eq!(flow.source_answer_id, Some("a-7".to_string()));
}

#[test]
fn test_question_flow_display() {
    let any = QuestionFlow::new("q-1", "q-2");
    assert_eq!(any.to_string(), "any answer to q-1 leads to q-2");

    let specific = QuestionFlow::new("q-1", "q-2")
        .with_type(FlowType::SpecificAnswer)
        .with_source_answer("a-7");
    assert_eq!(specific.to_string(), "answer a-7 to q-1 leads to q-2");
}

#[test]
fn test_flow_type_display() {
    assert_eq!(FlowType::AnyAnswer.to_string(), "any-answer");
    assert_eq!(FlowType::SpecificAnswer.to_string(), "specific-answer");
}

#[test]
fn test_flow_type_from_str() {
    assert_eq!("any-answer".parse::<FlowType>().unwrap(), FlowType::AnyAnswer);
    assert_eq!(
        "specific-answer".parse::<FlowType>().unwrap(),
        FlowType::SpecificAnswer
    );
}

#[test]
fn test_flow_type_from_str_invalid() {
    let result = "sometimes".parse::<FlowType>();
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown flow type"));
}

#[test]
fn test_flow_type_default() {
    assert_eq!(FlowType::default(), FlowType::AnyAnswer);
}

// ============================================================================
// Wire format tests
// ============================================================================

#[test]
fn test_question_flow_wire_field_names() {
    let flow = QuestionFlow::new("q-1", "q-2")
        .with_type(FlowType::SpecificAnswer)
        .with_source_answer("a-7");

    let value = serde_json::to_value(&flow).unwrap();
    assert_eq!(value["source_question"], "q-1");
    assert_eq!(value["target_question"], "q-2");
    assert_eq!(value["relationship_type"], "specific-answer");
    assert_eq!(value["source_answer"], "a-7");
    assert!(value.get("source_question_id").is_none());
}

#[test]
fn test_question_flow_deserialize_wire_format() {
    let flow: QuestionFlow = serde_json::from_value(json!({
        "id": "f-1",
        "source_question": "q-1",
        "target_question": "q-2",
        "relationship_type": "any-answer",
        "source_answer": null,
        "created_at": "2024-05-01T00:00:00Z",
        "updated_at": "2024-05-01T00:00:00Z",
    }))
    .unwrap();

    assert_eq!(flow.source_question_id, "q-1");
    assert_eq!(flow.relationship_type, FlowType::AnyAnswer);
    assert!(flow.source_answer_id.is_none());
}

#[test]
fn test_question_type_serde_round_trip() {
    let serialized = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
    assert_eq!(serialized, "\"multiple-choice\"");

    let parsed: QuestionType = serde_json::from_str("\"free-text\"").unwrap();
    assert_eq!(parsed, QuestionType::FreeText);
}
