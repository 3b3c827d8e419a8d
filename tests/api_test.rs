//! Integration tests for the JSON-RPC method surface
//!
//! These tests drive handle_method with realistic payloads and check the
//! wire-shaped results and error codes callers see.

use std::sync::Arc;

use serde_json::{json, Value};

use surveyflow::config::{AuthConfig, Config, DatabaseConfig, LogFormat, LoggingConfig};
use surveyflow::error::ApiError;
use surveyflow::server::{handle_method, AppState, SharedState};
use surveyflow::storage::{Answer, Question, SqliteStorage, Storage, Survey};

fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            path: std::path::PathBuf::from(":memory:"),
            max_connections: 5,
        },
        auth: AuthConfig {
            tokens: vec!["test-token".to_string()],
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
    }
}

async fn test_state() -> SharedState {
    let storage = SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage");
    Arc::new(AppState::new(test_config(), storage))
}

/// Seed a checkout survey: an easy/hard question branching into a detail question
async fn seed(state: &SharedState) -> (Question, Question, Answer, Answer) {
    let survey = Survey::new("Checkout experience");
    state.storage.create_survey(&survey).await.unwrap();

    let q1 = Question::new(&survey.id, "Was checkout easy?");
    let q2 = Question::new(&survey.id, "What slowed you down?").with_position(1);
    state.storage.create_question(&q1).await.unwrap();
    state.storage.create_question(&q2).await.unwrap();

    let easy = Answer::new(&q1.id, "Yes, no trouble");
    let hard = Answer::new(&q1.id, "No, I got stuck").with_position(1);
    state.storage.create_answer(&easy).await.unwrap();
    state.storage.create_answer(&hard).await.unwrap();

    (q1, q2, easy, hard)
}

async fn call(state: &SharedState, method: &str, params: Value) -> Result<Value, ApiError> {
    handle_method(state, method, Some(params)).await
}

#[cfg(test)]
mod flow_methods {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_flows_create_returns_wire_shape() {
        let state = test_state().await;
        let (q1, q2, _, hard) = seed(&state).await;

        let created = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q2.id,
                "relationship_type": "specific-answer",
                "source_answer": hard.id,
            }),
        )
        .await
        .unwrap();

        assert_eq!(created["source_question"], json!(q1.id));
        assert_eq!(created["target_question"], json!(q2.id));
        assert_eq!(created["relationship_type"], json!("specific-answer"));
        assert_eq!(created["source_answer"], json!(hard.id));
        assert!(created["id"].is_string());
        assert!(created["created_at"].is_string());
        assert!(created["updated_at"].is_string());
    }

    #[tokio::test]
    async fn test_flows_get_matches_create() {
        let state = test_state().await;
        let (q1, q2, _, _) = seed(&state).await;

        let created = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q2.id,
            }),
        )
        .await
        .unwrap();

        let fetched = call(&state, "flows/get", json!({ "id": created["id"] }))
            .await
            .unwrap();

        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn test_flows_list_contains_created() {
        let state = test_state().await;
        let (q1, q2, _, _) = seed(&state).await;

        let created = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q2.id,
            }),
        )
        .await
        .unwrap();

        let listed = handle_method(&state, "flows/list", None).await.unwrap();

        assert_eq!(listed, json!([created]));
    }

    #[tokio::test]
    async fn test_flows_update_changes_only_named_fields() {
        let state = test_state().await;
        let (q1, q2, _, hard) = seed(&state).await;

        let created = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q2.id,
            }),
        )
        .await
        .unwrap();

        let updated = call(
            &state,
            "flows/update",
            json!({
                "id": created["id"],
                "relationship_type": "specific-answer",
                "source_answer": hard.id,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated["source_question"], created["source_question"]);
        assert_eq!(updated["target_question"], created["target_question"]);
        assert_eq!(updated["relationship_type"], json!("specific-answer"));
        assert_eq!(updated["source_answer"], json!(hard.id));
    }

    #[tokio::test]
    async fn test_flows_delete_round_trip() {
        let state = test_state().await;
        let (q1, q2, _, _) = seed(&state).await;

        let created = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q2.id,
            }),
        )
        .await
        .unwrap();

        let deleted = call(&state, "flows/delete", json!({ "id": created["id"] }))
            .await
            .unwrap();
        assert_eq!(deleted, Value::Null);

        let err = call(&state, "flows/get", json!({ "id": created["id"] }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32004);
    }

    #[tokio::test]
    async fn test_answers_for_question_ordered() {
        let state = test_state().await;
        let (q1, _, easy, hard) = seed(&state).await;

        let answers = call(&state, "answers/for_question", json!({ "question": q1.id }))
            .await
            .unwrap();

        let texts: Vec<&str> = answers
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec![easy.text.as_str(), hard.text.as_str()]);
    }
}

#[cfg(test)]
mod error_codes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_validation_error_code() {
        let state = test_state().await;
        let (q1, _, _, _) = seed(&state).await;

        let err = call(
            &state,
            "flows/create",
            json!({
                "source_question": q1.id,
                "target_question": q1.id,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), -32002);
        let data = err.data().unwrap();
        assert_eq!(data["kind"], json!("self_loop"));
        assert_eq!(data["field"], json!("target_question"));
    }

    #[tokio::test]
    async fn test_not_found_error_code() {
        let state = test_state().await;
        seed(&state).await;

        let err = call(&state, "flows/get", json!({ "id": "missing" }))
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32004);
        let data = err.data().unwrap();
        assert_eq!(data["kind"], json!("not_found"));
        assert_eq!(data["resource"], json!("question flow"));
        assert_eq!(data["id"], json!("missing"));
    }

    #[tokio::test]
    async fn test_unknown_method_error_code() {
        let state = test_state().await;

        let err = handle_method(&state, "flows/rename", None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32601);
        assert_eq!(err.to_string(), "Unknown method: flows/rename");
    }

    #[tokio::test]
    async fn test_invalid_params_error_code() {
        let state = test_state().await;
        seed(&state).await;

        let err = call(&state, "flows/get", json!({ "identifier": "f-1" }))
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32602);
        assert!(err.to_string().contains("flows/get"));
    }

    #[tokio::test]
    async fn test_answers_for_missing_question() {
        let state = test_state().await;
        seed(&state).await;

        let err = call(&state, "answers/for_question", json!({ "question": "missing" }))
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32004);
        let data = err.data().unwrap();
        assert_eq!(data["resource"], json!("question"));
    }
}
