use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{ApiError, ApiResult};
use crate::flow::{CreateFlowParams, UpdateFlowParams};
use crate::storage::Storage;

/// Route method calls to appropriate handlers
pub async fn handle_method(
    state: &SharedState,
    method: &str,
    params: Option<Value>,
) -> ApiResult<Value> {
    info!(method = %method, "Routing request");

    match method {
        "flows/list" => handle_flows_list(state, params).await,
        "flows/get" => handle_flows_get(state, params).await,
        "flows/create" => handle_flows_create(state, params).await,
        "flows/update" => handle_flows_update(state, params).await,
        "flows/delete" => handle_flows_delete(state, params).await,
        "answers/for_question" => handle_answers_for_question(state, params).await,
        _ => Err(ApiError::UnknownMethod {
            method: method.to_string(),
        }),
    }
}

/// Handle flows/list - all flows in creation order
async fn handle_flows_list(state: &SharedState, _params: Option<Value>) -> ApiResult<Value> {
    let flows = state.flows.list().await?;
    serde_json::to_value(flows).map_err(ApiError::Json)
}

/// Handle flows/get - a single flow by id
async fn handle_flows_get(state: &SharedState, params: Option<Value>) -> ApiResult<Value> {
    let params: IdParams = parse_params("flows/get", params)?;

    let flow = state.flows.get(&params.id).await?;
    serde_json::to_value(flow).map_err(ApiError::Json)
}

/// Handle flows/create - validate and persist a new flow
async fn handle_flows_create(state: &SharedState, params: Option<Value>) -> ApiResult<Value> {
    let params: CreateFlowParams = parse_params("flows/create", params)?;

    let flow = state.flows.create(params).await?;
    serde_json::to_value(flow).map_err(ApiError::Json)
}

/// Handle flows/update - partial update of an existing flow
async fn handle_flows_update(state: &SharedState, params: Option<Value>) -> ApiResult<Value> {
    let params: UpdateRequest = parse_params("flows/update", params)?;

    let flow = state.flows.update(&params.id, params.changes).await?;
    serde_json::to_value(flow).map_err(ApiError::Json)
}

/// Handle flows/delete - remove a flow by id
async fn handle_flows_delete(state: &SharedState, params: Option<Value>) -> ApiResult<Value> {
    let params: IdParams = parse_params("flows/delete", params)?;

    state.flows.delete(&params.id).await?;
    Ok(Value::Null)
}

/// Handle answers/for_question - the answer picker behind the flow editor
async fn handle_answers_for_question(
    state: &SharedState,
    params: Option<Value>,
) -> ApiResult<Value> {
    let params: QuestionParams = parse_params("answers/for_question", params)?;

    state
        .storage
        .get_question(&params.question)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "question",
            id: params.question.clone(),
        })?;

    let answers = state
        .storage
        .list_question_answers(&params.question)
        .await?;
    serde_json::to_value(answers).map_err(ApiError::Json)
}

/// Parameters selecting a single record by id.
#[derive(Debug, serde::Deserialize)]
struct IdParams {
    id: String,
}

/// Parameters for flows/update: the record id plus any fields to change.
#[derive(Debug, serde::Deserialize)]
struct UpdateRequest {
    id: String,
    #[serde(flatten)]
    changes: UpdateFlowParams,
}

/// Parameters for answers/for_question.
#[derive(Debug, serde::Deserialize)]
struct QuestionParams {
    question: String,
}

/// Deserialize method parameters, rejecting missing or malformed input
fn parse_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<Value>,
) -> ApiResult<T> {
    match params {
        Some(params) => serde_json::from_value(params).map_err(|e| ApiError::InvalidParameters {
            method: method.to_string(),
            message: e.to_string(),
        }),
        None => Err(ApiError::InvalidParameters {
            method: method.to_string(),
            message: "Missing parameters".to_string(),
        }),
    }
}
