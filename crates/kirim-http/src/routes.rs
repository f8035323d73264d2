use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use kirim_core::{
    dispatch::DispatchEngine,
    messaging::types::{Attachment, Payload},
};

use crate::{auth::require_api_key, error::ApiError};

/// Shared state: the dispatch core plus the shared secret.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<DispatchEngine>,
    pub api_key: Arc<str>,
}

/// Body of `POST /send-group`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSendRequest {
    pub group_name: Option<String>,
    pub text: Option<String>,
    pub base64_files: Option<Vec<Attachment>>,
}

/// Body of `POST /send-personal`. `phones` wins over `phone` when non-empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalSendRequest {
    #[serde(default, deserialize_with = "phone_opt")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "phones_opt")]
    pub phones: Option<Vec<String>>,
    pub text: Option<String>,
    pub base64_files: Option<Vec<Attachment>>,
    #[serde(default)]
    pub validate_only: bool,
}

/// Callers send phones as strings or bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneValue {
    Text(String),
    Number(serde_json::Number),
}

impl From<PhoneValue> for String {
    fn from(v: PhoneValue) -> Self {
        match v {
            PhoneValue::Text(s) => s,
            PhoneValue::Number(n) => n.to_string(),
        }
    }
}

fn phone_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<PhoneValue>::deserialize(d)?.map(String::from))
}

fn phones_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(Option::<Vec<PhoneValue>>::deserialize(d)?
        .map(|vs| vs.into_iter().map(String::from).collect()))
}

impl PersonalSendRequest {
    pub fn targets(&self) -> Vec<String> {
        match (&self.phones, &self.phone) {
            (Some(phones), _) if !phones.is_empty() => phones.clone(),
            (_, Some(phone)) if !phone.is_empty() => vec![phone.clone()],
            _ => Vec::new(),
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ready: bool,
    pub state: String,
}

async fn handle_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let (ready, session) = match state.engine.client().get_state().await {
        Ok(s) => (s.is_ready(), s.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "health: state query failed");
            (false, "UNKNOWN".to_string())
        }
    };
    Json(HealthResponse {
        ok: true,
        ready,
        state: session,
    })
}

async fn handle_state(State(state): State<GatewayState>) -> Response {
    match state.engine.client().get_state().await {
        Ok(s) => Json(json!({ "ok": true, "state": s, "ready": s.is_ready() })).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": e.detail(), "ready": false })),
        )
            .into_response(),
    }
}

/// Soft reinitialize: never tears down the persisted session.
async fn handle_reinit(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_api_key(&headers, &state.api_key)?;

    let client = state.engine.client().clone();
    if let Ok(s) = client.get_state().await {
        if s.is_ready() {
            return Ok(Json(json!({ "ok": true, "message": "already connected" })));
        }
    }

    tracing::info!("soft reinitialize requested");
    tokio::spawn(async move {
        if let Err(e) = client.initialize().await {
            tracing::error!(error = %e, "reinitialize failed");
        }
    });

    Ok(Json(json!({ "ok": true })))
}

async fn handle_send_group(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<GroupSendRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_api_key(&headers, &state.api_key)?;
    let Json(body) = body?;

    let payload = Payload::new(body.text, body.base64_files.unwrap_or_default());
    let name = body.group_name.unwrap_or_default();
    state.engine.send_to_group(&name, &payload).await?;

    Ok(Json(json!({ "ok": true })))
}

async fn handle_send_personal(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<PersonalSendRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    require_api_key(&headers, &state.api_key)?;
    let Json(body) = body?;

    let targets = body.targets();
    let payload = Payload::new(body.text, body.base64_files.unwrap_or_default());
    let report = state
        .engine
        .send_to_targets(&targets, &payload, body.validate_only)
        .await?;

    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(report)).into_response())
}

/// Build the gateway router.
pub fn router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/state", get(handle_state))
        .route("/reinit", post(handle_reinit))
        .route("/send-group", post(handle_send_group))
        .route("/send-personal", post(handle_send_personal))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
