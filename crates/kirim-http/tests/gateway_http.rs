//! Gateway integration tests: auth, validation, status codes and response shapes.
//! Drives the router with a scripted in-memory messaging client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use kirim_core::{
    dispatch::DispatchEngine,
    domain::{GroupInfo, MessagingId, NormalizedPhone},
    errors::Error,
    group_cache::GroupDirectoryCache,
    groups::GroupResolver,
    messaging::{
        port::MessagingClient,
        types::{OutgoingContent, SessionState},
    },
    Result,
};
use kirim_http::{router, GatewayState, API_KEY_HEADER};
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "test-key";

struct ScriptedClient {
    groups: Vec<GroupInfo>,
    registered: HashMap<String, MessagingId>,
    state: Mutex<Option<SessionState>>,
    fail_send_to: Option<String>,
    sends: Mutex<Vec<(MessagingId, OutgoingContent)>>,
    initializations: AtomicUsize,
}

impl ScriptedClient {
    fn new() -> Self {
        let mut registered = HashMap::new();
        registered.insert(
            "6281300000000".to_string(),
            MessagingId("6281300000000@c.us".to_string()),
        );
        Self {
            groups: vec![
                GroupInfo::new("111@g.us", "Pengajian SGN"),
                GroupInfo::new("222@g.us", "Arisan RT 05"),
            ],
            registered,
            state: Mutex::new(Some(SessionState::Connected)),
            fail_send_to: None,
            sends: Mutex::new(Vec::new()),
            initializations: AtomicUsize::new(0),
        }
    }

    /// `None` makes the state query itself fail.
    fn with_state(self, state: Option<SessionState>) -> Self {
        *self.state.lock().unwrap() = state;
        self
    }

    fn failing_sends_to(mut self, id: &str) -> Self {
        self.fail_send_to = Some(id.to_string());
        self
    }

    fn sent(&self) -> usize {
        self.sends.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagingClient for ScriptedClient {
    async fn enumerate_groups(&self) -> Result<Vec<GroupInfo>> {
        Ok(self.groups.clone())
    }

    async fn lookup_number(&self, phone: &NormalizedPhone) -> Result<Option<MessagingId>> {
        Ok(self.registered.get(phone.as_str()).cloned())
    }

    async fn send(&self, to: &MessagingId, content: OutgoingContent) -> Result<()> {
        if self.fail_send_to.as_deref() == Some(to.as_str()) {
            return Err(Error::External("Evaluation failed: chat not found".to_string()));
        }
        self.sends.lock().unwrap().push((to.clone(), content));
        Ok(())
    }

    async fn get_state(&self) -> Result<SessionState> {
        let state = *self.state.lock().unwrap();
        state.ok_or_else(|| Error::External("browser page closed".to_string()))
    }

    async fn initialize(&self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn app(client: Arc<ScriptedClient>) -> Router {
    let client: Arc<dyn MessagingClient> = client;
    let groups = GroupResolver::new(client.clone(), GroupDirectoryCache::default());
    let engine = DispatchEngine::new(client, groups).with_pacing(Duration::ZERO);
    router(
        GatewayState {
            engine: Arc::new(engine),
            api_key: Arc::from(KEY),
        },
        4 * 1024 * 1024,
    )
}

fn post(path: &str, key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(path).header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, payload)
}

#[tokio::test]
async fn send_endpoints_require_api_key() {
    let client = Arc::new(ScriptedClient::new());
    for path in ["/send-group", "/send-personal", "/reinit"] {
        let (status, body) = call(
            app(client.clone()),
            post(path, Some("wrong"), json!({ "groupName": "x", "text": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body, json!({ "ok": false, "error": "unauthorized" }));

        let (status, _) = call(app(client.clone()), post(path, None, json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
    }
    assert_eq!(client.sent(), 0);
}

#[tokio::test]
async fn group_send_succeeds() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post(
            "/send-group",
            Some(KEY),
            json!({
                "groupName": "pengajian sgn",
                "text": "Isi pesan",
                "base64Files": [{ "mime": "image/png", "data": "iVBOR", "filename": "rekap.png", "caption": "Rekap" }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(client.sent(), 2);
}

#[tokio::test]
async fn group_send_unknown_group_is_404_with_suggestions() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post("/send-group", Some(KEY), json!({ "groupName": "Rapat", "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"], json!("group \"Rapat\" not found"));
    assert!(body["suggestions"].is_array());
    assert_eq!(client.sent(), 0);
}

#[tokio::test]
async fn group_send_failure_is_500_with_collaborator_message() {
    let client = Arc::new(ScriptedClient::new().failing_sends_to("222@g.us"));
    let (status, body) = call(
        app(client),
        post("/send-group", Some(KEY), json!({ "groupName": "Arisan RT 05", "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "ok": false, "error": "Evaluation failed: chat not found" })
    );
}

#[tokio::test]
async fn group_send_without_content_is_400() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client),
        post("/send-group", Some(KEY), json!({ "groupName": "Arisan RT 05" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn malformed_json_is_rejected_with_error_body() {
    let client = Arc::new(ScriptedClient::new());
    let req = Request::post("/send-group")
        .header("content-type", "application/json")
        .header(API_KEY_HEADER, KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = call(app(client), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn wrongly_shaped_body_is_400() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post("/send-personal", Some(KEY), json!({ "phones": { "a": 1 }, "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(client.sent(), 0);
}

#[tokio::test]
async fn numeric_phone_is_accepted() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post("/send-personal", Some(KEY), json!({ "phone": 6281300000000u64, "text": "halo" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["to"], json!("6281300000000"));
    assert_eq!(body["results"][0]["ok"], json!(true));
    assert_eq!(client.sent(), 1);
}

#[tokio::test]
async fn not_ready_is_503() {
    let client = Arc::new(ScriptedClient::new().with_state(Some(SessionState::Pairing)));
    let (status, body) = call(
        app(client.clone()),
        post("/send-personal", Some(KEY), json!({ "phone": "081300000000", "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({ "ok": false, "error": "messaging client not ready" })
    );
    assert_eq!(client.sent(), 0);
}

#[tokio::test]
async fn personal_send_reports_each_target_in_order() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post(
            "/send-personal",
            Some(KEY),
            json!({ "phones": ["12", "0812-0000-0000", "0813-0000-0000"], "text": "halo" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "ok": true,
            "results": [
                { "to": "12", "ok": false, "error": "invalid number" },
                { "to": "6281200000000", "ok": false, "error": "not registered" },
                { "to": "6281300000000", "messagingId": "6281300000000@c.us", "ok": true }
            ]
        })
    );
    assert_eq!(client.sent(), 1);
}

#[tokio::test]
async fn personal_send_with_no_success_is_400() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client),
        post("/send-personal", Some(KEY), json!({ "phone": "0812-0000-0000", "text": "halo" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["results"][0]["error"], json!("not registered"));
}

#[tokio::test]
async fn validate_only_checks_without_sending() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client.clone()),
        post(
            "/send-personal",
            Some(KEY),
            json!({ "phone": "+62 813 0000 0000", "text": "halo", "validateOnly": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["validated"], json!(true));
    assert_eq!(client.sent(), 0);
}

#[tokio::test]
async fn personal_send_requires_targets_and_content() {
    let client = Arc::new(ScriptedClient::new());
    let (status, _) = call(
        app(client.clone()),
        post("/send-personal", Some(KEY), json!({ "text": "halo" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        app(client),
        post("/send-personal", Some(KEY), json!({ "phone": "081300000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_unknown_when_state_query_fails() {
    let client = Arc::new(ScriptedClient::new().with_state(None));
    let (status, body) = call(
        app(client),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "ready": false, "state": "UNKNOWN" }));
}

#[tokio::test]
async fn state_endpoint_reports_session_state() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(
        app(client),
        Request::get("/state").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "state": "CONNECTED", "ready": true }));

    let client = Arc::new(ScriptedClient::new().with_state(None));
    let (status, body) = call(
        app(client),
        Request::get("/state").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({ "ok": false, "error": "browser page closed", "ready": false })
    );
}

#[tokio::test]
async fn reinit_is_a_noop_when_connected() {
    let client = Arc::new(ScriptedClient::new());
    let (status, body) = call(app(client.clone()), post("/reinit", Some(KEY), json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "message": "already connected" }));
    assert_eq!(client.initializations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reinit_starts_initialize_when_disconnected() {
    let client = Arc::new(ScriptedClient::new().with_state(Some(SessionState::Unpaired)));
    let (status, body) = call(app(client.clone()), post("/reinit", Some(KEY), json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    for _ in 0..50 {
        if client.initializations.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(client.initializations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let client = Arc::new(ScriptedClient::new());
    let response = app(client)
        .oneshot(Request::get("/unknown").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
