//! Bridge adapter (reqwest).
//!
//! Implements the `kirim-core` [`MessagingClient`] port over the JSON REST API of
//! a sidecar process that owns the chat-network session (QR login, persisted
//! credentials, browser transport). This crate only speaks HTTP to it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use kirim_core::{
    domain::{GroupInfo, MessagingId, NormalizedPhone},
    errors::Error,
    messaging::{
        port::MessagingClient,
        types::{OutgoingContent, SessionState},
    },
    Result,
};

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Name of the persisted session the bridge should (re)open.
    pub client_id: String,
}

#[derive(Clone, Debug)]
pub struct BridgeClient {
    cfg: BridgeConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NumberLookup {
    id: Option<MessagingId>,
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    state: SessionState,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SendBody<'a> {
    Text {
        to: &'a str,
        text: &'a str,
    },
    Media {
        to: &'a str,
        mime: &'a str,
        data: &'a str,
        filename: &'a str,
        caption: &'a str,
    },
}

impl<'a> SendBody<'a> {
    fn new(to: &'a MessagingId, content: &'a OutgoingContent) -> Self {
        match content {
            OutgoingContent::Text(text) => SendBody::Text {
                to: to.as_str(),
                text,
            },
            OutgoingContent::Media(m) => SendBody::Media {
                to: to.as_str(),
                mime: &m.mime,
                data: &m.data,
                filename: &m.filename,
                caption: &m.caption,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeBody<'a> {
    client_id: &'a str,
}

impl BridgeClient {
    pub fn new(cfg: BridgeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::External(format!("bridge client build error: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn map_err(e: reqwest::Error) -> Error {
        Error::External(format!("bridge request error: {e}"))
    }

    /// Turn a non-2xx response into an error that keeps the bridge's own message.
    async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::External(format!(
            "bridge {what} failed: {status} {}",
            bridge_message(&body)
        )))
    }
}

/// Prefer an `error` field from a JSON body; fall back to the raw (truncated) text.
fn bridge_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
    from_json.unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl MessagingClient for BridgeClient {
    async fn enumerate_groups(&self) -> Result<Vec<GroupInfo>> {
        let resp = self
            .http
            .get(self.url("groups"))
            .send()
            .await
            .map_err(Self::map_err)?;
        let groups: Vec<GroupInfo> = Self::check(resp, "group list")
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;
        tracing::debug!(count = groups.len(), "bridge enumerated groups");
        Ok(groups)
    }

    async fn lookup_number(&self, phone: &NormalizedPhone) -> Result<Option<MessagingId>> {
        let resp = self
            .http
            .get(self.url(&format!("numbers/{}", phone.as_str())))
            .send()
            .await
            .map_err(Self::map_err)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let found: NumberLookup = Self::check(resp, "number lookup")
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;
        Ok(found.id)
    }

    async fn send(&self, to: &MessagingId, content: OutgoingContent) -> Result<()> {
        let resp = self
            .http
            .post(self.url("messages"))
            .json(&SendBody::new(to, &content))
            .send()
            .await
            .map_err(Self::map_err)?;
        Self::check(resp, "send").await?;
        Ok(())
    }

    async fn get_state(&self) -> Result<SessionState> {
        let resp = self
            .http
            .get(self.url("state"))
            .send()
            .await
            .map_err(Self::map_err)?;
        let state: StateResponse = Self::check(resp, "state query")
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;
        Ok(state.state)
    }

    async fn initialize(&self) -> Result<()> {
        let resp = self
            .http
            .post(self.url("initialize"))
            .json(&InitializeBody {
                client_id: &self.cfg.client_id,
            })
            .send()
            .await
            .map_err(Self::map_err)?;
        Self::check(resp, "initialize").await?;
        Ok(())
    }
}
