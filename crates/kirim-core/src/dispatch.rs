use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::time::sleep;

use crate::{
    domain::{MessagingId, NormalizedPhone},
    errors::Error,
    groups::GroupResolver,
    identity::IdentityResolver,
    messaging::{port::MessagingClient, types::Payload},
    phone::{self, DEFAULT_COUNTRY_CODE},
    Result,
};

/// Pause after each successful personal send before the next target.
pub const DEFAULT_SEND_PACING: Duration = Duration::from_millis(400);

pub const ERR_INVALID_NUMBER: &str = "invalid number";
pub const ERR_NOT_REGISTERED: &str = "not registered";

/// A personal target after normalization and identity lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub raw_input: String,
    pub normalized_phone: Option<NormalizedPhone>,
    pub messaging_id: Option<MessagingId>,
}

/// Outcome for one requested target, reported in input order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_id: Option<MessagingId>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub validated: bool,
}

impl DispatchResult {
    fn failed(to: String, messaging_id: Option<MessagingId>, error: impl Into<String>) -> Self {
        Self {
            to,
            messaging_id,
            ok: false,
            error: Some(error.into()),
            validated: false,
        }
    }

    fn succeeded(to: String, messaging_id: MessagingId, validated: bool) -> Self {
        Self {
            to,
            messaging_id: Some(messaging_id),
            ok: true,
            error: None,
            validated,
        }
    }
}

/// Aggregate of a personal fan-out: `ok` if any target succeeded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub ok: bool,
    pub results: Vec<DispatchResult>,
}

impl DispatchReport {
    fn from_results(results: Vec<DispatchResult>) -> Self {
        Self {
            ok: results.iter().any(|r| r.ok),
            results,
        }
    }
}

/// Sends payloads to groups and personal numbers.
///
/// Every network call is awaited before the next one starts, so messages reach
/// the network in request order. Personal fan-out is sequential and paced to
/// stay clear of provider rate limits; do not parallelize it.
pub struct DispatchEngine {
    client: Arc<dyn MessagingClient>,
    groups: GroupResolver,
    identities: IdentityResolver,
    country_code: String,
    pacing: Duration,
}

impl DispatchEngine {
    pub fn new(client: Arc<dyn MessagingClient>, groups: GroupResolver) -> Self {
        Self {
            identities: IdentityResolver::new(client.clone()),
            client,
            groups,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            pacing: DEFAULT_SEND_PACING,
        }
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn client(&self) -> &Arc<dyn MessagingClient> {
        &self.client
    }

    /// Refuse to work unless the messaging session is connected.
    pub async fn ensure_ready(&self) -> Result<()> {
        match self.client.get_state().await {
            Ok(state) if state.is_ready() => Ok(()),
            Ok(state) => {
                tracing::warn!(state = %state, "messaging client not ready");
                Err(Error::NotReady)
            }
            Err(e) => {
                tracing::warn!(error = %e, "messaging client state query failed");
                Err(Error::NotReady)
            }
        }
    }

    /// Send `payload` to the group best matching `name`.
    ///
    /// All-or-nothing: the first failed send aborts the rest and the whole call
    /// fails. Unknown names fail with [`Error::GroupNotFound`] carrying suggestions.
    pub async fn send_to_group(&self, name: &str, payload: &Payload) -> Result<()> {
        self.ensure_ready().await?;

        if name.trim().is_empty() || !payload.has_content() {
            return Err(Error::InvalidInput(
                "groupName and text/base64Files are required".to_string(),
            ));
        }

        let Some(group_id) = self.groups.resolve(name).await? else {
            let suggestions = self.groups.suggest(name).await?;
            tracing::info!(group = %name, suggestions = suggestions.len(), "group not found");
            return Err(Error::GroupNotFound {
                name: name.to_string(),
                suggestions,
            });
        };

        self.deliver(&group_id, payload).await.map_err(|e| {
            tracing::error!(group = %name, id = %group_id, error = %e, "group send failed");
            Error::SendFailure(e.detail())
        })?;

        tracing::info!(group = %name, id = %group_id, "group send complete");
        Ok(())
    }

    /// Send `payload` to each phone in order, or only check registration when
    /// `validate_only` is set. Every successful send, the last one included,
    /// is followed by the pacing delay.
    ///
    /// Per-target failures are recorded in the report and never abort the batch.
    pub async fn send_to_targets(
        &self,
        targets: &[String],
        payload: &Payload,
        validate_only: bool,
    ) -> Result<DispatchReport> {
        self.ensure_ready().await?;

        if targets.is_empty() {
            return Err(Error::InvalidInput("phone or phones is required".to_string()));
        }
        if !validate_only && !payload.has_content() {
            return Err(Error::InvalidInput(
                "text or base64Files is required for sending".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(targets.len());
        for raw in targets {
            let target = self.resolve_target(raw).await;
            let (result, sent) = self.dispatch_one(target, payload, validate_only).await;
            tracing::info!(
                to = %result.to,
                ok = result.ok,
                error = result.error.as_deref().unwrap_or(""),
                validated = result.validated,
                "personal target processed"
            );
            results.push(result);

            if sent && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }
        }

        Ok(DispatchReport::from_results(results))
    }

    /// Normalize then look up one raw target. Lookup is skipped for invalid numbers.
    pub async fn resolve_target(&self, raw: &str) -> ResolvedTarget {
        let normalized_phone = phone::normalize(raw, &self.country_code);
        let messaging_id = match &normalized_phone {
            Some(p) => self.identities.resolve(p).await,
            None => None,
        };
        ResolvedTarget {
            raw_input: raw.to_string(),
            normalized_phone,
            messaging_id,
        }
    }

    /// Returns the result and whether anything was actually sent.
    async fn dispatch_one(
        &self,
        target: ResolvedTarget,
        payload: &Payload,
        validate_only: bool,
    ) -> (DispatchResult, bool) {
        let Some(phone) = target.normalized_phone else {
            return (
                DispatchResult::failed(target.raw_input, None, ERR_INVALID_NUMBER),
                false,
            );
        };
        let to = phone.as_str().to_string();

        let Some(id) = target.messaging_id else {
            return (DispatchResult::failed(to, None, ERR_NOT_REGISTERED), false);
        };

        if validate_only {
            return (DispatchResult::succeeded(to, id, true), false);
        }

        match self.deliver(&id, payload).await {
            Ok(()) => (DispatchResult::succeeded(to, id, false), true),
            Err(e) => (DispatchResult::failed(to, Some(id), e.detail()), false),
        }
    }

    async fn deliver(&self, to: &MessagingId, payload: &Payload) -> Result<()> {
        for content in payload.contents() {
            self.client.send(to, content).await?;
        }
        Ok(())
    }
}
