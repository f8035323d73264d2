use std::sync::Arc;

use kirim_bridge::{BridgeClient, BridgeConfig};
use kirim_core::{
    config::Config, dispatch::DispatchEngine, group_cache::GroupDirectoryCache,
    groups::GroupResolver, messaging::port::MessagingClient,
};

#[tokio::main]
async fn main() -> Result<(), kirim_core::Error> {
    kirim_core::logging::init("kirim")?;

    let cfg = Config::load()?;

    let client: Arc<dyn MessagingClient> = Arc::new(BridgeClient::new(BridgeConfig {
        base_url: cfg.bridge_url.clone(),
        timeout: cfg.bridge_timeout,
        client_id: cfg.client_id.clone(),
    })?);

    // Kick off the session once at startup; the bridge keeps it alive afterwards.
    match client.get_state().await {
        Ok(state) if state.is_ready() => tracing::info!(state = %state, "messaging session ready"),
        Ok(state) => {
            tracing::info!(state = %state, "messaging session not ready; initializing");
            if let Err(e) = client.initialize().await {
                tracing::error!(error = %e, "initialize failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "bridge unreachable at startup"),
    }

    let groups = GroupResolver::new(
        client.clone(),
        GroupDirectoryCache::new(cfg.group_cache_ttl),
    )
    .with_suggestion_limit(cfg.group_suggestion_limit);

    let engine = Arc::new(
        DispatchEngine::new(client, groups)
            .with_country_code(cfg.default_country_code.clone())
            .with_pacing(cfg.send_pacing),
    );

    kirim_http::run_http(engine, &cfg)
        .await
        .map_err(|e| kirim_core::Error::External(format!("http gateway failed: {e}")))?;

    Ok(())
}
