use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

use kirim_core::{config::Config, dispatch::DispatchEngine};

use crate::routes::{router, GatewayState};

/// Run the HTTP server on `cfg.bind_addr()`.
/// Graceful shutdown on Ctrl+C (SIGINT) and SIGTERM (Unix); in-flight requests,
/// including paced personal fan-outs, complete before exit.
pub async fn run_http(engine: Arc<DispatchEngine>, cfg: &Config) -> Result<()> {
    let state = GatewayState {
        engine,
        api_key: Arc::from(cfg.api_key.as_str()),
    };
    let app = router(state, cfg.max_body_bytes);
    let bind_addr = cfg.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        bridge = %cfg.bridge_url,
        "gateway listening (Ctrl+C/SIGTERM to stop)"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let ctrl_c = tokio::signal::ctrl_c();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        }
    }
}
