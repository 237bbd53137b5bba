//! promkit demo service
//!
//! - GET /ping    -> "pong"
//! - GET /healthz -> "ok"
//! - GET /metrics -> Prometheus text exposition (path configurable)
//!
//! Config is read from `promkit.yaml`, or from `$PROMKIT_CONFIG` when set.

use std::error::Error;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use promkit_middleware::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "promkit.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("PROMKIT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let cancel = CancellationToken::new();
    let heartbeat = state.recorder().start_heartbeat(cancel.child_token())?;
    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        config = %path,
        handler_path = state.recorder().handler_path(),
        "promkit-demo starting"
    );
    let listener = tokio::net::TcpListener::bind(listen).await?;

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler failed");
            }
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    heartbeat.await?;
    tracing::info!(uptime = state.recorder().uptime(), "promkit-demo stopped");
    Ok(())
}
