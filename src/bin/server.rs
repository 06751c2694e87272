use anyhow::Context;
use clap::Parser;
use pointer_liveness_gate::config::{Args, Config};
use pointer_liveness_gate::http::{router, AppState};
use pointer_liveness_gate::session::JsonlSessionSink;
use pointer_liveness_gate::types::unix_ms;
use pointer_liveness_gate::VerificationEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = Config::from_args(Args::parse());
    if cfg.secret_is_ephemeral {
        tracing::warn!(
            "CLNP_SECRET is unset; using an ephemeral key, receipts will not verify across restarts"
        );
    }

    let sink = Arc::new(
        JsonlSessionSink::open(&cfg.session_log_path())
            .with_context(|| format!("open session log at {}", cfg.session_log_path().display()))?,
    );

    let bind: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid HOST/PORT")?;
    tracing::info!(
        ?bind,
        ttl_ms = cfg.challenge_ttl_ms,
        embed_ttl_ms = cfg.embed_ttl_ms(),
        data_dir = %cfg.data_dir.display(),
        admin = cfg.admin_token.is_some(),
        "liveness gate starting"
    );

    let engine = Arc::new(VerificationEngine::new(cfg, sink));

    // Background sweeper for expired and consumed challenges.
    let sweeper_engine = engine.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            let evicted = sweeper_engine.sweep(unix_ms());
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    pending = sweeper_engine.pending_challenges(),
                    "challenge sweep"
                );
            }
        }
    });

    let state = AppState {
        engine,
        started: Instant::now(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;
    Ok(())
}
