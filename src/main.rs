use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merge_readiness::config::Config;
use merge_readiness::dispatch::Dispatcher;
use merge_readiness::github::AppClientFactory;
use merge_readiness::server::{AppState, build_router};
use merge_readiness::webhooks::WebhookSecret;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merge_readiness=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(?config, "Starting");

    let pem = tokio::fs::read(&config.private_key_path)
        .await
        .with_context(|| format!("reading {}", config.private_key_path.display()))?;
    let factory = AppClientFactory::new(config.app_id, &pem).context("building GitHub App client")?;

    let dispatcher = Dispatcher::new(factory, config.dispatcher_config());
    let shutdown = dispatcher.shutdown_token();

    let state = AppState::new(
        WebhookSecret::new(config.webhook_secret.clone()),
        Arc::new(dispatcher),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("serving HTTP")?;

    Ok(())
}
