//! HTTP server for the merge-readiness bot.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub, validates signatures, and hands parsed
//!   events to the dispatcher
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 200 OK)
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use crate::dispatch::{ClientFactory, Dispatcher};
use crate::webhooks::{Event, WebhookSecret};

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Receives parsed events from the webhook endpoint.
///
/// Must return without waiting for the event to be processed.
pub trait EventSink: Send + Sync {
    fn submit(&self, event: Event);
}

impl<F: ClientFactory> EventSink for Dispatcher<F> {
    fn submit(&self, event: Event) {
        // Fire and forget: the routing task logs its own failures.
        drop(self.dispatch(event));
    }
}

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Secret for HMAC-SHA256 signature verification.
    webhook_secret: WebhookSecret,

    events: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(webhook_secret: WebhookSecret, events: Arc<dyn EventSink>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret,
                events,
            }),
        }
    }

    pub fn webhook_secret(&self) -> &WebhookSecret {
        &self.inner.webhook_secret
    }

    pub fn events(&self) -> &dyn EventSink {
        &*self.inner.events
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
