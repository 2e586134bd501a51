//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, validates signatures, parses the
//! payload and hands recognized events to the dispatcher before returning
//! 200 OK. Evaluation happens in the background.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::webhooks::{ParseError, SignatureError, parse_webhook};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Signature header malformed or not matching the payload.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// Payload could not be parsed for a known event type.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request_review", "check_run")
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Optional headers:
///   - `X-GitHub-Delivery`: Delivery ID, logged for correlation
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Delivery accepted (dispatched, or ignored as irrelevant)
/// - 400 Bad Request: Missing header or malformed payload
/// - 401 Unauthorized: Invalid signature
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let delivery_id = optional_header(&headers, HEADER_DELIVERY).unwrap_or("-");
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;

    debug!(delivery_id, event_type, "Received webhook");

    // Verify before parsing.
    if let Err(e) = app_state.webhook_secret().verify(&body, signature_header) {
        warn!(delivery_id, error = %e, "Rejected webhook signature");
        return Err(e.into());
    }

    let event = match parse_webhook(event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id, event_type, "Ignoring webhook");
            return Ok((StatusCode::OK, "OK"));
        }
        Err(e) => {
            warn!(delivery_id, event_type, error = %e, "Malformed webhook payload");
            return Err(e.into());
        }
    };

    info!(
        delivery_id,
        repo = %event.repo(),
        kind = event.kind(),
        "Dispatching webhook"
    );
    app_state.events().submit(event);

    Ok((StatusCode::OK, "OK"))
}

fn optional_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extracts a required header value as a string.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    optional_header(headers, name).ok_or(WebhookError::MissingHeader(name))
}
