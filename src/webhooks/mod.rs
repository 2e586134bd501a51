//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Event parsing into typed [`Event`] values
//! - Pure resolution of events to the pull requests they concern

pub mod events;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use events::{
    CheckAction, CheckEvent, Event, PrAction, PullRequestEvent, ReviewAction, ReviewEvent,
    StatusEvent,
};
pub use handlers::{Resolution, resolve};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    SignatureError, WebhookSecret, compute_signature, format_signature_header,
    parse_signature_header,
};
