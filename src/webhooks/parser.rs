//! GitHub webhook payload parser.
//!
//! This module parses raw webhook JSON payloads into typed [`Event`] values.
//! The parser is designed to be robust against unknown fields and event types.
//!
//! # Parsing Strategy
//!
//! 1. The event type is determined from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types and irrelevant actions return `Ok(None)` (ignored, not error)
//! 4. Malformed payloads return `Err` with details
//!
//! # Headers
//!
//! GitHub webhooks include these headers:
//! - `X-GitHub-Event` - Event type (e.g., "pull_request_review")
//! - `X-GitHub-Delivery` - Unique delivery ID
//! - `X-Hub-Signature-256` - HMAC-SHA256 signature (verified elsewhere)

use serde::Deserialize;
use thiserror::Error;

use crate::types::{
    CheckStatus, InstallationId, PrNumber, PrState, RepoId, ReviewState, Sha, SignalState,
};

use super::events::{
    CheckAction, CheckEvent, Event, PrAction, PullRequestEvent, ReviewAction, ReviewEvent,
    StatusEvent,
};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Field has invalid value (e.g., malformed SHA, unknown state).
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// # Arguments
///
/// * `event_type` - The value of the `X-GitHub-Event` header
/// * `payload` - The raw JSON payload bytes
///
/// # Returns
///
/// * `Ok(Some(event))` - Successfully parsed a known event type
/// * `Ok(None)` - Unknown event type or action (ignored, not an error)
/// * `Err(e)` - Malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use merge_readiness::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "submitted",
///     "review": { "state": "approved", "user": { "login": "octocat" } },
///     "pull_request": { "number": 42 },
///     "repository": { "owner": { "login": "owner" }, "name": "repo" },
///     "installation": { "id": 7 }
/// }"#;
///
/// let result = parse_webhook("pull_request_review", payload);
/// assert!(matches!(result, Ok(Some(_))));
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<Event>, ParseError> {
    match event_type {
        "pull_request_review" => {
            parse_pull_request_review(payload).map(|opt| opt.map(Event::ReviewSubmitted))
        }
        "check_run" => parse_check_run(payload).map(|opt| opt.map(Event::CheckRunCompleted)),
        "check_suite" => parse_check_suite(payload).map(|opt| opt.map(Event::CheckSuiteCompleted)),
        "status" => parse_status(payload).map(|e| Some(Event::ExternalStatusUpdated(e))),
        "pull_request" => parse_pull_request(payload).map(|opt| opt.map(Event::PullRequestChanged)),
        // Unknown event types are ignored (not an error)
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's webhook JSON structure. We use Option<T> liberally to
// handle missing fields gracefully, then validate required fields explicitly.
// ============================================================================

/// Minimal repository info present in all webhook payloads.
#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawOwner,
    name: String,
}

impl RawRepository {
    fn into_repo_id(self) -> RepoId {
        RepoId::new(self.owner.login, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

/// The installation that delivered the event. Present on every App webhook.
#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawPrNumber {
    number: u64,
}

fn parse_sha(field: &'static str, value: &str) -> Result<Sha, ParseError> {
    Sha::parse(value).map_err(|_| ParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Deduplicates associated PR numbers, keeping first-seen order.
fn pr_numbers(raw: Vec<RawPrNumber>) -> Vec<PrNumber> {
    let mut numbers: Vec<PrNumber> = Vec::with_capacity(raw.len());
    for pr in raw {
        let number = PrNumber(pr.number);
        if !numbers.contains(&number) {
            numbers.push(number);
        }
    }
    numbers
}

// ============================================================================
// pull_request_review event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestReviewPayload {
    action: String,
    review: RawReview,
    pull_request: RawPrNumber,
    repository: RawRepository,
    installation: RawInstallation,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    user: RawUser,
    state: String,
}

fn parse_pull_request_review(payload: &[u8]) -> Result<Option<ReviewEvent>, ParseError> {
    let raw: RawPullRequestReviewPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "submitted" => ReviewAction::Submitted,
        "dismissed" => ReviewAction::Dismissed,
        "edited" => ReviewAction::Edited,
        _ => return Ok(None),
    };

    // Webhooks use lowercase review states, the REST API uses uppercase
    let state = ReviewState::parse(&raw.review.state).ok_or_else(|| ParseError::InvalidField {
        field: "review.state",
        value: raw.review.state.clone(),
    })?;

    Ok(Some(ReviewEvent {
        installation: InstallationId(raw.installation.id),
        repo: raw.repository.into_repo_id(),
        action,
        state,
        reviewer: raw.review.user.login,
        pr_number: PrNumber(raw.pull_request.number),
    }))
}

// ============================================================================
// check_run / check_suite events
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCheckRunPayload {
    action: String,
    check_run: RawCheck,
    repository: RawRepository,
    installation: RawInstallation,
}

#[derive(Debug, Deserialize)]
struct RawCheckSuitePayload {
    action: String,
    check_suite: RawCheck,
    repository: RawRepository,
    installation: RawInstallation,
}

/// The fields check runs and check suites share.
#[derive(Debug, Deserialize)]
struct RawCheck {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    app: Option<RawApp>,
    status: Option<String>,
    conclusion: Option<String>,
    head_sha: String,
    #[serde(default)]
    pull_requests: Vec<RawPrNumber>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    name: String,
}

fn parse_check_action(action: &str) -> Option<CheckAction> {
    match action {
        "created" => Some(CheckAction::Created),
        "requested" => Some(CheckAction::Requested),
        "rerequested" => Some(CheckAction::Rerequested),
        "requested_action" => Some(CheckAction::RequestedAction),
        "completed" => Some(CheckAction::Completed),
        _ => None,
    }
}

fn check_event(
    action: CheckAction,
    check: RawCheck,
    repository: RawRepository,
    installation: RawInstallation,
) -> Result<CheckEvent, ParseError> {
    let head_sha = parse_sha("head_sha", &check.head_sha)?;

    // A completed action without an explicit status still means completed
    let status = match (&check.status, action) {
        (Some(status), _) => CheckStatus::parse(status),
        (None, CheckAction::Completed) => CheckStatus::Completed,
        (None, _) => CheckStatus::Pending,
    };

    Ok(CheckEvent {
        installation: InstallationId(installation.id),
        repo: repository.into_repo_id(),
        action,
        name: check.name.or(check.app.map(|a| a.name)),
        status,
        conclusion: check.conclusion,
        head_sha,
        pull_requests: pr_numbers(check.pull_requests),
    })
}

fn parse_check_run(payload: &[u8]) -> Result<Option<CheckEvent>, ParseError> {
    let raw: RawCheckRunPayload = serde_json::from_slice(payload)?;
    let Some(action) = parse_check_action(&raw.action) else {
        return Ok(None);
    };
    check_event(action, raw.check_run, raw.repository, raw.installation).map(Some)
}

fn parse_check_suite(payload: &[u8]) -> Result<Option<CheckEvent>, ParseError> {
    let raw: RawCheckSuitePayload = serde_json::from_slice(payload)?;
    let Some(action) = parse_check_action(&raw.action) else {
        return Ok(None);
    };
    check_event(action, raw.check_suite, raw.repository, raw.installation).map(Some)
}

// ============================================================================
// status event (legacy Status API)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawStatusPayload {
    sha: String,
    state: String,
    context: String,
    repository: RawRepository,
    installation: RawInstallation,
}

fn parse_status(payload: &[u8]) -> Result<StatusEvent, ParseError> {
    let raw: RawStatusPayload = serde_json::from_slice(payload)?;

    Ok(StatusEvent {
        installation: InstallationId(raw.installation.id),
        repo: raw.repository.into_repo_id(),
        sha: parse_sha("sha", &raw.sha)?,
        context: raw.context,
        state: SignalState::parse(&raw.state),
    })
}

// ============================================================================
// pull_request event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    installation: RawInstallation,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    state: String,
    merged: Option<bool>,
    draft: Option<bool>,
    head: RawRef,
    base: RawRef,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    sha: String,
    #[serde(rename = "ref")]
    ref_name: String,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "closed" => PrAction::Closed,
        "edited" => PrAction::Edited,
        "synchronize" => PrAction::Synchronize,
        "reopened" => PrAction::Reopened,
        "converted_to_draft" => PrAction::ConvertedToDraft,
        "ready_for_review" => PrAction::ReadyForReview,
        // Other actions (assigned, labeled, etc.) are not relevant to us
        _ => return Ok(None),
    };

    let pr = raw.pull_request;
    let state = if pr.merged.unwrap_or(false) {
        PrState::Merged
    } else if pr.state == "open" {
        PrState::Open
    } else {
        PrState::Closed
    };

    Ok(Some(PullRequestEvent {
        installation: InstallationId(raw.installation.id),
        repo: raw.repository.into_repo_id(),
        action,
        pr_number: PrNumber(pr.number),
        state,
        is_draft: pr.draft.unwrap_or(false),
        base_branch: pr.base.ref_name,
        head_sha: parse_sha("pull_request.head.sha", &pr.head.sha)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "abc123def456abc123def456abc123def456abc1";

    // ========================================================================
    // Unit tests for each event type
    // ========================================================================

    #[test]
    fn parse_review_submitted() {
        let payload = r#"{
            "action": "submitted",
            "review": {
                "id": 1,
                "state": "approved",
                "body": "LGTM",
                "user": { "id": 100, "login": "alice" }
            },
            "pull_request": { "number": 42, "state": "open" },
            "repository": { "owner": { "login": "myorg" }, "name": "myrepo" },
            "installation": { "id": 555 }
        }"#;

        let event = parse_webhook("pull_request_review", payload.as_bytes())
            .unwrap()
            .expect("should parse");

        match event {
            Event::ReviewSubmitted(e) => {
                assert_eq!(e.installation, InstallationId(555));
                assert_eq!(e.repo, RepoId::new("myorg", "myrepo"));
                assert_eq!(e.action, ReviewAction::Submitted);
                assert_eq!(e.state, ReviewState::Approved);
                assert_eq!(e.reviewer, "alice");
                assert_eq!(e.pr_number, PrNumber(42));
            }
            other => panic!("expected ReviewSubmitted, got {:?}", other),
        }
    }

    #[test]
    fn parse_review_unknown_action_is_ignored() {
        let payload = r#"{
            "action": "something_new",
            "review": { "state": "approved", "user": { "login": "alice" } },
            "pull_request": { "number": 1 },
            "repository": { "owner": { "login": "o" }, "name": "r" },
            "installation": { "id": 1 }
        }"#;
        assert!(
            parse_webhook("pull_request_review", payload.as_bytes())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn parse_review_bad_state_is_error() {
        let payload = r#"{
            "action": "submitted",
            "review": { "state": "ecstatic", "user": { "login": "alice" } },
            "pull_request": { "number": 1 },
            "repository": { "owner": { "login": "o" }, "name": "r" },
            "installation": { "id": 1 }
        }"#;
        let err = parse_webhook("pull_request_review", payload.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidField {
                field: "review.state",
                ..
            }
        ));
    }

    #[test]
    fn parse_check_run_completed_with_prs() {
        let payload = format!(
            r#"{{
                "action": "completed",
                "check_run": {{
                    "name": "ci/test",
                    "status": "completed",
                    "conclusion": "success",
                    "head_sha": "{SHA}",
                    "pull_requests": [{{ "number": 3 }}, {{ "number": 5 }}, {{ "number": 3 }}]
                }},
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 9 }}
            }}"#
        );

        let event = parse_webhook("check_run", payload.as_bytes())
            .unwrap()
            .expect("should parse");

        match event {
            Event::CheckRunCompleted(e) => {
                assert_eq!(e.action, CheckAction::Completed);
                assert_eq!(e.status, CheckStatus::Completed);
                assert_eq!(e.conclusion.as_deref(), Some("success"));
                assert_eq!(e.name.as_deref(), Some("ci/test"));
                assert_eq!(e.head_sha.as_str(), SHA);
                assert_eq!(e.pull_requests, vec![PrNumber(3), PrNumber(5)]);
            }
            other => panic!("expected CheckRunCompleted, got {:?}", other),
        }
    }

    #[test]
    fn parse_check_suite_without_prs() {
        let payload = format!(
            r#"{{
                "action": "completed",
                "check_suite": {{
                    "status": "completed",
                    "conclusion": "failure",
                    "head_sha": "{SHA}",
                    "pull_requests": [],
                    "app": {{ "name": "GitHub Actions" }}
                }},
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 9 }}
            }}"#
        );

        let event = parse_webhook("check_suite", payload.as_bytes())
            .unwrap()
            .expect("should parse");

        match event {
            Event::CheckSuiteCompleted(e) => {
                assert!(e.pull_requests.is_empty());
                assert_eq!(e.name.as_deref(), Some("GitHub Actions"));
                assert_eq!(e.conclusion.as_deref(), Some("failure"));
            }
            other => panic!("expected CheckSuiteCompleted, got {:?}", other),
        }
    }

    #[test]
    fn parse_check_run_in_progress() {
        let payload = format!(
            r#"{{
                "action": "created",
                "check_run": {{
                    "status": "in_progress",
                    "conclusion": null,
                    "head_sha": "{SHA}"
                }},
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 9 }}
            }}"#
        );

        match parse_webhook("check_run", payload.as_bytes()).unwrap() {
            Some(Event::CheckRunCompleted(e)) => {
                assert_eq!(e.action, CheckAction::Created);
                assert_eq!(e.status, CheckStatus::InProgress);
                assert!(e.conclusion.is_none());
            }
            other => panic!("expected CheckRunCompleted, got {:?}", other),
        }
    }

    #[test]
    fn parse_status_event() {
        let payload = format!(
            r#"{{
                "id": 1,
                "sha": "{SHA}",
                "state": "success",
                "context": "ci/jenkins",
                "description": "Build passed",
                "target_url": null,
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 3 }}
            }}"#
        );

        match parse_webhook("status", payload.as_bytes()).unwrap() {
            Some(Event::ExternalStatusUpdated(e)) => {
                assert_eq!(e.installation, InstallationId(3));
                assert_eq!(e.context, "ci/jenkins");
                assert_eq!(e.state, SignalState::Success);
                assert_eq!(e.sha.as_str(), SHA);
            }
            other => panic!("expected ExternalStatusUpdated, got {:?}", other),
        }
    }

    #[test]
    fn parse_status_invalid_sha() {
        let payload = r#"{
            "sha": "not-a-sha",
            "state": "success",
            "context": "ci",
            "repository": { "owner": { "login": "o" }, "name": "r" },
            "installation": { "id": 3 }
        }"#;
        let err = parse_webhook("status", payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { field: "sha", .. }));
    }

    #[test]
    fn parse_pull_request_synchronize() {
        let payload = format!(
            r#"{{
                "action": "synchronize",
                "pull_request": {{
                    "number": 8,
                    "state": "open",
                    "merged": false,
                    "draft": true,
                    "head": {{ "sha": "{SHA}", "ref": "feature" }},
                    "base": {{ "sha": "{SHA}", "ref": "main" }},
                    "user": {{ "id": 1, "login": "bob" }}
                }},
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 4 }}
            }}"#
        );

        match parse_webhook("pull_request", payload.as_bytes()).unwrap() {
            Some(Event::PullRequestChanged(e)) => {
                assert_eq!(e.action, PrAction::Synchronize);
                assert_eq!(e.pr_number, PrNumber(8));
                assert_eq!(e.state, PrState::Open);
                assert!(e.is_draft);
                assert_eq!(e.base_branch, "main");
            }
            other => panic!("expected PullRequestChanged, got {:?}", other),
        }
    }

    #[test]
    fn parse_pull_request_labeled_is_ignored() {
        let payload = format!(
            r#"{{
                "action": "labeled",
                "pull_request": {{
                    "number": 8,
                    "state": "open",
                    "head": {{ "sha": "{SHA}", "ref": "feature" }},
                    "base": {{ "sha": "{SHA}", "ref": "main" }}
                }},
                "repository": {{ "owner": {{ "login": "o" }}, "name": "r" }},
                "installation": {{ "id": 4 }}
            }}"#
        );
        assert!(parse_webhook("pull_request", payload.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        assert!(parse_webhook("ping", b"{}").unwrap().is_none());
        assert!(parse_webhook("issue_comment", b"not even json").unwrap().is_none());
    }

    #[test]
    fn missing_installation_is_error() {
        let payload = r#"{
            "action": "submitted",
            "review": { "state": "approved", "user": { "login": "alice" } },
            "pull_request": { "number": 1 },
            "repository": { "owner": { "login": "o" }, "name": "r" }
        }"#;
        assert!(matches!(
            parse_webhook("pull_request_review", payload.as_bytes()),
            Err(ParseError::JsonError(_))
        ));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            parse_webhook("status", b"{ not json"),
            Err(ParseError::JsonError(_))
        ));
    }
}
