//! GitHub webhook event types.
//!
//! This module defines typed representations of the GitHub webhook events
//! that can change a pull request's merge readiness. Each event type carries
//! the installation that delivered it, so API calls made on its behalf use
//! that installation's credentials.
//!
//! # Event Types
//!
//! - `pull_request_review` - Review submitted, dismissed or edited
//! - `check_run` - A single check run changed
//! - `check_suite` - A check suite changed
//! - `status` - Legacy commit status updated
//! - `pull_request` - PR lifecycle (opened, synchronize, ready_for_review, ...)

use serde::{Deserialize, Serialize};

use crate::types::{CheckStatus, InstallationId, PrNumber, PrState, RepoId, ReviewState, Sha, SignalState};

/// A parsed GitHub webhook event.
///
/// This enum contains only the event types the bot cares about. Unknown or
/// irrelevant events are represented by returning `None` from the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A review was submitted, dismissed or edited.
    ReviewSubmitted(ReviewEvent),

    /// A check run changed (Checks API).
    CheckRunCompleted(CheckEvent),

    /// A check suite changed (Checks API).
    CheckSuiteCompleted(CheckEvent),

    /// A commit status was updated (legacy Status API).
    ///
    /// Some CI systems still use the Status API instead of Checks.
    ExternalStatusUpdated(StatusEvent),

    /// A pull request changed.
    PullRequestChanged(PullRequestEvent),
}

impl Event {
    /// Returns the repository this event belongs to.
    pub fn repo(&self) -> &RepoId {
        match self {
            Event::ReviewSubmitted(e) => &e.repo,
            Event::CheckRunCompleted(e) | Event::CheckSuiteCompleted(e) => &e.repo,
            Event::ExternalStatusUpdated(e) => &e.repo,
            Event::PullRequestChanged(e) => &e.repo,
        }
    }

    /// Returns the installation that delivered this event.
    pub fn installation(&self) -> InstallationId {
        match self {
            Event::ReviewSubmitted(e) => e.installation,
            Event::CheckRunCompleted(e) | Event::CheckSuiteCompleted(e) => e.installation,
            Event::ExternalStatusUpdated(e) => e.installation,
            Event::PullRequestChanged(e) => e.installation,
        }
    }

    /// Short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ReviewSubmitted(_) => "review_submitted",
            Event::CheckRunCompleted(_) => "check_run",
            Event::CheckSuiteCompleted(_) => "check_suite",
            Event::ExternalStatusUpdated(_) => "status",
            Event::PullRequestChanged(_) => "pull_request",
        }
    }
}

/// Action for pull request review events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Review was submitted.
    Submitted,
    /// Review was dismissed.
    Dismissed,
    /// Review was edited.
    Edited,
}

/// A pull request review event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub installation: InstallationId,
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: ReviewAction,

    /// The state of the review.
    pub state: ReviewState,

    /// The reviewer's login name.
    pub reviewer: String,

    /// The PR number.
    pub pr_number: PrNumber,
}

/// Action for check run and check suite events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAction {
    Created,
    Requested,
    Rerequested,
    RequestedAction,
    Completed,
}

/// A check run or check suite event.
///
/// Both event types carry the same information for our purposes: the check's
/// own lifecycle status, its head commit and the PRs GitHub associated with
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEvent {
    pub installation: InstallationId,
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: CheckAction,

    /// Name of the check run, or of the app that owns the suite.
    pub name: Option<String>,

    /// The check's own lifecycle status.
    pub status: CheckStatus,

    /// The conclusion (only set once completed).
    pub conclusion: Option<String>,

    /// The head SHA this check ran against.
    pub head_sha: Sha,

    /// Pull request numbers associated with this check.
    ///
    /// Empty when the check was reported without PR associations (for example
    /// by some external CI systems, or for PRs from forks).
    pub pull_requests: Vec<PrNumber>,
}

/// A commit status event (legacy Status API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub installation: InstallationId,
    pub repo: RepoId,

    /// The commit SHA this status is for.
    pub sha: Sha,

    /// The context (name) of the status check.
    ///
    /// E.g., "ci/jenkins", "codecov/patch".
    pub context: String,

    /// The state of the status.
    pub state: SignalState,
}

/// Action performed on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR was closed (merged or not).
    Closed,
    /// PR was edited (title, body, or base branch changed).
    Edited,
    /// PR head was updated (new commits pushed).
    Synchronize,
    /// PR was reopened.
    Reopened,
    /// PR was converted to draft.
    ConvertedToDraft,
    /// PR was marked ready for review.
    ReadyForReview,
}

/// A pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub installation: InstallationId,
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub pr_number: PrNumber,

    /// The PR state at delivery time.
    pub state: PrState,

    /// Whether the PR is a draft.
    pub is_draft: bool,

    /// The base branch name.
    pub base_branch: String,

    /// The current head SHA of the PR branch.
    pub head_sha: Sha,
}
