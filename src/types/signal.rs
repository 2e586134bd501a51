//! CI signal vocabulary shared by commit statuses and check runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of one CI context after merging both signal sources.
///
/// Commit statuses report `pending`/`success`/`failure`/`error`; completed
/// check runs report their conclusion. Both vocabularies fold into this one
/// type. Anything unrecognized is kept verbatim in `Other` so it still shows
/// up in logs and still fails the `success` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalState {
    Success,
    Pending,
    Failure,
    Error,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    Other(String),
}

impl SignalState {
    /// Matches GitHub's lowercase spellings exactly. Any other casing lands
    /// in `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => SignalState::Success,
            "pending" => SignalState::Pending,
            "failure" => SignalState::Failure,
            "error" => SignalState::Error,
            "neutral" => SignalState::Neutral,
            "cancelled" => SignalState::Cancelled,
            "skipped" => SignalState::Skipped,
            "timed_out" => SignalState::TimedOut,
            "action_required" => SignalState::ActionRequired,
            "stale" => SignalState::Stale,
            _ => SignalState::Other(s.to_string()),
        }
    }

    /// Only an exact `success` satisfies a required context.
    pub fn is_success(&self) -> bool {
        matches!(self, SignalState::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SignalState::Success => "success",
            SignalState::Pending => "pending",
            SignalState::Failure => "failure",
            SignalState::Error => "error",
            SignalState::Neutral => "neutral",
            SignalState::Cancelled => "cancelled",
            SignalState::Skipped => "skipped",
            SignalState::TimedOut => "timed_out",
            SignalState::ActionRequired => "action_required",
            SignalState::Stale => "stale",
            SignalState::Other(s) => s,
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a check run or check suite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
    Other(String),
}

impl CheckStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => CheckStatus::Queued,
            "in_progress" => CheckStatus::InProgress,
            "completed" => CheckStatus::Completed,
            "waiting" => CheckStatus::Waiting,
            "requested" => CheckStatus::Requested,
            "pending" => CheckStatus::Pending,
            _ => CheckStatus::Other(s.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CheckStatus::Completed)
    }
}
