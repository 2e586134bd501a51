//! Pull request and review state.

use serde::{Deserialize, Serialize};

/// The state of a pull request as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    /// The PR is open.
    Open,

    /// The PR was closed without merging.
    Closed,

    /// The PR was merged.
    Merged,
}

impl PrState {
    /// Returns true if the PR is open.
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }
}

/// State of a pull request review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    /// Review approved the PR.
    Approved,
    /// Review requested changes.
    ChangesRequested,
    /// Review was just a comment (no approval/rejection).
    Commented,
    /// Review was dismissed.
    Dismissed,
    /// Review is pending (not submitted yet).
    Pending,
}

impl ReviewState {
    /// Parses GitHub's review state vocabulary, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "APPROVED" => Some(ReviewState::Approved),
            "CHANGES_REQUESTED" => Some(ReviewState::ChangesRequested),
            "COMMENTED" => Some(ReviewState::Commented),
            "DISMISSED" => Some(ReviewState::Dismissed),
            "PENDING" => Some(ReviewState::Pending),
            _ => None,
        }
    }

    /// Returns true if a review in this state replaces the reviewer's
    /// previous verdict.
    ///
    /// Comments and pending drafts leave an earlier approval or change request
    /// in force, matching how GitHub itself tallies approvals.
    pub fn is_verdict(&self) -> bool {
        matches!(
            self,
            ReviewState::Approved | ReviewState::ChangesRequested | ReviewState::Dismissed
        )
    }
}
