//! GitHub API effect types.
//!
//! These types describe the GitHub API operations the evaluator needs as data,
//! without executing them. An interpreter (see [`super::GitHubInterpreter`])
//! executes them against the real API or a test double.

use serde::{Deserialize, Serialize};

use crate::types::{CheckStatus, PrNumber, PrState, ReviewState, Sha, SignalState};

/// Merge method passed to the merge endpoint.
///
/// When none is configured the platform default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    /// Returns the GitHub API string for this merge method.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Some(MergeMethod::Merge),
            "squash" => Some(MergeMethod::Squash),
            "rebase" => Some(MergeMethod::Rebase),
            _ => None,
        }
    }
}

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed for one
/// installation and repository, so effects don't include either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── PR Queries ───────────────────────────────────────────────────────────
    /// Fetch a single PR by number.
    GetPr { pr: PrNumber },

    /// List the open PRs whose head is the given commit.
    ListPrsForCommit { sha: Sha },

    // ─── Policy ───────────────────────────────────────────────────────────────
    /// Get branch protection settings for a branch.
    GetBranchProtection { branch: String },

    /// List every review submitted on a PR, oldest first.
    ListReviews { pr: PrNumber },

    // ─── Signals ──────────────────────────────────────────────────────────────
    /// Get the legacy combined commit status for a commit.
    GetCombinedStatus { sha: Sha },

    /// List the check runs reported for a commit.
    ListCheckRuns { sha: Sha },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Merge a PR (or hand it to the platform's merge queue).
    ///
    /// There is deliberately no head-SHA guard: a concurrent evaluation may
    /// already have merged the PR and a second request must stay harmless.
    MergePr {
        pr: PrNumber,
        method: Option<MergeMethod>,
    },
}

impl GitHubEffect {
    /// Short operation name for log fields.
    pub fn operation(&self) -> &'static str {
        match self {
            GitHubEffect::GetPr { .. } => "get_pr",
            GitHubEffect::ListPrsForCommit { .. } => "list_prs_for_commit",
            GitHubEffect::GetBranchProtection { .. } => "get_branch_protection",
            GitHubEffect::ListReviews { .. } => "list_reviews",
            GitHubEffect::GetCombinedStatus { .. } => "get_combined_status",
            GitHubEffect::ListCheckRuns { .. } => "list_check_runs",
            GitHubEffect::MergePr { .. } => "merge_pr",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    /// The PR number.
    pub number: PrNumber,
    /// The current head SHA.
    pub head_sha: Sha,
    /// The head branch name.
    pub head_ref: String,
    /// The base branch name.
    pub base_ref: String,
    /// Open, closed or merged.
    pub state: PrState,
    /// Whether the PR is a draft.
    pub is_draft: bool,
}

/// Branch protection settings relevant to merge readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtectionData {
    /// Required approving review count (0 if reviews are not required).
    pub required_approving_review_count: u32,
    /// Required status check context names, in the order GitHub reports them.
    pub required_status_checks: Vec<String>,
}

/// One submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewData {
    /// Login of the reviewer.
    pub reviewer: String,
    pub state: ReviewState,
}

/// One entry of the legacy combined status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatusData {
    pub context: String,
    pub state: SignalState,
}

/// One check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunData {
    pub name: String,
    pub status: CheckStatus,
    /// Only meaningful once `status` is completed.
    pub conclusion: Option<String>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `ListPrsForCommit`.
    PrList(Vec<PrData>),

    /// Response to `GetBranchProtection` when protection rules exist.
    BranchProtection(BranchProtectionData),

    /// Response to `GetBranchProtection` when the API answered 404.
    ///
    /// This is the "no protection configured" case. Permission errors are not
    /// folded into it; they surface as interpreter errors.
    BranchProtectionNotFound,

    /// Response to `ListReviews`.
    Reviews(Vec<ReviewData>),

    /// Response to `GetCombinedStatus`.
    CombinedStatus(Vec<CommitStatusData>),

    /// Response to `ListCheckRuns`.
    CheckRuns(Vec<CheckRunData>),

    /// Response to `MergePr` when the API reports the PR merged.
    Merged {
        /// The SHA of the resulting commit on the base branch.
        sha: Sha,
    },

    /// Response to `MergePr` when the API accepted the request but did not
    /// merge (for example because the PR was queued instead).
    NotMerged { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_method_parse() {
        assert_eq!(MergeMethod::parse("squash"), Some(MergeMethod::Squash));
        assert_eq!(MergeMethod::parse(" Rebase "), Some(MergeMethod::Rebase));
        assert_eq!(MergeMethod::parse("MERGE"), Some(MergeMethod::Merge));
        assert_eq!(MergeMethod::parse("fast-forward"), None);
    }

    #[test]
    fn effect_serializes_with_type_tag() {
        let effect = GitHubEffect::GetBranchProtection {
            branch: "main".to_string(),
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "get_branch_protection");
        assert_eq!(json["branch"], "main");
    }

    #[test]
    fn operation_names_are_distinct() {
        let sha = Sha::parse("a".repeat(40)).unwrap();
        let effects = [
            GitHubEffect::GetPr { pr: PrNumber(1) },
            GitHubEffect::ListPrsForCommit { sha: sha.clone() },
            GitHubEffect::GetBranchProtection {
                branch: "main".to_string(),
            },
            GitHubEffect::ListReviews { pr: PrNumber(1) },
            GitHubEffect::GetCombinedStatus { sha: sha.clone() },
            GitHubEffect::ListCheckRuns { sha },
            GitHubEffect::MergePr {
                pr: PrNumber(1),
                method: None,
            },
        ];
        let names: std::collections::HashSet<_> =
            effects.iter().map(GitHubEffect::operation).collect();
        assert_eq!(names.len(), effects.len());
    }
}
