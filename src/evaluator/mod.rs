//! Merge-readiness evaluation.
//!
//! [`evaluate`] fetches a pull request's current state, its base branch's
//! protection policy, its reviews and its CI signals, and decides whether the
//! PR may be merged now. Nothing is cached between evaluations: every call
//! re-derives the decision from the API.
//!
//! # Decision order
//!
//! 1. Draft PRs are skipped, then PRs that are not open.
//! 2. No branch protection (404) means there is nothing to enforce.
//! 3. Required approvals are counted from the review list.
//! 4. Required CI contexts are checked against statuses and check runs.

mod approvals;
mod signals;

use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::effects::{BranchProtectionData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::types::{PullRequestRef, SignalState};

pub use approvals::count_approvals;
pub use signals::{SignalMap, build_signal_map, check_required_contexts};

/// The outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Every configured requirement is met.
    Proceed,
    /// The PR must not be merged now.
    Skip(SkipReason),
}

/// Why a PR was not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IsDraft,
    NotOpen,
    InsufficientApprovals { have: u32, need: u32 },
    MissingRequiredCheck { context: String },
    FailingRequiredCheck { context: String, state: SignalState },
    /// Branch protection could not be read for a reason other than 404.
    PolicyFetchFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IsDraft => write!(f, "PR is a draft"),
            SkipReason::NotOpen => write!(f, "PR is not open"),
            SkipReason::InsufficientApprovals { have, need } => {
                write!(f, "{} of {} required approvals", have, need)
            }
            SkipReason::MissingRequiredCheck { context } => {
                write!(f, "required check {} has not reported", context)
            }
            SkipReason::FailingRequiredCheck { context, state } => {
                write!(f, "required check {} is {}", context, state)
            }
            SkipReason::PolicyFetchFailed => write!(f, "branch protection could not be read"),
        }
    }
}

/// Errors that abort an evaluation. The PR is left untouched.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A GitHub API call failed.
    #[error("{operation} failed: {message}")]
    GitHub {
        operation: &'static str,
        message: String,
    },

    /// The interpreter answered an effect with the wrong response variant.
    #[error("unexpected response to {operation}: {response}")]
    UnexpectedResponse {
        operation: &'static str,
        response: String,
    },
}

/// Runs one effect, tagging failures with the operation name.
async fn run<G>(github: &G, effect: GitHubEffect) -> Result<GitHubResponse, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let operation = effect.operation();
    github
        .interpret(effect)
        .await
        .map_err(|e| EvaluationError::GitHub {
            operation,
            message: e.to_string(),
        })
}

fn unexpected(operation: &'static str, response: GitHubResponse) -> EvaluationError {
    EvaluationError::UnexpectedResponse {
        operation,
        response: format!("{:?}", response),
    }
}

/// Decides whether `pr_ref` may be merged now.
///
/// `github` must be scoped to `pr_ref.repo`; the reference itself is only used
/// to name the PR and for log context.
#[instrument(skip_all, fields(pr = %pr_ref))]
pub async fn evaluate<G>(github: &G, pr_ref: &PullRequestRef) -> Result<Decision, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let pr = match run(github, GitHubEffect::GetPr { pr: pr_ref.number }).await? {
        GitHubResponse::Pr(pr) => pr,
        other => return Err(unexpected("get_pr", other)),
    };

    if pr.is_draft {
        return Ok(skip(SkipReason::IsDraft));
    }
    if !pr.state.is_open() {
        return Ok(skip(SkipReason::NotOpen));
    }

    let policy = match fetch_policy(github, &pr).await? {
        PolicyLookup::Found(policy) => policy,
        PolicyLookup::NotConfigured => {
            debug!(base = %pr.base_ref, "No branch protection, nothing to enforce");
            return Ok(Decision::Proceed);
        }
        PolicyLookup::Failed => return Ok(skip(SkipReason::PolicyFetchFailed)),
    };

    let need = policy.required_approving_review_count;
    if need > 0 {
        let reviews = match run(github, GitHubEffect::ListReviews { pr: pr.number }).await? {
            GitHubResponse::Reviews(reviews) => reviews,
            other => return Err(unexpected("list_reviews", other)),
        };
        let have = count_approvals(&reviews);
        if have < need {
            return Ok(skip(SkipReason::InsufficientApprovals { have, need }));
        }
    }

    if !policy.required_status_checks.is_empty() {
        let signals = fetch_signals(github, &pr).await?;
        if let Some(reason) = check_required_contexts(&signals, &policy.required_status_checks) {
            return Ok(skip(reason));
        }
    }

    Ok(Decision::Proceed)
}

fn skip(reason: SkipReason) -> Decision {
    debug!(%reason, "Not merging");
    Decision::Skip(reason)
}

enum PolicyLookup {
    Found(BranchProtectionData),
    NotConfigured,
    Failed,
}

/// Reads the base branch's protection. Only a 404 means "not configured";
/// every other failure is logged and reported as `Failed`.
async fn fetch_policy<G>(github: &G, pr: &PrData) -> Result<PolicyLookup, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let effect = GitHubEffect::GetBranchProtection {
        branch: pr.base_ref.clone(),
    };

    match run(github, effect).await {
        Ok(GitHubResponse::BranchProtection(policy)) => Ok(PolicyLookup::Found(policy)),
        Ok(GitHubResponse::BranchProtectionNotFound) => Ok(PolicyLookup::NotConfigured),
        Ok(other) => Err(unexpected("get_branch_protection", other)),
        Err(e) => {
            warn!(base = %pr.base_ref, error = %e, "Failed to fetch branch protection");
            Ok(PolicyLookup::Failed)
        }
    }
}

async fn fetch_signals<G>(github: &G, pr: &PrData) -> Result<SignalMap, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let sha = pr.head_sha.clone();

    let statuses = match run(github, GitHubEffect::GetCombinedStatus { sha: sha.clone() }).await? {
        GitHubResponse::CombinedStatus(statuses) => statuses,
        other => return Err(unexpected("get_combined_status", other)),
    };
    let check_runs = match run(github, GitHubEffect::ListCheckRuns { sha }).await? {
        GitHubResponse::CheckRuns(runs) => runs,
        other => return Err(unexpected("list_check_runs", other)),
    };

    Ok(build_signal_map(&statuses, &check_runs))
}
