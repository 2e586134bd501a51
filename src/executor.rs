//! Merge execution.
//!
//! The executor issues one merge request and reports what the API said. It
//! does not re-check readiness, guard against duplicate submissions or retry.
//! A second request for an already-merged PR is rejected by the API and
//! logged like any other failure.

use std::fmt;

use tracing::{info, instrument};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, MergeMethod};
use crate::evaluator::EvaluationError;
use crate::types::{PullRequestRef, Sha};

/// What the merge endpoint reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { sha: Sha },
    /// The request was accepted without merging, e.g. the PR was queued.
    NotMerged { message: String },
}

/// Requests a merge of `pr_ref`.
///
/// `method` is passed through as-is; `None` leaves the choice to the
/// repository's default.
#[instrument(skip_all, fields(pr = %pr_ref, method = ?method))]
pub async fn execute_merge<G>(
    github: &G,
    pr_ref: &PullRequestRef,
    method: Option<MergeMethod>,
) -> Result<MergeOutcome, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    let effect = GitHubEffect::MergePr {
        pr: pr_ref.number,
        method,
    };
    let operation = effect.operation();

    let response = github
        .interpret(effect)
        .await
        .map_err(|e| EvaluationError::GitHub {
            operation,
            message: e.to_string(),
        })?;

    let outcome = match response {
        GitHubResponse::Merged { sha } => MergeOutcome::Merged { sha },
        GitHubResponse::NotMerged { message } => MergeOutcome::NotMerged { message },
        other => {
            return Err(EvaluationError::UnexpectedResponse {
                operation,
                response: format!("{:?}", other),
            });
        }
    };

    info!(outcome = ?outcome, "merge requested");
    Ok(outcome)
}
