//! GitHub effect interpreter using octocrab.
//!
//! This module implements the `GitHubInterpreter` trait, executing GitHub effects
//! against the real GitHub API via octocrab.
//!
//! Key implementation details:
//! - REST endpoints are deserialized into private `Raw*` structs and converted
//!   by pure functions, so the conversions are testable without a server
//! - List endpoints are paginated 100 items at a time until a short page
//! - A 404 on branch protection is a response, not an error
//! - No retries: a failed call ends the evaluation and the next event retries

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::effects::{
    BranchProtectionData, CheckRunData, CommitStatusData, GitHubEffect, GitHubInterpreter,
    GitHubResponse, MergeMethod, PrData, ReviewData,
};
use crate::types::{CheckStatus, PrNumber, PrState, ReviewState, Sha, SignalState};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// Commit message passed with every merge request.
pub const MERGE_COMMIT_MESSAGE: &str = "Automated merge request";

const PER_PAGE: usize = 100;

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::ListPrsForCommit { sha } => list_prs_for_commit(client, &sha).await,
        GitHubEffect::GetBranchProtection { branch } => get_branch_protection(client, branch).await,
        GitHubEffect::ListReviews { pr } => list_reviews(client, pr).await,
        GitHubEffect::GetCombinedStatus { sha } => get_combined_status(client, &sha).await,
        GitHubEffect::ListCheckRuns { sha } => list_check_runs(client, &sha).await,
        GitHubEffect::MergePr { pr, method } => merge_pr(client, pr, method).await,
    }
}

// ─── Pagination ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageParams {
    per_page: usize,
    page: u32,
}

/// Fetches every page of a list endpoint.
///
/// `items` extracts the list from one page's body; a page shorter than
/// `PER_PAGE` ends the walk.
async fn get_all_pages<R, T, F>(
    client: &OctocrabClient,
    path: &str,
    items: F,
) -> Result<Vec<T>, GitHubApiError>
where
    R: DeserializeOwned,
    F: Fn(R) -> Vec<T>,
{
    let mut page = 1u32;
    let mut all = Vec::new();

    loop {
        let params = PageParams {
            per_page: PER_PAGE,
            page,
        };
        let body: R = client
            .inner()
            .get(path, Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let batch = items(body);
        let is_last_page = batch.len() < PER_PAGE;
        all.extend(batch);

        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(all)
}

// ─── PR Operations ────────────────────────────────────────────────────────────

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let state = if pull.merged_at.is_some() {
        PrState::Merged
    } else if pull.state == Some(octocrab::models::IssueState::Closed) {
        PrState::Closed
    } else {
        PrState::Open
    };

    let head_sha = Sha::parse(&pull.head.sha).map_err(|e| {
        GitHubApiError::permanent_without_source(format!("Invalid head SHA: {}", e))
    })?;

    Ok(GitHubResponse::Pr(PrData {
        number: pr,
        head_sha,
        head_ref: pull.head.ref_field,
        base_ref: pull.base.ref_field,
        state,
        is_draft: pull.draft.unwrap_or(false),
    }))
}

async fn list_prs_for_commit(
    client: &OctocrabClient,
    sha: &Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let path = client.repo_path(&format!("commits/{}/pulls", sha));
    let pulls: Vec<RawPull> = get_all_pages(client, &path, |page: Vec<RawPull>| page).await?;

    let prs = pulls
        .into_iter()
        .filter_map(|raw| {
            let number = raw.number;
            match pr_from_raw(raw) {
                Ok(pr) => Some(pr),
                Err(e) => {
                    tracing::warn!(pr = number, error = %e, "Skipping PR with invalid SHA");
                    None
                }
            }
        })
        .filter(|pr| pr.state.is_open())
        .collect();

    Ok(GitHubResponse::PrList(prs))
}

#[derive(Debug, Deserialize)]
struct RawPull {
    number: u64,
    state: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    merged_at: Option<String>,
    head: RawBranchRef,
    base: RawBranchRef,
}

#[derive(Debug, Deserialize)]
struct RawBranchRef {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    sha: String,
}

fn pr_from_raw(raw: RawPull) -> Result<PrData, crate::types::InvalidSha> {
    let state = if raw.merged_at.is_some() {
        PrState::Merged
    } else if raw.state.eq_ignore_ascii_case("open") {
        PrState::Open
    } else {
        PrState::Closed
    };

    Ok(PrData {
        number: PrNumber(raw.number),
        head_sha: Sha::parse(&raw.head.sha)?,
        head_ref: raw.head.ref_field,
        base_ref: raw.base.ref_field,
        state,
        is_draft: raw.draft,
    })
}

// ─── Policy ───────────────────────────────────────────────────────────────────

async fn get_branch_protection(
    client: &OctocrabClient,
    branch: String,
) -> Result<GitHubResponse, GitHubApiError> {
    // URL-encode the branch name to handle special characters like '/'
    // e.g., "release/1.x" -> "release%2F1.x"
    let encoded_branch = urlencoding::encode(&branch);
    let path = client.repo_path(&format!("branches/{}/protection", encoded_branch));

    let result: Result<RawBranchProtection, _> = client.inner().get(&path, None::<&()>).await;

    match result {
        Ok(protection) => Ok(GitHubResponse::BranchProtection(policy_from_raw(
            protection,
        ))),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                tracing::debug!(branch = %branch, "No branch protection configured");
                Ok(GitHubResponse::BranchProtectionNotFound)
            } else {
                Err(err)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawBranchProtection {
    #[serde(default)]
    required_pull_request_reviews: Option<RawRequiredReviews>,
    #[serde(default)]
    required_status_checks: Option<RawRequiredStatusChecks>,
}

#[derive(Debug, Deserialize)]
struct RawRequiredReviews {
    #[serde(default)]
    required_approving_review_count: u32,
}

#[derive(Debug, Deserialize)]
struct RawRequiredStatusChecks {
    /// Legacy status check contexts (array of strings)
    #[serde(default)]
    contexts: Vec<String>,
    /// Modern status checks with app_id (GitHub Apps)
    #[serde(default)]
    checks: Vec<RawRequiredCheck>,
}

#[derive(Debug, Deserialize)]
struct RawRequiredCheck {
    context: String,
}

/// Combines legacy `contexts` with modern `checks` into one ordered,
/// duplicate-free list of required context names.
fn policy_from_raw(raw: RawBranchProtection) -> BranchProtectionData {
    let required_approving_review_count = raw
        .required_pull_request_reviews
        .map(|r| r.required_approving_review_count)
        .unwrap_or(0);

    let mut required_status_checks: Vec<String> = Vec::new();
    if let Some(checks_config) = raw.required_status_checks {
        let names = checks_config
            .contexts
            .into_iter()
            .chain(checks_config.checks.into_iter().map(|c| c.context));
        for name in names {
            if !required_status_checks.contains(&name) {
                required_status_checks.push(name);
            }
        }
    }

    BranchProtectionData {
        required_approving_review_count,
        required_status_checks,
    }
}

async fn list_reviews(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let path = client.repo_path(&format!("pulls/{}/reviews", pr.0));
    let raw: Vec<RawReview> = get_all_pages(client, &path, |page: Vec<RawReview>| page).await?;
    Ok(GitHubResponse::Reviews(reviews_from_raw(raw)))
}

#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(default)]
    user: Option<RawUser>,
    state: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

/// Drops reviews from deleted accounts and states we don't recognize.
fn reviews_from_raw(raw: Vec<RawReview>) -> Vec<ReviewData> {
    raw.into_iter()
        .filter_map(|review| {
            let state = match ReviewState::parse(&review.state) {
                Some(state) => state,
                None => {
                    tracing::debug!(state = %review.state, "Ignoring review with unknown state");
                    return None;
                }
            };
            let reviewer = review.user?.login;
            Some(ReviewData { reviewer, state })
        })
        .collect()
}

// ─── Signals ──────────────────────────────────────────────────────────────────

async fn get_combined_status(
    client: &OctocrabClient,
    sha: &Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let path = client.repo_path(&format!("commits/{}/status", sha));
    let statuses = get_all_pages(client, &path, |page: RawCombinedStatus| page.statuses).await?;

    Ok(GitHubResponse::CombinedStatus(
        statuses
            .into_iter()
            .map(|s| CommitStatusData {
                state: SignalState::parse(&s.state),
                context: s.context,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct RawCombinedStatus {
    #[serde(default)]
    statuses: Vec<RawStatus>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    context: String,
    state: String,
}

async fn list_check_runs(
    client: &OctocrabClient,
    sha: &Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let path = client.repo_path(&format!("commits/{}/check-runs", sha));
    let runs = get_all_pages(client, &path, |page: RawCheckRunList| page.check_runs).await?;

    Ok(GitHubResponse::CheckRuns(
        runs.into_iter()
            .map(|r| CheckRunData {
                name: r.name,
                status: CheckStatus::parse(&r.status),
                conclusion: r.conclusion,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct RawCheckRunList {
    #[serde(default)]
    check_runs: Vec<RawCheckRun>,
}

#[derive(Debug, Deserialize)]
struct RawCheckRun {
    name: String,
    status: String,
    #[serde(default)]
    conclusion: Option<String>,
}

// ─── Merge ────────────────────────────────────────────────────────────────────

async fn merge_pr(
    client: &OctocrabClient,
    pr: PrNumber,
    method: Option<MergeMethod>,
) -> Result<GitHubResponse, GitHubApiError> {
    let path = client.repo_path(&format!("pulls/{}/merge", pr.0));
    let request = MergeRequest::new(method);

    let response: MergeResponse = client
        .inner()
        .put(&path, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    merge_response_to_effect_response(response)
}

/// Body of the merge call. No `sha` field: the merge is not guarded on the
/// head commit.
#[derive(Debug, Serialize)]
struct MergeRequest {
    commit_message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_method: Option<&'static str>,
}

impl MergeRequest {
    fn new(method: Option<MergeMethod>) -> Self {
        Self {
            commit_message: MERGE_COMMIT_MESSAGE,
            merge_method: method.map(|m| m.as_api_str()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    sha: Option<String>,
    merged: bool,
    #[serde(default)]
    message: Option<String>,
}

fn merge_response_to_effect_response(
    response: MergeResponse,
) -> Result<GitHubResponse, GitHubApiError> {
    if !response.merged {
        return Ok(GitHubResponse::NotMerged {
            message: response
                .message
                .unwrap_or_else(|| "unknown reason".to_string()),
        });
    }

    let raw_sha = response.sha.ok_or_else(|| {
        GitHubApiError::permanent_without_source("Merge response is missing the commit SHA")
    })?;
    let sha = Sha::parse(&raw_sha).map_err(|e| {
        GitHubApiError::permanent_without_source(format!(
            "Invalid merge commit SHA in response: {}",
            e
        ))
    })?;
    Ok(GitHubResponse::Merged { sha })
}
