//! Shared test fixtures, a scripted GitHub double, and arbitrary generators
//! for property-based testing.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use crate::effects::{
    BranchProtectionData, CheckRunData, CommitStatusData, GitHubEffect, GitHubInterpreter,
    GitHubResponse, PrData, ReviewData,
};
use crate::types::{
    CheckStatus, PrNumber, PrState, PullRequestRef, RepoId, ReviewState, Sha, SignalState,
};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn repo() -> RepoId {
    RepoId::new("octo", "widgets")
}

pub fn pr_ref(n: u64) -> PullRequestRef {
    PullRequestRef::new(repo(), PrNumber(n))
}

/// An open, non-draft PR against `main` whose head SHA encodes its number.
pub fn open_pr(n: u64) -> PrData {
    PrData {
        number: PrNumber(n),
        head_sha: Sha::parse(format!("{:040x}", n)).unwrap(),
        head_ref: format!("feature-{}", n),
        base_ref: "main".to_string(),
        state: PrState::Open,
        is_draft: false,
    }
}

pub fn review(reviewer: &str, state: ReviewState) -> ReviewData {
    ReviewData {
        reviewer: reviewer.to_string(),
        state,
    }
}

pub fn status(context: &str, state: SignalState) -> CommitStatusData {
    CommitStatusData {
        context: context.to_string(),
        state,
    }
}

pub fn check_run(name: &str, status: CheckStatus, conclusion: Option<&str>) -> CheckRunData {
    CheckRunData {
        name: name.to_string(),
        status,
        conclusion: conclusion.map(String::from),
    }
}

// ─── Scripted GitHub ──────────────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    prs: HashMap<PrNumber, PrData>,
    protection: Option<BranchProtectionData>,
    reviews: Vec<ReviewData>,
    statuses: Vec<CommitStatusData>,
    check_runs: Vec<CheckRunData>,
    merge_response: Option<GitHubResponse>,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    issued: Vec<GitHubEffect>,
}

/// A GitHub double that answers from scripted repository state and records
/// every effect it is asked to run.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect `issued()` on another.
///
/// - `ListPrsForCommit` answers with the open PRs whose head is the commit.
/// - With no protection configured, `GetBranchProtection` answers 404.
/// - Reviews and signals apply to every PR.
#[derive(Clone, Default)]
pub struct MockGitHub {
    state: Arc<Mutex<MockState>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_pr(self, pr: PrData) -> Self {
        self.edit(|s| {
            s.prs.insert(pr.number, pr);
        })
    }

    pub fn with_protection(self, protection: BranchProtectionData) -> Self {
        self.edit(|s| s.protection = Some(protection))
    }

    pub fn with_reviews(self, reviews: Vec<ReviewData>) -> Self {
        self.edit(|s| s.reviews = reviews)
    }

    pub fn with_statuses(self, statuses: Vec<CommitStatusData>) -> Self {
        self.edit(|s| s.statuses = statuses)
    }

    pub fn with_check_runs(self, check_runs: Vec<CheckRunData>) -> Self {
        self.edit(|s| s.check_runs = check_runs)
    }

    pub fn with_merge_response(self, response: GitHubResponse) -> Self {
        self.edit(|s| s.merge_response = Some(response))
    }

    /// Makes every effect with this operation name fail.
    pub fn failing(self, operation: &'static str) -> Self {
        self.edit(|s| {
            s.failing.insert(operation);
        })
    }

    /// Delays every response.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.edit(|s| s.delay = Some(delay))
    }

    /// Effects issued so far, in order.
    pub fn issued(&self) -> Vec<GitHubEffect> {
        self.state.lock().unwrap().issued.clone()
    }

    pub fn merge_count(&self) -> usize {
        self.issued()
            .iter()
            .filter(|e| matches!(e, GitHubEffect::MergePr { .. }))
            .count()
    }

    fn respond(state: &MockState, effect: &GitHubEffect) -> Result<GitHubResponse, String> {
        if state.failing.contains(effect.operation()) {
            return Err(format!("{} failed (scripted)", effect.operation()));
        }

        let response = match effect {
            GitHubEffect::GetPr { pr } => GitHubResponse::Pr(
                state
                    .prs
                    .get(pr)
                    .cloned()
                    .ok_or_else(|| format!("PR {} not found", pr))?,
            ),
            GitHubEffect::ListPrsForCommit { sha } => {
                let mut prs: Vec<_> = state
                    .prs
                    .values()
                    .filter(|pr| &pr.head_sha == sha && pr.state.is_open())
                    .cloned()
                    .collect();
                prs.sort_by_key(|pr| pr.number);
                GitHubResponse::PrList(prs)
            }
            GitHubEffect::GetBranchProtection { .. } => match &state.protection {
                Some(p) => GitHubResponse::BranchProtection(p.clone()),
                None => GitHubResponse::BranchProtectionNotFound,
            },
            GitHubEffect::ListReviews { .. } => GitHubResponse::Reviews(state.reviews.clone()),
            GitHubEffect::GetCombinedStatus { .. } => {
                GitHubResponse::CombinedStatus(state.statuses.clone())
            }
            GitHubEffect::ListCheckRuns { .. } => {
                GitHubResponse::CheckRuns(state.check_runs.clone())
            }
            GitHubEffect::MergePr { .. } => {
                state
                    .merge_response
                    .clone()
                    .unwrap_or_else(|| GitHubResponse::Merged {
                        sha: Sha::parse("f".repeat(40)).unwrap(),
                    })
            }
        };
        Ok(response)
    }
}

impl GitHubInterpreter for MockGitHub {
    type Error = String;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            let result = Self::respond(&state, &effect);
            state.issued.push(effect);
            (result, state.delay)
        };

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_review_state() -> impl Strategy<Value = ReviewState> {
    prop_oneof![
        Just(ReviewState::Approved),
        Just(ReviewState::ChangesRequested),
        Just(ReviewState::Commented),
        Just(ReviewState::Dismissed),
        Just(ReviewState::Pending),
    ]
}

/// Reviews from a small pool of reviewers, so the same person often reviews
/// more than once.
pub fn arb_review() -> impl Strategy<Value = ReviewData> {
    ("[a-d]", arb_review_state()).prop_map(|(reviewer, state)| ReviewData { reviewer, state })
}

pub fn arb_signal_state() -> impl Strategy<Value = SignalState> {
    prop_oneof![
        Just(SignalState::Success),
        Just(SignalState::Pending),
        Just(SignalState::Failure),
        Just(SignalState::Error),
        Just(SignalState::Neutral),
        Just(SignalState::Skipped),
        "[a-z]{3,8}".prop_map(|s| SignalState::parse(&s)),
    ]
}

const CONTEXTS: [&str; 3] = ["ci/test", "ci/lint", "build"];

pub fn arb_status() -> impl Strategy<Value = CommitStatusData> {
    (prop::sample::select(CONTEXTS.to_vec()), arb_signal_state())
        .prop_map(|(context, state)| status(context, state))
}

pub fn arb_check_run() -> impl Strategy<Value = CheckRunData> {
    (
        prop::sample::select(CONTEXTS.to_vec()),
        prop_oneof![
            Just(CheckStatus::Queued),
            Just(CheckStatus::InProgress),
            Just(CheckStatus::Completed),
        ],
        prop::option::of(prop::sample::select(vec![
            "success", "failure", "neutral", "skipped",
        ])),
    )
        .prop_map(|(name, status, conclusion)| check_run(name, status, conclusion))
}

pub fn arb_policy() -> impl Strategy<Value = BranchProtectionData> {
    (0u32..3, prop::sample::subsequence(CONTEXTS.to_vec(), 0..=3)).prop_map(|(count, contexts)| {
        BranchProtectionData {
            required_approving_review_count: count,
            required_status_checks: contexts.into_iter().map(String::from).collect(),
        }
    })
}
