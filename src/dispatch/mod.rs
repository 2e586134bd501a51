//! Event dispatch: from a parsed webhook to per-PR evaluations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────┐     ┌──────────┐     ┌──────────────────┐
//! │   axum      │ ──► │ dispatch │ ──► │ resolve  │ ──► │ evaluate + merge │ (PR 1)
//! │  (accepts)  │     │  (task)  │     │ PRs      │ ──► │ evaluate + merge │ (PR 2)
//! └─────────────┘     └──────────┘     └──────────┘     └──────────────────┘
//!       │
//!       │ returns 200 OK immediately
//!       ▼
//! ```
//!
//! Each webhook gets one routing task and each resolved PR one evaluation
//! task. Evaluations share nothing except the in-flight guard, which folds
//! triggers for a PR that is already being evaluated into one follow-up
//! evaluation. Two evaluations that do overlap (guard disabled) both re-read
//! GitHub and at most produce a redundant merge request.

mod factory;
mod inflight;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, MergeMethod};
use crate::evaluator::{Decision, EvaluationError, evaluate};
use crate::executor::{MergeOutcome, execute_merge};
use crate::types::{PullRequestRef, RepoId, Sha};
use crate::webhooks::{Event, Resolution, resolve};

pub use factory::{ClientFactory, ClientFactoryError};
pub use inflight::{InFlightGuard, InFlightPermit};

/// Default deadline for one evaluation including the merge request.
pub const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of an in-flight claim.
pub const DEFAULT_INFLIGHT_TTL: Duration = Duration::from_secs(10);

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Deadline for evaluating and merging one PR.
    pub evaluation_timeout: Duration,

    /// How long an in-flight evaluation may hold its claim on a PR. Triggers
    /// for a claimed PR are folded into one follow-up evaluation. Zero
    /// disables coalescing.
    pub inflight_ttl: Duration,

    /// Merge method sent with merge requests. `None` uses the repository
    /// default.
    pub merge_method: Option<MergeMethod>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        DispatcherConfig {
            evaluation_timeout: DEFAULT_EVALUATION_TIMEOUT,
            inflight_ttl: DEFAULT_INFLIGHT_TTL,
            merge_method: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.evaluation_timeout = timeout;
        self
    }

    pub fn with_inflight_ttl(mut self, ttl: Duration) -> Self {
        self.inflight_ttl = ttl;
        self
    }

    pub fn with_merge_method(mut self, method: Option<MergeMethod>) -> Self {
        self.merge_method = method;
        self
    }
}

struct Inner<F> {
    factory: F,
    config: DispatcherConfig,
    inflight: InFlightGuard,
    shutdown: CancellationToken,
}

/// Routes webhook events to evaluations.
///
/// Cheap to clone; clones share the factory, the in-flight guard and the
/// shutdown token.
pub struct Dispatcher<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for Dispatcher<F> {
    fn clone(&self) -> Self {
        Dispatcher {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ClientFactory> Dispatcher<F> {
    pub fn new(factory: F, config: DispatcherConfig) -> Self {
        Self::new_with_shutdown(factory, config, CancellationToken::new())
    }

    /// Creates a dispatcher whose evaluations stop when `shutdown` fires.
    pub fn new_with_shutdown(
        factory: F,
        config: DispatcherConfig,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            timeout_secs = config.evaluation_timeout.as_secs(),
            inflight_ttl_secs = config.inflight_ttl.as_secs(),
            merge_method = ?config.merge_method,
            "Creating dispatcher"
        );

        let inflight = InFlightGuard::new(config.inflight_ttl);
        Dispatcher {
            inner: Arc::new(Inner {
                factory,
                config,
                inflight,
                shutdown,
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Handles one event in the background.
    ///
    /// Returns immediately. The returned handle completes once every
    /// evaluation the event triggered has finished; callers that don't care
    /// may drop it.
    #[instrument(skip_all, fields(repo = %event.repo(), kind = event.kind()))]
    pub fn dispatch(&self, event: Event) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.route(event).await }.in_current_span())
    }

    async fn route(&self, event: Event) {
        let resolution = resolve(&event);
        if resolution == Resolution::Ignore {
            debug!("Event does not concern any PR");
            return;
        }

        let repo = event.repo().clone();
        let client = match self
            .inner
            .factory
            .client_for(event.installation(), repo.clone())
            .await
        {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(
                    installation = %event.installation(),
                    error = %e,
                    "Failed to build GitHub client, dropping event"
                );
                return;
            }
        };

        let prs = match resolution {
            Resolution::Direct(numbers) => numbers
                .into_iter()
                .map(|n| PullRequestRef::new(repo.clone(), n))
                .collect(),
            Resolution::LookupByCommit(sha) => lookup_by_commit(&*client, &repo, &sha).await,
            Resolution::Ignore => Vec::new(),
        };

        if prs.is_empty() {
            debug!("No open PRs to evaluate");
            return;
        }

        let tasks: Vec<_> = prs
            .into_iter()
            .map(|pr_ref| {
                let this = self.clone();
                let client = Arc::clone(&client);
                let span = info_span!("evaluation", pr = %pr_ref);
                tokio::spawn(
                    async move { this.evaluate_and_merge(&*client, pr_ref).await }.instrument(span),
                )
            })
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Evaluation task panicked");
            }
        }
    }

    async fn evaluate_and_merge(&self, client: &F::Client, pr_ref: PullRequestRef) {
        let Some(permit) = self.inner.inflight.try_acquire(&pr_ref) else {
            debug!("Evaluation already in flight, it will run again");
            return;
        };

        loop {
            if !self.evaluate_once(client, &pr_ref).await {
                return;
            }
            if !permit.take_rerun() {
                return;
            }
            debug!("Triggered again while evaluating, re-evaluating");
        }
    }

    /// Runs one evaluation under the deadline. Returns `false` on shutdown.
    async fn evaluate_once(&self, client: &F::Client, pr_ref: &PullRequestRef) -> bool {
        let config = &self.inner.config;
        let work = evaluate_then_merge(client, pr_ref, config.merge_method);

        tokio::select! {
            _ = self.inner.shutdown.cancelled() => {
                debug!("Shutdown requested, abandoning evaluation");
                false
            }
            result = tokio::time::timeout(config.evaluation_timeout, work) => {
                match result {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!(error = %e, "Evaluation failed, PR left untouched"),
                    Err(_) => warn!(
                        timeout = ?config.evaluation_timeout,
                        "Evaluation timed out, PR left untouched"
                    ),
                }
                true
            }
        }
    }
}

/// Evaluates `pr_ref` and requests a merge if it is ready.
async fn evaluate_then_merge<G>(
    github: &G,
    pr_ref: &PullRequestRef,
    method: Option<MergeMethod>,
) -> Result<Option<MergeOutcome>, EvaluationError>
where
    G: GitHubInterpreter,
    G::Error: std::fmt::Display,
{
    match evaluate(github, pr_ref).await? {
        Decision::Proceed => execute_merge(github, pr_ref, method).await.map(Some),
        Decision::Skip(reason) => {
            info!(%reason, "PR not ready to merge");
            Ok(None)
        }
    }
}

/// Finds the open PRs whose head is `sha`. Failures yield no PRs.
async fn lookup_by_commit<G>(github: &G, repo: &RepoId, sha: &Sha) -> Vec<PullRequestRef>
where
    G: GitHubInterpreter,
    G::Error: std::fmt::Display,
{
    let effect = GitHubEffect::ListPrsForCommit { sha: sha.clone() };
    match github.interpret(effect).await {
        Ok(GitHubResponse::PrList(prs)) => prs
            .into_iter()
            .filter(|pr| pr.state.is_open())
            .map(|pr| PullRequestRef::new(repo.clone(), pr.number))
            .collect(),
        Ok(other) => {
            warn!(sha = %sha.short(), response = ?other, "Unexpected response to PR lookup");
            Vec::new()
        }
        Err(e) => {
            warn!(sha = %sha.short(), error = %e, "Failed to look up PRs for commit");
            Vec::new()
        }
    }
}
