//! PR resolution for GitHub webhook events.
//!
//! Each handler maps one event type to the pull requests whose merge readiness
//! it may have changed. Handlers are pure: when the PRs can only be found by
//! asking GitHub which open PRs contain a commit, they return
//! [`Resolution::LookupByCommit`] and the dispatcher performs the lookup.
//!
//! # Event Types
//!
//! | Event | Handler |
//! |-------|---------|
//! | `pull_request_review` | `resolve_review` - submitted, dismissed |
//! | `check_run` / `check_suite` | `resolve_check` - completed only |
//! | `status` | `resolve_status` - success only |
//! | `pull_request` | `resolve_pull_request` - opened, reopened, synchronize, ready_for_review |

mod check;
mod pull_request;
mod review;
mod status;

use crate::types::{PrNumber, Sha};
use crate::webhooks::Event;

pub use check::resolve_check;
pub use pull_request::resolve_pull_request;
pub use review::resolve_review;
pub use status::resolve_status;

/// The PRs an event concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The event names its PRs directly. Never empty, never duplicated.
    Direct(Vec<PrNumber>),

    /// The PRs must be looked up as the open PRs containing this commit.
    LookupByCommit(Sha),

    /// The event cannot change any PR's merge readiness.
    Ignore,
}

impl Resolution {
    /// `Direct` for a non-empty list, `Ignore` otherwise.
    pub fn direct(prs: Vec<PrNumber>) -> Self {
        if prs.is_empty() {
            Resolution::Ignore
        } else {
            Resolution::Direct(prs)
        }
    }
}

/// Routes an event to its handler.
pub fn resolve(event: &Event) -> Resolution {
    match event {
        Event::ReviewSubmitted(e) => resolve_review(e),
        Event::CheckRunCompleted(e) | Event::CheckSuiteCompleted(e) => resolve_check(e),
        Event::ExternalStatusUpdated(e) => resolve_status(e),
        Event::PullRequestChanged(e) => resolve_pull_request(e),
    }
}
