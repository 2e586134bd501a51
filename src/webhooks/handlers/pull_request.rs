//! Handler for `pull_request` webhook events.

use crate::webhooks::events::{PrAction, PullRequestEvent};

use super::Resolution;

/// Resolves a pull request event to the PR itself.
///
/// | Action | Behavior |
/// |--------|----------|
/// | `opened` / `reopened` | Re-evaluate (policy may already be met) |
/// | `synchronize` | Re-evaluate (new head commit) |
/// | `ready_for_review` | Re-evaluate (no longer a draft) |
/// | anything else | Ignore |
pub fn resolve_pull_request(event: &PullRequestEvent) -> Resolution {
    match event.action {
        PrAction::Opened
        | PrAction::Reopened
        | PrAction::Synchronize
        | PrAction::ReadyForReview => Resolution::Direct(vec![event.pr_number]),
        PrAction::Closed | PrAction::Edited | PrAction::ConvertedToDraft => Resolution::Ignore,
    }
}
