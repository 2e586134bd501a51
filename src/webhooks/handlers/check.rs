//! Handler for `check_run` and `check_suite` webhook events.

use crate::webhooks::events::CheckEvent;

use super::Resolution;

/// Resolves a check run or check suite event.
///
/// Only a completed check can change readiness: the decision is taken on the
/// check's own lifecycle status, not on the action or the conclusion. When
/// GitHub reported no PR associations the PRs are looked up by the check's
/// head commit, since some CI systems never report them.
pub fn resolve_check(event: &CheckEvent) -> Resolution {
    if !event.status.is_completed() {
        return Resolution::Ignore;
    }

    if event.pull_requests.is_empty() {
        Resolution::LookupByCommit(event.head_sha.clone())
    } else {
        Resolution::direct(event.pull_requests.clone())
    }
}
