//! Handler for `status` webhook events (legacy Status API).

use crate::webhooks::events::StatusEvent;

use super::Resolution;

/// Resolves a commit status event.
///
/// Only a `success` can make a PR mergeable, so every other state is ignored.
/// Status events carry no PR association; the PRs are the open PRs containing
/// the commit.
pub fn resolve_status(event: &StatusEvent) -> Resolution {
    if event.state.is_success() {
        Resolution::LookupByCommit(event.sha.clone())
    } else {
        Resolution::Ignore
    }
}
