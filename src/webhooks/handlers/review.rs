//! Handler for `pull_request_review` webhook events.

use crate::webhooks::events::{ReviewAction, ReviewEvent};

use super::Resolution;

/// Resolves a review event to the reviewed PR.
///
/// | Action | Behavior |
/// |--------|----------|
/// | `submitted` | Re-evaluate the PR |
/// | `dismissed` | Re-evaluate the PR (the approval count may have dropped) |
/// | `edited` | Ignore (only the body changed) |
///
/// The review's own state is not consulted: the evaluator recounts approvals
/// from the full review list either way.
pub fn resolve_review(event: &ReviewEvent) -> Resolution {
    match event.action {
        ReviewAction::Submitted | ReviewAction::Dismissed => {
            Resolution::Direct(vec![event.pr_number])
        }
        ReviewAction::Edited => Resolution::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InstallationId, PrNumber, ReviewState};
    use crate::webhooks::handlers::test_support::repo;

    fn review(action: ReviewAction, state: ReviewState) -> ReviewEvent {
        ReviewEvent {
            installation: InstallationId(1),
            repo: repo(),
            action,
            state,
            reviewer: "alice".to_string(),
            pr_number: PrNumber(42),
        }
    }

    #[test]
    fn submitted_resolves_regardless_of_state() {
        for state in [
            ReviewState::Approved,
            ReviewState::ChangesRequested,
            ReviewState::Commented,
        ] {
            assert_eq!(
                resolve_review(&review(ReviewAction::Submitted, state)),
                Resolution::Direct(vec![PrNumber(42)])
            );
        }
    }

    #[test]
    fn dismissed_resolves() {
        assert_eq!(
            resolve_review(&review(ReviewAction::Dismissed, ReviewState::Dismissed)),
            Resolution::Direct(vec![PrNumber(42)])
        );
    }

    #[test]
    fn edited_is_ignored() {
        assert_eq!(
            resolve_review(&review(ReviewAction::Edited, ReviewState::Approved)),
            Resolution::Ignore
        );
    }
}
