//! Approval counting.

use std::collections::HashMap;

use crate::effects::ReviewData;
use crate::types::ReviewState;

/// Counts the distinct reviewers whose latest verdict is an approval.
///
/// Reviews must be in submission order (the order the API lists them).
/// A reviewer's verdict is replaced by each later approval, change request or
/// dismissal; comments and pending drafts leave it unchanged. Approving twice
/// counts once.
pub fn count_approvals(reviews: &[ReviewData]) -> u32 {
    let mut latest: HashMap<&str, ReviewState> = HashMap::new();

    for review in reviews {
        if review.state.is_verdict() {
            latest.insert(review.reviewer.as_str(), review.state);
        }
    }

    latest
        .values()
        .filter(|state| **state == ReviewState::Approved)
        .count() as u32
}
