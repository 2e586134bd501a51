//! CI signal reconciliation.
//!
//! GitHub reports CI results through two APIs: legacy commit statuses and
//! check runs. A required context may be satisfied by either. The two lists
//! are folded into one [`SignalMap`] keyed by context name.

use std::collections::BTreeMap;

use crate::effects::{CheckRunData, CommitStatusData};
use crate::types::SignalState;

use super::SkipReason;

/// The effective state of each CI context on one commit.
pub type SignalMap = BTreeMap<String, SignalState>;

/// Builds the signal map for a commit.
///
/// Commit statuses are applied first, then check runs, so a check run wins
/// over a status with the same name. A check run that has not completed maps
/// to `pending` whatever its conclusion field says; a completed one maps to
/// its conclusion.
pub fn build_signal_map(statuses: &[CommitStatusData], check_runs: &[CheckRunData]) -> SignalMap {
    let mut map = SignalMap::new();

    for status in statuses {
        map.insert(status.context.clone(), status.state.clone());
    }

    for run in check_runs {
        let state = if run.status.is_completed() {
            SignalState::parse(run.conclusion.as_deref().unwrap_or_default())
        } else {
            SignalState::Pending
        };
        map.insert(run.name.clone(), state);
    }

    map
}

/// Checks required contexts in order and returns the first unmet one.
///
/// Only an exact `success` satisfies a context. `neutral` and `skipped` do
/// not.
pub fn check_required_contexts(signals: &SignalMap, required: &[String]) -> Option<SkipReason> {
    required.iter().find_map(|context| match signals.get(context) {
        None => Some(SkipReason::MissingRequiredCheck {
            context: context.clone(),
        }),
        Some(state) if !state.is_success() => Some(SkipReason::FailingRequiredCheck {
            context: context.clone(),
            state: state.clone(),
        }),
        Some(_) => None,
    })
}
