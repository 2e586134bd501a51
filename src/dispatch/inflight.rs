//! Coalescing of overlapping evaluations of the same PR.
//!
//! A burst of webhooks (a check suite finishing with a dozen runs, say) would
//! otherwise start one evaluation per event. A trigger that arrives while an
//! evaluation is running is not dropped: it marks the claim, and the holder
//! evaluates once more after it finishes. However many triggers arrive, that
//! is one extra pass, and it reads state no older than the last trigger. The
//! TTL bounds how long a hung evaluation can hold the claim.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::types::PullRequestRef;

#[derive(Debug)]
struct Entry {
    id: u64,
    started: Instant,
    rerun: bool,
}

/// Tracks which PRs have an evaluation in flight.
#[derive(Debug, Clone)]
pub struct InFlightGuard {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<PullRequestRef, Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl InFlightGuard {
    /// A zero `ttl` disables the guard.
    pub fn new(ttl: Duration) -> Self {
        InFlightGuard {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Claims `pr` for one evaluation.
    ///
    /// Returns `None` if a claim younger than the TTL is already held, and
    /// asks that claim's holder to evaluate again. Older claims are treated as
    /// abandoned and replaced.
    pub fn try_acquire(&self, pr: &PullRequestRef) -> Option<InFlightPermit> {
        if !self.is_enabled() {
            return Some(InFlightPermit {
                guard: None,
                pr: pr.clone(),
                id: 0,
            });
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(pr)
            && entry.started.elapsed() < self.ttl
        {
            entry.rerun = true;
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            pr.clone(),
            Entry {
                id,
                started: Instant::now(),
                rerun: false,
            },
        );

        Some(InFlightPermit {
            guard: Some(self.clone()),
            pr: pr.clone(),
            id,
        })
    }

    /// Number of claims currently recorded, stale ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes a pending rerun request for the claim `id`, restarting its
    /// TTL. Without one the claim is released under the same lock, so a
    /// trigger racing with the release either lands here or acquires afresh.
    fn take_rerun(&self, pr: &PullRequestRef, id: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get_mut(pr).filter(|e| e.id == id) else {
            return false;
        };
        if entry.rerun {
            entry.rerun = false;
            entry.started = Instant::now();
            return true;
        }
        entries.remove(pr);
        false
    }

    fn release(&self, pr: &PullRequestRef, id: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // A stale claim may have been replaced; only drop our own.
        if entries.get(pr).is_some_and(|e| e.id == id) {
            entries.remove(pr);
        }
    }
}

/// A held claim. Dropping it releases the PR.
#[derive(Debug)]
pub struct InFlightPermit {
    guard: Option<InFlightGuard>,
    pr: PullRequestRef,
    id: u64,
}

impl InFlightPermit {
    /// Whether another trigger arrived during the evaluation just finished.
    ///
    /// `true` keeps the claim for one more evaluation. `false` releases it.
    /// Always `false` when the guard is disabled.
    pub fn take_rerun(&self) -> bool {
        match &self.guard {
            Some(guard) => guard.take_rerun(&self.pr, self.id),
            None => false,
        }
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        if let Some(guard) = &self.guard {
            guard.release(&self.pr, self.id);
        }
    }
}
