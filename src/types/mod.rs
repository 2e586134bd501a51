//! Core domain types for the merge-readiness bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;
pub mod pr;
pub mod signal;

pub use ids::{InstallationId, InvalidSha, PrNumber, PullRequestRef, RepoId, Sha};
pub use pr::{PrState, ReviewState};
pub use signal::{CheckStatus, SignalState};
