//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Decision logic that reads as a sequence of named API calls
//! - Testability via mock interpreters
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{
    BranchProtectionData, CheckRunData, CommitStatusData, GitHubEffect, GitHubResponse,
    MergeMethod, PrData, ReviewData,
};
pub use interpreter::GitHubInterpreter;
