//! GitHub API client and effect interpreter.
//!
//! This module provides the implementation for executing GitHub effects via the octocrab
//! library. It implements the `GitHubInterpreter` trait defined in the effects module.
//!
//! Key features:
//! - GitHub App authentication, one client per installation
//! - Distinguishes transient, permanent and not-found errors
//! - Branch protection 404 reported as "no protection", not as a failure

mod app;
mod client;
mod error;
mod interpreter;

pub use app::AppClientFactory;
pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::{MERGE_COMMIT_MESSAGE, interpret_github_effect};
