//! Merge Readiness Bot - A GitHub App that merges pull requests as soon as
//! their base branch's protection rules are satisfied.
//!
//! Every relevant webhook (review, check run, check suite, commit status, PR
//! change) triggers a fresh evaluation of the affected PRs against live
//! GitHub state. Only installation credentials outlive an evaluation.

pub mod config;
pub mod dispatch;
pub mod effects;
pub mod evaluator;
pub mod executor;
pub mod github;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
