//! Installation-scoped client construction.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::effects::GitHubInterpreter;
use crate::types::{InstallationId, RepoId};

/// Errors building a GitHub client.
#[derive(Debug, Error)]
pub enum ClientFactoryError {
    /// The App private key could not be parsed.
    #[error("invalid GitHub App private key: {0}")]
    InvalidKey(String),

    /// The App-level client could not be built.
    #[error("failed to build GitHub client: {0}")]
    Build(String),

    /// No token could be obtained for the installation.
    #[error("failed to authenticate as installation {installation}: {message}")]
    Installation {
        installation: InstallationId,
        message: String,
    },
}

/// Produces a client authenticated as one installation and scoped to one
/// repository.
///
/// Production uses [`crate::github::AppClientFactory`]; tests hand out a
/// scripted double.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: GitHubInterpreter<Error: fmt::Display + Send> + Send + Sync + 'static;

    fn client_for(
        &self,
        installation: InstallationId,
        repo: RepoId,
    ) -> impl Future<Output = Result<Self::Client, ClientFactoryError>> + Send;
}
