//! GitHub App authentication.
//!
//! The service runs as a GitHub App. Every webhook carries the id of the
//! installation that produced it, and API calls for that event must be made
//! with that installation's token.
//!
//! Installation tokens live for an hour. Clients are cached per installation
//! and minted again once their token nears expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use jsonwebtoken::EncodingKey;
use octocrab::Octocrab;
use octocrab::models::{AppId, InstallationId as OctocrabInstallationId};

use tracing::debug;

use crate::dispatch::{ClientFactory, ClientFactoryError};
use crate::types::{InstallationId, RepoId};

use super::client::OctocrabClient;

/// How long a minted installation client is reused. GitHub issues tokens
/// valid for one hour.
pub const INSTALLATION_CLIENT_TTL: Duration = Duration::from_secs(50 * 60);

/// Values that expire a fixed time after insertion.
#[derive(Debug)]
struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash, V: Clone> ExpiringCache<K, V> {
    fn new(ttl: Duration) -> Self {
        ExpiringCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = entries
            .get(key)
            .filter(|(_, inserted)| inserted.elapsed() < self.ttl)
            .map(|(value, _)| value.clone());
        if fresh.is_none() {
            entries.remove(key);
        }
        fresh
    }

    fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (value, Instant::now()));
    }
}

/// Builds installation-scoped clients from one App-authenticated client.
#[derive(Clone)]
pub struct AppClientFactory {
    app: Octocrab,
    installations: Arc<ExpiringCache<InstallationId, Octocrab>>,
}

impl AppClientFactory {
    /// Creates a factory from the App id and its RSA private key (PEM).
    pub fn new(app_id: u64, private_key_pem: &[u8]) -> Result<Self, ClientFactoryError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| ClientFactoryError::InvalidKey(e.to_string()))?;

        let app = Octocrab::builder()
            .app(AppId(app_id), key)
            .build()
            .map_err(|e| ClientFactoryError::Build(e.to_string()))?;

        Ok(Self {
            app,
            installations: Arc::new(ExpiringCache::new(INSTALLATION_CLIENT_TTL)),
        })
    }
}

impl ClientFactory for AppClientFactory {
    type Client = OctocrabClient;

    async fn client_for(
        &self,
        installation: InstallationId,
        repo: RepoId,
    ) -> Result<Self::Client, ClientFactoryError> {
        if let Some(client) = self.installations.get(&installation) {
            return Ok(OctocrabClient::new(client, repo));
        }

        debug!(%installation, "Minting installation token");
        let (client, _token) = self
            .app
            .installation_and_token(OctocrabInstallationId(installation.0))
            .await
            .map_err(|e| ClientFactoryError::Installation {
                installation,
                message: e.to_string(),
            })?;

        self.installations.insert(installation, client.clone());
        Ok(OctocrabClient::new(client, repo))
    }
}

impl std::fmt::Debug for AppClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppClientFactory").finish_non_exhaustive()
    }
}
