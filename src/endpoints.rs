//! Endpoint catalog persisted as a flat JSON file
//!
//! The catalog is read and rewritten wholesale on every mutation. Endpoint
//! names are unique; adding a duplicate is rejected rather than shadowed.

use crate::error::{DeployError, DeployResult};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// A JSON-RPC-reachable blockchain node plus chain id and explorer base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub explorer: String,
}

impl EndpointConfig {
    /// Explorer link for a transaction hash on this endpoint.
    pub fn tx_link(&self, tx_hash: &str) -> String {
        tx_link(&self.explorer, tx_hash)
    }
}

/// Build an explorer transaction link: `{base}/tx/{hash}`, with exactly one
/// slash between base and path regardless of a trailing slash on the base.
pub fn tx_link(explorer_base: &str, tx_hash: &str) -> String {
    format!("{}/tx/{}", explorer_base.trim_end_matches('/'), tx_hash)
}

/// File-backed endpoint catalog
pub struct EndpointStore {
    path: PathBuf,
}

impl EndpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the full catalog. A missing file is the empty catalog.
    pub fn load(&self) -> DeployResult<Vec<EndpointConfig>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| DeployError::Store(format!("read {:?}: {}", self.path, e)))?;
        serde_json::from_str(&data)
            .map_err(|e| DeployError::Store(format!("parse {:?}: {}", self.path, e)))
    }

    /// Rewrite the full catalog.
    pub fn save(&self, endpoints: &[EndpointConfig]) -> DeployResult<()> {
        let json = serde_json::to_string_pretty(endpoints)
            .map_err(|e| DeployError::Store(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| DeployError::Store(format!("write {:?}: {}", self.path, e)))?;
        debug!("Saved {} endpoints to {:?}", endpoints.len(), self.path);
        Ok(())
    }

    pub fn add(&self, endpoint: EndpointConfig) -> DeployResult<()> {
        let mut endpoints = self.load()?;
        if endpoints.iter().any(|e| e.name == endpoint.name) {
            return Err(DeployError::DuplicateEndpoint(endpoint.name));
        }
        endpoints.push(endpoint);
        self.save(&endpoints)
    }

    /// Replace the endpoint named `name`. Renaming onto another existing
    /// name is rejected as a duplicate.
    pub fn update(&self, name: &str, endpoint: EndpointConfig) -> DeployResult<()> {
        let mut endpoints = self.load()?;
        if endpoint.name != name && endpoints.iter().any(|e| e.name == endpoint.name) {
            return Err(DeployError::DuplicateEndpoint(endpoint.name));
        }
        let slot = endpoints
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| DeployError::EndpointNotFound(name.to_string()))?;
        *slot = endpoint;
        self.save(&endpoints)
    }

    /// Remove an endpoint by name. Removing an unknown name is a no-op and
    /// leaves the file untouched.
    pub fn remove(&self, name: &str) -> DeployResult<()> {
        let mut endpoints = self.load()?;
        let before = endpoints.len();
        endpoints.retain(|e| e.name != name);
        if endpoints.len() == before {
            return Ok(());
        }
        self.save(&endpoints)
    }

    pub fn get(&self, name: &str) -> DeployResult<EndpointConfig> {
        self.load()?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DeployError::EndpointNotFound(name.to_string()))
    }

    pub fn names(&self) -> DeployResult<Vec<String>> {
        Ok(self.load()?.into_iter().map(|e| e.name).collect())
    }
}
